//! Core types: the completion vocabulary and the lifecycle phase tag.

pub mod outcome;

pub use outcome::{Outcome, Phase};
