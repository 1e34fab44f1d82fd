//! Run Module
//!
//! Starts a tagged image as a single runnable unit and waits for it.

mod use_case;

pub use use_case::{RunFailure, RunOptions, RunOutcome, RunUseCase};
