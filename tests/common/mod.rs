//! Common test utilities for berth CLI tests.
//!
//! This module provides:
//! - `TestEnv`: Isolated home, store, bases and index in a temp directory
//! - Fixtures: Recipes, manifests and entrypoints for the bot scenario

#![allow(dead_code)]

pub mod env;
pub mod fixtures;

pub use env::*;
pub use fixtures::*;
