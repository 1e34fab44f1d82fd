//! Process Runner Implementations

mod local;

pub use local::{LocalChild, LocalProcessRunner};
