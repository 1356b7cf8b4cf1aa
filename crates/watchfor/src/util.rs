//! Utility modules for poll operations.

pub mod timeout;

pub use timeout::{Deadline, TimeoutExt};
