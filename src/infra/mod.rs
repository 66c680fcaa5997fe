//! Infrastructure layer
//!
//! Handles all I/O operations: filesystem, directories and external processes.

pub mod dirs;
pub mod filesystem;
pub mod toolchain;
