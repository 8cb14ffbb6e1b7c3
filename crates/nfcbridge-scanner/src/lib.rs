//! The scan loop: one task that alternates between draining remote tag
//! commands and classifying presented tags, publishing an event per scan.
//!
//! A cycle is strictly sequential: flush the publish queue, wait bounded
//! for a tag, then either process exactly one pending command or classify
//! the tag. A cycle never does both, so a command consumes the tag it was
//! waiting for and publishes nothing.

pub mod classify;
pub mod commands;
pub mod queue;
pub mod service;

pub use commands::TagCommand;
pub use queue::{CommandEnqueuer, CommandQueue};
pub use service::{Scanner, ScannerSettings};
