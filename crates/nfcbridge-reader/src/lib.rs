//! Physical reader and feedback collaborators.
//!
//! This crate defines the trait boundary between the scan loop and the
//! contactless hardware, plus channel-driven mock implementations for
//! development and testing without a physical reader. Hardware failures
//! cross this boundary as values, never as panics: the scan loop treats
//! them as classification inputs.

#![allow(async_fn_in_trait)]

pub mod error;
pub mod mock;
pub mod traits;

pub use error::{ReaderError, Result};
pub use traits::{FeedbackDevice, NfcReader, NfcTag};
