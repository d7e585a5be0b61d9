//! Capability traits for the novelweave pipeline.
//!
//! The pipeline only ever talks to remote models through these traits, so
//! vendors can be swapped and tests can script responses.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;

pub use traits::{CompletionProvider, ImageProvider};
