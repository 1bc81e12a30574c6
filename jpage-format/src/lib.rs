//! jpage Format - Token-level primitives for paged JSON streaming
//!
//! This crate provides the pieces that work on a single page's bytes, with no
//! filesystem or network dependencies. It includes:
//!
//! - Token model
//! - Incremental token decoder with element decoding
//! - Target location and array validation
//! - Page stream trait and disposal helpers
//! - Error types
//! - Decoding limits

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod decoder;
pub mod error;
pub mod limits;
pub mod scan;
pub mod stream;
pub mod token;

// Re-export commonly used types
pub use decoder::TokenDecoder;
pub use error::{BoxError, PageError, Result};
pub use limits::Limits;
pub use scan::{expect_array_start, locate, Target};
pub use stream::{drain_and_release, NopRelease, PageStream};
pub use token::Token;
