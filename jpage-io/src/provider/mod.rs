//! Providers: turn a page identifier into a readable page stream
//!
//! A provider returns `Ok(None)` when it has nothing for the id, which the
//! iterator treats as a clean end of iteration. Failures to reach the page at
//! all are errors.

use crate::context::Context;
use jpage_format::{PageStream, Result};

mod fs;
#[cfg(feature = "http")]
mod http;

pub use fs::{file_provider, FileProvider};
#[cfg(feature = "http")]
pub use http::{http_provider, http_provider_with, HttpProvider};

/// Outcome of opening one page
pub type PageResult = Result<Option<Box<dyn PageStream>>>;

/// Source of page streams
pub trait Provider: Send {
    /// Open the stream for `page`, honouring `ctx`
    fn open(&mut self, ctx: &Context, page: &str) -> PageResult;
}

impl<F> Provider for F
where
    F: FnMut(&Context, &str) -> PageResult + Send,
{
    fn open(&mut self, ctx: &Context, page: &str) -> PageResult {
        self(ctx, page)
    }
}

/// Provider that never has a page
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPages;

impl Provider for NoPages {
    fn open(&mut self, _ctx: &Context, _page: &str) -> PageResult {
        Ok(None)
    }
}
