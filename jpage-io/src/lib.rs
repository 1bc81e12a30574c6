//! jpage I/O - Paged iteration over JSON arrays
//!
//! This crate drives the format primitives across pages:
//!
//! - [`Rows`], the pull-based element iterator
//! - [`Context`], cancellation and deadlines
//! - Paginators choosing page ids ([`scan_folder`], [`pages`], [`LimitPaginator`])
//! - Providers opening page streams ([`file_provider`], `http_provider`)

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod options;
pub mod paginator;
pub mod provider;
pub mod rows;

pub use context::{Context, ContextReader};
pub use options::{RowsBuilder, RowsOption};
pub use paginator::{pages, scan_folder, Exhausted, FolderPages, LimitPaginator, Pages, Paginator};
pub use provider::{file_provider, FileProvider, NoPages, PageResult, Provider};
#[cfg(feature = "http")]
pub use provider::{http_provider, http_provider_with, HttpProvider};
pub use rows::{Records, Rows, RowsMetrics};

pub use jpage_format::{Limits, PageError, PageStream, Result, Target, Token};

/// Create an iterator from `options`, applied in order
///
/// Defaults: the array is the document root, the paginator grants nothing,
/// and the provider has no pages. Limits are validated here; nothing is
/// fetched until the first [`Rows::advance`].
pub fn build(ctx: Context, options: impl IntoIterator<Item = RowsOption>) -> Result<Rows> {
    let mut rows = Rows::new(ctx);
    for option in options {
        rows.apply(option);
    }
    rows.limits().validate()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_iterator_finishes_cleanly() {
        let mut rows = build(Context::new(), []).unwrap();
        assert!(!rows.advance());
        assert!(rows.err().is_none());
        assert!(rows.is_finished());
    }
}
