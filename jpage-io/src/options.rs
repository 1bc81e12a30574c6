//! Configuration of a [`Rows`] iterator

use crate::context::Context;
use crate::paginator::Paginator;
use crate::provider::{PageResult, Provider};
use crate::rows::Rows;
use jpage_format::{Limits, Result, Target, Token};
use std::fmt;

/// One configuration setting, applied in order by [`crate::build`]
///
/// Later options override earlier ones of the same kind.
pub enum RowsOption {
    /// Where the array lives in each page
    Target(Target),
    /// Page id strategy
    Paginator(Box<dyn Paginator>),
    /// Page stream source
    Provider(Box<dyn Provider>),
    /// Decoding limits
    Limits(Limits),
    /// Keep paginating past pages whose array is empty
    SkipEmptyPages(bool),
}

impl RowsOption {
    /// The array follows `token` at `depth`
    pub fn key(token: impl Into<Token>, depth: usize) -> Self {
        Self::Target(Target::key(token, depth))
    }

    /// Box a paginator
    pub fn paginator(paginator: impl Paginator + 'static) -> Self {
        Self::Paginator(Box::new(paginator))
    }

    /// Box a provider
    pub fn provider(provider: impl Provider + 'static) -> Self {
        Self::Provider(Box::new(provider))
    }
}

impl fmt::Debug for RowsOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target(target) => f.debug_tuple("Target").field(target).finish(),
            Self::Paginator(_) => f.write_str("Paginator(..)"),
            Self::Provider(_) => f.write_str("Provider(..)"),
            Self::Limits(limits) => f.debug_tuple("Limits").field(limits).finish(),
            Self::SkipEmptyPages(skip) => f.debug_tuple("SkipEmptyPages").field(skip).finish(),
        }
    }
}

/// Fluent construction of a [`Rows`] iterator
///
/// ```no_run
/// use jpage_io::{file_provider, scan_folder, Context, RowsBuilder};
///
/// let mut rows = RowsBuilder::new(Context::new())
///     .key("items", 1)
///     .paginator(scan_folder("pages"))
///     .provider(file_provider())
///     .build()?;
/// while rows.advance() {
///     let item: serde_json::Value = rows.scan()?;
///     println!("{item}");
/// }
/// if let Some(err) = rows.err() {
///     eprintln!("{err}");
/// }
/// # Ok::<(), jpage_io::PageError>(())
/// ```
#[derive(Debug)]
pub struct RowsBuilder {
    ctx: Context,
    options: Vec<RowsOption>,
}

impl RowsBuilder {
    /// Start from the defaults: root array, no pages
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            options: Vec::new(),
        }
    }

    /// Append a raw option
    pub fn option(mut self, option: RowsOption) -> Self {
        self.options.push(option);
        self
    }

    /// Set the array location
    pub fn target(self, target: Target) -> Self {
        self.option(RowsOption::Target(target))
    }

    /// The array follows `token` at `depth`
    pub fn key(self, token: impl Into<Token>, depth: usize) -> Self {
        self.option(RowsOption::key(token, depth))
    }

    /// Set the paginator
    pub fn paginator(self, paginator: impl Paginator + 'static) -> Self {
        self.option(RowsOption::paginator(paginator))
    }

    /// Set a closure paginator
    pub fn paginate_with<F>(self, paginator: F) -> Self
    where
        F: FnMut(usize) -> Option<String> + Send + 'static,
    {
        self.paginator(paginator)
    }

    /// Set the provider
    pub fn provider(self, provider: impl Provider + 'static) -> Self {
        self.option(RowsOption::provider(provider))
    }

    /// Set a closure provider
    pub fn fetch_with<F>(self, provider: F) -> Self
    where
        F: FnMut(&Context, &str) -> PageResult + Send + 'static,
    {
        self.provider(provider)
    }

    /// Set decoding limits
    pub fn limits(self, limits: Limits) -> Self {
        self.option(RowsOption::Limits(limits))
    }

    /// Keep paginating past pages whose array is empty
    pub fn skip_empty_pages(self, skip: bool) -> Self {
        self.option(RowsOption::SkipEmptyPages(skip))
    }

    /// Validate the configuration and create the iterator
    ///
    /// No page is fetched until the first `advance`.
    pub fn build(self) -> Result<Rows> {
        crate::build(self.ctx, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jpage_format::PageError;

    #[test]
    fn invalid_limits_are_rejected() {
        let result = RowsBuilder::new(Context::new())
            .limits(Limits {
                max_nesting_depth: 0,
                ..Limits::default()
            })
            .build();
        assert!(matches!(result, Err(PageError::InvalidConfig(_))));
    }

    #[test]
    fn options_debug_without_closures() {
        let option = RowsOption::paginator(|_: usize| None);
        assert_eq!(format!("{:?}", option), "Paginator(..)");
        let option = RowsOption::key("items", 1);
        assert!(format!("{:?}", option).contains("items"));
    }
}
