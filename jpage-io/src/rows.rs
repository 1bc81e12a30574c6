//! The paged element iterator
//!
//! [`Rows`] walks the elements of one JSON array per page. When a page runs
//! out it asks the paginator for the next page id, has the provider open it,
//! and positions itself at the start of the configured array before reporting
//! more elements. Iteration ends when the paginator declines, the provider
//! has no page, the array is missing or empty, or an error occurs.

use crate::context::{Context, ContextReader};
use crate::options::RowsOption;
use crate::paginator::{Exhausted, Paginator};
use crate::provider::{NoPages, Provider};
use jpage_format::{
    drain_and_release, expect_array_start, locate, Limits, PageError, PageStream, Result, Target,
    TokenDecoder,
};
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, trace, warn};

type PageDecoder = TokenDecoder<ContextReader<Box<dyn PageStream>>>;

/// Counters describing an iteration so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowsMetrics {
    /// Pages whose stream the provider returned
    pub pages_opened: usize,
    /// Pages whose target array was present but empty
    pub empty_pages: usize,
    /// Elements successfully scanned across all pages
    pub elements_scanned: usize,
    /// Id of the page currently open
    pub current_page: Option<String>,
}

/// Where a freshly opened page left the iterator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageState {
    /// Positioned before the first element
    Ready,
    /// Target array present with no elements
    Empty,
    /// No stream, or no target array in it
    Missing,
}

/// Pull-based iterator over the elements of paged JSON arrays
///
/// Not meant for concurrent use; every operation takes `&mut self`.
pub struct Rows {
    ctx: Context,
    target: Target,
    limits: Limits,
    skip_empty_pages: bool,
    paginator: Box<dyn Paginator>,
    provider: Box<dyn Provider>,
    decoder: Option<PageDecoder>,
    consumed: usize,
    err: Option<PageError>,
    finished: bool,
    metrics: RowsMetrics,
}

impl Rows {
    /// Iterator with default settings: root array, no pages
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            target: Target::root(),
            limits: Limits::default(),
            skip_empty_pages: false,
            paginator: Box::new(Exhausted),
            provider: Box::new(NoPages),
            decoder: None,
            consumed: 0,
            err: None,
            finished: false,
            metrics: RowsMetrics::default(),
        }
    }

    pub(crate) fn apply(&mut self, option: RowsOption) {
        match option {
            RowsOption::Target(target) => self.target = target,
            RowsOption::Paginator(paginator) => self.paginator = paginator,
            RowsOption::Provider(provider) => self.provider = provider,
            RowsOption::Limits(limits) => self.limits = limits,
            RowsOption::SkipEmptyPages(skip) => self.skip_empty_pages = skip,
        }
    }

    pub(crate) fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Report whether another element can be scanned
    ///
    /// Moves to further pages as needed. Once this returns `false` it keeps
    /// returning `false` without consulting the paginator again; check
    /// [`Rows::err`] to tell a clean end from a failure.
    pub fn advance(&mut self) -> bool {
        if self.finished {
            return false;
        }

        if let Some(decoder) = self.decoder.as_mut() {
            match decoder.more() {
                Ok(true) => return true,
                Ok(false) => {}
                Err(err) => {
                    let err = self.classify(err);
                    return self.fail(err);
                }
            }
        }

        loop {
            let Some(page) = self.paginator.next_page(self.consumed) else {
                debug!(
                    target: "jpage::rows",
                    consumed = self.consumed,
                    "paginator declined, iteration finished"
                );
                return self.finish();
            };

            match self.open_page(&page) {
                Ok(PageState::Ready) => {
                    self.err = None;
                    return true;
                }
                Ok(PageState::Empty) => {
                    self.err = None;
                    self.metrics.empty_pages += 1;
                    if self.skip_empty_pages {
                        debug!(target: "jpage::rows", page = %page, "skipping empty page");
                        continue;
                    }
                    debug!(target: "jpage::rows", page = %page, "empty page, iteration finished");
                    return self.finish();
                }
                Ok(PageState::Missing) => {
                    self.err = None;
                    debug!(target: "jpage::rows", page = %page, "no array in page, iteration finished");
                    return self.finish();
                }
                Err(err) => return self.fail(err),
            }
        }
    }

    /// Decode the next element of the current page into `T`
    ///
    /// Call only after `advance` returned `true`. An element that does not
    /// fit `T` is skipped and the caller decides whether to stop. Any other
    /// failure halts the page: the next `advance` returns `false` and
    /// [`Rows::err`] reports it.
    pub fn scan<T: DeserializeOwned>(&mut self) -> Result<T> {
        let decoder = self.decoder.as_mut().ok_or(PageError::NoActivePage)?;
        match decoder.decode() {
            Ok(value) => {
                self.consumed += 1;
                self.metrics.elements_scanned += 1;
                Ok(value)
            }
            Err(err) => Err(self.classify(err)),
        }
    }

    /// Error that ended the iteration, if any
    pub fn err(&self) -> Option<&PageError> {
        self.err.as_ref()
    }

    /// Take ownership of the terminal error
    pub fn take_err(&mut self) -> Option<PageError> {
        self.err.take()
    }

    /// Drain and release the current page stream
    ///
    /// A no-op when no page is open. Draining reads the stream directly, so
    /// it works even after the context is done.
    pub fn close(&mut self) -> Result<()> {
        let Some(decoder) = self.decoder.take() else {
            return Ok(());
        };
        let mut stream = decoder.into_inner().into_inner();
        let drained = drain_and_release(&mut stream)?;
        trace!(target: "jpage::rows", drained, "released page stream");
        Ok(())
    }

    /// Iterate the remaining elements as `T`
    ///
    /// Yields the terminal error, if any, as the last item.
    pub fn records<T: DeserializeOwned>(&mut self) -> Records<'_, T> {
        Records {
            rows: self,
            done: false,
            _marker: PhantomData,
        }
    }

    /// Counters for the iteration so far
    pub fn metrics(&self) -> &RowsMetrics {
        &self.metrics
    }

    /// Elements scanned from the current page
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// True once `advance` has returned `false`
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) -> bool {
        self.finished = true;
        false
    }

    fn fail(&mut self, err: PageError) -> bool {
        debug!(target: "jpage::rows", error = %err, "iteration failed");
        self.err = Some(err);
        self.finish()
    }

    /// Report the context's state instead of the symptom it caused
    fn classify(&self, err: PageError) -> PageError {
        if err.is_cancellation() {
            return err;
        }
        match self.ctx.check() {
            Err(done) => done,
            Ok(()) => err,
        }
    }

    /// Release the old page, open `page` and position at its array
    fn open_page(&mut self, page: &str) -> Result<PageState> {
        self.close()?;
        self.metrics.current_page = None;

        let stream = match self.provider.open(&self.ctx, page) {
            Ok(Some(stream)) => stream,
            Ok(None) => {
                debug!(target: "jpage::rows", page, "provider has no page");
                return Ok(PageState::Missing);
            }
            Err(err) => return Err(self.classify(err)),
        };
        self.metrics.pages_opened += 1;
        self.metrics.current_page = Some(page.to_string());
        trace!(target: "jpage::rows", page, "opened page");

        let reader = ContextReader::new(self.ctx.clone(), stream);
        let decoder = self
            .decoder
            .insert(TokenDecoder::with_limits(reader, self.limits.clone()));
        self.consumed = 0;

        let state = position(decoder, &self.target);
        state.map_err(|err| self.classify(err))
    }
}

fn position(decoder: &mut PageDecoder, target: &Target) -> Result<PageState> {
    if !locate(decoder, target)? {
        return Ok(PageState::Missing);
    }
    expect_array_start(decoder)?;
    if decoder.more()? {
        Ok(PageState::Ready)
    } else {
        Ok(PageState::Empty)
    }
}

impl Drop for Rows {
    fn drop(&mut self) {
        let Some(decoder) = self.decoder.take() else {
            return;
        };
        let mut stream = decoder.into_inner().into_inner();
        if let Err(err) = stream.release() {
            warn!(target: "jpage::rows", error = %err, "failed to release page stream on drop");
        }
    }
}

impl fmt::Debug for Rows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rows")
            .field("target", &self.target)
            .field("limits", &self.limits)
            .field("skip_empty_pages", &self.skip_empty_pages)
            .field("page_open", &self.decoder.is_some())
            .field("consumed", &self.consumed)
            .field("err", &self.err)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Typed iterator returned by [`Rows::records`]
pub struct Records<'a, T> {
    rows: &'a mut Rows,
    done: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Iterator for Records<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.rows.advance() {
            self.done = true;
            return self.rows.take_err().map(Err);
        }
        let item = self.rows.scan();
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::PageResult;
    use jpage_test_utils::MockStream;
    use std::io;
    use std::sync::atomic::Ordering;

    fn with_body(stream: MockStream) -> Rows {
        let mut rows = Rows::new(Context::new());
        let reader = ContextReader::new(rows.ctx.clone(), Box::new(stream) as Box<dyn PageStream>);
        rows.decoder = Some(TokenDecoder::new(reader));
        rows
    }

    fn serving(body: &'static str, target: Target) -> Rows {
        let mut rows = Rows::new(Context::new());
        rows.target = target;
        rows.provider = Box::new(move |_: &Context, _: &str| -> PageResult {
            Ok(Some(Box::new(MockStream::new(body))))
        });
        rows
    }

    #[test]
    fn close_without_page_is_noop() {
        let mut rows = Rows::new(Context::new());
        assert!(rows.close().is_ok());
    }

    #[test]
    fn close_reports_drain_failure() {
        let mut rows = with_body(MockStream::failing_read(io::ErrorKind::BrokenPipe));
        assert!(matches!(rows.close(), Err(PageError::Drain(_))));
    }

    #[test]
    fn close_reports_release_failure() {
        let mut rows = with_body(MockStream::new("").failing_release(io::ErrorKind::BrokenPipe));
        assert!(matches!(rows.close(), Err(PageError::Release(_))));
    }

    #[test]
    fn close_releases_stream() {
        let stream = MockStream::new("[1, 2]");
        let released = stream.released_flag();
        let mut rows = with_body(stream);
        rows.close().unwrap();
        assert!(released.load(Ordering::SeqCst));
        assert!(rows.decoder.is_none());
    }

    #[test]
    fn scan_decodes_next_value() {
        let mut rows = with_body(MockStream::new(r#""hello""#));
        let value: String = rows.scan().unwrap();
        assert_eq!(value, "hello");
        assert_eq!(rows.consumed(), 1);
    }

    #[test]
    fn scan_into_wrong_type_fails() {
        let mut rows = with_body(MockStream::new(r#""hello""#));
        assert!(matches!(rows.scan::<i32>(), Err(PageError::Decode(_))));
        assert_eq!(rows.consumed(), 0);
    }

    #[test]
    fn scan_before_advance_fails() {
        let mut rows = Rows::new(Context::new());
        assert!(matches!(rows.scan::<i32>(), Err(PageError::NoActivePage)));
    }

    #[test]
    fn open_page_fails_when_old_page_cannot_close() {
        let mut rows = with_body(MockStream::failing_read(io::ErrorKind::BrokenPipe));
        assert!(matches!(rows.open_page("next"), Err(PageError::Drain(_))));
    }

    #[test]
    fn open_page_reports_provider_failure() {
        let mut rows = Rows::new(Context::new());
        rows.provider = Box::new(|_: &Context, _: &str| -> PageResult { Err(PageError::Cancelled) });
        assert!(matches!(rows.open_page("next"), Err(PageError::Cancelled)));
    }

    #[test]
    fn open_page_reports_bad_envelope() {
        let mut rows = serving("{=", Target::key("items", 1));
        assert!(matches!(rows.open_page("next"), Err(PageError::Syntax { .. })));
    }

    #[test]
    fn open_page_without_key_is_missing() {
        let mut rows = serving("{}", Target::key("items", 1));
        assert_eq!(rows.open_page("next").unwrap(), PageState::Missing);
    }

    #[test]
    fn open_page_reports_bad_array_start() {
        let mut rows = serving(r#"{"items":="#, Target::key("items", 1));
        assert!(matches!(rows.open_page("next"), Err(PageError::Syntax { .. })));
    }

    #[test]
    fn open_page_rejects_object_in_place_of_array() {
        let mut rows = serving(r#"{"items":{}}"#, Target::key("items", 1));
        assert!(matches!(
            rows.open_page("next"),
            Err(PageError::Structural { offset: 10, .. })
        ));
    }

    #[test]
    fn open_page_distinguishes_empty_and_ready() {
        let mut rows = serving("[]", Target::root());
        assert_eq!(rows.open_page("a").unwrap(), PageState::Empty);

        let mut rows = serving("[0]", Target::root());
        assert_eq!(rows.open_page("a").unwrap(), PageState::Ready);
        assert_eq!(rows.metrics().pages_opened, 1);
        assert_eq!(rows.metrics().current_page.as_deref(), Some("a"));
    }

    #[test]
    fn drop_releases_open_stream() {
        let stream = MockStream::new("[1]");
        let released = stream.released_flag();
        drop(with_body(stream));
        assert!(released.load(Ordering::SeqCst));
    }
}
