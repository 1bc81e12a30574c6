//! Execution context: cancellation and deadlines for page fetches
//!
//! A [`Context`] is cheap to clone and shared between the iterator, its
//! providers, and whoever is allowed to cancel the work. Page bodies are read
//! through a [`ContextReader`] so a cancelled context also stops reads that
//! are already in flight.

use jpage_format::{PageError, Result};
use std::fmt;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct Shared {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

/// Cancellation flag plus optional deadline
#[derive(Clone, Default)]
pub struct Context {
    shared: Arc<Shared>,
}

impl Context {
    /// Context that is never done unless cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            shared: Arc::new(Shared {
                cancelled: AtomicBool::new(false),
                deadline: Some(deadline),
            }),
        }
    }

    /// Context that expires `timeout` from now
    ///
    /// A timeout too large to represent behaves like no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::new(),
        }
    }

    /// Cancel the context; every clone observes it
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
    }

    /// True once `cancel` was called on any clone
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Configured deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.shared.deadline
    }

    /// Time left before the deadline; zero once it has passed
    pub fn remaining(&self) -> Option<Duration> {
        self.shared
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Cancelled or past the deadline
    pub fn is_done(&self) -> bool {
        self.check().is_err()
    }

    /// `Ok` while the context is live, otherwise the reason it is done
    ///
    /// Cancellation takes precedence over an expired deadline.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(PageError::Cancelled);
        }
        match self.shared.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(PageError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.shared.deadline)
            .finish()
    }
}

/// Reader that fails once its context is done
#[derive(Debug)]
pub struct ContextReader<R> {
    ctx: Context,
    inner: R,
}

impl<R> ContextReader<R> {
    /// Wrap `inner` so reads observe `ctx`
    pub fn new(ctx: Context, inner: R) -> Self {
        Self { ctx, inner }
    }

    /// Unwrap the reader, bypassing the context
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ContextReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // Interrupted would be retried by read_exact and BufReader callers
        self.ctx.check().map_err(io::Error::other)?;
        self.inner.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn fresh_context_is_live() {
        let ctx = Context::new();
        assert!(ctx.check().is_ok());
        assert!(!ctx.is_done());
        assert!(ctx.remaining().is_none());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let ctx = Context::new();
        let clone = ctx.clone();
        clone.cancel();
        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.check(), Err(PageError::Cancelled)));
    }

    #[test]
    fn expired_deadline_is_reported() {
        let ctx = Context::with_deadline(Instant::now());
        assert!(matches!(ctx.check(), Err(PageError::DeadlineExceeded)));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn cancellation_wins_over_deadline() {
        let ctx = Context::with_deadline(Instant::now());
        ctx.cancel();
        assert!(matches!(ctx.check(), Err(PageError::Cancelled)));
    }

    #[test]
    fn huge_timeout_means_no_deadline() {
        let ctx = Context::with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn reader_stops_after_cancel() {
        let ctx = Context::new();
        let mut reader = ContextReader::new(ctx.clone(), Cursor::new(b"[1,2]".to_vec()));
        let mut buf = [0u8; 2];
        assert_eq!(reader.read(&mut buf).unwrap(), 2);

        ctx.cancel();
        let err = reader.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);

        // the wrapped reader is untouched and still usable
        let mut inner = reader.into_inner();
        let mut rest = Vec::new();
        inner.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b",2]");
    }
}
