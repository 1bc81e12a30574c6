//! Readable byte streams backing a single page

use crate::error::{PageError, Result};
use std::fs::File;
use std::io::{self, Cursor, Read};

/// Byte stream for one page, owned by whoever iterates it
///
/// `release` is the explicit end of life of the stream (closing a socket,
/// returning a connection to a pool). Dropping a stream without calling it
/// must still be safe.
pub trait PageStream: Read + Send {
    /// Release resources held by the stream
    fn release(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl PageStream for File {}

impl<T: AsRef<[u8]> + Send> PageStream for Cursor<T> {}

impl PageStream for &'static [u8] {}

impl<S: PageStream + ?Sized> PageStream for Box<S> {
    fn release(&mut self) -> io::Result<()> {
        (**self).release()
    }
}

/// Adapter turning any reader into a stream whose release is a no-op
#[derive(Debug)]
pub struct NopRelease<R>(pub R);

impl<R: Read> Read for NopRelease<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: Read + Send> PageStream for NopRelease<R> {}

/// Read the rest of the stream to a sink, then release it
///
/// Draining lets transports reuse the underlying connection. Release is
/// attempted even when draining fails; the drain error is reported first.
pub fn drain_and_release<S: PageStream + ?Sized>(stream: &mut S) -> Result<u64> {
    let drained = io::copy(stream, &mut io::sink());
    let released = stream.release();

    let drained = drained.map_err(PageError::Drain)?;
    released.map_err(PageError::Release)?;
    Ok(drained)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        read: Option<io::ErrorKind>,
        release: Option<io::ErrorKind>,
        released: bool,
    }

    impl Read for Scripted {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            match self.read {
                Some(kind) => Err(io::Error::from(kind)),
                None => Ok(0),
            }
        }
    }

    impl PageStream for Scripted {
        fn release(&mut self) -> io::Result<()> {
            self.released = true;
            match self.release {
                Some(kind) => Err(io::Error::from(kind)),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn drains_remaining_bytes() {
        let mut stream = Cursor::new(b"[1,2,3]".to_vec());
        let mut first = [0u8; 2];
        stream.read_exact(&mut first).unwrap();
        assert_eq!(drain_and_release(&mut stream).unwrap(), 5);
    }

    #[test]
    fn drain_failure_is_reported_and_release_still_runs() {
        let mut stream = Scripted {
            read: Some(io::ErrorKind::BrokenPipe),
            release: None,
            released: false,
        };
        let err = drain_and_release(&mut stream).unwrap_err();
        assert!(matches!(err, PageError::Drain(_)));
        assert!(stream.released);
    }

    #[test]
    fn release_failure_is_reported() {
        let mut stream = Scripted {
            read: None,
            release: Some(io::ErrorKind::BrokenPipe),
            released: false,
        };
        let err = drain_and_release(&mut stream).unwrap_err();
        assert!(matches!(err, PageError::Release(_)));
    }

    #[test]
    fn nop_release_wraps_any_reader() {
        let mut stream: Box<dyn PageStream> = Box::new(NopRelease(io::repeat(b' ').take(4)));
        assert_eq!(drain_and_release(&mut stream).unwrap(), 4);
    }
}
