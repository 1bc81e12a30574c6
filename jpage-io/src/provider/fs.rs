//! Pages stored as files on the local filesystem

use super::{PageResult, Provider};
use crate::context::Context;
use jpage_format::PageError;
use std::fs::File;
use tracing::trace;

/// Provider treating page ids as file paths
#[derive(Debug, Default, Clone, Copy)]
pub struct FileProvider;

/// Open each page id as a file path
pub fn file_provider() -> FileProvider {
    FileProvider
}

impl Provider for FileProvider {
    fn open(&mut self, ctx: &Context, page: &str) -> PageResult {
        ctx.check()?;
        let file = File::open(page).map_err(|err| PageError::fetch(page, err))?;
        trace!(target: "jpage::provider", path = page, "opened page file");
        Ok(Some(Box::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn opens_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        std::fs::write(&path, "[1]").unwrap();

        let mut stream = file_provider()
            .open(&Context::new(), &path.to_string_lossy())
            .unwrap()
            .unwrap();
        let mut body = String::new();
        stream.read_to_string(&mut body).unwrap();
        assert_eq!(body, "[1]");
    }

    #[test]
    fn missing_file_is_a_fetch_error() {
        match file_provider().open(&Context::new(), "/no/such/page.json") {
            Err(PageError::Fetch { page, .. }) => assert_eq!(page, "/no/such/page.json"),
            other => panic!("expected Fetch, got {:?}", other.map(|s| s.is_some())),
        }
    }

    #[test]
    fn done_context_is_checked_first() {
        let ctx = Context::new();
        ctx.cancel();
        assert!(matches!(
            file_provider().open(&ctx, "/no/such/page.json"),
            Err(PageError::Cancelled)
        ));
    }
}
