//! Paginators: strategies choosing the next page identifier
//!
//! A paginator is asked for a page every time the current page runs out of
//! elements. It receives the number of elements consumed from the page that
//! just ended (zero before the first page) and either grants another page id
//! or declines, which ends the iteration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Strategy producing page identifiers
pub trait Paginator: Send {
    /// Next page id, or `None` when there are no more pages
    fn next_page(&mut self, consumed: usize) -> Option<String>;
}

impl<F> Paginator for F
where
    F: FnMut(usize) -> Option<String> + Send,
{
    fn next_page(&mut self, consumed: usize) -> Option<String> {
        self(consumed)
    }
}

/// Paginator that declines immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct Exhausted;

impl Paginator for Exhausted {
    fn next_page(&mut self, _consumed: usize) -> Option<String> {
        None
    }
}

/// Paginator handing out a fixed sequence of page ids
#[derive(Debug, Clone)]
pub struct Pages<I> {
    ids: I,
}

/// Grant each id of `ids` in order, ignoring consumed counts
pub fn pages<I>(ids: I) -> Pages<I::IntoIter>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    Pages {
        ids: ids.into_iter(),
    }
}

impl<I> Paginator for Pages<I>
where
    I: Iterator + Send,
    I::Item: Into<String>,
{
    fn next_page(&mut self, _consumed: usize) -> Option<String> {
        self.ids.next().map(Into::into)
    }
}

/// Paginator over the regular files of a folder, in lexical order
#[derive(Debug)]
pub struct FolderPages {
    files: std::vec::IntoIter<PathBuf>,
}

impl FolderPages {
    /// Files still to be granted
    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

/// List `folder` once and grant its files one per page
///
/// Sub-directories are skipped. A folder that cannot be listed is logged and
/// yields a paginator that declines immediately.
pub fn scan_folder(folder: impl AsRef<Path>) -> FolderPages {
    let folder = folder.as_ref();
    let files = match list_files(folder) {
        Ok(files) => {
            debug!(
                target: "jpage::paginator",
                folder = %folder.display(),
                files = files.len(),
                "listed page folder"
            );
            files
        }
        Err(err) => {
            warn!(
                target: "jpage::paginator",
                folder = %folder.display(),
                error = %err,
                "cannot list page folder"
            );
            Vec::new()
        }
    };
    FolderPages {
        files: files.into_iter(),
    }
}

fn list_files(folder: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        files.push(entry.path());
    }
    files.sort();
    Ok(files)
}

impl Paginator for FolderPages {
    fn next_page(&mut self, _consumed: usize) -> Option<String> {
        self.files
            .next()
            .map(|path| path.to_string_lossy().into_owned())
    }
}

/// Numbered pages of a fixed size
///
/// The first call grants `first_page`. Later calls grant the following page
/// only when the previous page delivered exactly `limit` elements; a short
/// page is taken as the last one. A zero limit grants the first page only.
pub struct LimitPaginator<F> {
    limit: usize,
    page: usize,
    started: bool,
    make_id: F,
}

impl<F> LimitPaginator<F>
where
    F: FnMut(usize, usize) -> String,
{
    /// `make_id(page, limit)` renders the id of each granted page
    pub fn new(limit: usize, first_page: usize, make_id: F) -> Self {
        Self {
            limit,
            page: first_page,
            started: false,
            make_id,
        }
    }

    /// Page number most recently granted, or the first page before any call
    pub fn page(&self) -> usize {
        self.page
    }
}

impl<F> Paginator for LimitPaginator<F>
where
    F: FnMut(usize, usize) -> String + Send,
{
    fn next_page(&mut self, consumed: usize) -> Option<String> {
        if self.started {
            if self.limit == 0 || consumed != self.limit {
                return None;
            }
            self.page += 1;
        }
        self.started = true;
        Some((self.make_id)(self.page, self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_paginators() {
        let mut granted = false;
        let mut paginator = move |_consumed: usize| {
            if granted {
                None
            } else {
                granted = true;
                Some("only".to_string())
            }
        };
        assert_eq!(paginator.next_page(0).as_deref(), Some("only"));
        assert_eq!(paginator.next_page(3), None);
    }

    #[test]
    fn pages_grants_in_order() {
        let mut paginator = pages(["a", "b"]);
        assert_eq!(paginator.next_page(0).as_deref(), Some("a"));
        assert_eq!(paginator.next_page(10).as_deref(), Some("b"));
        assert_eq!(paginator.next_page(0), None);
    }

    #[test]
    fn exhausted_never_grants() {
        assert_eq!(Exhausted.next_page(0), None);
    }

    #[test]
    fn limit_paginator_stops_on_short_page() {
        let mut paginator = LimitPaginator::new(3, 1, |page, limit| format!("p{page}l{limit}"));
        assert_eq!(paginator.next_page(0).as_deref(), Some("p1l3"));
        assert_eq!(paginator.next_page(3).as_deref(), Some("p2l3"));
        assert_eq!(paginator.next_page(3).as_deref(), Some("p3l3"));
        assert_eq!(paginator.next_page(2), None);
        assert_eq!(paginator.page(), 3);
    }

    #[test]
    fn limit_paginator_with_zero_limit_grants_once() {
        let mut paginator = LimitPaginator::new(0, 0, |page, _| page.to_string());
        assert_eq!(paginator.next_page(0).as_deref(), Some("0"));
        assert_eq!(paginator.next_page(0), None);
    }

    #[test]
    fn missing_folder_declines() {
        let mut paginator = scan_folder("/definitely/not/a/real/folder");
        assert_eq!(paginator.remaining(), 0);
        assert_eq!(paginator.next_page(0), None);
    }
}
