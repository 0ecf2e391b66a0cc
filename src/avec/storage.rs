//! Storage providers holding save files.

use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
    vec::Vec,
};

use super::load::Error;

extern crate std;

/// Paths searched for a save, in order.
///
/// Wii Fit Plus stores its body tests in `FitPlus0.dat`, though some releases
/// use `RPHealth.dat`, as the original Wii Fit does. Title directories cover
/// the Japanese, American and European releases, from disc and from the
/// channel.
pub const SAVE_PATHS: [&str; 12] = [
    "/title/00010000/5246504a/data/FitPlus0.dat",
    "/title/00010000/52465045/data/FitPlus0.dat",
    "/title/00010000/52465050/data/FitPlus0.dat",
    "/title/00010000/5246504A/data/FitPlus0.dat",
    "/title/00010000/5246504a/data/RPHealth.dat",
    "/title/00010000/52465045/data/RPHealth.dat",
    "/title/00010000/52465050/data/RPHealth.dat",
    "/title/00010004/5246504a/data/FitPlus0.dat",
    "/title/00010004/52465045/data/FitPlus0.dat",
    "/title/00010000/52464e4a/data/RPHealth.dat",
    "/title/00010000/52464e45/data/RPHealth.dat",
    "/title/00010000/52464e50/data/RPHealth.dat",
];

/// A store of files, opened by path.
pub trait Storage {
    /// An open file.
    type Handle;

    /// Open a file for reading.
    fn open(&mut self, path: &str) -> io::Result<Self::Handle>;
    /// Size of an open file in bytes.
    fn stat(&mut self, handle: &mut Self::Handle) -> io::Result<u64>;
    /// Fill a buffer from an open file, returning the number of bytes read.
    ///
    /// Returns fewer bytes than requested only at the end of the file.
    fn read_fully(&mut self, handle: &mut Self::Handle, buf: &mut [u8]) -> io::Result<usize>;
    /// Close an open file.
    fn close(&mut self, handle: Self::Handle);
}

/// A directory tree standing in for the console's NAND filesystem.
///
/// Paths are resolved relative to the root, so `/title/...` names a file
/// under `<root>/title/...`.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Use a directory as the filesystem root.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();

        if !root.is_dir() {
            Err(Error::NotInitialized { root: root.clone() })?;
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Storage for FsStorage {
    type Handle = File;

    fn open(&mut self, path: &str) -> io::Result<File> {
        File::open(self.root.join(path.trim_start_matches('/')))
    }

    fn stat(&mut self, handle: &mut File) -> io::Result<u64> {
        Ok(handle.metadata()?.len())
    }

    fn read_fully(&mut self, handle: &mut File, buf: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;

        while n < buf.len() {
            match handle.read(&mut buf[n..]) {
                Ok(0) => break,
                Ok(m) => n += m,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }

        Ok(n)
    }

    fn close(&mut self, handle: File) {
        drop(handle);
    }
}

/// A file opened from a storage provider, closed when dropped.
pub(super) struct OpenFile<'s, S: Storage> {
    storage: &'s mut S,
    handle: Option<S::Handle>,
}

impl<'s, S: Storage> OpenFile<'s, S> {
    pub(super) fn new(storage: &'s mut S, handle: S::Handle) -> Self {
        Self {
            storage,
            handle: Some(handle),
        }
    }

    pub(super) fn stat(&mut self) -> io::Result<u64> {
        match &mut self.handle {
            Some(handle) => self.storage.stat(handle),
            None => Err(io::ErrorKind::NotConnected.into()),
        }
    }

    pub(super) fn read_fully(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.handle {
            Some(handle) => self.storage.read_fully(handle, buf),
            None => Err(io::ErrorKind::NotConnected.into()),
        }
    }
}

impl<S: Storage> Drop for OpenFile<'_, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.storage.close(handle);
        }
    }
}

/// Whether a search path could be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe<'p> {
    pub path: &'p str,
    pub result: Result<(), io::ErrorKind>,
}

/// Try opening each path, closing any that open.
///
/// Useful to find out why a save could not be found.
pub fn probe<'p, S: Storage>(storage: &mut S, paths: &[&'p str]) -> Vec<Probe<'p>> {
    paths
        .iter()
        .map(|&path| {
            let result = storage.open(path).map(|h| storage.close(h)).map_err(|e| e.kind());
            Probe { path, result }
        })
        .collect()
}
