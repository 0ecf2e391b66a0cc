//! Reading and decoding a save from a storage provider.

use std::{
    io,
    path::PathBuf,
    string::{String, ToString},
    vec::Vec,
};

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    SaveData,
    sans::{Observer, save},
};

use super::storage::{OpenFile, Storage};

extern crate std;

/// Errors occurring while loading a save.
#[derive(Debug, Error)]
pub enum Error {
    /// The storage provider could not be set up.
    #[error("Storage not initialized: {} is not a directory", .root.display())]
    NotInitialized { root: PathBuf },
    /// None of the search paths could be opened.
    #[error("Save file not found. Tried {tried} paths, last: {}", .last.as_deref().unwrap_or("none"))]
    NotFound { tried: usize, last: Option<String> },
    /// The size of the save could not be read.
    #[error("Failed to get file stats for {path}: {source}")]
    Stat { path: String, source: io::Error },
    /// The save could not be read.
    #[error("Failed to read save file {path}: {source}")]
    Read { path: String, source: io::Error },
    /// The save was shorter than its reported size.
    #[error("Failed to read save file: got {actual} of {expected} bytes")]
    ShortRead { expected: u64, actual: usize },
    /// No buffer could be allocated for the save.
    #[error("Failed to allocate {size} bytes")]
    Memory { size: u64 },
    /// The save held no profiles.
    #[error(transparent)]
    Parse(#[from] save::Error),
}

impl Error {
    /// Numeric code sent to clients in error responses.
    pub fn code(&self) -> i32 {
        match self {
            Self::NotInitialized { .. } => -1,
            Self::NotFound { .. } => -2,
            Self::Stat { .. } | Self::Read { .. } | Self::ShortRead { .. } => -3,
            Self::Parse(_) => -4,
            Self::Memory { .. } => -6,
        }
    }
}

/// A short description of an error code.
pub fn describe(code: i32) -> &'static str {
    match code {
        0 => "Success",
        -1 => "Initialization failed",
        -2 => "Save file not found",
        -3 => "Read error",
        -4 => "Parse error",
        -5 => "Decryption error",
        -6 => "Memory allocation failed",
        _ => "Unknown error",
    }
}

/// Read the first save found on a list of paths.
///
/// The file is closed before this returns, whether or not reading succeeded.
/// Returns the path read and its contents.
pub fn read<S: Storage>(storage: &mut S, paths: &[&str]) -> Result<(String, Vec<u8>), Error> {
    let mut last = None;
    let mut opened = None;

    for (i, &path) in paths.iter().enumerate() {
        last = Some(path);

        match storage.open(path) {
            Ok(handle) => {
                opened = Some((path, handle));
                break;
            }
            Err(e) => debug!(attempt = i + 1, path, error = %e, "save not at path"),
        }
    }

    let Some((path, handle)) = opened else {
        return Err(Error::NotFound {
            tried: paths.len(),
            last: last.map(ToString::to_string),
        });
    };

    let mut file = OpenFile::new(storage, handle);

    let size = file.stat().map_err(|source| Error::Stat {
        path: path.to_string(),
        source,
    })?;

    let len = usize::try_from(size).map_err(|_| Error::Memory { size })?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::Memory { size })?;
    buf.resize(len, 0);

    let actual = file.read_fully(&mut buf).map_err(|source| Error::Read {
        path: path.to_string(),
        source,
    })?;

    if actual != len {
        Err(Error::ShortRead {
            expected: size,
            actual,
        })?;
    }

    info!(path, size, "read save file");
    Ok((path.to_string(), buf))
}

/// Read and decode the first save found on a list of paths.
///
/// The storage provider's file is closed before decoding begins.
pub fn load<S: Storage, O: Observer + ?Sized>(
    storage: &mut S,
    paths: &[&str],
    observer: &mut O,
) -> Result<SaveData, Error> {
    let (_, bytes) = read(storage, paths)?;

    let save = save::decode(&bytes, observer)?;

    info!(profiles = save.profiles.len(), "decoded save");
    Ok(save)
}
