//! In-memory binary files (part image, datasheet)

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// A whole binary file held in memory.
///
/// A failed load never leaves a partially filled blob behind: the previous
/// contents stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    data: Vec<u8>,
}

impl Blob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data = Vec::new();
    }

    /// Load a plain file.
    ///
    /// Fails with [`Error::PathNotFound`] if the file cannot be opened and with
    /// [`Error::FileIo`] if fewer bytes than the file's size could be read.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let mut file = File::open(path).map_err(|_| Error::PathNotFound(path.to_path_buf()))?;

        let metadata = file
            .metadata()
            .map_err(|e| Error::file_io(format!("Failed to stat file. Path: '{}'", path.display()), e))?;
        if !metadata.is_file() {
            return Err(Error::file_io_msg(format!("Not a regular file. Path: '{}'", path.display())));
        }
        let expected = metadata.len();

        let mut data = Vec::with_capacity(usize::try_from(expected).unwrap_or(0));
        let read = file
            .read_to_end(&mut data)
            .map_err(|e| Error::file_io(format!("Failed to read file. Path: '{}'", path.display()), e))?;

        if read as u64 != expected {
            return Err(Error::file_io_msg(format!(
                "Short read: expected {} bytes, got {}. Path: '{}'",
                expected,
                read,
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), len = read, "loaded blob from file");
        self.data = data;
        Ok(())
    }

    /// Load exactly `size` bytes from a container entry positioned at its data.
    ///
    /// The buffer grows with the bytes actually read, so a bogus size in a
    /// corrupt header fails as a short read instead of a huge allocation.
    pub fn load_entry<R: Read>(&mut self, reader: R, size: u64) -> Result<()> {
        let mut data = Vec::new();
        reader
            .take(size)
            .read_to_end(&mut data)
            .map_err(|e| Error::file_io(format!("Failed to read {} bytes from archive entry", size), e))?;

        if data.len() as u64 != size {
            return Err(Error::file_io_msg(format!(
                "Short read from archive entry: expected {} bytes, got {}",
                size,
                data.len()
            )));
        }

        tracing::debug!(len = size, "loaded blob from archive entry");
        self.data = data;
        Ok(())
    }
}
