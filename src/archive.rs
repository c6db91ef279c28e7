//! Component archive: attribute tables and blobs, read from a directory or a tar file

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::attribute::{Attribute, AttributeKind, AttributeTable};
use crate::blob::Blob;
use crate::decoder::{Decoder, ParserConfig};
use crate::encoder::Encoder;
use crate::error::{self, record, Error, Result};

// Archive member names, identical in both forms
pub const MANIFEST_FILE: &str = "manifest.tsv";
pub const PARAMETERS_FILE: &str = "parameters.tsv";
pub const IMAGE_FILE: &str = "image.bmp";
pub const DATASHEET_FILE: &str = "datasheet.pdf";

const ENTRY_MODE: u32 = 0o644;

/// An electronic component part.
///
/// Populated by one of [`Archive::read`], [`Archive::read_unpacked`] or
/// [`Archive::read_packed`]. When a read fails half way the archive may hold
/// part of the source; call [`Archive::clear`] before reusing it.
#[derive(Debug, Clone)]
pub struct Archive {
    source_name: Option<PathBuf>,
    pub manifest: AttributeTable,
    pub parameters: AttributeTable,
    pub image: Blob,
    pub datasheet: Blob,
    config: ParserConfig,
}

impl Default for Archive {
    fn default() -> Self {
        Self::with_config(ParserConfig::default())
    }
}

impl Archive {
    /// Create a new empty archive with strict attribute parsing
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            source_name: None,
            manifest: AttributeTable::new(AttributeKind::Manifest),
            parameters: AttributeTable::new(AttributeKind::Parameters),
            image: Blob::new(),
            datasheet: Blob::new(),
            config,
        }
    }

    /// Path this archive was last read from
    pub fn source_name(&self) -> Option<&Path> {
        self.source_name.as_deref()
    }

    /// Drop all content and clear the last error message
    pub fn clear(&mut self) {
        self.source_name = None;
        self.reset_content();
        error::clear_last_error();
    }

    fn reset_content(&mut self) {
        self.manifest.clear();
        self.parameters.clear();
        self.image.clear();
        self.datasheet.clear();
    }

    pub fn table(&self, kind: AttributeKind) -> &AttributeTable {
        match kind {
            AttributeKind::Manifest => &self.manifest,
            AttributeKind::Parameters => &self.parameters,
        }
    }

    pub fn table_mut(&mut self, kind: AttributeKind) -> &mut AttributeTable {
        match kind {
            AttributeKind::Manifest => &mut self.manifest,
            AttributeKind::Parameters => &mut self.parameters,
        }
    }

    /// Append an attribute without checking whether the name already exists
    pub fn add_attr(&mut self, kind: AttributeKind, attr: Attribute) {
        self.table_mut(kind).push(attr);
    }

    pub fn add_attr_str(&mut self, kind: AttributeKind, name: &str, value: &str) {
        self.add_attr(kind, Attribute::new(name, value));
    }

    /// Set the value of an attribute, creating it if it doesn't exist yet
    pub fn set_attr(&mut self, kind: AttributeKind, name: &str, value: &str) {
        self.table_mut(kind).set(name, value);
    }

    pub fn get_attr(&self, kind: AttributeKind, name: &str) -> Option<&Attribute> {
        self.table(kind).get(name)
    }

    pub fn get_attr_idx(&self, kind: AttributeKind, index: usize) -> Option<&Attribute> {
        self.table(kind).get_index(index)
    }

    pub fn attr_len(&self, kind: AttributeKind) -> usize {
        self.table(kind).len()
    }

    /// Parse an attribute file and append its records to the `kind` table
    pub fn parse_attributes(&mut self, kind: AttributeKind, contents: &[u8]) -> Result<()> {
        record(self.decode_table(kind, contents))
    }

    /// Read an archive in either form.
    ///
    /// Directories are read as unpacked archives, files as packed ones. A path
    /// that doesn't exist fails with [`Error::PathNotFound`] and leaves the
    /// archive untouched.
    pub fn read(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if path.is_dir() {
            self.read_unpacked(path)
        } else if path.exists() {
            self.read_packed(path)
        } else {
            record(Err(Error::PathNotFound(path.to_path_buf())))
        }
    }

    /// Read an unpacked archive directory
    pub fn read_unpacked(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        record(self.read_dir(dir.as_ref()))
    }

    fn read_dir(&mut self, dir: &Path) -> Result<()> {
        tracing::debug!(path = %dir.display(), "reading unpacked archive");

        let manifest = read_required(&dir.join(MANIFEST_FILE))?;
        self.reset_content();
        self.source_name = Some(dir.to_path_buf());
        self.decode_table(AttributeKind::Manifest, &manifest)?;

        let parameters = read_required(&dir.join(PARAMETERS_FILE))?;
        self.decode_table(AttributeKind::Parameters, &parameters)?;

        load_optional_blob(&mut self.image, &dir.join(IMAGE_FILE))?;
        load_optional_blob(&mut self.datasheet, &dir.join(DATASHEET_FILE))?;

        Ok(())
    }

    /// Read a packed (tar) archive
    pub fn read_packed(&mut self, path: impl AsRef<Path>) -> Result<()> {
        record(self.read_tar(path.as_ref()))
    }

    fn read_tar(&mut self, path: &Path) -> Result<()> {
        tracing::debug!(path = %path.display(), "reading packed archive");

        // The file handle lives inside `tar` and is closed on every return path.
        let file = File::open(path)
            .map_err(|e| Error::file_io(format!("Failed to open archive. Path: '{}'", path.display()), e))?;
        let mut tar = tar::Archive::new(file);
        let entries = tar
            .entries()
            .map_err(|e| Error::file_io(format!("Not a valid archive. Path: '{}'", path.display()), e))?;

        let mut manifest: Option<Blob> = None;
        let mut parameters: Option<Blob> = None;
        let mut image: Option<Blob> = None;
        let mut datasheet: Option<Blob> = None;

        for entry in entries {
            let mut entry = entry
                .map_err(|e| Error::file_io(format!("Corrupt archive entry. Path: '{}'", path.display()), e))?;
            let name = entry.path_bytes().into_owned();
            let size = entry.size();

            let slot = match name.as_slice() {
                n if n == MANIFEST_FILE.as_bytes() => &mut manifest,
                n if n == PARAMETERS_FILE.as_bytes() => &mut parameters,
                n if n == IMAGE_FILE.as_bytes() => &mut image,
                n if n == DATASHEET_FILE.as_bytes() => &mut datasheet,
                _ => {
                    tracing::debug!(entry = %String::from_utf8_lossy(&name), "skipping unknown entry");
                    continue;
                }
            };

            if slot.is_some() {
                tracing::debug!(entry = %String::from_utf8_lossy(&name), "skipping duplicate entry");
                continue;
            }

            let mut blob = Blob::new();
            blob.load_entry(&mut entry, size)?;
            tracing::debug!(entry = %String::from_utf8_lossy(&name), size, "read entry");
            *slot = Some(blob);
        }

        let manifest = manifest.ok_or_else(|| Error::file_io_msg("manifest not found"))?;
        self.reset_content();
        self.source_name = Some(path.to_path_buf());
        self.decode_table(AttributeKind::Manifest, manifest.data())?;

        let parameters = parameters.ok_or_else(|| Error::file_io_msg("parameters not found"))?;
        self.decode_table(AttributeKind::Parameters, parameters.data())?;

        if let Some(image) = image {
            self.image = image;
        }
        if let Some(datasheet) = datasheet {
            self.datasheet = datasheet;
        }

        Ok(())
    }

    fn decode_table(&mut self, kind: AttributeKind, contents: &[u8]) -> Result<()> {
        let decoder = Decoder::with_config(self.config.clone());
        decoder.decode_into(contents, self.table_mut(kind))
    }

    /// Write the archive as a tar file, replacing anything at `path`
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        record(self.write_tar(path.as_ref()))
    }

    fn write_tar(&self, path: &Path) -> Result<()> {
        tracing::debug!(path = %path.display(), "writing packed archive");

        let file = File::create(path)
            .map_err(|e| Error::file_io(format!("Failed to create archive. Path: '{}'", path.display()), e))?;

        // Dropping the builder on an error path still writes the trailer and closes the file.
        let mut builder = tar::Builder::new(file);
        let encoder = Encoder::new();

        append_entry(&mut builder, MANIFEST_FILE, encoder.encode(&self.manifest).as_bytes())?;
        append_entry(&mut builder, PARAMETERS_FILE, encoder.encode(&self.parameters).as_bytes())?;
        if !self.image.is_empty() {
            append_entry(&mut builder, IMAGE_FILE, self.image.data())?;
        }
        if !self.datasheet.is_empty() {
            append_entry(&mut builder, DATASHEET_FILE, self.datasheet.data())?;
        }

        let mut file = builder
            .into_inner()
            .map_err(|e| Error::file_io(format!("Failed to finalize archive. Path: '{}'", path.display()), e))?;
        file.flush()
            .map_err(|e| Error::file_io(format!("Failed to flush archive. Path: '{}'", path.display()), e))?;

        Ok(())
    }

    /// Write the archive as a directory. Not supported yet.
    pub fn write_unpacked(&self, _dir: impl AsRef<Path>) -> Result<()> {
        record(Err(Error::NotImplemented("writing unpacked archives")))
    }
}

/// Read a mandatory attribute file
fn read_required(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|_| Error::PathNotFound(path.to_path_buf()))
}

fn load_optional_blob(blob: &mut Blob, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    blob.load_file(path).map_err(|e| match e {
        Error::PathNotFound(p) => Error::file_io_msg(format!("Failed to open file. Path: '{}'", p.display())),
        other => other,
    })
}

fn append_entry<W: Write>(builder: &mut tar::Builder<W>, name: &str, data: &[u8]) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_mode(ENTRY_MODE);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);

    builder
        .append_data(&mut header, name, data)
        .map_err(|e| Error::file_io(format!("Failed to write archive entry '{}'", name), e))?;
    tracing::debug!(entry = name, size = data.len(), "wrote entry");
    Ok(())
}
