//! # pecan
//!
//! Electronic component part archives.
//!
//! A part is described by two attribute tables and two optional binary assets:
//!
//! - `manifest.tsv`: archive-level metadata (name, package, description, ...)
//! - `parameters.tsv`: component-specific key/value specs
//! - `image.bmp`: a picture of the part (optional)
//! - `datasheet.pdf`: the datasheet (optional)
//!
//! ## Attribute Files
//!
//! Attribute files hold one record per line, name and value separated by a tab:
//!
//! ```text
//! Name\tLM358
//! Package\tDIP-8
//! ```
//!
//! There is no header, no comment syntax and no escaping, so names and values
//! cannot contain tabs, carriage returns or newlines.
//!
//! ## Archive Forms
//!
//! The same four files either live in a plain directory (**unpacked**) or as
//! entries of a tar file (**packed**). [`Archive::read`] accepts both, while
//! [`Archive::write`] always produces the packed form.
//!
//! ```no_run
//! use pecan::{Archive, AttributeKind};
//!
//! # fn run() -> pecan::Result<()> {
//! let mut part = Archive::new();
//! part.read("parts/lm358")?;
//! part.set_attr(AttributeKind::Manifest, "Revision", "2");
//! part.write("lm358.tar")?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod attribute;
pub mod blob;
pub mod decoder;
pub mod encoder;
pub mod error;

pub use archive::{Archive, DATASHEET_FILE, IMAGE_FILE, MANIFEST_FILE, PARAMETERS_FILE};
pub use attribute::{Attribute, AttributeKind, AttributeTable};
pub use blob::Blob;
pub use decoder::{Decoder, Lexer, ParseMode, ParserConfig, Token, TokenKind};
pub use encoder::Encoder;
pub use error::{Error, Result};
