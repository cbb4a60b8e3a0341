//! Summary of the messages covered by one notification
//!
//! Small batches are listed inline in the email body. Larger ones are written
//! to a text file in the scratch directory and zipped, and the archive is
//! attached instead. Both files are recreated on every cycle; the text file is
//! left in place after zipping.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::worker::accumulator::MessageTuple;

/// Body text used when the listing is attached instead of inlined
pub const ATTACHMENT_PLACEHOLDER: &str = "Please see the attached file for more details.";

const ARCHIVE_EXTENSION: &str = "zip";

/// Errors writing the summary files
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

/// How the listing reaches the reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// Listing rendered into the body
    Inline(String),
    /// Listing written to an archive that is attached to the email
    Attachment {
        archive: PathBuf,
    },
}

impl Summary {
    /// Text for the `details` slot of the body template
    #[must_use]
    pub fn details(&self) -> &str {
        match self {
            Self::Inline(listing) => listing.as_str(),
            Self::Attachment { .. } => ATTACHMENT_PLACEHOLDER,
        }
    }

    /// Archive to attach, if any
    #[must_use]
    pub fn attachment(&self) -> Option<&Path> {
        match self {
            Self::Inline(_) => None,
            Self::Attachment { archive } => Some(archive.as_path()),
        }
    }
}

/// Chooses between an inline listing and an attached archive
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    inline_limit: usize,
    listing_path: PathBuf,
    archive_path: PathBuf,
}

impl SummaryBuilder {
    /// Creates a builder writing to `scratch_dir`
    ///
    /// The listing file is `attachment_name` without its `.zip` extension and
    /// the archive is the listing path with `.zip` appended.
    #[must_use]
    pub fn new(inline_limit: usize, scratch_dir: &Path, attachment_name: &str) -> Self {
        let stem = attachment_name
            .strip_suffix(".zip")
            .unwrap_or(attachment_name);
        let listing_path = scratch_dir.join(stem);
        let archive_path = scratch_dir.join(format!("{stem}.{ARCHIVE_EXTENSION}"));

        Self {
            inline_limit,
            listing_path,
            archive_path,
        }
    }

    #[must_use]
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    #[must_use]
    pub fn listing_path(&self) -> &Path {
        &self.listing_path
    }

    /// Builds the summary for one notification
    ///
    /// # Errors
    ///
    /// Returns `SummaryError` if either file cannot be written
    pub fn build(&self, entries: &[MessageTuple]) -> Result<Summary, SummaryError> {
        if entries.len() <= self.inline_limit {
            return Ok(Summary::Inline(inline_listing(entries)));
        }

        self.write_listing(entries)?;
        self.write_archive()?;

        Ok(Summary::Attachment {
            archive: self.archive_path.clone(),
        })
    }

    fn write_listing(&self, entries: &[MessageTuple]) -> Result<(), SummaryError> {
        info!("Creating {}...", self.listing_path.display());
        let io_err = |source: io::Error| SummaryError::Io {
            path: self.listing_path.clone(),
            source,
        };

        let mut writer = BufWriter::new(File::create(&self.listing_path).map_err(io_err)?);
        for entry in entries {
            writeln!(writer, "{entry}").map_err(io_err)?;
        }
        writer.flush().map_err(io_err)
    }

    fn write_archive(&self) -> Result<(), SummaryError> {
        info!("Creating {}...", self.archive_path.display());
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| SummaryError::Io { path, source }
        };
        let zip_err = |source: zip::result::ZipError| SummaryError::Archive {
            path: self.archive_path.clone(),
            source,
        };

        let entry_name = self
            .listing_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let archive = File::create(&self.archive_path).map_err(io_err(&self.archive_path))?;
        let mut zip = ZipWriter::new(archive);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(entry_name, options).map_err(zip_err)?;
        let mut listing = File::open(&self.listing_path).map_err(io_err(&self.listing_path))?;
        io::copy(&mut listing, &mut zip).map_err(io_err(&self.archive_path))?;
        zip.finish().map_err(zip_err)?;

        Ok(())
    }
}

/// One indented line per entry, as shown in the email body
#[must_use]
pub fn inline_listing(entries: &[MessageTuple]) -> String {
    entries
        .iter()
        .map(|entry| format!("   {entry}\n"))
        .collect()
}
