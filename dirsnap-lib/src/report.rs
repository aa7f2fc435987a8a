use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::errors::{SnapError, SnapResult};

pub const STRUCTURE_HEADER: &str = "STRUTTURA DEL PROGETTO:";
pub const CONTENTS_HEADER: &str = "CONTENUTO DEI FILE:";

/// The assembled snapshot: tree listing plus concatenated file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Canonical root the snapshot was taken from.
    pub root: PathBuf,
    /// Files whose blocks appear in `contents`, in order.
    pub files: Vec<PathBuf>,
    /// The indented tree, lines joined with `\n`.
    pub structure: String,
    /// Every file block, each starting with its `--- FILE: ... ---` header.
    pub contents: String,
}

impl Report {
    /// Renders the full report text.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", STRUCTURE_HEADER)?;
        writeln!(f, "{}", underline(STRUCTURE_HEADER))?;
        write!(f, "{}", self.structure)?;
        write!(f, "\n\n\n{}\n", CONTENTS_HEADER)?;
        writeln!(f, "{}", underline(CONTENTS_HEADER))?;
        write!(f, "{}", self.contents)
    }
}

fn underline(header: &str) -> String {
    "=".repeat(header.chars().count())
}

/// Writes `report` to `path`, creating the file or truncating an existing one.
///
/// A failure part-way through may leave a partially written file behind.
pub fn write_report(path: &Path, report: &Report) -> SnapResult<()> {
    info!("Writing report to {:?}", path);
    let to_write_error = |source| SnapError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(to_write_error)?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(report.render().as_bytes())
        .map_err(to_write_error)?;
    writer.flush().map_err(to_write_error)?;

    debug!("Report written ({} files)", report.files.len());
    Ok(())
}
