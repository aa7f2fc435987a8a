use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use content_inspector::ContentType;
use log::{debug, warn};

use crate::config::SnapshotConfig;
use crate::errors::ReadFailure;

/// Written instead of content for files that are empty or whitespace-only.
pub const EMPTY_FILE_PLACEHOLDER: &str = "[File vuoto o solo spazi bianchi]";

/// Boundary line written before every file, `\n\n--- FILE: <path> ---\n`.
pub fn file_header(display_path: &Path) -> String {
    format!("\n\n--- FILE: {} ---\n", display_path.display())
}

/// Placeholder for files whose content is omitted by name or extension.
pub fn omitted_placeholder(name: &str) -> String {
    format!("[Contenuto di '{}' omesso (configurazione o tipo di file)]", name)
}

/// Placeholder for a file that could not be included, by failure category.
pub fn failure_placeholder(name: &str, failure: &ReadFailure) -> String {
    match failure {
        ReadFailure::Undecodable => format!(
            "[Contenuto di '{}' non leggibile come testo (probabilmente binario)]",
            name
        ),
        ReadFailure::Io(e) => format!("[Errore durante la lettura di '{}': {}]", name, e),
        ReadFailure::Other(msg) => {
            format!("[Errore generico durante la lettura di '{}': {}]", name, msg)
        }
    }
}

/// Reads every file in `files`, in order, and concatenates a header plus the
/// content (or a placeholder) for each one.
///
/// Headers show the path relative to `root`. Nothing here fails: every
/// per-file problem ends up as placeholder text and a logged warning.
pub(crate) fn process_files(files: &[PathBuf], root: &Path, config: &SnapshotConfig) -> String {
    debug!("Processing {} files for content.", files.len());
    let mut combined_content = String::with_capacity(files.len() * 1024);

    for file_path in files {
        let display_path = file_path.strip_prefix(root).unwrap_or(file_path);
        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| display_path.display().to_string());

        combined_content.push_str(&file_header(display_path));
        combined_content.push_str(&render_file(file_path, &name, config));
    }

    combined_content
}

fn render_file(path: &Path, name: &str, config: &SnapshotConfig) -> String {
    if config.omit_content_for.contains(name) || config.has_binary_extension(name) {
        debug!("Omitting content by configuration: {:?}", path);
        return omitted_placeholder(name);
    }

    match read_text(path, config.detect_binary) {
        Ok(content) if content.trim().is_empty() => {
            debug!("File is empty or whitespace only: {:?}", path);
            EMPTY_FILE_PLACEHOLDER.to_string()
        }
        Ok(content) => content,
        Err(failure) => {
            warn!("Could not include content of {:?}: {}", path, failure);
            failure_placeholder(name, &failure)
        }
    }
}

/// Reads a whole file as text.
///
/// Invalid UTF-8 sequences become U+FFFD and line endings are normalised to `\n`.
/// The handle lives only inside this call.
pub(crate) fn read_text(path: &Path, detect_binary: bool) -> Result<String, ReadFailure> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        // Opening a FIFO would block, so anything but a regular file is refused up front.
        return Err(ReadFailure::Other(format!(
            "'{}' is not a regular file",
            path.display()
        )));
    }

    let mut buffer = Vec::with_capacity(usize::try_from(metadata.len()).unwrap_or(0));
    let file = fs::File::open(path)?;
    BufReader::new(file).read_to_end(&mut buffer)?;

    if detect_binary && looks_binary(&buffer) {
        return Err(ReadFailure::Undecodable);
    }

    Ok(normalize_newlines(&String::from_utf8_lossy(&buffer)))
}

/// `content_inspector` only sniffs the first 1024 bytes; UTF-8 text is also
/// rejected if a NUL shows up anywhere later. UTF-16/32 legitimately contain NULs.
fn looks_binary(buffer: &[u8]) -> bool {
    match content_inspector::inspect(buffer) {
        ContentType::BINARY => true,
        ContentType::UTF_8 | ContentType::UTF_8_BOM => buffer.contains(&0),
        _ => false,
    }
}

fn normalize_newlines(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_owned()
    }
}
