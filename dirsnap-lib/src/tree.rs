use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::SnapshotConfig;

/// Indentation added per nesting level.
pub const INDENT: &str = "    ";
/// Marker placed in front of every listed directory and file.
pub const BRANCH: &str = "|-- ";

/// Result of walking the root: the rendered listing and the files to read.
///
/// `files` holds exactly the files shown in `lines`, in the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectTree {
    /// Canonical root the walk started from.
    pub root: PathBuf,
    /// One entry per rendered line, root first.
    pub lines: Vec<String>,
    /// Full paths of the retained files, in discovery order.
    pub files: Vec<PathBuf>,
}

impl ProjectTree {
    /// The listing as a single newline-separated string (no trailing newline).
    pub fn listing(&self) -> String {
        self.lines.join("\n")
    }
}

/// Walks `root` top-down and renders the indented tree.
///
/// Within each directory the files come first, sorted by name, followed by the
/// subdirectories (also sorted by name), each fully rendered before the next.
/// Excluded and hidden directories are pruned before they are opened.
/// Crate-public as it's only called by `build_tree` in lib.rs, after the root
/// has been canonicalized.
pub(crate) fn walk_tree(
    root: &Path,
    root_name: &str,
    config: &SnapshotConfig,
) -> ProjectTree {
    debug!("Walking tree rooted at {:?}", root);
    let mut tree = ProjectTree {
        root: root.to_path_buf(),
        ..ProjectTree::default()
    };

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by(|a, b| {
            // false < true: plain files sort ahead of directories
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|entry| keep_entry(entry, config));

    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                let path_display = e.path().map_or_else(
                    || root.display().to_string(),
                    |p| p.display().to_string(),
                );
                warn!(
                    "Skipping path due to error during walk near {}: {}",
                    path_display, e
                );
                continue;
            }
        };

        let depth = entry.depth();
        let name = entry.file_name().to_string_lossy().into_owned();

        if entry.file_type().is_dir() {
            if depth == 0 {
                tree.lines.push(format!("{}/", root_name));
            } else {
                tree.lines
                    .push(format!("{}{}{}/", INDENT.repeat(depth - 1), BRANCH, name));
            }
            continue;
        }

        // Symlinked directories are never descended into, and not listed either.
        if entry.path_is_symlink() && entry.path().is_dir() {
            debug!("Skipping symlinked directory: {:?}", entry.path());
            continue;
        }

        if !keep_file(&name, config) {
            debug!("Excluding file from tree: {:?}", entry.path());
            continue;
        }

        tree.lines
            .push(format!("{}{}{}", INDENT.repeat(depth - 1), BRANCH, name));
        tree.files.push(entry.into_path());
    }

    debug!(
        "Tree has {} lines and {} files",
        tree.lines.len(),
        tree.files.len()
    );
    tree
}

/// Pruning predicate handed to `filter_entry`. Only directories below the root
/// are ever rejected here; file rules are applied in the main loop.
fn keep_entry(entry: &DirEntry, config: &SnapshotConfig) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    let keep = keep_dir(&name, config);
    if !keep {
        debug!("Pruning directory: {:?}", entry.path());
    }
    keep
}

pub(crate) fn keep_dir(name: &str, config: &SnapshotConfig) -> bool {
    if config.ignore_dirs.contains(name) {
        return false;
    }
    config.include_hidden_dirs || !is_hidden(name)
}

/// Hidden files survive if allow-listed, or if they are named in `omit_content_for`
/// (those are listed with a placeholder, e.g. `.env`).
pub(crate) fn keep_file(name: &str, config: &SnapshotConfig) -> bool {
    if config.ignore_files.contains(name) {
        return false;
    }
    !is_hidden(name)
        || config.hidden_allowlist.contains(name)
        || config.omit_content_for.contains(name)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Name shown on the root line: the last component of `requested` made absolute
/// without resolving symlinks, so a symlinked root keeps the link's name.
///
/// Falls back to `canonical` when `requested` ends in `..`, and renders `/` as an
/// empty name (the line then reads just `/`).
pub(crate) fn root_display_name(requested: &Path, canonical: &Path) -> String {
    let absolute = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(requested))
            .unwrap_or_else(|_| canonical.to_path_buf())
    };
    absolute
        .file_name()
        .or_else(|| canonical.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
