use std::collections::BTreeSet;
use std::path::PathBuf;

/// Default name of the report file written by the `dirsnap` CLI.
pub const DEFAULT_OUTPUT_FILENAME: &str = "project_structure_and_content.txt";

/// Directories that are never listed nor descended into.
pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "__pycache__",
    ".vscode",
    ".idea",
    "venv",
];

/// Extensions (lowercase, without the dot) whose content is replaced by a placeholder.
pub const DEFAULT_BINARY_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "svg", "ico", "webp",
    // media
    "mp3", "wav", "ogg", "mp4", "mov", "avi",
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    // archives
    "zip", "tar", "gz", "rar", "jar", "war",
    // executables and libraries
    "exe", "dll", "so", "o", "a", "lib",
    "pyc",
    // lockfiles tend to be huge
    "lock",
];

/// File names that are listed in the tree but whose content is never read.
pub const DEFAULT_OMIT_CONTENT_FOR: &[&str] =
    &[".env", ".env.local", "package-lock.json", "yarn.lock"];

/// File names that are left out of both the tree and the content section.
pub const DEFAULT_IGNORE_FILES: &[&str] = &[".DS_Store"];

/// Hidden files that are still listed and read.
pub const DEFAULT_HIDDEN_ALLOWLIST: &[&str] = &[".gitignore", ".env.example"];

/// Configuration for a snapshot run.
///
/// Built once by the caller (usually the CLI) and passed by reference to both
/// the tree builder and the content reader. Nothing in the library keeps its
/// own copy of these rules, so tests can hand in any combination they like.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Directory whose structure and contents are captured.
    /// It is canonicalized internally before walking.
    pub root: PathBuf,

    /// Directory names pruned from the walk. Matching is on the bare name, at any depth.
    pub ignore_dirs: BTreeSet<String>,

    /// Extensions whose content is omitted, compared case-insensitively.
    /// Stored lowercase and without the leading dot (see [`normalize_extension`]).
    pub binary_extensions: BTreeSet<String>,

    /// Exact file names whose content is omitted (e.g. `.env`).
    pub omit_content_for: BTreeSet<String>,

    /// Exact file names dropped from the tree and the content section.
    /// The caller is expected to add the name of its own output file here.
    pub ignore_files: BTreeSet<String>,

    /// Hidden files (leading `.`) that are kept anyway.
    pub hidden_allowlist: BTreeSet<String>,

    /// If true, directories starting with `.` are walked like any other directory
    /// (names in `ignore_dirs` are still pruned).
    pub include_hidden_dirs: bool,

    /// If true, file bytes are inspected and binary content is reported as
    /// undecodable instead of being dumped into the report. A UTF-8 file counts
    /// as binary if it contains a NUL byte anywhere; UTF-16/32 files detected by
    /// their BOM are read as text.
    pub detect_binary: bool,
}

impl SnapshotConfig {
    /// Default rules rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Default toggles, but every name set starts empty.
    pub fn without_default_sets(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore_dirs: BTreeSet::new(),
            binary_extensions: BTreeSet::new(),
            omit_content_for: BTreeSet::new(),
            ignore_files: BTreeSet::new(),
            hidden_allowlist: BTreeSet::new(),
            include_hidden_dirs: false,
            detect_binary: true,
        }
    }

    /// Returns true if `name` carries an extension listed in `binary_extensions`.
    pub(crate) fn has_binary_extension(&self, name: &str) -> bool {
        std::path::Path::new(name)
            .extension()
            .is_some_and(|ext| {
                self.binary_extensions
                    .contains(&ext.to_string_lossy().to_lowercase())
            })
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            ignore_dirs: to_set(DEFAULT_IGNORE_DIRS),
            binary_extensions: to_set(DEFAULT_BINARY_EXTENSIONS),
            omit_content_for: to_set(DEFAULT_OMIT_CONTENT_FOR),
            ignore_files: to_set(DEFAULT_IGNORE_FILES),
            hidden_allowlist: to_set(DEFAULT_HIDDEN_ALLOWLIST),
            include_hidden_dirs: false,
            detect_binary: true,
        }
    }
}

/// Normalizes a user-supplied extension: trims it, strips one leading `.` and lowercases it.
///
/// Returns an empty string for input that is blank after trimming.
pub fn normalize_extension(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('.')
        .unwrap_or(trimmed)
        .to_lowercase()
}

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}
