#![doc = include_str!("../README.md")]

use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

mod config;
mod errors;
mod processing;
mod report;
mod tree;

pub use config::{
    normalize_extension, SnapshotConfig, DEFAULT_BINARY_EXTENSIONS, DEFAULT_HIDDEN_ALLOWLIST,
    DEFAULT_IGNORE_DIRS, DEFAULT_IGNORE_FILES, DEFAULT_OMIT_CONTENT_FOR, DEFAULT_OUTPUT_FILENAME,
};
pub use errors::{ReadFailure, SnapError, SnapResult};
pub use processing::{
    failure_placeholder, file_header, omitted_placeholder, EMPTY_FILE_PLACEHOLDER,
};
pub use report::{write_report, Report, CONTENTS_HEADER, STRUCTURE_HEADER};
pub use tree::{ProjectTree, BRANCH, INDENT};

/// Takes a complete snapshot of `config.root`.
///
/// Runs the tree builder and then the content reader over the files it found.
/// Per-file problems (unreadable, binary, empty, omitted) never fail the call;
/// they show up as placeholder text inside [`Report::contents`].
///
/// # Errors
///
/// * [`SnapError::RootNotFound`]: the root doesn't exist or is inaccessible.
/// * [`SnapError::RootNotADirectory`]: the root is a file.
/// * [`SnapError::IoError`]: any other problem resolving the root.
///
/// # Examples
///
/// ```no_run
/// use dirsnap_lib::{snapshot, SnapshotConfig};
///
/// let mut config = SnapshotConfig::new("./my_project");
/// config.ignore_files.insert("snapshot.txt".to_string());
///
/// match snapshot(&config) {
///     Ok(report) => println!("{}", report),
///     Err(e) => eprintln!("Error running dirsnap: {}", e),
/// }
/// ```
pub fn snapshot(config: &SnapshotConfig) -> SnapResult<Report> {
    info!("Starting dirsnap run with config: {:?}", config);

    let tree = build_tree(config)?;
    info!("Found {} files to process.", tree.files.len());
    if tree.files.is_empty() {
        warn!("No files selected for processing based on current configuration.");
    }

    let contents = read_contents(&tree.files, &tree.root, config);
    let structure = tree.listing();

    Ok(Report {
        root: tree.root,
        files: tree.files,
        structure,
        contents,
    })
}

/// Walks `config.root` and returns the tree listing plus the ordered file queue.
///
/// # Errors
///
/// Fails only when the root itself cannot be resolved; see [`snapshot`].
pub fn build_tree(config: &SnapshotConfig) -> SnapResult<ProjectTree> {
    let root = resolve_root(&config.root)?;
    let root_name = tree::root_display_name(&config.root, &root);
    Ok(tree::walk_tree(&root, &root_name, config))
}

/// Concatenates a `--- FILE: ... ---` block for every path in `files`, in order.
///
/// Header paths are shown relative to `root`.
pub fn read_contents(files: &[PathBuf], root: &Path, config: &SnapshotConfig) -> String {
    processing::process_files(files, root, config)
}

fn resolve_root(root: &Path) -> SnapResult<PathBuf> {
    let canonical = root.canonicalize().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            SnapError::RootNotFound(root.to_path_buf())
        } else {
            SnapError::IoError {
                path: root.to_path_buf(),
                source: e,
            }
        }
    })?;
    if !canonical.is_dir() {
        return Err(SnapError::RootNotADirectory(root.to_path_buf()));
    }
    debug!("Canonical root: {:?}", canonical);
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    // Root directory name used by every fixture, so listings are predictable.
    const ROOT_NAME: &str = "proj";

    fn setup_root() -> Result<(TempDir, PathBuf)> {
        let dir = tempdir()?;
        let root = dir.path().join(ROOT_NAME);
        fs::create_dir(&root)?;
        Ok((dir, root))
    }

    fn write(root: &Path, rel: &str, contents: impl AsRef<[u8]>) -> Result<()> {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    fn headers(contents: &str) -> Vec<String> {
        contents
            .lines()
            .filter_map(|line| {
                line.strip_prefix("--- FILE: ")
                    .and_then(|rest| rest.strip_suffix(" ---"))
                    .map(str::to_string)
            })
            .collect()
    }

    fn relative(files: &[PathBuf], root: &Path) -> Vec<PathBuf> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_path_buf())
            .collect()
    }

    #[test]
    fn test_scenario_hidden_dir_is_pruned() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "a.txt", "hello")?;
        write(&root, ".git/x.txt", "objects")?;

        let report = snapshot(&SnapshotConfig::new(&root))?;

        assert_eq!(report.structure, "proj/\n|-- a.txt");
        assert_eq!(report.contents, "\n\n--- FILE: a.txt ---\nhello");
        Ok(())
    }

    #[test]
    fn test_scenario_binary_extension_is_omitted() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "photo.png", [0x89, b'P', b'N', b'G'])?;
        write(&root, "notes.txt", "remember the milk")?;

        let report = snapshot(&SnapshotConfig::new(&root))?;

        assert_eq!(report.structure, "proj/\n|-- notes.txt\n|-- photo.png");
        assert_eq!(
            report.contents,
            format!(
                "\n\n--- FILE: notes.txt ---\nremember the milk\n\n--- FILE: photo.png ---\n{}",
                omitted_placeholder("photo.png")
            )
        );
        Ok(())
    }

    #[test]
    fn test_scenario_empty_file_gets_placeholder() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "empty.txt", "")?;
        write(&root, "blank.txt", "  \n\t\n")?;

        let report = snapshot(&SnapshotConfig::new(&root))?;

        assert_eq!(
            report.contents,
            format!(
                "\n\n--- FILE: blank.txt ---\n{0}\n\n--- FILE: empty.txt ---\n{0}",
                EMPTY_FILE_PLACEHOLDER
            )
        );
        Ok(())
    }

    #[test]
    fn test_scenario_named_file_content_is_omitted() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, ".env", "SECRET_KEY=hunter2")?;

        let report = snapshot(&SnapshotConfig::new(&root))?;

        assert_eq!(report.structure, "proj/\n|-- .env");
        assert!(report.contents.contains(&omitted_placeholder(".env")));
        assert!(!report.contents.contains("hunter2"));
        Ok(())
    }

    #[test]
    fn test_extension_match_is_case_insensitive() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "LOGO.PNG", "not really a png")?;
        write(&root, "Cargo.Lock", "[[package]]")?;

        let report = snapshot(&SnapshotConfig::new(&root))?;

        assert!(report.contents.contains(&omitted_placeholder("LOGO.PNG")));
        assert!(report.contents.contains(&omitted_placeholder("Cargo.Lock")));
        assert!(!report.contents.contains("[[package]]"));
        Ok(())
    }

    #[test]
    fn test_ignored_dirs_are_excluded_recursively() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "index.js", "console.log(1)")?;
        write(&root, "node_modules/left-pad/index.js", "module.exports = 1")?;
        write(&root, "src/build/out.js", "generated")?;
        write(&root, "src/.cache/deep/x.txt", "cached")?;

        let tree = build_tree(&SnapshotConfig::new(&root))?;

        assert_eq!(
            tree.lines,
            vec!["proj/", "|-- index.js", "|-- src/"],
            "pruned directories must not be listed"
        );
        assert_eq!(relative(&tree.files, &tree.root), vec![PathBuf::from("index.js")]);
        Ok(())
    }

    #[test]
    fn test_files_skipped_entirely_and_hidden_allowlist() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, ".DS_Store", "junk")?;
        write(&root, ".gitignore", "target/")?;
        write(&root, ".env.example", "KEY=")?;
        write(&root, ".prettierrc", "{}")?;
        write(&root, "main.rs", "fn main() {}")?;

        let tree = build_tree(&SnapshotConfig::new(&root))?;

        assert_eq!(
            tree.lines,
            vec!["proj/", "|-- .env.example", "|-- .gitignore", "|-- main.rs"]
        );
        assert_eq!(tree.files.len(), 3);
        Ok(())
    }

    #[test]
    fn test_tree_layout_and_order() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "b.txt", "b")?;
        write(&root, "a.txt", "a")?;
        write(&root, "src/lib.rs", "pub fn x() {}")?;
        write(&root, "src/util/mod.rs", "// util")?;
        write(&root, "docs/guide.md", "# Guide")?;

        let tree = build_tree(&SnapshotConfig::new(&root))?;

        assert_eq!(
            tree.listing(),
            [
                "proj/",
                "|-- a.txt",
                "|-- b.txt",
                "|-- docs/",
                "    |-- guide.md",
                "|-- src/",
                "    |-- lib.rs",
                "    |-- util/",
                "        |-- mod.rs",
            ]
            .join("\n")
        );
        assert_eq!(
            relative(&tree.files, &tree.root),
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b.txt"),
                PathBuf::from("docs/guide.md"),
                PathBuf::from("src/lib.rs"),
                PathBuf::from("src/util/mod.rs"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_headers_match_file_queue_in_order() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "z.txt", "last")?;
        write(&root, "m/inner.txt", "inner")?;
        write(&root, "a.txt", "first")?;
        write(&root, "m/pic.jpg", "jpeg")?;
        write(&root, "m/n/empty.txt", "")?;

        let report = snapshot(&SnapshotConfig::new(&root))?;

        let expected: Vec<String> = relative(&report.files, &report.root)
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        assert_eq!(headers(&report.contents), expected);
        assert_eq!(expected.len(), 5);
        Ok(())
    }

    #[test]
    fn test_read_contents_keeps_input_order_and_duplicates() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "one.txt", "1")?;
        write(&root, "two.txt", "2")?;
        let files = vec![root.join("two.txt"), root.join("one.txt"), root.join("two.txt")];

        let contents = read_contents(&files, &root, &SnapshotConfig::new(&root));

        assert_eq!(
            contents,
            "\n\n--- FILE: two.txt ---\n2\n\n--- FILE: one.txt ---\n1\n\n--- FILE: two.txt ---\n2"
        );
        Ok(())
    }

    #[test]
    fn test_missing_file_yields_io_placeholder() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "after.txt", "still processed")?;
        let files = vec![root.join("gone.txt"), root.join("after.txt")];

        let contents = read_contents(&files, &root, &SnapshotConfig::new(&root));

        assert!(contents.contains("--- FILE: gone.txt ---\n[Errore durante la lettura di 'gone.txt': "));
        assert!(contents.ends_with("--- FILE: after.txt ---\nstill processed"));
        Ok(())
    }

    #[test]
    fn test_non_regular_file_yields_generic_placeholder() -> Result<()> {
        let (_dir, root) = setup_root()?;
        fs::create_dir(root.join("not_a_file"))?;
        let files = vec![root.join("not_a_file")];

        let contents = read_contents(&files, &root, &SnapshotConfig::new(&root));

        assert!(contents.contains("[Errore generico durante la lettura di 'not_a_file': "));
        assert!(contents.contains("is not a regular file"));
        Ok(())
    }

    #[test]
    fn test_binary_content_is_undecodable() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "blob.dat", [0x00, 0x01, 0x02, 0x00, 0xff])?;

        let report = snapshot(&SnapshotConfig::new(&root))?;

        assert!(report.structure.contains("|-- blob.dat"));
        assert!(report
            .contents
            .ends_with("[Contenuto di 'blob.dat' non leggibile come testo (probabilmente binario)]"));
        Ok(())
    }

    #[test]
    fn test_binary_detection_can_be_disabled() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "blob.dat", b"a\0b")?;
        let mut config = SnapshotConfig::new(&root);
        config.detect_binary = false;

        let report = snapshot(&config)?;

        assert!(report.contents.ends_with("--- FILE: blob.dat ---\na\0b"));
        Ok(())
    }

    #[test]
    fn test_invalid_utf8_is_replaced_and_newlines_normalised() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "latin1.txt", b"caf\xe9\r\nbar\rbaz")?;

        let report = snapshot(&SnapshotConfig::new(&root))?;

        assert!(report
            .contents
            .ends_with("--- FILE: latin1.txt ---\ncaf\u{FFFD}\nbar\nbaz"));
        Ok(())
    }

    #[test]
    fn test_config_is_injectable() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "node_modules/pkg.json", "{}")?;
        write(&root, ".hidden/keep.txt", "kept")?;
        write(&root, "vendor/lib.c", "int x;")?;
        write(&root, "data.csv", "a,b")?;

        let mut config = SnapshotConfig::without_default_sets(&root);
        config.ignore_dirs.insert("vendor".to_string());
        config.binary_extensions.insert(normalize_extension(".CSV"));
        config.include_hidden_dirs = true;

        let report = snapshot(&config)?;

        assert_eq!(
            report.structure,
            [
                "proj/",
                "|-- data.csv",
                "|-- .hidden/",
                "    |-- keep.txt",
                "|-- node_modules/",
                "    |-- pkg.json",
            ]
            .join("\n")
        );
        assert!(report.contents.contains(&omitted_placeholder("data.csv")));
        assert!(report.contents.contains("kept"));
        Ok(())
    }

    #[test]
    fn test_snapshot_is_idempotent() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "README.md", "# Title\n")?;
        write(&root, "src/main.rs", "fn main() {}\n")?;
        write(&root, "src/bin/tool.rs", "fn main() {}\n")?;

        let config = SnapshotConfig::new(&root);
        let first = snapshot(&config)?.render();
        let second = snapshot(&config)?.render();

        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_report_render_format() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "a.txt", "hello")?;

        let rendered = snapshot(&SnapshotConfig::new(&root))?.render();

        assert_eq!(
            rendered,
            "STRUTTURA DEL PROGETTO:\n=======================\nproj/\n|-- a.txt\n\n\n\
             CONTENUTO DEI FILE:\n===================\n\n\n--- FILE: a.txt ---\nhello"
        );
        Ok(())
    }

    #[test]
    fn test_write_report_overwrites_existing_file() -> Result<()> {
        let (dir, root) = setup_root()?;
        write(&root, "a.txt", "hello")?;
        let output = dir.path().join("out.txt");
        fs::write(&output, "stale content from a previous run that is much longer")?;

        let report = snapshot(&SnapshotConfig::new(&root))?;
        write_report(&output, &report)?;

        assert_eq!(fs::read_to_string(&output)?, report.render());
        Ok(())
    }

    #[test]
    fn test_write_report_error_names_path() -> Result<()> {
        let (dir, root) = setup_root()?;
        let report = snapshot(&SnapshotConfig::new(&root))?;
        let output = dir.path().join("missing_dir").join("out.txt");

        let err = write_report(&output, &report).unwrap_err();

        assert!(matches!(err, SnapError::WriteError { ref path, .. } if *path == output));
        Ok(())
    }

    #[test]
    fn test_missing_root_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("nope");

        let err = snapshot(&SnapshotConfig::new(&missing)).unwrap_err();

        assert!(matches!(err, SnapError::RootNotFound(p) if p == missing));
        Ok(())
    }

    #[test]
    fn test_file_root_is_an_error() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "file.txt", "x")?;

        let err = snapshot(&SnapshotConfig::new(root.join("file.txt"))).unwrap_err();

        assert!(matches!(err, SnapError::RootNotADirectory(_)));
        Ok(())
    }

    #[test]
    fn test_nul_after_first_kilobyte_is_undecodable() -> Result<()> {
        let (_dir, root) = setup_root()?;
        let mut bytes = vec![b'a'; 2000];
        bytes.extend_from_slice(&[0x00, 0x01, 0x02]);
        write(&root, "late_nul.txt", bytes)?;

        let report = snapshot(&SnapshotConfig::new(&root))?;

        assert!(report.contents.ends_with(
            "[Contenuto di 'late_nul.txt' non leggibile come testo (probabilmente binario)]"
        ));
        assert!(!report.contents.contains('\0'));
        Ok(())
    }

    #[test]
    fn test_utf16_with_bom_is_not_binary() -> Result<()> {
        let (_dir, root) = setup_root()?;
        // "hi" in UTF-16LE: BOM then one NUL after each ASCII byte
        write(&root, "wide.txt", [0xff, 0xfe, b'h', 0x00, b'i', 0x00])?;

        let report = snapshot(&SnapshotConfig::new(&root))?;

        assert!(!report.contents.contains("probabilmente binario"));
        Ok(())
    }

    #[test]
    fn test_root_name_ignores_trailing_dot() -> Result<()> {
        let (_dir, root) = setup_root()?;
        write(&root, "a.txt", "a")?;

        let tree = build_tree(&SnapshotConfig::new(root.join(".")))?;

        assert_eq!(tree.lines[0], "proj/");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_root_keeps_link_name() -> Result<()> {
        let (dir, root) = setup_root()?;
        write(&root, "a.txt", "a")?;
        let link = dir.path().join("alias");
        std::os::unix::fs::symlink(&root, &link)?;

        let tree = build_tree(&SnapshotConfig::new(&link))?;

        assert_eq!(tree.lines, vec!["alias/", "|-- a.txt"]);
        assert_eq!(tree.root, root.canonicalize()?);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_dir_is_not_followed() -> Result<()> {
        let (dir, root) = setup_root()?;
        let outside = dir.path().join("outside");
        fs::create_dir(&outside)?;
        fs::write(outside.join("secret.txt"), "outside the root")?;
        std::os::unix::fs::symlink(&outside, root.join("link"))?;
        write(&root, "a.txt", "a")?;

        let tree = build_tree(&SnapshotConfig::new(&root))?;

        assert_eq!(tree.lines, vec!["proj/", "|-- a.txt"]);
        Ok(())
    }
}
