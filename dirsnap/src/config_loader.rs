use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use log::{debug, info};
use serde::Deserialize;

use dirsnap_lib::{normalize_extension, SnapshotConfig, DEFAULT_OUTPUT_FILENAME};

use crate::Cli;

/// Name of the per-project config file looked up in the root.
pub const LOCAL_CONFIG_FILENAME: &str = ".dirsnap.toml";

/// Everything the binary needs for one run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub snapshot: SnapshotConfig,
    pub output: PathBuf,
    pub to_stdout: bool,
}

/// Merges built-in defaults, config files and CLI flags into [`RunSettings`].
///
/// Precedence, lowest first: global config, local `.dirsnap.toml`, `--config`, CLI.
/// List values are appended across sources; scalar values are overwritten.
pub fn build_run_settings(cli: &Cli, root: &Path) -> Result<RunSettings> {
    let mut acc = SettingsAccum::default();

    if !cli.no_config {
        if let Some(base_dirs) = BaseDirs::new() {
            let global_config_path = base_dirs.config_dir().join("dirsnap").join("config.toml");
            apply_config_file(&global_config_path, &mut acc)?;
        } else {
            debug!("No base directories available; skipping global config search");
        }

        let local_config_path = root.join(LOCAL_CONFIG_FILENAME);
        apply_config_file(&local_config_path, &mut acc)?;

        if let Some(explicit_path) = cli.config_path.as_ref() {
            apply_config_file(explicit_path, &mut acc)?;
        }
    } else if let Some(explicit_path) = cli.config_path.as_ref() {
        debug!(
            "--no-config specified; skipping explicitly requested config file {:?}",
            explicit_path
        );
    }

    // CLI overrides (highest precedence)
    if cli.no_defaults {
        acc.use_defaults = Some(false);
    }
    if cli.include_hidden_dirs {
        acc.include_hidden_dirs = Some(true);
    }
    if cli.no_binary_detection {
        acc.detect_binary = Some(false);
    }
    if let Some(output) = cli.output.as_ref() {
        acc.output = Some(output.clone());
    }

    acc.ignore_dirs.merge(split_values(&cli.exclude_dirs));
    acc.ignore_files.merge(split_values(&cli.skip_files));
    acc.binary_extensions
        .merge(split_values(&cli.omit_extensions).map(normalize_extension));
    acc.omit_content_for.merge(split_values(&cli.omit_files));
    acc.hidden_allowlist.merge(split_values(&cli.allow_hidden));

    let output = acc
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILENAME));

    // The report must never show up in its own next run.
    if let Some(name) = output.file_name().and_then(|n| n.to_str()) {
        debug!("Skipping output file name {:?} during the walk", name);
        acc.ignore_files.push(name);
    }

    let snapshot = acc.into_snapshot_config(root);
    info!(
        "Using {} ignored dirs, {} ignored files, {} omitted extensions, {} omitted files",
        snapshot.ignore_dirs.len(),
        snapshot.ignore_files.len(),
        snapshot.binary_extensions.len(),
        snapshot.omit_content_for.len()
    );

    Ok(RunSettings {
        snapshot,
        output,
        to_stdout: cli.stdout,
    })
}

#[derive(Debug, Default)]
struct SettingsAccum {
    output: Option<PathBuf>,
    use_defaults: Option<bool>,
    include_hidden_dirs: Option<bool>,
    detect_binary: Option<bool>,
    ignore_dirs: NameAccumulator,
    binary_extensions: NameAccumulator,
    omit_content_for: NameAccumulator,
    ignore_files: NameAccumulator,
    hidden_allowlist: NameAccumulator,
}

impl SettingsAccum {
    fn into_snapshot_config(self, root: &Path) -> SnapshotConfig {
        let mut config = if self.use_defaults.unwrap_or(true) {
            SnapshotConfig::new(root)
        } else {
            SnapshotConfig::without_default_sets(root)
        };

        config.ignore_dirs.extend(self.ignore_dirs.names);
        config.binary_extensions.extend(self.binary_extensions.names);
        config.omit_content_for.extend(self.omit_content_for.names);
        config.ignore_files.extend(self.ignore_files.names);
        config.hidden_allowlist.extend(self.hidden_allowlist.names);
        if let Some(value) = self.include_hidden_dirs {
            config.include_hidden_dirs = value;
        }
        if let Some(value) = self.detect_binary {
            config.detect_binary = value;
        }
        config
    }
}

#[derive(Debug, Default)]
struct NameAccumulator {
    names: BTreeSet<String>,
}

impl NameAccumulator {
    fn push<S: AsRef<str>>(&mut self, name: S) {
        let candidate = name.as_ref().trim();
        if candidate.is_empty() {
            return;
        }
        if self.names.insert(candidate.to_string()) {
            debug!("Adding name: {}", candidate);
        } else {
            debug!("Skipping duplicate name: {}", candidate);
        }
    }

    fn merge<I>(&mut self, iter: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for item in iter {
            self.push(item);
        }
    }
}

/// Flattens repeatable CLI values, splitting each on commas (e.g. `--exclude-dir "target,tmp"`).
fn split_values(raw: &[String]) -> impl Iterator<Item = &str> {
    raw.iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|part| !part.is_empty())
}

fn apply_config_file(path: &Path, acc: &mut SettingsAccum) -> Result<()> {
    if !path.exists() {
        debug!("Config file {:?} not found; skipping", path);
        return Ok(());
    }

    debug!("Loading config from {:?}", path);
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;

    let parsed: FileConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;

    if let Some(section) = parsed.dirsnap {
        apply_dirsnap_section(section, acc);
    }

    Ok(())
}

fn apply_dirsnap_section(section: DirsnapSection, acc: &mut SettingsAccum) {
    if let Some(value) = section.output {
        acc.output = Some(value);
    }
    if let Some(value) = section.use_defaults {
        acc.use_defaults = Some(value);
    }
    if let Some(value) = section.include_hidden_dirs {
        acc.include_hidden_dirs = Some(value);
    }
    if let Some(value) = section.detect_binary {
        acc.detect_binary = Some(value);
    }
    if let Some(values) = section.ignore_dirs {
        acc.ignore_dirs.merge(values);
    }
    if let Some(values) = section.binary_extensions {
        acc.binary_extensions
            .merge(values.iter().map(|v| normalize_extension(v)));
    }
    if let Some(values) = section.omit_content_for {
        acc.omit_content_for.merge(values);
    }
    if let Some(values) = section.ignore_files {
        acc.ignore_files.merge(values);
    }
    if let Some(values) = section.hidden_allowlist {
        acc.hidden_allowlist.merge(values);
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    dirsnap: Option<DirsnapSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DirsnapSection {
    output: Option<PathBuf>,
    use_defaults: Option<bool>,
    include_hidden_dirs: Option<bool>,
    detect_binary: Option<bool>,
    ignore_dirs: Option<Vec<String>>,
    binary_extensions: Option<Vec<String>>,
    omit_content_for: Option<Vec<String>>,
    ignore_files: Option<Vec<String>>,
    hidden_allowlist: Option<Vec<String>>,
}
