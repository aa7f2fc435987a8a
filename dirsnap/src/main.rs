use anyhow::{Context, Result}; // Use anyhow for easy error handling in the binary
use clap::Parser;
use dirsnap_lib::{snapshot, write_report, Report, SnapError}; // Import from our library
use log::{debug, error, info, LevelFilter};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

mod config_loader;

use config_loader::{build_run_settings, RunSettings};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Writes a project's directory structure and file contents into a single text file.",
    long_about = "Dirsnap walks a directory, renders an indented tree of what it finds (skipping dependency, build and hidden directories) and appends the content of every listed file under a '--- FILE: <path> ---' header.\n\nBinary, lock and secret files are listed but their content is replaced by a placeholder. With no arguments the current directory is captured into 'project_structure_and_content.txt'.\n\nDefaults can be extended through <config_dir>/dirsnap/config.toml and <root>/.dirsnap.toml; command-line flags win over both."
)]
pub struct Cli {
    /// Directory to capture. Defaults to the current working directory.
    #[arg(index = 1, value_name = "ROOT")]
    root: Option<PathBuf>,

    /// Report file to write, relative to the current directory.
    #[arg(short = 'o', long, value_name = "FILE", conflicts_with = "stdout")]
    output: Option<PathBuf>,

    /// Print the report to stdout instead of writing a file.
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Directory name to prune from the walk. Repeatable, accepts comma-separated lists.
    #[arg(long = "exclude-dir", value_name = "NAME")]
    exclude_dirs: Vec<String>,

    /// File name to leave out of the report entirely. Repeatable, comma-separated.
    #[arg(long = "skip-file", value_name = "NAME")]
    skip_files: Vec<String>,

    /// Extension whose content is omitted (e.g. "csv" or ".csv"). Repeatable, comma-separated.
    #[arg(long = "omit-ext", value_name = "EXT")]
    omit_extensions: Vec<String>,

    /// File name whose content is omitted. Repeatable, comma-separated.
    #[arg(long = "omit-file", value_name = "NAME")]
    omit_files: Vec<String>,

    /// Hidden file to keep anyway (e.g. ".editorconfig"). Repeatable, comma-separated.
    #[arg(long = "allow-hidden", value_name = "NAME")]
    allow_hidden: Vec<String>,

    /// Walk directories whose name starts with '.' instead of pruning them.
    #[arg(long)]
    include_hidden_dirs: bool,

    /// Dump files with binary content as text instead of using a placeholder.
    #[arg(long)]
    no_binary_detection: bool,

    /// Start from empty exclusion sets instead of the built-in ones.
    #[arg(long)]
    no_defaults: bool,

    /// Ignore the global and local config files.
    #[arg(long)]
    no_config: bool,

    /// Extra config file, applied after the global and local ones.
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,

    /// Enable verbose output. Use -v for info, -vv for debug, -vvv for trace.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // --- Initialize Logging ---
    let log_level = match cli.verbose {
        0 => LevelFilter::Warn,  // Default: Show warnings and errors
        1 => LevelFilter::Info,  // -v: Show info, warnings, errors
        2 => LevelFilter::Debug, // -vv: Show debug, info, warnings, errors
        _ => LevelFilter::Trace, // -vvv and more: Show everything
    };

    env_logger::Builder::new().filter_level(log_level).init();

    info!("Log level set to: {}", log_level);
    debug!("Parsed arguments: {:?}", cli);

    let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("."));
    info!("Root path determined as: {:?}", root);

    let settings = build_run_settings(&cli, &root)?;
    debug!("Run settings: {:?}", settings);

    run(
        &settings,
        &root,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )
}

/// Takes the snapshot and delivers it, either as the report file or on `out`.
///
/// Status lines go to `out` and are left out entirely in `--stdout` mode, so the
/// report can be piped. A failed report write is reported on `err` and still
/// returns `Ok`.
fn run(
    settings: &RunSettings,
    root: &Path,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<()> {
    if !settings.to_stdout {
        writeln!(
            out,
            "Generazione struttura e contenuti del progetto in '{}'...",
            root.display()
        )?;
    }

    let report = match snapshot(&settings.snapshot) {
        Ok(report) => report,
        Err(e) => {
            error!("Error during dirsnap operation: {}", e);
            return Err(e.into()); // Convert SnapError to anyhow::Error
        }
    };

    if settings.to_stdout {
        out.write_all(report.render().as_bytes())
            .context("Failed to write report to stdout")?;
        out.flush().context("Failed to flush stdout")?;
        return Ok(());
    }

    let written = write_and_announce(&settings.output, &report, out, err)?;
    debug!("Report file written: {}", written);
    Ok(())
}

/// Writes the report file and tells the operator how it went.
///
/// Returns whether the report was written. A write failure is only reported;
/// the `io::Error` side covers the console streams themselves.
fn write_and_announce(
    output: &Path,
    report: &Report,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<bool> {
    match write_report(output, report) {
        Ok(()) => {
            writeln!(out, "\nFile '{}' generato con successo!", output.display())?;
            writeln!(out, "Percorso completo: {}", absolute_display(output).display())?;
            Ok(true)
        }
        Err(SnapError::WriteError { source, .. }) => {
            debug!("Write failure details: {:?}", source);
            writeln!(
                err,
                "Errore durante la scrittura del file '{}': {}",
                output.display(),
                source
            )?;
            Ok(false)
        }
        Err(e) => {
            debug!("Write failure details: {:?}", e);
            writeln!(err, "Errore generico durante la scrittura del file: {}", e)?;
            Ok(false)
        }
    }
}

fn absolute_display(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::env::current_dir().map(|cwd| cwd.join(path)))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
impl Cli {
    /// A `Cli` as parsed from a bare `dirsnap` invocation.
    pub(crate) fn test_default() -> Self {
        Cli::parse_from(["dirsnap"])
    }
}
