// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for bmconv.
//!
//! This binary provides the `bmconv` command for converting browser bookmark
//! exports between Netscape HTML and JSON, one file or a whole batch at a
//! time.

use bmconv::{bookmark, parser, renderer};
use lexopt::prelude::*;
use snafu::{OptionExt, ensure, prelude::*};
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Conversion direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    HtmlToJson,
    JsonToHtml,
}

impl Mode {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "html2json" => Some(Self::HtmlToJson),
            "json2html" => Some(Self::JsonToHtml),
            _ => None,
        }
    }

    /// Extensions picked up when walking an input directory.
    const fn input_extensions(self) -> &'static [&'static str] {
        match self {
            Self::HtmlToJson => &["html", "htm"],
            Self::JsonToHtml => &["json"],
        }
    }

    const fn output_extension(self) -> &'static str {
        match self {
            Self::HtmlToJson => "json",
            Self::JsonToHtml => "html",
        }
    }

    /// Glob used when no input is given.
    const fn default_pattern(self) -> &'static str {
        match self {
            Self::HtmlToJson => "*bookmarks*.html",
            Self::JsonToHtml => "*bookmarks*.json",
        }
    }
}

/// Where to write the converted output.
#[derive(Clone)]
enum OutputTarget {
    /// Write next to each input, with the extension swapped.
    BesideInput,
    /// Write the single input's output to this file.
    File(PathBuf),
    /// Write each output into this directory.
    Directory(PathBuf),
    /// Write to stdout.
    Stdout,
}

/// What happened to one input file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Written,
    Skipped,
    DryRun,
}

#[allow(clippy::struct_excessive_bools)]
struct Cli {
    mode: Mode,
    input: Vec<PathBuf>,
    output: Option<PathBuf>,
    pattern: Option<String>,
    escape: bool,
    quiet: bool,
    verbose: bool,
    dry_run: bool,
    force: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("input not found: {}", path.display()))]
    InputNotFound { path: PathBuf },

    #[snafu(display("invalid pattern '{pattern}': {source}"))]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[snafu(display("no files matching '{pattern}' in the current directory"))]
    NoMatchingFiles { pattern: String },

    #[snafu(display("no input files with a .{} extension found", mode.input_extensions().join(" or .")))]
    NoInputFiles { mode: Mode },

    #[snafu(display("cannot write multiple files to stdout"))]
    MultipleFilesToStdout,

    #[snafu(display("failed to create output directory: {source}"))]
    CreateOutputDir { source: std::io::Error },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse {}: {source}", path.display()))]
    ParseMarkup {
        path: PathBuf,
        source: parser::ParseError,
    },

    #[snafu(display("failed to encode {} as JSON: {source}", path.display()))]
    EncodeJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("failed to convert {}: {source}", path.display()))]
    RenderMarkup {
        path: PathBuf,
        source: renderer::RenderError,
    },

    #[snafu(display("invalid input filename: no file stem"))]
    InvalidFilename,

    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("{failed} of {total} files failed to convert"))]
    BatchFailed { failed: usize, total: usize },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert browser bookmark exports between Netscape HTML and JSON

Usage: {name} <MODE> [OPTIONS] [INPUT]...

Modes:
  html2json  Convert bookmark HTML exports to JSON
  json2html  Convert bookmark JSON back to importable HTML

Arguments:
  [INPUT]...  Input files or directories
              (default: files matching --pattern in the current directory)

Options:
  -i, --input <PATH>      Input file or directory (repeatable)
  -o, --output <PATH>     Output file for a single input (- for stdout),
                          or output directory for several inputs
                          (default: next to each input)
  -p, --pattern <GLOB>    Pattern used when no input is given
                          (default: *bookmarks*.html or *bookmarks*.json)
      --escape            Escape markup characters in names and attributes
                          (json2html only)

Other options:
  -q, --quiet             Suppress progress messages
  -v, --verbose           Show debug diagnostics (RUST_LOG overrides)
  -n, --dry-run           Show what would be processed without writing
  -f, --force             Overwrite existing output files
  -h, --help              Print help
  -V, --version           Print version",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    // Show help if no arguments provided
    if std::env::args().len() == 1 {
        print_help();
        std::process::exit(0);
    }

    let mut mode = None;
    let mut input: Vec<PathBuf> = Vec::new();
    let mut output: Option<PathBuf> = None;
    let mut pattern = None;
    let mut escape = false;
    let mut quiet = false;
    let mut verbose = false;
    let mut dry_run = false;
    let mut force = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('i') | Long("input") => input.push(parser.value()?.parse()?),
            Short('o') | Long("output") => output = Some(parser.value()?.parse()?),
            Short('p') | Long("pattern") => pattern = Some(parser.value()?.string()?),
            Long("escape") => escape = true,
            Short('q') | Long("quiet") => quiet = true,
            Short('v') | Long("verbose") => verbose = true,
            Short('n') | Long("dry-run") => dry_run = true,
            Short('f') | Long("force") => force = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) if mode.is_none() => {
                let val = val.string()?;
                mode = Some(Mode::from_arg(&val).ok_or_else(|| {
                    format!("unknown mode '{val}' (expected html2json or json2html)")
                })?);
            }
            Value(val) => input.push(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        mode: mode.ok_or("missing required mode: html2json or json2html")?,
        input,
        output,
        pattern,
        escape,
        quiet,
        verbose,
        dry_run,
        force,
    })
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    init_logging(cli.verbose);

    let files = if cli.input.is_empty() {
        let pattern = cli
            .pattern
            .as_deref()
            .unwrap_or_else(|| cli.mode.default_pattern());
        let files = discover_files(pattern)?;
        if !cli.quiet {
            eprintln!("Found {} file(s) matching '{pattern}'", files.len());
        }
        files
    } else {
        collect_input_files(&cli.input, cli.mode)?
    };

    let target = resolve_output(cli.output.as_deref(), files.len())?;
    if let OutputTarget::Directory(dir) = &target
        && !cli.dry_run
    {
        std::fs::create_dir_all(dir).context(CreateOutputDirSnafu)?;
    }

    let total = files.len();
    let mut failed: usize = 0;
    let mut converted: usize = 0;
    let mut planned: usize = 0;
    for file in &files {
        match process_file(file, &target, &cli) {
            Ok(Outcome::Written) => converted += 1,
            Ok(Outcome::DryRun) => planned += 1,
            Ok(Outcome::Skipped) => {}
            Err(err) => {
                error!("{err}");
                failed += 1;
            }
        }
    }

    if !cli.quiet && !matches!(target, OutputTarget::Stdout) {
        if cli.dry_run {
            eprintln!("Would convert {planned} of {total} files");
        } else {
            eprintln!("Converted {converted} of {total} files");
        }
    }

    ensure!(failed == 0, BatchFailedSnafu { failed, total });
    Ok(())
}

/// Finds files in the current directory matching a glob pattern.
fn discover_files(pattern: &str) -> Result<Vec<PathBuf>, Error> {
    let files: Vec<PathBuf> = glob::glob(pattern)
        .context(InvalidPatternSnafu { pattern })?
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .collect();

    ensure!(!files.is_empty(), NoMatchingFilesSnafu { pattern });
    Ok(files)
}

/// Collects input files from the given inputs (files and directories).
///
/// Directories are walked recursively for files with one of the mode's
/// input extensions.
fn collect_input_files(inputs: &[PathBuf], mode: Mode) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for input in inputs {
        ensure!(input.exists(), InputNotFoundSnafu { path: input });

        if input.is_dir() {
            for entry in WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file() && has_extension(e.path(), mode))
            {
                files.push(entry.path().to_path_buf());
            }
        } else {
            files.push(input.clone());
        }
    }

    ensure!(!files.is_empty(), NoInputFilesSnafu { mode });
    Ok(files)
}

fn has_extension(path: &Path, mode: Mode) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            mode.input_extensions()
                .iter()
                .any(|wanted| ext.eq_ignore_ascii_case(wanted))
        })
}

/// Decides where output goes given `--output` and the number of inputs.
fn resolve_output(output: Option<&Path>, file_count: usize) -> Result<OutputTarget, Error> {
    let Some(output) = output else {
        return Ok(OutputTarget::BesideInput);
    };

    if output == Path::new("-") {
        ensure!(file_count <= 1, MultipleFilesToStdoutSnafu);
        return Ok(OutputTarget::Stdout);
    }

    if file_count == 1 && !output.is_dir() {
        Ok(OutputTarget::File(output.to_path_buf()))
    } else {
        Ok(OutputTarget::Directory(output.to_path_buf()))
    }
}

/// Runs one conversion on already-read input text.
fn convert(input: &Path, content: &str, cli: &Cli) -> Result<String, Error> {
    match cli.mode {
        Mode::HtmlToJson => {
            let nodes = parser::parse(content).context(ParseMarkupSnafu { path: input })?;
            debug!(path = %input.display(), nodes = nodes.len(), "parsed bookmarks");
            bookmark::to_json(&nodes).context(EncodeJsonSnafu { path: input })
        }
        Mode::JsonToHtml => {
            let opts = renderer::RenderOptions { escape: cli.escape };
            renderer::render_document(content, &opts).context(RenderMarkupSnafu { path: input })
        }
    }
}

/// Processes a single file and writes its output.
fn process_file(input: &Path, target: &OutputTarget, cli: &Cli) -> Result<Outcome, Error> {
    let out_path = match target {
        OutputTarget::Stdout => None,
        OutputTarget::File(path) => Some(path.clone()),
        OutputTarget::BesideInput => Some(input.with_extension(cli.mode.output_extension())),
        OutputTarget::Directory(dir) => {
            let stem = input.file_stem().context(InvalidFilenameSnafu)?;
            Some(dir.join(format!(
                "{}.{}",
                stem.to_string_lossy(),
                cli.mode.output_extension()
            )))
        }
    };

    // Handle dry-run mode
    if cli.dry_run {
        match &out_path {
            Some(path) => eprintln!("Would write {}", path.display()),
            None => eprintln!("Would output {}", input.display()),
        }
        return Ok(Outcome::DryRun);
    }

    // Check if output exists and handle overwrite
    if let Some(path) = &out_path
        && path.exists()
        && !cli.force
    {
        eprintln!(
            "Skipping {} (already exists, use --force to overwrite)",
            path.display()
        );
        return Ok(Outcome::Skipped);
    }

    let content = std::fs::read_to_string(input).context(ReadFileSnafu { path: input })?;
    let converted = convert(input, &content, cli)?;

    match out_path {
        None => print!("{converted}"),
        Some(path) => {
            std::fs::write(&path, &converted).context(WriteFileSnafu { path: &path })?;
            if !cli.quiet {
                eprintln!("Wrote {}", path.display());
            }
        }
    }
    Ok(Outcome::Written)
}
