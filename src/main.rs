use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use hwp2md::{Method, Options, Settings};

#[derive(Parser)]
#[command(name = "hwp2md", version, about = "Convert HWP/HWPX documents to Markdown")]
struct Args {
    /// Input files or glob patterns
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output Markdown file (single input only)
    #[arg(short, long, conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Directory for batch output (default: current directory)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory where the image folder is created (default: next to the output)
    #[arg(long)]
    images_dir: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Method::Auto)]
    method: Method,

    /// Only print errors
    #[arg(short, long)]
    quiet: bool,

    /// External tool timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

fn init_logging() {
    let fallback = std::env::var("LOG_LEVEL")
        .map(|level| level.to_ascii_lowercase())
        .unwrap_or_else(|_| "warn".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(fallback)).init();
}

fn expand_patterns(patterns: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for pattern in patterns {
        let text = pattern.to_string_lossy();
        if !text.contains(['*', '?', '[']) {
            files.push(pattern.clone());
            continue;
        }
        match glob::glob(&text) {
            Ok(paths) => {
                let before = files.len();
                files.extend(paths.filter_map(Result::ok).filter(|p| p.is_file()));
                if files.len() == before {
                    log::warn!("No files match {text}");
                }
            }
            Err(e) => eprintln!("error: invalid pattern {text}: {e}"),
        }
    }
    files
}

fn markdown_name(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    PathBuf::from(stem).with_extension("md")
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_logging();
    let args = Args::parse();

    let settings = Settings::from_env();
    let mut options = Options::from_settings(&settings.converter);
    options.method = args.method;
    options.images_dir = args.images_dir.clone();
    if let Some(secs) = args.timeout.filter(|s| *s > 0) {
        options.timeout = Duration::from_secs(secs);
    }

    let files = expand_patterns(&args.files);
    if files.is_empty() {
        eprintln!("error: no input files");
        return ExitCode::FAILURE;
    }
    if args.output.is_some() && files.len() > 1 {
        eprintln!("error: --output takes a single input; use --output-dir for batches");
        return ExitCode::FAILURE;
    }

    // One file and nowhere to write it: Markdown to stdout.
    if files.len() == 1 && args.output.is_none() && args.output_dir.is_none() {
        return match hwp2md::convert_with(&files[0], &options) {
            Ok(conversion) => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = stdout.write_all(conversion.markdown.as_bytes()) {
                    eprintln!("error: {e}");
                    return ExitCode::FAILURE;
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error ({}): {e}", files[0].display());
                ExitCode::FAILURE
            }
        };
    }

    let output_dir = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for file in &files {
        let output = match &args.output {
            Some(output) => output.clone(),
            None => output_dir.join(markdown_name(file)),
        };
        if !args.quiet {
            eprintln!("converting: {}", file.display());
        }

        let file_options = Options {
            output: Some(output.clone()),
            ..options.clone()
        };
        match hwp2md::convert_with(file, &file_options) {
            Ok(conversion) => {
                succeeded += 1;
                if !args.quiet {
                    eprintln!("  -> {}", output.display());
                    for warning in &conversion.warnings {
                        eprintln!("  warning: {warning}");
                    }
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("error ({}): {e}", file.display());
            }
        }
    }

    if !args.quiet {
        eprintln!("done: {succeeded} succeeded, {failed} failed");
    }
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
