//! Conversions that shell out to pyhwp's `hwp5html` or LibreOffice.
//!
//! Both tools write an HTML file (plus images) into a scratch directory that
//! is removed when the conversion returns, whatever the outcome.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::Error;

const PYHWP_TOOL: &str = "hwp5html";
const LIBREOFFICE_TOOL: &str = "libreoffice";
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// HTML produced by an external tool, with the images it referenced as
/// `bindata/<name>`.
pub struct HtmlExport {
    pub html: String,
    pub images: Vec<(String, Vec<u8>)>,
}

fn failure(tool: &str, message: impl Into<String>) -> Error {
    Error::ExternalToolFailure {
        tool: tool.to_string(),
        message: message.into(),
    }
}

/// Run `cmd` to completion, killing it once `timeout` has elapsed.
/// stderr is captured through a file so a chatty child can never block on
/// a full pipe while we poll.
fn run_with_timeout(tool: &str, mut cmd: Command, scratch: &Path, timeout: Duration) -> Result<(), Error> {
    let stderr_path = scratch.join(".stderr.log");
    let stderr = fs::File::create(&stderr_path)?;
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::from(stderr));

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => failure(tool, format!("executable not found ({e})")),
        _ => failure(tool, e.to_string()),
    })?;

    let start = Instant::now();
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None if start.elapsed() > timeout => {
                log::warn!("{tool} exceeded {}s; killing it", timeout.as_secs());
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::ExternalToolTimeout {
                    tool: tool.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            None => std::thread::sleep(POLL_INTERVAL),
        }
    };

    if !status.success() {
        let message = fs::read_to_string(&stderr_path).unwrap_or_default();
        let message = message.trim();
        return Err(failure(
            tool,
            if message.is_empty() {
                format!("exited with {status}")
            } else {
                message.to_string()
            },
        ));
    }
    log::debug!("{tool} finished in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn files_with_extension(dir: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        })
        .collect();
    files.sort();
    files
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_html(tool: &str, path: &Path) -> Result<String, Error> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8(bytes)
        .unwrap_or_else(|e| {
            log::warn!("{tool} output is not valid UTF-8; replacing invalid bytes");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }))
}

pub fn pyhwp_to_html(input: &Path, timeout: Duration) -> Result<HtmlExport, Error> {
    let scratch = tempfile::Builder::new().prefix("hwp2md_").tempdir()?;

    let mut cmd = Command::new(PYHWP_TOOL);
    cmd.arg("--output").arg(scratch.path()).arg(input);
    run_with_timeout(PYHWP_TOOL, cmd, scratch.path(), timeout).map_err(|e| match e {
        Error::ExternalToolFailure { tool, message } if message.starts_with("executable not found") => {
            Error::ExternalToolFailure {
                tool,
                message: format!("{message}; is pyhwp installed?"),
            }
        }
        other => other,
    })?;

    let index = scratch.path().join("index.xhtml");
    let html_file = if index.is_file() {
        index
    } else {
        files_with_extension(scratch.path(), &["html", "xhtml"])
            .into_iter()
            .next()
            .ok_or_else(|| failure(PYHWP_TOOL, "no HTML file was produced"))?
    };
    let html = read_html(PYHWP_TOOL, &html_file)?;

    let mut images = Vec::new();
    for path in files_with_extension(&scratch.path().join("bindata"), IMAGE_EXTENSIONS) {
        images.push((file_name(&path), fs::read(&path)?));
    }

    Ok(HtmlExport { html, images })
}

/// Locate the LibreOffice executable on `PATH` or in the usual install locations.
pub fn find_libreoffice() -> Option<PathBuf> {
    const NAMES: &[&str] = &["soffice", "libreoffice", "loffice"];
    const KNOWN_PATHS: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/Applications/LibreOffice.app/Contents/MacOS/soffice",
            "/opt/homebrew/bin/soffice",
            "/usr/local/bin/soffice",
        ]
    } else if cfg!(windows) {
        &[
            "C:\\Program Files\\LibreOffice\\program\\soffice.exe",
            "C:\\Program Files (x86)\\LibreOffice\\program\\soffice.exe",
        ]
    } else {
        &[
            "/usr/bin/soffice",
            "/usr/bin/libreoffice",
            "/usr/lib/libreoffice/program/soffice",
        ]
    };

    NAMES
        .iter()
        .find_map(|name| which::which(name).ok())
        .or_else(|| KNOWN_PATHS.iter().map(PathBuf::from).find(|p| p.is_file()))
}

pub fn libreoffice_to_html(input: &Path, timeout: Duration) -> Result<HtmlExport, Error> {
    let soffice = find_libreoffice().ok_or_else(|| {
        failure(
            LIBREOFFICE_TOOL,
            "LibreOffice not found; install it and add it to PATH",
        )
    })?;
    let input = fs::canonicalize(input)?;
    let scratch = tempfile::Builder::new().prefix("lo2md_").tempdir()?;

    let mut cmd = Command::new(&soffice);
    cmd.args(["--headless", "--convert-to", "html", "--outdir"])
        .arg(scratch.path())
        .arg(&input);
    run_with_timeout(LIBREOFFICE_TOOL, cmd, scratch.path(), timeout)?;

    let html_file = files_with_extension(scratch.path(), &["html"])
        .into_iter()
        .chain(files_with_extension(scratch.path(), &["htm"]))
        .next()
        .ok_or_else(|| failure(LIBREOFFICE_TOOL, "no HTML file was produced"))?;
    let mut html = read_html(LIBREOFFICE_TOOL, &html_file)?;

    // LibreOffice writes images next to the HTML; expose them as bindata/ like hwp5html.
    let mut images = Vec::new();
    for path in files_with_extension(scratch.path(), IMAGE_EXTENSIONS) {
        let name = file_name(&path);
        html = html
            .replace(&format!("src=\"{name}\""), &format!("src=\"bindata/{name}\""))
            .replace(&format!("src='{name}'"), &format!("src='bindata/{name}'"));
        images.push((name, fs::read(&path)?));
    }

    Ok(HtmlExport { html, images })
}
