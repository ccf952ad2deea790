use std::path::Path;

use crate::error::Error;
use crate::hwpx;

/// How a document is turned into Markdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(
    feature = "server",
    derive(serde::Deserialize, serde::Serialize),
    serde(rename_all = "kebab-case")
)]
pub enum Method {
    /// Pick by file extension.
    #[default]
    Auto,
    /// `hwp5html` (pyhwp), then HTML to Markdown. `.hwp` only.
    Pyhwp,
    /// Built-in HWPX parser. `.hwpx` only.
    HwpxNative,
    /// `soffice --convert-to html`, then HTML to Markdown.
    Libreoffice,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Auto => "auto",
            Method::Pyhwp => "pyhwp",
            Method::HwpxNative => "hwpx-native",
            Method::Libreoffice => "libreoffice",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Method::Auto),
            "pyhwp" => Ok(Method::Pyhwp),
            "hwpx-native" | "hwpx_native" | "native" => Ok(Method::HwpxNative),
            "libreoffice" => Ok(Method::Libreoffice),
            other => Err(format!(
                "unknown method '{other}' (expected auto, pyhwp, hwpx-native or libreoffice)"
            )),
        }
    }
}

/// The conversion path a request resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    HwpxNative,
    Pyhwp,
    Libreoffice,
}

impl Backend {
    pub fn method(self) -> Method {
        match self {
            Backend::HwpxNative => Method::HwpxNative,
            Backend::Pyhwp => Method::Pyhwp,
            Backend::Libreoffice => Method::Libreoffice,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Hwp,
    Hwpx,
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn format_of(ext: &str) -> Option<Format> {
    match ext {
        "hwp" => Some(Format::Hwp),
        "hwpx" => Some(Format::Hwpx),
        _ => None,
    }
}

/// Resolve a requested method against the input file. Fails before any
/// conversion work when the method cannot handle the file's format.
pub fn resolve(method: Method, path: &Path) -> Result<Backend, Error> {
    let ext = extension(path);
    let format = format_of(&ext);
    let incompatible = || Error::UnsupportedMethodForFormat {
        method: method.to_string(),
        extension: ext.clone(),
    };

    match (method, format) {
        (Method::Auto, Some(Format::Hwpx)) => Ok(Backend::HwpxNative),
        // Some tools save HWPX packages under a `.hwp` name.
        (Method::Auto, Some(Format::Hwp)) if hwpx::is_hwpx(path) => {
            log::info!("{} is an HWPX package; using the native parser", path.display());
            Ok(Backend::HwpxNative)
        }
        (Method::Auto, Some(Format::Hwp)) => Ok(Backend::Pyhwp),
        (Method::Auto, None) => Err(Error::UnsupportedFormat(if ext.is_empty() {
            format!("{} has no extension", path.display())
        } else {
            format!(".{ext}")
        })),
        (Method::Pyhwp, Some(Format::Hwp)) => Ok(Backend::Pyhwp),
        (Method::HwpxNative, Some(Format::Hwpx)) => Ok(Backend::HwpxNative),
        (Method::Libreoffice, Some(_)) => Ok(Backend::Libreoffice),
        _ => Err(incompatible()),
    }
}
