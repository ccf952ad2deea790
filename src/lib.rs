pub mod config;
mod error;
mod external;
pub mod html;
pub mod hwpx;
pub mod markdown;
mod method;
pub mod model;
#[cfg(feature = "server")]
pub mod server;

pub use config::Settings;
pub use error::Error;
pub use external::find_libreoffice;
pub use hwpx::is_hwpx;
pub use markdown::HeadingStyle;
pub use method::{Backend, Method, resolve as resolve_method};
pub use model::Warning;

use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use external::HtmlExport;

/// How a single conversion runs and where its output goes.
#[derive(Clone, Debug)]
pub struct Options {
    pub method: Method,
    /// Markdown file to write. Nothing is written when unset.
    pub output: Option<PathBuf>,
    /// Parent of the image folder; defaults to the output's directory.
    pub images_dir: Option<PathBuf>,
    pub images_dir_name: String,
    pub heading_style: HeadingStyle,
    /// Upper bound for external tool runs.
    pub timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Options::from_settings(&config::Settings::default().converter)
    }
}

impl Options {
    pub fn from_settings(settings: &config::ConverterSettings) -> Self {
        Options {
            method: Method::Auto,
            output: None,
            images_dir: None,
            images_dir_name: settings.images_dir_name.clone(),
            heading_style: settings.heading_style,
            timeout: settings.external_timeout,
        }
    }

    fn render_options(&self) -> markdown::RenderOptions {
        markdown::RenderOptions {
            image_dir: self.images_dir_name.clone(),
            heading_style: self.heading_style,
        }
    }
}

/// Image bytes referenced from the Markdown as `<images_dir_name>/<name>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedImage {
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct Conversion {
    pub markdown: String,
    pub images: Vec<ExtractedImage>,
    pub warnings: Vec<Warning>,
    /// The method that actually ran (never `Auto`).
    pub method: Method,
}

/// Convert `input` to Markdown, writing it (and its images) to `output`
/// when given.
pub fn convert(input: &Path, output: Option<&Path>, method: Method) -> Result<String, Error> {
    let options = Options {
        method,
        output: output.map(Path::to_path_buf),
        ..Options::default()
    };
    Ok(convert_with(input, &options)?.markdown)
}

pub fn convert_with(input: &Path, options: &Options) -> Result<Conversion, Error> {
    let backend = method::resolve(options.method, input)?;
    if !input.is_file() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("file not found: {}", input.display()),
        )));
    }
    log::info!("Converting {} with {}", input.display(), backend.method());

    let conversion = match backend {
        Backend::HwpxNative => {
            let mut container = hwpx::Container::open_path(input)?;
            convert_container(&mut container, options)?
        }
        Backend::Pyhwp => from_html(
            external::pyhwp_to_html(input, options.timeout)?,
            Method::Pyhwp,
            options,
        ),
        Backend::Libreoffice => from_html(
            external::libreoffice_to_html(input, options.timeout)?,
            Method::Libreoffice,
            options,
        ),
    };

    if let Some(output) = &options.output {
        write_output(&conversion, output, options)?;
    }
    Ok(conversion)
}

/// Convert an in-memory HWPX package with the native parser.
pub fn convert_hwpx_bytes(input: &[u8], options: &Options) -> Result<Conversion, Error> {
    let mut container = hwpx::Container::open(std::io::Cursor::new(input))?;
    let conversion = convert_container(&mut container, options)?;
    if let Some(output) = &options.output {
        write_output(&conversion, output, options)?;
    }
    Ok(conversion)
}

/// Parse an HWPX file into the document tree without rendering it.
pub fn parse_hwpx(input: &Path) -> Result<hwpx::Parsed, Error> {
    hwpx::parse(input)
}

fn convert_container<R: Read + Seek>(
    container: &mut hwpx::Container<R>,
    options: &Options,
) -> Result<Conversion, Error> {
    let t0 = Instant::now();

    let parsed = hwpx::parse_container(container)?;
    let t_parse = t0.elapsed();

    let rendered = markdown::render(&parsed.document, &options.render_options());
    let t_render = t0.elapsed();

    let mut warnings = parsed.warnings;
    let mut images = Vec::with_capacity(rendered.images.len());
    for image in &rendered.images {
        match container.read_part(&image.archive_path) {
            Ok(data) => images.push(ExtractedImage {
                name: image.file_name.clone(),
                data,
            }),
            Err(e) => {
                log::warn!("{}: {e}", image.archive_path);
                warnings.push(Warning::new(&image.archive_path, e.to_string()));
            }
        }
    }
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, render={:.1}ms, images={:.1}ms, total={:.1}ms ({} blocks, {} images)",
        t_parse.as_secs_f64() * 1000.0,
        (t_render - t_parse).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        parsed.document.block_count(),
        images.len(),
    );

    Ok(Conversion {
        markdown: rendered.markdown,
        images,
        warnings,
        method: Method::HwpxNative,
    })
}

fn from_html(export: HtmlExport, method: Method, options: &Options) -> Conversion {
    let mapping: Vec<(String, String)> = export
        .images
        .iter()
        .map(|(name, _)| {
            (
                format!("bindata/{name}"),
                format!("{}/{name}", options.images_dir_name),
            )
        })
        .collect();
    let markdown = html::to_markdown(&export.html, &mapping);

    Conversion {
        markdown,
        images: export
            .images
            .into_iter()
            .map(|(name, data)| ExtractedImage { name, data })
            .collect(),
        warnings: Vec::new(),
        method,
    }
}

/// Write the Markdown to `output` and the images to
/// `<images_dir or output dir>/<images_dir_name>/`.
pub fn write_output(conversion: &Conversion, output: &Path, options: &Options) -> Result<(), Error> {
    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;

    if !conversion.images.is_empty() {
        let dir = options
            .images_dir
            .as_deref()
            .unwrap_or(parent)
            .join(&options.images_dir_name);
        fs::create_dir_all(&dir)?;
        for image in &conversion.images {
            if image.name.is_empty()
                || image.name == "."
                || image.name == ".."
                || image.name.contains(['/', '\\'])
            {
                log::warn!("Skipping image with unusable name '{}'", image.name);
                continue;
            }
            fs::write(dir.join(&image.name), &image.data)?;
        }
        log::debug!("Wrote {} images to {}", conversion.images.len(), dir.display());
    }

    fs::write(output, &conversion.markdown).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, output.display()),
        ))
    })?;
    Ok(())
}
