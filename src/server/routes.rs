use std::io::{Cursor, Write};
use std::path::Path;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::{Conversion, Error, Method, Options};

const SERVICE_NAME: &str = "hwp-to-markdown";

#[derive(Serialize)]
pub struct StatusResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ConvertResponse {
    filename: String,
    markdown: String,
    method: Method,
    warnings: Vec<String>,
}

#[derive(Deserialize, Default)]
pub struct ConvertQuery {
    #[serde(default)]
    method: Method,
}

/// The requested method, or an API error when `?method=` is not one we know.
fn requested_method(
    query: Result<Query<ConvertQuery>, QueryRejection>,
) -> Result<Method, ApiError> {
    query
        .map(|Query(query)| query.method)
        .map_err(|e| ApiError::InvalidMethod(e.body_text()))
}

struct Upload {
    filename: String,
    data: Vec<u8>,
}

impl Upload {
    /// File stem used to name the downloads; never empty.
    fn stem(&self) -> String {
        Path::new(&self.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "document".to_string())
    }

    fn extension(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadUpload(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadUpload(e.to_string()))?;
        log::debug!("Received upload '{filename}' ({} bytes)", data.len());
        return Ok(Upload {
            filename,
            data: data.to_vec(),
        });
    }
    Err(ApiError::MissingFile)
}

/// Convert the upload on the blocking pool. The bytes go through a temp file
/// named with the upload's extension so method resolution sees the format.
async fn run_conversion(state: &AppState, upload: &Upload, method: Method) -> Result<Conversion, ApiError> {
    let mut options = Options::from_settings(&state.settings.converter);
    options.method = method;
    let extension = upload.extension();
    let data = upload.data.clone();

    let conversion = tokio::task::spawn_blocking(move || -> Result<Conversion, Error> {
        let suffix = if extension.is_empty() {
            String::new()
        } else {
            format!(".{extension}")
        };
        let mut tmp = tempfile::Builder::new()
            .prefix("hwp2md_upload_")
            .suffix(&suffix)
            .tempfile()?;
        tmp.write_all(&data)?;
        tmp.flush()?;
        crate::convert_with(tmp.path(), &options)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("conversion task failed: {e}")))??;

    log::info!(
        "Converted '{}' with {} ({} warnings, {} images)",
        upload.filename,
        conversion.method,
        conversion.warnings.len(),
        conversion.images.len()
    );
    Ok(conversion)
}

pub async fn convert(
    State(state): State<AppState>,
    query: Result<Query<ConvertQuery>, QueryRejection>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let method = requested_method(query)?;
    let upload = read_upload(&mut multipart).await?;
    let conversion = run_conversion(&state, &upload, method).await?;
    Ok(Json(ConvertResponse {
        filename: upload.filename,
        markdown: conversion.markdown,
        method: conversion.method,
        warnings: conversion.warnings.iter().map(ToString::to_string).collect(),
    }))
}

pub async fn convert_file(
    State(state): State<AppState>,
    query: Result<Query<ConvertQuery>, QueryRejection>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let method = requested_method(query)?;
    let upload = read_upload(&mut multipart).await?;
    let conversion = run_conversion(&state, &upload, method).await?;
    let filename = format!("{}.md", upload.stem());
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&filename)),
        ],
        conversion.markdown,
    ))
}

pub async fn convert_zip(
    State(state): State<AppState>,
    query: Result<Query<ConvertQuery>, QueryRejection>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let method = requested_method(query)?;
    let upload = read_upload(&mut multipart).await?;
    let conversion = run_conversion(&state, &upload, method).await?;
    let stem = upload.stem();
    let images_dir_name = state.settings.converter.images_dir_name.clone();

    let archive_stem = stem.clone();
    let archive = tokio::task::spawn_blocking(move || {
        build_zip(&archive_stem, &conversion, &images_dir_name)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("archive task failed: {e}")))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&format!("{stem}.zip")),
            ),
        ],
        archive,
    ))
}

/// `<stem>.md` plus `<images_dir_name>/<name>` for every extracted image.
fn build_zip(stem: &str, conversion: &Conversion, images_dir_name: &str) -> Result<Vec<u8>, Error> {
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file(format!("{stem}.md"), options)?;
    zip.write_all(conversion.markdown.as_bytes())?;
    for image in &conversion.images {
        zip.start_file(format!("{images_dir_name}/{}", image.name), options)?;
        zip.write_all(&image.data)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// `attachment` header with an ASCII fallback name and the UTF-8 name in
/// `filename*` (RFC 5987), so Hangul file names survive.
pub fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '"' && *c != '\\')
        .collect();
    let ascii = if ascii.is_empty() {
        "download".to_string()
    } else {
        ascii
    };
    format!(
        "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    )
}
