//! File storage handlers: dashboard, upload, download, delete, browse.

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::storage::{Dashboard, FolderListing, UploadFile};
use crate::web::dto::{ApiResponse, DeleteResponse, UploadResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// Build a Content-Disposition header value for a download.
///
/// ASCII names are sent as a quoted `filename`. Anything else also gets an
/// RFC 5987 `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let needs_encoding = !filename.is_ascii()
        || filename
            .chars()
            .any(|c| c.is_control() || c == '"' || c == '\\');
    if !needs_encoding {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            c => c,
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

/// Body over the upload limit is a 413; any other malformed body a 400.
fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Upload rejected: {}", err.body_text());
        return ApiError::payload_too_large("Upload exceeds the maximum request size");
    }
    tracing::warn!("Failed to read multipart body: {}", err.body_text());
    ApiError::bad_request(format!("Invalid multipart data: {}", err.body_text()))
}

/// Read `files` and `paths` fields from a multipart body.
///
/// Each file's relative path comes from the `paths` entry at the same index,
/// falling back to the multipart filename.
async fn read_upload_fields(multipart: &mut Multipart) -> Result<Vec<UploadFile>, ApiError> {
    let mut files: Vec<(Option<String>, Vec<u8>)> = Vec::new();
    let mut paths: Vec<String> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name().unwrap_or("") {
            "files" => {
                let filename = field.file_name().map(|s| s.to_string());
                let content = field.bytes().await.map_err(multipart_error)?;
                files.push((filename, content.to_vec()));
            }
            "paths" => paths.push(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    Ok(files
        .into_iter()
        .enumerate()
        .map(|(i, (filename, content))| {
            let path = paths
                .get(i)
                .filter(|p| !p.is_empty())
                .cloned()
                .or(filename)
                .unwrap_or_default();
            UploadFile::new(path, content)
        })
        .collect())
}

/// GET /api/dashboard - Standalone files, top-level folders and usage.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Dashboard>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let dashboard = state.storage_service().dashboard(&user).await?;
    Ok(Json(ApiResponse::new(dashboard)))
}

/// POST /api/files - Upload one or more files (multipart).
///
/// Fields: repeated `files` parts, optionally a `paths` text part per file.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let files = read_upload_fields(&mut multipart).await?;

    let service = state.storage_service();
    let profile = service.profile_for(&user).await?;
    let outcome = service.upload(&profile, files).await?;

    Ok(Json(ApiResponse::new(UploadResponse::new(
        outcome.stored,
        outcome.rejected,
    ))))
}

/// GET /api/files/*path - Download a file as an attachment.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(path): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let user = state.current_user(&claims).await?;
    let service = state.storage_service();
    let profile = service.profile_for(&user).await?;
    let download = service.download(&profile, &path)?;

    let content_type = mime_guess::from_path(&download.name)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&download.name),
        )
        .header(header::CONTENT_LENGTH, download.content.len())
        .body(Body::from(download.content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// DELETE /api/files/*path - Delete a file (or a directory on disk).
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(path): Path<String>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let service = state.storage_service();
    let profile = service.profile_for(&user).await?;
    let outcome = service.delete_file(&profile, &path).await?;

    Ok(Json(ApiResponse::new(DeleteResponse {
        message: format!("\"{}\" was deleted.", path),
        records_removed: outcome.records_removed,
    })))
}

/// GET /api/folders/*path - List one folder level.
pub async fn browse_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(path): Path<String>,
) -> Result<Json<ApiResponse<FolderListing>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let service = state.storage_service();
    let profile = service.profile_for(&user).await?;
    let listing = service.browse(&profile, &path).await?;
    Ok(Json(ApiResponse::new(listing)))
}

/// DELETE /api/folders/*path - Delete a folder and everything under it.
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(path): Path<String>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let user = state.current_user(&claims).await?;
    let service = state.storage_service();
    let profile = service.profile_for(&user).await?;
    let outcome = service.delete_folder(&profile, &path).await?;

    Ok(Json(ApiResponse::new(DeleteResponse {
        message: format!("Folder \"{}\" and its contents were deleted.", path),
        records_removed: outcome.records_removed,
    })))
}
