use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures::TryStreamExt;
use log::{debug, error, info};
use sanitize_filename::sanitize;
use std::io::Write;
use tempfile::NamedTempFile;
use utoipa::ToSchema;

use crate::whatsapp::{GatewayError, MediaUploadResult};
use crate::{AppState, MessageResponse};

pub const MEDIA_ID_FAILED_MESSAGE: &str =
    "Media ID could not be created. Please check the file again and upload";
pub const INVALID_REQUEST_MESSAGE: &str = "Invalid Request";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Multipart field error: {0}")]
    FieldError(String),
    #[error("No file field in multipart payload")]
    MissingFile,
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<UploadError> for HttpResponse {
    fn from(error: UploadError) -> Self {
        match error {
            UploadError::Gateway(GatewayError::MalformedResponse(_)) => {
                HttpResponse::BadRequest().json(MessageResponse::new(MEDIA_ID_FAILED_MESSAGE))
            }
            _ => HttpResponse::BadRequest().json(MessageResponse::new(INVALID_REQUEST_MESSAGE)),
        }
    }
}

#[derive(ToSchema)]
#[allow(unused)]
pub struct UploadMediaRequest {
    pub file: Vec<u8>,
}

/// Stream the `file` field into a temporary file and read it back.
///
/// Other fields are ignored. Returns the bytes and the sanitized client file
/// name (if one was sent).
async fn stage_upload(mut payload: Multipart) -> Result<(Vec<u8>, Option<String>), UploadError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| UploadError::FieldError(e.to_string()))?
    {
        let content_disposition = field
            .content_disposition()
            .ok_or_else(|| UploadError::FieldError("Content-Disposition not set".to_string()))?;
        if content_disposition.get_name() != Some("file") {
            continue;
        }
        let filename = content_disposition.get_filename().map(sanitize);

        let mut temp_file = NamedTempFile::new()?;
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| UploadError::FieldError(e.to_string()))?
        {
            temp_file.write_all(&chunk)?;
        }
        temp_file.flush()?;

        let file_data = std::fs::read(temp_file.path())?;
        return Ok((file_data, filename));
    }

    Err(UploadError::MissingFile)
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Media Service",
    request_body(content = inline(UploadMediaRequest), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File uploaded to the messaging provider", body = MediaUploadResult),
        (status = 400, description = "Upload rejected or provider response unusable", body = MessageResponse)
    )
)]
pub async fn upload_media(payload: Multipart, data: web::Data<AppState>) -> impl Responder {
    info!("Executing upload_media handler");

    let (file_data, filename) = match stage_upload(payload).await {
        Ok(staged) => staged,
        Err(e) => {
            error!("Failed to read uploaded file: {}", e);
            return HttpResponse::from(e);
        }
    };
    debug!(
        "Received {} ({} bytes)",
        filename.as_deref().unwrap_or("unnamed file"),
        file_data.len()
    );

    match data.uploader.upload_media(file_data).await {
        Ok(result) => {
            info!("Media uploaded with id {}", result.media_id);
            HttpResponse::Ok().json(result)
        }
        Err(e) => {
            error!("Media upload failed: {}", e);
            HttpResponse::from(UploadError::Gateway(e))
        }
    }
}
