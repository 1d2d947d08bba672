//! Messaging provider gateway (WhatsApp Business API).
//!
//! Two calls are used: sending a pre-approved template message, and uploading
//! a PDF as media so it can be attached to a message or handed back to an
//! HTTP caller.

pub mod client;

pub use client::{WhatsAppClient, WhatsAppConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to messaging provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("messaging provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response from messaging provider: {0}")]
    MalformedResponse(String),
}

/// Identifier the provider assigned to an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MediaUploadResult {
    pub media_id: String,
}

/// Provider acknowledgment of a sent message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageReceipt {
    pub message_id: Option<String>,
}

/// Previously uploaded media attached to a template message as a document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentAttachment {
    pub media_id: String,
    pub filename: String,
}

/// Uploads PDF bytes to the provider's media store.
#[async_trait]
pub trait MediaUploader {
    async fn upload_media(&self, file: Vec<u8>) -> Result<MediaUploadResult, GatewayError>;
}
