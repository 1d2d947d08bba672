//! HTTP client for the provider's REST endpoints.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Value};

use super::{DocumentAttachment, GatewayError, MediaUploadResult, MediaUploader, MessageReceipt};

pub const DEFAULT_API_URL: &str = "https://waba.360dialog.io/v1";

/// Connection and template settings for the messaging provider.
#[derive(Debug, Clone, PartialEq)]
pub struct WhatsAppConfig {
    /// Base URL, `/messages` and `/media` are appended.
    pub api_url: String,
    pub token: String,
    pub template_namespace: String,
    pub template_name: String,
    pub language_code: String,
    /// Text parameters bound to the template body, in order.
    pub body_params: Vec<String>,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: String::new(),
            template_namespace: String::new(),
            template_name: "inspection_report".to_string(),
            language_code: "en".to_string(),
            body_params: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct WhatsAppClient {
    http: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppClient {
    pub fn new(http: reqwest::Client, config: WhatsAppConfig) -> Self {
        Self { http, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Send the configured template message to `recipient`.
    pub async fn send_template_message(
        &self,
        recipient: &str,
        document: Option<&DocumentAttachment>,
    ) -> Result<MessageReceipt, GatewayError> {
        let payload = build_template_payload(&self.config, recipient, document);
        log::debug!("Sending template '{}' to {}", self.config.template_name, recipient);

        let response = self
            .http
            .post(self.endpoint("messages"))
            .bearer_auth(&self.config.token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(parse_message_response(&body))
    }

    /// Upload raw PDF bytes and return the provider's media id.
    pub async fn upload_pdf(&self, file: Vec<u8>) -> Result<MediaUploadResult, GatewayError> {
        log::debug!("Uploading {} bytes of media", file.len());

        let response = self
            .http
            .post(self.endpoint("media"))
            .bearer_auth(&self.config.token)
            .header(CONTENT_TYPE, "application/pdf")
            .body(file)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            log::warn!("Media upload returned status {}", status);
            if serde_json::from_str::<Value>(&body).is_err() {
                return Err(GatewayError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
        }

        parse_media_response(&body)
    }
}

#[async_trait]
impl MediaUploader for WhatsAppClient {
    async fn upload_media(&self, file: Vec<u8>) -> Result<MediaUploadResult, GatewayError> {
        self.upload_pdf(file).await
    }
}

/// JSON body for a template message.
pub fn build_template_payload(
    config: &WhatsAppConfig,
    recipient: &str,
    document: Option<&DocumentAttachment>,
) -> Value {
    let mut components = Vec::new();

    if let Some(document) = document {
        components.push(json!({
            "type": "header",
            "parameters": [{
                "type": "document",
                "document": {
                    "id": document.media_id,
                    "filename": document.filename,
                }
            }]
        }));
    }

    if !config.body_params.is_empty() {
        let parameters: Vec<Value> = config
            .body_params
            .iter()
            .map(|text| json!({ "type": "text", "text": text }))
            .collect();
        components.push(json!({ "type": "body", "parameters": parameters }));
    }

    json!({
        "to": recipient,
        "type": "template",
        "template": {
            "namespace": config.template_namespace,
            "name": config.template_name,
            "language": {
                "policy": "deterministic",
                "code": config.language_code,
            },
            "components": components,
        }
    })
}

/// Extract `media[0].id` from an upload response.
pub fn parse_media_response(body: &str) -> Result<MediaUploadResult, GatewayError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let media = value
        .get("media")
        .and_then(Value::as_array)
        .ok_or_else(|| GatewayError::MalformedResponse("missing media array".to_string()))?;

    media
        .first()
        .and_then(|entry| entry.get("id"))
        .and_then(Value::as_str)
        .map(|id| MediaUploadResult {
            media_id: id.to_string(),
        })
        .ok_or_else(|| GatewayError::MalformedResponse("media array has no id".to_string()))
}

/// Message ids are informational only; an unexpected body still counts as sent.
pub fn parse_message_response(body: &str) -> MessageReceipt {
    let message_id = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .get("messages")
            .and_then(Value::as_array)
            .and_then(|messages| messages.first())
            .and_then(|message| message.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    MessageReceipt { message_id }
}
