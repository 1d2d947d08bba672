//! Post-generation notification channels.
//!
//! The batch driver calls a [`Notifier`] once for every document it manages
//! to write. Failures come back as [`GatewayError`] and the driver decides
//! what to do with them.

use std::sync::Arc;

use async_trait::async_trait;

use crate::pdf::GeneratedDocument;
use crate::whatsapp::{DocumentAttachment, GatewayError, MessageReceipt, WhatsAppClient};

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationOutcome {
    /// Only recorded in the log.
    Logged,
    Sent(MessageReceipt),
}

#[async_trait]
pub trait Notifier {
    async fn notify(&self, document: &GeneratedDocument) -> Result<NotificationOutcome, GatewayError>;
}

/// Writes a log line instead of contacting anyone.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, document: &GeneratedDocument) -> Result<NotificationOutcome, GatewayError> {
        log::info!("sent: {}", document.filename);
        Ok(NotificationOutcome::Logged)
    }
}

/// Sends the report template message to a fixed recipient, optionally
/// uploading the PDF first and attaching it as the message header.
pub struct WhatsAppNotifier {
    client: Arc<WhatsAppClient>,
    recipient: String,
    attach_document: bool,
}

impl WhatsAppNotifier {
    pub fn new(client: Arc<WhatsAppClient>, recipient: impl Into<String>, attach_document: bool) -> Self {
        Self {
            client,
            recipient: recipient.into(),
            attach_document,
        }
    }
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    async fn notify(&self, document: &GeneratedDocument) -> Result<NotificationOutcome, GatewayError> {
        let attachment = if self.attach_document {
            let uploaded = self.client.upload_pdf(document.pdf.clone()).await?;
            log::info!(
                "Uploaded {} as media {}",
                document.filename,
                uploaded.media_id
            );
            Some(DocumentAttachment {
                media_id: uploaded.media_id,
                filename: document.filename.clone(),
            })
        } else {
            None
        };

        let receipt = self
            .client
            .send_template_message(&self.recipient, attachment.as_ref())
            .await?;
        log::info!(
            "Notified {} about {} (message id: {})",
            self.recipient,
            document.filename,
            receipt.message_id.as_deref().unwrap_or("unknown")
        );
        Ok(NotificationOutcome::Sent(receipt))
    }
}

#[async_trait]
impl<N: Notifier + Send + Sync + ?Sized> Notifier for Arc<N> {
    async fn notify(&self, document: &GeneratedDocument) -> Result<NotificationOutcome, GatewayError> {
        (**self).notify(document).await
    }
}
