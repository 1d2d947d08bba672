//! `POST /upload` - relay an uploaded PDF to the messaging provider's media store.

pub mod handlers;

pub use handlers::{upload_media, UploadError, UploadMediaRequest};
