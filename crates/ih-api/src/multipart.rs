//! Multipart form decoding for the upload and edit endpoints.
//!
//! The file part is base64-encoded right here at the transport boundary;
//! everything past this point treats the payload as an opaque string. A
//! missing or empty file part encodes to `""`, which the edit workflow
//! reads as "keep the stored bytes".

use actix_multipart::Multipart;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures_util::TryStreamExt;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct ImageForm {
    /// Present on edit submissions only (hidden form field).
    pub image_id: Option<Uuid>,
    pub title: String,
    pub tags: String,
    pub file_b64: String,
}

pub async fn read_image_form(mut payload: Multipart) -> anyhow::Result<ImageForm> {
    let mut form = ImageForm::default();
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
    {
        let name = field.name().to_string();
        let mut data = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| anyhow::anyhow!(e.to_string()))?
        {
            data.extend_from_slice(&chunk);
        }
        match name.as_str() {
            "file" => form.file_b64 = STANDARD.encode(&data),
            "title" => form.title = String::from_utf8_lossy(&data).into_owned(),
            "tags" => form.tags = String::from_utf8_lossy(&data).into_owned(),
            "image_id" => {
                form.image_id = Some(Uuid::parse_str(String::from_utf8_lossy(&data).trim())?)
            }
            _ => log::debug!("ignoring unexpected multipart field {name:?}"),
        }
    }
    Ok(form)
}
