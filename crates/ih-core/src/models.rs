//! # Domain Models
//!
//! These structs represent the core entities of the image hoster.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. Created at registration and immutable inside the
/// workflows, which only ever read the username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Unique login name; ownership checks compare against it verbatim.
    pub username: String,
    /// Argon2 PHC string produced by the auth plugin.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A label shared across images. Globally unique by name, exactly as typed
/// after trimming. Never deleted once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

/// An uploaded picture and its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: Uuid,
    pub title: String,
    /// Base64-encoded bytes. Opaque here; only the browser decodes it.
    pub content: String,
    /// Timestamp of the last write (upload or edit), not the first upload.
    pub date: DateTime<Utc>,
    /// Exactly one owner at all times, always the session user at the time
    /// of the write. Never taken from client-supplied input.
    pub owner: User,
    /// Input-ordered; may contain the same tag twice if the uploader typed
    /// it twice.
    pub tags: Vec<Tag>,
}

/// A remark under an image. Immutable; removed only when its image goes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    /// Day granularity only.
    pub created_date: NaiveDate,
    pub user: User,
    pub image_id: Uuid,
}
