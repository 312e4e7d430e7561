//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! The `testing` feature exposes mockall-generated `MockXxx` types so the
//! service crate can unit-test against them.

use crate::error::Result;
use crate::models::{Comment, Image, Tag, User};
use async_trait::async_trait;
use uuid::Uuid;

/// Data persistence contract for images, tags, and comments.
///
/// Implementations must keep two lifecycle rules: deleting an image removes
/// its comments, and never removes tags — tag rows are shared between
/// images and outlive all of them.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ImageRepo: Send + Sync {
    // Tag Operations
    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>>;
    /// Inserts a new tag row. Returns `AppError::Conflict` if the name is
    /// already taken — callers are expected to reload and reuse the winner.
    async fn insert_tag(&self, name: &str) -> Result<Tag>;

    // Image Operations
    async fn list_images(&self) -> Result<Vec<Image>>;
    async fn find_image_by_id(&self, id: Uuid) -> Result<Option<Image>>;
    async fn find_image_by_id_and_title(&self, id: Uuid, title: &str) -> Result<Option<Image>>;
    async fn insert_image(&self, image: Image) -> Result<Image>;
    /// Full overwrite keyed by `image.id`; tag links are replaced wholesale.
    async fn replace_image(&self, image: Image) -> Result<()>;
    /// Removes the image and cascades its comments. Tag rows stay.
    async fn delete_image(&self, id: Uuid) -> Result<()>;

    // Comment Operations
    async fn insert_comment(&self, comment: Comment) -> Result<Comment>;
    async fn list_comments(&self, image_id: Uuid) -> Result<Vec<Comment>>;
}

/// Account persistence contract, used by registration and login.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Returns `AppError::Conflict` when the username is already registered.
    async fn insert_user(&self, user: User) -> Result<User>;
}

/// Password hashing contract.
///
/// Login itself stays outside the workflows; handlers use this to turn
/// credentials into a trusted `User` before calling into the core.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuthProvider: Send + Sync {
    /// Hashes a plaintext password into a storable PHC string.
    fn hash_password(&self, password: &str) -> Result<String>;
    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool;
}
