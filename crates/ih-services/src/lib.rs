//! image-hoster/crates/ih-services/src/lib.rs
//!
//! The business logic of the image hoster: tag resolution, ownership
//! checks, and the image/comment workflows. Everything here talks to
//! storage through the `ih-core` ports only, and receives the acting user
//! as an explicit parameter — there is no ambient session state at this
//! layer.

pub mod comments;
pub mod images;
pub mod ownership;
pub mod tags;

pub use comments::{CommentWorkflow, ImageView};
pub use images::{
    AuthzDenied, DeleteOutcome, EditOutcome, ImageWorkflow, SubmitOutcome, DELETE_DENIED,
    EDIT_DENIED,
};
pub use ownership::OwnershipGuard;
pub use tags::TagResolver;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use ih_core::models::{Comment, Image, Tag, User};
    use uuid::Uuid;

    pub fn user(username: &str) -> User {
        User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn tag(name: &str) -> Tag {
        Tag {
            id: Uuid::now_v7(),
            name: name.to_string(),
        }
    }

    pub fn image_owned_by(owner: &User) -> Image {
        Image {
            id: Uuid::now_v7(),
            title: "Sunset".to_string(),
            content: "Zm9v".to_string(),
            date: Utc::now(),
            owner: owner.clone(),
            tags: vec![],
        }
    }

    pub fn comment_on(image_id: Uuid, author: &User, text: &str) -> Comment {
        Comment {
            id: Uuid::now_v7(),
            text: text.to_string(),
            created_date: Utc::now().date_naive(),
            user: author.clone(),
            image_id,
        }
    }
}
