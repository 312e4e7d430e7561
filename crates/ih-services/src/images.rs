//! Image lifecycle: upload, edit, delete.
//!
//! Denied mutations come back as values, not errors, carrying the untouched
//! image plus its comments so the caller can re-render the detail page with
//! an inline banner instead of a hard failure.

use crate::ownership::OwnershipGuard;
use crate::tags::TagResolver;
use chrono::Utc;
use ih_core::error::{AppError, Result};
use ih_core::models::{Comment, Image, User};
use ih_core::traits::ImageRepo;
use std::sync::Arc;
use uuid::Uuid;

pub const EDIT_DENIED: &str = "Only the owner of the image can edit the image";
pub const DELETE_DENIED: &str = "Only the owner of the image can delete the image";

/// A refused mutation, bundled with everything needed to fall back to the
/// read-only detail view.
#[derive(Debug)]
pub struct AuthzDenied {
    pub message: &'static str,
    pub image: Image,
    pub comments: Vec<Comment>,
}

/// What `begin_edit` hands back: the edit form inputs, or the fallback.
#[derive(Debug)]
pub enum EditOutcome {
    Editable {
        image: Image,
        /// The image's tags re-serialized to one comma-joined line, ready
        /// to prefill the form field.
        tag_line: String,
    },
    Denied(AuthzDenied),
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// The stored image after the overwrite; callers redirect to its page.
    Saved(Image),
    Denied(AuthzDenied),
}

#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted,
    Denied(AuthzDenied),
}

/// Orchestrates create/update/delete over the storage port, consulting
/// [`OwnershipGuard`] before any mutation of an existing image and
/// [`TagResolver`] for every tag line it is handed.
pub struct ImageWorkflow {
    repo: Arc<dyn ImageRepo>,
    tags: TagResolver,
    guard: OwnershipGuard,
}

impl ImageWorkflow {
    pub fn new(repo: Arc<dyn ImageRepo>) -> Self {
        Self {
            tags: TagResolver::new(repo.clone()),
            guard: OwnershipGuard::new(repo.clone()),
            repo,
        }
    }

    /// Stores a brand-new image owned by `acting_user`. Any authenticated
    /// user may upload; there is no check here. `content_b64` is the
    /// already-encoded payload — this layer never decodes it.
    pub async fn upload(
        &self,
        acting_user: &User,
        title: &str,
        content_b64: String,
        raw_tags: &str,
    ) -> Result<Image> {
        let tags = self.tags.resolve(raw_tags).await?;
        let image = Image {
            id: Uuid::now_v7(),
            title: title.to_string(),
            content: content_b64,
            date: Utc::now(),
            owner: acting_user.clone(),
            tags,
        };
        let stored = self.repo.insert_image(image).await?;
        log::info!(
            "user {} uploaded image {} ({:?})",
            acting_user.username,
            stored.id,
            stored.title
        );
        Ok(stored)
    }

    /// Loads the edit form state, or the read-only fallback when
    /// `acting_user` is not the owner.
    pub async fn begin_edit(&self, image_id: Uuid, acting_user: &User) -> Result<EditOutcome> {
        let image = self.load(image_id).await?;
        if self.guard.is_owner(image_id, &acting_user.username).await? {
            let tag_line = TagResolver::stringify(&image.tags);
            Ok(EditOutcome::Editable { image, tag_line })
        } else {
            Ok(EditOutcome::Denied(self.denied(EDIT_DENIED, image).await?))
        }
    }

    /// Applies an edit as a wholesale overwrite: title, tags, date and owner
    /// are always rewritten; the binary payload only when the submission
    /// carries one — an empty `content_b64` means "keep the stored bytes".
    ///
    /// Ownership is enforced here as well as in `begin_edit`, so a request
    /// forged straight at the submit endpoint is refused the same way.
    pub async fn submit_edit(
        &self,
        image_id: Uuid,
        acting_user: &User,
        title: &str,
        content_b64: String,
        raw_tags: &str,
    ) -> Result<SubmitOutcome> {
        let prior = self.load(image_id).await?;
        if !self.guard.is_owner(image_id, &acting_user.username).await? {
            return Ok(SubmitOutcome::Denied(
                self.denied(EDIT_DENIED, prior).await?,
            ));
        }

        let tags = self.tags.resolve(raw_tags).await?;
        let content = if content_b64.is_empty() {
            prior.content
        } else {
            content_b64
        };
        let updated = Image {
            id: image_id,
            title: title.to_string(),
            content,
            date: Utc::now(),
            owner: acting_user.clone(),
            tags,
        };
        self.repo.replace_image(updated.clone()).await?;
        log::info!(
            "user {} edited image {} ({:?})",
            acting_user.username,
            image_id,
            updated.title
        );
        Ok(SubmitOutcome::Saved(updated))
    }

    /// Removes the image — storage cascades its comments, tag rows stay.
    /// Non-owners get the fallback view with the image untouched.
    pub async fn delete(&self, image_id: Uuid, acting_user: &User) -> Result<DeleteOutcome> {
        let image = self.load(image_id).await?;
        if self.guard.is_owner(image_id, &acting_user.username).await? {
            self.repo.delete_image(image_id).await?;
            log::info!("user {} deleted image {}", acting_user.username, image_id);
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::Denied(
                self.denied(DELETE_DENIED, image).await?,
            ))
        }
    }

    async fn load(&self, image_id: Uuid) -> Result<Image> {
        self.repo
            .find_image_by_id(image_id)
            .await?
            .ok_or_else(|| AppError::NotFound("image".to_string(), image_id.to_string()))
    }

    async fn denied(&self, message: &'static str, image: Image) -> Result<AuthzDenied> {
        let comments = self.repo.list_comments(image.id).await?;
        Ok(AuthzDenied {
            message,
            image,
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{image_owned_by, tag, user};
    use ih_core::traits::MockImageRepo;

    #[tokio::test]
    async fn upload_stamps_owner_and_resolved_tags() {
        let alice = user("alice");
        let beach = tag("beach");

        let mut repo = MockImageRepo::new();
        let existing = beach.clone();
        repo.expect_find_tag_by_name()
            .withf(|name| name == "beach")
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_insert_image()
            .withf(|image| {
                image.owner.username == "alice"
                    && image.title == "Sunset"
                    && image.content == "Zm9v"
                    && image.tags.len() == 1
                    && image.tags[0].name == "beach"
            })
            .times(1)
            .returning(|image| Ok(image));

        let workflow = ImageWorkflow::new(Arc::new(repo));
        let stored = workflow
            .upload(&alice, "Sunset", "Zm9v".to_string(), "beach")
            .await
            .unwrap();
        assert_eq!(stored.owner.username, "alice");
    }

    #[tokio::test]
    async fn begin_edit_serializes_tags_for_the_owner() {
        let alice = user("alice");
        let mut image = image_owned_by(&alice);
        image.tags = vec![tag("beach"), tag("sand")];
        let image_id = image.id;

        let mut repo = MockImageRepo::new();
        repo.expect_find_image_by_id()
            .returning(move |_| Ok(Some(image.clone())));

        let workflow = ImageWorkflow::new(Arc::new(repo));
        match workflow.begin_edit(image_id, &alice).await.unwrap() {
            EditOutcome::Editable { tag_line, .. } => assert_eq!(tag_line, "beach,sand"),
            EditOutcome::Denied(_) => panic!("owner must get the edit form"),
        }
    }

    #[tokio::test]
    async fn begin_edit_by_non_owner_degrades_to_detail_view() {
        let alice = user("alice");
        let bob = user("bob");
        let image = image_owned_by(&alice);
        let image_id = image.id;

        let mut repo = MockImageRepo::new();
        repo.expect_find_image_by_id()
            .returning(move |_| Ok(Some(image.clone())));
        repo.expect_list_comments().returning(|_| Ok(vec![]));

        let workflow = ImageWorkflow::new(Arc::new(repo));
        match workflow.begin_edit(image_id, &bob).await.unwrap() {
            EditOutcome::Denied(denied) => {
                assert_eq!(denied.message, EDIT_DENIED);
                assert_eq!(denied.image.id, image_id);
            }
            EditOutcome::Editable { .. } => panic!("non-owner must be refused"),
        }
    }

    #[tokio::test]
    async fn submit_edit_with_empty_content_keeps_stored_bytes() {
        let alice = user("alice");
        let mut image = image_owned_by(&alice);
        image.content = "b3JpZ2luYWw=".to_string();
        let image_id = image.id;

        let mut repo = MockImageRepo::new();
        repo.expect_find_image_by_id()
            .returning(move |_| Ok(Some(image.clone())));
        repo.expect_replace_image()
            .withf(|updated| updated.content == "b3JpZ2luYWw=" && updated.title == "Renamed")
            .times(1)
            .returning(|_| Ok(()));

        let workflow = ImageWorkflow::new(Arc::new(repo));
        match workflow
            .submit_edit(image_id, &alice, "Renamed", String::new(), "")
            .await
            .unwrap()
        {
            SubmitOutcome::Saved(saved) => assert_eq!(saved.content, "b3JpZ2luYWw="),
            SubmitOutcome::Denied(_) => panic!("owner edit must be applied"),
        }
    }

    #[tokio::test]
    async fn submit_edit_with_new_content_replaces_bytes() {
        let alice = user("alice");
        let mut image = image_owned_by(&alice);
        image.content = "b2xk".to_string();
        let image_id = image.id;

        let mut repo = MockImageRepo::new();
        repo.expect_find_image_by_id()
            .returning(move |_| Ok(Some(image.clone())));
        repo.expect_replace_image()
            .withf(|updated| updated.content == "bmV3")
            .times(1)
            .returning(|_| Ok(()));

        let workflow = ImageWorkflow::new(Arc::new(repo));
        let outcome = workflow
            .submit_edit(image_id, &alice, "Sunset", "bmV3".to_string(), "")
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Saved(_)));
    }

    #[tokio::test]
    async fn submit_edit_by_non_owner_mutates_nothing() {
        let alice = user("alice");
        let bob = user("bob");
        let image = image_owned_by(&alice);
        let image_id = image.id;

        let mut repo = MockImageRepo::new();
        repo.expect_find_image_by_id()
            .returning(move |_| Ok(Some(image.clone())));
        repo.expect_list_comments().returning(|_| Ok(vec![]));
        // No replace_image, no tag writes.
        repo.expect_replace_image().times(0);
        repo.expect_insert_tag().times(0);

        let workflow = ImageWorkflow::new(Arc::new(repo));
        match workflow
            .submit_edit(image_id, &bob, "Hijacked", "ZXZpbA==".to_string(), "x")
            .await
            .unwrap()
        {
            SubmitOutcome::Denied(denied) => assert_eq!(denied.message, EDIT_DENIED),
            SubmitOutcome::Saved(_) => panic!("non-owner edit must be refused"),
        }
    }

    #[tokio::test]
    async fn delete_by_owner_removes_the_image() {
        let alice = user("alice");
        let image = image_owned_by(&alice);
        let image_id = image.id;

        let mut repo = MockImageRepo::new();
        repo.expect_find_image_by_id()
            .returning(move |_| Ok(Some(image.clone())));
        repo.expect_delete_image()
            .withf(move |id| *id == image_id)
            .times(1)
            .returning(|_| Ok(()));

        let workflow = ImageWorkflow::new(Arc::new(repo));
        let outcome = workflow.delete(image_id, &alice).await.unwrap();
        assert!(matches!(outcome, DeleteOutcome::Deleted));
    }

    #[tokio::test]
    async fn delete_by_non_owner_leaves_image_and_comments_intact() {
        let alice = user("alice");
        let bob = user("bob");
        let image = image_owned_by(&alice);
        let image_id = image.id;
        let comment = crate::test_support::comment_on(image_id, &alice, "nice");

        let mut repo = MockImageRepo::new();
        repo.expect_find_image_by_id()
            .returning(move |_| Ok(Some(image.clone())));
        let reattached = comment.clone();
        repo.expect_list_comments()
            .returning(move |_| Ok(vec![reattached.clone()]));
        repo.expect_delete_image().times(0);

        let workflow = ImageWorkflow::new(Arc::new(repo));
        match workflow.delete(image_id, &bob).await.unwrap() {
            DeleteOutcome::Denied(denied) => {
                assert_eq!(denied.message, DELETE_DENIED);
                assert_eq!(denied.image.id, image_id);
                assert_eq!(denied.comments.len(), 1);
            }
            DeleteOutcome::Deleted => panic!("non-owner delete must be refused"),
        }
    }

    #[tokio::test]
    async fn mutating_a_missing_image_is_not_found() {
        let alice = user("alice");
        let mut repo = MockImageRepo::new();
        repo.expect_find_image_by_id().returning(|_| Ok(None));

        let workflow = ImageWorkflow::new(Arc::new(repo));
        let err = workflow.delete(Uuid::now_v7(), &alice).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }
}
