//! Appending comments to an image.

use chrono::Utc;
use ih_core::error::{AppError, Result};
use ih_core::models::{Comment, Image, User};
use ih_core::traits::ImageRepo;
use std::sync::Arc;
use uuid::Uuid;

/// An image together with its full comment list — the detail page's data.
#[derive(Debug)]
pub struct ImageView {
    pub image: Image,
    pub comments: Vec<Comment>,
}

pub struct CommentWorkflow {
    repo: Arc<dyn ImageRepo>,
}

impl CommentWorkflow {
    pub fn new(repo: Arc<dyn ImageRepo>) -> Self {
        Self { repo }
    }

    /// Stores a comment authored by `acting_user` under the image and
    /// returns the refreshed detail view, as if the page were re-fetched.
    ///
    /// Anyone may comment on any image — there is no ownership restriction
    /// here — and the text is stored verbatim, blank included. The stamp is
    /// day-granular; time of day is never recorded.
    pub async fn add_comment(
        &self,
        image_id: Uuid,
        acting_user: &User,
        text: &str,
    ) -> Result<ImageView> {
        let image = self
            .repo
            .find_image_by_id(image_id)
            .await?
            .ok_or_else(|| AppError::NotFound("image".to_string(), image_id.to_string()))?;

        let comment = Comment {
            id: Uuid::now_v7(),
            text: text.to_string(),
            created_date: Utc::now().date_naive(),
            user: acting_user.clone(),
            image_id,
        };
        self.repo.insert_comment(comment).await?;
        log::debug!(
            "user {} commented on image {}",
            acting_user.username,
            image_id
        );

        let comments = self.repo.list_comments(image_id).await?;
        Ok(ImageView { image, comments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{comment_on, image_owned_by, user};
    use ih_core::traits::MockImageRepo;

    #[tokio::test]
    async fn comment_is_stamped_with_author_and_today() {
        let alice = user("alice");
        let carol = user("carol");
        let image = image_owned_by(&alice);
        let image_id = image.id;

        let mut repo = MockImageRepo::new();
        repo.expect_find_image_by_id()
            .returning(move |_| Ok(Some(image.clone())));
        repo.expect_insert_comment()
            .withf(move |comment| {
                comment.user.username == "carol"
                    && comment.image_id == image_id
                    && comment.text == "lovely"
                    && comment.created_date == Utc::now().date_naive()
            })
            .times(1)
            .returning(|comment| Ok(comment));
        let stored = comment_on(image_id, &carol, "lovely");
        repo.expect_list_comments()
            .returning(move |_| Ok(vec![stored.clone()]));

        let workflow = CommentWorkflow::new(Arc::new(repo));
        let view = workflow.add_comment(image_id, &carol, "lovely").await.unwrap();
        assert_eq!(view.image.id, image_id);
        assert_eq!(view.comments.len(), 1);
    }

    #[tokio::test]
    async fn blank_comment_text_is_accepted_verbatim() {
        let alice = user("alice");
        let carol = user("carol");
        let image = image_owned_by(&alice);
        let image_id = image.id;

        let mut repo = MockImageRepo::new();
        repo.expect_find_image_by_id()
            .returning(move |_| Ok(Some(image.clone())));
        repo.expect_insert_comment()
            .withf(|comment| comment.text.is_empty())
            .times(1)
            .returning(|comment| Ok(comment));
        repo.expect_list_comments().returning(|_| Ok(vec![]));

        let workflow = CommentWorkflow::new(Arc::new(repo));
        assert!(workflow.add_comment(image_id, &carol, "").await.is_ok());
    }

    #[tokio::test]
    async fn commenting_on_a_missing_image_is_not_found() {
        let carol = user("carol");
        let mut repo = MockImageRepo::new();
        repo.expect_find_image_by_id().returning(|_| Ok(None));

        let workflow = CommentWorkflow::new(Arc::new(repo));
        let err = workflow
            .add_comment(Uuid::now_v7(), &carol, "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }
}
