//! Single-owner mutation checks.

use ih_core::error::Result;
use ih_core::traits::ImageRepo;
use std::sync::Arc;
use uuid::Uuid;

/// Answers "may this user mutate that image?" — nothing more.
pub struct OwnershipGuard {
    repo: Arc<dyn ImageRepo>,
}

impl OwnershipGuard {
    pub fn new(repo: Arc<dyn ImageRepo>) -> Self {
        Self { repo }
    }

    /// True iff the image exists and its owner's username equals
    /// `acting_username` exactly (case-sensitive). An unknown image id is
    /// an ordinary `false`, not an error — the workflows turn that into
    /// their own not-found handling. No side effects.
    pub async fn is_owner(&self, image_id: Uuid, acting_username: &str) -> Result<bool> {
        Ok(self
            .repo
            .find_image_by_id(image_id)
            .await?
            .map(|image| image.owner.username == acting_username)
            .unwrap_or(false))
    }
}
