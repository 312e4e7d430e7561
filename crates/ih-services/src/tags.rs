//! Free-text tag input → persisted `Tag` rows, and back.

use ih_core::error::{AppError, Result};
use ih_core::models::Tag;
use ih_core::traits::ImageRepo;
use std::sync::Arc;

/// Turns a comma-separated line like `"beach, sand,sunset"` into the
/// corresponding `Tag` rows, creating missing ones on the spot.
pub struct TagResolver {
    repo: Arc<dyn ImageRepo>,
}

impl TagResolver {
    pub fn new(repo: Arc<dyn ImageRepo>) -> Self {
        Self { repo }
    }

    /// Resolves every comma-separated segment of `raw` to a persisted tag,
    /// in input order.
    ///
    /// Tokenizer rules: segments that are empty before trimming (consecutive
    /// commas, trailing comma) are skipped; any other segment is trimmed and
    /// looked up as-is, even when it trims down to `""`. A name typed twice
    /// yields two entries backed by the same row — callers get exactly what
    /// the user typed.
    ///
    /// New tags are inserted immediately, not at image-save time, so a tag
    /// can outlive a failed upload. Two requests racing on the same new name
    /// are settled by the storage unique constraint: the loser's insert
    /// comes back `Conflict` and we reload the winner's row.
    pub async fn resolve(&self, raw: &str) -> Result<Vec<Tag>> {
        let mut tags = Vec::new();
        for segment in raw.split(',') {
            if segment.is_empty() {
                continue;
            }
            let name = segment.trim();
            let tag = match self.repo.find_tag_by_name(name).await? {
                Some(existing) => existing,
                None => match self.repo.insert_tag(name).await {
                    Ok(created) => created,
                    Err(AppError::Conflict(_)) => {
                        log::debug!("lost tag insert race for {name:?}, reloading");
                        self.repo.find_tag_by_name(name).await?.ok_or_else(|| {
                            AppError::Internal(format!(
                                "tag {name:?} missing after insert conflict"
                            ))
                        })?
                    }
                    Err(err) => return Err(err),
                },
            };
            tags.push(tag);
        }
        Ok(tags)
    }

    /// Inverse of [`resolve`](Self::resolve): joins tag names with commas,
    /// no trailing separator. An empty slice gives the empty string.
    pub fn stringify(tags: &[Tag]) -> String {
        tags.iter()
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}
