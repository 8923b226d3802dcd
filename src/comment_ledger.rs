//! Comments on birthday cards, one partition per year.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use crate::app_response::AppResponse;
use crate::portal_config::DEFAULT_MAX_COMMENT_CHARS;
use crate::portal_model::{Comment, NewComment};
use crate::record_store::{KeyedRecordStore, PartitionKey};
use crate::storage_medium::StorageMedium;

pub struct CommentLedger {
    store: KeyedRecordStore<Comment>,
    max_chars: usize,
    write_lock: Mutex<()>,
}

impl CommentLedger {
    pub fn new(medium: Arc<dyn StorageMedium>, domain: &str) -> Self {
        Self::with_partition(medium, PartitionKey::yearly(domain), DEFAULT_MAX_COMMENT_CHARS)
    }

    pub fn with_partition(
        medium: Arc<dyn StorageMedium>,
        partition: PartitionKey,
        max_chars: usize,
    ) -> Self {
        CommentLedger {
            store: KeyedRecordStore::new(medium, partition),
            max_chars,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &KeyedRecordStore<Comment> {
        &self.store
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, AppResponse> {
        self.write_lock
            .lock()
            .map_err(|_| AppResponse::StorageFailure("comment ledger lock poisoned".to_string()))
    }

    /// Trims `message` and checks it fits in `1..=max_chars` characters.
    pub fn validate_message(&self, message: &str) -> Result<String, AppResponse> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(AppResponse::InvalidInput("message must not be empty".to_string()));
        }
        let chars = trimmed.chars().count();
        if chars > self.max_chars {
            return Err(AppResponse::InvalidInput(format!(
                "message must be at most {} characters (got {})",
                self.max_chars, chars
            )));
        }
        Ok(trimmed.to_string())
    }

    /// Comments on `subject_id`, newest first.
    pub fn get_comments(&self, subject_id: &str, year: i32) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .store
            .load_partition(year)
            .into_iter()
            .filter(|comment| comment.subject_id == subject_id)
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        comments
    }

    pub fn count_comments(&self, subject_id: &str, year: i32) -> usize {
        self.store
            .load_partition(year)
            .iter()
            .filter(|comment| comment.subject_id == subject_id)
            .count()
    }

    pub fn add_comment(&self, input: NewComment, year: i32) -> Result<Comment, AppResponse> {
        let message = self.validate_message(&input.message)?;
        if input.author_id.trim().is_empty() {
            return Err(AppResponse::InvalidInput("author_id must not be empty".to_string()));
        }

        let _guard = self.lock()?;
        let mut comments = self.store.load_partition(year);

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            subject_id: input.subject_id,
            author_id: input.author_id,
            author_display_name: input.author_display_name,
            author_avatar: input.author_avatar,
            message,
            year,
            created_at: now,
            updated_at: now,
        };

        comments.push(comment.clone());
        self.store.save_partition(year, &comments)?;
        info!("Comment {} added by {} on {} ({})", comment.id, comment.author_id, comment.subject_id, year);
        Ok(comment)
    }

    /// Deletes a comment; only its author may do so.
    pub fn remove_comment(
        &self,
        comment_id: &str,
        requesting_author_id: &str,
        year: i32,
    ) -> Result<(), AppResponse> {
        let _guard = self.lock()?;
        let mut comments = self.store.load_partition(year);

        let Some(position) = comments.iter().position(|c| c.id == comment_id) else {
            return Err(AppResponse::NotFound(format!("No comment found with id: {}", comment_id)));
        };

        if comments[position].author_id != requesting_author_id {
            warn!(
                "{} tried to delete comment {} owned by {}",
                requesting_author_id, comment_id, comments[position].author_id
            );
            return Err(AppResponse::PermissionDenied(
                "only the author can delete this comment".to_string(),
            ));
        }

        comments.remove(position);
        self.store.save_partition(year, &comments)?;
        info!("Comment {} removed by {} ({})", comment_id, requesting_author_id, year);
        Ok(())
    }
}
