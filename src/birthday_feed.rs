//! What the birthday card calls: resolves the signed-in user, defaults the
//! year to the current one, and reports each outcome to the [`Notifier`].
//!
//! The ledgers underneath take the year explicitly; this is the only place
//! that reads the clock for it.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;
use crate::comment_ledger::CommentLedger;
use crate::identity::IdentityProvider;
use crate::like_ledger::LikeLedger;
use crate::notifier::{Notification, Notifier, Severity};
use crate::portal_model::{Comment, CurrentUser, NewComment};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthdaySummary {
    pub subject_id: String,
    pub year: i32,
    pub like_count: usize,
    pub liked_by_me: bool,
    pub comments: Vec<Comment>,
}

pub struct BirthdayFeed {
    likes: Arc<LikeLedger>,
    comments: Arc<CommentLedger>,
    identity: Arc<IdentityProvider>,
    notifier: Arc<dyn Notifier>,
    fixed_year: Option<i32>,
}

impl BirthdayFeed {
    pub fn new(
        likes: Arc<LikeLedger>,
        comments: Arc<CommentLedger>,
        identity: Arc<IdentityProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        BirthdayFeed {
            likes,
            comments,
            identity,
            notifier,
            fixed_year: None,
        }
    }

    /// Pins the partition year instead of following the clock.
    pub fn with_year(mut self, year: i32) -> Self {
        self.fixed_year = Some(year);
        self
    }

    pub fn year(&self) -> i32 {
        self.fixed_year.unwrap_or_else(|| Utc::now().year())
    }

    fn signed_in(&self, action: &str) -> Result<CurrentUser, AppResponse> {
        self.identity.require_user().inspect_err(|_| {
            self.notifier.notify(Notification::new(
                "Login required",
                format!("Sign in to {}.", action),
                Severity::Warning,
            ));
        })
    }

    fn report_failure(&self, title: &str, err: &AppResponse) {
        let description = match err {
            AppResponse::InvalidInput(msg) => msg.clone(),
            AppResponse::NotFound(_) => "This comment no longer exists.".to_string(),
            AppResponse::PermissionDenied(_) => "You can only delete your own comments.".to_string(),
            _ => "Could not save your change. Try again later.".to_string(),
        };
        self.notifier
            .notify(Notification::new(title, description, Severity::Error));
    }

    /// Likes or unlikes `subject_id`; returns whether the like is now set.
    pub fn toggle_like(&self, subject_id: &str) -> Result<bool, AppResponse> {
        let user = self.signed_in("like birthdays")?;
        self.likes
            .toggle_like(subject_id, &user.matricula, self.year())
            .inspect_err(|e| self.report_failure("Like failed", e))
    }

    pub fn post_comment(&self, subject_id: &str, message: &str) -> Result<Comment, AppResponse> {
        let user = self.signed_in("comment")?;
        let input = NewComment {
            subject_id: subject_id.to_string(),
            author_id: user.matricula.clone(),
            author_display_name: user.nome.clone(),
            author_avatar: None,
            message: message.to_string(),
        };

        let comment = self
            .comments
            .add_comment(input, self.year())
            .inspect_err(|e| self.report_failure("Comment not posted", e))?;
        self.notifier.notify(Notification::new(
            "Comment posted",
            "Your message was added to the birthday card.",
            Severity::Success,
        ));
        Ok(comment)
    }

    pub fn delete_comment(&self, comment_id: &str) -> Result<(), AppResponse> {
        let user = self.signed_in("delete comments")?;
        self.comments
            .remove_comment(comment_id, &user.matricula, self.year())
            .inspect_err(|e| self.report_failure("Comment not deleted", e))?;
        self.notifier.notify(Notification::new(
            "Comment deleted",
            "Your message was removed.",
            Severity::Success,
        ));
        Ok(())
    }

    /// Everything the card shows. Works signed out; `liked_by_me` is then false.
    pub fn summary(&self, subject_id: &str) -> BirthdaySummary {
        let year = self.year();
        let liked_by_me = self
            .identity
            .current_user()
            .map(|user| self.likes.has_liked(subject_id, &user.matricula, year))
            .unwrap_or(false);

        BirthdaySummary {
            subject_id: subject_id.to_string(),
            year,
            like_count: self.likes.count_likes(subject_id, year),
            liked_by_me,
            comments: self.comments.get_comments(subject_id, year),
        }
    }
}
