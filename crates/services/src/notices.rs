//! # Notice Mailbox
//!
//! Personal notices (written by the reaction toggler) and the single
//! global notice (written by admins).

use std::sync::Arc;

use tracing::{error, info};

use domains::{
    ActionOutcome, DomainError, DomainResult, NewNotice, Notice, NoticeRepository, Principal,
    Role,
};

use crate::authz::require_role;

pub struct NoticeService {
    notices: Arc<dyn NoticeRepository>,
}

impl NoticeService {
    pub fn new(notices: Arc<dyn NoticeRepository>) -> Self {
        Self { notices }
    }

    /// The actor's own notices, newest first. Global notices are not mixed in.
    pub async fn list(&self, actor: &Principal) -> DomainResult<Vec<Notice>> {
        self.notices.list_for_user(actor.user_id).await
    }

    pub async fn clear(&self, actor: &Principal) -> DomainResult<ActionOutcome> {
        let removed = self.notices.clear_for_user(actor.user_id).await?;
        info!(user_id = %actor.user_id, removed, "notices cleared");
        Ok(ActionOutcome::ok("Notices cleared."))
    }

    /// Replaces the global notice with `message` as given. Storage failures
    /// are reported in the outcome rather than propagated.
    pub async fn broadcast(&self, admin: &Principal, message: &str) -> DomainResult<ActionOutcome> {
        require_role(admin, Role::Admin)?;

        if message.trim().is_empty() {
            return Ok(ActionOutcome::err("Notice cannot be empty."));
        }

        match self.notices.replace_global(NewNotice::global(message)).await {
            Ok(notice) => {
                info!(notice_id = notice.id, admin_id = %admin.user_id, "global notice set");
                Ok(ActionOutcome::ok(format!("Global notice set: {message}")))
            }
            Err(DomainError::Persistence(e)) => {
                error!(error = %e, "failed to save global notice");
                Ok(ActionOutcome::err(format!("Error saving notice: {e}")))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn current_global(&self) -> DomainResult<Option<Notice>> {
        self.notices.current_global().await
    }
}
