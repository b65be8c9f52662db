use crate::app::state::WorkerEvent;
use crate::upload::{BlockAction, SentinelClient, UploadError, UserRecord};
use std::collections::HashSet;

/// A block/unblock activation, resolved from the control's label at click time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRequest {
    pub user_id: String,
    pub action: BlockAction,
}

impl BlockRequest {
    pub fn from_control(user_id: impl Into<String>, label: &str) -> Self {
        Self {
            user_id: user_id.into(),
            action: BlockAction::from_label(label),
        }
    }

    pub async fn run(self, client: SentinelClient) -> WorkerEvent {
        let result = client.set_block(&self.user_id, self.action).await;
        WorkerEvent::BlockFinished {
            user_id: self.user_id,
            result,
        }
    }
}

pub async fn load_users(client: SentinelClient) -> WorkerEvent {
    WorkerEvent::UsersLoaded(client.list_users().await)
}

#[derive(Debug, Default)]
pub struct AdminPanel {
    pub users: Vec<UserRecord>,
    pub loading: bool,
    pub load_error: Option<String>,
    pending: HashSet<String>,
    requested: bool,
    // A load was refused while another was in flight.
    reload_queued: bool,
}

impl AdminPanel {
    /// Returns whether a load should be spawned now. A refused load is
    /// queued and handed back by `on_users_loaded`.
    pub fn begin_load(&mut self) -> bool {
        self.requested = true;
        if self.loading {
            self.reload_queued = true;
            return false;
        }
        self.loading = true;
        true
    }

    pub fn needs_initial_load(&self) -> bool {
        !self.requested
    }

    pub fn activate(&mut self, user: &UserRecord) -> BlockRequest {
        let request = BlockRequest::from_control(user.id.to_string(), user.control_label());
        tracing::info!(user_id = %request.user_id, action = request.action.as_str(), "admin action");
        self.pending.insert(request.user_id.clone());
        request
    }

    pub fn is_pending(&self, user: &UserRecord) -> bool {
        self.pending.contains(&user.id.to_string())
    }

    /// Returns whether the user list should be reloaded. Failures are only logged.
    pub fn on_block_finished(&mut self, user_id: &str, result: Result<(), UploadError>) -> bool {
        self.pending.remove(user_id);
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "block action failed");
                false
            }
        }
    }

    /// Returns whether a queued reload should be issued.
    pub fn on_users_loaded(&mut self, result: Result<Vec<UserRecord>, UploadError>) -> bool {
        self.loading = false;
        match result {
            Ok(users) => {
                tracing::debug!(count = users.len(), "users loaded");
                self.users = users;
                self.load_error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load users");
                self.load_error = Some(format!("Could not load users: {}", e));
            }
        }
        std::mem::take(&mut self.reload_queued)
    }

    pub fn blocked_count(&self) -> usize {
        self.users.iter().filter(|u| u.blocked).count()
    }
}
