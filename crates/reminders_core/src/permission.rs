//! Permission negotiation over a backing store.
//!
//! # Responsibility
//! - Report the normalized authorization status without prompting.
//! - Request elevated access at most once per undetermined state.
//!
//! # Invariants
//! - At most one prompt is shown per `request_access` call, and only when the
//!   status was `NotDetermined`.
//! - Concurrent `request_access` calls are serialized; a caller arriving
//!   while a prompt is in flight observes its outcome instead of prompting.
//! - Prompt failures resolve to `Denied`; they are never propagated.

use crate::model::authorization::AuthorizationStatus;
use crate::store::ReminderStore;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Negotiates access to one backing store handle.
pub struct PermissionNegotiator<S: ReminderStore> {
    store: Arc<S>,
    prompt_gate: Mutex<()>,
}

impl<S: ReminderStore> PermissionNegotiator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            prompt_gate: Mutex::new(()),
        }
    }

    /// Current normalized status. Never prompts.
    pub fn current_status(&self) -> AuthorizationStatus {
        AuthorizationStatus::normalize(
            self.store.current_authorization(),
            self.store.capability_model(),
        )
    }

    /// Whether the current status permits every operation.
    pub fn has_access(&self) -> bool {
        self.current_status().is_sufficient()
    }

    /// Requests access when the status is still undetermined.
    ///
    /// Returns the resulting status. Statuses other than `NotDetermined`
    /// are returned as-is without prompting; denial and restriction are
    /// final until changed outside this process.
    pub async fn request_access(&self) -> AuthorizationStatus {
        let _gate = self.prompt_gate.lock().await;

        let status = self.current_status();
        if status != AuthorizationStatus::NotDetermined {
            info!(
                "event=permission_request module=permission status=skipped current={}",
                status
            );
            return status;
        }

        info!("event=permission_request module=permission status=start");
        let resolved = match self.store.request_authorization().await {
            Ok(true) => match self.current_status() {
                AuthorizationStatus::NotDetermined => AuthorizationStatus::normalize(
                    self.store.capability_model().granted_level(),
                    self.store.capability_model(),
                ),
                after => after,
            },
            Ok(false) => AuthorizationStatus::Denied,
            Err(err) => {
                warn!(
                    "event=permission_request module=permission status=error error_code=prompt_failed error={}",
                    err
                );
                AuthorizationStatus::Denied
            }
        };

        info!(
            "event=permission_request module=permission status=ok resolved={}",
            resolved
        );
        resolved
    }
}
