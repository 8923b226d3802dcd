//! The signed-in employee, read from the `current_user` storage key.
//!
//! Nothing here talks to a server: a well-formed record under the key means
//! the user is signed in.

use std::sync::Arc;

use log::{info, warn};

use crate::app_response::AppResponse;
use crate::portal_model::CurrentUser;
use crate::storage_medium::StorageMedium;

pub const CURRENT_USER_KEY: &str = "current_user";

pub struct IdentityProvider {
    medium: Arc<dyn StorageMedium>,
}

impl IdentityProvider {
    pub fn new(medium: Arc<dyn StorageMedium>) -> Self {
        IdentityProvider { medium }
    }

    /// Re-reads the session record on every call, so a sign-in or sign-out
    /// done elsewhere on the same medium is seen immediately.
    pub fn current_user(&self) -> Option<CurrentUser> {
        let raw = match self.medium.get(CURRENT_USER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Reading session record failed: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<CurrentUser>(&raw) {
            Ok(user) if !user.matricula.trim().is_empty() => Some(user),
            Ok(_) => {
                warn!("Session record has an empty matricula");
                None
            }
            Err(e) => {
                warn!("Malformed session record: {}", e);
                None
            }
        }
    }

    pub fn require_user(&self) -> Result<CurrentUser, AppResponse> {
        self.current_user()
            .ok_or_else(|| AppResponse::PermissionDenied("login required".to_string()))
    }

    pub fn sign_in(&self, user: &CurrentUser) -> Result<(), AppResponse> {
        let json = serde_json::to_string(user)?;
        self.medium.set(CURRENT_USER_KEY, &json)?;
        info!("Signed in {}", user.matricula);
        Ok(())
    }

    pub fn sign_out(&self) -> Result<(), AppResponse> {
        if self.medium.remove(CURRENT_USER_KEY)? {
            info!("Signed out");
        }
        Ok(())
    }
}
