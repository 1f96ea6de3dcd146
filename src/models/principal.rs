//! Authenticated principal as reported by the identity service

use serde::Serialize;
use uuid::Uuid;

/// The caller behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub is_superuser: bool,
}

impl Principal {
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_superuser: false,
        }
    }

    pub fn superuser(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_superuser: true,
        }
    }

    /// Owners manage their own records; superusers manage everything.
    pub fn can_manage(&self, owner_id: Uuid) -> bool {
        self.is_superuser || self.user_id == owner_id
    }
}
