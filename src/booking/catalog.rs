//! Resource catalog: listing, creation and owner-guarded deletion.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::{timed, StoreError};
use crate::models::{NewResource, Principal, Resource, ResourceKind};

use super::engine::BookingEngine;
use super::error::BookingError;

impl BookingEngine {
    /// Resources visible to shoppers, newest first
    pub async fn resources(&self, kind: Option<ResourceKind>) -> Result<Vec<Resource>, BookingError> {
        Ok(timed(self.store_timeout(), self.store().list_resources(kind, None)).await?)
    }

    /// Resources the principal may manage. Superusers see everything.
    pub async fn managed_resources(&self, principal: &Principal) -> Result<Vec<Resource>, BookingError> {
        let owner = if principal.is_superuser {
            None
        } else {
            Some(principal.user_id)
        };
        Ok(timed(self.store_timeout(), self.store().list_resources(None, owner)).await?)
    }

    pub async fn create_resource(
        &self,
        payload: NewResource,
        principal: &Principal,
    ) -> Result<Resource, BookingError> {
        payload.validate().map_err(BookingError::Validation)?;

        let resource = payload.into_resource(principal.user_id, Utc::now());
        timed(self.store_timeout(), self.store().insert_resource(&resource)).await?;

        info!("Resource {} ({}) created by {}", resource.id, resource.kind, principal.user_id);
        Ok(resource)
    }

    /// Delete a resource the principal owns (or any, for superusers).
    ///
    /// Refused while pending or paid reservations still point at it. The
    /// store checks and deletes in one unit, so a commit racing the delete
    /// either lands first and blocks it or finds the resource gone.
    pub async fn delete_resource(&self, id: Uuid, principal: &Principal) -> Result<(), BookingError> {
        let resource = self.resource(id).await?;
        if !principal.can_manage(resource.owner_id) {
            return Err(BookingError::Forbidden(id));
        }

        match timed(self.store_timeout(), self.store().delete_resource(id)).await {
            Ok(()) => {}
            Err(StoreError::InUse) => return Err(BookingError::ResourceInUse(id)),
            Err(StoreError::NotFound) => return Err(BookingError::ResourceNotFound(id)),
            Err(e) => return Err(e.into()),
        }

        info!("Resource {} deleted by {}", id, principal.user_id);
        Ok(())
    }
}
