use crate::{
    entities::{
        deletion_request, order, user, vendor, DeletionRequestModel, DeletionRequestStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Account deletion workflow: a user files a request, an admin
/// approves or rejects it. Approval removes the user and any vendor
/// record it owns; FK cascades take the catalog with it, while orders
/// are detached so vendor history survives.
#[derive(Clone)]
pub struct DeletionService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl DeletionService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// File a deletion request. One open request per user.
    #[instrument(skip(self))]
    pub async fn request_deletion(
        &self,
        user_id: Uuid,
        reason: Option<String>,
    ) -> Result<DeletionRequestModel, ServiceError> {
        user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

        let open = deletion_request::Entity::find()
            .filter(deletion_request::Column::UserId.eq(user_id))
            .filter(deletion_request::Column::Status.eq(DeletionRequestStatus::Pending))
            .one(&*self.db)
            .await?;
        if open.is_some() {
            return Err(ServiceError::Conflict(
                "A deletion request is already pending".into(),
            ));
        }

        let request_id = Uuid::new_v4();
        let request = deletion_request::ActiveModel {
            id: Set(request_id),
            user_id: Set(user_id),
            reason: Set(reason),
            status: Set(DeletionRequestStatus::Pending),
            requested_at: Set(Utc::now()),
            processed_at: Set(None),
        };
        let created = request.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::DeletionRequested(user_id))
            .await;

        info!("Deletion requested for user {}", user_id);
        Ok(created)
    }

    pub async fn list_requests(
        &self,
        status: Option<DeletionRequestStatus>,
    ) -> Result<Vec<DeletionRequestModel>, ServiceError> {
        let mut query =
            deletion_request::Entity::find().order_by_asc(deletion_request::Column::RequestedAt);
        if let Some(status) = status {
            query = query.filter(deletion_request::Column::Status.eq(status));
        }
        Ok(query.all(&*self.db).await?)
    }

    pub async fn get_request(
        &self,
        request_id: Uuid,
    ) -> Result<DeletionRequestModel, ServiceError> {
        deletion_request::Entity::find_by_id(request_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Deletion request {} not found", request_id))
            })
    }

    /// Approve a pending request and delete the account.
    #[instrument(skip(self))]
    pub async fn approve(&self, request_id: Uuid) -> Result<(), ServiceError> {
        let request = self.require_pending(request_id).await?;
        let user_id = request.user_id;

        // Detach the user's orders before the row disappears so vendor
        // order history keeps its totals.
        let customer_orders = order::Entity::find()
            .filter(order::Column::CustomerId.eq(user_id))
            .all(&*self.db)
            .await?;
        for o in customer_orders {
            let mut active: order::ActiveModel = o.into();
            active.customer_id = Set(None);
            active.updated_at = Set(Utc::now());
            active.update(&*self.db).await?;
        }

        if let Some(owned) = vendor::Entity::find()
            .filter(vendor::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
        {
            vendor::Entity::delete_by_id(owned.id)
                .exec(&*self.db)
                .await?;
        }

        // The request row has no FK to users, so it survives the
        // account removal as the audit record of what happened.
        let mut active: deletion_request::ActiveModel = request.into();
        active.status = Set(DeletionRequestStatus::Approved);
        active.processed_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;

        user::Entity::delete_by_id(user_id).exec(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::DeletionApproved(user_id))
            .await;

        info!("Deletion approved for user {}", user_id);
        Ok(())
    }

    /// Reject a pending request, leaving the account untouched.
    #[instrument(skip(self))]
    pub async fn reject(&self, request_id: Uuid) -> Result<DeletionRequestModel, ServiceError> {
        let request = self.require_pending(request_id).await?;

        let mut active: deletion_request::ActiveModel = request.into();
        active.status = Set(DeletionRequestStatus::Rejected);
        active.processed_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db).await?)
    }

    async fn require_pending(
        &self,
        request_id: Uuid,
    ) -> Result<DeletionRequestModel, ServiceError> {
        let request = self.get_request(request_id).await?;
        if request.status != DeletionRequestStatus::Pending {
            return Err(ServiceError::InvalidOperation(
                "Deletion request has already been processed".into(),
            ));
        }
        Ok(request)
    }
}
