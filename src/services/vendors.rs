use crate::{
    entities::{user, vendor, UserRole, VendorModel, VendorStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::geocoding::{haversine_miles, Coordinates, PostcodeClient},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterVendorInput {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub postcode: String,
    pub location: Option<String>,
    pub opening_times: Option<String>,
    pub contact_info: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVendorInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub postcode: Option<String>,
    pub location: Option<String>,
    pub opening_times: Option<String>,
    pub contact_info: Option<String>,
}

/// A vendor together with its distance from a searched point
#[derive(Debug, Clone)]
pub struct VendorWithDistance {
    pub vendor: VendorModel,
    pub distance_miles: f64,
}

/// Vendor onboarding, profile management and proximity search
#[derive(Clone)]
pub struct VendorService {
    db: Arc<DatabaseConnection>,
    geocoder: PostcodeClient,
    event_sender: Arc<EventSender>,
}

impl VendorService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        geocoder: PostcodeClient,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            geocoder,
            event_sender,
        }
    }

    /// Register a vendor for an existing user account.
    ///
    /// The postcode is geocoded up front; registration fails without a
    /// resolvable location. New vendors start in `pending` until an
    /// admin approves them.
    #[instrument(skip(self, input))]
    pub async fn register_vendor(
        &self,
        input: RegisterVendorInput,
    ) -> Result<VendorModel, ServiceError> {
        let email = input.email.trim().to_lowercase();

        let existing = vendor::Entity::find()
            .filter(vendor::Column::Email.eq(email.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict("Email already registered".into()));
        }

        let owns_vendor = vendor::Entity::find()
            .filter(vendor::Column::UserId.eq(input.user_id))
            .one(&*self.db)
            .await?;
        if owns_vendor.is_some() {
            return Err(ServiceError::Conflict(
                "User already has a vendor account".into(),
            ));
        }

        let coordinates = self.geocoder.lookup(&input.postcode).await?;

        let now = Utc::now();
        let vendor_id = Uuid::new_v4();
        let new_vendor = vendor::ActiveModel {
            id: Set(vendor_id),
            user_id: Set(input.user_id),
            name: Set(input.name.trim().to_string()),
            email: Set(email),
            postcode: Set(input.postcode.trim().to_string()),
            latitude: Set(coordinates.latitude),
            longitude: Set(coordinates.longitude),
            location: Set(input.location),
            opening_times: Set(input.opening_times),
            contact_info: Set(input.contact_info),
            status: Set(VendorStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = new_vendor.insert(&*self.db).await?;

        // The owning account becomes a vendor account
        if let Some(owner) = user::Entity::find_by_id(input.user_id).one(&*self.db).await? {
            if owner.role == UserRole::Customer {
                let mut active: user::ActiveModel = owner.into();
                active.role = Set(UserRole::Vendor);
                active.updated_at = Set(now);
                active.update(&*self.db).await?;
            }
        }

        self.event_sender
            .send_or_log(Event::VendorRegistered(vendor_id))
            .await;

        info!("Registered vendor: {}", vendor_id);
        Ok(created)
    }

    /// Partial profile update. A changed postcode is re-geocoded so
    /// the stored coordinates always match it.
    #[instrument(skip(self, input))]
    pub async fn update_vendor(
        &self,
        vendor_id: Uuid,
        input: UpdateVendorInput,
    ) -> Result<VendorModel, ServiceError> {
        let existing = self.get_vendor(vendor_id).await?;

        if let Some(ref email) = input.email {
            let email = email.trim().to_lowercase();
            let clash = vendor::Entity::find()
                .filter(vendor::Column::Email.eq(email.clone()))
                .one(&*self.db)
                .await?;
            if clash.map(|v| v.id != vendor_id).unwrap_or(false) {
                return Err(ServiceError::Conflict("Email already in use".into()));
            }
        }

        let mut active: vendor::ActiveModel = existing.into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(email) = input.email {
            active.email = Set(email.trim().to_lowercase());
        }
        if let Some(postcode) = input.postcode {
            let coordinates = self.geocoder.lookup(&postcode).await?;
            active.postcode = Set(postcode.trim().to_string());
            active.latitude = Set(coordinates.latitude);
            active.longitude = Set(coordinates.longitude);
        }
        if let Some(location) = input.location {
            active.location = Set(Some(location));
        }
        if let Some(opening_times) = input.opening_times {
            active.opening_times = Set(Some(opening_times));
        }
        if let Some(contact_info) = input.contact_info {
            active.contact_info = Set(Some(contact_info));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::VendorUpdated(vendor_id))
            .await;

        info!("Updated vendor: {}", vendor_id);
        Ok(updated)
    }

    pub async fn get_vendor(&self, vendor_id: Uuid) -> Result<VendorModel, ServiceError> {
        vendor::Entity::find_by_id(vendor_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Vendor {} not found", vendor_id)))
    }

    pub async fn get_vendor_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<VendorModel>, ServiceError> {
        Ok(vendor::Entity::find()
            .filter(vendor::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?)
    }

    /// Paginated vendor listing. Public callers see approved vendors
    /// only.
    pub async fn list_vendors(
        &self,
        page: u64,
        limit: u64,
        only_approved: bool,
    ) -> Result<(Vec<VendorModel>, u64), ServiceError> {
        let limit = limit.clamp(1, MAX_LIMIT).max(1);
        let page = page.max(1);

        let mut query = vendor::Entity::find().order_by_asc(vendor::Column::Name);
        if only_approved {
            query = query.filter(vendor::Column::Status.eq(VendorStatus::Approved));
        }

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let vendors = paginator.fetch_page(page - 1).await?;

        Ok((vendors, total))
    }

    /// Proximity search: geocode the query postcode and scan approved
    /// vendors with the great-circle distance filter.
    #[instrument(skip(self))]
    pub async fn find_nearby(
        &self,
        postcode: &str,
        radius_miles: f64,
    ) -> Result<Vec<VendorWithDistance>, ServiceError> {
        let origin = self.geocoder.lookup(postcode).await?;

        let vendors = vendor::Entity::find()
            .filter(vendor::Column::Status.eq(VendorStatus::Approved))
            .all(&*self.db)
            .await?;

        let mut nearby: Vec<VendorWithDistance> = vendors
            .into_iter()
            .filter_map(|v| {
                let here = Coordinates {
                    latitude: v.latitude,
                    longitude: v.longitude,
                };
                let distance_miles = haversine_miles(origin, here);
                (distance_miles <= radius_miles).then_some(VendorWithDistance {
                    vendor: v,
                    distance_miles,
                })
            })
            .collect();

        nearby.sort_by(|a, b| {
            a.distance_miles
                .partial_cmp(&b.distance_miles)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(nearby)
    }

    /// Admin approval workflow.
    #[instrument(skip(self))]
    pub async fn set_vendor_status(
        &self,
        vendor_id: Uuid,
        status: VendorStatus,
    ) -> Result<VendorModel, ServiceError> {
        if status == VendorStatus::Pending {
            return Err(ServiceError::InvalidOperation(
                "Vendors cannot be moved back to pending".into(),
            ));
        }

        let existing = self.get_vendor(vendor_id).await?;
        let mut active: vendor::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::VendorStatusChanged {
                vendor_id,
                status: format!("{:?}", status).to_lowercase(),
            })
            .await;

        Ok(updated)
    }

    /// Delete a vendor and, via FK cascade, its catalog.
    #[instrument(skip(self))]
    pub async fn delete_vendor(&self, vendor_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_vendor(vendor_id).await?;
        vendor::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;
        info!("Deleted vendor: {}", vendor_id);
        Ok(())
    }
}
