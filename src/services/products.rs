use crate::{
    entities::{
        product, product_image, product_variant, ProductImageModel, ProductModel, ProductStatus,
        ProductVariantModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    pub vendor_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub product_type: Option<String>,
    pub tags: Option<String>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub product_type: Option<String>,
    pub tags: Option<String>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateVariantInput {
    pub product_id: Uuid,
    pub sku: String,
    pub option1: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub stock: i32,
    pub barcode: Option<String>,
    pub weight: Option<Decimal>,
    pub weight_unit: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVariantInput {
    pub option1: Option<String>,
    pub price: Option<Decimal>,
    pub compare_at_price: Option<Decimal>,
    pub stock: Option<i32>,
    pub barcode: Option<String>,
    pub weight: Option<Decimal>,
    pub weight_unit: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddImageInput {
    pub product_id: Uuid,
    pub src: String,
    pub alt_text: Option<String>,
    pub position: Option<i32>,
}

/// Catalog service: vendor-scoped product, variant and image CRUD plus
/// the public search paths.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price cannot be negative".into(),
            ));
        }
        if input.stock < 0 {
            return Err(ServiceError::ValidationError(
                "stock cannot be negative".into(),
            ));
        }

        let now = Utc::now();
        let product_id = Uuid::new_v4();
        let new_product = product::ActiveModel {
            id: Set(product_id),
            vendor_id: Set(input.vendor_id),
            title: Set(input.title.trim().to_string()),
            description: Set(input.description),
            price: Set(input.price),
            stock: Set(input.stock),
            product_type: Set(input.product_type),
            tags: Set(input.tags),
            status: Set(input.status.unwrap_or(ProductStatus::Active)),
            shopify_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = new_product.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        info!("Created product: {}", product_id);
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        let existing = self.get_product(product_id).await?;
        let mut active: product::ActiveModel = existing.into();

        if let Some(title) = input.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "price cannot be negative".into(),
                ));
            }
            active.price = Set(price);
        }
        if let Some(stock) = input.stock {
            if stock < 0 {
                return Err(ServiceError::ValidationError(
                    "stock cannot be negative".into(),
                ));
            }
            active.stock = Set(stock);
        }
        if let Some(product_type) = input.product_type {
            active.product_type = Set(Some(product_type));
        }
        if let Some(tags) = input.tags {
            active.tags = Set(Some(tags));
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        info!("Updated product: {}", product_id);
        Ok(updated)
    }

    /// Delete a product. The emitted event carries the external id so
    /// the processor can remove the mirror copy after the row is gone.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_product(product_id).await?;
        let shopify_id = existing.shopify_id.clone();

        product::Entity::delete_by_id(product_id)
            .exec(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted {
                product_id,
                shopify_id,
            })
            .await;

        info!("Deleted product: {}", product_id);
        Ok(())
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    pub async fn list_by_vendor(
        &self,
        vendor_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<ProductModel>, u64), ServiceError> {
        let limit = limit.clamp(1, MAX_LIMIT);
        let page = page.max(1);

        let paginator = product::Entity::find()
            .filter(product::Column::VendorId.eq(vendor_id))
            .order_by_asc(product::Column::Title)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;
        Ok((products, total))
    }

    /// All active products, for the storefront listing.
    pub async fn list_storefront(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<ProductModel>, u64), ServiceError> {
        let limit = limit.clamp(1, MAX_LIMIT);
        let page = page.max(1);

        let paginator = product::Entity::find()
            .filter(product::Column::Status.eq(ProductStatus::Active))
            .order_by_asc(product::Column::Title)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;
        Ok((products, total))
    }

    /// Keyword search over title and description of active products.
    #[instrument(skip(self))]
    pub async fn search_by_keyword(
        &self,
        keyword: &str,
    ) -> Result<Vec<ProductModel>, ServiceError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ServiceError::InvalidInput("keyword is required".into()));
        }

        Ok(product::Entity::find()
            .filter(product::Column::Status.eq(ProductStatus::Active))
            .filter(
                Condition::any()
                    .add(product::Column::Title.contains(keyword))
                    .add(product::Column::Description.contains(keyword)),
            )
            .order_by_asc(product::Column::Title)
            .all(&*self.db)
            .await?)
    }

    /// Fails unless the product belongs to the given vendor. Admins
    /// bypass the check at the handler layer.
    pub async fn ensure_owned_by(
        &self,
        product_id: Uuid,
        vendor_id: Uuid,
    ) -> Result<ProductModel, ServiceError> {
        let existing = self.get_product(product_id).await?;
        if existing.vendor_id != vendor_id {
            return Err(ServiceError::Forbidden(
                "Product belongs to another vendor".into(),
            ));
        }
        Ok(existing)
    }

    // ---- Variants ----

    #[instrument(skip(self, input))]
    pub async fn create_variant(
        &self,
        input: CreateVariantInput,
    ) -> Result<ProductVariantModel, ServiceError> {
        // Validates product existence too
        self.get_product(input.product_id).await?;

        let now = Utc::now();
        let variant_id = Uuid::new_v4();
        let new_variant = product_variant::ActiveModel {
            id: Set(variant_id),
            product_id: Set(input.product_id),
            sku: Set(input.sku.trim().to_string()),
            option1: Set(input.option1),
            price: Set(input.price),
            compare_at_price: Set(input.compare_at_price),
            stock: Set(input.stock),
            barcode: Set(input.barcode),
            weight: Set(input.weight),
            weight_unit: Set(input.weight_unit),
            shopify_id: Set(None),
            position: Set(input.position.unwrap_or(1)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = new_variant.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(input.product_id))
            .await;

        Ok(created)
    }

    pub async fn list_variants(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ProductVariantModel>, ServiceError> {
        Ok(product_variant::Entity::find()
            .filter(product_variant::Column::ProductId.eq(product_id))
            .order_by_asc(product_variant::Column::Position)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_variant(
        &self,
        variant_id: Uuid,
        input: UpdateVariantInput,
    ) -> Result<ProductVariantModel, ServiceError> {
        let existing = self.get_variant(variant_id).await?;
        let product_id = existing.product_id;
        let mut active: product_variant::ActiveModel = existing.into();

        if let Some(option1) = input.option1 {
            active.option1 = Set(Some(option1));
        }
        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "price cannot be negative".into(),
                ));
            }
            active.price = Set(price);
        }
        if let Some(compare_at_price) = input.compare_at_price {
            active.compare_at_price = Set(Some(compare_at_price));
        }
        if let Some(stock) = input.stock {
            if stock < 0 {
                return Err(ServiceError::ValidationError(
                    "stock cannot be negative".into(),
                ));
            }
            active.stock = Set(stock);
        }
        if let Some(barcode) = input.barcode {
            active.barcode = Set(Some(barcode));
        }
        if let Some(weight) = input.weight {
            active.weight = Set(Some(weight));
        }
        if let Some(weight_unit) = input.weight_unit {
            active.weight_unit = Set(Some(weight_unit));
        }
        if let Some(position) = input.position {
            active.position = Set(position);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_variant(&self, variant_id: Uuid) -> Result<(), ServiceError> {
        let existing = product_variant::Entity::find_by_id(variant_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Variant {} not found", variant_id)))?;
        let product_id = existing.product_id;

        product_variant::Entity::delete_by_id(variant_id)
            .exec(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        Ok(())
    }

    pub async fn get_variant(
        &self,
        variant_id: Uuid,
    ) -> Result<ProductVariantModel, ServiceError> {
        product_variant::Entity::find_by_id(variant_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Variant {} not found", variant_id)))
    }

    // ---- Images ----

    #[instrument(skip(self, input))]
    pub async fn add_image(
        &self,
        input: AddImageInput,
    ) -> Result<ProductImageModel, ServiceError> {
        self.get_product(input.product_id).await?;

        let image = product_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            src: Set(input.src),
            alt_text: Set(input.alt_text),
            position: Set(input.position.unwrap_or(1)),
            created_at: Set(Utc::now()),
        };
        let created = image.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(input.product_id))
            .await;

        Ok(created)
    }

    pub async fn list_images(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ProductImageModel>, ServiceError> {
        Ok(product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .order_by_asc(product_image::Column::Position)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_image(&self, image_id: Uuid) -> Result<ProductImageModel, ServiceError> {
        product_image::Entity::find_by_id(image_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Image {} not found", image_id)))
    }

    #[instrument(skip(self))]
    pub async fn delete_image(&self, image_id: Uuid) -> Result<(), ServiceError> {
        let existing = product_image::Entity::find_by_id(image_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Image {} not found", image_id)))?;
        let product_id = existing.product_id;

        product_image::Entity::delete_by_id(image_id)
            .exec(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        Ok(())
    }
}
