use crate::{
    entities::{cart, cart_item, product, CartItemModel, CartModel, CartStatus, ProductStatus},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const DEFAULT_CURRENCY: &str = "GBP";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCartInput {
    pub customer_id: Option<Uuid>,
    pub session_id: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddToCartInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// A cart with its line items loaded
#[derive(Debug, Clone)]
pub struct CartWithItems {
    pub cart: CartModel,
    pub items: Vec<CartItemModel>,
}

/// Cart lifecycle and line-item management
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input))]
    pub async fn create_cart(&self, input: CreateCartInput) -> Result<CartModel, ServiceError> {
        let now = Utc::now();
        let new_cart = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(input.customer_id),
            session_id: Set(input.session_id),
            currency: Set(input
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())),
            subtotal: Set(Decimal::ZERO),
            total: Set(Decimal::ZERO),
            status: Set(CartStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = new_cart.insert(&*self.db).await?;
        info!("Created cart: {}", created.id);
        Ok(created)
    }

    pub async fn get_cart(&self, cart_id: Uuid) -> Result<CartWithItems, ServiceError> {
        let found = cart::Entity::find_by_id(cart_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        let items = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .all(&*self.db)
            .await?;

        Ok(CartWithItems { cart: found, items })
    }

    /// Add a product to the cart, bumping quantity when the line
    /// already exists. The unit price is snapshotted from the product.
    #[instrument(skip(self, input))]
    pub async fn add_item(
        &self,
        cart_id: Uuid,
        input: AddToCartInput,
    ) -> Result<CartWithItems, ServiceError> {
        if input.quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "quantity must be positive".into(),
            ));
        }

        let existing_cart = self.require_active_cart(cart_id).await?;

        let item = product::Entity::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;
        if item.status != ProductStatus::Active {
            return Err(ServiceError::InvalidOperation(
                "Product is not available".into(),
            ));
        }

        let existing_line = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(input.product_id))
            .one(&*self.db)
            .await?;

        let requested = input.quantity
            + existing_line.as_ref().map(|l| l.quantity).unwrap_or(0);
        if requested > item.stock {
            return Err(ServiceError::InsufficientStock(format!(
                "Only {} of '{}' in stock",
                item.stock, item.title
            )));
        }

        let now = Utc::now();
        match existing_line {
            Some(line) => {
                let unit_price = line.unit_price;
                let mut active: cart_item::ActiveModel = line.into();
                active.quantity = Set(requested);
                active.line_total = Set(unit_price * Decimal::from(requested));
                active.updated_at = Set(now);
                active.update(&*self.db).await?;
            }
            None => {
                let line = cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart_id),
                    product_id: Set(input.product_id),
                    quantity: Set(input.quantity),
                    unit_price: Set(item.price),
                    line_total: Set(item.price * Decimal::from(input.quantity)),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                line.insert(&*self.db).await?;
            }
        }

        self.recompute_totals(existing_cart).await?;
        self.get_cart(cart_id).await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        cart_id: Uuid,
        item_id: Uuid,
    ) -> Result<CartWithItems, ServiceError> {
        let existing_cart = self.require_active_cart(cart_id).await?;

        let line = cart_item::Entity::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;
        if line.cart_id != cart_id {
            return Err(ServiceError::InvalidOperation(
                "Item does not belong to this cart".into(),
            ));
        }

        cart_item::Entity::delete_by_id(item_id)
            .exec(&*self.db)
            .await?;

        self.recompute_totals(existing_cart).await?;
        self.get_cart(cart_id).await
    }

    /// Mark a cart converted after checkout.
    pub async fn mark_converted(&self, cart_id: Uuid) -> Result<CartModel, ServiceError> {
        let existing = self.require_active_cart(cart_id).await?;
        let mut active: cart::ActiveModel = existing.into();
        active.status = Set(CartStatus::Converted);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }

    async fn require_active_cart(&self, cart_id: Uuid) -> Result<CartModel, ServiceError> {
        let found = cart::Entity::find_by_id(cart_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;
        if found.status != CartStatus::Active {
            return Err(ServiceError::InvalidOperation(
                "Cart is no longer active".into(),
            ));
        }
        Ok(found)
    }

    async fn recompute_totals(&self, existing: CartModel) -> Result<CartModel, ServiceError> {
        let items = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(existing.id))
            .all(&*self.db)
            .await?;

        let subtotal: Decimal = items.iter().map(|i| i.line_total).sum();

        let mut active: cart::ActiveModel = existing.into();
        active.subtotal = Set(subtotal);
        active.total = Set(subtotal);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }
}
