use crate::{
    entities::{order, order_item, product, OrderItemModel, OrderModel, OrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::carts::CartService,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const DEFAULT_CURRENCY: &str = "GBP";
const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub customer_id: Option<Uuid>,
    pub vendor_id: Uuid,
    pub currency: Option<String>,
    pub items: Vec<OrderItemInput>,
}

/// An order with its line items loaded
#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
}

/// Order creation, lookup and status transitions
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Create an order from explicit line items. Stock is checked and
    /// decremented per item; prices and titles are snapshotted.
    #[instrument(skip(self, input))]
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
    ) -> Result<OrderWithItems, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "order must contain at least one item".into(),
            ));
        }

        let mut lines: Vec<(product::Model, i32)> = Vec::with_capacity(input.items.len());
        for item in &input.items {
            if item.quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "quantity must be positive".into(),
                ));
            }

            let found = product::Entity::find_by_id(item.product_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;

            if found.vendor_id != input.vendor_id {
                return Err(ServiceError::InvalidOperation(format!(
                    "Product {} belongs to another vendor",
                    item.product_id
                )));
            }
            if found.stock < item.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "Only {} of '{}' in stock",
                    found.stock, found.title
                )));
            }

            lines.push((found, item.quantity));
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let total: Decimal = lines
            .iter()
            .map(|(p, qty)| p.price * Decimal::from(*qty))
            .sum();

        let new_order = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(generate_order_number()),
            customer_id: Set(input.customer_id),
            vendor_id: Set(input.vendor_id),
            status: Set(OrderStatus::Pending),
            total: Set(total),
            currency: Set(input
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())),
            placed_at: Set(now),
            updated_at: Set(now),
        };
        let created = new_order.insert(&*self.db).await?;

        let mut items = Vec::with_capacity(lines.len());
        for (found, quantity) in lines {
            let line = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(found.id),
                title: Set(found.title.clone()),
                quantity: Set(quantity),
                unit_price: Set(found.price),
            };
            items.push(line.insert(&*self.db).await?);

            let remaining = found.stock - quantity;
            let mut active: product::ActiveModel = found.into();
            active.stock = Set(remaining);
            active.updated_at = Set(now);
            active.update(&*self.db).await?;
        }

        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;

        info!("Created order: {}", order_id);
        Ok(OrderWithItems {
            order: created,
            items,
        })
    }

    /// Convert an active cart into orders, one per vendor represented
    /// in the cart, and mark the cart converted.
    #[instrument(skip(self, carts))]
    pub async fn checkout_cart(
        &self,
        carts: &CartService,
        cart_id: Uuid,
        customer_id: Option<Uuid>,
    ) -> Result<Vec<OrderWithItems>, ServiceError> {
        let cart = carts.get_cart(cart_id).await?;
        if cart.items.is_empty() {
            return Err(ServiceError::InvalidOperation("Cart is empty".into()));
        }

        // Group cart lines by owning vendor
        let mut by_vendor: HashMap<Uuid, Vec<OrderItemInput>> = HashMap::new();
        for line in &cart.items {
            let found = product::Entity::find_by_id(line.product_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", line.product_id))
                })?;
            by_vendor.entry(found.vendor_id).or_default().push(OrderItemInput {
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }

        let mut orders = Vec::with_capacity(by_vendor.len());
        for (vendor_id, items) in by_vendor {
            let order = self
                .create_order(CreateOrderInput {
                    customer_id,
                    vendor_id,
                    currency: Some(cart.cart.currency.clone()),
                    items,
                })
                .await?;
            orders.push(order);
        }

        carts.mark_converted(cart_id).await?;
        self.event_sender
            .send_or_log(Event::CartConverted(cart_id))
            .await;

        Ok(orders)
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderWithItems, ServiceError> {
        let found = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        Ok(OrderWithItems { order: found, items })
    }

    pub async fn list_for_vendor(
        &self,
        vendor_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderModel>, u64), ServiceError> {
        let limit = limit.clamp(1, MAX_LIMIT);
        let page = page.max(1);

        let paginator = order::Entity::find()
            .filter(order::Column::VendorId.eq(vendor_id))
            .order_by_desc(order::Column::PlacedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;
        Ok((orders, total))
    }

    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderModel>, u64), ServiceError> {
        let limit = limit.clamp(1, MAX_LIMIT);
        let page = page.max(1);

        let paginator = order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::PlacedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;
        Ok((orders, total))
    }

    /// Move an order to a new status. Terminal states are frozen.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<OrderModel, ServiceError> {
        let existing = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if existing.status.is_terminal() {
            return Err(ServiceError::InvalidOperation(format!(
                "Order is already {:?}",
                existing.status
            )));
        }

        let old_status = existing.status;
        let mut active: order::ActiveModel = existing.into();
        active.status = Set(new_status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: format!("{:?}", old_status).to_lowercase(),
                new_status: format!("{:?}", new_status).to_lowercase(),
            })
            .await;

        Ok(updated)
    }

    /// Cancel a pending or processing order and restore product stock.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        let existing = self.get_order(order_id).await?;
        if existing.order.status.is_terminal() {
            return Err(ServiceError::InvalidOperation(format!(
                "Order is already {:?}",
                existing.order.status
            )));
        }

        let now = Utc::now();
        for line in &existing.items {
            if let Some(found) = product::Entity::find_by_id(line.product_id)
                .one(&*self.db)
                .await?
            {
                let restored = found.stock + line.quantity;
                let mut active: product::ActiveModel = found.into();
                active.stock = Set(restored);
                active.updated_at = Set(now);
                active.update(&*self.db).await?;
            }
        }

        let mut active: order::ActiveModel = existing.order.into();
        active.status = Set(OrderStatus::Cancelled);
        active.updated_at = Set(now);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderCancelled(order_id))
            .await;

        info!("Cancelled order: {}", order_id);
        Ok(updated)
    }
}

fn generate_order_number() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("ORD-{}", &id[..12].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_are_prefixed_and_unique() {
        let a = generate_order_number();
        let b = generate_order_number();
        assert!(a.starts_with("ORD-"));
        assert_eq!(a.len(), "ORD-".len() + 12);
        assert_ne!(a, b);
    }
}
