use crate::{
    entities::{product, product_image, product_variant, vendor, ProductStatus},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

mod client;
pub mod queries;

pub use client::ShopifyClient;

/// Fixed retry policy for catalog deletes: the one remote call that
/// must not silently leave orphans behind.
const DELETE_RETRY_ATTEMPTS: u32 = 3;
const DELETE_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Line item for checkout creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutLineItem {
    pub variant_id: String,
    pub quantity: i64,
}

/// Checkout handle returned by the Storefront API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkout {
    pub id: String,
    pub web_url: String,
}

/// Outcome counters for a pull sync run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PullSummary {
    pub products_created: u64,
    pub products_updated: u64,
    pub products_skipped: u64,
    pub inventory_updates: u64,
}

/// One-directional mirror of the local catalog into Shopify, plus the
/// checkout and pull-sync calls the storefront needs.
#[derive(Clone)]
pub struct ShopifyService {
    db: Arc<DatabaseConnection>,
    client: ShopifyClient,
    publication_id: Option<String>,
}

impl ShopifyService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        client: ShopifyClient,
        publication_id: Option<String>,
    ) -> Self {
        Self {
            db,
            client,
            publication_id,
        }
    }

    /// Push a local product to the external catalog, creating or
    /// updating depending on whether it has synced before.
    #[instrument(skip(self))]
    pub async fn sync_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let product = product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let vendor = vendor::Entity::find_by_id(product.vendor_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Vendor {} not found", product.vendor_id))
            })?;

        let variants = product_variant::Entity::find()
            .filter(product_variant::Column::ProductId.eq(product_id))
            .order_by_asc(product_variant::Column::Position)
            .all(&*self.db)
            .await?;

        let images = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .order_by_asc(product_image::Column::Position)
            .all(&*self.db)
            .await?;

        let payload = build_product_payload(&product, &vendor.name, &variants, &images);

        match product.shopify_id.clone() {
            None => {
                let response = self.client.admin_post("products.json", &payload).await?;
                let remote = response
                    .get("product")
                    .cloned()
                    .ok_or_else(|| ServiceError::ShopifyApi("missing product in response".into()))?;

                let remote_id = remote
                    .get("id")
                    .and_then(id_to_string)
                    .ok_or_else(|| ServiceError::ShopifyApi("missing product id".into()))?;

                let mut active: product::ActiveModel = product.into();
                active.shopify_id = Set(Some(remote_id.clone()));
                active.update(&*self.db).await?;

                self.store_variant_ids(&variants, &remote).await?;
                self.publish_product(&remote_id).await;

                info!("Created product in Shopify: {} -> {}", product_id, remote_id);
            }
            Some(shopify_id) => {
                let path = format!("products/{}.json", shopify_id);
                self.client.admin_put(&path, &payload).await?;
                info!("Updated product in Shopify: {} -> {}", product_id, shopify_id);
            }
        }

        Ok(())
    }

    /// Match remote variant ids back onto local variants by SKU after
    /// a create call.
    async fn store_variant_ids(
        &self,
        variants: &[product_variant::Model],
        remote: &Value,
    ) -> Result<(), ServiceError> {
        let Some(remote_variants) = remote.get("variants").and_then(Value::as_array) else {
            return Ok(());
        };

        for local in variants {
            let matched = remote_variants.iter().find(|rv| {
                rv.get("sku").and_then(Value::as_str) == Some(local.sku.as_str())
            });
            if let Some(remote_id) = matched.and_then(|rv| rv.get("id")).and_then(id_to_string) {
                let mut active: product_variant::ActiveModel = local.clone().into();
                active.shopify_id = Set(Some(remote_id));
                active.update(&*self.db).await?;
            }
        }
        Ok(())
    }

    /// Publish a freshly created product to the configured sales
    /// channel. Publication failures are logged, not fatal: the
    /// product exists remotely and a later sync can re-publish.
    async fn publish_product(&self, shopify_id: &str) {
        let Some(publication_id) = self.publication_id.as_deref() else {
            return;
        };

        let variables = json!({
            "id": format!("gid://shopify/Product/{}", shopify_id),
            "input": [{ "publicationId": publication_id }],
        });

        match self
            .client
            .admin_graphql(queries::PUBLISHABLE_PUBLISH, variables)
            .await
        {
            Ok(data) => {
                let errors = data
                    .pointer("/publishablePublish/userErrors")
                    .and_then(Value::as_array)
                    .map(|a| a.len())
                    .unwrap_or(0);
                if errors > 0 {
                    warn!(
                        "publishablePublish reported {} user errors for product {}",
                        errors, shopify_id
                    );
                }
            }
            Err(e) => warn!("Failed to publish product {}: {}", shopify_id, e),
        }
    }

    /// Remove a product from the external catalog.
    ///
    /// Retries up to three times with exponential backoff before
    /// giving up; the local row is already gone by the time this runs.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, shopify_id: &str) -> Result<(), ServiceError> {
        let path = format!("products/{}.json", shopify_id);
        let mut attempt = 0;

        loop {
            match self.client.admin_delete(&path).await {
                Ok(()) => {
                    info!("Deleted product from Shopify: {}", shopify_id);
                    return Ok(());
                }
                Err(e) if attempt + 1 < DELETE_RETRY_ATTEMPTS => {
                    let backoff = DELETE_RETRY_BASE_DELAY * 2u32.pow(attempt);
                    warn!(
                        "Delete attempt {} failed for product {}: {}; retrying in {:?}",
                        attempt + 1,
                        shopify_id,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Create a checkout from line items via the Storefront API.
    #[instrument(skip(self))]
    pub async fn create_checkout(
        &self,
        line_items: &[CheckoutLineItem],
    ) -> Result<Checkout, ServiceError> {
        let variables = json!({
            "input": { "lineItems": storefront_line_items(line_items) }
        });

        let data = self
            .client
            .storefront_graphql(queries::CREATE_CHECKOUT, variables)
            .await?;

        extract_checkout(&data, "checkoutCreate")
    }

    /// Add line items to an existing checkout.
    #[instrument(skip(self))]
    pub async fn add_line_items(
        &self,
        checkout_id: &str,
        line_items: &[CheckoutLineItem],
    ) -> Result<Checkout, ServiceError> {
        let variables = json!({
            "checkoutId": checkout_id,
            "lineItems": storefront_line_items(line_items),
        });

        let data = self
            .client
            .storefront_graphql(queries::ADD_LINE_ITEMS, variables)
            .await?;

        extract_checkout(&data, "checkoutLineItemsAdd")
    }

    /// Pull the remote catalog and inventory levels into the local
    /// store. Remote products are matched by `shopify_id`; unmatched
    /// products attach to a vendor whose name or e-mail equals the
    /// remote vendor field, otherwise they are skipped.
    #[instrument(skip(self))]
    pub async fn pull_catalog(&self) -> Result<PullSummary, ServiceError> {
        let mut summary = PullSummary::default();

        let body = self.client.admin_get("products.json?limit=250").await?;
        let remote_products = body
            .get("products")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for remote in &remote_products {
            self.apply_remote_product(remote, &mut summary).await?;
        }

        let body = self.client.admin_get("inventory_levels.json").await?;
        let levels = body
            .get("inventory_levels")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for level in &levels {
            let Some(item_id) = level.get("inventory_item_id").and_then(id_to_string) else {
                continue;
            };
            let Some(available) = level.get("available").and_then(Value::as_i64) else {
                continue;
            };

            let matching = product::Entity::find()
                .filter(product::Column::ShopifyId.eq(item_id.clone()))
                .all(&*self.db)
                .await?;
            for local in matching {
                let mut active: product::ActiveModel = local.into();
                active.stock = Set(available as i32);
                active.updated_at = Set(chrono::Utc::now());
                active.update(&*self.db).await?;
                summary.inventory_updates += 1;
            }
        }

        info!(
            "Pull sync complete: {} created, {} updated, {} skipped, {} inventory updates",
            summary.products_created,
            summary.products_updated,
            summary.products_skipped,
            summary.inventory_updates
        );
        Ok(summary)
    }

    async fn apply_remote_product(
        &self,
        remote: &Value,
        summary: &mut PullSummary,
    ) -> Result<(), ServiceError> {
        let Some(remote_id) = remote.get("id").and_then(id_to_string) else {
            summary.products_skipped += 1;
            return Ok(());
        };

        let title = remote
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let description = remote
            .get("body_html")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let first_variant = remote
            .get("variants")
            .and_then(Value::as_array)
            .and_then(|v| v.first());
        let price = first_variant
            .and_then(|v| v.get("price"))
            .and_then(Value::as_str)
            .and_then(|p| Decimal::from_str(p).ok())
            .unwrap_or_default();
        let stock = first_variant
            .and_then(|v| v.get("inventory_quantity"))
            .and_then(Value::as_i64)
            .unwrap_or(0) as i32;

        let existing = product::Entity::find()
            .filter(product::Column::ShopifyId.eq(remote_id.clone()))
            .one(&*self.db)
            .await?;

        if let Some(local) = existing {
            let mut active: product::ActiveModel = local.into();
            active.title = Set(title);
            active.description = Set(description);
            active.price = Set(price);
            active.stock = Set(stock);
            active.updated_at = Set(chrono::Utc::now());
            active.update(&*self.db).await?;
            summary.products_updated += 1;
            return Ok(());
        }

        let remote_vendor = remote
            .get("vendor")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let owner = vendor::Entity::find()
            .filter(
                sea_orm::Condition::any()
                    .add(vendor::Column::Name.eq(remote_vendor))
                    .add(vendor::Column::Email.eq(remote_vendor)),
            )
            .one(&*self.db)
            .await?;

        let Some(owner) = owner else {
            warn!(
                "Skipping remote product {}: no local vendor matches '{}'",
                remote_id, remote_vendor
            );
            summary.products_skipped += 1;
            return Ok(());
        };

        let now = chrono::Utc::now();
        let new_product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor_id: Set(owner.id),
            title: Set(title),
            description: Set(description),
            price: Set(price),
            stock: Set(stock),
            product_type: Set(remote
                .get("product_type")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from)),
            tags: Set(remote
                .get("tags")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from)),
            status: Set(ProductStatus::Active),
            shopify_id: Set(Some(remote_id)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        new_product.insert(&*self.db).await?;
        summary.products_created += 1;
        Ok(())
    }
}

/// Map a local product (with variants and images) to the Admin REST
/// payload shape.
fn build_product_payload(
    product: &product::Model,
    vendor_name: &str,
    variants: &[product_variant::Model],
    images: &[product_image::Model],
) -> Value {
    let variant_payloads: Vec<Value> = if variants.is_empty() {
        // Products without explicit variants sync as a single default
        // variant carrying the product price and stock.
        vec![json!({
            "price": product.price.to_string(),
            "inventory_quantity": product.stock,
            "inventory_management": "shopify",
        })]
    } else {
        variants
            .iter()
            .map(|v| {
                let mut body = json!({
                    "option1": v.option1,
                    "sku": v.sku,
                    "price": v.price.to_string(),
                    "inventory_quantity": v.stock,
                    "inventory_management": "shopify",
                    "barcode": v.barcode,
                    "weight": v.weight.map(|w| w.to_string()),
                    "weight_unit": v.weight_unit,
                    "compare_at_price": v.compare_at_price.map(|p| p.to_string()),
                });
                if let Some(shopify_id) = &v.shopify_id {
                    body["id"] = json!(shopify_id);
                }
                body
            })
            .collect()
    };

    let mut body = json!({
        "title": product.title,
        "body_html": product.description,
        "vendor": vendor_name,
        "product_type": product.product_type,
        "tags": product.tags,
        "status": product.status.as_shopify_status(),
        "variants": variant_payloads,
        "images": images.iter().map(|i| json!({ "src": i.src })).collect::<Vec<_>>(),
    });
    if let Some(shopify_id) = &product.shopify_id {
        body["id"] = json!(shopify_id);
    }

    json!({ "product": body })
}

fn storefront_line_items(line_items: &[CheckoutLineItem]) -> Vec<Value> {
    line_items
        .iter()
        .map(|li| json!({ "variantId": li.variant_id, "quantity": li.quantity }))
        .collect()
}

fn extract_checkout(data: &Value, mutation: &str) -> Result<Checkout, ServiceError> {
    let root = data
        .get(mutation)
        .ok_or_else(|| ServiceError::ShopifyApi(format!("missing {} payload", mutation)))?;

    if let Some(errors) = root.get("checkoutUserErrors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let joined = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ServiceError::ShopifyApi(joined));
        }
    }

    let checkout = root
        .get("checkout")
        .ok_or_else(|| ServiceError::ShopifyApi("missing checkout in response".into()))?;

    Ok(Checkout {
        id: checkout
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        web_url: checkout
            .get("webUrl")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Shopify REST ids arrive as numbers; GraphQL ids as strings.
fn id_to_string(value: &Value) -> Option<String> {
    value
        .as_i64()
        .map(|v| v.to_string())
        .or_else(|| value.as_str().map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_product() -> product::Model {
        let now = chrono::Utc::now();
        product::Model {
            id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            title: "Sourdough Loaf".into(),
            description: "Slow fermented".into(),
            price: dec!(4.50),
            stock: 12,
            product_type: Some("Bakery".into()),
            tags: Some("bread, artisan".into()),
            status: ProductStatus::Active,
            shopify_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn payload_uses_default_variant_when_none_exist() {
        let product = sample_product();
        let payload = build_product_payload(&product, "Corner Bakery", &[], &[]);

        let variants = payload["product"]["variants"].as_array().unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0]["price"], "4.50");
        assert_eq!(variants[0]["inventory_quantity"], 12);
        assert_eq!(payload["product"]["vendor"], "Corner Bakery");
        assert!(payload["product"].get("id").is_none());
    }

    #[test]
    fn payload_includes_id_for_synced_products() {
        let mut product = sample_product();
        product.shopify_id = Some("998877".into());
        let payload = build_product_payload(&product, "Corner Bakery", &[], &[]);
        assert_eq!(payload["product"]["id"], "998877");
    }

    #[test]
    fn numeric_and_string_ids_normalize() {
        assert_eq!(id_to_string(&json!(42)).as_deref(), Some("42"));
        assert_eq!(id_to_string(&json!("gid://x/42")).as_deref(), Some("gid://x/42"));
        assert_eq!(id_to_string(&json!(null)), None);
    }

    #[test]
    fn checkout_user_errors_become_api_errors() {
        let data = json!({
            "checkoutCreate": {
                "checkout": null,
                "checkoutUserErrors": [{ "code": "INVALID", "message": "Variant unavailable" }]
            }
        });
        let err = extract_checkout(&data, "checkoutCreate").unwrap_err();
        assert!(matches!(err, ServiceError::ShopifyApi(msg) if msg.contains("Variant unavailable")));
    }
}
