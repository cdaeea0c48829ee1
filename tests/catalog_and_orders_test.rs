mod common;

use common::TestApp;
use marketplace_api::entities::{OrderStatus, UserRole, VendorStatus};
use marketplace_api::errors::ServiceError;
use marketplace_api::events::Event;
use marketplace_api::services::carts::{AddToCartInput, CreateCartInput};
use marketplace_api::services::orders::{CreateOrderInput, OrderItemInput};
use marketplace_api::services::products::{CreateProductInput, UpdateProductInput};
use rust_decimal_macros::dec;

#[tokio::test]
async fn product_crud_emits_sync_events() {
    let mut app = TestApp::new().await;
    let (user, _) = app.create_user("owner@example.com", UserRole::Vendor).await;
    let vendor = app
        .create_vendor_record(
            user.id,
            "Bakery",
            "bakery@example.com",
            51.5,
            -0.14,
            VendorStatus::Approved,
        )
        .await;

    let product = app
        .state
        .services
        .products
        .create_product(CreateProductInput {
            vendor_id: vendor.id,
            title: "Sourdough".into(),
            description: "Slow fermented".into(),
            price: dec!(4.50),
            stock: 10,
            product_type: None,
            tags: Some("bread".into()),
            status: None,
        })
        .await
        .expect("create failed");

    assert!(matches!(
        app.events.recv().await,
        Some(Event::ProductCreated(id)) if id == product.id
    ));

    app.state
        .services
        .products
        .update_product(
            product.id,
            UpdateProductInput {
                price: Some(dec!(5.00)),
                ..Default::default()
            },
        )
        .await
        .expect("update failed");

    assert!(matches!(
        app.events.recv().await,
        Some(Event::ProductUpdated(id)) if id == product.id
    ));

    app.state
        .services
        .products
        .delete_product(product.id)
        .await
        .expect("delete failed");

    match app.events.recv().await {
        Some(Event::ProductDeleted {
            product_id,
            shopify_id,
        }) => {
            assert_eq!(product_id, product.id);
            assert!(shopify_id.is_none());
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn keyword_search_matches_title_and_description() {
    let app = TestApp::new().await;
    let (user, _) = app.create_user("owner@example.com", UserRole::Vendor).await;
    let vendor = app
        .create_vendor_record(
            user.id,
            "Bakery",
            "bakery@example.com",
            51.5,
            -0.14,
            VendorStatus::Approved,
        )
        .await;

    app.create_product_record(vendor.id, "Sourdough Loaf", dec!(4.50), 10)
        .await;
    app.create_product_record(vendor.id, "Croissant", dec!(2.00), 25)
        .await;

    let by_title = app
        .state
        .services
        .products
        .search_by_keyword("Sourdough")
        .await
        .unwrap();
    assert_eq!(by_title.len(), 1);

    // create_product_record writes "<title> description" bodies
    let by_description = app
        .state
        .services
        .products
        .search_by_keyword("Croissant description")
        .await
        .unwrap();
    assert_eq!(by_description.len(), 1);

    let none = app
        .state
        .services
        .products
        .search_by_keyword("Bagel")
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn ownership_is_enforced_per_vendor() {
    let app = TestApp::new().await;
    let (u1, _) = app.create_user("a@example.com", UserRole::Vendor).await;
    let (u2, _) = app.create_user("b@example.com", UserRole::Vendor).await;
    let v1 = app
        .create_vendor_record(u1.id, "A", "a-shop@example.com", 51.5, -0.14, VendorStatus::Approved)
        .await;
    let v2 = app
        .create_vendor_record(u2.id, "B", "b-shop@example.com", 51.6, -0.15, VendorStatus::Approved)
        .await;

    let product = app
        .create_product_record(v1.id, "Loaf", dec!(3.00), 5)
        .await;

    let err = app
        .state
        .services
        .products
        .ensure_owned_by(product.id, v2.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    app.state
        .services
        .products
        .ensure_owned_by(product.id, v1.id)
        .await
        .expect("owner should have access");
}

#[tokio::test]
async fn cart_totals_track_line_items() {
    let app = TestApp::new().await;
    let (user, _) = app.create_user("owner@example.com", UserRole::Vendor).await;
    let vendor = app
        .create_vendor_record(
            user.id,
            "Bakery",
            "bakery@example.com",
            51.5,
            -0.14,
            VendorStatus::Approved,
        )
        .await;
    let bread = app
        .create_product_record(vendor.id, "Loaf", dec!(3.00), 10)
        .await;
    let pastry = app
        .create_product_record(vendor.id, "Croissant", dec!(2.50), 10)
        .await;

    let cart = app
        .state
        .services
        .carts
        .create_cart(CreateCartInput::default())
        .await
        .unwrap();

    let after_bread = app
        .state
        .services
        .carts
        .add_item(
            cart.id,
            AddToCartInput {
                product_id: bread.id,
                quantity: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(after_bread.cart.subtotal, dec!(6.00));

    let after_pastry = app
        .state
        .services
        .carts
        .add_item(
            cart.id,
            AddToCartInput {
                product_id: pastry.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();
    assert_eq!(after_pastry.cart.total, dec!(8.50));
    assert_eq!(after_pastry.items.len(), 2);

    // Adding the same product again bumps quantity on the same line
    let bumped = app
        .state
        .services
        .carts
        .add_item(
            cart.id,
            AddToCartInput {
                product_id: bread.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();
    assert_eq!(bumped.items.len(), 2);
    assert_eq!(bumped.cart.total, dec!(11.50));

    let line = bumped
        .items
        .iter()
        .find(|i| i.product_id == bread.id)
        .unwrap();
    let trimmed = app
        .state
        .services
        .carts
        .remove_item(cart.id, line.id)
        .await
        .unwrap();
    assert_eq!(trimmed.items.len(), 1);
    assert_eq!(trimmed.cart.total, dec!(2.50));
}

#[tokio::test]
async fn cart_rejects_quantities_beyond_stock() {
    let app = TestApp::new().await;
    let (user, _) = app.create_user("owner@example.com", UserRole::Vendor).await;
    let vendor = app
        .create_vendor_record(
            user.id,
            "Bakery",
            "bakery@example.com",
            51.5,
            -0.14,
            VendorStatus::Approved,
        )
        .await;
    let scarce = app
        .create_product_record(vendor.id, "Limited Loaf", dec!(9.00), 2)
        .await;

    let cart = app
        .state
        .services
        .carts
        .create_cart(CreateCartInput::default())
        .await
        .unwrap();

    let err = app
        .state
        .services
        .carts
        .add_item(
            cart.id,
            AddToCartInput {
                product_id: scarce.id,
                quantity: 3,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));
}

#[tokio::test]
async fn checkout_splits_a_cart_into_per_vendor_orders() {
    let app = TestApp::new().await;
    let (owner1, _) = app.create_user("a@example.com", UserRole::Vendor).await;
    let (owner2, _) = app.create_user("b@example.com", UserRole::Vendor).await;
    let (customer, _) = app.create_user("buyer@example.com", UserRole::Customer).await;

    let v1 = app
        .create_vendor_record(owner1.id, "A", "a-shop@example.com", 51.5, -0.14, VendorStatus::Approved)
        .await;
    let v2 = app
        .create_vendor_record(owner2.id, "B", "b-shop@example.com", 51.6, -0.15, VendorStatus::Approved)
        .await;

    let p1 = app.create_product_record(v1.id, "Loaf", dec!(3.00), 10).await;
    let p2 = app
        .create_product_record(v2.id, "Candle", dec!(7.00), 4)
        .await;

    let cart = app
        .state
        .services
        .carts
        .create_cart(CreateCartInput {
            customer_id: Some(customer.id),
            session_id: None,
            currency: None,
        })
        .await
        .unwrap();

    for (product_id, quantity) in [(p1.id, 2), (p2.id, 1)] {
        app.state
            .services
            .carts
            .add_item(
                cart.id,
                AddToCartInput {
                    product_id,
                    quantity,
                },
            )
            .await
            .unwrap();
    }

    let orders = app
        .state
        .services
        .orders
        .checkout_cart(&app.state.services.carts, cart.id, Some(customer.id))
        .await
        .expect("checkout failed");

    assert_eq!(orders.len(), 2);
    let totals: Vec<_> = orders.iter().map(|o| o.order.total).collect();
    assert!(totals.contains(&dec!(6.00)));
    assert!(totals.contains(&dec!(7.00)));

    // Stock decremented per line
    let p1_after = app.state.services.products.get_product(p1.id).await.unwrap();
    assert_eq!(p1_after.stock, 8);

    // The cart is no longer usable
    let err = app
        .state
        .services
        .carts
        .add_item(
            cart.id,
            AddToCartInput {
                product_id: p1.id,
                quantity: 1,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn cancelling_an_order_restores_stock() {
    let app = TestApp::new().await;
    let (owner, _) = app.create_user("owner@example.com", UserRole::Vendor).await;
    let (customer, _) = app.create_user("buyer@example.com", UserRole::Customer).await;
    let vendor = app
        .create_vendor_record(
            owner.id,
            "Bakery",
            "bakery@example.com",
            51.5,
            -0.14,
            VendorStatus::Approved,
        )
        .await;
    let product = app
        .create_product_record(vendor.id, "Loaf", dec!(3.00), 10)
        .await;

    let order = app
        .state
        .services
        .orders
        .create_order(CreateOrderInput {
            customer_id: Some(customer.id),
            vendor_id: vendor.id,
            currency: None,
            items: vec![OrderItemInput {
                product_id: product.id,
                quantity: 4,
            }],
        })
        .await
        .expect("order failed");
    assert_eq!(order.order.status, OrderStatus::Pending);
    assert_eq!(order.order.total, dec!(12.00));

    let depleted = app.state.services.products.get_product(product.id).await.unwrap();
    assert_eq!(depleted.stock, 6);

    let cancelled = app
        .state
        .services
        .orders
        .cancel_order(order.order.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let restored = app.state.services.products.get_product(product.id).await.unwrap();
    assert_eq!(restored.stock, 10);

    // Terminal orders are frozen
    let err = app
        .state
        .services
        .orders
        .update_status(order.order.id, OrderStatus::Processing)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn orders_reject_insufficient_stock() {
    let app = TestApp::new().await;
    let (owner, _) = app.create_user("owner@example.com", UserRole::Vendor).await;
    let vendor = app
        .create_vendor_record(
            owner.id,
            "Bakery",
            "bakery@example.com",
            51.5,
            -0.14,
            VendorStatus::Approved,
        )
        .await;
    let product = app
        .create_product_record(vendor.id, "Loaf", dec!(3.00), 1)
        .await;

    let err = app
        .state
        .services
        .orders
        .create_order(CreateOrderInput {
            customer_id: None,
            vendor_id: vendor.id,
            currency: None,
            items: vec![OrderItemInput {
                product_id: product.id,
                quantity: 2,
            }],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));
}
