//! Order placement, status lifecycle and payment verification against an
//! in-memory database and the mock gateway.

use std::sync::Arc;

use chrono::Utc;
use shopfront_commerce::{CheckoutService, OrderService, PaymentCallback, VerificationOutcome};
use shopfront_core::error::ShopError;
use shopfront_core::models::order::{OrderLine, OrderStatus, PaymentStatus, ShippingAddress};
use shopfront_core::models::product::{Category, CreateProduct, Product};
use shopfront_core::models::user::{Role, User};
use shopfront_core::pricing::PricingPolicy;
use shopfront_core::repository::{OrderRepository, Pagination, ProductRepository};
use shopfront_db::repository::{SurrealOrderRepository, SurrealProductRepository};
use shopfront_payment::{MockGateway, compute_signature};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

const SECRET: &str = "gateway-secret";

struct Fixture {
    orders: OrderService<SurrealOrderRepository<Db>, SurrealProductRepository<Db>>,
    checkout: CheckoutService<SurrealOrderRepository<Db>, SurrealProductRepository<Db>>,
    order_repo: SurrealOrderRepository<Db>,
    products: SurrealProductRepository<Db>,
    gateway: Arc<MockGateway>,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    shopfront_db::run_migrations(&db).await.unwrap();

    let order_repo = SurrealOrderRepository::new(db.clone());
    let products = SurrealProductRepository::new(db);
    let gateway = Arc::new(MockGateway::new("rzp_test_key", SECRET));
    Fixture {
        orders: OrderService::new(order_repo.clone(), products.clone(), PricingPolicy::default()),
        checkout: CheckoutService::new(
            order_repo.clone(),
            products.clone(),
            gateway.clone(),
            "INR",
        ),
        order_repo,
        products,
        gateway,
    }
}

async fn product(products: &SurrealProductRepository<Db>, name: &str, price: f64, stock: u32) -> Product {
    products
        .create(CreateProduct {
            name: name.into(),
            description: "desc".into(),
            brand: None,
            price,
            category: Category::Electronics,
            tags: vec![],
            stock,
            images: vec![],
            owner_id: Uuid::new_v4(),
        })
        .await
        .unwrap()
}

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Asha Rao".into(),
        phone: "9999999999".into(),
        street: "1 Main St".into(),
        city: "Pune".into(),
        state: "MH".into(),
        country: "IN".into(),
        postal_code: "411001".into(),
    }
}

fn person(id: Uuid, role: Role) -> User {
    let now = Utc::now();
    User {
        id,
        full_name: "Someone".into(),
        email: "someone@example.com".into(),
        phone: None,
        password_hash: String::new(),
        avatar: None,
        role,
        refresh_token: None,
        reset_password_token: None,
        reset_password_expires_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn line(product: Uuid, quantity: u32) -> OrderLine {
    OrderLine { product, quantity }
}

fn signed(gateway_order_id: &str, payment_id: &str) -> PaymentCallback {
    PaymentCallback {
        gateway_order_id: gateway_order_id.into(),
        gateway_payment_id: payment_id.into(),
        signature: compute_signature(gateway_order_id, payment_id, SECRET).unwrap(),
    }
}

#[tokio::test]
async fn order_is_priced_from_catalog_without_touching_stock() {
    let f = setup().await;
    let p = product(&f.products, "Monitor", 500.0, 5).await;
    let buyer = Uuid::new_v4();

    let order = f
        .orders
        .create_order(buyer, address(), vec![line(p.id, 1), line(p.id, 1)])
        .await
        .unwrap();

    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].price, 500.0);
    assert_eq!(order.prices.items_price, 1000.0);
    assert_eq!(order.prices.tax_price, 60.0);
    assert_eq!(order.prices.shipping_price, 0.0);
    assert_eq!(order.prices.total_price, 1060.0);
    assert_eq!(order.order_status, OrderStatus::Pending);
    assert_eq!(order.payment_info.status, PaymentStatus::Created);
    assert!(!order.is_paid);
    assert_eq!(f.products.get_by_id(p.id).await.unwrap().stock, 5);
}

#[tokio::test]
async fn order_creation_rejects_bad_input() {
    let f = setup().await;
    let p = product(&f.products, "Cable", 10.0, 2).await;
    let buyer = Uuid::new_v4();

    let err = f.orders.create_order(buyer, address(), vec![]).await.unwrap_err();
    assert!(matches!(err, ShopError::Validation { .. }));

    let err = f
        .orders
        .create_order(buyer, address(), vec![line(Uuid::new_v4(), 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::NotFound { .. }));

    let err = f
        .orders
        .create_order(buyer, address(), vec![line(p.id, 3)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ShopError::InsufficientStock { requested: 3, available: 2, .. }
    ));

    let err = f
        .orders
        .create_order(
            buyer,
            ShippingAddress {
                city: String::new(),
                ..address()
            },
            vec![line(p.id, 1)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::Validation { .. }));
}

#[tokio::test]
async fn only_owner_or_admin_can_view_an_order() {
    let f = setup().await;
    let p = product(&f.products, "Mouse", 25.0, 4).await;
    let owner = Uuid::new_v4();
    let order = f
        .orders
        .create_order(owner, address(), vec![line(p.id, 1)])
        .await
        .unwrap();

    f.orders.get_order(order.id, &person(owner, Role::User)).await.unwrap();
    f.orders
        .get_order(order.id, &person(Uuid::new_v4(), Role::Admin))
        .await
        .unwrap();
    let err = f
        .orders
        .get_order(order.id, &person(Uuid::new_v4(), Role::User))
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::AuthorizationDenied { .. }));

    let mine = f.orders.list_for_user(owner, Pagination::default()).await.unwrap();
    assert_eq!(mine.total, 1);
    let all = f.orders.list_all(Pagination::default()).await.unwrap();
    assert_eq!(all.total, 1);
}

#[tokio::test]
async fn status_lifecycle_restocks_and_locks_terminal_states() {
    let f = setup().await;
    let p = product(&f.products, "Keyboard", 40.0, 3).await;
    let order = f
        .orders
        .create_order(Uuid::new_v4(), address(), vec![line(p.id, 2)])
        .await
        .unwrap();

    let err = f.orders.update_status(order.id, Some("lost")).await.unwrap_err();
    assert!(matches!(err, ShopError::Validation { .. }));
    assert!(f.orders.update_status(order.id, None).await.is_err());
    let err = f.orders.update_status(order.id, Some("Shipped")).await.unwrap_err();
    assert!(matches!(err, ShopError::Validation { .. }));

    let err = f
        .orders
        .update_status(Uuid::new_v4(), Some("lost"))
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::NotFound { .. }), "got {err:?}");

    let shipped = f.orders.update_status(order.id, Some("shipped")).await.unwrap();
    assert_eq!(shipped.order_status, OrderStatus::Shipped);

    let err = f.orders.delete_order(order.id).await.unwrap_err();
    assert!(matches!(err, ShopError::Validation { .. }));

    let cancelled = f.orders.update_status(order.id, Some("cancelled")).await.unwrap();
    assert_eq!(cancelled.order_status, OrderStatus::Cancelled);
    assert_eq!(f.products.get_by_id(p.id).await.unwrap().stock, 5);

    let err = f.orders.update_status(order.id, Some("processing")).await.unwrap_err();
    assert!(matches!(err, ShopError::InvalidTransition { .. }));
    assert_eq!(f.products.get_by_id(p.id).await.unwrap().stock, 5);

    f.orders.delete_order(order.id).await.unwrap();
    assert!(matches!(
        f.order_repo.get_by_id(order.id).await.unwrap_err(),
        ShopError::NotFound { .. }
    ));
}

#[tokio::test]
async fn delivery_stamps_timestamp() {
    let f = setup().await;
    let p = product(&f.products, "Speaker", 70.0, 3).await;
    let order = f
        .orders
        .create_order(Uuid::new_v4(), address(), vec![line(p.id, 1)])
        .await
        .unwrap();

    let delivered = f.orders.update_status(order.id, Some("delivered")).await.unwrap();
    assert_eq!(delivered.order_status, OrderStatus::Delivered);
    assert!(delivered.delivered_at.is_some());
    assert_eq!(f.products.get_by_id(p.id).await.unwrap().stock, 3);
}

#[tokio::test]
async fn payment_order_uses_minor_units() {
    let f = setup().await;
    let gateway_order = f.checkout.create_payment_order(Some(1060.0)).await.unwrap();
    assert_eq!(gateway_order.amount, 106_000);
    assert_eq!(gateway_order.currency, "INR");
    assert_eq!(f.checkout.api_key(), "rzp_test_key");

    assert!(f.checkout.create_payment_order(None).await.is_err());
    assert!(f.checkout.create_payment_order(Some(0.0)).await.is_err());

    f.gateway.set_fail_next(true);
    let err = f.checkout.create_payment_order(Some(10.0)).await.unwrap_err();
    assert!(matches!(err, ShopError::PaymentGateway(_)));
}

#[tokio::test]
async fn verified_payment_decrements_stock_once() {
    let f = setup().await;
    let p = product(&f.products, "Laptop", 500.0, 5).await;
    let order = f
        .orders
        .create_order(Uuid::new_v4(), address(), vec![line(p.id, 2)])
        .await
        .unwrap();
    let gateway_order = f.checkout.create_payment_order(Some(1060.0)).await.unwrap();
    let callback = signed(&gateway_order.id, "pay_001");

    let outcome = f
        .checkout
        .verify_payment(&order.id.to_string(), &callback)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        VerificationOutcome::Paid {
            payment_id: "pay_001".into()
        }
    );

    let stored = f.order_repo.get_by_id(order.id).await.unwrap();
    assert!(stored.is_paid);
    assert!(stored.paid_at.is_some());
    assert_eq!(stored.order_status, OrderStatus::Processing);
    assert_eq!(stored.payment_info.id.as_deref(), Some("pay_001"));
    assert_eq!(stored.payment_info.status, PaymentStatus::Paid);
    assert_eq!(f.products.get_by_id(p.id).await.unwrap().stock, 3);

    let replay = f
        .checkout
        .verify_payment(&order.id.to_string(), &callback)
        .await
        .unwrap();
    assert_eq!(replay, outcome);
    assert_eq!(f.products.get_by_id(p.id).await.unwrap().stock, 3);

    let other = f
        .checkout
        .verify_payment(&order.id.to_string(), &signed(&gateway_order.id, "pay_002"))
        .await
        .unwrap();
    assert_eq!(other, VerificationOutcome::Failed);
    assert_eq!(f.products.get_by_id(p.id).await.unwrap().stock, 3);
}

#[tokio::test]
async fn payment_never_reopens_a_closed_order() {
    let f = setup().await;
    let p = product(&f.products, "Tablet", 200.0, 10).await;
    let order = f
        .orders
        .create_order(Uuid::new_v4(), address(), vec![line(p.id, 3)])
        .await
        .unwrap();
    f.orders.update_status(order.id, Some("cancelled")).await.unwrap();
    assert_eq!(f.products.get_by_id(p.id).await.unwrap().stock, 13);

    let outcome = f
        .checkout
        .verify_payment(&order.id.to_string(), &signed("order_late", "pay_1"))
        .await
        .unwrap();
    assert_eq!(outcome, VerificationOutcome::Failed);

    let stored = f.order_repo.get_by_id(order.id).await.unwrap();
    assert_eq!(stored.order_status, OrderStatus::Cancelled);
    assert!(!stored.is_paid);
    assert!(stored.payment_info.id.is_none());
    assert_eq!(f.products.get_by_id(p.id).await.unwrap().stock, 13);
}

#[tokio::test]
async fn refunded_order_ignores_late_payment() {
    let f = setup().await;
    let p = product(&f.products, "Drone", 900.0, 4).await;
    let order = f
        .orders
        .create_order(Uuid::new_v4(), address(), vec![line(p.id, 1)])
        .await
        .unwrap();
    f.orders.update_status(order.id, Some("refunded")).await.unwrap();

    let outcome = f
        .checkout
        .verify_payment(&order.id.to_string(), &signed("order_r", "pay_r"))
        .await
        .unwrap();
    assert_eq!(outcome, VerificationOutcome::Failed);
    let stored = f.order_repo.get_by_id(order.id).await.unwrap();
    assert_eq!(stored.order_status, OrderStatus::Refunded);
    assert_eq!(f.products.get_by_id(p.id).await.unwrap().stock, 5);
}

#[tokio::test]
async fn bad_signature_marks_unpaid_order_failed() {
    let f = setup().await;
    let p = product(&f.products, "Phone", 300.0, 4).await;
    let order = f
        .orders
        .create_order(Uuid::new_v4(), address(), vec![line(p.id, 1)])
        .await
        .unwrap();

    let forged = PaymentCallback {
        signature: "00".repeat(32),
        ..signed("order_mock_1", "pay_x")
    };
    let outcome = f
        .checkout
        .verify_payment(&order.id.to_string(), &forged)
        .await
        .unwrap();
    assert_eq!(outcome, VerificationOutcome::Failed);

    let stored = f.order_repo.get_by_id(order.id).await.unwrap();
    assert!(!stored.is_paid);
    assert_eq!(stored.payment_info.status, PaymentStatus::Failed);
    assert_eq!(stored.order_status, OrderStatus::Pending);
    assert_eq!(f.products.get_by_id(p.id).await.unwrap().stock, 4);
}

#[tokio::test]
async fn unknown_or_malformed_order_fails_without_writes() {
    let f = setup().await;
    let callback = signed("order_mock_1", "pay_1");

    let outcome = f
        .checkout
        .verify_payment(&Uuid::new_v4().to_string(), &callback)
        .await
        .unwrap();
    assert_eq!(outcome, VerificationOutcome::Failed);

    let outcome = f.checkout.verify_payment("not-a-uuid", &callback).await.unwrap();
    assert_eq!(outcome, VerificationOutcome::Failed);
}

#[tokio::test]
async fn oversold_confirmation_floors_stock() {
    let f = setup().await;
    let p = product(&f.products, "Camera", 100.0, 2).await;
    let first = f
        .orders
        .create_order(Uuid::new_v4(), address(), vec![line(p.id, 2)])
        .await
        .unwrap();
    let second = f
        .orders
        .create_order(Uuid::new_v4(), address(), vec![line(p.id, 2)])
        .await
        .unwrap();

    f.checkout
        .verify_payment(&first.id.to_string(), &signed("order_a", "pay_a"))
        .await
        .unwrap();
    let outcome = f
        .checkout
        .verify_payment(&second.id.to_string(), &signed("order_b", "pay_b"))
        .await
        .unwrap();

    assert!(matches!(outcome, VerificationOutcome::Paid { .. }));
    assert_eq!(f.products.get_by_id(p.id).await.unwrap().stock, 0);
}
