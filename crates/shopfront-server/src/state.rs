//! Shared application state handed to every handler.

use std::sync::Arc;

use shopfront_auth::{AccountService, AuthService};
use shopfront_commerce::{CatalogService, CheckoutService, OrderService, ReviewService};
use shopfront_db::repository::{
    SurrealOrderRepository, SurrealProductRepository, SurrealReviewRepository,
    SurrealUserRepository,
};
use shopfront_payment::PaymentGateway;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

use crate::config::{ServerConfig, WebSettings};
use crate::mail::Mailer;
use crate::upload::MediaStore;

pub type Users = SurrealUserRepository<Any>;
pub type Products = SurrealProductRepository<Any>;
pub type Reviews = SurrealReviewRepository<Any>;
pub type Orders = SurrealOrderRepository<Any>;

/// Outbound collaborators chosen at start-up.
pub struct Backends {
    pub gateway: Arc<dyn PaymentGateway>,
    pub media: Arc<dyn MediaStore>,
    pub mailer: Arc<dyn Mailer>,
}

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService<Users>>,
    pub accounts: Arc<AccountService<Users>>,
    pub catalog: Arc<CatalogService<Products>>,
    pub reviews: Arc<ReviewService<Reviews, Products, Users>>,
    pub orders: Arc<OrderService<Orders, Products>>,
    pub checkout: Arc<CheckoutService<Orders, Products>>,
    pub media: Arc<dyn MediaStore>,
    pub mailer: Arc<dyn Mailer>,
    pub web: Arc<WebSettings>,
}

impl AppState {
    pub fn new(db: Surreal<Any>, config: &ServerConfig, backends: Backends) -> Self {
        let users = SurrealUserRepository::with_pepper(db.clone(), config.auth.pepper.clone());
        let products = SurrealProductRepository::new(db.clone());
        let reviews = SurrealReviewRepository::new(db.clone());
        let orders = SurrealOrderRepository::new(db);

        Self {
            auth: Arc::new(AuthService::new(users.clone(), config.auth.clone())),
            accounts: Arc::new(AccountService::new(users.clone())),
            catalog: Arc::new(CatalogService::new(products.clone())),
            reviews: Arc::new(ReviewService::new(reviews, products.clone(), users)),
            orders: Arc::new(OrderService::new(
                orders.clone(),
                products.clone(),
                config.pricing,
            )),
            checkout: Arc::new(CheckoutService::new(
                orders,
                products,
                backends.gateway,
                config.gateway.currency.clone(),
            )),
            media: backends.media,
            mailer: backends.mailer,
            web: Arc::new(config.web.clone()),
        }
    }
}
