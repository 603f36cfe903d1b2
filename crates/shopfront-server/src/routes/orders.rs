//! Order routes.

use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use serde::Deserialize;
use shopfront_core::models::order::{OrderLine, ShippingAddress};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::extract::{AdminUser, ApiJson, ApiPath, ApiQuery, CurrentUser, PageQuery};
use crate::response::{Envelope, Page};
use crate::state::AppState;

const ORDERS_PAGE_SIZE: u64 = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_order))
        .route("/user", get(my_orders))
        .route("/admin/orders", get(all_orders))
        .route(
            "/admin/update-status/{order_id}",
            put(update_status).patch(update_status),
        )
        .route("/admin/{order_id}", delete(delete_order))
        .route("/{order_id}", get(get_order))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateOrderRequest {
    shipping_address: ShippingAddress,
    #[serde(default)]
    #[validate(length(min = 1, message = "No order items provided"))]
    order_items: Vec<OrderLine>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StatusRequest {
    order_status: Option<String>,
}

async fn create_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    body.validate()?;
    let order = state
        .orders
        .create_order(user.id, body.shipping_address, body.order_items)
        .await?;
    Ok(Envelope::created(order, "Order created successfully"))
}

async fn my_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .orders
        .list_for_user(user.id, query.pagination(ORDERS_PAGE_SIZE))
        .await?;
    let message = if orders.items.is_empty() {
        "Orders Not Found"
    } else {
        "Orders fetched successfully"
    };
    Ok(Envelope::ok(Page::from(orders), message))
}

async fn all_orders(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .orders
        .list_all(query.pagination(ORDERS_PAGE_SIZE))
        .await?;
    Ok(Envelope::ok(Page::from(orders), "All orders fetched successfully"))
}

async fn get_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(order_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.orders.get_order(order_id, &user).await?;
    Ok(Envelope::ok(order, "Order fetched successfully"))
}

async fn update_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(order_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .orders
        .update_status(order_id, body.order_status.as_deref())
        .await?;
    Ok(Envelope::ok(order, "Order status updated successfully"))
}

async fn delete_order(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(order_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.orders.delete_order(order_id).await?;
    Ok(Envelope::empty("Order deleted successfully"))
}
