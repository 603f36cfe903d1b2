//! Catalog routes.

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use serde::Deserialize;
use shopfront_commerce::ProductDraft;
use shopfront_core::models::product::{Category, ProductFilter, UpdateProduct};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{AdminUser, ApiPath, ApiQuery, PageQuery};
use crate::response::{Envelope, Page};
use crate::state::AppState;
use crate::upload::{self, ApiMultipart, MAX_FILES, MultipartForm, UPLOAD_BODY_LIMIT};

const IMAGE_FIELD: &str = "productImages";
const IMAGE_FOLDER: &str = "product_images";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get-all", get(list_products))
        .route("/{id}", get(get_product))
        .route(
            "/admin/create",
            post(create_product).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/admin/getAll", get(admin_list_products))
        .route(
            "/admin/product/{product_id}",
            put(update_product)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
                .delete(delete_product),
        )
}

#[derive(Debug, Default, Deserialize)]
struct CatalogQuery {
    page: Option<u64>,
    limit: Option<u64>,
    keyword: Option<String>,
    category: Option<String>,
    min: Option<String>,
    max: Option<String>,
}

fn price_bound(raw: Option<&str>, name: &str) -> Result<Option<f64>, ApiError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("{name} must be a number"))),
    }
}

impl CatalogQuery {
    fn filter(&self) -> Result<ProductFilter, ApiError> {
        let category = match self.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) => Some(c.parse::<Category>().map_err(ApiError::bad_request)?),
            None => None,
        };
        Ok(ProductFilter {
            keyword: self
                .keyword
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            category,
            min_price: price_bound(self.min.as_deref(), "min")?,
            max_price: price_bound(self.max.as_deref(), "max")?,
        })
    }
}

fn parse_field<T: std::str::FromStr>(
    form: &MultipartForm,
    name: &str,
    message: &str,
) -> Result<Option<T>, ApiError> {
    match form.text(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(message)),
    }
}

fn parse_category(form: &MultipartForm) -> Result<Option<Category>, ApiError> {
    form.text("category")
        .map(|c| c.parse::<Category>().map_err(ApiError::bad_request))
        .transpose()
}

async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CatalogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.filter()?;
    let pagination = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .default_pagination();

    let result = state.catalog.list_products(filter, pagination).await?;
    let message = if result.items.is_empty() {
        "No products found"
    } else {
        "Products fetched successfully"
    };
    Ok(Envelope::ok(Page::from(result), message))
}

async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.catalog.get_product(id).await?;
    Ok(Envelope::ok(product, "Product fetched successfully"))
}

async fn create_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    multipart: ApiMultipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = MultipartForm::read(multipart, IMAGE_FIELD, MAX_FILES).await?;
    if form.is_empty() {
        return Err(ApiError::bad_request("Product data is required"));
    }

    let category = parse_category(&form)?
        .ok_or_else(|| ApiError::bad_request("Please select a product category"))?;
    let price = parse_field::<f64>(&form, "price", "Price must be a number")?
        .ok_or_else(|| ApiError::bad_request("Please enter product price"))?;
    let stock = parse_field::<u32>(&form, "stock", "Stock must be a whole number")?.unwrap_or(1);

    let files = std::mem::take(&mut form.files);
    let images = upload::store_all(state.media.as_ref(), IMAGE_FOLDER, files).await?;
    let draft = ProductDraft {
        name: form.text("name").unwrap_or_default(),
        description: form.text("description").unwrap_or_default(),
        brand: form.text("brand"),
        price,
        category,
        tags: form.list("tags"),
        stock,
        images: images.clone(),
    };

    match state.catalog.create_product(admin.id, draft).await {
        Ok(product) => Ok(Envelope::created(product, "Product created successfully")),
        Err(e) => {
            upload::discard(state.media.as_ref(), &images).await;
            Err(e.into())
        }
    }
}

async fn admin_list_products(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .catalog
        .admin_list_products(query.pagination(20))
        .await?;
    let message = if result.items.is_empty() {
        "Products not found, please add products first"
    } else {
        "All products fetched successfully"
    };
    Ok(Envelope::ok(Page::from(result), message))
}

async fn update_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(product_id): ApiPath<Uuid>,
    multipart: ApiMultipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = MultipartForm::read(multipart, IMAGE_FIELD, MAX_FILES).await?;

    let mut update = UpdateProduct {
        name: form.text("name"),
        description: form.text("description"),
        price: parse_field(&form, "price", "Price must be a number")?,
        category: parse_category(&form)?,
        stock: parse_field(&form, "stock", "Stock must be a whole number")?,
        images: None,
    };
    if update.is_empty() && form.files.is_empty() {
        return Err(ApiError::bad_request("No data provided to update"));
    }
    // Make sure the product exists before writing any media.
    state.catalog.get_product(product_id).await?;

    let files = std::mem::take(&mut form.files);
    let uploaded = upload::store_all(state.media.as_ref(), IMAGE_FOLDER, files).await?;
    if !uploaded.is_empty() {
        update.images = Some(uploaded.clone());
    }

    match state.catalog.update_product(product_id, update).await {
        Ok((product, replaced)) => {
            upload::discard(state.media.as_ref(), &replaced).await;
            Ok(Envelope::ok(product, "Product updated successfully"))
        }
        Err(e) => {
            upload::discard(state.media.as_ref(), &uploaded).await;
            Err(e.into())
        }
    }
}

async fn delete_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(product_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.catalog.delete_product(product_id).await?;
    upload::discard(state.media.as_ref(), &product.images).await;
    Ok(Envelope::ok(product, "Product deleted successfully"))
}
