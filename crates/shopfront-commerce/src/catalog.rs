//! Product catalog management.

use shopfront_core::error::{ShopError, ShopResult};
use shopfront_core::models::media::ImageRef;
use shopfront_core::models::product::{
    Category, CreateProduct, MAX_PRICE, Product, ProductFilter, UpdateProduct,
};
use shopfront_core::repository::{PaginatedResult, Pagination, ProductRepository};
use tracing::info;
use uuid::Uuid;

/// Product fields supplied by an administrator. The owner is the acting
/// administrator and is filled in by the service.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub brand: Option<String>,
    pub price: f64,
    pub category: Category,
    pub tags: Vec<String>,
    pub stock: u32,
    pub images: Vec<ImageRef>,
}

fn check_name(name: &str) -> ShopResult<()> {
    if name.trim().is_empty() {
        return Err(ShopError::validation("Please enter product name"));
    }
    Ok(())
}

fn check_description(description: &str) -> ShopResult<()> {
    if description.trim().is_empty() {
        return Err(ShopError::validation("Please enter product description"));
    }
    Ok(())
}

fn check_price(price: f64) -> ShopResult<()> {
    if !price.is_finite() || !(0.0..=MAX_PRICE).contains(&price) {
        return Err(ShopError::validation(format!(
            "Price must be between 0 and {MAX_PRICE}"
        )));
    }
    Ok(())
}

pub struct CatalogService<P: ProductRepository> {
    products: P,
}

impl<P: ProductRepository> CatalogService<P> {
    pub fn new(products: P) -> Self {
        Self { products }
    }

    pub async fn create_product(&self, owner_id: Uuid, draft: ProductDraft) -> ShopResult<Product> {
        check_name(&draft.name)?;
        check_description(&draft.description)?;
        check_price(draft.price)?;

        let product = self
            .products
            .create(CreateProduct {
                name: draft.name.trim().to_string(),
                description: draft.description,
                brand: draft.brand.filter(|b| !b.trim().is_empty()),
                price: draft.price,
                category: draft.category,
                tags: draft.tags,
                stock: draft.stock,
                images: draft.images,
                owner_id,
            })
            .await?;

        info!(product_id = %product.id, slug = %product.slug, "Product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: Uuid) -> ShopResult<Product> {
        self.products.get_by_id(id).await
    }

    /// Public listing. A page past the end is an empty result.
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        pagination: Pagination,
    ) -> ShopResult<PaginatedResult<Product>> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(ShopError::validation(
                    "Minimum price cannot exceed maximum price",
                ));
            }
        }
        self.products.list(filter, pagination).await
    }

    pub async fn admin_list_products(
        &self,
        pagination: Pagination,
    ) -> ShopResult<PaginatedResult<Product>> {
        self.products.list(ProductFilter::default(), pagination).await
    }

    /// Apply a whitelisted update. Returns the updated product and the
    /// images it replaced (empty unless new images were supplied).
    pub async fn update_product(
        &self,
        id: Uuid,
        update: UpdateProduct,
    ) -> ShopResult<(Product, Vec<ImageRef>)> {
        if update.is_empty() {
            return Err(ShopError::validation("No data provided to update"));
        }
        if let Some(name) = &update.name {
            check_name(name)?;
        }
        if let Some(description) = &update.description {
            check_description(description)?;
        }
        if let Some(price) = update.price {
            check_price(price)?;
        }

        let current = self.products.get_by_id(id).await?;
        let replaced = if update.images.is_some() {
            current.images
        } else {
            Vec::new()
        };

        let product = self.products.update(id, update).await?;
        info!(product_id = %id, "Product updated");
        Ok((product, replaced))
    }

    /// Remove a product. The returned product still carries its images so
    /// the caller can discard them.
    pub async fn delete_product(&self, id: Uuid) -> ShopResult<Product> {
        let product = self.products.delete(id).await?;
        info!(product_id = %id, "Product deleted");
        Ok(product)
    }
}
