//! SurrealDB implementation of [`ProductRepository`].

use chrono::{DateTime, Utc};
use shopfront_core::error::ShopResult;
use shopfront_core::models::media::ImageRef;
use shopfront_core::models::product::{
    Category, CreateProduct, Product, ProductFilter, RatingSummary, UpdateProduct,
};
use shopfront_core::repository::{PaginatedResult, Pagination, ProductRepository};
use shopfront_core::slug;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, from_document, parse_uuid, to_document};
use crate::error::DbError;

const SELECT_PRODUCT: &str = "SELECT meta::id(id) AS record_id, * FROM";
const DEFAULT_BRAND: &str = "Generic";

#[derive(Debug, SurrealValue)]
struct ProductRow {
    record_id: String,
    name: String,
    slug: String,
    description: String,
    brand: String,
    price: f64,
    images: serde_json::Value,
    category: String,
    tags: Vec<String>,
    stock: u32,
    average_rating: f64,
    reviews_count: u64,
    owner_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn try_into_product(self) -> Result<Product, DbError> {
        Ok(Product {
            id: parse_uuid("product", &self.record_id)?,
            name: self.name,
            slug: self.slug,
            description: self.description,
            brand: self.brand,
            price: self.price,
            images: from_document::<Vec<ImageRef>>("images", self.images)?,
            category: self.category.parse::<Category>().map_err(DbError::Decode)?,
            tags: self.tags,
            stock: self.stock,
            average_rating: self.average_rating,
            reviews_count: self.reviews_count,
            owner_id: parse_uuid("owner", &self.owner_id)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn first_product(rows: Vec<ProductRow>, id: impl ToString) -> Result<Product, DbError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::not_found("product", id))?
        .try_into_product()
}

fn collect_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, DbError> {
    rows.into_iter()
        .map(ProductRow::try_into_product)
        .collect()
}

/// SurrealDB implementation of the Product repository.
#[derive(Clone)]
pub struct SurrealProductRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProductRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// First free slug derived from `name`: `phone`, `phone-1`, `phone-2`...
    ///
    /// The product being renamed (`owner`) does not collide with itself.
    async fn unique_slug(&self, name: &str, owner: Option<&str>) -> Result<String, DbError> {
        let base = slug::slugify(name);
        let owner = owner.unwrap_or_default().to_string();
        let mut n = 0;
        loop {
            let candidate = slug::candidate(&base, n);
            let mut result = self
                .db
                .query(
                    "SELECT count() AS total FROM product \
                     WHERE slug = $slug AND meta::id(id) != $owner GROUP ALL",
                )
                .bind(("slug", candidate.clone()))
                .bind(("owner", owner.clone()))
                .await?;
            let rows: Vec<CountRow> = result.take(0)?;
            if rows.first().map(|r| r.total).unwrap_or(0) == 0 {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

impl<C: Connection> ProductRepository for SurrealProductRepository<C> {
    async fn create(&self, input: CreateProduct) -> ShopResult<Product> {
        let id_str = Uuid::new_v4().to_string();
        let slug = self.unique_slug(&input.name, None).await?;
        let brand = input
            .brand
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_BRAND.to_string());

        let result = self
            .db
            .query(format!(
                "CREATE type::record('product', $id) SET \
                 name = $name, slug = $slug, \
                 description = $description, brand = $brand, \
                 price = $price, images = $images, \
                 category = $category, tags = $tags, \
                 stock = $stock, average_rating = 0.0, \
                 reviews_count = 0, owner_id = $owner_id; \
                 {SELECT_PRODUCT} type::record('product', $id);"
            ))
            .bind(("id", id_str.clone()))
            .bind(("name", input.name.trim().to_string()))
            .bind(("slug", slug))
            .bind(("description", input.description))
            .bind(("brand", brand))
            .bind(("price", input.price))
            .bind(("images", to_document(&input.images)?))
            .bind(("category", input.category.as_str().to_string()))
            .bind(("tags", input.tags))
            .bind(("stock", input.stock))
            .bind(("owner_id", input.owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("product", e))?;

        let rows: Vec<ProductRow> = result.take(1).map_err(DbError::from)?;
        Ok(first_product(rows, id_str)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ShopResult<Product> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!("{SELECT_PRODUCT} type::record('product', $id)"))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProductRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_product(rows, id_str)?)
    }

    async fn get_many(&self, ids: &[Uuid]) -> ShopResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let mut result = self
            .db
            .query(format!("{SELECT_PRODUCT} product WHERE meta::id(id) IN $ids"))
            .bind(("ids", ids))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProductRow> = result.take(0).map_err(DbError::from)?;
        Ok(collect_products(rows)?)
    }

    async fn update(&self, id: Uuid, input: UpdateProduct) -> ShopResult<Product> {
        let id_str = id.to_string();

        let slug = match &input.name {
            Some(name) => Some(self.unique_slug(name, Some(&id_str)).await?),
            None => None,
        };

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
            sets.push("slug = $slug");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.price.is_some() {
            sets.push("price = $price");
        }
        if input.category.is_some() {
            sets.push("category = $category");
        }
        if input.stock.is_some() {
            sets.push("stock = $stock");
        }
        if input.images.is_some() {
            sets.push("images = $images");
        }
        sets.push("updated_at = time::now()");

        // The WHERE clause keeps UPDATE from touching a missing record.
        let query = format!(
            "UPDATE type::record('product', $id) SET {} WHERE id != NONE; \
             {SELECT_PRODUCT} type::record('product', $id);",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name.trim().to_string()));
        }
        if let Some(slug) = slug {
            builder = builder.bind(("slug", slug));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(price) = input.price {
            builder = builder.bind(("price", price));
        }
        if let Some(category) = input.category {
            builder = builder.bind(("category", category.as_str().to_string()));
        }
        if let Some(stock) = input.stock {
            builder = builder.bind(("stock", stock));
        }
        if let Some(images) = input.images {
            builder = builder.bind(("images", to_document(&images)?));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("product", e))?;

        let rows: Vec<ProductRow> = result.take(1).map_err(DbError::from)?;
        Ok(first_product(rows, id_str)?)
    }

    async fn delete(&self, id: Uuid) -> ShopResult<Product> {
        let product = self.get_by_id(id).await?;

        self.db
            .query("DELETE type::record('product', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check("product", e))?;

        Ok(product)
    }

    async fn list(
        &self,
        filter: ProductFilter,
        pagination: Pagination,
    ) -> ShopResult<PaginatedResult<Product>> {
        let mut conditions = Vec::new();
        if filter.keyword.is_some() {
            conditions.push("string::contains(string::lowercase(name), $keyword)");
        }
        if filter.category.is_some() {
            conditions.push("category = $category");
        }
        if filter.min_price.is_some() {
            conditions.push("price >= $min_price");
        }
        if filter.max_price.is_some() {
            conditions.push("price <= $max_price");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT count() AS total FROM product {where_clause} GROUP ALL; \
             {SELECT_PRODUCT} product {where_clause} \
             ORDER BY created_at DESC \
             LIMIT $limit START $offset;"
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));

        if let Some(keyword) = filter.keyword {
            builder = builder.bind(("keyword", keyword.trim().to_lowercase()));
        }
        if let Some(category) = filter.category {
            builder = builder.bind(("category", category.as_str().to_string()));
        }
        if let Some(min_price) = filter.min_price {
            builder = builder.bind(("min_price", min_price));
        }
        if let Some(max_price) = filter.max_price {
            builder = builder.bind(("max_price", max_price));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);
        let rows: Vec<ProductRow> = result.take(1).map_err(DbError::from)?;

        Ok(PaginatedResult {
            items: collect_products(rows)?,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn set_rating_summary(&self, id: Uuid, summary: RatingSummary) -> ShopResult<()> {
        self.db
            .query(
                "UPDATE type::record('product', $id) SET \
                 average_rating = $average_rating, \
                 reviews_count = $reviews_count, \
                 updated_at = time::now() \
                 WHERE id != NONE",
            )
            .bind(("id", id.to_string()))
            .bind(("average_rating", summary.average_rating))
            .bind(("reviews_count", summary.reviews_count))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check("product", e))?;

        Ok(())
    }
}
