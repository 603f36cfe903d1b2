//! Integration tests for Product and Review repositories using in-memory
//! SurrealDB.

use shopfront_core::error::ShopError;
use shopfront_core::models::media::{ImageRef, MediaKind};
use shopfront_core::models::product::{
    Category, CreateProduct, ProductFilter, RatingSummary, UpdateProduct,
};
use shopfront_core::models::review::CreateReview;
use shopfront_core::repository::{Pagination, ProductRepository, ReviewRepository};
use shopfront_db::repository::{SurrealProductRepository, SurrealReviewRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    shopfront_db::run_migrations(&db).await.unwrap();
    db
}

fn product(name: &str, category: Category, price: f64) -> CreateProduct {
    CreateProduct {
        name: name.into(),
        description: format!("{name} description"),
        brand: None,
        price,
        category,
        tags: vec!["new".into()],
        stock: 5,
        images: vec![ImageRef {
            public_id: format!("products/{}", name.to_lowercase()),
            url: format!("http://media/{}.png", name.to_lowercase()),
            kind: MediaKind::Image,
        }],
        owner_id: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn create_product_defaults_and_slug() {
    let repo = SurrealProductRepository::new(setup().await);

    let p = repo
        .create(product("Trail Runner X", Category::Shoes, 120.5))
        .await
        .unwrap();
    assert_eq!(p.slug, "trail-runner-x");
    assert_eq!(p.brand, "Generic");
    assert_eq!(p.average_rating, 0.0);
    assert_eq!(p.reviews_count, 0);
    assert_eq!(p.thumbnail(), Some("http://media/trail runner x.png"));

    let fetched = repo.get_by_id(p.id).await.unwrap();
    assert_eq!(fetched.name, "Trail Runner X");
    assert_eq!(fetched.category, Category::Shoes);
    assert_eq!(fetched.tags, vec!["new".to_string()]);
    assert_eq!(fetched.images.len(), 1);
}

#[tokio::test]
async fn colliding_names_get_numbered_slugs() {
    let repo = SurrealProductRepository::new(setup().await);

    let a = repo.create(product("Desk Lamp", Category::Other, 10.0)).await.unwrap();
    let b = repo.create(product("Desk Lamp", Category::Other, 12.0)).await.unwrap();
    let c = repo.create(product("desk  lamp!", Category::Other, 14.0)).await.unwrap();
    assert_eq!(a.slug, "desk-lamp");
    assert_eq!(b.slug, "desk-lamp-1");
    assert_eq!(c.slug, "desk-lamp-2");
}

#[tokio::test]
async fn update_only_touches_given_fields() {
    let repo = SurrealProductRepository::new(setup().await);
    let p = repo.create(product("Phone", Category::Electronics, 300.0)).await.unwrap();

    let updated = repo
        .update(
            p.id,
            UpdateProduct {
                price: Some(275.0),
                stock: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.price, 275.0);
    assert_eq!(updated.stock, 0);
    assert_eq!(updated.name, "Phone");
    assert_eq!(updated.slug, "phone");

    let err = repo
        .update(Uuid::new_v4(), UpdateProduct {
            price: Some(1.0),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::NotFound { .. }));
}

#[tokio::test]
async fn list_applies_filters() {
    let repo = SurrealProductRepository::new(setup().await);
    repo.create(product("Red Shirt", Category::Clothes, 20.0)).await.unwrap();
    repo.create(product("Blue Shirt", Category::Clothes, 40.0)).await.unwrap();
    repo.create(product("Football", Category::Sports, 25.0)).await.unwrap();

    let all = repo
        .list(ProductFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.total, 3);

    let shirts = repo
        .list(
            ProductFilter {
                keyword: Some("SHIRT".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(shirts.total, 2);

    let cheap_clothes = repo
        .list(
            ProductFilter {
                category: Some(Category::Clothes),
                max_price: Some(30.0),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(cheap_clothes.total, 1);
    assert_eq!(cheap_clothes.items[0].name, "Red Shirt");

    let paged = repo
        .list(
            ProductFilter {
                min_price: Some(21.0),
                ..Default::default()
            },
            Pagination {
                offset: 0,
                limit: 1,
            },
        )
        .await
        .unwrap();
    assert_eq!(paged.total, 2);
    assert_eq!(paged.items.len(), 1);
}

#[tokio::test]
async fn get_many_skips_unknown_ids() {
    let repo = SurrealProductRepository::new(setup().await);
    let a = repo.create(product("Bat", Category::Sports, 50.0)).await.unwrap();
    let b = repo.create(product("Ball", Category::Sports, 5.0)).await.unwrap();

    let found = repo.get_many(&[a.id, Uuid::new_v4(), b.id]).await.unwrap();
    assert_eq!(found.len(), 2);
    assert!(repo.get_many(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_returns_removed_product() {
    let repo = SurrealProductRepository::new(setup().await);
    let p = repo.create(product("Kite", Category::Other, 8.0)).await.unwrap();

    let removed = repo.delete(p.id).await.unwrap();
    assert_eq!(removed.id, p.id);
    assert!(matches!(
        repo.get_by_id(p.id).await.unwrap_err(),
        ShopError::NotFound { .. }
    ));
}

#[tokio::test]
async fn reviews_and_rating_summary() {
    let db = setup().await;
    let products = SurrealProductRepository::new(db.clone());
    let reviews = SurrealReviewRepository::new(db);
    let p = products.create(product("Helmet", Category::Vehicle, 90.0)).await.unwrap();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    let r1 = reviews
        .create(CreateReview {
            product_id: p.id,
            user_id: alice,
            rating: 4,
            comment: "Solid".into(),
        })
        .await
        .unwrap();
    reviews
        .create(CreateReview {
            product_id: p.id,
            user_id: bob,
            rating: 5,
            comment: "Great".into(),
        })
        .await
        .unwrap();

    let dup = reviews
        .create(CreateReview {
            product_id: p.id,
            user_id: alice,
            rating: 1,
            comment: "Again".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(dup, ShopError::AlreadyExists { .. }));

    let existing = reviews
        .find_by_product_and_user(p.id, alice)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(existing.id, r1.id);
    assert!(
        reviews
            .find_by_product_and_user(p.id, Uuid::new_v4())
            .await
            .unwrap()
            .is_none()
    );

    let edited = reviews.update(r1.id, 3, "Okay".into()).await.unwrap();
    assert_eq!(edited.rating, 3);
    assert_eq!(edited.comment, "Okay");

    let mut ratings = reviews.ratings_for_product(p.id).await.unwrap();
    ratings.sort_unstable();
    assert_eq!(ratings, vec![3, 5]);

    let summary = RatingSummary::from_ratings(&ratings);
    products.set_rating_summary(p.id, summary).await.unwrap();
    let refreshed = products.get_by_id(p.id).await.unwrap();
    assert_eq!(refreshed.average_rating, 4.0);
    assert_eq!(refreshed.reviews_count, 2);

    let listed = reviews
        .list_for_product(p.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 2);

    reviews.delete(r1.id).await.unwrap();
    assert_eq!(reviews.ratings_for_product(p.id).await.unwrap(), vec![5]);
    assert!(reviews.get_by_id(r1.id).await.is_err());
}

#[tokio::test]
async fn rename_regenerates_slug() {
    let repo = SurrealProductRepository::new(setup().await);
    repo.create(product("Mouse Pad", Category::Other, 5.0)).await.unwrap();
    let p = repo.create(product("Mouse", Category::Electronics, 15.0)).await.unwrap();

    let renamed = repo
        .update(p.id, UpdateProduct {
            name: Some("Mouse Pad".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(renamed.slug, "mouse-pad-1");

    let same = repo
        .update(p.id, UpdateProduct {
            name: Some("Mouse Pad".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(same.slug, "mouse-pad-1");
}
