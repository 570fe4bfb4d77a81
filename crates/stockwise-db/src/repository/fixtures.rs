//! Shared test data for the repository tests.
//!
//! One category, brand and payment method, a user per role, three products
//! and one completed sale (a single Classic Tee) to replace against.

use crate::{Database, DbConfig};
use stockwise_core::{NewProduct, NewSale, NewUser, OrderLine, ProductStatus, Role};

pub const TEE_PRICE_CENTS: i64 = 1_999;
pub const CAP_PRICE_CENTS: i64 = 1_250;
pub const SNEAKER_PRICE_CENTS: i64 = 8_900;

/// Stock left on the tee after the original sale.
pub const TEE_STOCK: i64 = 10;
pub const CAP_STOCK: i64 = 6;
pub const SNEAKER_STOCK: i64 = 2;

#[derive(Debug, Clone)]
pub struct Fixture {
    pub category_id: i64,
    pub brand_id: i64,
    pub cash_id: i64,
    pub admin_id: i64,
    pub manager_id: i64,
    pub staff_id: i64,
    pub tee_id: i64,
    pub cap_id: i64,
    pub sneaker_id: i64,
    pub original_order_id: i64,
    pub original_order_code: String,
}

pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub async fn seed_fixture(db: &Database) -> Fixture {
    let catalog = db.catalog();
    let category = catalog.create_category("Apparel", None).await.unwrap();
    let brand = catalog.create_brand("Northwind", None).await.unwrap();
    let cash = catalog.create_payment_method("Cash", None).await.unwrap();

    let admin = add_user(db, "Ada Admin", "admin@shop.io", Role::Admin).await;
    let manager = add_user(db, "Mara Manager", "manager@shop.io", Role::Manager).await;
    let staff = add_user(db, "Sam Staff", "staff@shop.io", Role::Staff).await;

    let product = |name: &str, stock: i64, price: i64| NewProduct {
        name: name.to_string(),
        description: None,
        category_id: category.category_id,
        brand_id: brand.brand_id,
        supplier_id: None,
        quantity_in_stock: stock,
        unit_price_cents: price,
        cost_price_cents: price / 2,
        size: Some("M".to_string()),
        color: None,
        status: ProductStatus::Available,
    };

    let tee = db
        .products()
        .insert(&product("Classic Tee", TEE_STOCK + 1, TEE_PRICE_CENTS))
        .await
        .unwrap();
    let cap = db
        .products()
        .insert(&product("Bucket Cap", CAP_STOCK, CAP_PRICE_CENTS))
        .await
        .unwrap();
    let sneaker = db
        .products()
        .insert(&product("Court Sneaker", SNEAKER_STOCK, SNEAKER_PRICE_CENTS))
        .await
        .unwrap();

    let original = db
        .orders()
        .create_sale(&NewSale {
            user_id: staff.user_id,
            payment_method_id: Some(cash.payment_method_id),
            lines: vec![OrderLine {
                product_id: tee.product_id,
                quantity: 1,
            }],
            amount_given_cents: 2_000,
        })
        .await
        .unwrap();

    Fixture {
        category_id: category.category_id,
        brand_id: brand.brand_id,
        cash_id: cash.payment_method_id,
        admin_id: admin.user_id,
        manager_id: manager.user_id,
        staff_id: staff.user_id,
        tee_id: tee.product_id,
        cap_id: cap.product_id,
        sneaker_id: sneaker.product_id,
        original_order_id: original.order.order_id,
        original_order_code: original.order.order_code,
    }
}

async fn add_user(db: &Database, name: &str, email: &str, role: Role) -> stockwise_core::User {
    db.users()
        .insert(&NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$test".to_string(),
            role,
        })
        .await
        .unwrap()
}
