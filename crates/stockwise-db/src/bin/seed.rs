//! # Seed Data Generator
//!
//! Populates a development database with a small clothing store.
//!
//! ## Usage
//! ```bash
//! # Seed ./stockwise_dev.db
//! cargo run -p stockwise-db --bin seed
//!
//! # Specify database path
//! cargo run -p stockwise-db --bin seed -- --db ./data/stockwise.db
//! ```
//!
//! ## Generated Data
//! - One user per role (`admin@`, `manager@`, `staff@stockwise.local`)
//! - Categories, brands, a supplier and payment methods
//! - Products in every category and size
//! - A handful of sales, plus one replacement of each kind
//! - Returns in every defect report bucket

use std::env;
use stockwise_core::replacement::{OrderReplacementRequest, ProductReplacementRequest};
use stockwise_core::returns::ReturnRequest;
use stockwise_core::{NewProduct, NewSale, NewSupplier, NewUser, OrderLine, ProductStatus, Role};
use stockwise_db::{Database, DbConfig};

/// (category, brand, base name, base price in cents)
const PRODUCTS: &[(&str, &str, &str, i64)] = &[
    ("Tops", "Northwind", "Classic Tee", 1_999),
    ("Tops", "Northwind", "Oxford Shirt", 3_499),
    ("Tops", "Harbor", "Hooded Sweatshirt", 4_599),
    ("Bottoms", "Harbor", "Slim Chinos", 3_999),
    ("Bottoms", "Northwind", "Denim Jeans", 4_999),
    ("Footwear", "Stride", "Court Sneaker", 8_900),
    ("Footwear", "Stride", "Canvas Slip-On", 4_200),
    ("Accessories", "Harbor", "Bucket Cap", 1_250),
    ("Accessories", "Stride", "Crew Socks 3-Pack", 899),
];

/// (size, price addon in cents)
const SIZES: &[(&str, i64)] = &[("S", 0), ("M", 0), ("L", 200), ("XL", 400)];

const PAYMENT_METHODS: &[&str] = &["Cash", "Card", "GCash"];

/// Placeholder hash; logins are handled elsewhere.
const DEV_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$ZGV2c2VlZA$ZGV2c2VlZGhhc2g";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./stockwise_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockwise Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./stockwise_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    println!("🌱 Stockwise Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Users
    let mut user_ids = Vec::new();
    for (name, email, role) in [
        ("Avery Admin", "admin@stockwise.local", Role::Admin),
        ("Morgan Manager", "manager@stockwise.local", Role::Manager),
        ("Sasha Staff", "staff@stockwise.local", Role::Staff),
    ] {
        let user = db
            .users()
            .insert(&NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: DEV_PASSWORD_HASH.to_string(),
                role,
            })
            .await?;
        user_ids.push(user.user_id);
    }
    let (admin_id, manager_id, staff_id) = (user_ids[0], user_ids[1], user_ids[2]);
    println!("✓ Created {} users", user_ids.len());

    // Reference data
    let catalog = db.catalog();
    let supplier = catalog
        .create_supplier(&NewSupplier {
            name: "Cotton Mills Co.".to_string(),
            contact_person: Some("Rin Okada".to_string()),
            phone_number: Some("+63 912 345 6789".to_string()),
            supplied_products: Some("Tops, Bottoms".to_string()),
            ..Default::default()
        })
        .await?;

    let mut payment_method_ids = Vec::new();
    for name in PAYMENT_METHODS {
        payment_method_ids.push(catalog.create_payment_method(name, None).await?.payment_method_id);
    }
    let cash_id = payment_method_ids[0];

    let mut categories: Vec<(&str, i64)> = Vec::new();
    let mut brands: Vec<(&str, i64)> = Vec::new();
    for (category, brand, _, _) in PRODUCTS {
        if !categories.iter().any(|(name, _)| name == category) {
            let created = catalog.create_category(category, None).await?;
            categories.push((*category, created.category_id));
        }
        if !brands.iter().any(|(name, _)| name == brand) {
            let created = catalog.create_brand(brand, None).await?;
            brands.push((*brand, created.brand_id));
        }
    }
    println!(
        "✓ Created {} categories, {} brands, {} payment methods",
        categories.len(),
        brands.len(),
        payment_method_ids.len()
    );

    // Products
    println!();
    println!("Generating products...");
    let start = std::time::Instant::now();

    let mut product_ids = Vec::new();
    for (seed, (category, brand, name, base_price)) in PRODUCTS.iter().enumerate() {
        let category_id = lookup(&categories, category);
        let brand_id = lookup(&brands, brand);

        for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
            let price = base_price + addon;
            let stock = ((seed * 7 + size_idx * 3) % 25) as i64 + 5;

            let product = NewProduct {
                name: format!("{} {}", name, size),
                description: None,
                category_id,
                brand_id,
                supplier_id: Some(supplier.supplier_id),
                quantity_in_stock: stock,
                unit_price_cents: price,
                cost_price_cents: price * 55 / 100,
                size: Some(size.to_string()),
                color: None,
                status: ProductStatus::Available,
            };

            match db.products().insert(&product).await {
                Ok(inserted) => product_ids.push(inserted.product_id),
                Err(e) => eprintln!("Failed to insert {}: {}", product.name, e),
            }
        }
    }
    println!(
        "✓ Generated {} products in {:?}",
        product_ids.len(),
        start.elapsed()
    );

    if product_ids.len() < 4 {
        println!("⚠ Too few products to seed orders, stopping here.");
        return Ok(());
    }

    // Sales
    let mut orders = Vec::new();
    for (n, chunk) in product_ids.chunks(5).take(4).enumerate() {
        let lines: Vec<OrderLine> = chunk
            .iter()
            .take(2)
            .map(|&product_id| OrderLine {
                product_id,
                quantity: 1,
            })
            .collect();

        let order = db
            .orders()
            .create_sale(&NewSale {
                user_id: if n % 2 == 0 { staff_id } else { manager_id },
                payment_method_id: Some(payment_method_ids[n % payment_method_ids.len()]),
                lines,
                amount_given_cents: 50_000,
            })
            .await?;
        orders.push(order);
    }
    println!("✓ Recorded {} sales", orders.len());

    // Replacements: one swap, one with a new order
    let first = &orders[0];
    let sold = first.items[0].product_id;
    let swap_to = product_ids[product_ids.len() - 1];

    db.replacements()
        .replace_product(&ProductReplacementRequest {
            original_order_id: first.order.order_id,
            original_product_id: Some(sold),
            replacement_product_id: swap_to,
            quantity: 1,
            reason: "Defective".to_string(),
            reason_detail: None,
            processed_by_id: manager_id,
        })
        .await?;

    let replacement_product = db.products().get(product_ids[product_ids.len() - 2]).await?;
    let total = replacement_product.unit_price_cents;
    let outcome = db
        .replacements()
        .replace_with_order(&OrderReplacementRequest {
            processed_by_id: admin_id,
            lines: vec![OrderLine {
                product_id: replacement_product.product_id,
                quantity: 1,
            }],
            total_price_cents: total,
            change_cents: 0,
            amount_given_cents: total,
            original_order_id: first.order.order_id,
            original_product_id: sold,
            replacement_product_id: replacement_product.product_id,
            quantity: 1,
            reason: "Wrong Item".to_string(),
            reason_detail: None,
            payment_method_id: cash_id,
            discount_percentage: None,
        })
        .await?;
    println!(
        "✓ Recorded 2 replacements (new order {})",
        outcome.order_code
    );

    // Returns: one per defect report bucket
    let returns = [
        (orders.get(1), "Refund", None),
        (orders.get(2), "Lost", None),
        (None, "Other", Some("Left at the fitting room")),
    ];
    for (order, reason, detail) in returns {
        let product_id = order.map_or(swap_to, |o| o.items[0].product_id);
        db.returns()
            .record(&ReturnRequest {
                order_id: order.map(|o| o.order.order_id),
                product_id,
                quantity: 1,
                reason: reason.to_string(),
                reason_detail: detail.map(str::to_string),
                processed_by_id: manager_id,
            })
            .await?;
    }
    println!("✓ Recorded {} returns", returns.len());

    println!();
    println!("Users: admin@, manager@, staff@stockwise.local");
    println!("✓ Seed complete!");

    Ok(())
}

fn lookup(ids: &[(&str, i64)], name: &str) -> i64 {
    ids.iter()
        .find(|(n, _)| *n == name)
        .map(|(_, id)| *id)
        .unwrap_or_default()
}
