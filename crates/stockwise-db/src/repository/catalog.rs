//! # Catalog Repository
//!
//! Reference data the products and orders point at: categories, brands,
//! suppliers and payment methods. Create / get / list only.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockwise_core::validation::validate_required_text;
use stockwise_core::{Brand, Category, NewSupplier, PaymentMethod, Supplier};

const NAME_MAX: usize = 100;

/// Repository for catalog reference data.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Creates a category.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - Name already taken
    pub async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> DbResult<Category> {
        let name = validate_required_text("name", name, NAME_MAX)?;
        debug!(name = %name, "Creating category");

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            RETURNING category_id, name, description, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn get_category(&self, category_id: i64) -> DbResult<Category> {
        sqlx::query_as::<_, Category>(
            "SELECT category_id, name, description, created_at, updated_at \
             FROM categories WHERE category_id = ?1",
        )
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Category", category_id))
    }

    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT category_id, name, description, created_at, updated_at \
             FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    // =========================================================================
    // Brands
    // =========================================================================

    /// Creates a brand.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - Name already taken
    pub async fn create_brand(&self, name: &str, description: Option<&str>) -> DbResult<Brand> {
        let name = validate_required_text("name", name, NAME_MAX)?;
        debug!(name = %name, "Creating brand");

        let brand = sqlx::query_as::<_, Brand>(
            r#"
            INSERT INTO brands (name, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            RETURNING brand_id, name, description, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(brand)
    }

    pub async fn get_brand(&self, brand_id: i64) -> DbResult<Brand> {
        sqlx::query_as::<_, Brand>(
            "SELECT brand_id, name, description, created_at, updated_at \
             FROM brands WHERE brand_id = ?1",
        )
        .bind(brand_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Brand", brand_id))
    }

    pub async fn list_brands(&self) -> DbResult<Vec<Brand>> {
        let brands = sqlx::query_as::<_, Brand>(
            "SELECT brand_id, name, description, created_at, updated_at \
             FROM brands ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(brands)
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    pub async fn create_supplier(&self, supplier: &NewSupplier) -> DbResult<Supplier> {
        let name = validate_required_text("name", &supplier.name, NAME_MAX)?;
        debug!(name = %name, "Creating supplier");

        let created = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (
                name, contact_person, phone_number, email_address, address, supplied_products
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING supplier_id, name, contact_person, phone_number,
                      email_address, address, supplied_products
            "#,
        )
        .bind(&name)
        .bind(&supplier.contact_person)
        .bind(&supplier.phone_number)
        .bind(&supplier.email_address)
        .bind(&supplier.address)
        .bind(&supplier.supplied_products)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn get_supplier(&self, supplier_id: i64) -> DbResult<Supplier> {
        sqlx::query_as::<_, Supplier>(
            "SELECT supplier_id, name, contact_person, phone_number, \
             email_address, address, supplied_products \
             FROM suppliers WHERE supplier_id = ?1",
        )
        .bind(supplier_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Supplier", supplier_id))
    }

    pub async fn list_suppliers(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT supplier_id, name, contact_person, phone_number, \
             email_address, address, supplied_products \
             FROM suppliers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    // =========================================================================
    // Payment Methods
    // =========================================================================

    pub async fn create_payment_method(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> DbResult<PaymentMethod> {
        let name = validate_required_text("name", name, NAME_MAX)?;
        debug!(name = %name, "Creating payment method");

        let method = sqlx::query_as::<_, PaymentMethod>(
            r#"
            INSERT INTO payment_methods (name, description)
            VALUES (?1, ?2)
            RETURNING payment_method_id, name, description
            "#,
        )
        .bind(&name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(method)
    }

    pub async fn get_payment_method(&self, payment_method_id: i64) -> DbResult<PaymentMethod> {
        sqlx::query_as::<_, PaymentMethod>(
            "SELECT payment_method_id, name, description \
             FROM payment_methods WHERE payment_method_id = ?1",
        )
        .bind(payment_method_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Payment method", payment_method_id))
    }

    pub async fn list_payment_methods(&self) -> DbResult<Vec<PaymentMethod>> {
        let methods = sqlx::query_as::<_, PaymentMethod>(
            "SELECT payment_method_id, name, description FROM payment_methods ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(methods)
    }
}
