//! Catalog service: categories, products and warehouses
//!
//! The ledger services consult this data for existence checks and selling
//! prices. Products and warehouses are soft-deleted (`is_active`) because
//! historical ledger records keep referencing them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::Pagination;
use shared::validation::{validate_name, validate_selling_price, validate_sku};

/// Catalog service for managing products, categories and warehouses
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Product category
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Product record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub sku: Option<String>,
    pub selling_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Warehouse record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub category_id: Option<Uuid>,
    pub name: String,
    pub sku: Option<String>,
    pub selling_price: Decimal,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub selling_price: Option<Decimal>,
}

/// Input for creating a warehouse
#[derive(Debug, Deserialize)]
pub struct CreateWarehouseInput {
    pub name: String,
    pub location: Option<String>,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Categories
    // ========================================================================

    /// Create a category
    pub async fn create_category(&self, name: String) -> AppResult<Category> {
        validate_name(&name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;

        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name.trim())
        .fetch_one(&self.db)
        .await?;

        Ok(category)
    }

    /// List all categories
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    // ========================================================================
    // Products
    // ========================================================================

    /// Create a product
    pub async fn create_product(&self, input: CreateProductInput) -> AppResult<Product> {
        validate_name(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;
        validate_selling_price(input.selling_price).map_err(|msg| AppError::Validation {
            field: "selling_price".to_string(),
            message: msg.to_string(),
        })?;
        if let Some(sku) = &input.sku {
            validate_sku(sku).map_err(|msg| AppError::Validation {
                field: "sku".to_string(),
                message: msg.to_string(),
            })?;
        }

        if let Some(category_id) = input.category_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)",
            )
            .bind(category_id)
            .fetch_one(&self.db)
            .await?;

            if !exists {
                return Err(AppError::NotFound("Category".to_string()));
            }
        }

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (category_id, name, sku, selling_price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, category_id, name, sku, selling_price, is_active, created_at, updated_at
            "#,
        )
        .bind(input.category_id)
        .bind(input.name.trim())
        .bind(&input.sku)
        .bind(input.selling_price)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Get a product by id
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, category_id, name, sku, selling_price, is_active, created_at, updated_at
            FROM products WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// List active products
    pub async fn list_products(&self, pagination: &Pagination) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, category_id, name, sku, selling_price, is_active, created_at, updated_at
            FROM products
            WHERE is_active = TRUE
            ORDER BY name
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Update a product
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        let existing = self.get_product(product_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let sku = input.sku.or(existing.sku);
        let selling_price = input.selling_price.unwrap_or(existing.selling_price);
        let category_id = input.category_id.or(existing.category_id);

        validate_name(&name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;
        validate_selling_price(selling_price).map_err(|msg| AppError::Validation {
            field: "selling_price".to_string(),
            message: msg.to_string(),
        })?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET category_id = $1, name = $2, sku = $3, selling_price = $4, updated_at = now()
            WHERE id = $5
            RETURNING id, category_id, name, sku, selling_price, is_active, created_at, updated_at
            "#,
        )
        .bind(category_id)
        .bind(name.trim())
        .bind(&sku)
        .bind(selling_price)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Soft-delete a product (ledger history keeps referencing it)
    pub async fn deactivate_product(&self, product_id: Uuid) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE products SET is_active = FALSE, updated_at = now() WHERE id = $1")
                .bind(product_id)
                .execute(&self.db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }

    // ========================================================================
    // Warehouses
    // ========================================================================

    /// Create a warehouse
    pub async fn create_warehouse(&self, input: CreateWarehouseInput) -> AppResult<Warehouse> {
        validate_name(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;

        let warehouse = sqlx::query_as::<_, Warehouse>(
            r#"
            INSERT INTO warehouses (name, location)
            VALUES ($1, $2)
            RETURNING id, name, location, is_active, created_at
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.location)
        .fetch_one(&self.db)
        .await?;

        Ok(warehouse)
    }

    /// Get a warehouse by id
    pub async fn get_warehouse(&self, warehouse_id: Uuid) -> AppResult<Warehouse> {
        sqlx::query_as::<_, Warehouse>(
            "SELECT id, name, location, is_active, created_at FROM warehouses WHERE id = $1",
        )
        .bind(warehouse_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))
    }

    /// List active warehouses
    pub async fn list_warehouses(&self) -> AppResult<Vec<Warehouse>> {
        let warehouses = sqlx::query_as::<_, Warehouse>(
            r#"
            SELECT id, name, location, is_active, created_at
            FROM warehouses
            WHERE is_active = TRUE
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(warehouses)
    }

    /// Soft-delete a warehouse
    pub async fn deactivate_warehouse(&self, warehouse_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE warehouses SET is_active = FALSE WHERE id = $1")
            .bind(warehouse_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Warehouse".to_string()));
        }

        Ok(())
    }
}
