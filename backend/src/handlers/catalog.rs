//! HTTP handlers for catalog endpoints (categories, products, warehouses)

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::catalog::{
    CatalogService, Category, CreateProductInput, CreateWarehouseInput, Product,
    UpdateProductInput, Warehouse,
};
use crate::AppState;
use shared::types::Pagination;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
}

/// Create a category
pub async fn create_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<Json<Category>> {
    current_user.0.require_permission("catalog", "write")?;
    let service = CatalogService::new(state.db);
    let category = service.create_category(input.name).await?;
    Ok(Json(category))
}

/// List all categories
pub async fn list_categories(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Category>>> {
    let service = CatalogService::new(state.db);
    let categories = service.list_categories().await?;
    Ok(Json(categories))
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<Product>> {
    current_user.0.require_permission("catalog", "write")?;
    let service = CatalogService::new(state.db);
    let product = service.create_product(input).await?;
    Ok(Json(product))
}

/// Get a product by id
pub async fn get_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = CatalogService::new(state.db);
    let product = service.get_product(product_id).await?;
    Ok(Json(product))
}

/// List products (paginated)
pub async fn list_products(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Vec<Product>>> {
    let service = CatalogService::new(state.db);
    let products = service.list_products(&pagination).await?;
    Ok(Json(products))
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    current_user.0.require_permission("catalog", "write")?;
    let service = CatalogService::new(state.db);
    let product = service.update_product(product_id, input).await?;
    Ok(Json(product))
}

/// Deactivate a product (soft delete)
pub async fn deactivate_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    current_user.0.require_permission("catalog", "write")?;
    let service = CatalogService::new(state.db);
    service.deactivate_product(product_id).await?;
    Ok(Json(()))
}

/// Create a warehouse
pub async fn create_warehouse(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateWarehouseInput>,
) -> AppResult<Json<Warehouse>> {
    current_user.0.require_permission("catalog", "write")?;
    let service = CatalogService::new(state.db);
    let warehouse = service.create_warehouse(input).await?;
    Ok(Json(warehouse))
}

/// Get a warehouse by id
pub async fn get_warehouse(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(warehouse_id): Path<Uuid>,
) -> AppResult<Json<Warehouse>> {
    let service = CatalogService::new(state.db);
    let warehouse = service.get_warehouse(warehouse_id).await?;
    Ok(Json(warehouse))
}

/// List all warehouses
pub async fn list_warehouses(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Warehouse>>> {
    let service = CatalogService::new(state.db);
    let warehouses = service.list_warehouses().await?;
    Ok(Json(warehouses))
}

/// Deactivate a warehouse (soft delete)
pub async fn deactivate_warehouse(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(warehouse_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    current_user.0.require_permission("catalog", "write")?;
    let service = CatalogService::new(state.db);
    service.deactivate_warehouse(warehouse_id).await?;
    Ok(Json(()))
}
