//! Product catalog endpoints.
//!
//! Reads are public. Writes go straight to the product store; there is no
//! separate admin surface.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use gildedcart_core::ProductId;

use crate::db::StoreError;
use crate::error::{AppError, Result};
use crate::models::Product;
use crate::models::product::ProductDraft;
use crate::state::AppState;

/// List every product.
///
/// GET /api/products/all
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn all(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.products().list().await.map_err(AppError::Database)?;
    Ok(Json(products))
}

/// Fetch a single product.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// Returns 404 if the product does not exist.
pub async fn show(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<Json<Product>> {
    let product = state
        .products()
        .find_by_id(id)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(product))
}

/// List products in a category.
///
/// GET /api/products/category/{category}
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let products = state
        .products()
        .list_by_category(&category)
        .await
        .map_err(AppError::Database)?;
    Ok(Json(products))
}

/// Query string for product search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: String,
}

/// Search products by name substring (case-insensitive).
///
/// GET /api/products/search?name=
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = state
        .products()
        .search_by_name(&query.name)
        .await
        .map_err(AppError::Database)?;
    Ok(Json(products))
}

/// Create a product.
///
/// POST /api/products/add
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn create(
    State(state): State<AppState>,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state
        .products()
        .insert(draft)
        .await
        .map_err(AppError::Database)?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product's fields.
///
/// PUT /api/products/update/{id}
///
/// # Errors
///
/// Returns 404 if the product does not exist.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<Product>> {
    let product = state
        .products()
        .update(id, draft)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AppError::NotFound(format!("product {id}")),
            other => AppError::Database(other),
        })?;
    Ok(Json(product))
}

/// Delete a product. Cart lines referencing it are removed with it.
///
/// DELETE /api/products/delete/{id}
///
/// # Errors
///
/// Returns 404 if the product does not exist.
pub async fn remove(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<StatusCode> {
    state.products().delete(id).await.map_err(|e| match e {
        StoreError::NotFound => AppError::NotFound(format!("product {id}")),
        other => AppError::Database(other),
    })?;
    Ok(StatusCode::NO_CONTENT)
}
