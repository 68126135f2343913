//! Product CRUD.
//!
//! Listings always carry the joined category so the POS screen can show the
//! genre under each game.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::debug;

use level99_core::{Product, ProductInput, ProductWithCategory};

use crate::auth::CurrentOperator;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

pub async fn list_products(
    _operator: CurrentOperator,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductWithCategory>>, ApiError> {
    Ok(Json(state.db.products().list_with_category().await?))
}

pub async fn get_product(
    _operator: CurrentOperator,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ProductWithCategory>, ApiError> {
    let Path(id) = path?;
    state
        .db
        .products()
        .get_with_category(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", id))
}

pub async fn create_product(
    _operator: CurrentOperator,
    State(state): State<AppState>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(body) = payload?;
    let input = body.validate()?;

    let product = state.db.products().insert(&input).await?;
    debug!(id = product.id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    _operator: CurrentOperator,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let Path(id) = path?;
    let Json(body) = payload?;
    let input = body.validate()?;

    Ok(Json(state.db.products().update(id, &input).await?))
}

pub async fn delete_product(
    _operator: CurrentOperator,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    state.db.products().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
