//! Category CRUD.
//!
//! ```text
//! GET    /categories          list
//! POST   /categories          create        {name}
//! PUT    /categories/{id}     rename        {name}
//! DELETE /categories/{id}     delete, 400 CATEGORY_IN_USE while games use it
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use tracing::debug;

use level99_core::{Category, CategoryInput};

use crate::auth::CurrentOperator;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            put(update_category).delete(delete_category),
        )
}

pub async fn list_categories(
    _operator: CurrentOperator,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.db.categories().list().await?))
}

pub async fn create_category(
    _operator: CurrentOperator,
    State(state): State<AppState>,
    payload: Result<Json<CategoryInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let Json(body) = payload?;
    let input = body.validate()?;

    let category = state.db.categories().insert(&input.name).await?;
    debug!(id = category.id, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    _operator: CurrentOperator,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CategoryInput>, JsonRejection>,
) -> Result<Json<Category>, ApiError> {
    let Path(id) = path?;
    let Json(body) = payload?;
    let input = body.validate()?;

    Ok(Json(state.db.categories().update_name(id, &input.name).await?))
}

pub async fn delete_category(
    operator: CurrentOperator,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    state.db.categories().delete(id).await?;
    debug!(id, by = %operator.username, "Category deleted");

    Ok(StatusCode::NO_CONTENT)
}
