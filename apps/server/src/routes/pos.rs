//! # Point of Sale
//!
//! The cart and checkout for the logged-in operator's session.
//!
//! ```text
//! GET    /pos/cart                      current cart and running total
//! POST   /pos/cart/items   {product_id} add one unit
//! DELETE /pos/cart/items/{product_id}   drop the whole line
//! POST   /pos/checkout                  201 Sale, or 204 when the cart is empty
//! GET    /pos/sale                      last finalized sale
//! GET    /pos/ticket                    last sale as a PDF download
//! ```
//!
//! Cart lines carry a snapshot of the product taken when it was first added.
//! Edits to the catalog afterwards do not reprice an open cart.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use level99_core::{Cart, CartLine, CoreError, Money, Sale, Ticket};

use crate::auth::CurrentOperator;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pos/cart", get(get_cart))
        .route("/pos/cart/items", post(add_item))
        .route("/pos/cart/items/{product_id}", delete(remove_item))
        .route("/pos/checkout", post(checkout))
        .route("/pos/sale", get(last_sale))
        .route("/pos/ticket", get(download_ticket))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartLine>,
    pub total: Money,
    pub line_count: usize,
    pub unit_count: i64,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            items: cart.lines().to_vec(),
            total: cart.compute_total(),
            line_count: cart.line_count(),
            unit_count: cart.total_quantity(),
        }
    }
}

/// The session vanished between extraction and use, e.g. a concurrent logout.
fn session_gone() -> ApiError {
    ApiError::unauthorized("Session expired or invalid")
}

pub async fn get_cart(
    operator: CurrentOperator,
    State(state): State<AppState>,
) -> Result<Json<CartResponse>, ApiError> {
    state
        .carts
        .with_register(&operator.cart_id, |register| {
            CartResponse::from(register.cart())
        })
        .await
        .map(Json)
        .ok_or_else(session_gone)
}

pub async fn add_item(
    operator: CurrentOperator,
    State(state): State<AppState>,
    payload: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<CartResponse>, ApiError> {
    let Json(body) = payload?;

    let product = state
        .db
        .products()
        .get_by_id(body.product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", body.product_id))?;

    let response = state
        .carts
        .with_register(&operator.cart_id, |register| {
            let cart = register.cart_mut();
            cart.add_to_cart(&product)?;
            Ok::<_, CoreError>(CartResponse::from(&*cart))
        })
        .await
        .ok_or_else(session_gone)??;

    debug!(product_id = product.id, total = %response.total, "Added to cart");
    Ok(Json(response))
}

/// Removing a product that is not in the cart is not an error.
pub async fn remove_item(
    operator: CurrentOperator,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<CartResponse>, ApiError> {
    let Path(product_id) = path?;
    state
        .carts
        .with_register(&operator.cart_id, |register| {
            let cart = register.cart_mut();
            cart.remove_from_cart(product_id);
            CartResponse::from(&*cart)
        })
        .await
        .map(Json)
        .ok_or_else(session_gone)
}

pub async fn checkout(
    operator: CurrentOperator,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let sale = state
        .carts
        .with_register(&operator.cart_id, |register| {
            register.checkout(Utc::now()).cloned()
        })
        .await
        .ok_or_else(session_gone)?;

    match sale {
        Some(sale) => {
            info!(
                operator = %operator.username,
                lines = sale.items.len(),
                total = %sale.total,
                "Sale finalized"
            );
            Ok((StatusCode::CREATED, Json(sale)).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn current_sale(state: &AppState, operator: &CurrentOperator) -> Result<Sale, ApiError> {
    state
        .carts
        .with_register(&operator.cart_id, |register| register.last_sale().cloned())
        .await
        .ok_or_else(session_gone)?
        .ok_or_else(|| CoreError::NoSale.into())
}

pub async fn last_sale(
    operator: CurrentOperator,
    State(state): State<AppState>,
) -> Result<Json<Sale>, ApiError> {
    current_sale(&state, &operator).await.map(Json)
}

/// Renders the last sale as a ticket PDF.
///
/// The sale stays available, so the ticket can be downloaded again until
/// the next checkout replaces it.
pub async fn download_ticket(
    operator: CurrentOperator,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let sale = current_sale(&state, &operator).await?;

    let ticket = Ticket::from_sale(&sale, &state.ticket);
    let pdf = ticket.to_pdf();
    let filename = Ticket::filename(Utc::now());

    debug!(%filename, pages = ticket.page_count(), bytes = pdf.len(), "Ticket exported");

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}
