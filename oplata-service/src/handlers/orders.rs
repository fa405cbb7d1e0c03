//! Order registration and lookup for the host shop.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use crate::{
    dtos::{CreateOrderRequest, OrderResponse},
    models::Order,
    services::{gateway::PaymentMethod, GatewayError, OrderProvider},
    startup::AppState,
};

/// Register an order so it can be paid through OPLATA.MD.
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    payload.validate()?;

    let order = Order::from(payload);
    tracing::info!(
        order_id = order.id,
        amount = %order.formatted_amount(),
        currency = %order.currency,
        "Registering order"
    );

    state
        .store
        .insert(order.clone())
        .map_err(AppError::Conflict)?;

    Ok((StatusCode::CREATED, Json(OrderResponse::new(order, String::new()))))
}

/// Order status together with its gateway invoice link.
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<u64>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .store
        .order(order_id)
        .await?
        .ok_or(GatewayError::OrderNotFound(order_id))?;

    let transaction_url = state.gateway.transaction_url(&order).await?;

    Ok(Json(OrderResponse::new(order, transaction_url)))
}

/// Checkout listing for this payment method.
pub async fn payment_method(State(state): State<AppState>) -> Json<PaymentMethod> {
    Json(state.gateway.payment_method())
}
