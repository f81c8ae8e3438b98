//! Order endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Context, OrderId, OrderItemId};
use domain::{ListQuery, Page};
use domain::order::{CreateOrder, NewOrderItem, Order, OrderFilter, OrderStatus, OrderType};
use serde::Deserialize;

use super::{CancelRequest, Paging, StatusRequest};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    #[serde(rename = "type")]
    pub order_type: Option<OrderType>,
    pub customer_id: Option<String>,
    pub table_id: Option<String>,
}

/// POST /orders
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let result = state.orders.create_order(&Context::background(), req).await?;
    Ok((StatusCode::CREATED, Json(result.aggregate)))
}

/// GET /orders
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
    Query(paging): Query<Paging>,
) -> Result<Json<Page<Order>>, ApiError> {
    let filter = OrderFilter {
        status: query.status,
        order_type: query.order_type,
        customer_id: query.customer_id,
        table_id: query.table_id,
    };
    let page = state
        .orders
        .list_orders(&Context::background(), paging.apply(ListQuery::new(filter)))
        .await?;
    Ok(Json(page))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.get_order(&Context::background(), &id).await?))
}

/// POST /orders/{id}/items
#[tracing::instrument(skip(state, item))]
pub async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(item): Json<NewOrderItem>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let (result, _) = state
        .orders
        .add_item(&Context::background(), &id, item)
        .await?;
    Ok((StatusCode::CREATED, Json(result.aggregate)))
}

/// DELETE /orders/{id}/items/{item_id}
#[tracing::instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(OrderId, OrderItemId)>,
) -> Result<Json<Order>, ApiError> {
    let result = state
        .orders
        .remove_item(&Context::background(), &id, &item_id)
        .await?;
    Ok(Json(result.aggregate))
}

/// PUT /orders/{id}/status
#[tracing::instrument(skip(state, req))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(req): Json<StatusRequest<OrderStatus>>,
) -> Result<Json<Order>, ApiError> {
    let result = state
        .orders
        .update_status(&Context::background(), &id, req.status)
        .await?;
    Ok(Json(result.aggregate))
}

/// POST /orders/{id}/cancel
#[tracing::instrument(skip(state, req))]
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<Order>, ApiError> {
    let result = state
        .orders
        .cancel_order(&Context::background(), &id, req.reason)
        .await?;
    Ok(Json(result.aggregate))
}
