//! Kitchen ticket endpoints. Every route requires a bearer token whose
//! role grants the kitchen permission in question.

use axum::Json;
use axum::extract::{Path, State};
use common::{Context, KitchenItemId, KitchenOrderId};
use domain::kitchen::{KitchenItemStatus, KitchenOrder, KitchenOrderStatus};
use domain::user::{Action, Resource};

use super::StatusRequest;
use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

fn require(state: &AppState, caller: &CurrentUser, action: Action) -> Result<(), ApiError> {
    state
        .users
        .authorize(&caller.0.user, Resource::Kitchen, action)?;
    Ok(())
}

/// GET /kitchen/queue
#[tracing::instrument(skip_all)]
pub async fn queue(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<Json<Vec<KitchenOrder>>, ApiError> {
    require(&state, &caller, Action::Read)?;
    Ok(Json(state.kitchen.active_queue(&Context::background()).await?))
}

/// GET /kitchen/orders/{id}
#[tracing::instrument(skip(state, caller))]
pub async fn get(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<KitchenOrderId>,
) -> Result<Json<KitchenOrder>, ApiError> {
    require(&state, &caller, Action::Read)?;
    Ok(Json(state.kitchen.get_ticket(&Context::background(), &id).await?))
}

/// PUT /kitchen/orders/{id}/status
#[tracing::instrument(skip(state, caller, req))]
pub async fn update_status(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<KitchenOrderId>,
    Json(req): Json<StatusRequest<KitchenOrderStatus>>,
) -> Result<Json<KitchenOrder>, ApiError> {
    require(&state, &caller, Action::Update)?;
    let result = state
        .kitchen
        .update_status(&Context::background(), &id, req.status)
        .await?;
    Ok(Json(result.aggregate))
}

/// PUT /kitchen/orders/{id}/items/{item_id}/status
#[tracing::instrument(skip(state, caller, req))]
pub async fn update_item_status(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path((id, item_id)): Path<(KitchenOrderId, KitchenItemId)>,
    Json(req): Json<StatusRequest<KitchenItemStatus>>,
) -> Result<Json<KitchenOrder>, ApiError> {
    require(&state, &caller, Action::Update)?;
    let result = state
        .kitchen
        .update_item_status(&Context::background(), &id, &item_id, req.status)
        .await?;
    Ok(Json(result.aggregate))
}
