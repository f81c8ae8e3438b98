//! Reservation endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Context, ReservationId};
use domain::reservation::{CreateReservation, Reservation};

use super::CancelRequest;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /reservations
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateReservation>,
) -> Result<(StatusCode, Json<Reservation>), ApiError> {
    let result = state
        .reservations
        .create_reservation(&Context::background(), req)
        .await?;
    Ok((StatusCode::CREATED, Json(result.aggregate)))
}

/// GET /reservations/upcoming
#[tracing::instrument(skip(state))]
pub async fn upcoming(State(state): State<AppState>) -> Result<Json<Vec<Reservation>>, ApiError> {
    Ok(Json(state.reservations.upcoming(&Context::background()).await?))
}

/// GET /reservations/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<ReservationId>,
) -> Result<Json<Reservation>, ApiError> {
    Ok(Json(
        state
            .reservations
            .get_reservation(&Context::background(), &id)
            .await?,
    ))
}

/// POST /reservations/{id}/confirm
#[tracing::instrument(skip(state))]
pub async fn confirm(
    State(state): State<AppState>,
    Path(id): Path<ReservationId>,
) -> Result<Json<Reservation>, ApiError> {
    let result = state.reservations.confirm(&Context::background(), &id).await?;
    Ok(Json(result.aggregate))
}

/// POST /reservations/{id}/cancel
#[tracing::instrument(skip(state, req))]
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<ReservationId>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<Reservation>, ApiError> {
    let result = state
        .reservations
        .cancel(&Context::background(), &id, req.reason)
        .await?;
    Ok(Json(result.aggregate))
}
