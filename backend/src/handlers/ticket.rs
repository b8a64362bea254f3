//! HTTP handlers for exception ticket endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;
use shared::{Ticket, TicketStatus};

/// Open (or return the existing) exception ticket for a goods receipt
pub async fn process_grn_verification(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(grn_id): Path<Uuid>,
) -> AppResult<Json<Option<Ticket>>> {
    let ticket = state
        .services
        .ticketing
        .process_grn_verification(current_user.0.user_id, grn_id)
        .await?;
    Ok(Json(ticket))
}

/// Request body for a ticket status update
#[derive(Debug, Deserialize)]
pub struct UpdateTicketStatusRequest {
    pub status: TicketStatus,
}

/// Advance a ticket through the resolution workflow
pub async fn update_ticket_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(ticket_id): Path<Uuid>,
    Json(input): Json<UpdateTicketStatusRequest>,
) -> AppResult<Json<Ticket>> {
    let ticket = state
        .services
        .ticketing
        .update_ticket_status(current_user.0.user_id, ticket_id, input.status)
        .await?;
    Ok(Json(ticket))
}

/// Get one ticket
pub async fn get_ticket(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<Json<Ticket>> {
    let ticket = state.services.ticketing.get_ticket(ticket_id).await?;
    Ok(Json(ticket))
}

/// Query parameters for the ticket list
#[derive(Debug, Deserialize)]
pub struct ListTicketsQuery {
    pub status: Option<TicketStatus>,
}

/// List tickets, optionally filtered by status
pub async fn list_tickets(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListTicketsQuery>,
) -> AppResult<Json<Vec<Ticket>>> {
    let tickets = state.services.ticketing.list_tickets(query.status).await?;
    Ok(Json(tickets))
}
