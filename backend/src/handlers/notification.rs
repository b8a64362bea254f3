//! HTTP handlers for notification endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::notification::{Notification, NotifyInput};
use crate::AppState;

/// Query parameters for the notification list
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub limit: Option<i64>,
}

/// List recent notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state
        .services
        .notifications
        .list_notifications(query.limit.unwrap_or(50))
        .await?;
    Ok(Json(notifications))
}

/// Send a notification (for testing/admin)
pub async fn send_notification(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<NotifyInput>,
) -> AppResult<Json<Notification>> {
    let notification = state.services.notifications.notify(input).await?;
    Ok(Json(notification))
}
