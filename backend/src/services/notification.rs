//! Notification service for operational events
//!
//! Supports:
//! - In-app notification records for the operations team
//! - Best-effort delivery to an external webhook dispatcher
//!
//! Delivery is strictly best-effort: failures are logged and recorded on
//! the notification row, and never roll back the operation that triggered
//! them.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::NotificationConfig;
use crate::error::{AppError, AppResult};
use shared::{DispatchWithItems, Ticket};

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
    config: NotificationConfig,
    http_client: reqwest::Client,
}

/// Notification type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    DispatchCreated,
    GrnDiscrepancy,
    TicketOpened,
    TicketStatusChanged,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::DispatchCreated => "dispatch_created",
            NotificationType::GrnDiscrepancy => "grn_discrepancy",
            NotificationType::TicketOpened => "ticket_opened",
            NotificationType::TicketStatusChanged => "ticket_status_changed",
            NotificationType::System => "system",
        }
    }
}

/// Delivery status of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
        }
    }
}

/// Persisted notification record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub message_th: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Input for sending a notification
#[derive(Debug, Deserialize)]
pub struct NotifyInput {
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub message_th: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
}

/// Webhook payload delivered to the external dispatcher
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    notification_type: &'a str,
    title: &'a str,
    message: &'a str,
    reference_type: Option<&'a str>,
    reference_id: Option<Uuid>,
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(db: PgPool, config: NotificationConfig) -> Self {
        Self {
            db,
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Record a notification and attempt webhook delivery
    pub async fn notify(&self, input: NotifyInput) -> AppResult<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (notification_type, title, message, message_th,
                                       reference_type, reference_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, notification_type, title, message, message_th,
                      reference_type, reference_id, status, created_at
            "#,
        )
        .bind(input.notification_type.as_str())
        .bind(&input.title)
        .bind(&input.message)
        .bind(&input.message_th)
        .bind(&input.reference_type)
        .bind(input.reference_id)
        .bind(DeliveryStatus::Pending.as_str())
        .fetch_one(&self.db)
        .await?;

        let delivery = self.deliver_webhook(&input).await;
        let status = match delivery {
            Ok(()) => DeliveryStatus::Sent,
            Err(ref e) => {
                tracing::warn!("Webhook delivery failed: {}", e);
                DeliveryStatus::Failed
            }
        };

        let updated = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET status = $1
            WHERE id = $2
            RETURNING id, notification_type, title, message, message_th,
                      reference_type, reference_id, status, created_at
            "#,
        )
        .bind(status.as_str())
        .bind(notification.id)
        .fetch_one(&self.db)
        .await?;

        Ok(updated)
    }

    /// Notify the operations team of a new dispatch
    pub async fn notify_dispatch_created(&self, dispatch: &DispatchWithItems) -> AppResult<()> {
        self.notify(NotifyInput {
            notification_type: NotificationType::DispatchCreated,
            title: format!("Dispatch {} created", dispatch.dispatch.tracking_code),
            message: format!(
                "Dispatch {} with {} item(s) is on its way via {}",
                dispatch.dispatch.tracking_code,
                dispatch.items.len(),
                dispatch.dispatch.carrier_name
            ),
            message_th: Some(format!(
                "การจัดส่ง {} จำนวน {} รายการ กำลังจัดส่งโดย {}",
                dispatch.dispatch.tracking_code,
                dispatch.items.len(),
                dispatch.dispatch.carrier_name
            )),
            reference_type: Some("dispatch".to_string()),
            reference_id: Some(dispatch.dispatch.id),
        })
        .await?;

        Ok(())
    }

    /// Notify the operations team of a newly opened exception ticket
    pub async fn notify_ticket_opened(&self, ticket: &Ticket) -> AppResult<()> {
        self.notify(NotifyInput {
            notification_type: NotificationType::TicketOpened,
            title: format!("Exception ticket {} opened", ticket.ticket_number),
            message: format!(
                "Ticket {} ({} priority): {}",
                ticket.ticket_number,
                ticket.priority.as_str(),
                ticket.title
            ),
            message_th: Some(format!(
                "เปิดตั๋วปัญหา {} (ระดับ {})",
                ticket.ticket_number,
                ticket.priority.as_str()
            )),
            reference_type: Some("ticket".to_string()),
            reference_id: Some(ticket.id),
        })
        .await?;

        Ok(())
    }

    /// List recent notifications, newest first
    pub async fn list_notifications(&self, limit: i64) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, notification_type, title, message, message_th,
                   reference_type, reference_id, status, created_at
            FROM notifications
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(notifications)
    }

    /// Deliver the payload to the configured webhook, signed with the
    /// shared secret
    async fn deliver_webhook(&self, input: &NotifyInput) -> AppResult<()> {
        if self.config.webhook_url.is_empty() {
            return Ok(());
        }

        let payload = WebhookPayload {
            notification_type: input.notification_type.as_str(),
            title: &input.title,
            message: &input.message,
            reference_type: input.reference_type.as_deref(),
            reference_id: input.reference_id,
        };

        let body = serde_json::to_vec(&payload)
            .map_err(|e| AppError::Internal(format!("Webhook payload error: {}", e)))?;
        let signature = sign_payload(&body, &self.config.webhook_secret)?;

        let response = self
            .http_client
            .post(&self.config.webhook_url)
            .header("content-type", "application/json")
            .header("x-pfp-signature", signature)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Webhook returned status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// HMAC-SHA256 signature of the payload, base64 encoded
fn sign_payload(body: &[u8], secret: &str) -> AppResult<String> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("Failed to create HMAC".to_string()))?;
    mac.update(body);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}
