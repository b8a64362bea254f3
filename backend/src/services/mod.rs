//! Business logic services for the Procurement Fulfillment Platform

pub mod assignment;
pub mod audit;
pub mod dispatch;
pub mod grn;
pub mod metrics;
pub mod notification;
pub mod query;
pub mod ticketing;
pub mod vendor;

pub use assignment::AssignmentService;
pub use audit::AuditService;
pub use dispatch::DispatchService;
pub use grn::GrnService;
pub use metrics::VendorMetricsService;
pub use notification::NotificationService;
pub use ticketing::TicketingService;
pub use vendor::VendorService;

use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;

/// A pool-acquire timeout counts against the wait-to-start budget of the
/// surrounding operation
pub(crate) fn map_pool_timeout(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::PoolTimedOut => AppError::ConcurrencyTimeout(
            "could not acquire a database connection within budget".to_string(),
        ),
        other => AppError::DatabaseError(other),
    }
}

/// All services, constructed once at process start and shared through the
/// application state
#[derive(Clone)]
pub struct Services {
    pub assignments: AssignmentService,
    pub dispatch: DispatchService,
    pub grn: GrnService,
    pub ticketing: TicketingService,
    pub metrics: VendorMetricsService,
    pub notifications: NotificationService,
    pub audit: AuditService,
    pub vendors: VendorService,
}

impl Services {
    pub fn build(db: PgPool, config: &Config) -> Self {
        let audit = AuditService::new(db.clone());
        let notifications = NotificationService::new(db.clone(), config.notification.clone());

        Self {
            assignments: AssignmentService::new(db.clone()),
            vendors: VendorService::new(db.clone()),
            dispatch: DispatchService::new(
                db.clone(),
                config.database.clone(),
                audit.clone(),
                notifications.clone(),
            ),
            grn: GrnService::new(db.clone(), config.database.clone(), audit.clone()),
            ticketing: TicketingService::new(
                db.clone(),
                config.database.clone(),
                config.fulfillment.clone(),
                audit.clone(),
                notifications.clone(),
            ),
            metrics: VendorMetricsService::new(db, config.fulfillment.clone()),
            notifications,
            audit,
        }
    }
}
