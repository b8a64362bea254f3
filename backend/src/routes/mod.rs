//! Route definitions for the Procurement Fulfillment Platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - assignment reads
        .nest("/assignments", assignment_routes())
        // Protected routes - vendor reads
        .nest("/vendors", vendor_routes())
        // Protected routes - dispatch management
        .nest("/dispatches", dispatch_routes())
        // Protected routes - goods receipt management
        .nest("/goods-receipts", grn_routes())
        // Protected routes - exception ticket management
        .nest("/tickets", ticket_routes())
        // Protected routes - vendor performance metrics
        .nest("/metrics", metrics_routes())
        // Protected routes - notification management
        .nest("/notifications", notification_routes())
        // Protected routes - audit trail
        .route(
            "/audit",
            get(handlers::get_entity_audit)
                .route_layer(middleware::from_fn(auth_middleware)),
        )
}

/// Assignment read routes (protected)
fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_assignments))
        .route("/:assignment_id", get(handlers::get_assignment))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Vendor read routes (protected)
fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_vendors))
        .route("/:vendor_id", get(handlers::get_vendor))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Dispatch management routes (protected)
fn dispatch_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_dispatches).post(handlers::create_dispatch))
        .route("/:dispatch_id", get(handlers::get_dispatch))
        .route("/:dispatch_id/status", put(handlers::update_dispatch_status))
        .route(
            "/:dispatch_id/proof-documents",
            post(handlers::attach_proof_document),
        )
        .route("/upload-slots", get(handlers::request_proof_upload_slot))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Goods receipt routes (protected)
fn grn_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_grns).post(handlers::create_grn))
        .route("/pending", get(handlers::get_pending_grns))
        .route("/:grn_id", get(handlers::get_grn))
        .route("/:grn_id/process", post(handlers::process_grn_verification))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Exception ticket routes (protected)
fn ticket_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_tickets))
        .route("/:ticket_id", get(handlers::get_ticket))
        .route("/:ticket_id/status", put(handlers::update_ticket_status))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Vendor performance metric routes (protected)
fn metrics_routes() -> Router<AppState> {
    Router::new()
        .route("/fill-rates", get(handlers::get_fill_rates))
        .route("/fill-rates/export", get(handlers::export_fill_rates))
        .route("/fill-rates/recompute", post(handlers::recompute_fill_rates))
        .route("/sla", get(handlers::get_sla))
        .route(
            "/vendors/:vendor_id/trends",
            get(handlers::get_performance_trends),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Notification routes (protected)
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/send", post(handlers::send_notification))
        .route_layer(middleware::from_fn(auth_middleware))
}
