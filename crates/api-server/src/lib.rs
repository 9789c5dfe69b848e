//! HTTP surface of Alumni Link. Every protected route resolves the bearer
//! session and runs the matching route guard before the handler body.

pub mod error;
pub mod extract;
pub mod handlers;

use application::AlumniApp;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use handlers::{admin, announcements, auth, events, feed, members};

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<AlumniApp>,
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "alumni-link",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Profile
        .route("/api/profile", get(members::my_profile).put(members::update_profile))
        .route("/api/profile/items", post(members::add_item))
        .route("/api/profile/items/:kind/:id", delete(members::remove_item))
        .route("/api/profile/id-request", post(members::submit_id_request))
        .route("/api/users/:uid", get(members::get_profile))
        .route("/api/users/:uid/experiences", get(members::grouped_experiences))
        .route("/api/users/:uid/posts", get(feed::posts_by))
        .route("/api/users/:uid/connect", post(members::connect))
        .route("/api/directory", get(members::directory))
        // Feed
        .route("/api/feed", get(feed::feed))
        .route("/api/posts", post(feed::create_post))
        .route("/api/posts/:id", get(feed::get_post).delete(feed::delete_post))
        .route("/api/posts/:id/like", post(feed::like).delete(feed::unlike))
        .route("/api/posts/:id/comments", post(feed::add_comment))
        .route("/api/posts/:id/comments/:comment_id", delete(feed::delete_comment))
        // Events and announcements
        .route("/api/events", get(events::list_global))
        .route("/api/events/mine", get(events::list_mine))
        .route("/api/events/:id", get(events::get_event))
        .route("/api/events/:id/rsvp", post(events::rsvp).delete(events::cancel_rsvp))
        .route("/api/announcements", get(announcements::list))
        // Notifications
        .route("/api/notifications", get(members::notifications))
        .route("/api/notifications/unread-count", get(members::unread_count))
        .route("/api/notifications/read-all", post(members::mark_all_read))
        .route("/api/notifications/:id/read", post(members::mark_read))
        .route("/api/notifications/:id", delete(members::delete_notification))
        // Department head
        .route(
            "/api/department/events",
            get(events::list_department).post(events::create_department),
        )
        .route(
            "/api/department/events/:id/notify",
            post(events::notify_department_attendees),
        )
        .route("/api/department/members", get(admin::department_members))
        // Alumni association admin
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:uid/approve", post(admin::approve))
        .route("/api/admin/users/:uid/reject", post(admin::reject))
        .route("/api/admin/users/:uid/role", put(admin::change_role))
        .route("/api/admin/users/:uid/department", put(admin::assign_department))
        .route("/api/admin/users/:uid/promote", post(admin::promote))
        .route("/api/admin/users/:uid/remind", post(admin::remind))
        .route("/api/admin/department-heads", get(admin::department_heads))
        .route("/api/admin/departments", get(admin::departments))
        .route("/api/admin/courses", post(admin::add_course))
        .route("/api/admin/analytics", get(admin::analytics))
        .route("/api/admin/analytics/departments", get(admin::department_analytics))
        .route("/api/admin/id-requests", get(admin::id_requests))
        .route("/api/admin/id-requests/:uid/approve", post(admin::approve_id_request))
        .route("/api/admin/id-requests/:uid/reject", post(admin::reject_id_request))
        .route("/api/admin/events", post(events::create_global))
        .route("/api/admin/events/:id/notify", post(events::notify_attendees))
        .route("/api/admin/announcements", post(announcements::create))
        // Super admin
        .route("/api/super/users/:uid/lock", put(admin::set_locked))
        // Health check
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
