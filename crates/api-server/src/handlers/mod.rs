pub mod admin;
pub mod announcements;
pub mod auth;
pub mod events;
pub mod feed;
pub mod members;
