pub mod announcement;
pub mod auth;
pub mod course;
pub mod event;
pub mod id_request;
pub mod notification;
pub mod post;
pub mod profile;
pub mod route;
pub mod user;

pub use announcement::*;
pub use auth::*;
pub use course::*;
pub use event::*;
pub use id_request::*;
pub use notification::*;
pub use post::*;
pub use profile::*;
pub use route::*;
pub use user::*;
