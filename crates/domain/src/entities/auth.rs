use serde::{Deserialize, Serialize};

use crate::entities::{Route, User};

/// The authenticated principal behind a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthIdentity {
    pub uid: String,
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
    pub landing: Route,
}

/// Published on every sign-in and sign-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { uid: String },
    SignedOut { uid: String },
}
