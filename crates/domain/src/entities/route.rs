use serde::{Deserialize, Serialize};

use crate::entities::Role;

/// Screens a member can be sent to after login or by a guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Login,
    Home,
    AlumniAdmin,
    SuperAdmin,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Home => "/home",
            Route::AlumniAdmin => "/alumni-admin",
            Route::SuperAdmin => "/super-admin",
        }
    }

    /// Where a member lands after a successful login.
    pub fn landing_for(role: Role) -> Self {
        match role {
            Role::SuperAdmin => Route::SuperAdmin,
            Role::AlumniAssociationAdmin => Route::AlumniAdmin,
            Role::Alumni | Role::DeptHead => Route::Home,
        }
    }
}
