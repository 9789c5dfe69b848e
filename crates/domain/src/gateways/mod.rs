//! Outbound collaborators that are not document collections.

pub mod email_notifier;
pub mod identity_provider;

pub use email_notifier::*;
pub use identity_provider::IdentityProvider;
