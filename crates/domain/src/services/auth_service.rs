use crate::entities::{
    AuthEvent, AuthIdentity, LoginOutcome, RegistrationDetails, Route, User,
};
use crate::errors::DomainError;
use crate::gateways::IdentityProvider;
use crate::repositories::UserRepository;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Failed-login throttling knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginThrottle {
    pub max_failures: u32,
    pub window: Duration,
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window: Duration::from_secs(300),
        }
    }
}

/// Upper bound on emails with an open failure window.
const MAX_TRACKED_EMAILS: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct FailureWindow {
    count: u32,
    started: Instant,
}

/// Registration, login and session lifecycle.
pub struct AuthService {
    identity_provider: Arc<dyn IdentityProvider>,
    user_repository: Arc<dyn UserRepository>,
    throttle: LoginThrottle,
    failures: Mutex<HashMap<String, FailureWindow>>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthService {
    pub fn new(
        identity_provider: Arc<dyn IdentityProvider>,
        user_repository: Arc<dyn UserRepository>,
        throttle: LoginThrottle,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            identity_provider,
            user_repository,
            throttle,
            failures: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Creates credentials and a pending alumni record.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        details: RegistrationDetails,
    ) -> Result<User, DomainError> {
        let email = normalize_email(email);
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.user_repository.find_by_email(&email).await?.is_some() {
            return Err(DomainError::EmailAlreadyExists(email));
        }

        let display_name = format!("{} {}", details.first_name.trim(), details.last_name.trim());
        // Validate before touching the credential store.
        let candidate = User::new_registration("pending".to_string(), email.clone(), details.clone());
        candidate.validate()?;

        let identity = self
            .identity_provider
            .create_account(&email, password, display_name.trim())
            .await?;
        let user = User::new_registration(identity.uid, email, details);
        let saved = self.user_repository.save(&user).await?;
        info!(uid = %saved.uid, "registered new member, awaiting approval");
        Ok(saved)
    }

    /// Verifies credentials and decides where the member lands.
    ///
    /// Accounts that may not use the app yet get their new session revoked
    /// before the error is returned.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, DomainError> {
        let email = normalize_email(email);
        self.check_throttle(&email)?;

        let identity = match self.identity_provider.verify_password(&email, password).await? {
            Some(identity) => identity,
            None => {
                self.record_failure(&email);
                debug!(email = %email, "invalid credentials");
                return Err(DomainError::InvalidCredentials);
            }
        };
        self.clear_failures(&email);

        let token = self.identity_provider.issue_session(&identity).await?;
        let user = match self.user_repository.find_by_id(&identity.uid).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.revoke_quietly(&token).await;
                return Err(DomainError::UserNotFound(identity.uid));
            }
            Err(e) => {
                self.revoke_quietly(&token).await;
                return Err(e);
            }
        };

        if user.is_locked {
            self.revoke_quietly(&token).await;
            info!(uid = %user.uid, "login refused: account locked");
            return Err(DomainError::AccountLocked(user.uid));
        }
        if !user.can_access_app() {
            self.revoke_quietly(&token).await;
            info!(uid = %user.uid, status = %user.status, "login refused: not approved");
            return Err(DomainError::PendingApproval(user.uid));
        }

        let landing = Route::landing_for(user.role);
        info!(uid = %user.uid, role = %user.role, landing = landing.path(), "login succeeded");
        let _ = self.events.send(AuthEvent::SignedIn {
            uid: user.uid.clone(),
        });
        Ok(LoginOutcome {
            token,
            user,
            landing,
        })
    }

    pub async fn logout(&self, token: &str) -> Result<(), DomainError> {
        let identity = self.identity_provider.resolve_session(token).await?;
        self.identity_provider.revoke_session(token).await?;
        if let Some(identity) = identity {
            info!(uid = %identity.uid, "logged out");
            let _ = self.events.send(AuthEvent::SignedOut { uid: identity.uid });
        }
        Ok(())
    }

    pub async fn current_identity(&self, token: &str) -> Result<Option<AuthIdentity>, DomainError> {
        self.identity_provider.resolve_session(token).await
    }

    /// Sign-in and sign-out events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn check_throttle(&self, email: &str) -> Result<(), DomainError> {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(window) = failures.get(email).copied() {
            if window.started.elapsed() >= self.throttle.window {
                failures.remove(email);
            } else if window.count >= self.throttle.max_failures {
                warn!(email = %email, failures = window.count, "login throttled");
                return Err(DomainError::TooManyRequests(email.to_string()));
            }
        }
        Ok(())
    }

    fn record_failure(&self, email: &str) {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        let window_length = self.throttle.window;
        failures.retain(|_, w| w.started.elapsed() < window_length);
        if failures.len() >= MAX_TRACKED_EMAILS && !failures.contains_key(email) {
            let oldest = failures
                .iter()
                .min_by_key(|(_, w)| w.started)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                failures.remove(&oldest);
            }
        }
        let window = failures.entry(email.to_string()).or_insert(FailureWindow {
            count: 0,
            started: Instant::now(),
        });
        window.count += 1;
    }

    fn clear_failures(&self, email: &str) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(email);
    }

    async fn revoke_quietly(&self, token: &str) {
        if let Err(e) = self.identity_provider.revoke_session(token).await {
            warn!(error = %e, "failed to revoke session");
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
