use config::Config;
use domain::*;
use infrastructure::*;
use std::sync::Arc;
use tracing::info;

/// Alumni Link application - wires the SQLite adapters into the domain services.
pub struct AlumniApp {
    pub auth_service: Arc<AuthService>,
    pub route_guard: Arc<RouteGuard>,
    pub approval_service: Arc<ApprovalService>,
    pub profile_service: Arc<ProfileService>,
    pub feed_service: Arc<FeedService>,
    pub event_service: Arc<EventService>,
    pub announcement_service: Arc<AnnouncementService>,
    pub notification_service: Arc<NotificationService>,
    pub directory_service: Arc<DirectoryService>,
    identity_provider: Arc<dyn IdentityProvider>,
    user_repository: Arc<dyn UserRepository>,
}

impl AlumniApp {
    pub fn new(config: &Config) -> Result<Self, DomainError> {
        Self::build(config, None)
    }

    /// Same wiring with a cheaper Argon2 memory cost (KiB), for tests and local tooling.
    pub fn with_password_cost(config: &Config, memory_kib: u32) -> Result<Self, DomainError> {
        Self::build(config, Some(memory_kib))
    }

    fn build(config: &Config, password_cost: Option<u32>) -> Result<Self, DomainError> {
        // Infrastructure layer - database setup
        let database = Database::new(&config.database_path)?;
        let pool = database.get_pool().clone();

        // Create repository implementations
        let user_repository: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(pool.clone()));
        let post_repository: Arc<dyn PostRepository> =
            Arc::new(SqlitePostRepository::new(pool.clone()));
        let event_repository: Arc<dyn EventRepository> =
            Arc::new(SqliteEventRepository::new(pool.clone()));
        let announcement_repository: Arc<dyn AnnouncementRepository> =
            Arc::new(SqliteAnnouncementRepository::new(pool.clone()));
        let notification_repository: Arc<dyn NotificationRepository> =
            Arc::new(SqliteNotificationRepository::new(pool.clone()));
        let id_request_repository: Arc<dyn IdRequestRepository> =
            Arc::new(SqliteIdRequestRepository::new(pool.clone()));
        let course_repository: Arc<dyn CourseRepository> =
            Arc::new(SqliteCourseRepository::new(pool.clone()));

        let identity_provider = match password_cost {
            Some(memory_kib) => SqliteIdentityProvider::with_memory_cost(pool, memory_kib)?,
            None => SqliteIdentityProvider::new(pool),
        };
        let identity_provider: Arc<dyn IdentityProvider> =
            Arc::new(identity_provider.with_session_ttl(config.session_ttl)?);

        let email_notifier: Arc<dyn EmailNotifier> = match &config.email_functions_url {
            Some(url) => {
                info!(url = %url, "sending transactional email over HTTP");
                Arc::new(HttpEmailNotifier::new(url, config.email_timeout)?)
            }
            None => {
                info!("no email endpoint configured, emails will be logged");
                Arc::new(LogEmailNotifier)
            }
        };

        // Domain services
        let notification_service = Arc::new(NotificationService::new(notification_repository));

        let auth_service = AuthService::new(
            identity_provider.clone(),
            user_repository.clone(),
            LoginThrottle {
                max_failures: config.max_failed_logins,
                window: config.login_lockout,
            },
        );

        let approval_service = ApprovalService::new(
            user_repository.clone(),
            id_request_repository.clone(),
            course_repository,
            email_notifier,
            notification_service.clone(),
        );

        let profile_service = ProfileService::new(user_repository.clone(), id_request_repository);
        let feed_service = FeedService::new(post_repository, user_repository.clone());
        let event_service = EventService::new(event_repository, notification_service.clone());
        let announcement_service = AnnouncementService::new(
            announcement_repository,
            user_repository.clone(),
            notification_service.clone(),
        );

        Ok(Self {
            auth_service: Arc::new(auth_service),
            route_guard: Arc::new(RouteGuard::new(user_repository.clone())),
            approval_service: Arc::new(approval_service),
            profile_service: Arc::new(profile_service),
            feed_service: Arc::new(feed_service),
            event_service: Arc::new(event_service),
            announcement_service: Arc::new(announcement_service),
            notification_service,
            directory_service: Arc::new(DirectoryService::new(user_repository.clone())),
            identity_provider,
            user_repository,
        })
    }

    /// Creates an approved administrator outside the registration flow.
    pub async fn bootstrap_admin(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        role: Role,
    ) -> Result<User, DomainError> {
        if !role.is_admin() {
            return Err(DomainError::ValidationError(format!(
                "{} is not an administrator role",
                role
            )));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let identity = self
            .identity_provider
            .create_account(email, password, display_name)
            .await?;
        let admin = User::new_admin(identity.uid, identity.email, display_name, role);
        admin.validate()?;
        let saved = self.user_repository.save(&admin).await?;
        info!(uid = %saved.uid, role = %saved.role, "administrator created");
        Ok(saved)
    }
}
