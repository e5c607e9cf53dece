//! # Session service
//!
//! Sign-in/out/up and password-reset flows over the identity provider,
//! the way the UI consumes them: every operation exposes a busy flag for
//! its duration, returns a `Result` instead of panicking or leaking
//! provider exceptions, and translates the three well-known provider
//! errors into localized messages (everything else passes through).
//!
//! Cross-store behaviour:
//! - successful login runs a best-effort profile fetch — a profile
//!   failure is logged but never fails the login — then signals
//!   navigation to the application root;
//! - logout clears the profile store synchronously before signalling
//!   navigation to the login view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use api::{AuthSession, AuthUser, BackendError, Database, IdentityProvider};

use crate::user::UserStore;

/// Routes the hosting shell can be asked to navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Application root, shown after login.
    Home,
    /// Login view, shown after logout.
    Login,
}

/// Navigation boundary, implemented by the hosting application shell.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Authentication failure with a user-facing message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    #[error("Email ou senha incorretos. Verifique suas credenciais.")]
    InvalidCredentials,
    #[error("Email não confirmado. Verifique sua caixa de entrada.")]
    EmailNotConfirmed,
    #[error("Muitas tentativas. Tente novamente em alguns minutos.")]
    RateLimited,
    /// Any other provider error, message passed through as-is.
    #[error("{0}")]
    Backend(String),
}

impl From<BackendError> for AuthError {
    fn from(err: BackendError) -> Self {
        match err.message.as_str() {
            "Invalid login credentials" => AuthError::InvalidCredentials,
            "Email not confirmed" => AuthError::EmailNotConfirmed,
            "Too many requests" => AuthError::RateLimited,
            _ => AuthError::Backend(err.message),
        }
    }
}

/// Busy flag held for the duration of an operation; cleared on drop so
/// every exit path resets it.
struct Busy<'a>(&'a AtomicBool);

impl<'a> Busy<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Login/logout/sign-up/reset flows against the identity provider.
pub struct SessionService<B> {
    backend: Arc<B>,
    users: Arc<UserStore<B>>,
    navigator: Arc<dyn Navigator>,
    loading: AtomicBool,
    logging_out: AtomicBool,
}

impl<B: IdentityProvider + Database> SessionService<B> {
    pub fn new(backend: Arc<B>, users: Arc<UserStore<B>>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            backend,
            users,
            navigator,
            loading: AtomicBool::new(false),
            logging_out: AtomicBool::new(false),
        }
    }

    /// Busy flag for login/sign-up/reset.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Busy flag for logout.
    pub fn is_logging_out(&self) -> bool {
        self.logging_out.load(Ordering::SeqCst)
    }

    /// Whether an identity is currently present.
    pub fn is_authenticated(&self) -> bool {
        self.backend.current_user().is_some()
    }

    /// Sign in with email and password. On success, best-effort profile
    /// fetch and navigation to [`Route::Home`].
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let _busy = Busy::raise(&self.loading);

        let session = self.backend.sign_in(email, password).await.map_err(|e| {
            let err = AuthError::from(e);
            tracing::error!("login failed: {err}");
            err
        })?;

        // Best-effort: the profile store records its own failures and a
        // missing profile must not fail the login.
        self.users.fetch_profile().await;
        if let Some(message) = self.users.error() {
            tracing::warn!("profile fetch after login failed: {message}");
        }

        self.navigator.navigate(Route::Home);
        Ok(session)
    }

    /// Sign out, clear the profile store, then navigate to [`Route::Login`].
    pub async fn logout(&self) -> Result<(), AuthError> {
        let _busy = Busy::raise(&self.logging_out);

        self.backend.sign_out().await.map_err(|e| {
            let err = AuthError::from(e);
            tracing::error!("logout failed: {err}");
            err
        })?;

        self.users.clear_profile();
        self.navigator.navigate(Route::Login);
        Ok(())
    }

    /// Register a new account. No navigation; the confirmation flow is
    /// driven by the provider.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let _busy = Busy::raise(&self.loading);
        self.backend.sign_up(email, password).await.map_err(|e| {
            let err = AuthError::from(e);
            tracing::error!("sign-up failed: {err}");
            err
        })
    }

    /// Request a password-reset email.
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let _busy = Busy::raise(&self.loading);
        self.backend.reset_password(email).await.map_err(|e| {
            let err = AuthError::from(e);
            tracing::error!("password reset failed: {err}");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::MemoryBackend;
    use std::sync::Mutex;

    /// Records navigation signals and, at navigate time, whether the
    /// profile store still held a profile.
    #[derive(Default)]
    struct ProbeNavigator {
        routes: Mutex<Vec<Route>>,
        users: Mutex<Option<Arc<UserStore<MemoryBackend>>>>,
        profile_present_at_navigate: Mutex<Vec<bool>>,
    }

    impl Navigator for ProbeNavigator {
        fn navigate(&self, route: Route) {
            self.routes.lock().unwrap().push(route);
            if let Some(users) = self.users.lock().unwrap().as_ref() {
                self.profile_present_at_navigate
                    .lock()
                    .unwrap()
                    .push(users.is_logged_in());
            }
        }
    }

    fn service(
        backend: Arc<MemoryBackend>,
    ) -> (
        SessionService<MemoryBackend>,
        Arc<UserStore<MemoryBackend>>,
        Arc<ProbeNavigator>,
    ) {
        let users = Arc::new(UserStore::new(backend.clone()));
        let navigator = Arc::new(ProbeNavigator::default());
        *navigator.users.lock().unwrap() = Some(users.clone());
        let session = SessionService::new(backend, users.clone(), navigator.clone());
        (session, users, navigator)
    }

    #[tokio::test]
    async fn wrong_password_yields_localized_message() {
        let backend = Arc::new(MemoryBackend::new());
        backend.register("user@example.com", "rightpass");
        let (session, _users, navigator) = service(backend);

        let err = session.login("user@example.com", "wrongpass").await.unwrap_err();

        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(
            err.to_string(),
            "Email ou senha incorretos. Verifique suas credenciais."
        );
        assert!(navigator.routes.lock().unwrap().is_empty());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn unconfirmed_email_yields_localized_message() {
        let backend = Arc::new(MemoryBackend::new());
        backend.register_unconfirmed("user@example.com", "pass");
        let (session, _users, _navigator) = service(backend);

        let err = session.login("user@example.com", "pass").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Email não confirmado. Verifique sua caixa de entrada."
        );
    }

    #[tokio::test]
    async fn unknown_provider_errors_pass_through() {
        let err = AuthError::from(BackendError::new("Database connection lost"));
        assert_eq!(err, AuthError::Backend("Database connection lost".into()));
        assert_eq!(err.to_string(), "Database connection lost");
    }

    #[tokio::test]
    async fn login_fetches_profile_and_navigates_home() {
        let backend = Arc::new(MemoryBackend::new());
        let user = backend.register("ana@example.com", "s3cret");
        backend.seed_profile(user.id, "Ana", "admin");
        let (session, users, navigator) = service(backend);

        let result = session.login("ana@example.com", "s3cret").await.unwrap();

        assert_eq!(result.user.email, "ana@example.com");
        assert!(users.is_admin());
        assert_eq!(navigator.routes.lock().unwrap().as_slice(), &[Route::Home]);
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn profile_fetch_failure_does_not_fail_login() {
        let backend = Arc::new(MemoryBackend::new());
        // Account exists but has no profile row yet.
        backend.register("novo@example.com", "s3cret");
        let (session, users, navigator) = service(backend);

        let result = session.login("novo@example.com", "s3cret").await;

        assert!(result.is_ok());
        assert!(users.profile().is_none());
        assert!(users.error().is_some());
        assert_eq!(navigator.routes.lock().unwrap().as_slice(), &[Route::Home]);
    }

    #[tokio::test]
    async fn logout_clears_profile_before_navigation() {
        let backend = Arc::new(MemoryBackend::new());
        let user = backend.register("ana@example.com", "s3cret");
        backend.seed_profile(user.id, "Ana", "user");
        let (session, users, navigator) = service(backend);
        session.login("ana@example.com", "s3cret").await.unwrap();
        assert!(users.is_logged_in());

        session.logout().await.unwrap();

        assert!(users.profile().is_none());
        assert!(!session.is_authenticated());
        let routes = navigator.routes.lock().unwrap();
        assert_eq!(*routes.last().unwrap(), Route::Login);
        // At the moment the logout navigation fired, the profile was
        // already cleared.
        let snapshots = navigator.profile_present_at_navigate.lock().unwrap();
        assert!(!*snapshots.last().unwrap());
        assert!(!session.is_logging_out());
    }

    #[tokio::test]
    async fn sign_up_registers_without_navigation() {
        let backend = Arc::new(MemoryBackend::new());
        let (session, _users, navigator) = service(backend);

        let user = session.sign_up("novo@example.com", "s3cret").await.unwrap();

        assert_eq!(user.email, "novo@example.com");
        assert!(navigator.routes.lock().unwrap().is_empty());
        // Sign-up alone does not authenticate.
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn reset_password_never_discloses_accounts() {
        let backend = Arc::new(MemoryBackend::new());
        let (session, _users, _navigator) = service(backend);

        assert!(session.reset_password("unknown@example.com").await.is_ok());
        assert!(!session.is_loading());
    }
}
