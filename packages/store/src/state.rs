//! Application state container.
//!
//! The original design kept module-level singletons shared by every
//! consumer; here the container is explicit: one [`AppState`] per
//! application session, constructed from the backend and the two host
//! boundaries (navigation and toasts), torn down by dropping it. Stores
//! are shared through `Arc`, so clones of the handles observe the same
//! state.

use std::sync::Arc;

use api::{Database, IdentityProvider};

use crate::cadastro::CadastroStore;
use crate::notify::{Notifications, Notifier};
use crate::session::{Navigator, SessionService};
use crate::user::UserStore;
use crate::week::WeekNavigator;

/// All client-side state for one application session.
pub struct AppState<B> {
    pub session: SessionService<B>,
    pub users: Arc<UserStore<B>>,
    pub cadastro: CadastroStore<B>,
    pub week: WeekNavigator,
    pub notifications: Notifications,
}

impl<B: IdentityProvider + Database> AppState<B> {
    pub fn new(backend: Arc<B>, navigator: Arc<dyn Navigator>, notifier: Arc<dyn Notifier>) -> Self {
        let users = Arc::new(UserStore::new(backend.clone()));
        Self {
            session: SessionService::new(backend.clone(), users.clone(), navigator),
            cadastro: CadastroStore::new(backend, users.clone()),
            users,
            week: WeekNavigator::new(),
            notifications: Notifications::new(notifier),
        }
    }

    /// App-start hook: when a session already exists (restored by the
    /// provider), load its profile. Best-effort — failures stay in the
    /// user store's error field.
    pub async fn init(&self) {
        if self.session.is_authenticated() {
            self.users.fetch_profile().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Toast;
    use crate::session::Route;
    use api::MemoryBackend;
    use std::sync::Mutex;

    #[derive(Default)]
    struct NullNavigator(Mutex<Vec<Route>>);

    impl Navigator for NullNavigator {
        fn navigate(&self, route: Route) {
            self.0.lock().unwrap().push(route);
        }
    }

    #[derive(Default)]
    struct NullNotifier(Mutex<Vec<Toast>>);

    impl Notifier for NullNotifier {
        fn show(&self, toast: Toast) {
            self.0.lock().unwrap().push(toast);
        }
    }

    fn app(backend: Arc<MemoryBackend>) -> AppState<MemoryBackend> {
        AppState::new(
            backend,
            Arc::new(NullNavigator::default()),
            Arc::new(NullNotifier::default()),
        )
    }

    #[tokio::test]
    async fn init_without_session_leaves_stores_untouched() {
        let state = app(Arc::new(MemoryBackend::new()));

        state.init().await;

        assert!(state.users.profile().is_none());
        assert!(state.users.error().is_none());
    }

    #[tokio::test]
    async fn init_with_restored_session_loads_profile() {
        let backend = Arc::new(MemoryBackend::new());
        let user = backend.register("ana@example.com", "s3cret");
        backend.seed_profile(user.id, "Ana", "manager");
        backend.sign_in("ana@example.com", "s3cret").await.unwrap();

        let state = app(backend);
        state.init().await;

        assert!(state.users.is_manager());
    }

    #[tokio::test]
    async fn two_sessions_do_not_share_state() {
        let backend = Arc::new(MemoryBackend::new());
        let user = backend.register("ana@example.com", "s3cret");
        backend.seed_profile(user.id, "Ana", "admin");
        backend.sign_in("ana@example.com", "s3cret").await.unwrap();

        let first = app(backend.clone());
        first.users.fetch_profile().await;
        assert!(first.users.is_admin());

        // A second container over the same backend starts clean.
        let second = app(backend);
        assert!(second.users.profile().is_none());
    }
}
