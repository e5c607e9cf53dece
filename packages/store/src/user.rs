//! # User profile store
//!
//! Holds the signed-in user's profile row and the role flags derived
//! from it. One instance per [`AppState`](crate::state::AppState);
//! consumers share it through an `Arc`.
//!
//! Contract (matches the rest of the state layer): no action raises past
//! the store. Failures null the profile (for fetch), are written to the
//! diagnostic log, and land in the observable [`error`](UserStore::error)
//! field. Overlapping calls are not serialized; the last completion wins.

use std::sync::{Arc, RwLock};

use api::models::ROLE_USER;
use api::{Database, IdentityProvider, NewProfile, ProfileUpdate, UserProfile};

/// Error recorded when an action needs a signed-in identity.
pub const AUTH_REQUIRED: &str = "Usuário não autenticado";
/// Error recorded when an update runs before any profile was loaded.
pub const PROFILE_NOT_LOADED: &str = "Usuário não autenticado ou perfil não carregado";

#[derive(Default)]
struct UserState {
    profile: Option<UserProfile>,
    loading: bool,
    error: Option<String>,
}

/// Current user's profile row plus derived role flags.
pub struct UserStore<B> {
    backend: Arc<B>,
    state: RwLock<UserState>,
}

impl<B: IdentityProvider + Database> UserStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: RwLock::new(UserState::default()),
        }
    }

    // Observable state.

    pub fn profile(&self) -> Option<UserProfile> {
        self.state.read().unwrap().profile.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.read().unwrap().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().unwrap().error.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.read().unwrap().profile.is_some()
    }

    /// Display name, "Usuário" when no profile or name is present.
    pub fn user_name(&self) -> String {
        let state = self.state.read().unwrap();
        state
            .profile
            .as_ref()
            .map(|p| p.display_name().to_string())
            .unwrap_or_else(|| "Usuário".to_string())
    }

    /// Role, "user" when no profile or role is present.
    pub fn user_role(&self) -> String {
        let state = self.state.read().unwrap();
        state
            .profile
            .as_ref()
            .map(|p| p.role_or_default().to_string())
            .unwrap_or_else(|| ROLE_USER.to_string())
    }

    pub fn is_admin(&self) -> bool {
        self.state
            .read()
            .unwrap()
            .profile
            .as_ref()
            .is_some_and(UserProfile::is_admin)
    }

    pub fn is_manager(&self) -> bool {
        self.state
            .read()
            .unwrap()
            .profile
            .as_ref()
            .is_some_and(UserProfile::is_manager)
    }

    // Actions.

    /// Load the profile row for the current identity. On failure the
    /// profile is cleared and the message recorded.
    pub async fn fetch_profile(&self) {
        self.begin();
        let result = match self.backend.current_user() {
            Some(user) => self
                .backend
                .profile_by_user(user.id)
                .await
                .map_err(|e| e.to_string()),
            None => Err(AUTH_REQUIRED.to_string()),
        };
        let mut state = self.state.write().unwrap();
        state.loading = false;
        match result {
            Ok(profile) => state.profile = Some(profile),
            Err(message) => {
                tracing::error!("failed to fetch user profile: {message}");
                state.profile = None;
                state.error = Some(message);
            }
        }
    }

    /// Apply a partial update to the loaded profile; the backend's
    /// returned row replaces the local one. Requires an identity and a
    /// previously loaded profile.
    pub async fn update_profile(&self, updates: ProfileUpdate) {
        self.begin();
        let ready = self.backend.current_user().filter(|_| self.is_logged_in());
        let result = match ready {
            Some(user) => self
                .backend
                .update_profile(user.id, updates)
                .await
                .map_err(|e| e.to_string()),
            None => Err(PROFILE_NOT_LOADED.to_string()),
        };
        self.finish(result);
    }

    /// Insert a profile row for the current identity; role defaults to
    /// "user" when omitted.
    pub async fn create_profile(&self, nome: &str, role: Option<&str>) {
        self.begin();
        let result = match self.backend.current_user() {
            Some(user) => self
                .backend
                .insert_profile(NewProfile {
                    user_id: user.id,
                    nome: nome.to_string(),
                    role: role.unwrap_or(ROLE_USER).to_string(),
                })
                .await
                .map_err(|e| e.to_string()),
            None => Err(AUTH_REQUIRED.to_string()),
        };
        self.finish(result);
    }

    /// Synchronous reset to the initial state; called on logout.
    pub fn clear_profile(&self) {
        let mut state = self.state.write().unwrap();
        state.profile = None;
        state.error = None;
        state.loading = false;
    }

    fn begin(&self) {
        let mut state = self.state.write().unwrap();
        state.loading = true;
        state.error = None;
    }

    /// Commit an action result: replace the profile on success, keep the
    /// current profile and record the message on failure.
    fn finish(&self, result: Result<UserProfile, String>) {
        let mut state = self.state.write().unwrap();
        state.loading = false;
        match result {
            Ok(profile) => state.profile = Some(profile),
            Err(message) => {
                tracing::error!("profile action failed: {message}");
                state.error = Some(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::MemoryBackend;

    async fn signed_in_store(role: &str) -> (Arc<MemoryBackend>, UserStore<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let user = backend.register("ana@example.com", "s3cret");
        backend.seed_profile(user.id, "Ana", role);
        backend.sign_in("ana@example.com", "s3cret").await.unwrap();
        let store = UserStore::new(backend.clone());
        (backend, store)
    }

    #[tokio::test]
    async fn fetch_requires_identity() {
        let backend = Arc::new(MemoryBackend::new());
        let store = UserStore::new(backend);

        store.fetch_profile().await;

        assert!(store.profile().is_none());
        assert_eq!(store.error().as_deref(), Some(AUTH_REQUIRED));
        assert!(!store.loading());
    }

    #[tokio::test]
    async fn fetch_loads_profile_and_role_flags() {
        let (_backend, store) = signed_in_store("admin").await;

        store.fetch_profile().await;

        assert!(store.is_logged_in());
        assert_eq!(store.user_name(), "Ana");
        assert_eq!(store.user_role(), "admin");
        assert!(store.is_admin());
        assert!(!store.is_manager());
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn fetch_failure_clears_profile() {
        let (backend, store) = signed_in_store("user").await;
        store.fetch_profile().await;
        assert!(store.is_logged_in());

        backend.fail_next_with(api::BackendError::new("connection reset"));
        store.fetch_profile().await;

        assert!(store.profile().is_none());
        assert_eq!(store.error().as_deref(), Some("connection reset"));
    }

    #[tokio::test]
    async fn defaults_apply_without_profile() {
        let backend = Arc::new(MemoryBackend::new());
        let store = UserStore::new(backend);

        assert_eq!(store.user_name(), "Usuário");
        assert_eq!(store.user_role(), "user");
        assert!(!store.is_admin());
    }

    #[tokio::test]
    async fn update_requires_loaded_profile() {
        let (_backend, store) = signed_in_store("user").await;

        store
            .update_profile(ProfileUpdate {
                nome: Some("Nova Ana".into()),
                role: None,
            })
            .await;

        assert_eq!(store.error().as_deref(), Some(PROFILE_NOT_LOADED));
    }

    #[tokio::test]
    async fn update_replaces_local_profile_with_returned_row() {
        let (_backend, store) = signed_in_store("user").await;
        store.fetch_profile().await;

        store
            .update_profile(ProfileUpdate {
                nome: Some("Nova Ana".into()),
                role: None,
            })
            .await;

        assert_eq!(store.user_name(), "Nova Ana");
        assert_eq!(store.user_role(), "user");
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn create_profile_defaults_role_to_user() {
        let backend = Arc::new(MemoryBackend::new());
        backend.register("novo@example.com", "s3cret");
        backend.sign_in("novo@example.com", "s3cret").await.unwrap();
        let store = UserStore::new(backend);

        store.create_profile("Novo", None).await;

        assert_eq!(store.user_name(), "Novo");
        assert_eq!(store.user_role(), "user");
    }

    #[tokio::test]
    async fn clear_profile_resets_synchronously() {
        let (_backend, store) = signed_in_store("admin").await;
        store.fetch_profile().await;
        assert!(store.is_logged_in());

        store.clear_profile();

        assert!(store.profile().is_none());
        assert!(store.error().is_none());
        assert!(!store.loading());
    }
}
