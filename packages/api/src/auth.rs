//! Identity-provider boundary.
//!
//! The state layer never talks to the auth provider directly; it goes
//! through [`IdentityProvider`], implemented by
//! [`SupabaseBackend`](crate::supabase::SupabaseBackend) for the hosted
//! service and by [`MemoryBackend`](crate::memory::MemoryBackend) in tests.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BackendError;

/// The authenticated identity as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// An active session: the identity plus its bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: String,
}

/// Sign-in/out/up and password-reset calls against the auth provider.
///
/// Implementations keep the active session so that [`current_user`]
/// (and the bearer token on database calls) reflects the signed-in
/// identity. Errors carry the provider's message verbatim; translation
/// into user-facing text happens in the state layer.
///
/// [`current_user`]: IdentityProvider::current_user
pub trait IdentityProvider {
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<AuthSession, BackendError>>;

    fn sign_out(&self) -> impl std::future::Future<Output = Result<(), BackendError>>;

    /// Registers a new account. The account is not signed in afterwards;
    /// the provider's email-confirmation flow decides when it becomes usable.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<AuthUser, BackendError>>;

    fn reset_password(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<(), BackendError>>;

    /// The identity of the active session, if any.
    fn current_user(&self) -> Option<AuthUser>;
}
