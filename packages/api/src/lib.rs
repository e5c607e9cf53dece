//! # API crate — backend boundaries for the scheduling app
//!
//! Everything the state layer needs to talk to the hosted backend lives
//! here: the row models, the two boundary traits, and their
//! implementations.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Row types for the scheduling tables and procedure payloads |
//! | [`auth`] | [`IdentityProvider`] trait plus session/identity types |
//! | [`db`] | [`Database`] trait: table selects/writes and named procedures |
//! | [`error`] | [`BackendError`] with SQLSTATE-aware predicates |
//! | [`config`] | Connection settings, loadable from the environment |
//! | [`supabase`] | HTTP implementation of both traits (GoTrue + PostgREST) |
//! | [`memory`] | In-memory implementation for tests and local development |
//!
//! Stores are generic over a backend `B: IdentityProvider + Database`,
//! so the HTTP client and the in-memory backend are interchangeable.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod models;
pub mod supabase;

pub use auth::{AuthSession, AuthUser, IdentityProvider};
pub use config::{ApiConfig, ConfigError};
pub use db::Database;
pub use error::BackendError;
pub use memory::MemoryBackend;
pub use models::{
    Cliente, Especialidade, NewCliente, NewProfile, ProfileSummary, ProfileUpdate, Profissional,
    RpcOutcome, UserProfile,
};
pub use supabase::SupabaseBackend;
