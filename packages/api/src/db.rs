//! Database boundary.
//!
//! Table-scoped selects/inserts/updates/deletes plus the named remote
//! procedures the backend exposes. The trait mirrors the operations the
//! state layer needs, one method per query:
//!
//! | Method | Backend operation |
//! |--------|-------------------|
//! | [`profile_by_user`](Database::profile_by_user) | `ag_profiles` select, `user_id = eq`, single row |
//! | [`insert_profile`](Database::insert_profile) / [`update_profile`](Database::update_profile) | `ag_profiles` insert/update returning the row |
//! | [`list_especialidades`](Database::list_especialidades) | `ag_especialidade` select ordered by name |
//! | [`add_especialidade`](Database::add_especialidade) / [`update_especialidade`](Database::update_especialidade) | `ag_add_especialidade` / `ag_update_especialidade` procedures, envelope result |
//! | [`delete_especialidade`](Database::delete_especialidade) | `ag_especialidade` delete by id |
//! | [`list_profissionais`](Database::list_profissionais) | `ag_get_profissionais` procedure (joined view) |
//! | [`insert_profissional`](Database::insert_profissional) / [`update_profissional`](Database::update_profissional) / [`delete_profissional`](Database::delete_profissional) | `ag_profissionais` writes |
//! | [`list_profiles_if_admin`](Database::list_profiles_if_admin) | `ag_get_profiles_if_admin` procedure (authorization enforced server-side) |
//! | [`list_clientes`](Database::list_clientes) | `ag_clientes` select ordered by name |
//! | [`insert_cliente`](Database::insert_cliente) / [`update_cliente`](Database::update_cliente) / [`delete_cliente`](Database::delete_cliente) | `ag_clientes` writes |
//!
//! Constraint violations come back as [`BackendError`] with the SQLSTATE
//! code set; the state layer rewrites those into domain messages.

use uuid::Uuid;

use crate::error::BackendError;
use crate::models::{
    Cliente, Especialidade, NewCliente, NewProfile, ProfileSummary, ProfileUpdate, Profissional,
    RpcOutcome, UserProfile,
};

/// The relational backend, one method per query the application issues.
pub trait Database {
    // ag_profiles
    fn profile_by_user(
        &self,
        user_id: Uuid,
    ) -> impl std::future::Future<Output = Result<UserProfile, BackendError>>;
    fn insert_profile(
        &self,
        profile: NewProfile,
    ) -> impl std::future::Future<Output = Result<UserProfile, BackendError>>;
    fn update_profile(
        &self,
        user_id: Uuid,
        updates: ProfileUpdate,
    ) -> impl std::future::Future<Output = Result<UserProfile, BackendError>>;

    // ag_especialidade
    fn list_especialidades(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Especialidade>, BackendError>>;
    fn add_especialidade(
        &self,
        especialidade: &str,
    ) -> impl std::future::Future<Output = Result<RpcOutcome, BackendError>>;
    fn update_especialidade(
        &self,
        id: i64,
        especialidade: &str,
    ) -> impl std::future::Future<Output = Result<RpcOutcome, BackendError>>;
    fn delete_especialidade(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<(), BackendError>>;

    // ag_profissionais
    fn list_profissionais(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Profissional>, BackendError>>;
    fn insert_profissional(
        &self,
        profile_id: i64,
        especialidade_id: i64,
    ) -> impl std::future::Future<Output = Result<(), BackendError>>;
    fn update_profissional(
        &self,
        profissional_id: i64,
        profile_id: i64,
        especialidade_id: i64,
    ) -> impl std::future::Future<Output = Result<(), BackendError>>;
    fn delete_profissional(
        &self,
        profissional_id: i64,
    ) -> impl std::future::Future<Output = Result<(), BackendError>>;

    // ag_profiles, admin projection
    fn list_profiles_if_admin(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ProfileSummary>, BackendError>>;

    // ag_clientes
    fn list_clientes(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Cliente>, BackendError>>;
    fn insert_cliente(
        &self,
        cliente: NewCliente,
    ) -> impl std::future::Future<Output = Result<(), BackendError>>;
    fn update_cliente(
        &self,
        id: i64,
        cliente: NewCliente,
    ) -> impl std::future::Future<Output = Result<(), BackendError>>;
    fn delete_cliente(&self, id: i64)
        -> impl std::future::Future<Output = Result<(), BackendError>>;
}
