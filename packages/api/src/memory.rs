//! In-memory backend for tests and local development.
//!
//! Implements both boundary traits against `Mutex`-guarded tables, and
//! reproduces the backend behaviour the state layer depends on: the
//! unique-cpf and foreign-key constraints (surfaced with their SQLSTATE
//! codes and constraint names), the envelope-returning specialty
//! procedures, and the server-side admin check on the profile listing.
//!
//! Test hooks: `seed_*` methods populate tables directly,
//! [`mutation_count`](MemoryBackend::mutation_count) counts mutating
//! database calls (so tests can assert that a denied action never reached
//! the backend), and [`fail_next_with`](MemoryBackend::fail_next_with)
//! makes the next database call fail with a chosen error.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::{AuthSession, AuthUser, IdentityProvider};
use crate::db::Database;
use crate::error::{BackendError, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION};
use crate::models::{
    Cliente, Especialidade, NewCliente, NewProfile, ProfileSummary, ProfileUpdate, Profissional,
    RpcOutcome, UserProfile,
};

/// Error raised when a single-row read matches no row.
const NO_SINGLE_ROW: &str = "JSON object requested, multiple (or no) rows returned";

#[derive(Debug, Clone)]
struct ProfissionalRow {
    id: i64,
    profile_id: i64,
    especialidade_id: i64,
}

#[derive(Default)]
struct Tables {
    /// email -> (identity id, password)
    accounts: HashMap<String, (Uuid, String)>,
    unconfirmed: HashSet<String>,
    profiles: Vec<UserProfile>,
    especialidades: Vec<Especialidade>,
    profissionais: Vec<ProfissionalRow>,
    clientes: Vec<Cliente>,
    /// Client ids that have a linked appointment row.
    agendamentos: Vec<i64>,
    next_id: i64,
    mutations: u64,
    fail_next: Option<BackendError>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn take_failure(&mut self) -> Result<(), BackendError> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory stand-in for the hosted backend.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    session: Mutex<Option<AuthSession>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a confirmed account and return its identity.
    pub fn register(&self, email: &str, password: &str) -> AuthUser {
        let id = Uuid::new_v4();
        self.tables
            .lock()
            .unwrap()
            .accounts
            .insert(email.to_string(), (id, password.to_string()));
        AuthUser {
            id,
            email: email.to_string(),
        }
    }

    /// Register an account whose email has not been confirmed yet.
    pub fn register_unconfirmed(&self, email: &str, password: &str) -> AuthUser {
        let user = self.register(email, password);
        self.tables
            .lock()
            .unwrap()
            .unconfirmed
            .insert(email.to_string());
        user
    }

    pub fn seed_profile(&self, user_id: Uuid, nome: &str, role: &str) -> UserProfile {
        let mut tables = self.tables.lock().unwrap();
        let profile = UserProfile {
            id: tables.next_id(),
            created_at: Utc::now(),
            user_id,
            nome: Some(nome.to_string()),
            role: Some(role.to_string()),
        };
        tables.profiles.push(profile.clone());
        profile
    }

    pub fn seed_especialidade(&self, nome: &str) -> Especialidade {
        let mut tables = self.tables.lock().unwrap();
        let row = Especialidade {
            id: tables.next_id(),
            especialidade: nome.to_string(),
        };
        tables.especialidades.push(row.clone());
        row
    }

    pub fn seed_cliente(&self, cpf: &str, nome: &str) -> Cliente {
        let mut tables = self.tables.lock().unwrap();
        let row = Cliente {
            id: tables.next_id(),
            created_at: Utc::now(),
            cpf: Some(cpf.to_string()),
            nome: Some(nome.to_string()),
            endereco: None,
            email: None,
            telefone: None,
        };
        tables.clientes.push(row.clone());
        row
    }

    /// Link an appointment to a client so deleting it violates the fk.
    pub fn link_agendamento(&self, cliente_id: i64) {
        self.tables.lock().unwrap().agendamentos.push(cliente_id);
    }

    /// Number of mutating database calls issued so far.
    pub fn mutation_count(&self) -> u64 {
        self.tables.lock().unwrap().mutations
    }

    /// Make the next database call fail with `err`.
    pub fn fail_next_with(&self, err: BackendError) {
        self.tables.lock().unwrap().fail_next = Some(err);
    }

    fn no_single_row() -> BackendError {
        BackendError::with_code("PGRST116", NO_SINGLE_ROW)
    }

    fn duplicate_key(constraint: &str) -> BackendError {
        BackendError::with_code(
            UNIQUE_VIOLATION,
            format!("duplicate key value violates unique constraint \"{constraint}\""),
        )
    }

    fn fk_violation(table: &str, constraint: &str) -> BackendError {
        BackendError::with_code(
            FOREIGN_KEY_VIOLATION,
            format!(
                "update or delete on table \"{table}\" violates foreign key constraint \"{constraint}\""
            ),
        )
    }
}

impl IdentityProvider for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let session = {
            let tables = self.tables.lock().unwrap();
            match tables.accounts.get(email) {
                Some((id, stored)) if stored == password => {
                    if tables.unconfirmed.contains(email) {
                        return Err(BackendError::new("Email not confirmed"));
                    }
                    AuthSession {
                        user: AuthUser {
                            id: *id,
                            email: email.to_string(),
                        },
                        access_token: format!("token-{id}"),
                    }
                }
                _ => return Err(BackendError::new("Invalid login credentials")),
            }
        };
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        *self.session.lock().unwrap() = None;
        Ok(())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, BackendError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.accounts.contains_key(email) {
            return Err(BackendError::new("User already registered"));
        }
        let id = Uuid::new_v4();
        tables
            .accounts
            .insert(email.to_string(), (id, password.to_string()));
        Ok(AuthUser {
            id,
            email: email.to_string(),
        })
    }

    async fn reset_password(&self, _email: &str) -> Result<(), BackendError> {
        // The provider never discloses whether the address exists.
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session.lock().unwrap().as_ref().map(|s| s.user.clone())
    }
}

impl Database for MemoryBackend {
    async fn profile_by_user(&self, user_id: Uuid) -> Result<UserProfile, BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.take_failure()?;
        tables
            .profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned()
            .ok_or_else(Self::no_single_row)
    }

    async fn insert_profile(&self, profile: NewProfile) -> Result<UserProfile, BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.mutations += 1;
        tables.take_failure()?;
        if tables.profiles.iter().any(|p| p.user_id == profile.user_id) {
            return Err(Self::duplicate_key("ag_profiles_user_id_key"));
        }
        let row = UserProfile {
            id: tables.next_id(),
            created_at: Utc::now(),
            user_id: profile.user_id,
            nome: Some(profile.nome),
            role: Some(profile.role),
        };
        tables.profiles.push(row.clone());
        Ok(row)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        updates: ProfileUpdate,
    ) -> Result<UserProfile, BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.mutations += 1;
        tables.take_failure()?;
        let row = tables
            .profiles
            .iter_mut()
            .find(|p| p.user_id == user_id)
            .ok_or_else(Self::no_single_row)?;
        if let Some(nome) = updates.nome {
            row.nome = Some(nome);
        }
        if let Some(role) = updates.role {
            row.role = Some(role);
        }
        Ok(row.clone())
    }

    async fn list_especialidades(&self) -> Result<Vec<Especialidade>, BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.take_failure()?;
        let mut rows = tables.especialidades.clone();
        rows.sort_by(|a, b| a.especialidade.cmp(&b.especialidade));
        Ok(rows)
    }

    async fn add_especialidade(&self, especialidade: &str) -> Result<RpcOutcome, BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.mutations += 1;
        tables.take_failure()?;
        let nome = especialidade.trim();
        if nome.is_empty() {
            return Ok(RpcOutcome {
                success: false,
                message: "Especialidade não pode ser vazia".to_string(),
            });
        }
        let duplicate = tables
            .especialidades
            .iter()
            .any(|e| e.especialidade.eq_ignore_ascii_case(nome));
        if duplicate {
            return Ok(RpcOutcome {
                success: false,
                message: "Especialidade já cadastrada".to_string(),
            });
        }
        let id = tables.next_id();
        tables.especialidades.push(Especialidade {
            id,
            especialidade: nome.to_string(),
        });
        Ok(RpcOutcome {
            success: true,
            message: "Especialidade adicionada com sucesso".to_string(),
        })
    }

    async fn update_especialidade(
        &self,
        id: i64,
        especialidade: &str,
    ) -> Result<RpcOutcome, BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.mutations += 1;
        tables.take_failure()?;
        let nome = especialidade.trim();
        let duplicate = tables
            .especialidades
            .iter()
            .any(|e| e.id != id && e.especialidade.eq_ignore_ascii_case(nome));
        if duplicate {
            return Ok(RpcOutcome {
                success: false,
                message: "Especialidade já cadastrada".to_string(),
            });
        }
        match tables.especialidades.iter_mut().find(|e| e.id == id) {
            Some(row) => {
                row.especialidade = nome.to_string();
                Ok(RpcOutcome {
                    success: true,
                    message: "Especialidade atualizada com sucesso".to_string(),
                })
            }
            None => Ok(RpcOutcome {
                success: false,
                message: "Especialidade não encontrada".to_string(),
            }),
        }
    }

    async fn delete_especialidade(&self, id: i64) -> Result<(), BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.mutations += 1;
        tables.take_failure()?;
        if tables.profissionais.iter().any(|p| p.especialidade_id == id) {
            return Err(Self::fk_violation(
                "ag_especialidade",
                "ag_profissionais_especialidade_id_fkey",
            ));
        }
        tables.especialidades.retain(|e| e.id != id);
        Ok(())
    }

    async fn list_profissionais(&self) -> Result<Vec<Profissional>, BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.take_failure()?;
        let mut rows: Vec<Profissional> = tables
            .profissionais
            .iter()
            .filter_map(|p| {
                let profile = tables.profiles.iter().find(|pr| pr.id == p.profile_id)?;
                let especialidade = tables
                    .especialidades
                    .iter()
                    .find(|e| e.id == p.especialidade_id)?;
                Some(Profissional {
                    profissional_id: p.id,
                    profile_id: p.profile_id,
                    especialidade_id: p.especialidade_id,
                    profissional_nome: profile.display_name().to_string(),
                    profissional_especialidade: especialidade.especialidade.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| a.profissional_nome.cmp(&b.profissional_nome));
        Ok(rows)
    }

    async fn insert_profissional(
        &self,
        profile_id: i64,
        especialidade_id: i64,
    ) -> Result<(), BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.mutations += 1;
        tables.take_failure()?;
        if !tables.profiles.iter().any(|p| p.id == profile_id)
            || !tables.especialidades.iter().any(|e| e.id == especialidade_id)
        {
            return Err(Self::fk_violation(
                "ag_profissionais",
                "ag_profissionais_profile_id_fkey",
            ));
        }
        let duplicate = tables
            .profissionais
            .iter()
            .any(|p| p.profile_id == profile_id && p.especialidade_id == especialidade_id);
        if duplicate {
            return Err(Self::duplicate_key(
                "ag_profissionais_profile_id_especialidade_id_key",
            ));
        }
        let id = tables.next_id();
        tables.profissionais.push(ProfissionalRow {
            id,
            profile_id,
            especialidade_id,
        });
        Ok(())
    }

    async fn update_profissional(
        &self,
        profissional_id: i64,
        profile_id: i64,
        especialidade_id: i64,
    ) -> Result<(), BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.mutations += 1;
        tables.take_failure()?;
        if let Some(row) = tables
            .profissionais
            .iter_mut()
            .find(|p| p.id == profissional_id)
        {
            row.profile_id = profile_id;
            row.especialidade_id = especialidade_id;
        }
        Ok(())
    }

    async fn delete_profissional(&self, profissional_id: i64) -> Result<(), BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.mutations += 1;
        tables.take_failure()?;
        tables.profissionais.retain(|p| p.id != profissional_id);
        Ok(())
    }

    async fn list_profiles_if_admin(&self) -> Result<Vec<ProfileSummary>, BackendError> {
        let caller = self.current_user();
        let mut tables = self.tables.lock().unwrap();
        tables.take_failure()?;
        let is_admin = caller
            .and_then(|user| {
                tables
                    .profiles
                    .iter()
                    .find(|p| p.user_id == user.id)
                    .map(UserProfile::is_admin)
            })
            .unwrap_or(false);
        if !is_admin {
            return Err(BackendError::with_code(
                "42501",
                "permission denied for function ag_get_profiles_if_admin",
            ));
        }
        let mut rows: Vec<ProfileSummary> = tables
            .profiles
            .iter()
            .map(|p| ProfileSummary {
                id: p.id,
                nome: p.display_name().to_string(),
            })
            .collect();
        rows.sort_by(|a, b| a.nome.cmp(&b.nome));
        Ok(rows)
    }

    async fn list_clientes(&self) -> Result<Vec<Cliente>, BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.take_failure()?;
        let mut rows = tables.clientes.clone();
        rows.sort_by(|a, b| a.nome.cmp(&b.nome));
        Ok(rows)
    }

    async fn insert_cliente(&self, cliente: NewCliente) -> Result<(), BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.mutations += 1;
        tables.take_failure()?;
        let duplicate = tables
            .clientes
            .iter()
            .any(|c| c.cpf.as_deref() == Some(cliente.cpf.as_str()));
        if duplicate {
            return Err(Self::duplicate_key("ag_clientes_cpf_key"));
        }
        let id = tables.next_id();
        tables.clientes.push(Cliente {
            id,
            created_at: Utc::now(),
            cpf: Some(cliente.cpf),
            nome: Some(cliente.nome),
            endereco: cliente.endereco,
            email: cliente.email,
            telefone: cliente.telefone,
        });
        Ok(())
    }

    async fn update_cliente(&self, id: i64, cliente: NewCliente) -> Result<(), BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.mutations += 1;
        tables.take_failure()?;
        let duplicate = tables
            .clientes
            .iter()
            .any(|c| c.id != id && c.cpf.as_deref() == Some(cliente.cpf.as_str()));
        if duplicate {
            return Err(Self::duplicate_key("ag_clientes_cpf_key"));
        }
        if let Some(row) = tables.clientes.iter_mut().find(|c| c.id == id) {
            row.cpf = Some(cliente.cpf);
            row.nome = Some(cliente.nome);
            row.endereco = cliente.endereco;
            row.email = cliente.email;
            row.telefone = cliente.telefone;
        }
        Ok(())
    }

    async fn delete_cliente(&self, id: i64) -> Result<(), BackendError> {
        let mut tables = self.tables.lock().unwrap();
        tables.mutations += 1;
        tables.take_failure()?;
        if tables.agendamentos.contains(&id) {
            return Err(Self::fk_violation(
                "ag_clientes",
                "ag_agendamentos_cliente_id_fkey",
            ));
        }
        tables.clientes.retain(|c| c.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_in_round_trip() {
        let backend = MemoryBackend::new();
        backend.register("ana@example.com", "s3cret");

        assert!(backend.current_user().is_none());

        let session = backend.sign_in("ana@example.com", "s3cret").await.unwrap();
        assert_eq!(session.user.email, "ana@example.com");
        assert_eq!(backend.current_user().unwrap().id, session.user.id);

        backend.sign_out().await.unwrap();
        assert!(backend.current_user().is_none());
    }

    #[tokio::test]
    async fn sign_in_rejects_bad_password() {
        let backend = MemoryBackend::new();
        backend.register("ana@example.com", "s3cret");

        let err = backend
            .sign_in("ana@example.com", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.message, "Invalid login credentials");
    }

    #[tokio::test]
    async fn sign_in_rejects_unconfirmed_email() {
        let backend = MemoryBackend::new();
        backend.register_unconfirmed("ana@example.com", "s3cret");

        let err = backend
            .sign_in("ana@example.com", "s3cret")
            .await
            .unwrap_err();
        assert_eq!(err.message, "Email not confirmed");
    }

    #[tokio::test]
    async fn profile_lookup_requires_existing_row() {
        let backend = MemoryBackend::new();
        let user = backend.register("ana@example.com", "s3cret");

        assert!(backend.profile_by_user(user.id).await.is_err());

        backend.seed_profile(user.id, "Ana", "admin");
        let profile = backend.profile_by_user(user.id).await.unwrap();
        assert_eq!(profile.nome.as_deref(), Some("Ana"));
        assert!(profile.is_admin());
    }

    #[tokio::test]
    async fn duplicate_cpf_gets_unique_violation() {
        let backend = MemoryBackend::new();
        backend.seed_cliente("12345678901", "Ana");

        let err = backend
            .insert_cliente(NewCliente {
                cpf: "12345678901".into(),
                nome: "Outra Ana".into(),
                endereco: None,
                email: None,
                telefone: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
        assert!(err.message.contains("ag_clientes_cpf_key"));
    }

    #[tokio::test]
    async fn delete_linked_cliente_gets_fk_violation() {
        let backend = MemoryBackend::new();
        let cliente = backend.seed_cliente("12345678901", "Ana");
        backend.link_agendamento(cliente.id);

        let err = backend.delete_cliente(cliente.id).await.unwrap_err();
        assert!(err.is_foreign_key_violation());
    }

    #[tokio::test]
    async fn profile_listing_is_admin_gated() {
        let backend = MemoryBackend::new();
        let user = backend.register("ana@example.com", "s3cret");
        backend.seed_profile(user.id, "Ana", "user");
        backend.sign_in("ana@example.com", "s3cret").await.unwrap();

        assert!(backend.list_profiles_if_admin().await.is_err());
    }

    #[tokio::test]
    async fn especialidade_rpc_reports_duplicates_in_envelope() {
        let backend = MemoryBackend::new();

        let first = backend.add_especialidade("Cardiologia").await.unwrap();
        assert!(first.success);

        let second = backend.add_especialidade("cardiologia").await.unwrap();
        assert!(!second.success);
        assert_eq!(second.message, "Especialidade já cadastrada");
    }

    #[tokio::test]
    async fn listings_come_back_sorted_by_name() {
        let backend = MemoryBackend::new();
        backend.seed_especialidade("Pediatria");
        backend.seed_especialidade("Cardiologia");

        let rows = backend.list_especialidades().await.unwrap();
        let nomes: Vec<&str> = rows.iter().map(|e| e.especialidade.as_str()).collect();
        assert_eq!(nomes, vec!["Cardiologia", "Pediatria"]);
    }
}
