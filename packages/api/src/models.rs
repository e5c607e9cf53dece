//! # Domain models
//!
//! Row types for the scheduling tables, shared between the HTTP client,
//! the in-memory backend, and the state layer:
//!
//! - [`UserProfile`] — one row of `ag_profiles`, keyed by the external
//!   identity (`user_id`). Carries the display name and the role that
//!   gates admin-only mutations.
//! - [`Especialidade`] — a specialty (`ag_especialidade`), unique by name.
//! - [`Profissional`] — the denormalized join returned by the
//!   `ag_get_profissionais` procedure (profile × specialty).
//! - [`ProfileSummary`] — the restricted `{id, nome}` projection that the
//!   admin-gated `ag_get_profiles_if_admin` procedure returns.
//! - [`Cliente`] — one row of `ag_clientes`; `cpf` is stored digits-only
//!   and unique.
//!
//! Insert/update payloads ([`NewProfile`], [`ProfileUpdate`],
//! [`NewCliente`]) are separate types so generated columns (`id`,
//! `created_at`) never appear in a write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role assigned to an "admin" profile.
pub const ROLE_ADMIN: &str = "admin";
/// Role assigned to a "manager" profile.
pub const ROLE_MANAGER: &str = "manager";
/// Default role for freshly created profiles.
pub const ROLE_USER: &str = "user";

/// A user profile row, one per authenticated identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    /// External identity reference (auth provider user id).
    pub user_id: Uuid,
    pub nome: Option<String>,
    pub role: Option<String>,
}

impl UserProfile {
    /// Display name, falling back to "Usuário" when unset.
    pub fn display_name(&self) -> &str {
        self.nome.as_deref().unwrap_or("Usuário")
    }

    /// Role, falling back to "user" when unset.
    pub fn role_or_default(&self) -> &str {
        self.role.as_deref().unwrap_or(ROLE_USER)
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ROLE_ADMIN)
    }

    pub fn is_manager(&self) -> bool {
        self.role.as_deref() == Some(ROLE_MANAGER)
    }
}

/// Insert payload for `ag_profiles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub nome: String,
    pub role: String,
}

/// Partial update for `ag_profiles`; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A specialty, unique by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Especialidade {
    pub id: i64,
    pub especialidade: String,
}

/// Denormalized professional row: a profile joined to a specialty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profissional {
    pub profissional_id: i64,
    pub profile_id: i64,
    pub especialidade_id: i64,
    pub profissional_nome: String,
    pub profissional_especialidade: String,
}

/// Restricted profile projection visible only to admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: i64,
    pub nome: String,
}

/// A client row. `cpf` and `telefone` are stored digits-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cliente {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub cpf: Option<String>,
    pub nome: Option<String>,
    pub endereco: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
}

/// Insert/update payload for `ag_clientes`. Values are expected to be
/// normalized already (trimmed names, digits-only cpf/telefone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCliente {
    pub cpf: String,
    pub nome: String,
    pub endereco: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
}

/// Envelope returned by the specialty add/update stored procedures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcOutcome {
    pub success: bool,
    pub message: String,
}
