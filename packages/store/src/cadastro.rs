//! # Cadastro store — specialties, professionals, profiles, clients
//!
//! One store for the four registration collections, each following the
//! same template:
//!
//! - `fetch_*` replaces the in-memory list with the backend's full
//!   ordered list; on failure the list becomes empty and the message is
//!   recorded in the shared [`error`](CadastroStore::error) field.
//! - Mutations validate first (role for specialties/professionals,
//!   required fields and digit counts for clients), normalize free-text
//!   input, issue the backend call, and on success refetch the whole
//!   list. The refetch costs one extra round trip per write; in exchange
//!   the list always reflects server-side defaults (generated ids,
//!   timestamps). No created row is returned to the caller — observers
//!   read the refreshed list.
//! - Every mutation returns an [`Outcome`] envelope; nothing raises past
//!   the store. Known constraint violations (duplicate CPF, client with
//!   linked appointments) are rewritten into domain messages; other
//!   backend errors pass their message through.
//!
//! The admin check before specialty/professional mutations is a UX
//! convenience; the backend enforces authorization on its side.

use std::sync::{Arc, RwLock};

use api::{
    Cliente, Database, Especialidade, IdentityProvider, NewCliente, ProfileSummary, Profissional,
    RpcOutcome,
};

use crate::user::UserStore;
use crate::validate;

pub const MSG_CPF_NOME_REQUIRED: &str = "CPF e nome são campos obrigatórios.";
pub const MSG_CPF_LENGTH: &str = "CPF deve ter 11 dígitos.";
pub const MSG_TELEFONE_LENGTH: &str = "Telefone deve ter 10 ou 11 dígitos.";
pub const MSG_CPF_TAKEN_INSERT: &str = "Este CPF já está cadastrado no sistema.";
pub const MSG_CPF_TAKEN_UPDATE: &str = "Este CPF já está sendo usado por outro cliente.";
pub const MSG_CLIENTE_HAS_AGENDAMENTOS: &str =
    "Não é possível deletar este cliente pois ele possui agendamentos vinculados.";

/// Result envelope returned by every mutating action.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<RpcOutcome> for Outcome {
    fn from(rpc: RpcOutcome) -> Self {
        Self {
            success: rpc.success,
            message: rpc.message,
        }
    }
}

#[derive(Default)]
struct CadastroState {
    especialidades: Vec<Especialidade>,
    profissionais: Vec<Profissional>,
    profiles: Vec<ProfileSummary>,
    clientes: Vec<Cliente>,
    loading: bool,
    error: Option<String>,
}

/// Shared collections for the registration screens. The store owns the
/// lists exclusively; consumers read snapshots through the accessors.
pub struct CadastroStore<B> {
    backend: Arc<B>,
    users: Arc<UserStore<B>>,
    state: RwLock<CadastroState>,
}

impl<B: IdentityProvider + Database> CadastroStore<B> {
    pub fn new(backend: Arc<B>, users: Arc<UserStore<B>>) -> Self {
        Self {
            backend,
            users,
            state: RwLock::new(CadastroState::default()),
        }
    }

    // Observable state.

    pub fn especialidades(&self) -> Vec<Especialidade> {
        self.state.read().unwrap().especialidades.clone()
    }

    pub fn profissionais(&self) -> Vec<Profissional> {
        self.state.read().unwrap().profissionais.clone()
    }

    pub fn profiles(&self) -> Vec<ProfileSummary> {
        self.state.read().unwrap().profiles.clone()
    }

    pub fn clientes(&self) -> Vec<Cliente> {
        self.state.read().unwrap().clientes.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.read().unwrap().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().unwrap().error.clone()
    }

    // Fetches.

    pub async fn fetch_especialidades(&self) {
        self.begin();
        let result = self.backend.list_especialidades().await;
        let mut state = self.state.write().unwrap();
        state.loading = false;
        match result {
            Ok(rows) => state.especialidades = rows,
            Err(err) => {
                tracing::error!("failed to fetch especialidades: {err}");
                state.especialidades = Vec::new();
                state.error = Some(err.message);
            }
        }
    }

    pub async fn fetch_profissionais(&self) {
        self.begin();
        let result = self.backend.list_profissionais().await;
        let mut state = self.state.write().unwrap();
        state.loading = false;
        match result {
            Ok(rows) => state.profissionais = rows,
            Err(err) => {
                tracing::error!("failed to fetch profissionais: {err}");
                state.profissionais = Vec::new();
                state.error = Some(err.message);
            }
        }
    }

    /// Admin-only listing; authorization is enforced by the backend.
    pub async fn fetch_profiles(&self) {
        self.begin();
        let result = self.backend.list_profiles_if_admin().await;
        let mut state = self.state.write().unwrap();
        state.loading = false;
        match result {
            Ok(rows) => state.profiles = rows,
            Err(err) => {
                tracing::error!("failed to fetch profiles: {err}");
                state.profiles = Vec::new();
                state.error = Some(err.message);
            }
        }
    }

    pub async fn fetch_clientes(&self) {
        self.begin();
        let result = self.backend.list_clientes().await;
        let mut state = self.state.write().unwrap();
        state.loading = false;
        match result {
            Ok(rows) => state.clientes = rows,
            Err(err) => {
                tracing::error!("failed to fetch clientes: {err}");
                state.clientes = Vec::new();
                state.error = Some(err.message);
            }
        }
    }

    // Especialidades.

    /// Admin-only. The stored procedure returns its own envelope; the
    /// list is refreshed only when it reports success.
    pub async fn add_especialidade(&self, especialidade: &str) -> Outcome {
        if let Err(denied) = self.require_admin("adicionar especialidades") {
            return denied;
        }
        match self.backend.add_especialidade(especialidade.trim()).await {
            Ok(rpc) => {
                if rpc.success {
                    self.fetch_especialidades().await;
                }
                rpc.into()
            }
            Err(err) => {
                tracing::error!("failed to add especialidade: {err}");
                Outcome::fail(err.message)
            }
        }
    }

    /// Admin-only.
    pub async fn update_especialidade(&self, id: i64, especialidade: &str) -> Outcome {
        if let Err(denied) = self.require_admin("editar especialidades") {
            return denied;
        }
        match self
            .backend
            .update_especialidade(id, especialidade.trim())
            .await
        {
            Ok(rpc) => {
                if rpc.success {
                    self.fetch_especialidades().await;
                }
                rpc.into()
            }
            Err(err) => {
                tracing::error!("failed to update especialidade: {err}");
                Outcome::fail(err.message)
            }
        }
    }

    /// Admin-only.
    pub async fn delete_especialidade(&self, id: i64) -> Outcome {
        if let Err(denied) = self.require_admin("deletar especialidades") {
            return denied;
        }
        match self.backend.delete_especialidade(id).await {
            Ok(()) => {
                self.fetch_especialidades().await;
                Outcome::ok("Especialidade deletada com sucesso")
            }
            Err(err) => {
                tracing::error!("failed to delete especialidade: {err}");
                Outcome::fail(err.message)
            }
        }
    }

    // Profissionais.

    /// Admin-only. The (profile, especialidade) pair must be unique;
    /// the backend reports violations.
    pub async fn add_profissional(&self, profile_id: i64, especialidade_id: i64) -> Outcome {
        if let Err(denied) = self.require_admin("adicionar profissionais") {
            return denied;
        }
        match self
            .backend
            .insert_profissional(profile_id, especialidade_id)
            .await
        {
            Ok(()) => {
                self.fetch_profissionais().await;
                Outcome::ok("Profissional adicionado com sucesso")
            }
            Err(err) => {
                tracing::error!("failed to add profissional: {err}");
                Outcome::fail(err.message)
            }
        }
    }

    /// Admin-only.
    pub async fn update_profissional(
        &self,
        profissional_id: i64,
        profile_id: i64,
        especialidade_id: i64,
    ) -> Outcome {
        if let Err(denied) = self.require_admin("editar profissionais") {
            return denied;
        }
        match self
            .backend
            .update_profissional(profissional_id, profile_id, especialidade_id)
            .await
        {
            Ok(()) => {
                self.fetch_profissionais().await;
                Outcome::ok("Profissional atualizado com sucesso")
            }
            Err(err) => {
                tracing::error!("failed to update profissional: {err}");
                Outcome::fail(err.message)
            }
        }
    }

    /// Admin-only.
    pub async fn delete_profissional(&self, profissional_id: i64) -> Outcome {
        if let Err(denied) = self.require_admin("deletar profissionais") {
            return denied;
        }
        match self.backend.delete_profissional(profissional_id).await {
            Ok(()) => {
                self.fetch_profissionais().await;
                Outcome::ok("Profissional deletado com sucesso")
            }
            Err(err) => {
                tracing::error!("failed to delete profissional: {err}");
                Outcome::fail(err.message)
            }
        }
    }

    // Clientes.

    pub async fn add_cliente(
        &self,
        cpf: &str,
        nome: &str,
        endereco: Option<&str>,
        email: Option<&str>,
        telefone: Option<&str>,
    ) -> Outcome {
        let cliente = match build_cliente(cpf, nome, endereco, email, telefone) {
            Ok(cliente) => cliente,
            Err(invalid) => return invalid,
        };
        match self.backend.insert_cliente(cliente).await {
            Ok(()) => {
                self.fetch_clientes().await;
                Outcome::ok("Cliente adicionado com sucesso")
            }
            Err(err) => {
                tracing::error!("failed to add cliente: {err}");
                if err.is_unique_violation() && err.message.contains("ag_clientes_cpf_key") {
                    return Outcome::fail(MSG_CPF_TAKEN_INSERT);
                }
                Outcome::fail(err.message)
            }
        }
    }

    pub async fn update_cliente(
        &self,
        cliente_id: i64,
        cpf: &str,
        nome: &str,
        endereco: Option<&str>,
        email: Option<&str>,
        telefone: Option<&str>,
    ) -> Outcome {
        let cliente = match build_cliente(cpf, nome, endereco, email, telefone) {
            Ok(cliente) => cliente,
            Err(invalid) => return invalid,
        };
        match self.backend.update_cliente(cliente_id, cliente).await {
            Ok(()) => {
                self.fetch_clientes().await;
                Outcome::ok("Cliente atualizado com sucesso")
            }
            Err(err) => {
                tracing::error!("failed to update cliente: {err}");
                if err.is_unique_violation() && err.message.contains("ag_clientes_cpf_key") {
                    return Outcome::fail(MSG_CPF_TAKEN_UPDATE);
                }
                Outcome::fail(err.message)
            }
        }
    }

    pub async fn delete_cliente(&self, cliente_id: i64) -> Outcome {
        match self.backend.delete_cliente(cliente_id).await {
            Ok(()) => {
                self.fetch_clientes().await;
                Outcome::ok("Cliente deletado com sucesso")
            }
            Err(err) => {
                tracing::error!("failed to delete cliente: {err}");
                if err.is_foreign_key_violation() {
                    return Outcome::fail(MSG_CLIENTE_HAS_AGENDAMENTOS);
                }
                Outcome::fail(err.message)
            }
        }
    }

    /// Single authorization guard for all admin-gated mutations. Advisory
    /// only — the backend is the authoritative check.
    fn require_admin(&self, action: &str) -> Result<(), Outcome> {
        if self.users.is_admin() {
            Ok(())
        } else {
            Err(Outcome::fail(format!(
                "Acesso negado. Apenas administradores podem {action}."
            )))
        }
    }

    fn begin(&self) {
        let mut state = self.state.write().unwrap();
        state.loading = true;
        state.error = None;
    }
}

/// Validate and normalize a client payload: cpf/nome mandatory, cpf must
/// strip to 11 digits, telefone (when given) to 10 or 11.
fn build_cliente(
    cpf: &str,
    nome: &str,
    endereco: Option<&str>,
    email: Option<&str>,
    telefone: Option<&str>,
) -> Result<NewCliente, Outcome> {
    if cpf.trim().is_empty() || nome.trim().is_empty() {
        return Err(Outcome::fail(MSG_CPF_NOME_REQUIRED));
    }
    let cpf = validate::digits(cpf);
    if !validate::is_valid_cpf(&cpf) {
        return Err(Outcome::fail(MSG_CPF_LENGTH));
    }
    let telefone = match validate::clean_optional(telefone) {
        Some(raw) => {
            let digits = validate::digits(&raw);
            if !validate::is_valid_telefone(&digits) {
                return Err(Outcome::fail(MSG_TELEFONE_LENGTH));
            }
            Some(digits)
        }
        None => None,
    };
    Ok(NewCliente {
        cpf,
        nome: nome.trim().to_string(),
        endereco: validate::clean_optional(endereco),
        email: validate::clean_optional(email),
        telefone,
    })
}
