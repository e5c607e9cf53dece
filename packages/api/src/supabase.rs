//! # Hosted backend client
//!
//! [`SupabaseBackend`] implements both boundary traits over HTTP against a
//! Supabase-style project: GoTrue for authentication and PostgREST for the
//! scheduling tables and stored procedures.
//!
//! ## Auth endpoints
//!
//! | Call | Endpoint |
//! |------|----------|
//! | [`sign_in`](IdentityProvider::sign_in) | `POST /auth/v1/token?grant_type=password` |
//! | [`sign_up`](IdentityProvider::sign_up) | `POST /auth/v1/signup` |
//! | [`reset_password`](IdentityProvider::reset_password) | `POST /auth/v1/recover` |
//! | [`sign_out`](IdentityProvider::sign_out) | `POST /auth/v1/logout` |
//!
//! The active [`AuthSession`] is kept behind an `RwLock`; its bearer token
//! is attached to every table/procedure call (falling back to the anon key
//! when signed out, so row-level security still applies server-side).
//!
//! ## Table and procedure calls
//!
//! PostgREST conventions: equality filters as `column=eq.value` query
//! parameters, ordering as `order=column`, single-row reads via the
//! `Accept: application/vnd.pgrst.object+json` header, and writes that
//! need the row back via `Prefer: return=representation`. Stored
//! procedures are `POST /rest/v1/rpc/<name>` with a JSON argument object.
//!
//! Non-2xx responses are parsed into [`BackendError`] (SQLSTATE code
//! preserved); transport failures map to a generic connection message.

use std::sync::RwLock;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{AuthSession, AuthUser, IdentityProvider};
use crate::config::ApiConfig;
use crate::db::Database;
use crate::error::{BackendError, ErrorBody};
use crate::models::{
    Cliente, Especialidade, NewCliente, NewProfile, ProfileSummary, ProfileUpdate, Profissional,
    RpcOutcome, UserProfile,
};

/// Message surfaced when the backend cannot be reached at all.
pub const CONNECTION_ERROR: &str = "Erro ao conectar com o servidor";

/// HTTP client for the hosted auth + database service.
pub struct SupabaseBackend {
    http: reqwest::Client,
    config: ApiConfig,
    session: RwLock<Option<AuthSession>>,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: Uuid,
    email: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: GoTrueUser,
}

/// `/signup` returns the bare user when email confirmation is pending,
/// or a full token payload when the project auto-confirms.
#[derive(Debug, Deserialize)]
struct SignUpResponse {
    id: Option<Uuid>,
    email: Option<String>,
    user: Option<GoTrueUser>,
}

impl SupabaseBackend {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            session: RwLock::new(None),
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url, table)
    }

    fn bearer_token(&self) -> String {
        self.session
            .read()
            .unwrap()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    /// Request builder for a table endpoint with the standard headers.
    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, self.rest_url(table))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.bearer_token())
    }

    /// Request builder for a stored-procedure endpoint.
    fn rpc(&self, name: &str) -> RequestBuilder {
        self.table(Method::POST, &format!("rpc/{name}"))
    }

    async fn send(request: RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!("backend request failed: {e}");
            BackendError::new(CONNECTION_ERROR)
        })?;
        if response.status().is_success() {
            return Ok(response);
        }
        let raw = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&raw).unwrap_or_default();
        Err(body.into_backend_error(&raw))
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, BackendError> {
        let response = Self::send(request).await?;
        response.json().await.map_err(|e| {
            tracing::error!("backend returned malformed payload: {e}");
            BackendError::new(CONNECTION_ERROR)
        })
    }

    /// Reads/writes that must yield exactly one row.
    fn single(request: RequestBuilder) -> RequestBuilder {
        request.header("Accept", "application/vnd.pgrst.object+json")
    }
}

impl IdentityProvider for SupabaseBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let request = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }));
        let token: TokenResponse = Self::send_json(request).await?;
        let session = AuthSession {
            user: AuthUser {
                id: token.user.id,
                email: token.user.email,
            },
            access_token: token.access_token,
        };
        *self.session.write().unwrap() = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        if self.session.read().unwrap().is_some() {
            let request = self
                .http
                .post(self.auth_url("logout"))
                .header("apikey", &self.config.anon_key)
                .bearer_auth(self.bearer_token());
            Self::send(request).await?;
        }
        *self.session.write().unwrap() = None;
        Ok(())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, BackendError> {
        let request = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }));
        let created: SignUpResponse = Self::send_json(request).await?;
        match created_parts(created) {
            Some((id, email)) => Ok(AuthUser { id, email }),
            None => Err(BackendError::new("signup returned no user")),
        }
    }

    async fn reset_password(&self, email: &str) -> Result<(), BackendError> {
        let request = self
            .http
            .post(self.auth_url("recover"))
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email }));
        Self::send(request).await?;
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session.read().unwrap().as_ref().map(|s| s.user.clone())
    }
}

fn created_parts(response: SignUpResponse) -> Option<(Uuid, String)> {
    if let Some(user) = response.user {
        return Some((user.id, user.email));
    }
    Some((response.id?, response.email?))
}

impl Database for SupabaseBackend {
    async fn profile_by_user(&self, user_id: Uuid) -> Result<UserProfile, BackendError> {
        let filter = format!("eq.{user_id}");
        let request = self
            .table(Method::GET, "ag_profiles")
            .query(&[("select", "*"), ("user_id", filter.as_str())]);
        Self::send_json(Self::single(request)).await
    }

    async fn insert_profile(&self, profile: NewProfile) -> Result<UserProfile, BackendError> {
        let request = self
            .table(Method::POST, "ag_profiles")
            .header("Prefer", "return=representation")
            .json(&profile);
        Self::send_json(Self::single(request)).await
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        updates: ProfileUpdate,
    ) -> Result<UserProfile, BackendError> {
        let request = self
            .table(Method::PATCH, "ag_profiles")
            .query(&[("user_id", &format!("eq.{user_id}"))])
            .header("Prefer", "return=representation")
            .json(&updates);
        Self::send_json(Self::single(request)).await
    }

    async fn list_especialidades(&self) -> Result<Vec<Especialidade>, BackendError> {
        let request = self
            .table(Method::GET, "ag_especialidade")
            .query(&[("select", "id,especialidade"), ("order", "especialidade")]);
        Self::send_json(request).await
    }

    async fn add_especialidade(&self, especialidade: &str) -> Result<RpcOutcome, BackendError> {
        let request = self
            .rpc("ag_add_especialidade")
            .json(&serde_json::json!({ "_especialidade": especialidade }));
        Self::send_json(request).await
    }

    async fn update_especialidade(
        &self,
        id: i64,
        especialidade: &str,
    ) -> Result<RpcOutcome, BackendError> {
        let request = self
            .rpc("ag_update_especialidade")
            .json(&serde_json::json!({ "_id": id, "_especialidade": especialidade }));
        Self::send_json(request).await
    }

    async fn delete_especialidade(&self, id: i64) -> Result<(), BackendError> {
        let request = self
            .table(Method::DELETE, "ag_especialidade")
            .query(&[("id", &format!("eq.{id}"))]);
        Self::send(request).await.map(|_| ())
    }

    async fn list_profissionais(&self) -> Result<Vec<Profissional>, BackendError> {
        Self::send_json(self.rpc("ag_get_profissionais").json(&serde_json::json!({}))).await
    }

    async fn insert_profissional(
        &self,
        profile_id: i64,
        especialidade_id: i64,
    ) -> Result<(), BackendError> {
        let request = self.table(Method::POST, "ag_profissionais").json(
            &serde_json::json!({ "profile_id": profile_id, "especialidade_id": especialidade_id }),
        );
        Self::send(request).await.map(|_| ())
    }

    async fn update_profissional(
        &self,
        profissional_id: i64,
        profile_id: i64,
        especialidade_id: i64,
    ) -> Result<(), BackendError> {
        let request = self
            .table(Method::PATCH, "ag_profissionais")
            .query(&[("id", &format!("eq.{profissional_id}"))])
            .json(&serde_json::json!({ "profile_id": profile_id, "especialidade_id": especialidade_id }));
        Self::send(request).await.map(|_| ())
    }

    async fn delete_profissional(&self, profissional_id: i64) -> Result<(), BackendError> {
        let request = self
            .table(Method::DELETE, "ag_profissionais")
            .query(&[("id", &format!("eq.{profissional_id}"))]);
        Self::send(request).await.map(|_| ())
    }

    async fn list_profiles_if_admin(&self) -> Result<Vec<ProfileSummary>, BackendError> {
        Self::send_json(
            self.rpc("ag_get_profiles_if_admin")
                .json(&serde_json::json!({})),
        )
        .await
    }

    async fn list_clientes(&self) -> Result<Vec<Cliente>, BackendError> {
        let request = self.table(Method::GET, "ag_clientes").query(&[
            ("select", "id,created_at,cpf,nome,endereco,email,telefone"),
            ("order", "nome"),
        ]);
        Self::send_json(request).await
    }

    async fn insert_cliente(&self, cliente: NewCliente) -> Result<(), BackendError> {
        let request = self.table(Method::POST, "ag_clientes").json(&cliente);
        Self::send(request).await.map(|_| ())
    }

    async fn update_cliente(&self, id: i64, cliente: NewCliente) -> Result<(), BackendError> {
        let request = self
            .table(Method::PATCH, "ag_clientes")
            .query(&[("id", &format!("eq.{id}"))])
            .json(&cliente);
        Self::send(request).await.map(|_| ())
    }

    async fn delete_cliente(&self, id: i64) -> Result<(), BackendError> {
        let request = self
            .table(Method::DELETE, "ag_clientes")
            .query(&[("id", &format!("eq.{id}"))]);
        Self::send(request).await.map(|_| ())
    }
}
