//! REST client for the IICGP backend.
//!
//! Wraps the HTTP endpoints the attendance workflow uses with [`reqwest`].
//! Every call except login carries the session's bearer token; a 401 on an
//! authenticated call clears the session before the error is returned.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use iicgp_core::culto::{CreateCultoRequest, Culto, CultoList};
use iicgp_core::dashboard::{
    BestCulto, CultoAttendance, Dados, GeneralStats, GeneralStatsEnvelope, MemberAbsenceRank,
    MemberAttendanceRank, MonthlyAttendance,
};
use iicgp_core::member::Branch;
use iicgp_core::presence::{RosterPayload, SavePresencesRequest};
use iicgp_core::types::DbId;
use iicgp_core::user::{CurrentUser, LoginRequest, LoginResponse};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;

/// Multipart field the import endpoint reads the spreadsheet from.
pub const IMPORT_FIELD: &str = "ficheiro";

/// Header carrying a per-request correlation id.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Response of `POST /api/cultos/{id}/importar`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
struct BranchList {
    #[serde(default)]
    branches: Vec<Branch>,
}

/// Error bodies come as `{error}` or `{message}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// HTTP client for one IICGP backend.
///
/// Cheap to clone: the connection pool and the session are shared.
#[derive(Clone)]
pub struct IicgpApi {
    client: reqwest::Client,
    api_url: String,
    session: Session,
}

impl IicgpApi {
    /// Build a client from configuration, bound to `session`.
    pub fn new(config: &ClientConfig, session: Session) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config.api_url.clone(), session))
    }

    /// Build a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String, session: Session) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- auth ----

    /// `POST /auth/login`. Not authenticated; a rejection is a
    /// [`ClientError::Server`] carrying the backend's message.
    pub async fn login(&self, credentials: &LoginRequest) -> ClientResult<LoginResponse> {
        let request = self
            .client
            .post(self.url("/auth/login"))
            .json(credentials);
        let response = Self::dispatch(request).await?;
        Self::parse_response(response).await
    }

    /// `GET /auth/me` with an explicit token, used while resolving a session.
    pub async fn me_with_token(&self, token: &str) -> ClientResult<CurrentUser> {
        let request = self.client.get(self.url("/auth/me")).bearer_auth(token);
        let response = Self::dispatch(request).await?;
        Self::parse_response(response).await
    }

    // ---- cultos ----

    /// `GET /api/cultos`.
    pub async fn list_cultos(&self) -> ClientResult<Vec<Culto>> {
        let list: CultoList = self.get_json("/api/cultos").await?;
        Ok(list.cultos)
    }

    /// `POST /api/cultos`. The body must already be validated.
    pub async fn create_culto(&self, body: &CreateCultoRequest) -> ClientResult<Culto> {
        let response = self
            .send(self.authed(Method::POST, "/api/cultos").json(body))
            .await?;
        let value: serde_json::Value = Self::parse_response(response).await?;
        decode_created_culto(value)
    }

    /// `DELETE /api/cultos/{id}`.
    pub async fn delete_culto(&self, culto_id: DbId) -> ClientResult<()> {
        let response = self
            .send(self.authed(Method::DELETE, &format!("/api/cultos/{culto_id}")))
            .await?;
        Self::check_status(response).await
    }

    /// `GET /api/membros/branches`.
    pub async fn list_branches(&self) -> ClientResult<Vec<Branch>> {
        let list: BranchList = self.get_json("/api/membros/branches").await?;
        Ok(list.branches)
    }

    // ---- presences ----

    /// `GET /api/cultos/{id}/presencas`: full roster plus backend snapshot.
    pub async fn load_presences(&self, culto_id: DbId) -> ClientResult<RosterPayload> {
        self.get_json(&format!("/api/cultos/{culto_id}/presencas"))
            .await
    }

    /// `POST /api/cultos/{id}/presencas`: replaces every mark of the culto.
    pub async fn save_presences(
        &self,
        culto_id: DbId,
        body: &SavePresencesRequest,
    ) -> ClientResult<()> {
        let path = format!("/api/cultos/{culto_id}/presencas");
        let response = self.send(self.authed(Method::POST, &path).json(body)).await?;
        Self::check_status(response).await
    }

    /// `POST /api/cultos/{id}/importar` with the file as multipart field
    /// [`IMPORT_FIELD`]. Contents are not inspected client-side.
    pub async fn import_presences(
        &self,
        culto_id: DbId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<ImportResponse> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part(IMPORT_FIELD, part);

        let path = format!("/api/cultos/{culto_id}/importar");
        let response = self
            .send(self.authed(Method::POST, &path).multipart(form))
            .await?;
        Self::parse_response(response)
            .await
            .map_err(ClientError::into_import)
    }

    // ---- dashboard stats ----

    pub async fn stats_general(&self) -> ClientResult<GeneralStats> {
        let env: GeneralStatsEnvelope = self.get_json("/api/cultos/stats/gerais").await?;
        Ok(env.stats)
    }

    pub async fn stats_by_month(&self) -> ClientResult<Vec<MonthlyAttendance>> {
        self.get_dados("/api/cultos/stats/por-mes").await
    }

    /// Per-culto figures, newest first as served.
    pub async fn stats_by_culto(&self) -> ClientResult<Vec<CultoAttendance>> {
        self.get_dados("/api/cultos/stats/por-culto").await
    }

    pub async fn stats_most_present(&self) -> ClientResult<Vec<MemberAttendanceRank>> {
        self.get_dados("/api/cultos/stats/mais-assiduos").await
    }

    pub async fn stats_most_absent(&self) -> ClientResult<Vec<MemberAbsenceRank>> {
        self.get_dados("/api/cultos/stats/mais-faltas").await
    }

    pub async fn stats_best_cultos(&self) -> ClientResult<Vec<BestCulto>> {
        self.get_dados("/api/cultos/stats/melhor-culto").await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// A request with the session token and a fresh correlation id attached.
    fn authed(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method.clone(), self.url(path))
            .header(REQUEST_ID_HEADER, uuid::Uuid::new_v4().to_string());
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        tracing::debug!(method = %method, path, "Dispatching request");
        request
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.send(self.authed(Method::GET, path)).await?;
        Self::parse_response(response).await
    }

    async fn get_dados<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Vec<T>> {
        let dados: Dados<T> = self.get_json(path).await?;
        Ok(dados.dados)
    }

    /// Send an authenticated request. A 401 clears the session (forced
    /// logout) and becomes [`ClientError::Unauthorized`].
    async fn send(&self, request: RequestBuilder) -> ClientResult<reqwest::Response> {
        let response = Self::dispatch(request).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %response.url(), "Token rejected, clearing session");
            self.session.expire();
            return Err(ClientError::Unauthorized);
        }
        Ok(response)
    }

    async fn dispatch(request: RequestBuilder) -> ClientResult<reqwest::Response> {
        request.send().await.map_err(ClientError::Network)
    }

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or a [`ClientError::Server`] carrying the
    /// server-provided message (if any) on failure.
    async fn ensure_success(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let message = parsed.error.or(parsed.message);
        tracing::warn!(status = status.as_u16(), message = ?message, "Request failed");
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await.map_err(ClientError::Network)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(error = %e, "Response body did not match the expected shape");
            ClientError::Decode(e.to_string())
        })
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> ClientResult<()> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// The create endpoint answers either with the bare record or wrapped as
/// `{culto: {...}}`.
fn decode_created_culto(value: serde_json::Value) -> ClientResult<Culto> {
    let record = match value {
        serde_json::Value::Object(mut map) if map.contains_key("culto") => map
            .remove("culto")
            .unwrap_or(serde_json::Value::Null),
        other => other,
    };
    serde_json::from_value(record).map_err(|e| ClientError::Decode(e.to_string()))
}
