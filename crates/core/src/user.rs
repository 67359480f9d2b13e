//! The authenticated operator, as reported by `/auth/me`.

use serde::{Deserialize, Serialize};

use crate::roles::{role_label, RoleId};
use crate::types::DbId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: DbId,
    pub username: String,
    pub role_id: RoleId,
    #[serde(default)]
    pub role_nome: Option<String>,
    #[serde(default = "default_active")]
    pub ativo: bool,
    #[serde(default)]
    pub data_criacao: Option<String>,
}

fn default_active() -> bool {
    true
}

impl CurrentUser {
    /// Role name from the backend join, falling back to the local label.
    pub fn role_display(&self) -> &str {
        self.role_nome
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| role_label(self.role_id))
    }
}

/// Credentials posted to `/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
