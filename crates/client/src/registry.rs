//! Service registry: list, create and delete cultos.

use iicgp_core::culto::{Culto, NewCulto};
use iicgp_core::member::{known_branches, Branch};
use iicgp_core::types::DbId;

use crate::api::IicgpApi;
use crate::error::{ClientError, ClientResult};

pub const DELETE_CULTO_PROMPT: &str = "Tens a certeza que queres apagar este culto?";
pub const MSG_CREATE_FAILED: &str = "Erro ao criar culto";
pub const MSG_DELETE_FAILED: &str = "Erro ao apagar culto";
pub const MSG_LIST_FAILED: &str = "Erro ao carregar cultos";

/// Interactive confirmation for destructive actions.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Confirmation given up front (e.g. `--yes`).
pub struct PreConfirmed;

impl Confirm for PreConfirmed {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

pub struct ServiceRegistry {
    api: IicgpApi,
}

impl ServiceRegistry {
    pub fn new(api: IicgpApi) -> Self {
        Self { api }
    }

    /// All cultos in backend order. An empty list is a valid result.
    pub async fn list(&self) -> ClientResult<Vec<Culto>> {
        let cultos = self.api.list_cultos().await?;
        tracing::debug!(count = cultos.len(), "Loaded cultos");
        Ok(cultos)
    }

    /// Validate locally, then create. Nothing is sent when validation fails.
    ///
    /// Callers refetch [`list`](Self::list) afterwards to pick up the
    /// backend-side fields.
    pub async fn create(&self, form: NewCulto) -> ClientResult<Culto> {
        let body = form.into_request()?;
        let culto = self.api.create_culto(&body).await?;
        tracing::info!(culto_id = culto.id, tipo = %culto.tipo, data = %culto.data, "Culto created");
        Ok(culto)
    }

    /// Delete a culto after `confirm` agrees. The backend drops its presence
    /// marks with it.
    pub async fn delete(&self, culto_id: DbId, confirm: &dyn Confirm) -> ClientResult<()> {
        if !confirm.confirm(DELETE_CULTO_PROMPT) {
            tracing::debug!(culto_id, "Delete declined");
            return Err(ClientError::Cancelled);
        }
        self.api.delete_culto(culto_id).await?;
        tracing::info!(culto_id, "Culto deleted");
        Ok(())
    }

    /// Branches for the create form, falling back to the built-in list.
    pub async fn branches(&self) -> Vec<Branch> {
        match self.api.list_branches().await {
            Ok(branches) if !branches.is_empty() => branches,
            Ok(_) => known_branches(),
            Err(err) => {
                tracing::warn!(error = %err, "Branch listing failed, using built-in list");
                known_branches()
            }
        }
    }
}
