//! Statistics dashboard loader.

use iicgp_core::dashboard::DashboardStats;

use crate::api::IicgpApi;
use crate::error::ClientResult;

pub struct DashboardClient {
    api: IicgpApi,
}

impl DashboardClient {
    pub fn new(api: IicgpApi) -> Self {
        Self { api }
    }

    /// Fetch every dashboard section concurrently.
    ///
    /// Sections fail independently: a failed request leaves its section
    /// `None` and is logged, the rest still render.
    pub async fn fetch_all(&self) -> DashboardStats {
        let (gerais, por_mes, por_culto, mais_assiduos, mais_faltas, melhor_culto) = tokio::join!(
            self.api.stats_general(),
            self.api.stats_by_month(),
            self.api.stats_by_culto(),
            self.api.stats_most_present(),
            self.api.stats_most_absent(),
            self.api.stats_best_cultos(),
        );

        DashboardStats {
            gerais: section("gerais", gerais),
            por_mes: section("por-mes", por_mes),
            por_culto: section("por-culto", por_culto).map(|mut rows| {
                rows.reverse();
                rows
            }),
            mais_assiduos: section("mais-assiduos", mais_assiduos),
            mais_faltas: section("mais-faltas", mais_faltas),
            melhor_culto: section("melhor-culto", melhor_culto),
        }
    }
}

fn section<T>(name: &'static str, result: ClientResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(section = name, error = %err, "Dashboard section failed");
            None
        }
    }
}
