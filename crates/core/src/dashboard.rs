//! Aggregates served by `/api/cultos/stats/*` for the statistics dashboard.
//!
//! The backend computes all of these; the client only decodes and orders
//! them. Counters go through the lenient decoders in [`crate::types`].

use serde::{Deserialize, Serialize};

use crate::types::{de_count, de_ratio, DbId};

/// `GET /api/cultos/stats/gerais` -> `{stats: GeneralStats}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralStats {
    #[serde(default, deserialize_with = "de_count")]
    pub total_cultos: i64,
    #[serde(default, deserialize_with = "de_count")]
    pub total_presencas: i64,
    #[serde(default, deserialize_with = "de_count")]
    pub total_membros: i64,
    #[serde(default, deserialize_with = "de_ratio")]
    pub media_por_culto: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralStatsEnvelope {
    #[serde(default)]
    pub stats: GeneralStats,
}

/// One month of `GET /api/cultos/stats/por-mes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAttendance {
    pub mes: String,
    #[serde(default, deserialize_with = "de_count")]
    pub presentes: i64,
    #[serde(default, deserialize_with = "de_count")]
    pub ausentes: i64,
    #[serde(default, deserialize_with = "de_ratio")]
    pub taxa_presenca: f64,
}

/// One culto of `GET /api/cultos/stats/por-culto`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultoAttendance {
    #[serde(default)]
    pub id: Option<DbId>,
    pub data_curta: String,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default, deserialize_with = "de_count")]
    pub presentes: i64,
    #[serde(default, deserialize_with = "de_count")]
    pub ausentes: i64,
    #[serde(default, deserialize_with = "de_ratio")]
    pub taxa_presenca: f64,
}

/// A row of the "mais assíduos" ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberAttendanceRank {
    #[serde(default)]
    pub id: Option<DbId>,
    pub nome_membro: String,
    #[serde(default)]
    pub nome_branch: Option<String>,
    #[serde(default, deserialize_with = "de_count")]
    pub total_presencas: i64,
}

/// A row of the "mais faltas" ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberAbsenceRank {
    #[serde(default)]
    pub id: Option<DbId>,
    pub nome_membro: String,
    #[serde(default)]
    pub nome_branch: Option<String>,
    #[serde(default, deserialize_with = "de_count")]
    pub total_faltas: i64,
}

/// A row of the "melhor culto" ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestCulto {
    #[serde(default)]
    pub id: Option<DbId>,
    pub tipo: String,
    #[serde(default)]
    pub data_curta: Option<String>,
    #[serde(default, deserialize_with = "de_count")]
    pub presentes: i64,
}

/// `{dados: [...]}` wrapper shared by the list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Dados<T> {
    #[serde(default = "Vec::new")]
    pub dados: Vec<T>,
}

/// Everything the statistics dashboard shows.
///
/// Each section is fetched independently; a section that failed is `None`
/// and renders as placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub gerais: Option<GeneralStats>,
    pub por_mes: Option<Vec<MonthlyAttendance>>,
    /// Oldest culto first.
    pub por_culto: Option<Vec<CultoAttendance>>,
    pub mais_assiduos: Option<Vec<MemberAttendanceRank>>,
    pub mais_faltas: Option<Vec<MemberAbsenceRank>>,
    pub melhor_culto: Option<Vec<BestCulto>>,
}

/// Initials for a ranking avatar: first letter of the first two words.
pub fn initials(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .take(2)
        .filter_map(|w| w.chars().next())
        .flat_map(char::to_uppercase)
        .collect();
    if initials.is_empty() {
        "?".to_string()
    } else {
        initials
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_stats_decode_camel_case_with_string_numbers() {
        let json = r#"{"stats": {"totalCultos": "12", "totalPresencas": 340, "totalMembros": "85", "mediaPorCulto": "28.3"}}"#;
        let env: GeneralStatsEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.stats.total_cultos, 12);
        assert_eq!(env.stats.total_presencas, 340);
        assert_eq!(env.stats.total_membros, 85);
        assert!((env.stats.media_por_culto - 28.3).abs() < 1e-9);
    }

    #[test]
    fn dados_default_to_empty() {
        let d: Dados<MonthlyAttendance> = serde_json::from_str("{}").unwrap();
        assert!(d.dados.is_empty());
    }

    #[test]
    fn initials_take_two_words() {
        assert_eq!(initials("ana maria costa"), "AM");
        assert_eq!(initials("Célula"), "C");
        assert_eq!(initials("   "), "?");
    }
}
