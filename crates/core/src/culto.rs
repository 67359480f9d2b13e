//! Service ("culto") records and the create form.
//!
//! A culto is the unit attendance is tracked against. Records are immutable
//! once created; the only mutation the registry offers is deletion.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{de_count, de_date, DbId, DATE_FORMAT};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Service types offered by the create form. `tipo` must be one of these.
pub const SERVICE_TYPES: &[&str] = &[
    "Culto Dominical",
    "Culto de Quinta-feira",
    "Escola de Casamento e Família",
    "Culto de Domigo 7h",
    "Culto de Domigo 10h",
    "Culto Especial",
    "Célula",
];

pub const CATEGORY_CULTO: &str = "Culto";
pub const CATEGORY_CELULA: &str = "Célula";
pub const CATEGORY_EVENTO: &str = "Evento";
pub const CATEGORY_CONFERENCIA: &str = "Conferência";

/// All valid categories; [`CATEGORY_CULTO`] is the default.
pub const CATEGORIES: &[&str] = &[
    CATEGORY_CULTO,
    CATEGORY_CELULA,
    CATEGORY_EVENTO,
    CATEGORY_CONFERENCIA,
];

/// Maximum length of the free-text preacher name.
pub const MAX_PREGADOR_LENGTH: usize = 120;

/// `MAX_PREGADOR_LENGTH` as `u64`, the type `validator` length bounds require.
const MAX_PREGADOR_LENGTH_U64: u64 = MAX_PREGADOR_LENGTH as u64;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A service record as returned by `GET /api/cultos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Culto {
    pub id: DbId,
    #[serde(deserialize_with = "de_date")]
    pub data: NaiveDate,
    pub tipo: String,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default)]
    pub pregador: Option<String>,
    #[serde(default)]
    pub horario: Option<String>,
    #[serde(default)]
    pub branch_id: Option<DbId>,
    #[serde(default)]
    pub nome_branch: Option<String>,
    /// Denormalized counter maintained by the backend on every save/import.
    #[serde(default, deserialize_with = "de_count")]
    pub total_presentes: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CultoList {
    #[serde(default)]
    pub cultos: Vec<Culto>,
}

// ---------------------------------------------------------------------------
// Create form
// ---------------------------------------------------------------------------

/// Fields collected by the "Novo Culto" form.
///
/// Only `data` and `tipo` are required. Blank optional fields are sent as
/// `null`.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct NewCulto {
    #[validate(required)]
    pub data: Option<NaiveDate>,
    #[validate(required, length(min = 1))]
    pub tipo: Option<String>,
    pub categoria: Option<String>,
    #[validate(length(max = MAX_PREGADOR_LENGTH_U64))]
    pub pregador: Option<String>,
    pub horario: Option<String>,
    pub branch_id: Option<DbId>,
}

/// Request body for `POST /api/cultos`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCultoRequest {
    pub data: String,
    pub tipo: String,
    pub categoria: String,
    pub pregador: Option<String>,
    pub horario: Option<String>,
    pub branch_id: Option<DbId>,
}

impl NewCulto {
    pub fn new(data: NaiveDate, tipo: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            tipo: Some(tipo.into()),
            ..Self::default()
        }
    }

    /// Validate the form and build the request body.
    ///
    /// Fails with [`CoreError::Validation`] before anything is dispatched when
    /// `data` or `tipo` is missing, `tipo`/`categoria` is outside its fixed
    /// list, or `horario` is not a `HH:MM` time.
    pub fn into_request(self) -> Result<CreateCultoRequest, CoreError> {
        let form = self.normalized();
        form.validate().map_err(|errors| {
            let mut fields: Vec<String> = errors
                .field_errors()
                .into_iter()
                .map(|(field, errs)| {
                    let codes: Vec<String> = errs.iter().map(|e| e.code.to_string()).collect();
                    format!("{field} ({})", codes.join(", "))
                })
                .collect();
            fields.sort();
            CoreError::Validation(format!("invalid culto fields: {}", fields.join("; ")))
        })?;

        let (Some(data), Some(tipo)) = (form.data, form.tipo) else {
            return Err(CoreError::Validation(
                "invalid culto fields: data and tipo are required".into(),
            ));
        };

        if !SERVICE_TYPES.contains(&tipo.as_str()) {
            return Err(CoreError::Validation(format!(
                "Invalid tipo '{tipo}'. Must be one of: {}",
                SERVICE_TYPES.join(", ")
            )));
        }

        let categoria = form
            .categoria
            .unwrap_or_else(|| CATEGORY_CULTO.to_string());
        if !CATEGORIES.contains(&categoria.as_str()) {
            return Err(CoreError::Validation(format!(
                "Invalid categoria '{categoria}'. Must be one of: {}",
                CATEGORIES.join(", ")
            )));
        }

        if let Some(horario) = &form.horario {
            parse_horario(horario).ok_or_else(|| {
                CoreError::Validation(format!("Invalid horario '{horario}'. Expected HH:MM"))
            })?;
        }

        Ok(CreateCultoRequest {
            data: data.format(DATE_FORMAT).to_string(),
            tipo,
            categoria,
            pregador: form.pregador,
            horario: form.horario,
            branch_id: form.branch_id,
        })
    }

    /// Trim text fields and turn blanks into `None`.
    fn normalized(self) -> Self {
        Self {
            data: self.data,
            tipo: blank_to_none(self.tipo),
            categoria: blank_to_none(self.categoria),
            pregador: blank_to_none(self.pregador),
            horario: blank_to_none(self.horario),
            branch_id: self.branch_id,
        }
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_horario(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}
