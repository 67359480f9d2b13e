//! Roster and presence marks.
//!
//! A roster is the full congregation joined with the presence marks of one
//! culto. Every member appears exactly once and carries exactly one
//! `presente` flag; a member with no stored mark is absent.
//!
//! All mutations here are local. Persisting is a full-roster replace: the
//! whole roster, not a diff, is submitted (see [`Roster::submission`]).
//! Filtering is a view concern and never narrows what gets submitted.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::stats::{derive_stats, ReportSnapshot};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One roster row from `GET /api/cultos/{id}/presencas`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub membro_id: DbId,
    pub nome_membro: String,
    #[serde(default)]
    pub codigo: Option<String>,
    #[serde(default)]
    pub nome_branch: Option<String>,
    #[serde(default, deserialize_with = "de_presente")]
    pub presente: bool,
    #[serde(default)]
    pub observacao: Option<String>,
}

/// `null` (no stored mark) decodes as absent.
fn de_presente<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

impl RosterEntry {
    fn matches_search(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.nome_membro.to_lowercase().contains(needle)
            || self
                .codigo
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(needle))
    }
}

/// Response body of `GET /api/cultos/{id}/presencas`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterPayload {
    #[serde(default)]
    pub membros: Vec<RosterEntry>,
    #[serde(default)]
    pub stats: Option<ReportSnapshot>,
}

/// One element of the save body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceMark {
    pub membro_id: DbId,
    pub presente: bool,
    pub observacao: Option<String>,
}

/// Request body for `POST /api/cultos/{id}/presencas`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePresencesRequest {
    pub presencas: Vec<PresenceMark>,
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PresenceFilter {
    #[default]
    All,
    Present,
    Absent,
}

impl PresenceFilter {
    /// Parse the filter tab keys `todos`, `presentes`, `ausentes`.
    pub fn from_key(key: &str) -> Result<Self, CoreError> {
        match key {
            "todos" => Ok(Self::All),
            "presentes" => Ok(Self::Present),
            "ausentes" => Ok(Self::Absent),
            other => Err(CoreError::Validation(format!(
                "Invalid filter '{other}'. Must be one of: todos, presentes, ausentes"
            ))),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::All => "todos",
            Self::Present => "presentes",
            Self::Absent => "ausentes",
        }
    }

    fn admits(&self, entry: &RosterEntry) -> bool {
        match self {
            Self::All => true,
            Self::Present => entry.presente,
            Self::Absent => !entry.presente,
        }
    }
}

/// What the roster view currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterQuery {
    /// Case-insensitive substring over name and code.
    pub search: String,
    pub filter: PresenceFilter,
}

impl RosterQuery {
    pub fn new(search: impl Into<String>, filter: PresenceFilter) -> Self {
        Self {
            search: search.into(),
            filter,
        }
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// The in-memory roster of one editing session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Build a roster, keeping the first row for any repeated member so each
    /// member carries exactly one flag.
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        let mut seen = HashSet::with_capacity(entries.len());
        let entries = entries
            .into_iter()
            .filter(|e| seen.insert(e.membro_id))
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, membro_id: DbId) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.membro_id == membro_id)
    }

    fn get_mut(&mut self, membro_id: DbId) -> Result<&mut RosterEntry, CoreError> {
        self.entries
            .iter_mut()
            .find(|e| e.membro_id == membro_id)
            .ok_or(CoreError::NotFound {
                entity: "membro",
                id: membro_id,
            })
    }

    /// Flip one member's flag. Returns the new value.
    pub fn toggle(&mut self, membro_id: DbId) -> Result<bool, CoreError> {
        let entry = self.get_mut(membro_id)?;
        entry.presente = !entry.presente;
        Ok(entry.presente)
    }

    /// Set one member's flag explicitly.
    pub fn set_present(&mut self, membro_id: DbId, presente: bool) -> Result<(), CoreError> {
        self.get_mut(membro_id)?.presente = presente;
        Ok(())
    }

    /// Set every member's flag to `value`.
    pub fn mark_all(&mut self, value: bool) {
        for entry in &mut self.entries {
            entry.presente = value;
        }
    }

    /// Attach or clear a member's observation. Blank text clears it.
    pub fn set_observation(
        &mut self,
        membro_id: DbId,
        observacao: Option<String>,
    ) -> Result<(), CoreError> {
        let observacao = observacao
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self.get_mut(membro_id)?.observacao = observacao;
        Ok(())
    }

    /// Entries visible under `query`, in roster order.
    pub fn view(&self, query: &RosterQuery) -> Vec<&RosterEntry> {
        let needle = query.search.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| query.filter.admits(e))
            .filter(|e| e.matches_search(&needle))
            .collect()
    }

    pub fn present_members(&self) -> Vec<&RosterEntry> {
        self.entries.iter().filter(|e| e.presente).collect()
    }

    pub fn absent_members(&self) -> Vec<&RosterEntry> {
        self.entries.iter().filter(|e| !e.presente).collect()
    }

    /// Live tally, including unsaved toggles.
    pub fn stats(&self) -> ReportSnapshot {
        derive_stats(&self.entries)
    }

    /// The save body: every member, regardless of any view filter.
    pub fn submission(&self) -> SavePresencesRequest {
        SavePresencesRequest {
            presencas: self
                .entries
                .iter()
                .map(|e| PresenceMark {
                    membro_id: e.membro_id,
                    presente: e.presente,
                    observacao: e.observacao.clone().filter(|s| !s.is_empty()),
                })
                .collect(),
        }
    }
}

impl From<RosterPayload> for Roster {
    fn from(payload: RosterPayload) -> Self {
        Self::new(payload.membros)
    }
}
