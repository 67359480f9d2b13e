//! Presence editor for one culto.
//!
//! Holds the roster of a single editing session. Toggles, mark-all and
//! observations are local until [`PresenceEditor::save`], which submits the
//! whole roster and then reloads it from the backend. Bulk import uploads a
//! spreadsheet and reloads the merged result.
//!
//! Last write wins: no version token is exchanged, so two operators saving
//! the same culto overwrite each other.

use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard};

use iicgp_core::presence::{Roster, RosterEntry, RosterQuery};
use iicgp_core::stats::ReportSnapshot;
use iicgp_core::types::DbId;

use crate::api::IicgpApi;
use crate::error::{ClientError, ClientResult};

pub const MSG_SAVE_OK: &str = "Presenças guardadas com sucesso!";
pub const MSG_SAVE_FAILED: &str = "Erro ao guardar presenças.";
pub const MSG_LOAD_FAILED: &str = "Erro ao carregar presenças.";

/// Which write, if any, is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Idle,
    Saving,
    Importing,
}

impl Activity {
    fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Saving => 1,
            Self::Importing => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Saving,
            2 => Self::Importing,
            _ => Self::Idle,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Saving => "save",
            Self::Importing => "import",
        }
    }
}

/// Resets the editor to [`Activity::Idle`] when dropped.
struct ActivityGuard<'a> {
    slot: &'a AtomicU8,
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        self.slot.store(Activity::Idle.as_u8(), Ordering::Release);
    }
}

/// Result of a save or import.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    /// Message for the view.
    pub message: String,
    /// Backend snapshot after the reload; `None` if the reload failed and the
    /// report should show placeholders.
    pub snapshot: Option<ReportSnapshot>,
}

#[derive(Debug, Default)]
struct EditorState {
    roster: Roster,
    snapshot: Option<ReportSnapshot>,
}

pub struct PresenceEditor {
    api: IicgpApi,
    culto_id: DbId,
    state: Mutex<EditorState>,
    activity: AtomicU8,
}

impl std::fmt::Debug for PresenceEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceEditor")
            .field("culto_id", &self.culto_id)
            .finish_non_exhaustive()
    }
}

impl PresenceEditor {
    /// Load the roster of `culto_id`. A failed load is terminal: no partial
    /// roster is ever exposed.
    pub async fn open(api: IicgpApi, culto_id: DbId) -> ClientResult<Self> {
        let editor = Self {
            api,
            culto_id,
            state: Mutex::new(EditorState::default()),
            activity: AtomicU8::new(Activity::Idle.as_u8()),
        };
        editor.reload().await?;
        Ok(editor)
    }

    pub fn culto_id(&self) -> DbId {
        self.culto_id
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace local state with the backend's roster and snapshot. On
    /// failure the current state is kept.
    pub async fn reload(&self) -> ClientResult<ReportSnapshot> {
        let payload = self.api.load_presences(self.culto_id).await?;
        let roster = Roster::new(payload.membros);
        // Older backends omit `stats`; derive it from the same rows.
        let snapshot = payload.stats.unwrap_or_else(|| roster.stats());
        tracing::debug!(
            culto_id = self.culto_id,
            members = roster.len(),
            present = snapshot.presentes,
            "Roster loaded"
        );
        let mut state = self.state();
        state.roster = roster;
        state.snapshot = Some(snapshot);
        Ok(snapshot)
    }

    // ---- local edits ----

    pub fn toggle(&self, membro_id: DbId) -> ClientResult<bool> {
        Ok(self.state().roster.toggle(membro_id)?)
    }

    pub fn set_present(&self, membro_id: DbId, presente: bool) -> ClientResult<()> {
        Ok(self.state().roster.set_present(membro_id, presente)?)
    }

    pub fn mark_all(&self, value: bool) {
        self.state().roster.mark_all(value);
    }

    pub fn set_observation(&self, membro_id: DbId, observacao: Option<String>) -> ClientResult<()> {
        Ok(self.state().roster.set_observation(membro_id, observacao)?)
    }

    // ---- reads ----

    /// A copy of the current roster, unsaved edits included.
    pub fn roster(&self) -> Roster {
        self.state().roster.clone()
    }

    /// Rows visible under `query`.
    pub fn view(&self, query: &RosterQuery) -> Vec<RosterEntry> {
        self.state()
            .roster
            .view(query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Live tally of the in-memory roster, unsaved edits included.
    pub fn live_stats(&self) -> ReportSnapshot {
        self.state().roster.stats()
    }

    /// Last snapshot the backend reported.
    pub fn report(&self) -> Option<ReportSnapshot> {
        self.state().snapshot
    }

    pub fn activity(&self) -> Activity {
        Activity::from_u8(self.activity.load(Ordering::Acquire))
    }

    // ---- writes ----

    fn begin(&self, activity: Activity) -> ClientResult<ActivityGuard<'_>> {
        self.activity
            .compare_exchange(
                Activity::Idle.as_u8(),
                activity.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|current| ClientError::Busy(Activity::from_u8(current).label()))?;
        Ok(ActivityGuard {
            slot: &self.activity,
        })
    }

    /// Submit the entire roster, then reload it.
    pub async fn save(&self) -> ClientResult<WriteOutcome> {
        let _guard = self.begin(Activity::Saving)?;
        let body = self.state().roster.submission();
        let members = body.presencas.len();

        self.api.save_presences(self.culto_id, &body).await?;
        tracing::info!(culto_id = self.culto_id, members, "Presences saved");

        Ok(WriteOutcome {
            message: MSG_SAVE_OK.to_string(),
            snapshot: self.reload_after_write().await,
        })
    }

    /// Upload one spreadsheet for the backend to parse and merge, then reload.
    /// On failure the roster is left as it was.
    pub async fn import_bytes(&self, file_name: &str, bytes: Vec<u8>) -> ClientResult<WriteOutcome> {
        let _guard = self.begin(Activity::Importing)?;
        let size = bytes.len();

        let response = self
            .api
            .import_presences(self.culto_id, file_name, bytes)
            .await?;
        tracing::info!(culto_id = self.culto_id, file_name, size, "Presences imported");

        Ok(WriteOutcome {
            message: response.message,
            snapshot: self.reload_after_write().await,
        })
    }

    /// [`import_bytes`](Self::import_bytes) reading from disk.
    pub async fn import_file(&self, path: &Path) -> ClientResult<WriteOutcome> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "presencas.csv".to_string());
        self.import_bytes(&file_name, bytes).await
    }

    async fn reload_after_write(&self) -> Option<ReportSnapshot> {
        match self.reload().await {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(culto_id = self.culto_id, error = %err, "Reload after write failed");
                self.state().snapshot = None;
                None
            }
        }
    }
}
