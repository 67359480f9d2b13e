use iicgp_core::access::Resource;
use iicgp_core::error::CoreError;
use iicgp_core::roles::RoleId;

/// Shown when the backend cannot be reached.
pub const MSG_CONNECT: &str = "Erro ao conectar com o servidor";
/// Shown for any failed bulk import, whatever the backend said.
pub const MSG_IMPORT_FAILED: &str = "Erro ao importar CSV.";
/// Shown after a 401 forced the session closed.
pub const MSG_SESSION_EXPIRED: &str = "Sessão expirada. Inicie sessão novamente.";
pub const MSG_SESSION_REQUIRED: &str = "Inicie sessão para continuar.";
pub const MSG_CANCELLED: &str = "Operação cancelada.";
pub const MSG_BUSY: &str = "Aguarde: já existe uma operação em curso.";

/// Errors from the IICGP client layer.
///
/// Every variant is caught at the action that triggered it and turned into a
/// view-local message with [`ClientError::user_message`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Input rejected before any request was dispatched.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// The request never reached the server (DNS, TLS, connection, timeout).
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or("<no message>"))]
    Server {
        status: u16,
        /// `error` or `message` field of the JSON body, when present.
        message: Option<String>,
    },

    /// The server rejected a bulk import. The roster is left untouched.
    #[error("Import failed ({status}): {}", .message.as_deref().unwrap_or("<no message>"))]
    Import { status: u16, message: Option<String> },

    /// A 2xx response whose body did not match the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// The token was rejected; the session has been cleared.
    #[error("Unauthorized: session expired")]
    Unauthorized,

    /// No authenticated session.
    #[error("Authentication required")]
    SessionRequired,

    /// The session's role may not open this resource.
    #[error("Forbidden: role {role} cannot access '{}'", .resource.key())]
    Forbidden { role: RoleId, resource: Resource },

    /// The operator declined a confirmation prompt.
    #[error("Cancelled by operator")]
    Cancelled,

    /// A conflicting write (save or import) is already in flight.
    #[error("Another {0} is already in progress")]
    Busy(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Token file or import file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// The message a view shows for this error.
    ///
    /// `fallback` is the per-action generic text used when the server gave no
    /// message of its own.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(err) => match err {
                CoreError::Validation(msg) => msg.clone(),
                other => other.to_string(),
            },
            Self::Network(_) => MSG_CONNECT.to_string(),
            Self::Server { message, .. } => message
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(fallback)
                .to_string(),
            Self::Import { .. } => MSG_IMPORT_FAILED.to_string(),
            Self::Decode(_) => fallback.to_string(),
            Self::Unauthorized => MSG_SESSION_EXPIRED.to_string(),
            Self::SessionRequired => MSG_SESSION_REQUIRED.to_string(),
            Self::Forbidden { resource, .. } => {
                format!("Sem permissão para aceder a {}.", resource.label())
            }
            Self::Cancelled => MSG_CANCELLED.to_string(),
            Self::Busy(_) => MSG_BUSY.to_string(),
            Self::Config(msg) => msg.clone(),
            Self::Io(err) => err.to_string(),
        }
    }

    /// Re-tag a server rejection as an import failure.
    pub(crate) fn into_import(self) -> Self {
        match self {
            Self::Server { status, message } => Self::Import { status, message },
            other => other,
        }
    }
}
