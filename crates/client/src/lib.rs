//! HTTP client and workflow controllers for the IICGP attendance backend.
//!
//! [`api::IicgpApi`] talks to the REST endpoints. [`session::Session`] holds
//! the operator's token and role. The controllers on top
//! ([`registry::ServiceRegistry`], [`editor::PresenceEditor`] and
//! [`dashboard::DashboardClient`]) implement the service-registration and
//! attendance-marking workflow.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod editor;
pub mod error;
pub mod registry;
pub mod session;
pub mod token;

pub use api::IicgpApi;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use session::{Session, SessionState};
