//! Branches, as consumed by the attendance workflow.
//!
//! Members are read-only here; their CRUD lives behind other screens.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// A church location (filial).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: DbId,
    pub nome: String,
}

/// Branches offered when the branch listing cannot be fetched.
pub const KNOWN_BRANCHES: &[(DbId, &str)] = &[
    (1, "IICGP-ALBAZINE"),
    (2, "IICGP-MAGOANINE"),
    (3, "IICGP-Mathemele"),
    (4, "IICGP-Maxixe"),
    (5, "IICGP-NAMAACHA"),
    (6, "IICGP-Nampula"),
    (7, "IICGP-Xai-Xai"),
    (8, "IICGP-Zimpeto"),
];

pub fn known_branches() -> Vec<Branch> {
    KNOWN_BRANCHES
        .iter()
        .map(|(id, nome)| Branch {
            id: *id,
            nome: (*nome).to_string(),
        })
        .collect()
}
