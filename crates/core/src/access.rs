//! Capability resolution.
//!
//! One canonical permission table, one lookup ([`can_access`]). Both the
//! route guard in `iicgp-client` and the navigation builder below consult
//! it, so a role's reachable screens and its visible menu never disagree.

use serde::Serialize;

use crate::roles::{
    RoleId, ROLE_ADMIN, ROLE_CALLCENTER, ROLE_ESTATISTICA, ROLE_FINANCAS, ROLE_PASTOR,
    ROLE_SECRETARIO, ROLE_SOSSOCORROS,
};

/// A guarded screen or menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Dashboard,
    Membros,
    ListaMembros,
    NovoMembro,
    Restauracoes,
    Estatistica,
    Cultos,
    Financas,
    CallCenter,
    SosSocorros,
    Configuracoes,
    Usuarios,
    Perfil,
    Permissoes,
}

/// Every resource, in menu order.
pub const ALL_RESOURCES: &[Resource] = &[
    Resource::Dashboard,
    Resource::Membros,
    Resource::ListaMembros,
    Resource::NovoMembro,
    Resource::Restauracoes,
    Resource::Estatistica,
    Resource::Cultos,
    Resource::Financas,
    Resource::CallCenter,
    Resource::SosSocorros,
    Resource::Configuracoes,
    Resource::Usuarios,
    Resource::Perfil,
    Resource::Permissoes,
];

impl Resource {
    /// Stable key, as used in navigation state.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Membros => "membros",
            Self::ListaMembros => "lista-membros",
            Self::NovoMembro => "novo-membro",
            Self::Restauracoes => "restauracoes",
            Self::Estatistica => "estatistica",
            Self::Cultos => "cultos",
            Self::Financas => "financas",
            Self::CallCenter => "call-center",
            Self::SosSocorros => "sos-socorros",
            Self::Configuracoes => "configuracoes",
            Self::Usuarios => "usuarios",
            Self::Perfil => "perfil",
            Self::Permissoes => "permissoes",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        ALL_RESOURCES.iter().copied().find(|r| r.key() == key)
    }

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Membros => "Membros",
            Self::ListaMembros => "Lista de Membros",
            Self::NovoMembro => "Novo Membro",
            Self::Restauracoes => "Restaurações",
            Self::Estatistica => "Estatística",
            Self::Cultos => "Cultos",
            Self::Financas => "Finanças",
            Self::CallCenter => "Call Center",
            Self::SosSocorros => "SOS Socorros",
            Self::Configuracoes => "Configurações",
            Self::Usuarios => "Usuários",
            Self::Perfil => "Perfil",
            Self::Permissoes => "Permissões",
        }
    }
}

// ---------------------------------------------------------------------------
// Permission table
// ---------------------------------------------------------------------------

/// Roles allowed on a resource. `None` means every authenticated role.
fn allowed_roles(resource: Resource) -> Option<&'static [RoleId]> {
    const MEMBROS: &[RoleId] = &[ROLE_ADMIN, ROLE_PASTOR, ROLE_FINANCAS, ROLE_ESTATISTICA];
    const NOVO_MEMBRO: &[RoleId] = &[ROLE_ADMIN, ROLE_PASTOR, ROLE_SECRETARIO, ROLE_ESTATISTICA];
    const PASTORAL: &[RoleId] = &[ROLE_ADMIN, ROLE_PASTOR];
    const FINANCAS: &[RoleId] = &[ROLE_ADMIN, ROLE_PASTOR, ROLE_FINANCAS];
    const CALL_CENTER: &[RoleId] = &[ROLE_ADMIN, ROLE_PASTOR, ROLE_CALLCENTER];
    const SOS: &[RoleId] = &[ROLE_ADMIN, ROLE_PASTOR, ROLE_SOSSOCORROS];
    const ADMIN_ONLY: &[RoleId] = &[ROLE_ADMIN];
    const PERMISSOES: &[RoleId] = &[
        ROLE_ADMIN,
        ROLE_PASTOR,
        ROLE_FINANCAS,
        ROLE_ESTATISTICA,
        ROLE_CALLCENTER,
        ROLE_SOSSOCORROS,
    ];

    match resource {
        Resource::Dashboard
        | Resource::Estatistica
        | Resource::Cultos
        | Resource::Configuracoes
        | Resource::Perfil => None,
        Resource::Membros | Resource::ListaMembros => Some(MEMBROS),
        Resource::NovoMembro => Some(NOVO_MEMBRO),
        Resource::Restauracoes => Some(PASTORAL),
        Resource::Financas => Some(FINANCAS),
        Resource::CallCenter => Some(CALL_CENTER),
        Resource::SosSocorros => Some(SOS),
        Resource::Usuarios => Some(ADMIN_ONLY),
        Resource::Permissoes => Some(PERMISSOES),
    }
}

/// Whether `role` may open `resource`.
pub fn can_access(role: RoleId, resource: Resource) -> bool {
    match allowed_roles(resource) {
        None => true,
        Some(roles) => roles.contains(&role),
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// One entry of the side menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub resource: Resource,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}

impl NavItem {
    fn leaf(resource: Resource) -> Self {
        Self {
            resource,
            label: resource.label(),
            children: Vec::new(),
        }
    }

    fn group(resource: Resource, children: Vec<NavItem>) -> Self {
        Self {
            resource,
            label: resource.label(),
            children,
        }
    }
}

/// The full, unfiltered menu.
pub fn menu_tree() -> Vec<NavItem> {
    vec![
        NavItem::leaf(Resource::Dashboard),
        NavItem::group(
            Resource::Membros,
            vec![
                NavItem::leaf(Resource::ListaMembros),
                NavItem::leaf(Resource::NovoMembro),
                NavItem::leaf(Resource::Restauracoes),
            ],
        ),
        NavItem::group(
            Resource::Estatistica,
            vec![NavItem::leaf(Resource::Estatistica), NavItem::leaf(Resource::Cultos)],
        ),
        NavItem::leaf(Resource::Financas),
        NavItem::leaf(Resource::CallCenter),
        NavItem::leaf(Resource::SosSocorros),
        NavItem::group(
            Resource::Configuracoes,
            vec![
                NavItem::leaf(Resource::Usuarios),
                NavItem::leaf(Resource::Perfil),
                NavItem::leaf(Resource::Permissoes),
            ],
        ),
    ]
}

/// The menu as seen by `role`.
///
/// A group survives only if its own resource is accessible and at least one
/// child remains after filtering.
pub fn navigation(role: RoleId) -> Vec<NavItem> {
    menu_tree()
        .into_iter()
        .filter_map(|item| filter_item(item, role))
        .collect()
}

fn filter_item(item: NavItem, role: RoleId) -> Option<NavItem> {
    if !can_access(role, item.resource) {
        return None;
    }
    if item.children.is_empty() {
        return Some(item);
    }
    let children: Vec<NavItem> = item
        .children
        .into_iter()
        .filter_map(|child| filter_item(child, role))
        .collect();
    if children.is_empty() {
        return None;
    }
    Some(NavItem { children, ..item })
}
