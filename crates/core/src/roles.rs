//! Well-known role ids.
//!
//! These must match the rows of the backend `roles` table; `/auth/me`
//! reports them as `role_id`.

pub type RoleId = i64;

pub const ROLE_ADMIN: RoleId = 1;
pub const ROLE_PASTOR: RoleId = 2;
pub const ROLE_FINANCAS: RoleId = 3;
pub const ROLE_SECRETARIO: RoleId = 4;
pub const ROLE_ESTATISTICA: RoleId = 8;
pub const ROLE_CALLCENTER: RoleId = 9;
pub const ROLE_SOSSOCORROS: RoleId = 10;

/// Display label for a role id, used when the backend omits `role_nome`.
pub fn role_label(role: RoleId) -> &'static str {
    match role {
        ROLE_ADMIN => "Admin",
        ROLE_PASTOR => "Pastor",
        ROLE_FINANCAS => "Finanças",
        ROLE_SECRETARIO => "Secretário",
        ROLE_ESTATISTICA => "Estatística",
        ROLE_CALLCENTER => "Call Center",
        ROLE_SOSSOCORROS => "SOS Socorros",
        _ => "—",
    }
}
