use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::user::Role;

const ADMIN_UNDO_MINUTES: i64 = 60;
const EDITOR_UNDO_MINUTES: i64 = 10;

/// A single permission a session may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    View,
    Edit,
    Admin,
}

impl Capability {
    pub fn code(&self) -> &'static str {
        match self {
            Capability::View => "view",
            Capability::Edit => "edit",
            Capability::Admin => "admin",
        }
    }

    fn from_code(code: &str) -> Option<Capability> {
        match code {
            "view" => Some(Capability::View),
            "edit" => Some(Capability::Edit),
            "admin" => Some(Capability::Admin),
            _ => None,
        }
    }
}

/// What the logged-in user may do. Resolved once at login and kept in the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub view: bool,
    pub edit: bool,
    pub admin: bool,
}

impl Capabilities {
    /// Unapproved accounts get nothing regardless of role.
    pub fn resolve(role: Role, approved: bool) -> Self {
        if !approved {
            return Capabilities::default();
        }
        match role {
            Role::Admin => Capabilities { view: true, edit: true, admin: true },
            Role::Editor => Capabilities { view: true, edit: true, admin: false },
            Role::Viewer => Capabilities { view: true, edit: false, admin: false },
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::View => self.view,
            Capability::Edit => self.edit,
            Capability::Admin => self.admin,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.view || self.edit || self.admin)
    }

    /// How long after an import its batch may still be undone. `None` means never.
    pub fn undo_window(&self) -> Option<Duration> {
        if self.admin {
            Some(Duration::minutes(ADMIN_UNDO_MINUTES))
        } else if self.edit {
            Some(Duration::minutes(EDITOR_UNDO_MINUTES))
        } else {
            None
        }
    }

    pub fn to_csv(&self) -> String {
        [Capability::View, Capability::Edit, Capability::Admin]
            .into_iter()
            .filter(|c| self.has(*c))
            .map(|c| c.code())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn from_csv(csv: &str) -> Self {
        let mut caps = Capabilities::default();
        for code in csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match Capability::from_code(code) {
                Some(Capability::View) => caps.view = true,
                Some(Capability::Edit) => caps.edit = true,
                Some(Capability::Admin) => caps.admin = true,
                None => {}
            }
        }
        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_survives_session_storage() {
        let caps = Capabilities::resolve(Role::Editor, true);
        assert_eq!(caps.to_csv(), "view,edit");
        assert_eq!(Capabilities::from_csv(&caps.to_csv()), caps);
    }

    #[test]
    fn unknown_codes_are_ignored() {
        let caps = Capabilities::from_csv("view, superuser,");
        assert!(caps.view);
        assert!(!caps.edit && !caps.admin);
    }
}
