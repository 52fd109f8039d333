//! Session-related types.
//!
//! Types stored in the session for authentication state. Sessions are written
//! by the login service that shares the session table; this service only
//! reads them.

use serde::{Deserialize, Serialize};

use reviews_core::{Role, UserId};

/// Session-stored caller identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// Caller's user ID.
    pub user_id: UserId,
    /// Caller's privilege level.
    #[serde(default)]
    pub role: Role,
}

impl CurrentUser {
    /// Whether this caller may modify a review written by `author`.
    #[must_use]
    pub fn can_modify(&self, author: UserId) -> bool {
        self.user_id == author || self.role.is_admin()
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_author_can_modify_own_review() {
        let author = UserId::generate();
        let caller = CurrentUser {
            user_id: author,
            role: Role::User,
        };
        assert!(caller.can_modify(author));
        assert!(!caller.can_modify(UserId::generate()));
    }

    #[test]
    fn test_admin_can_modify_any_review() {
        let caller = CurrentUser {
            user_id: UserId::generate(),
            role: Role::Admin,
        };
        assert!(caller.can_modify(UserId::generate()));
    }

    #[test]
    fn test_session_payload_shape() {
        let json = r#"{"userId":"65a1f0c2e4b0a1b2c3d4e5f6","role":"admin"}"#;
        let user: CurrentUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.user_id.to_string(), "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(user.role, Role::Admin);

        // Missing role means a regular user.
        let user: CurrentUser =
            serde_json::from_str(r#"{"userId":"65a1f0c2e4b0a1b2c3d4e5f6"}"#).unwrap();
        assert_eq!(user.role, Role::User);
    }
}
