use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Role;
use login_common::UserProfile;

/// Local user record, created on first Google login.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    /// Google subject identifier (sub claim)
    pub username: String,
    /// Encoded placeholder credential. Never exposed.
    #[serde(skip)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Whether the user is allowed to log in
    pub enabled: bool,
    /// When the user first logged in
    pub created_at: DateTime<Utc>,
    /// When the user last completed a login
    pub last_login_at: Option<DateTime<Utc>>,
    /// Roles attached to this user. Only populated where loaded explicitly.
    #[serde(skip)]
    pub roles: Vec<Role>,
}

impl User {
    pub fn update_last_login(&mut self) {
        self.last_login_at = Some(Utc::now());
    }

    pub fn add_role(&mut self, role: Role) {
        if !self.roles.iter().any(|r| r.id == role.id) {
            self.roles.push(role);
        }
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            roles: self.role_names(),
            created_at: self.created_at,
            last_login_at: self.last_login_at,
        }
    }
}

/// Fields needed to register a Google account locally.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 1,
            username: "110169484474386276334".to_string(),
            password: "$argon2id$placeholder".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            enabled: true,
            created_at: Utc::now(),
            last_login_at: None,
            roles: vec![],
        }
    }

    #[test]
    fn test_add_role_ignores_duplicates() {
        let mut user = user();
        let role = Role { id: 7, name: "ROLE_USER".to_string() };
        user.add_role(role.clone());
        user.add_role(role);
        assert_eq!(user.role_names(), vec!["ROLE_USER".to_string()]);
    }

    #[test]
    fn test_update_last_login_sets_timestamp() {
        let mut user = user();
        user.update_last_login();
        assert!(user.last_login_at.is_some());
    }

    #[test]
    fn test_serialization_hides_password() {
        let json = serde_json::to_string(&user()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_to_profile_copies_names() {
        let mut user = user();
        user.add_role(Role { id: 1, name: "ROLE_USER".to_string() });
        let profile = user.to_profile();
        assert_eq!(profile.username, user.username);
        assert_eq!(profile.first_name.as_deref(), Some("Ada"));
        assert!(profile.has_role("ROLE_USER"));
    }
}
