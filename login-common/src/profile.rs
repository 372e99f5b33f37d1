use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile of the authenticated user, as returned by `GET /me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Google subject identifier
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
