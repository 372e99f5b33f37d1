use serde::Serialize;

/// Authorization role, looked up by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// Link between a user and one of its roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRole {
    pub id: i64,
    pub user_id: i64,
    pub role_id: i64,
}
