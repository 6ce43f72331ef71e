use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::model::role::Role;

/// Denormalized user record as read from the `full_user_info` view.
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "username": "asmith",
        "first_name": "Alice",
        "last_name": "Smith",
        "email": "alice.smith@company.com",
        "role": "Employee"
    })
)]
pub struct User {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "asmith")]
    pub username: String,

    /// Argon2 hash, never exposed in responses.
    #[serde(skip_serializing)]
    #[schema(write_only)]
    pub password: String,

    #[schema(example = "Alice")]
    pub first_name: String,

    #[schema(example = "Smith")]
    pub last_name: String,

    #[schema(example = "alice.smith@company.com")]
    pub email: String,

    #[schema(example = "Employee")]
    pub role: String,
}

/// Insert payload. The password arrives in plaintext and is hashed by the
/// repository before it touches the database.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

/// Full-overwrite update. A `None` password keeps the stored hash.
#[derive(Debug)]
pub struct UserUpdate {
    pub username: String,
    pub password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_not_serialized() {
        let user = User {
            id: 7,
            username: "asmith".into(),
            password: "$argon2id$...".into(),
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            email: "alice@company.com".into(),
            role: "Employee".into(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "Employee");
    }
}
