use serde::{Deserialize, Serialize};

use super::models::UserModel;

/// Request payload for creating a user
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub alert_contact: Option<String>,
}

/// Public view of a user, never includes the password hash
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub login: String,
    pub alert_contact: Option<String>,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            login: user.login,
            alert_contact: user.alert_contact,
        }
    }
}
