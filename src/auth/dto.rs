use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for user signup.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub gender: String,
    pub age: i64,
    pub username: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Returned after signup or login. The session token must be echoed back in
/// the `X-Session-Token` header on subsequent calls.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub session_token: Uuid,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub uuid: String,
    pub username: String,
    pub full_name: String,
}
