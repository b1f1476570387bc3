use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::user::UserType;

/// Tipo de token emitido
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims del JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // user_id
    pub username: String,
    pub user_type: UserType,
    pub token_type: TokenType,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
}

/// Par de tokens (access, refresh)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    pub access_expires_at: DateTime<Utc>,
}
