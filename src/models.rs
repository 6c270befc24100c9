use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
    /// Where leave notifications for this user are sent
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
