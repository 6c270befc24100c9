use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::models::{Claims, TokenType};

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

/// Identity carried by an access token.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: u64,
    pub username: String,
    pub role: u8,
    pub employee_id: Option<u64>,
    pub email: Option<String>,
}

/// Mints an access token. Production tokens come from the identity
/// provider; this is used by tests and local tooling sharing the secret.
pub fn generate_access_token(subject: TokenSubject, secret: &str, ttl: usize) -> Result<String, Error> {
    let claims = Claims {
        user_id: subject.user_id,
        sub: subject.username,
        role: subject.role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type: TokenType::Access,
        employee_id: subject.employee_id,
        email: subject.email,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decodes and checks an access token. Refresh tokens are refused.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("refresh tokens cannot be used for API access".to_string());
    }
    Ok(claims)
}
