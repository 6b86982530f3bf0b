use chrono::{Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
    errors::Result as JWTResult,
};

use crate::structure::users::Claims;

/// Issue an HS256 token for `user_id` carrying `role`, valid for `ttl`.
pub fn create_jwt(secret: &str, user_id: &str, role: &str, ttl: Duration) -> JWTResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or_else(Utc::now)
        .timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration as usize,
        role: role.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn verify_jwt(secret: &str, token: &str) -> JWTResult<TokenData<Claims>> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
}
