use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub authorities: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: i64, username: String, authorities: Vec<String>, minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            username,
            authorities,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(minutes)).timestamp(),
        }
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("JWT encode failed: {e}"))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("JWT decode failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn issued_token_carries_identity_and_authorities() {
        let claims = Claims::new(7, "ana@example.com".into(), vec!["ROLE_ADMIN".into()], 5);
        let token = encode_token(&claims, SECRET).unwrap();

        let decoded = decode_token(&token, SECRET).unwrap();
        assert_eq!(decoded.sub, 7);
        assert_eq!(decoded.username, "ana@example.com");
        assert_eq!(decoded.authorities, vec!["ROLE_ADMIN".to_string()]);
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims::new(1, "bob@example.com".into(), vec![], -10);
        let token = encode_token(&claims, SECRET).unwrap();
        assert!(decode_token(&token, SECRET).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let claims = Claims::new(1, "bob@example.com".into(), vec![], 5);
        let token = encode_token(&claims, "another-secret").unwrap();
        assert!(decode_token(&token, SECRET).is_err());
    }
}
