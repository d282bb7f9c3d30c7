use anyhow::{Result, anyhow};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user_id: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    role: String,
    exp: u64,
}

pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str) -> Result<AuthResult>;
}

/// Validates HS256 tokens signed with the dashboard's shared secret.
pub struct HmacValidator {
    decoding_key: DecodingKey,
}

impl HmacValidator {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
        }
    }
}

impl JwtValidator for HmacValidator {
    fn validate(&self, token: &str) -> Result<AuthResult> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow!("Invalid token: {}", e))?;

        let claims = token_data.claims;
        Ok(AuthResult {
            user_id: claims.sub,
            is_admin: claims.role == ADMIN_ROLE,
        })
    }
}

/// Mint a token the way the external identity service would.
#[cfg(any(test, feature = "test-support"))]
pub fn issue_token(secret: &[u8], user_id: &str, role: &str, expired: bool) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock is after the epoch")
        .as_secs();
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: if expired { now - 3600 } else { now + 3600 },
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .expect("HS256 encoding should succeed")
}
