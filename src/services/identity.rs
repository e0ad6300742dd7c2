use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::core::ports::{AuthError, IdentityProvider};
use crate::models::UserIdentity;

/// Claims carried by tokens issued by the user service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Numeric user id
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
}

/// Validates HS256 tokens against the secret shared with the user service
pub struct JwtIdentityProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn validate_token(&self, token: &str) -> Result<UserIdentity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let data = decode::<TokenClaims>(token, &self.key, &self.validation)?;
        let user_id = data
            .claims
            .sub
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| AuthError::InvalidSubject(data.claims.sub.clone()))?;

        Ok(UserIdentity {
            user_id,
            username: data.claims.username,
            is_premium: data.claims.is_premium,
        })
    }
}
