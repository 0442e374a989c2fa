use jsonwebtoken::{decode, encode, Algorithm, Header, TokenData, Validation};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::user::{Principal, Role};
use crate::errors::AuthError;
use crate::settings::{AppConfig, JwtKeys};

const JWT_ALGORITHM: Algorithm = Algorithm::HS512;

/// Claims issued by the external identity service. The core only consumes
/// them; `create_jwt` exists for tests and local tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn principal(&self) -> Result<Principal, AuthError> {
        let id = Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(Principal { id, role: self.role })
    }
}

#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
}

impl JwtService {
    pub fn new(config: &AppConfig) -> Self {
        JwtService {
            keys: JwtKeys::from(config),
        }
    }

    pub fn create_jwt(&self, user_id: &Uuid, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: (now + Duration::minutes(15)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.encoding)
            .map_err(|_| AuthError::InvalidToken)
    }

    pub fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.keys.decoding, &validation).map_err(AuthError::from)
    }
}
