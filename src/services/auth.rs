//! Access token issuing and validation.
//!
//! Interactive login lives outside this service; tokens are minted for
//! provisioned users by operator tooling (see the `seed` binary).

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::role::Permission;
use crate::models::user::User;

/// JWT claims embedded in access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role_id: String,
    pub permissions: Vec<Permission>,
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token returned to operator tooling.
#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Issue an access token carrying the user's role permissions.
pub fn issue_token(user: &User, jwt_secret: &str, expiry_secs: i64) -> Result<AccessToken, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role_id: user.role.id.to_string(),
        permissions: user.role.permissions.clone(),
        token_type: "access".to_string(),
        exp: (now + Duration::seconds(expiry_secs)).timestamp(),
        iat: now.timestamp(),
    };

    let access_token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))?;

    Ok(AccessToken {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: expiry_secs,
    })
}

/// Validate a JWT and return the claims.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let validation = Validation::default();

    jsonwebtoken::decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
}
