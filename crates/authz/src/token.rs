use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shelf_kernel::settings::AuthSettings;

use crate::AuthzError;

/// JWT claims carried by a Shelf access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Username
    pub uid: i32,    // User ID
    pub iat: i64,
    pub exp: i64,
}

/// A freshly signed token and its lifetime in seconds.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// Sign a new token for a user.
pub fn issue(user_id: i32, username: &str, auth: &AuthSettings) -> Result<IssuedToken, AuthzError> {
    let now = Utc::now();
    let ttl = i64::try_from(auth.token_ttl_secs).unwrap_or(i64::MAX);
    let expires_at = now
        .checked_add_signed(Duration::seconds(ttl))
        .ok_or(AuthzError::TokenLifetime)?;

    let claims = Claims {
        sub: username.to_owned(),
        uid: user_id,
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )?;

    Ok(IssuedToken {
        token,
        expires_in: auth.token_ttl_secs,
    })
}

/// Verify signature and expiry, returning the claims.
pub fn verify(token: &str, auth: &AuthSettings) -> Result<Claims, AuthzError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify() {
        let auth = AuthSettings::default();
        let issued = issue(7, "reader", &auth).unwrap();
        assert_eq!(issued.expires_in, auth.token_ttl_secs);

        let claims = verify(&issued.token, &auth).unwrap();
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.sub, "reader");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let auth = AuthSettings::default();
        let issued = issue(1, "reader", &auth).unwrap();

        let other = AuthSettings {
            jwt_secret: "another-secret".to_string(),
            ..AuthSettings::default()
        };
        assert!(matches!(
            verify(&issued.token, &other),
            Err(AuthzError::Token(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(verify("not.a.jwt", &AuthSettings::default()).is_err());
    }
}
