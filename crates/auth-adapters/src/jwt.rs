//! HS256-signed session tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use domains::{DomainError, DomainResult, Principal, Role, SessionTokens};

/// Session token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub name: String,
    pub roles: Vec<Role>,
    /// Session id, the anchor for forgery-protection tokens
    pub sid: Uuid,
    pub iat: i64,
    pub exp: i64,
}

pub struct JwtSessions {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtSessions {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    fn sign(&self, claims: &Claims) -> DomainResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(|e| {
            error!(error = %e, "failed to sign session token");
            DomainError::Internal(format!("failed to sign session token: {e}"))
        })
    }
}

impl SessionTokens for JwtSessions {
    fn issue(&self, principal: &Principal, session_id: Uuid) -> DomainResult<String> {
        let now = Utc::now();
        self.sign(&Claims {
            sub: principal.user_id,
            name: principal.username.clone(),
            roles: principal.roles.clone(),
            sid: session_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        })
    }

    fn verify(&self, token: &str) -> DomainResult<(Principal, Uuid)> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "rejected session token");
            DomainError::Unauthenticated
        })?;
        let claims = data.claims;
        Ok((
            Principal {
                user_id: claims.sub,
                username: claims.name,
                roles: claims.roles,
            },
            claims.sid,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions() -> JwtSessions {
        JwtSessions::new(b"test-jwt-secret", Duration::minutes(30))
    }

    fn principal() -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            username: "ada".into(),
            roles: vec![Role::User, Role::Admin],
        }
    }

    #[test]
    fn issued_token_verifies() {
        let sessions = sessions();
        let principal = principal();
        let sid = Uuid::new_v4();

        let token = sessions.issue(&principal, sid).unwrap();
        let (decoded, decoded_sid) = sessions.verify(&token).unwrap();
        assert_eq!(decoded, principal);
        assert_eq!(decoded_sid, sid);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let forged = JwtSessions::new(b"attacker", Duration::minutes(30))
            .issue(&principal(), Uuid::new_v4())
            .unwrap();
        assert_eq!(sessions().verify(&forged), Err(DomainError::Unauthenticated));
    }

    #[test]
    fn expired_token_is_rejected() {
        let sessions = sessions();
        let now = Utc::now().timestamp();
        let p = principal();
        let token = sessions
            .sign(&Claims {
                sub: p.user_id,
                name: p.username,
                roles: p.roles,
                sid: Uuid::new_v4(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        assert_eq!(sessions.verify(&token), Err(DomainError::Unauthenticated));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(
            sessions().verify("not.a.token"),
            Err(DomainError::Unauthenticated)
        );
    }
}
