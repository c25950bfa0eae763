use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    error::PortalError,
    models::auth::{SessionClaims, SessionContext, UserIdentity},
};

/// Where a caller stands with respect to authentication.
#[derive(Debug, Clone)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated(SessionContext),
    Expired,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Authenticating => "authenticating",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Expired => "expired",
        }
    }

    /// Credentials were submitted.
    pub fn begin_login(self) -> Result<Self, PortalError> {
        match self {
            SessionState::Anonymous | SessionState::Expired => Ok(SessionState::Authenticating),
            other => Err(invalid_transition(&other, "begin_login")),
        }
    }

    /// Outcome of the credential exchange.
    pub fn complete_login(self, minted: Option<SessionContext>) -> Result<Self, PortalError> {
        match self {
            SessionState::Authenticating => Ok(match minted {
                Some(ctx) => SessionState::Authenticated(ctx),
                None => SessionState::Anonymous,
            }),
            other => Err(invalid_transition(&other, "complete_login")),
        }
    }

    pub fn logout(self) -> Self {
        SessionState::Anonymous
    }

    pub fn context(&self) -> Option<&SessionContext> {
        match self {
            SessionState::Authenticated(ctx) => Some(ctx),
            _ => None,
        }
    }
}

fn invalid_transition(from: &SessionState, event: &str) -> PortalError {
    PortalError::Auth(format!("cannot {event} while {}", from.name()))
}

/// Mints, verifies and re-signs the HS256 session token.
#[derive(Clone)]
pub struct SessionService {
    secret: String,
    ttl_seconds: u64,
}

impl SessionService {
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        Self {
            secret: secret.to_string(),
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Issue a token for a freshly authenticated identity.
    pub fn mint(&self, identity: &UserIdentity) -> Result<(String, SessionContext), PortalError> {
        let now = Utc::now().timestamp() as usize;
        let claims = SessionClaims {
            sub: identity.id.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
            role: identity.role,
            token: identity.bearer_token.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.ttl_seconds as usize,
        };
        self.sign(claims)
    }

    /// Re-sign an existing session with a fresh expiry; identity fields are
    /// carried over unchanged.
    pub fn refresh(&self, ctx: &SessionContext) -> Result<(String, SessionContext), PortalError> {
        let now = Utc::now().timestamp() as usize;
        let claims = SessionClaims {
            iat: now,
            exp: now + self.ttl_seconds as usize,
            ..ctx.claims.clone()
        };
        self.sign(claims)
    }

    fn sign(&self, claims: SessionClaims) -> Result<(String, SessionContext), PortalError> {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| PortalError::Internal(e.into()))?;
        let ctx = SessionContext {
            identity: claims.identity(),
            claims,
        };
        Ok((token, ctx))
    }

    /// Verify signature and expiry.
    pub fn verify(&self, token: &str) -> Result<SessionContext, PortalError> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let data = decode::<SessionClaims>(token, &key, &validation)
            .map_err(|e| PortalError::Auth(format!("Invalid or expired session: {e}")))?;
        let claims = data.claims;

        if claims.sub.is_empty() || claims.token.is_empty() {
            return Err(PortalError::Auth("Session carries no upstream token".into()));
        }

        Ok(SessionContext {
            identity: claims.identity(),
            claims,
        })
    }

    /// Classify a raw cookie value.
    pub fn resolve(&self, token: Option<&str>) -> SessionState {
        match token.filter(|t| !t.is_empty()) {
            None => SessionState::Anonymous,
            Some(t) => match self.verify(t) {
                Ok(ctx) => SessionState::Authenticated(ctx),
                Err(_) => SessionState::Expired,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;

    fn identity() -> UserIdentity {
        UserIdentity {
            id: "1".into(),
            name: "A".into(),
            email: "a@b.com".into(),
            role: Role::Admin,
            bearer_token: "tok".into(),
        }
    }

    #[test]
    fn mint_then_verify_preserves_identity() {
        let svc = SessionService::new("secret", 3600);
        let (token, _) = svc.mint(&identity()).unwrap();
        let ctx = svc.verify(&token).unwrap();
        assert_eq!(ctx.identity, identity());
        assert!(ctx.is_admin());
    }

    #[test]
    fn refresh_keeps_identity_and_jti() {
        let svc = SessionService::new("secret", 3600);
        let (_, ctx) = svc.mint(&identity()).unwrap();
        let (token, refreshed) = svc.refresh(&ctx).unwrap();
        assert_eq!(refreshed.identity, ctx.identity);
        assert_eq!(refreshed.claims.jti, ctx.claims.jti);
        assert!(refreshed.claims.exp >= ctx.claims.exp);
        assert_eq!(svc.verify(&token).unwrap().identity, identity());
    }

    #[test]
    fn wrong_secret_or_expiry_resolves_to_expired() {
        let svc = SessionService::new("secret", 3600);
        let other = SessionService::new("other", 3600);
        let (token, _) = other.mint(&identity()).unwrap();
        assert!(matches!(svc.resolve(Some(&token)), SessionState::Expired));

        let now = Utc::now().timestamp() as usize;
        let stale = SessionClaims {
            sub: "1".into(),
            name: "A".into(),
            email: "a@b.com".into(),
            role: Role::User,
            token: "tok".into(),
            jti: "j".into(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let (token, _) = svc.sign(stale).unwrap();
        assert!(matches!(svc.resolve(Some(&token)), SessionState::Expired));
    }

    #[test]
    fn missing_cookie_is_anonymous() {
        let svc = SessionService::new("secret", 3600);
        assert!(matches!(svc.resolve(None), SessionState::Anonymous));
        assert!(matches!(svc.resolve(Some("")), SessionState::Anonymous));
        assert!(matches!(svc.resolve(Some("garbage")), SessionState::Expired));
    }

    #[test]
    fn login_transitions() {
        let svc = SessionService::new("secret", 3600);
        let state = SessionState::Anonymous.begin_login().unwrap();
        assert_eq!(state.name(), "authenticating");
        let failed = state.clone().complete_login(None).unwrap();
        assert_eq!(failed.name(), "anonymous");

        let (_, ctx) = svc.mint(&identity()).unwrap();
        let ok = state.complete_login(Some(ctx)).unwrap();
        assert_eq!(ok.context().unwrap().identity.id, "1");

        // Logging in on top of a live session is not a valid transition.
        assert!(ok.clone().begin_login().is_err());
        assert_eq!(ok.logout().name(), "anonymous");
        assert!(SessionState::Anonymous.complete_login(None).is_err());
    }
}
