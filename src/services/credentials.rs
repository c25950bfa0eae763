use serde_json::Value;
use tracing::{info, warn};

use crate::{
    models::auth::{Credentials, Role, UserIdentity},
    services::{api::RentalBackend, metrics::LOGINS_COUNTER},
};

/// Validate the upstream identity payload and normalize it.
///
/// This is the only place upstream identity data crosses into the session:
/// the id may be a string or a number, name/email default to empty, the role
/// defaults to [`Role::User`] and the bearer token must be a non-empty string.
pub fn identity_from_response(body: &Value) -> Option<UserIdentity> {
    let bearer_token = body
        .get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())?
        .to_string();

    let id = match body.get("_id")? {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    let text = |key: &str| {
        body.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Some(UserIdentity {
        id,
        name: text("name"),
        email: text("email"),
        role: Role::from_value(body.get("role")),
        bearer_token,
    })
}

pub struct CredentialExchange;

impl CredentialExchange {
    /// Exchange credentials for an identity. Fails closed: every failure is
    /// logged and reported as `None`.
    pub async fn authenticate<B: RentalBackend>(
        backend: &B,
        credentials: &Credentials,
    ) -> Option<UserIdentity> {
        if !credentials.is_complete() {
            warn!("Login rejected: missing credentials");
            LOGINS_COUNTER.with_label_values(&["missing_credentials"]).inc();
            return None;
        }

        let email = credentials.email.trim();
        let body = match backend.authenticate(email, &credentials.password).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Login failed for {}: {}", email, e);
                LOGINS_COUNTER.with_label_values(&["rejected"]).inc();
                return None;
            }
        };

        match identity_from_response(&body) {
            Some(identity) => {
                info!("Login succeeded for {} (role {})", identity.email, identity.role);
                LOGINS_COUNTER.with_label_values(&["success"]).inc();
                Some(identity)
            }
            None => {
                warn!("Login failed for {}: invalid credentials or missing token", email);
                LOGINS_COUNTER.with_label_values(&["malformed"]).inc();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PortalError;
    use crate::services::api::fake::FakeBackend;
    use axum::http::StatusCode;
    use serde_json::json;

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials { email: email.into(), password: password.into() }
    }

    #[tokio::test]
    async fn missing_fields_never_reach_upstream() {
        let backend = FakeBackend::default();
        for c in [creds("", "x"), creds("a@b.com", ""), creds("", "")] {
            assert!(CredentialExchange::authenticate(&backend, &c).await.is_none());
        }
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn admin_login_produces_full_identity() {
        let backend = FakeBackend::default();
        *backend.identity.lock().unwrap() = Some(Ok(json!({
            "_id": "1", "name": "A", "email": "a@b.com", "role": "admin", "token": "tok"
        })));

        let identity = CredentialExchange::authenticate(&backend, &creds("a@b.com", "x"))
            .await
            .unwrap();
        assert_eq!(
            identity,
            UserIdentity {
                id: "1".into(),
                name: "A".into(),
                email: "a@b.com".into(),
                role: Role::Admin,
                bearer_token: "tok".into(),
            }
        );
        assert_eq!(backend.calls(), vec!["authenticate a@b.com".to_string()]);
    }

    #[tokio::test]
    async fn upstream_rejection_fails_closed() {
        let backend = FakeBackend::default();
        *backend.identity.lock().unwrap() = Some(Err(PortalError::Remote {
            status: StatusCode::UNAUTHORIZED,
            message: Some("Invalid credentials".into()),
        }));
        assert!(CredentialExchange::authenticate(&backend, &creds("a@b.com", "bad"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn transport_failure_fails_closed() {
        let backend = FakeBackend::default();
        *backend.identity.lock().unwrap() =
            Some(Err(PortalError::Transport("connection refused".into())));
        assert!(CredentialExchange::authenticate(&backend, &creds("a@b.com", "x"))
            .await
            .is_none());
    }

    #[test]
    fn role_is_always_user_or_admin() {
        for role in [json!(null), json!(3), json!(["admin"]), json!("owner"), json!("user")] {
            let identity =
                identity_from_response(&json!({ "_id": "1", "token": "t", "role": role })).unwrap();
            assert_eq!(identity.role, Role::User);
        }
        let identity = identity_from_response(&json!({ "_id": "1", "token": "t" })).unwrap();
        assert_eq!(identity.role, Role::User);
    }

    #[test]
    fn token_and_id_are_required() {
        assert!(identity_from_response(&json!({ "_id": "1" })).is_none());
        assert!(identity_from_response(&json!({ "_id": "1", "token": "" })).is_none());
        assert!(identity_from_response(&json!({ "_id": "1", "token": 5 })).is_none());
        assert!(identity_from_response(&json!({ "token": "t" })).is_none());

        let numeric = identity_from_response(&json!({ "_id": 42, "token": "t" })).unwrap();
        assert_eq!(numeric.id, "42");
        assert_eq!(numeric.name, "");
    }
}
