use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Anything other than the literal string `"admin"` is a plain user.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("admin") => Role::Admin,
            _ => Role::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Admin => "admin",
        };
        write!(f, "{s}")
    }
}

/// Login form body. Missing fields deserialize as empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

/// Normalized identity produced by a successful credential exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub bearer_token: String,
}

/// Claims embedded in the signed session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Role,
    /// Upstream bearer token.
    #[serde(default, deserialize_with = "lenient_string")]
    pub token: String,
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
}

impl SessionClaims {
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.sub.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            bearer_token: self.token.clone(),
        }
    }
}

fn lenient_role<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Role::from_value(Some(&value)))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(String::from).unwrap_or_default())
}

/// Resolved session, injected into handlers by the guard or the extractor.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub identity: UserIdentity,
    pub claims: SessionClaims,
}

impl SessionContext {
    pub fn is_admin(&self) -> bool {
        self.identity.role == Role::Admin
    }

    pub fn bearer_token(&self) -> &str {
        &self.identity.bearer_token
    }
}

// Session surface returned by GET /auth/session
#[derive(Debug, Serialize)]
pub struct SessionUserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub user: SessionUserView,
    pub expires: String,
}

impl From<&SessionContext> for SessionView {
    fn from(ctx: &SessionContext) -> Self {
        let expires = chrono::DateTime::from_timestamp(ctx.claims.exp as i64, 0)
            .map(|d| d.to_rfc3339())
            .unwrap_or_default();
        Self {
            user: SessionUserView {
                id: ctx.identity.id.clone(),
                name: ctx.identity.name.clone(),
                email: ctx.identity.email.clone(),
                role: ctx.identity.role,
                token: ctx.identity.bearer_token.clone(),
            },
            expires,
        }
    }
}
