use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub identity_login_path: String,
    pub session_secret: String,
    pub session_max_age_seconds: u64,
    pub session_cookie_name: String,
    pub cookie_secure: bool,
    /// Path patterns gated by the route guard (`/x` or `/x/:path*`).
    pub protected_paths: Vec<String>,
    pub guard_redirect_path: String,
    pub upstream_timeout_seconds: Option<u64>,
    pub app_base_url: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "https://back-end-car.vercel.app".into())
                .trim_end_matches('/')
                .to_string(),
            identity_login_path: env::var("IDENTITY_LOGIN_PATH")
                .unwrap_or_else(|_| "/api/auth/login".into()),
            session_secret: required("SESSION_SECRET")?,
            session_max_age_seconds: env::var("SESSION_MAX_AGE_SECONDS")
                .unwrap_or_else(|_| "2592000".into())
                .parse()?,
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "portal_session".into()),
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            protected_paths: env::var("PROTECTED_PATHS")
                .map(|v| split_list(&v))
                .unwrap_or_else(|_| default_protected_paths()),
            guard_redirect_path: env::var("GUARD_REDIRECT_PATH")
                .unwrap_or_else(|_| "/booking".into()),
            upstream_timeout_seconds: env::var("UPSTREAM_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok()),
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
        })
    }

    /// Configuration with every optional setting at its default.
    pub fn with_defaults(api_base_url: &str, session_secret: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            identity_login_path: "/api/auth/login".into(),
            session_secret: session_secret.to_string(),
            session_max_age_seconds: 2_592_000,
            session_cookie_name: "portal_session".into(),
            cookie_secure: false,
            protected_paths: default_protected_paths(),
            guard_redirect_path: "/booking".into(),
            upstream_timeout_seconds: None,
            app_base_url: "http://localhost:3000".into(),
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

fn default_protected_paths() -> Vec<String> {
    vec!["/booking".into(), "/mybooking".into(), "/allbooking/:path*".into()]
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
