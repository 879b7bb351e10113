//! Environment-driven configuration for the backend and the chat client.
//!
//! Both structs are built from a lookup function so callers (and tests) can
//! supply values without touching the process environment.

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Cross-origin policy for the backend.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum AllowedOrigins {
    /// Any origin may call the API (`*`)
    #[default]
    Any,
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Parse a comma separated origin list. Empty input or `*` means any origin.
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(origins)
        }
    }

    /// Value for `Access-Control-Allow-Origin` given the request's `Origin`,
    /// or None when the origin is not allowed.
    pub fn allow_origin_for(&self, origin: Option<&str>) -> Option<String> {
        match self {
            AllowedOrigins::Any => Some("*".to_string()),
            AllowedOrigins::List(list) => {
                let origin = origin?.trim_end_matches('/');
                list.iter().find(|o| o.as_str() == origin).cloned()
            }
        }
    }
}

/// Process-wide configuration consumed by the backend.
#[derive(Clone, Debug)]
pub struct ServerEnv {
    /// Upstream provider credential. Absence is reported per request, not at boot.
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub allowed_origins: AllowedOrigins,
}

impl ServerEnv {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        ServerEnv {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: get("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|raw| AllowedOrigins::parse(&raw))
                .unwrap_or_default(),
        }
    }
}

/// Configuration consumed by the chat client.
#[derive(Clone, Debug)]
pub struct ClientEnv {
    pub api_url: String,
    /// OAuth client identifier for the login collaborator. Carried, never interpreted.
    pub google_client_id: Option<String>,
}

impl ClientEnv {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        ClientEnv {
            api_url: get("MATH_BUDDY_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            google_client_id: get("GOOGLE_CLIENT_ID"),
        }
    }
}
