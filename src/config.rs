//! Client configuration parsed from `OXIZAP_*` keys.
//!
//! The WASM build has no process environment, so [`ClientConfig::from_build_env`]
//! reads the keys at compile time. [`ClientConfig::from_lookup`] takes any key
//! lookup so parsing stays testable natively.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u32 = 200;
pub const DEFAULT_SEND_TIMEOUT_MS: u32 = 10_000;
pub const DEFAULT_RECONNECT_INITIAL_MS: u32 = 1000;
pub const DEFAULT_RECONNECT_MAX_MS: u32 = 10_000;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("unsupported {key} '{value}' (expected {expected})")]
    UnknownValue { key: &'static str, value: String, expected: &'static str },
}

/// How an outgoing message is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SendPath {
    /// `POST /message/create/:chatId`; the realtime channel only fans out.
    #[default]
    Rest,
    /// Emit `sendMessage` on the realtime channel and wait for the echo.
    Realtime,
}

/// Backend call used to create a group conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupEndpoint {
    /// Multipart `POST /chat/create` with repeated `participants`.
    #[default]
    ChatCreate,
    /// JSON `POST /groups` with a `members` list.
    Groups,
}

/// Exponential backoff for the realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_ms: u32,
    pub max_ms: u32,
    /// `None` retries for as long as the owning room stays open.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { initial_ms: DEFAULT_RECONNECT_INITIAL_MS, max_ms: DEFAULT_RECONNECT_MAX_MS, max_attempts: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub socket_base_url: String,
    pub search_debounce_ms: u32,
    pub send_timeout_ms: u32,
    pub reconnect: ReconnectPolicy,
    pub send_path: SendPath,
    pub group_endpoint: GroupEndpoint,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            socket_base_url: DEFAULT_API_BASE_URL.to_owned(),
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
            reconnect: ReconnectPolicy::default(),
            send_path: SendPath::default(),
            group_endpoint: GroupEndpoint::default(),
        }
    }
}

impl ClientConfig {
    /// Build config from values baked in at compile time.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any baked-in value is malformed.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| {
            let value = match key {
                "OXIZAP_API_URL" => option_env!("OXIZAP_API_URL"),
                "OXIZAP_SOCKET_URL" => option_env!("OXIZAP_SOCKET_URL"),
                "OXIZAP_SEARCH_DEBOUNCE_MS" => option_env!("OXIZAP_SEARCH_DEBOUNCE_MS"),
                "OXIZAP_SEND_TIMEOUT_MS" => option_env!("OXIZAP_SEND_TIMEOUT_MS"),
                "OXIZAP_RECONNECT_INITIAL_MS" => option_env!("OXIZAP_RECONNECT_INITIAL_MS"),
                "OXIZAP_RECONNECT_MAX_MS" => option_env!("OXIZAP_RECONNECT_MAX_MS"),
                "OXIZAP_RECONNECT_MAX_ATTEMPTS" => option_env!("OXIZAP_RECONNECT_MAX_ATTEMPTS"),
                "OXIZAP_SEND_PATH" => option_env!("OXIZAP_SEND_PATH"),
                "OXIZAP_GROUP_ENDPOINT" => option_env!("OXIZAP_GROUP_ENDPOINT"),
                _ => None,
            };
            value.map(str::to_owned)
        })
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// All keys are optional:
    /// - `OXIZAP_API_URL`: REST base URL (default `http://localhost:3000`)
    /// - `OXIZAP_SOCKET_URL`: realtime base URL (default: the REST base URL)
    /// - `OXIZAP_SEARCH_DEBOUNCE_MS`: default 200
    /// - `OXIZAP_SEND_TIMEOUT_MS`: default 10000
    /// - `OXIZAP_RECONNECT_INITIAL_MS` / `OXIZAP_RECONNECT_MAX_MS`: default 1000 / 10000
    /// - `OXIZAP_RECONNECT_MAX_ATTEMPTS`: unset means unlimited
    /// - `OXIZAP_SEND_PATH`: `rest` (default) or `realtime`
    /// - `OXIZAP_GROUP_ENDPOINT`: `chat_create` (default) or `groups`
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unparsable numbers or unknown enum values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("OXIZAP_API_URL")
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());
        let socket_base_url = lookup("OXIZAP_SOCKET_URL")
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|| api_base_url.clone());

        let reconnect = ReconnectPolicy {
            initial_ms: parse_u32(&lookup, "OXIZAP_RECONNECT_INITIAL_MS", DEFAULT_RECONNECT_INITIAL_MS)?,
            max_ms: parse_u32(&lookup, "OXIZAP_RECONNECT_MAX_MS", DEFAULT_RECONNECT_MAX_MS)?,
            max_attempts: match lookup("OXIZAP_RECONNECT_MAX_ATTEMPTS") {
                Some(raw) => Some(parse_u32_value("OXIZAP_RECONNECT_MAX_ATTEMPTS", &raw)?),
                None => None,
            },
        };

        Ok(Self {
            api_base_url,
            socket_base_url,
            search_debounce_ms: parse_u32(&lookup, "OXIZAP_SEARCH_DEBOUNCE_MS", DEFAULT_SEARCH_DEBOUNCE_MS)?,
            send_timeout_ms: parse_u32(&lookup, "OXIZAP_SEND_TIMEOUT_MS", DEFAULT_SEND_TIMEOUT_MS)?,
            reconnect,
            send_path: parse_send_path(lookup("OXIZAP_SEND_PATH").as_deref())?,
            group_endpoint: parse_group_endpoint(lookup("OXIZAP_GROUP_ENDPOINT").as_deref())?,
        })
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn parse_u32<F>(lookup: &F, key: &'static str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_u32_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_u32_value(key: &'static str, raw: &str) -> Result<u32, ConfigError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidNumber { key, value: raw.to_owned() })
}

fn parse_send_path(raw: Option<&str>) -> Result<SendPath, ConfigError> {
    match raw.unwrap_or("rest") {
        "rest" => Ok(SendPath::Rest),
        "realtime" => Ok(SendPath::Realtime),
        other => Err(ConfigError::UnknownValue {
            key: "OXIZAP_SEND_PATH",
            value: other.to_owned(),
            expected: "'rest' or 'realtime'",
        }),
    }
}

fn parse_group_endpoint(raw: Option<&str>) -> Result<GroupEndpoint, ConfigError> {
    match raw.unwrap_or("chat_create") {
        "chat_create" => Ok(GroupEndpoint::ChatCreate),
        "groups" => Ok(GroupEndpoint::Groups),
        other => Err(ConfigError::UnknownValue {
            key: "OXIZAP_GROUP_ENDPOINT",
            value: other.to_owned(),
            expected: "'chat_create' or 'groups'",
        }),
    }
}
