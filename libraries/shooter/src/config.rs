use serde::Deserialize;

pub const DEFAULT_QUERY_URL: &str = "http://shooter.cn/api/subapi.php";
pub const DEFAULT_SITE: &str = "http://shooter.cn/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/47.0.2526.111 Safari/537.36";
pub const DEFAULT_MAX_COLLISION_ATTEMPTS: u32 = 1000;

/// Connection and naming settings for [`crate::ShooterClient`].
///
/// The service only answers requests that look like they come from its own web page, so
/// `origin`, `referer` and `user_agent` are sent with every request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShooterConfig {
    pub query_url: String,
    pub origin: String,
    pub referer: String,
    pub user_agent: String,
    /// How many `-<n>` alternatives to try before giving up on saving a file.
    pub max_collision_attempts: u32,
}

impl Default for ShooterConfig {
    fn default() -> Self {
        Self {
            query_url: DEFAULT_QUERY_URL.to_string(),
            origin: DEFAULT_SITE.to_string(),
            referer: DEFAULT_SITE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_collision_attempts: DEFAULT_MAX_COLLISION_ATTEMPTS,
        }
    }
}

impl ShooterConfig {
    /// Defaults, overridden by `SHOOTER_API_URL`, `SHOOTER_USER_AGENT` and
    /// `SHOOTER_MAX_COLLISIONS` when they are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("SHOOTER_API_URL") {
            config.query_url = url;
        }
        if let Some(user_agent) = lookup("SHOOTER_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(max) = lookup("SHOOTER_MAX_COLLISIONS") {
            match max.parse() {
                Ok(max) => config.max_collision_attempts = max,
                Err(e) => log::warn!("Ignoring SHOOTER_MAX_COLLISIONS={max:?}: {e}"),
            }
        }
        config
    }
}
