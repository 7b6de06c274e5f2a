use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Account/service identifier registered with the flag backend.
pub const SERVICE_ID: &str = "6985ea9b02bfff0a175a8d3d";

const DEFAULT_INIT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_EVENTS_CAPACITY: usize = 10_000;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} missing, it is required")]
    Missing(&'static str),

    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Which handler answers requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerVariant {
    /// Plain-text greeting with the value of one flag.
    Static,
    /// HTML table of every flag for a per-request context.
    Overview,
}

impl FromStr for HandlerVariant {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(HandlerVariant::Static),
            "overview" => Ok(HandlerVariant::Overview),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend_url: String,
    pub variant: HandlerVariant,
    pub init_timeout: Duration,
    pub events_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| lookup(var).ok_or(ConfigError::Missing(var));

        let port = parse("PORT", required("PORT")?)?;
        let backend_url = required("FLAG_BACKEND_URL")?;

        let variant = match lookup("HANDLER_VARIANT") {
            Some(value) => parse("HANDLER_VARIANT", value)?,
            None => HandlerVariant::Overview,
        };

        let init_timeout_secs = match lookup("FLAG_INIT_TIMEOUT_SECS") {
            Some(value) => parse("FLAG_INIT_TIMEOUT_SECS", value)?,
            None => DEFAULT_INIT_TIMEOUT_SECS,
        };

        // the event buffer clamps this further
        let events_capacity = match lookup("FLAG_EVENTS_CAPACITY") {
            Some(value) => parse("FLAG_EVENTS_CAPACITY", value)?,
            None => DEFAULT_EVENTS_CAPACITY,
        };

        Ok(Self {
            port,
            backend_url,
            variant,
            init_timeout: Duration::from_secs(init_timeout_secs),
            events_capacity,
        })
    }

    pub fn addr(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}

fn parse<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value })
}
