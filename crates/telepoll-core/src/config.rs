use std::{env, fmt, fs, io, path::Path, time::Duration};

use crate::{errors::Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Typed configuration, split per component so each one only sees what it needs.
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub poller: PollerConfig,
    pub dispatch: DispatchConfig,
}

/// Settings for the HTTP adapter.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_base: String,
    /// Per-request timeout; always larger than `long_poll`.
    pub request_timeout: Duration,
    /// `timeout` passed to `getUpdates`. Zero means short polling.
    pub long_poll: Duration,
}

impl TelegramConfig {
    /// `https://api.telegram.org/bot<token>`
    pub fn bot_url(&self) -> String {
        format!("{}/bot{}", self.api_base.trim_end_matches('/'), self.bot_token)
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(10),
            long_poll: Duration::ZERO,
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .field("long_poll", &self.long_poll)
            .finish()
    }
}

/// Settings for the event loop.
#[derive(Clone, Copy, Debug)]
pub struct PollerConfig {
    /// Fixed delay after a failed fetch.
    pub backoff: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(3),
        }
    }
}

/// What to do with a command-looking message whose command is not registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownCommands {
    /// Silently drop the update.
    #[default]
    Drop,
    /// Offer the message to the generic message handlers.
    FallThrough,
}

/// Settings for the dispatcher.
#[derive(Clone, Copy, Debug)]
pub struct DispatchConfig {
    pub command_prefix: char,
    pub unknown_commands: UnknownCommands,
    /// Log every routed update at debug level.
    pub debug: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            command_prefix: '/',
            unknown_commands: UnknownCommands::Drop,
            debug: false,
        }
    }
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"))?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let api_base = lookup("TELEGRAM_API_BASE")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let long_poll =
            Duration::from_secs(parse_u64(&lookup, "TELEPOLL_LONG_POLL_SECS")?.unwrap_or(0));
        let mut request_timeout = Duration::from_millis(
            parse_u64(&lookup, "TELEPOLL_REQUEST_TIMEOUT_MS")?.unwrap_or(10_000),
        );
        if !long_poll.is_zero() {
            // The HTTP client must outlive the server-side long-poll window.
            request_timeout = request_timeout.max(long_poll + Duration::from_secs(5));
        }

        let backoff =
            Duration::from_millis(parse_u64(&lookup, "TELEPOLL_BACKOFF_MS")?.unwrap_or(3_000));

        let command_prefix = match lookup("TELEPOLL_COMMAND_PREFIX").and_then(non_empty) {
            None => '/',
            Some(s) => {
                let mut chars = s.trim().chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_whitespace() => c,
                    _ => {
                        return Err(Error::Config(format!(
                            "TELEPOLL_COMMAND_PREFIX must be a single character, got {s:?}"
                        )))
                    }
                }
            }
        };

        let unknown_commands = match lookup("TELEPOLL_UNKNOWN_COMMANDS")
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            None | Some("") | Some("drop") => UnknownCommands::Drop,
            Some("fallthrough") | Some("fall-through") => UnknownCommands::FallThrough,
            Some(other) => {
                return Err(Error::Config(format!(
                    "TELEPOLL_UNKNOWN_COMMANDS must be `drop` or `fallthrough`, got {other:?}"
                )))
            }
        };

        let debug = lookup("TELEPOLL_DEBUG").map(|s| parse_bool(&s)).unwrap_or(false);

        Ok(Self {
            telegram: TelegramConfig {
                bot_token,
                api_base,
                request_timeout,
                long_poll,
            },
            poller: PollerConfig { backoff },
            dispatch: DispatchConfig {
                command_prefix,
                unknown_commands,
                debug,
            },
        })
    }
}

/// Export `.env` entries that are not already set. A missing file is not an error.
fn load_dotenv_if_present(path: &Path) -> Result<()> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    for (key, value) in dotenv_entries(&contents) {
        if env::var_os(key).is_none() {
            env::set_var(key, value);
        }
    }
    Ok(())
}

/// `KEY=value` lines; blanks, `#` comments and an `export ` prefix are tolerated.
fn dotenv_entries(contents: &str) -> impl Iterator<Item = (&str, &str)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key, unquote(value.trim())))
        })
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|&q| value.strip_prefix(q)?.strip_suffix(q))
        .unwrap_or(value)
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|e| Error::Config(format!("{key} must be a non-negative integer: {e}")))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(s: String) -> Option<String> {
    (!s.trim().is_empty()).then_some(s)
}
