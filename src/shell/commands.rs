//! Shell Commands
//!
//! Parses command lines and executes them against a string cache.
//!
//! Verbs are case-insensitive; keys and values are single whitespace-free
//! tokens. Anything after the value of SET is read as a duration, so
//! `SET session abc 3 seconds` works.

use std::time::Duration;

use crate::cache::Cache;
use crate::duration::parse_duration;
use crate::error::{CacheError, Result};
use crate::shell::responses::{
    CountResponse, ErrorResponse, ExistsResponse, KeysResponse, MessageResponse, Response,
    StatsResponse, ValueResponse, ValuesResponse,
};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// The cache the shell operates on.
pub type StringCache = Cache<String, String>;

pub const HELP: &str = "SET key value [max_age] | GET key | PEEK key | HAS key | DEL key | \
EVICT | PRUNE | KEYS | VALUES | SIZE | LEN | STATS | \
CONFIG max_length|max_age|max_idle|max_size value | HELP | QUIT";

/// A configurable cache bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    MaxLength,
    MaxAge,
    MaxIdle,
    MaxSize,
}

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set {
        key: String,
        value: String,
        max_age: Option<Duration>,
    },
    Get { key: String },
    Peek { key: String },
    Has { key: String },
    Del { key: String },
    Evict,
    Prune,
    Keys,
    Values,
    Size,
    Len,
    Stats,
    Config { setting: Setting, value: String },
    Help,
    Quit,
}

impl Command {
    /// Parses a single command line.
    pub fn parse(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        let verb = tokens
            .next()
            .ok_or_else(|| CacheError::InvalidCommand("Empty command".to_string()))?
            .to_ascii_uppercase();
        let rest: Vec<&str> = tokens.collect();

        let command = match verb.as_str() {
            "SET" => {
                let [key, value, duration @ ..] = rest.as_slice() else {
                    return Err(usage("SET key value [max_age]"));
                };
                let max_age = if duration.is_empty() {
                    None
                } else {
                    Some(parse_duration(duration.join(" "))?)
                };
                Command::Set {
                    key: key.to_string(),
                    value: value.to_string(),
                    max_age,
                }
            }
            "GET" => Command::Get {
                key: single_key(&rest, "GET key")?,
            },
            "PEEK" => Command::Peek {
                key: single_key(&rest, "PEEK key")?,
            },
            "HAS" => Command::Has {
                key: single_key(&rest, "HAS key")?,
            },
            "DEL" => Command::Del {
                key: single_key(&rest, "DEL key")?,
            },
            "CONFIG" => {
                let [name, value @ ..] = rest.as_slice() else {
                    return Err(usage("CONFIG setting value"));
                };
                if value.is_empty() {
                    return Err(usage("CONFIG setting value"));
                }
                let setting = match name.to_ascii_lowercase().as_str() {
                    "max_length" => Setting::MaxLength,
                    "max_age" => Setting::MaxAge,
                    "max_idle" => Setting::MaxIdle,
                    "max_size" => Setting::MaxSize,
                    other => {
                        return Err(CacheError::InvalidCommand(format!(
                            "Unknown setting '{}'",
                            other
                        )))
                    }
                };
                Command::Config {
                    setting,
                    value: value.join(" "),
                }
            }
            "EVICT" => no_args(&rest, Command::Evict)?,
            "PRUNE" => no_args(&rest, Command::Prune)?,
            "KEYS" => no_args(&rest, Command::Keys)?,
            "VALUES" => no_args(&rest, Command::Values)?,
            "SIZE" => no_args(&rest, Command::Size)?,
            "LEN" => no_args(&rest, Command::Len)?,
            "STATS" => no_args(&rest, Command::Stats)?,
            "HELP" => Command::Help,
            "QUIT" | "EXIT" => Command::Quit,
            other => {
                return Err(CacheError::InvalidCommand(format!(
                    "Unknown command '{}'",
                    other
                )))
            }
        };

        Ok(command)
    }
}

fn usage(expected: &str) -> CacheError {
    CacheError::InvalidCommand(format!("Usage: {}", expected))
}

fn single_key(rest: &[&str], expected: &str) -> Result<String> {
    match rest {
        [key] => Ok(key.to_string()),
        _ => Err(usage(expected)),
    }
}

fn no_args(rest: &[&str], command: Command) -> Result<Command> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(CacheError::InvalidCommand(format!(
            "{:?} takes no arguments",
            command
        )))
    }
}

/// Validates a key/value pair before it reaches the cache.
fn validate(key: &str, value: &str) -> Result<()> {
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidCommand(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if value.len() > MAX_VALUE_SIZE {
        return Err(CacheError::InvalidCommand(format!(
            "Value exceeds maximum size of {} bytes",
            MAX_VALUE_SIZE
        )));
    }
    Ok(())
}

/// Runs a command against the cache.
///
/// `Quit` is handled by the caller and answers like `Help` here.
pub fn execute(cache: &mut StringCache, command: Command) -> Result<Response> {
    let response = match command {
        Command::Set {
            key,
            value,
            max_age,
        } => {
            validate(&key, &value)?;
            let message = MessageResponse::set(&key);
            match max_age {
                Some(max_age) => cache.set_with_max_age(key, value, max_age)?,
                None => cache.set(key, value)?,
            }
            Response::Message(message)
        }
        Command::Get { key } => {
            let value = cache.get(&key);
            Response::Value(ValueResponse::new(key, value))
        }
        Command::Peek { key } => {
            let value = cache.peek(&key);
            Response::Value(ValueResponse::new(key, value))
        }
        Command::Has { key } => {
            let exists = cache.has(&key);
            Response::Exists(ExistsResponse { key, exists })
        }
        Command::Del { key } => match cache.remove(&key) {
            Some(_) => Response::Message(MessageResponse::deleted(&key)),
            None => Response::Error(ErrorResponse::new(format!("Key not found: {}", key))),
        },
        Command::Evict => {
            let count = u64::from(cache.evict().is_some());
            Response::Count(CountResponse { count })
        }
        Command::Prune => {
            let count = cache.prune(true)? as u64 + cache.prune_expired() as u64;
            Response::Count(CountResponse { count })
        }
        Command::Keys => Response::Keys(KeysResponse { keys: cache.keys() }),
        Command::Values => Response::Values(ValuesResponse {
            values: cache.values(),
        }),
        Command::Size => Response::Count(CountResponse {
            count: cache.total_size()?,
        }),
        Command::Len => Response::Count(CountResponse {
            count: cache.len() as u64,
        }),
        Command::Stats => Response::Stats(StatsResponse::new(cache.stats())),
        Command::Config { setting, value } => {
            apply_setting(cache, setting, &value)?;
            Response::Message(MessageResponse::new(format!(
                "{:?} set to {}",
                setting, value
            )))
        }
        Command::Help | Command::Quit => Response::Message(MessageResponse::new(HELP)),
    };

    Ok(response)
}

fn apply_setting(cache: &mut StringCache, setting: Setting, value: &str) -> Result<()> {
    let number = || {
        value
            .parse::<u64>()
            .map_err(|_| CacheError::InvalidCommand(format!("'{}' is not a number", value)))
    };

    match setting {
        Setting::MaxLength => cache.set_max_length(number()? as usize),
        Setting::MaxAge => cache.set_max_age_str(value)?,
        Setting::MaxIdle => cache.set_max_idle_str(value)?,
        Setting::MaxSize => cache.set_max_size(number()?)?,
    }
    Ok(())
}
