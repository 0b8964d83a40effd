//! API commands and their form encoding.
//!
//! Every request to the command endpoint is a flat map of string keys to
//! string values. `cmd` names the operation and `token` carries the session
//! credential (empty when logged out).

use std::collections::BTreeMap;

/// Conversion of a parameter value into its wire text.
///
/// Booleans are sent as `"1"`/`"0"`.
pub trait IntoParam {
    /// Returns the value as it is sent on the wire, before percent-encoding.
    fn into_param(self) -> String;
}

impl IntoParam for String {
    fn into_param(self) -> String {
        self
    }
}

impl IntoParam for &str {
    fn into_param(self) -> String {
        self.to_string()
    }
}

impl IntoParam for &String {
    fn into_param(self) -> String {
        self.clone()
    }
}

impl IntoParam for bool {
    fn into_param(self) -> String {
        String::from(if self { "1" } else { "0" })
    }
}

macro_rules! int_param {
    ($($t:ty),*) => {
        $(impl IntoParam for $t {
            fn into_param(self) -> String {
                self.to_string()
            }
        })*
    };
}

int_param!(i32, i64, u32, u64, usize);

/// A single API command.
///
/// Keys are kept sorted so that [`Command::encode`] is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    params: BTreeMap<String, String>,
}

impl Command {
    /// Creates a command with the given `cmd` name and an empty token.
    pub fn new(cmd: &str) -> Self {
        let mut params = BTreeMap::new();
        params.insert("cmd".to_string(), cmd.to_string());
        params.insert("token".to_string(), String::new());
        Self { params }
    }

    /// Sets a parameter, replacing any earlier value for `key`.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl IntoParam) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a parameter only when `value` is present.
    #[must_use]
    pub fn with_opt<V: IntoParam>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    /// Sets `key` to `"1"` when `flag` is true and leaves it unset otherwise.
    #[must_use]
    pub fn with_flag(self, key: &str, flag: bool) -> Self {
        if flag {
            self.with(key, true)
        } else {
            self
        }
    }

    /// Sets a parameter in place.
    pub fn set(&mut self, key: &str, value: impl IntoParam) {
        self.params.insert(key.to_string(), value.into_param());
    }

    /// Sets the session token.
    pub fn set_token(&mut self, token: &str) {
        self.set("token", token);
    }

    /// Returns the operation name.
    pub fn name(&self) -> &str {
        self.get("cmd").unwrap_or_default()
    }

    /// Returns the value of a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Iterates over the parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns true for read-only commands that are safe to resend.
    pub fn is_idempotent(&self) -> bool {
        let name = self.name();
        name.starts_with("list") || name.starts_with("view") || name == "search"
    }

    /// Encodes the command as an `application/x-www-form-urlencoded` body.
    ///
    /// Keys and values are percent-encoded; spaces become `%20`.
    pub fn encode(&self) -> String {
        self.params
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}
