//! Relay server URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated relay server base URL.
///
/// The directory keys servers by URL, so two spellings of the same base
/// (`http://host:3002` and `http://host:3002/`) must compare equal. The
/// canonical form never carries a trailing slash.
///
/// # Example
///
/// ```
/// use desu_core::ServerUrl;
///
/// let url = ServerUrl::new("http://localhost:9350/").unwrap();
/// assert_eq!(url.as_str(), "http://localhost:9350");
/// assert_eq!(url.endpoint("/info"), "http://localhost:9350/info");
///
/// let prefixed = ServerUrl::new("https://relay.example.com/desu").unwrap();
/// assert_eq!(prefixed.endpoint("/"), "https://relay.example.com/desu/");
/// ```
#[derive(Clone, Debug)]
pub struct ServerUrl {
    url: Url,
    canonical: String,
}

impl ServerUrl {
    /// Create a new server URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse, is not absolute, does not
    /// use `http`/`https`, or carries a query or fragment.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::ServerUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        let canonical = url.as_str().trim_end_matches('/').to_string();

        Ok(Self { url, canonical })
    }

    /// Returns the URL of an endpoint below this base (`path` starts with `/`).
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.canonical, path)
    }

    /// Returns the canonical base URL as a string.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        let reject = |reason: &str| -> Error {
            InvalidInputError::ServerUrl {
                value: original.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        if url.cannot_be_a_base() {
            return Err(reject("must be an absolute URL"));
        }

        if !matches!(url.scheme(), "http" | "https") {
            return Err(reject("must use http or https"));
        }

        if url.host_str().is_none() {
            return Err(reject("must have a host"));
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(reject("must not carry a query or fragment"));
        }

        Ok(())
    }
}

impl PartialEq for ServerUrl {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for ServerUrl {}

impl Hash for ServerUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for ServerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl FromStr for ServerUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ServerUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.canonical)
    }
}

impl<'de> Deserialize<'de> for ServerUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ServerUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for ServerUrl {
    fn as_ref(&self) -> &str {
        &self.canonical
    }
}
