//! Connection descriptor parsing.
//!
//! A descriptor is a URI-like string such as
//! `user:password@account/database/schema?warehouse=WH&role=ANALYST`.
//! The scheme is optional; options live in the query string.

use crate::error::ConnectionError;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Scheme used internally to parse scheme-less descriptors.
const PLACEHOLDER_SCHEME: &str = "dsn";

/// Parsed connection descriptor.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    url: Url,
    /// Whether the scheme was added during parsing and must be dropped when rendering
    implicit_scheme: bool,
    /// Text as given by the caller; cleared once options are rewritten
    original: Option<String>,
}

impl ConnectionDescriptor {
    /// Look up an option value.
    pub fn option(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// All options, in descriptor order.
    pub fn options(&self) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Copy of this descriptor without the given option.
    pub fn without_option(&self, key: &str) -> Self {
        let options = self
            .options()
            .into_iter()
            .filter(|(k, _)| k != key)
            .collect();
        self.with_options(options)
    }

    /// Copy of this descriptor with an option set, replacing any previous value.
    pub fn with_option(&self, key: &str, value: &str) -> Self {
        let mut options: Vec<(String, String)> = self
            .options()
            .into_iter()
            .filter(|(k, _)| k != key)
            .collect();
        options.push((key.to_string(), value.to_string()));
        self.with_options(options)
    }

    fn with_options(&self, options: Vec<(String, String)>) -> Self {
        let mut url = self.url.clone();
        if options.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(options);
        }
        Self {
            url,
            implicit_scheme: self.implicit_scheme,
            original: None,
        }
    }

    /// Account or host part.
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// User name, if present.
    pub fn username(&self) -> &str {
        self.url.username()
    }

    /// Descriptor text handed to the driver, including credentials.
    ///
    /// An unmodified descriptor renders exactly as it was given; only a
    /// descriptor with rewritten options is rebuilt from its parsed form.
    pub(crate) fn render(&self) -> String {
        match &self.original {
            Some(text) => text.clone(),
            None => render_url(&self.url, self.implicit_scheme),
        }
    }

    /// Descriptor text safe for logs: the password is masked.
    pub fn redacted(&self) -> String {
        let mut url = self.url.clone();
        if url.password().is_some() {
            let _ = url.set_password(Some("***"));
        }
        render_url(&url, self.implicit_scheme)
    }
}

fn render_url(url: &Url, implicit_scheme: bool) -> String {
    let text = url.as_str();
    if implicit_scheme {
        text.strip_prefix(PLACEHOLDER_SCHEME)
            .and_then(|rest| rest.strip_prefix("://"))
            .unwrap_or(text)
            .to_string()
    } else {
        text.to_string()
    }
}

impl FromStr for ConnectionDescriptor {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(ConnectionError::InvalidDescriptor(
                "connection string cannot be empty".to_string(),
            ));
        }

        let (candidate, implicit_scheme) = if text.contains("://") {
            (text.to_string(), false)
        } else {
            (format!("{}://{}", PLACEHOLDER_SCHEME, text), true)
        };

        let url = Url::parse(&candidate)
            .map_err(|e| ConnectionError::InvalidDescriptor(e.to_string()))?;

        Ok(Self {
            url,
            implicit_scheme,
            original: Some(s.to_string()),
        })
    }
}

// Prevent the password from being displayed in debug output
impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("descriptor", &self.redacted())
            .finish()
    }
}
