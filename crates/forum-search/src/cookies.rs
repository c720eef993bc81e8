//! Minimal cookie accumulation for a single search session.
//!
//! Only the `name=value` part of each `Set-Cookie` header is kept; attributes
//! such as `Path`, `Expires` or `HttpOnly` are discarded. Re-setting a cookie
//! replaces its value in place, so a redirect chain that sets the same cookie
//! twice still produces a single well-formed `Cookie` header.

use std::fmt;

/// Ordered set of cookie name/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    pairs: Vec<(String, String)>,
}

impl CookieJar {
    /// Create an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cookie.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.pairs.push((name, value)),
        }
    }

    /// Parse one `Set-Cookie` header value and store its `name=value` pair.
    ///
    /// Returns `false` when the header carries no usable pair.
    pub fn store_set_cookie(&mut self, header: &str) -> bool {
        match parse_set_cookie(header) {
            Some((name, value)) => {
                self.insert(name, value);
                true
            }
            None => false,
        }
    }

    /// Merge every cookie from `other`, overriding existing values.
    pub fn extend(&mut self, other: &CookieJar) {
        for (name, value) in &other.pairs {
            self.insert(name.clone(), value.clone());
        }
    }

    /// Look up a cookie value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// True when no cookie has been stored.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of distinct cookie names.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// `(name, value)` pairs in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Render as a `Cookie` request header value, or `None` when empty.
    pub fn header_value(&self) -> Option<String> {
        if self.pairs.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for CookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

impl<'a> FromIterator<&'a str> for CookieJar {
    /// Build a jar from raw `Set-Cookie` header values.
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut jar = CookieJar::new();
        for header in iter {
            jar.store_set_cookie(header);
        }
        jar
    }
}

/// Split the leading `name=value` segment out of a `Set-Cookie` value.
fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
