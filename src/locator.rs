//! Immutable IRI values.
//!
//! A [`Locator`] compares by its reference string; no network access or
//! normalisation beyond what the caller supplied takes place. Relative
//! references are resolved with the algorithm of RFC 3986 section 5.2.

use lazy_static::lazy_static;
use regex::Regex;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Result, TopicMapError};

lazy_static! {
    // RFC 3986, Appendix B
    static ref REFERENCE: Regex =
        Regex::new(r"(?s)^(([^:/?#]+):)?(//([^/?#]*))?([^?#]*)(\?([^#]*))?(#(.*))?$").unwrap();
    static ref SCHEME: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*$").unwrap();
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator {
    reference: Arc<str>,
}

impl Locator {
    /// Creates a locator from an IRI. Empty and fragment-only input is refused.
    pub fn new(iri: &str) -> Result<Self> {
        if iri.is_empty() {
            return Err(malformed(iri, "the IRI is empty"));
        }
        if iri.starts_with('#') {
            return Err(malformed(iri, "a fragment alone does not identify anything"));
        }
        check(iri)?;
        Ok(Self::trusted(iri))
    }
    // Only for input that is known to be well formed, such as the constants in `datatype`.
    pub(crate) fn trusted(iri: &str) -> Self {
        Self {
            reference: Arc::from(iri),
        }
    }
    pub fn reference(&self) -> &str {
        &self.reference
    }
    /// The reference with every character outside the URI character set percent-encoded.
    pub fn external_form(&self) -> String {
        let mut encoded = String::with_capacity(self.reference.len());
        for c in self.reference.chars() {
            if c.is_ascii() && !matches!(c, ' ' | '"' | '<' | '>' | '\\' | '^' | '`' | '{' | '|' | '}') && !c.is_ascii_control() {
                encoded.push(c);
            } else {
                let mut buffer = [0u8; 4];
                for byte in c.encode_utf8(&mut buffer).bytes() {
                    encoded.push_str(&format!("%{:02X}", byte));
                }
            }
        }
        encoded
    }
    pub fn is_absolute(&self) -> bool {
        Components::parse(&self.reference).scheme.is_some()
    }
    /// Resolves `reference` against this locator as the base IRI.
    pub fn resolve(&self, reference: &str) -> Result<Locator> {
        check(reference)?;
        let base = Components::parse(&self.reference);
        let relative = Components::parse(reference);
        let target = if relative.scheme.is_some() {
            Target {
                scheme: relative.scheme,
                authority: relative.authority,
                path: remove_dot_segments(relative.path),
                query: relative.query,
            }
        } else if relative.authority.is_some() {
            Target {
                scheme: base.scheme,
                authority: relative.authority,
                path: remove_dot_segments(relative.path),
                query: relative.query,
            }
        } else if relative.path.is_empty() {
            Target {
                scheme: base.scheme,
                authority: base.authority,
                path: base.path.to_string(),
                query: relative.query.or(base.query),
            }
        } else if relative.path.starts_with('/') {
            Target {
                scheme: base.scheme,
                authority: base.authority,
                path: remove_dot_segments(relative.path),
                query: relative.query,
            }
        } else {
            Target {
                scheme: base.scheme,
                authority: base.authority,
                path: remove_dot_segments(&merge(&base, relative.path)),
                query: relative.query,
            }
        };
        let mut resolved = String::new();
        if let Some(scheme) = target.scheme {
            resolved.push_str(scheme);
            resolved.push(':');
        }
        if let Some(authority) = target.authority {
            resolved.push_str("//");
            resolved.push_str(authority);
        }
        resolved.push_str(&target.path);
        if let Some(query) = target.query {
            resolved.push('?');
            resolved.push_str(query);
        }
        if let Some(fragment) = relative.fragment {
            resolved.push('#');
            resolved.push_str(fragment);
        }
        if resolved.is_empty() {
            return Err(malformed(reference, "resolves to an empty IRI"));
        }
        Ok(Self::trusted(&resolved))
    }
}

fn malformed(iri: &str, reason: &str) -> TopicMapError {
    TopicMapError::MalformedIri {
        iri: iri.to_string(),
        reason: reason.to_string(),
    }
}

fn check(iri: &str) -> Result<()> {
    if iri.chars().any(|c| c.is_control()) {
        return Err(malformed(iri, "control characters are not allowed"));
    }
    if let Some(scheme) = Components::parse(iri).scheme {
        if !SCHEME.is_match(scheme) {
            return Err(malformed(iri, "invalid scheme"));
        }
    }
    Ok(())
}

struct Components<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}
impl<'a> Components<'a> {
    fn parse(iri: &'a str) -> Self {
        match REFERENCE.captures(iri) {
            Some(captures) => Self {
                scheme: captures.get(2).map(|m| m.as_str()),
                authority: captures.get(4).map(|m| m.as_str()),
                path: captures.get(5).map_or("", |m| m.as_str()),
                query: captures.get(7).map(|m| m.as_str()),
                fragment: captures.get(9).map(|m| m.as_str()),
            },
            // the expression matches every string, but stay total anyway
            None => Self {
                scheme: None,
                authority: None,
                path: iri,
                query: None,
                fragment: None,
            },
        }
    }
}

struct Target<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: String,
    query: Option<&'a str>,
}

// RFC 3986, 5.2.3
fn merge(base: &Components, path: &str) -> String {
    if base.authority.is_some() && base.path.is_empty() {
        format!("/{}", path)
    } else {
        match base.path.rfind('/') {
            Some(position) => format!("{}{}", &base.path[..=position], path),
            None => path.to_string(),
        }
    }
}

// RFC 3986, 5.2.4
fn remove_dot_segments(path: &str) -> String {
    let mut input = path;
    let mut output = String::with_capacity(path.len());
    while !input.is_empty() {
        if let Some(rest) = input.strip_prefix("../") {
            input = rest;
        } else if let Some(rest) = input.strip_prefix("./") {
            input = rest;
        } else if input.starts_with("/./") {
            input = &input[2..];
        } else if input == "/." {
            input = "/";
        } else if input.starts_with("/../") {
            input = &input[3..];
            truncate_last_segment(&mut output);
        } else if input == "/.." {
            input = "/";
            truncate_last_segment(&mut output);
        } else if input == "." || input == ".." {
            input = "";
        } else {
            let start = if input.starts_with('/') { 1 } else { 0 };
            let end = input[start..].find('/').map_or(input.len(), |i| i + start);
            output.push_str(&input[..end]);
            input = &input[end..];
        }
    }
    output
}

fn truncate_last_segment(output: &mut String) {
    match output.rfind('/') {
        Some(position) => output.truncate(position),
        None => output.clear(),
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.reference)
    }
}
impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}>", self.reference)
    }
}
impl FromStr for Locator {
    type Err = TopicMapError;
    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
impl TryFrom<&str> for Locator {
    type Error = TopicMapError;
    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
impl AsRef<str> for Locator {
    fn as_ref(&self) -> &str {
        &self.reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_segments_are_removed() {
        assert_eq!(remove_dot_segments("/a/b/c/./../../g"), "/a/g");
        assert_eq!(remove_dot_segments("mid/content=5/../6"), "mid/6");
        assert_eq!(remove_dot_segments("/.."), "/");
    }

    #[test]
    fn external_form_encodes_non_ascii() {
        let locator = Locator::new("http://example.org/caf\u{e9} au lait").unwrap();
        assert_eq!(locator.external_form(), "http://example.org/caf%C3%A9%20au%20lait");
        assert_eq!(locator.reference(), "http://example.org/caf\u{e9} au lait");
    }
}
