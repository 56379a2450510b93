//! Route pattern compilation and matching.
//!
//! A route key is one of three forms:
//!
//! - `exact/path`: matches only the identical path
//! - `/users/:id`: every `:name` token becomes a named capture over `[A-Za-z0-9.\-+_]`,
//!   and the whole pattern is anchored at both ends
//! - `^regex` or `/^regex/flags`: used as a raw regular expression
//!
//! Candidate paths are expected to pass [`is_safe_path`] before they are matched.

use std::fmt;

use omni_http::protocol::Params;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static PARAM_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([a-zA-Z0-9]+)").expect("param token regex is valid"));

static SAFE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\-~/.]{1,400}$").expect("safe path regex is valid"));

const PARAM_CAPTURE: &str = r"(?P<${1}>[a-zA-Z0-9.\-+_]+?)";

const REGEX_FLAGS: &str = "imsxU";

#[derive(Error, Debug, Clone)]
pub enum PatternError {
    #[error("`{pattern}` is not a valid regex: {source}")]
    InvalidRegex { pattern: String, source: regex::Error },

    #[error("`{pattern}` has unsupported regex flags `{flags}`")]
    InvalidFlags { pattern: String, flags: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    Exact,
    NamedRegex,
    RawRegex,
}

/// A compiled route key.
#[derive(Clone)]
pub struct RoutePattern {
    raw: String,
    kind: MatcherKind,
    names: Vec<String>,
    regex: Option<Regex>,
}

impl RoutePattern {
    pub fn compile(raw: &str) -> Result<Self, PatternError> {
        if raw.starts_with('^') {
            let regex = build_regex(raw, raw)?;
            return Ok(Self::regex(raw, MatcherKind::RawRegex, vec![], regex));
        }

        if let Some((body, flags)) = split_delimited(raw) {
            if flags.chars().any(|c| !REGEX_FLAGS.contains(c)) {
                return Err(PatternError::InvalidFlags { pattern: raw.to_owned(), flags: flags.to_owned() });
            }
            let source = if flags.is_empty() { body.to_owned() } else { format!("(?{flags}){body}") };
            let regex = build_regex(raw, &source)?;
            return Ok(Self::regex(raw, MatcherKind::RawRegex, vec![], regex));
        }

        if !raw.contains(':') && !raw.contains('^') {
            return Ok(Self { raw: raw.to_owned(), kind: MatcherKind::Exact, names: vec![], regex: None });
        }

        let names = PARAM_TOKEN.captures_iter(raw).map(|caps| caps[1].to_owned()).collect::<Vec<_>>();
        let source = format!("^{}$", PARAM_TOKEN.replace_all(raw, PARAM_CAPTURE));
        let regex = build_regex(raw, &source)?;
        Ok(Self::regex(raw, MatcherKind::NamedRegex, names, regex))
    }

    fn regex(raw: &str, kind: MatcherKind, names: Vec<String>, regex: Regex) -> Self {
        Self { raw: raw.to_owned(), kind, names, regex: Some(regex) }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> MatcherKind {
        self.kind
    }

    /// Capture names in the order their tokens appear; empty unless the kind is `NamedRegex`.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Matches `path` against the pattern.
    ///
    /// `None` means no match. `Some` holds the captures in pattern order and may be empty:
    /// an exact pattern matches with zero captures.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let Some(regex) = &self.regex else {
            return (path == self.raw).then(Params::new);
        };

        let caps = regex.captures(path)?;
        let mut params = Params::new();

        match self.kind {
            MatcherKind::NamedRegex => {
                for name in &self.names {
                    params.push_named(name, caps.name(name).map_or("", |m| m.as_str()));
                }
            }
            _ => {
                for (index, name) in regex.capture_names().enumerate().skip(1) {
                    let value = caps.get(index).map_or("", |m| m.as_str());
                    match name {
                        Some(name) => params.push_named(name, value),
                        None => params.push_unnamed(value),
                    }
                }
            }
        }

        Some(params)
    }
}

impl fmt::Debug for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutePattern")
            .field("raw", &self.raw)
            .field("kind", &self.kind)
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

/// Returns true when `path` only holds word characters, `-`, `~`, `/` and `.`, and is at
/// most 400 bytes long.
pub fn is_safe_path(path: &str) -> bool {
    SAFE_PATH.is_match(path)
}

/// Splits `/^body/flags` into its body and flags.
fn split_delimited(raw: &str) -> Option<(&str, &str)> {
    let inner = raw.strip_prefix('/').filter(|rest| rest.starts_with('^'))?;
    let end = inner.rfind('/')?;
    Some((&inner[..end], &inner[end + 1..]))
}

fn build_regex(raw: &str, source: &str) -> Result<Regex, PatternError> {
    Regex::new(source).map_err(|source| PatternError::InvalidRegex { pattern: raw.to_owned(), source })
}
