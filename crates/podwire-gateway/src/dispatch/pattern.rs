//! Path patterns with positional `:name` segments.
//!
//! Matching is segment by segment, no regex: a literal segment must equal the
//! path segment, a `:name` segment binds any non-empty run without `/`. The
//! whole path must be consumed, so `/containers/:id` rejects both
//! `/containers/` and `/containers/abc/extra`.

use podwire_core::error::{PodwireError, Result};
use podwire_core::protocol::Params;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self> {
        if !raw.starts_with('/') {
            return Err(PodwireError::BadRequest(format!("pattern must start with '/': {raw}")));
        }

        let mut segments = Vec::new();
        for seg in raw.split('/').skip(1) {
            match seg.strip_prefix(':') {
                Some(name) => {
                    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                        return Err(PodwireError::BadRequest(format!(
                            "invalid parameter name in pattern: {raw}"
                        )));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(seg.to_string())),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Bindings for `path` if it matches, in pattern order.
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let rest = path.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let mut params = Params::new();

        for seg in &self.segments {
            let part = parts.next()?;
            match seg {
                Segment::Literal(lit) => {
                    if part != lit {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.push(name.as_str(), part);
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }

    pub fn matches(&self, path: &str) -> bool {
        self.match_path(path).is_some()
    }
}
