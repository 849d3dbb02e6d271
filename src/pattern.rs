use std::{fmt, sync::Arc};

use crate::error::RouteError;

/// Segment
///
/// One compiled piece of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the request segment exactly (case-sensitive).
    Literal(String),
    /// Binds any single non-empty request segment under this name.
    Capture(String),
}

/// Pattern
///
/// A route path compiled at registration time, e.g. `/active/:id/:secret`.
/// Capture names are fixed positional slots: matching fills values by index
/// and never looks names up while walking the path.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
    names: Arc<[String]>,
}

impl Pattern {
    /// parse
    ///
    /// Compiles a pattern string. The pattern must be absolute, must not
    /// contain empty segments (so no `//` and no trailing `/` except for the
    /// root itself), and capture names must be non-empty and unique.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let invalid = |reason| RouteError::InvalidPattern {
            pattern: raw.to_string(),
            reason,
        };

        let rest = raw.strip_prefix('/').ok_or_else(|| invalid("must start with '/'"))?;

        let mut segments = Vec::new();
        let mut names: Vec<String> = Vec::new();

        if !rest.is_empty() {
            for piece in rest.split('/') {
                if piece.is_empty() {
                    return Err(invalid("empty path segment"));
                }
                match piece.strip_prefix(':') {
                    Some("") => return Err(invalid("capture without a name")),
                    Some(name) => {
                        if names.iter().any(|n| n == name) {
                            return Err(invalid("capture name used twice"));
                        }
                        names.push(name.to_string());
                        segments.push(Segment::Capture(name.to_string()));
                    }
                    None => segments.push(Segment::Literal(piece.to_string())),
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
            names: names.into(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn capture_names(&self) -> &[String] {
        &self.names
    }

    /// Builds the parameter set from capture values in slot order.
    pub(crate) fn bind(&self, values: Vec<String>) -> PathParams {
        debug_assert_eq!(values.len(), self.names.len());
        PathParams {
            names: Arc::clone(&self.names),
            values,
        }
    }

    /// Renders the pattern in OpenAPI form (`/article/{id}`).
    pub fn to_openapi(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(literal) => format!("/{literal}"),
                Segment::Capture(name) => format!("/{{{name}}}"),
            })
            .collect()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Splits a request path into its segments. `/` yields no segments; a path
/// that is not absolute yields `None`.
pub(crate) fn split_path(path: &str) -> Option<Vec<&str>> {
    let rest = path.strip_prefix('/')?;
    if rest.is_empty() {
        return Some(Vec::new());
    }
    Some(rest.split('/').collect())
}

/// PathParams
///
/// Values captured from the request path, addressed by the capture names of
/// the matched pattern. Values are the raw (not percent-decoded) segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    names: Arc<[String]>,
    values: Vec<String>,
}

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i].as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}
