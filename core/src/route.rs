//! URL templates and query-string encoding.
//!
//! A template is a `/`-separated path where `:name` marks a required
//! parameter and `:name?` an optional one. Expansion percent-encodes
//! values and drops omitted optional segments; the assembled URL is
//! stripped of trailing slashes (the query string, if any, survives).

use crate::error::ApiError;
use crate::state::Params;
use serde_json::Value;

/// A parsed URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Parameter { name: String, optional: bool },
}

impl RouteTemplate {
    /// Parse a template such as `base/color/:id?`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Route`] for an empty parameter name (`:` or
    /// `:?` segments).
    pub fn parse(template: &str) -> Result<Self, ApiError> {
        let mut segments = Vec::new();
        for part in template.split('/') {
            if part.is_empty() {
                continue;
            }
            if let Some(name) = part.strip_prefix(':') {
                let (name, optional) = name
                    .strip_suffix('?')
                    .map_or((name, false), |stripped| (stripped, true));
                if name.is_empty() {
                    return Err(ApiError::Route(format!(
                        "empty parameter name in template {template}"
                    )));
                }
                segments.push(Segment::Parameter {
                    name: name.to_owned(),
                    optional,
                });
            } else {
                segments.push(Segment::Literal(part.to_owned()));
            }
        }
        Ok(Self {
            raw: template.to_owned(),
            segments,
        })
    }

    /// The template string this route was parsed from.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Substitute `parameters` into the template, producing a `/`-prefixed
    /// path (empty for an empty template).
    ///
    /// Optional parameters may be omitted, but only together with every
    /// parameter that follows them in the path.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Route`] when a required parameter is missing,
    /// a provided parameter follows an omitted optional one, or a value
    /// is not a scalar.
    pub fn expand(&self, parameters: &Params) -> Result<String, ApiError> {
        let mut path = String::new();
        let mut omitted = false;
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => {
                    path.push('/');
                    path.push_str(literal);
                }
                Segment::Parameter { name, optional } => match parameters.get(name) {
                    Some(value) => {
                        if omitted {
                            return Err(ApiError::Route(format!(
                                "parameter {name} follows an omitted optional parameter in {}",
                                self.raw
                            )));
                        }
                        path.push('/');
                        path.push_str(&render_scalar(value).ok_or_else(|| {
                            ApiError::Route(format!("parameter {name} must be a scalar"))
                        })?);
                    }
                    None if *optional => omitted = true,
                    None => {
                        return Err(ApiError::Route(format!(
                            "missing required parameter {name} for template {}",
                            self.raw
                        )));
                    }
                },
            }
        }
        Ok(path)
    }
}

/// Render a scalar JSON value for use in a path segment, percent-encoded.
fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(urlencoding::encode(text).into_owned()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(boolean) => Some(boolean.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Serialize a JSON object into a query string (`offset=0&limit=50`).
///
/// Arrays of scalars render as repeated keys (`tag=a&tag=b`).
///
/// # Errors
///
/// Returns [`ApiError::Route`] for nested objects or arrays of
/// non-scalars.
pub fn encode_query(parameters: &Params) -> Result<String, ApiError> {
    let mut pairs = Vec::new();
    for (key, value) in parameters {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push(encode_pair(key, item)?);
                }
            }
            other => pairs.push(encode_pair(key, other)?),
        }
    }
    Ok(pairs.join("&"))
}

fn encode_pair(key: &str, value: &Value) -> Result<String, ApiError> {
    let rendered = match value {
        Value::String(text) => urlencoding::encode(text).into_owned(),
        Value::Number(number) => number.to_string(),
        Value::Bool(boolean) => boolean.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => {
            return Err(ApiError::Route(format!(
                "query parameter {key} must be a scalar"
            )));
        }
    };
    Ok(format!("{}={rendered}", urlencoding::encode(key)))
}

/// Strip trailing slashes from a URL, preserving its query string.
#[must_use]
pub fn strip_trailing_slashes(url: &str) -> String {
    match url.split_once('?') {
        Some((path, query)) => format!("{}?{query}", path.trim_end_matches('/')),
        None => url.trim_end_matches('/').to_owned(),
    }
}
