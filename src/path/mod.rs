//! The HTTP path template grammar.
//!
//! Path templates are the gRPC-transcoding style patterns found in
//! `google.api.http` options: `/`-delimited segments that are literals,
//! wildcards, or brace-delimited variables, with an optional trailing
//! `:VERB` suffix.
//!
//! This grammar operates on the raw string, independently of the schema
//! token stream.

use std::fmt;

use thiserror::Error;


/// A parsed HTTP path template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    /// The path segments, in order. A template with N `/`-delimited parts
    /// (ignoring the verb) produces exactly N segments.
    pub segments: Vec<Segment>,
    /// The trailing `:VERB` suffix, if present.
    pub verb: Option<String>,
}

/// One segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A literal segment, matched verbatim.
    Literal(String),
    /// A `*` or `**` wildcard.
    Wildcard(Wildcard),
    /// A `{…}` variable capture.
    Variable(Variable),
}

/// A path wildcard.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Wildcard {
    /// `*` — matches exactly one path segment.
    Single,
    /// `**` — matches the remainder of the path, zero or more segments.
    Multi,
}

impl Wildcard {
    /// The source form of this wildcard, `*` or `**`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Wildcard::Single => "*",
            Wildcard::Multi => "**",
        }
    }
}

impl fmt::Display for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `{…}` variable capture within a path template.
///
/// Supported forms are `{name}`, `{name=seg/seg}`, `{name:pattern}` and
/// `{name=seg/seg:pattern}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Variable {
    /// The request message field the capture binds to.
    pub field: String,
    /// Extra path parts consumed by a multi-segment `{name=a/b}` capture,
    /// one entry per `/`-delimited part. Empty for single-segment captures.
    pub segments: Vec<String>,
    /// The `:pattern` suffix, captured verbatim and not interpreted.
    pub pattern: Option<String>,
}

/// An error produced while parsing a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A `{` variable was never closed by `}`.
    #[error("unterminated variable `{variable}` in path template")]
    UnterminatedVariable {
        /// The variable text read so far, without the opening brace.
        variable: String,
    },
    /// The closing `}` of a variable is not the final character of its
    /// segment.
    #[error("malformed variable `{variable}` in path template")]
    InvalidVariable {
        /// The offending segment text, without the opening brace.
        variable: String,
    },
}

/// Parses an HTTP path template into its segments and optional verb.
///
/// # Examples
///
/// ```
/// # use kite_parse::{parse_path, Segment, Wildcard};
/// let path = parse_path("/v1/entity/*:watch").unwrap();
/// assert_eq!(path.verb.as_deref(), Some("watch"));
/// assert_eq!(path.segments, vec![
///     Segment::Literal("v1".to_owned()),
///     Segment::Literal("entity".to_owned()),
///     Segment::Wildcard(Wildcard::Single),
/// ]);
/// ```
pub fn parse_path(raw: &str) -> Result<Path, PathError> {
    let (raw, verb) = split_verb(raw);

    let parts: Vec<&str> = raw.strip_prefix('/').unwrap_or(raw).split('/').collect();

    let mut segments = Vec::with_capacity(parts.len());
    let mut index = 0;
    while index < parts.len() {
        let part = parts[index];
        if part == "*" {
            segments.push(Segment::Wildcard(Wildcard::Single));
        } else if part == "**" {
            segments.push(Segment::Wildcard(Wildcard::Multi));
        } else if let Some(body) = part.strip_prefix('{') {
            segments.push(Segment::Variable(parse_variable(body, &parts, &mut index)?));
        } else {
            segments.push(Segment::Literal(part.to_owned()));
        }
        index += 1;
    }

    Ok(Path { segments, verb })
}

/// Splits a trailing `:VERB` suffix off the template, where the verb is a
/// non-empty run of ASCII letters ending the string.
fn split_verb(raw: &str) -> (&str, Option<String>) {
    let bytes = raw.as_bytes();
    let mut start = bytes.len();
    while start > 0 && bytes[start - 1].is_ascii_alphabetic() {
        start -= 1;
    }
    if start > 0 && start < bytes.len() && bytes[start - 1] == b':' {
        (&raw[..start - 1], Some(raw[start..].to_owned()))
    } else {
        (raw, None)
    }
}

/// Parses a variable starting at `body` (the current part with its leading
/// `{` stripped). A `{name=…}` capture may span multiple parts; `index` is
/// advanced past every part it consumes.
fn parse_variable(body: &str, parts: &[&str], index: &mut usize) -> Result<Variable, PathError> {
    let mut variable = Variable::default();
    let mut tail = body;
    let mut captures = false;

    if let Some(eq) = tail.find('=') {
        captures = true;
        variable.field = tail[..eq].to_owned();
        tail = &tail[eq + 1..];
        while !tail.contains('}') {
            if !tail.is_empty() {
                variable.segments.push(tail.to_owned());
            }
            *index += 1;
            tail = parts
                .get(*index)
                .copied()
                .ok_or_else(|| PathError::UnterminatedVariable {
                    variable: variable.field.clone(),
                })?;
        }
    } else if !tail.contains('}') {
        return Err(PathError::UnterminatedVariable {
            variable: tail.to_owned(),
        });
    }

    // The closing brace must end the segment; a pattern such as `[a-z]{1,3}`
    // may legally contain earlier braces.
    let tail = tail
        .strip_suffix('}')
        .ok_or_else(|| PathError::InvalidVariable {
            variable: tail.to_owned(),
        })?;

    if !tail.is_empty() {
        match tail.find(':') {
            None => {
                if captures {
                    variable.segments.push(tail.to_owned());
                } else {
                    variable.field = tail.to_owned();
                }
            }
            Some(colon) => {
                if colon > 0 {
                    if captures {
                        variable.segments.push(tail[..colon].to_owned());
                    } else {
                        variable.field = tail[..colon].to_owned();
                    }
                }
                variable.pattern = Some(tail[colon + 1..].to_owned());
            }
        }
    }

    Ok(variable)
}
