//! Parsing of kite service schema files.
//!
//! A schema file declares messages, enums and services in a proto3-like
//! syntax, annotated with HTTP bindings that map rpc methods onto routes.
//! See the documentation for [`parse()`] for details.
#![warn(missing_debug_implementations, missing_docs)]
#![deny(unsafe_code)]

use logos::Span;

mod ast;
mod error;
mod lex;
mod model;
mod parse;
mod path;
mod resolve;

pub use self::error::ParseError;
pub use self::model::{
    BodySelector, Definition, Enum, EnumValue, Field, FieldLabel, FieldType, HttpBinding,
    Location, Message, MessageEntry, Method, Oneof, Param, ParamKind, Scalar, Service,
};
pub use self::path::{parse_path, Path, PathError, Segment, Variable, Wildcard};

/// Parses a schema file into a resolved [`Definition`].
///
/// All declared types and services are validated: HTTP bindings must
/// reference existing request message fields, and every field of a bound
/// request message is assigned to a path, query or body location.
///
/// # Examples
///
/// ```
/// # use kite_parse::{parse, Location};
/// #
/// let source = r#"
///     syntax = "proto3";
///
///     message GetUserRequest {
///         string id = 1;
///         int32 limit = 2;
///     }
///
///     message User {
///         string id = 1;
///         string name = 2;
///     }
///
///     service Users {
///         rpc GetUser (GetUserRequest) returns (User) {
///             option (google.api.http) = {
///                 get: "/users/{id}"
///             };
///         }
///     }
/// "#;
/// let definition = parse(source).unwrap();
///
/// let service = &definition.services[0];
/// let binding = &service.methods[0].bindings[0];
/// assert_eq!(binding.method, "get");
/// assert_eq!(binding.route_path(&service.http_prefix), "/users/{id}");
/// assert_eq!(binding.params[0].name, "id");
/// assert_eq!(binding.params[0].location, Location::Path);
/// assert_eq!(binding.params[1].name, "limit");
/// assert_eq!(binding.params[1].location, Location::Query);
/// ```
pub fn parse(source: &str) -> Result<Definition, ParseError> {
    let document = parse::parse_document(source).map_err(|errors| ParseError::new(errors, source))?;

    resolve::resolve(document).map_err(|err| ParseError::new(vec![err], source))
}

fn join_span(start: Span, end: Span) -> Span {
    start.start..end.end
}
