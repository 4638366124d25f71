//! The validated semantic model produced by [`parse()`](crate::parse()).
//!
//! A [`Definition`] is immutable after resolution and is the sole interface
//! handed to downstream code generators. Ownership is strictly top-down:
//! `Definition` → `Service` → `Method` → `HttpBinding` → `Param`.

use std::collections::BTreeMap;
use std::fmt;

use crate::path::{Path, Segment};

/// A fully resolved schema document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Definition {
    /// The `syntax` declaration, or an empty string if absent.
    pub syntax: String,
    /// The `package` declaration, or an empty string if absent.
    pub package: String,
    /// Imported file paths, in declaration order.
    pub imports: Vec<String>,
    /// Top-level messages, keyed by name. Duplicate names are a parse error.
    pub messages: BTreeMap<String, Message>,
    /// Top-level enums, keyed by name. Duplicate names are a parse error.
    pub enums: BTreeMap<String, Enum>,
    /// Services, in declaration order.
    pub services: Vec<Service>,
}

/// A message type, reduced to the field enumeration needed for HTTP binding
/// resolution. Nested messages and enums are not flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// The message name.
    pub name: String,
    /// Fields and oneof groups, in declaration order.
    pub entries: Vec<MessageEntry>,
}

/// A single top-level entry of a message: a plain field or a oneof group.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageEntry {
    /// A plain field.
    Field(Field),
    /// A oneof group of mutually exclusive fields.
    Oneof(Oneof),
}

impl MessageEntry {
    /// The name this entry is addressed by in path templates and body
    /// selectors: the field name, or the oneof's own name.
    pub fn name(&self) -> &str {
        match self {
            MessageEntry::Field(field) => &field.name,
            MessageEntry::Oneof(oneof) => &oneof.name,
        }
    }
}

/// A message field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The field name.
    pub name: String,
    /// The field type.
    pub ty: FieldType,
    /// The field tag number.
    pub tag: i32,
    /// The field qualifier, if any.
    pub label: Option<FieldLabel>,
}

impl Field {
    /// Whether the field is marked `optional`.
    pub fn optional(&self) -> bool {
        self.label == Some(FieldLabel::Optional)
    }

    /// Whether the field is marked `required`.
    pub fn required(&self) -> bool {
        self.label == Some(FieldLabel::Required)
    }

    /// Whether the field is marked `repeated`.
    pub fn repeated(&self) -> bool {
        self.label == Some(FieldLabel::Repeated)
    }
}

/// A field qualifier. Qualifiers are mutually exclusive and optional.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldLabel {
    /// The `optional` qualifier.
    Optional,
    /// The `required` qualifier.
    Required,
    /// The `repeated` qualifier.
    Repeated,
}

/// The type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// One of the fifteen primitive types.
    Scalar(Scalar),
    /// A `map<key, value>` type.
    Map(Box<FieldType>, Box<FieldType>),
    /// A reference to a message or enum by (possibly dotted) name.
    Named(String),
}

/// A primitive field type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Scalar {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl Scalar {
    pub(crate) fn from_name(name: &str) -> Option<Scalar> {
        match name {
            "double" => Some(Scalar::Double),
            "float" => Some(Scalar::Float),
            "int32" => Some(Scalar::Int32),
            "int64" => Some(Scalar::Int64),
            "uint32" => Some(Scalar::Uint32),
            "uint64" => Some(Scalar::Uint64),
            "sint32" => Some(Scalar::Sint32),
            "sint64" => Some(Scalar::Sint64),
            "fixed32" => Some(Scalar::Fixed32),
            "fixed64" => Some(Scalar::Fixed64),
            "sfixed32" => Some(Scalar::Sfixed32),
            "sfixed64" => Some(Scalar::Sfixed64),
            "bool" => Some(Scalar::Bool),
            "string" => Some(Scalar::String),
            "bytes" => Some(Scalar::Bytes),
            _ => None,
        }
    }

    /// The keyword naming this type in schema source.
    pub fn name(&self) -> &'static str {
        match self {
            Scalar::Double => "double",
            Scalar::Float => "float",
            Scalar::Int32 => "int32",
            Scalar::Int64 => "int64",
            Scalar::Uint32 => "uint32",
            Scalar::Uint64 => "uint64",
            Scalar::Sint32 => "sint32",
            Scalar::Sint64 => "sint64",
            Scalar::Fixed32 => "fixed32",
            Scalar::Fixed64 => "fixed64",
            Scalar::Sfixed32 => "sfixed32",
            Scalar::Sfixed64 => "sfixed64",
            Scalar::Bool => "bool",
            Scalar::String => "string",
            Scalar::Bytes => "bytes",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named group of mutually exclusive fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Oneof {
    /// The oneof group name.
    pub name: String,
    /// The variant fields, in declaration order.
    pub fields: Vec<Field>,
}

/// An enum type.
#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    /// The enum name.
    pub name: String,
    /// The enum values, in declaration order.
    pub values: Vec<EnumValue>,
}

/// A single enum value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// The value name.
    pub name: String,
    /// The assigned number.
    pub number: i64,
}

/// A resolved service declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    /// The service name.
    pub name: String,
    /// The `HttpPrefix` config value, prepended to every route. Defaults to
    /// the empty string.
    pub http_prefix: String,
    /// The `HttpCompress` config value. `None` means unset.
    pub compressed: Option<bool>,
    /// The `WebSocketPath` config value. Defaults to the empty string.
    pub ws_path: String,
    /// The `WebSocketByDefault` config value. `None` means unset.
    pub ws_default: Option<bool>,
    /// The service methods, in declaration order.
    pub methods: Vec<Method>,
}

impl Service {
    /// Whether any method of this service has compression enabled.
    pub fn compression_used(&self) -> bool {
        self.methods.iter().any(|method| method.compressed)
    }
}

/// A resolved RPC method.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// The method name.
    pub name: String,
    /// The request message name.
    pub request: String,
    /// Whether the request is a stream.
    pub request_streaming: bool,
    /// The response message name.
    pub response: String,
    /// Whether the response is a stream.
    pub response_streaming: bool,
    /// Whether responses are compressed. Inherited from the service's
    /// `HttpCompress` default unless overridden by a method-level
    /// `httpCompress` option.
    pub compressed: bool,
    /// Whether the method is exposed over a websocket. Inherited from the
    /// service's `WebSocketByDefault` default unless overridden by a
    /// method-level `webSocket` option.
    pub web_socket: bool,
    /// The HTTP bindings declared via `google.api.http`, including
    /// `additional_bindings`. Empty if the method has no HTTP binding.
    pub bindings: Vec<HttpBinding>,
}

/// One HTTP method + path + body mapping attached to an RPC method.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpBinding {
    /// The HTTP method: `get`, `put`, `post`, `patch`, `delete`, or the
    /// verbatim `kind` of a `custom` binding.
    pub method: String,
    /// The path template exactly as written in the schema.
    pub raw_path: String,
    /// Which part of the request message is read from the request body.
    pub body: BodySelector,
    /// The field of the response message sent as the response body, if set.
    pub response_body: Option<String>,
    /// The parsed path template.
    pub path: Path,
    /// The request message's fields, each assigned to a location. Ordered:
    /// path parameters in path order, then the body field, then query
    /// parameters in the message's declared field order.
    pub params: Vec<Param>,
}

impl HttpBinding {
    /// Renders a mux-style route for this binding: literal segments verbatim,
    /// wildcards as `.*`, variables as `{field}` or `{field:pattern}`. The
    /// owning service's HTTP prefix is prepended with its trailing `/`
    /// trimmed.
    pub fn route_path(&self, prefix: &str) -> String {
        let mut route = prefix.trim_end_matches('/').to_owned();
        for segment in &self.path.segments {
            route.push('/');
            match segment {
                Segment::Literal(literal) => route.push_str(literal),
                Segment::Wildcard(_) => route.push_str(".*"),
                Segment::Variable(variable) => {
                    route.push('{');
                    route.push_str(&variable.field);
                    if let Some(pattern) = &variable.pattern {
                        route.push(':');
                        route.push_str(pattern);
                    }
                    route.push('}');
                }
            }
        }
        route
    }
}

/// The part of the request message that is read from the HTTP request body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BodySelector {
    /// No body; every field not bound to the path becomes a query parameter.
    #[default]
    None,
    /// `body: "*"` — the whole request message is the body; no query
    /// parameters are produced.
    Wildcard,
    /// `body: "field"` — the named field is the body.
    Field(String),
}

/// A request message field assigned to a location within the HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// The field name (or oneof group name for a [`ParamKind::Oneof`] param).
    pub name: String,
    /// The semantic kind of the underlying field type.
    pub kind: ParamKind,
    /// Where the value is read from.
    pub location: Location,
    /// The underlying field. `None` for a oneof param, which has no field of
    /// its own; see [`Param::oneof_fields`].
    pub field: Option<Field>,
    /// For a [`ParamKind::Oneof`] param, the variant sub-fields keyed by
    /// name; empty otherwise. Variants inherit the parent's location.
    pub oneof_fields: BTreeMap<String, Param>,
}

/// The semantic kind of a parameter's type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// The type reference did not resolve to a known message or enum.
    /// Callers must treat this as unresolved rather than failing.
    Unknown,
    /// A primitive type.
    Scalar,
    /// A map type.
    Map,
    /// A reference to a top-level enum.
    Enum,
    /// A reference to a top-level message.
    Message,
    /// A oneof group.
    Oneof,
}

/// The portion of an HTTP request a field's value is read from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Location {
    /// The value is captured from a path template variable.
    Path,
    /// The value is read from the query string.
    Query,
    /// The value is read from the request body.
    Body,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Path => f.write_str("path"),
            Location::Query => f.write_str("query"),
            Location::Body => f.write_str("body"),
        }
    }
}
