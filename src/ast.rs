//! The raw syntax tree produced by the schema grammar.
//!
//! This tree is purely structural: option values are untyped [`Value`]s and
//! type references are unresolved names. It is built once per parse call and
//! consumed immediately by the resolver.

use logos::Span;

use crate::model::{FieldLabel, FieldType};

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Document {
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Entry {
    Syntax(String),
    Package(String),
    Import(String),
    Message(Message),
    Service(Service),
    Enum(Enum),
    Option(OptionDecl),
    Extend(Extend),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Message {
    pub name: String,
    pub name_span: Span,
    pub entries: Vec<MessageEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MessageEntry {
    Enum(Enum),
    Option(OptionDecl),
    Message(Message),
    Oneof(Oneof),
    Extend(Extend),
    Reserved(Reserved),
    Extensions(Extensions),
    Field(Field),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Field {
    pub label: Option<FieldLabel>,
    pub ty: FieldType,
    pub name: String,
    pub tag: i32,
    pub options: Vec<OptionDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Oneof {
    pub name: String,
    pub entries: Vec<OneofEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OneofEntry {
    Field(Field),
    Option(OptionDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Enum {
    pub name: String,
    pub name_span: Span,
    pub entries: Vec<EnumEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EnumEntry {
    Value(EnumValue),
    Option(OptionDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EnumValue {
    pub name: String,
    pub number: i64,
    pub options: Vec<OptionDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Service {
    pub name: String,
    pub name_span: Span,
    pub entries: Vec<ServiceEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ServiceEntry {
    Option(OptionDecl),
    Method(Method),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Method {
    pub name: String,
    pub name_span: Span,
    pub request: FieldType,
    pub request_streaming: bool,
    pub response: FieldType,
    pub response_streaming: bool,
    pub options: Vec<OptionDecl>,
}

/// An `option name = value` declaration. `name` is the dotted option name,
/// with the parentheses of an extended name stripped; `attr` holds the
/// trailing attribute suffix of `option (name).attr = value` forms.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OptionDecl {
    pub name: String,
    pub attr: Option<String>,
    pub value: Value,
    pub span: Span,
}

/// An option literal.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    String(String),
    Float(f64),
    Int(i64),
    Bool(bool),
    Reference(String),
    Array(Vec<Value>),
    /// Key-value pairs in insertion order. Keys are themselves values, and
    /// duplicate keys are legal at this level.
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Value::Reference(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Reserved {
    pub items: Vec<ReservedItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Extensions {
    pub items: Vec<ReservedItem>,
}

/// One element of a `reserved` or `extensions` list: a field name or a
/// numeric range.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ReservedItem {
    Name(String),
    Range { start: i32, end: RangeEnd },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RangeEnd {
    None,
    Int(i32),
    Max,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Extend {
    pub name: String,
    pub fields: Vec<Field>,
}
