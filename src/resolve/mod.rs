//! Semantic resolution of the raw syntax tree.
//!
//! Resolution buckets top-level types, extracts service configuration,
//! resolves rpc methods and their HTTP bindings, and assigns every request
//! message field to a path, query or body location per binding.

#[cfg(test)]
mod tests;

use std::collections::{hash_map, BTreeMap, HashMap, HashSet};

use logos::Span;

use crate::ast;
use crate::error::ParseErrorKind;
use crate::model::{
    BodySelector, Definition, Enum, EnumValue, Field, FieldType, HttpBinding, Location, Message,
    MessageEntry, Method, Oneof, Param, ParamKind, Service,
};
use crate::path::{parse_path, Segment};

pub(crate) fn resolve(document: ast::Document) -> Result<Definition, ParseErrorKind> {
    let mut resolver = Resolver::default();

    let mut syntax = String::new();
    let mut package = String::new();
    let mut imports = Vec::new();
    let mut services = Vec::new();

    for entry in document.entries {
        match entry {
            ast::Entry::Syntax(value) => syntax = value,
            ast::Entry::Package(value) => package = value,
            ast::Entry::Import(value) => imports.push(value),
            ast::Entry::Message(message) => resolver.add_message(message)?,
            ast::Entry::Enum(enum_) => resolver.add_enum(enum_)?,
            ast::Entry::Service(service) => services.push(service),
            // File-level options and extensions have no bearing on routing.
            ast::Entry::Option(_) | ast::Entry::Extend(_) => (),
        }
    }

    let services = services
        .into_iter()
        .map(|service| resolver.resolve_service(service))
        .collect::<Result<_, _>>()?;

    Ok(Definition {
        syntax,
        package,
        imports,
        messages: resolver.messages,
        enums: resolver.enums,
        services,
    })
}

#[derive(Default)]
struct Resolver {
    messages: BTreeMap<String, Message>,
    enums: BTreeMap<String, Enum>,
    // Messages and enums share one type namespace.
    type_spans: HashMap<String, Span>,
}

impl Resolver {
    fn add_message(&mut self, message: ast::Message) -> Result<(), ParseErrorKind> {
        self.check_duplicate(&message.name, &message.name_span)?;
        let message = resolve_message(message);
        self.messages.insert(message.name.clone(), message);
        Ok(())
    }

    fn add_enum(&mut self, enum_: ast::Enum) -> Result<(), ParseErrorKind> {
        self.check_duplicate(&enum_.name, &enum_.name_span)?;
        let enum_ = resolve_enum(enum_);
        self.enums.insert(enum_.name.clone(), enum_);
        Ok(())
    }

    fn check_duplicate(&mut self, name: &str, span: &Span) -> Result<(), ParseErrorKind> {
        match self.type_spans.entry(name.to_owned()) {
            hash_map::Entry::Occupied(entry) => Err(ParseErrorKind::DuplicateTypeName {
                name: name.to_owned(),
                first: entry.get().clone(),
                second: span.clone(),
            }),
            hash_map::Entry::Vacant(entry) => {
                entry.insert(span.clone());
                Ok(())
            }
        }
    }

    fn resolve_service(&self, service: ast::Service) -> Result<Service, ParseErrorKind> {
        let ast::Service { name, entries, .. } = service;

        let mut http_prefix = String::new();
        let mut compressed = None;
        let mut ws_path = String::new();
        let mut ws_default = None;

        // Config is scanned before any method so that a `config` option
        // declared after an rpc still applies to it.
        for entry in &entries {
            if let ast::ServiceEntry::Option(option) = entry {
                if option.name == "config" {
                    let values = option.value.as_map().ok_or_else(|| {
                        ParseErrorKind::InvalidServiceOption {
                            option: "config".to_owned(),
                            expected: "a map",
                            span: option.span.clone(),
                        }
                    })?;

                    for (key, value) in values {
                        let key = key.as_reference().ok_or_else(|| {
                            ParseErrorKind::InvalidServiceOption {
                                option: "config".to_owned(),
                                expected: "identifier keys",
                                span: option.span.clone(),
                            }
                        })?;

                        let invalid = |expected| ParseErrorKind::InvalidServiceOption {
                            option: key.to_owned(),
                            expected,
                            span: option.span.clone(),
                        };

                        match key {
                            "HttpPrefix" => {
                                http_prefix =
                                    value.as_str().ok_or_else(|| invalid("a string"))?.to_owned();
                            }
                            "HttpCompress" => {
                                compressed =
                                    Some(value.as_bool().ok_or_else(|| invalid("a boolean"))?);
                            }
                            "WebSocketPath" => {
                                ws_path =
                                    value.as_str().ok_or_else(|| invalid("a string"))?.to_owned();
                            }
                            "WebSocketByDefault" => {
                                ws_default =
                                    Some(value.as_bool().ok_or_else(|| invalid("a boolean"))?);
                            }
                            _ => (),
                        }
                    }
                }
            }
        }

        let mut methods = Vec::new();
        for entry in entries {
            if let ast::ServiceEntry::Method(method) = entry {
                methods.push(self.resolve_method(compressed, ws_default, method)?);
            }
        }

        Ok(Service {
            name,
            http_prefix,
            compressed,
            ws_path,
            ws_default,
            methods,
        })
    }

    fn resolve_method(
        &self,
        compressed: Option<bool>,
        ws_default: Option<bool>,
        method: ast::Method,
    ) -> Result<Method, ParseErrorKind> {
        let name = method.name;

        let request = named_type(&method.request).ok_or_else(|| ParseErrorKind::InvalidMethod {
            method: name.clone(),
            span: method.name_span.clone(),
        })?;
        let response = named_type(&method.response).ok_or_else(|| ParseErrorKind::InvalidMethod {
            method: name.clone(),
            span: method.name_span.clone(),
        })?;

        let mut compressed = compressed.unwrap_or(false);
        let mut web_socket = ws_default.unwrap_or(false);
        let mut bindings: Vec<(HttpBinding, Span)> = Vec::new();

        for option in &method.options {
            let invalid = |expected| ParseErrorKind::InvalidMethodOption {
                option: option.name.clone(),
                expected,
                method: name.clone(),
                span: option.span.clone(),
            };

            match option.name.as_str() {
                "google.api.http" => {
                    if method.request_streaming || method.response_streaming {
                        return Err(ParseErrorKind::StreamingMethodWithHttpBinding {
                            method: name.clone(),
                            span: option.span.clone(),
                        });
                    }

                    let entries = option.value.as_map().ok_or_else(|| invalid("a map"))?;
                    self.parse_binding(entries, &mut bindings, &name, &option.span)?;
                }
                "httpCompress" => {
                    compressed = option.value.as_bool().ok_or_else(|| invalid("a boolean"))?;
                }
                "webSocket" => {
                    web_socket = option.value.as_bool().ok_or_else(|| invalid("a boolean"))?;
                }
                _ => (),
            }
        }

        let message = self.messages.get(&request).ok_or_else(|| {
            ParseErrorKind::MessageNotFound {
                message: request.clone(),
                method: name.clone(),
                span: method.name_span.clone(),
            }
        })?;

        for (binding, span) in &mut bindings {
            binding.params = self.binding_params(binding, message, &name, span)?;
        }

        Ok(Method {
            name,
            request,
            request_streaming: method.request_streaming,
            response,
            response_streaming: method.response_streaming,
            compressed,
            web_socket,
            bindings: bindings.into_iter().map(|(binding, _)| binding).collect(),
        })
    }

    /// Parses one `google.api.http` map into an [`HttpBinding`]. Nested
    /// `additional_bindings` recurse first, so they precede the outer
    /// binding in declaration order.
    fn parse_binding(
        &self,
        entries: &[(ast::Value, ast::Value)],
        bindings: &mut Vec<(HttpBinding, Span)>,
        method: &str,
        span: &Span,
    ) -> Result<(), ParseErrorKind> {
        let mut http_method = String::new();
        let mut raw_path = String::new();
        let mut body = BodySelector::None;
        let mut response_body = None;

        for (key, value) in entries {
            let key = key
                .as_reference()
                .ok_or_else(|| ParseErrorKind::InvalidBindingKey {
                    method: method.to_owned(),
                    span: span.clone(),
                })?;

            let invalid = |expected| ParseErrorKind::InvalidMethodOption {
                option: key.to_owned(),
                expected,
                method: method.to_owned(),
                span: span.clone(),
            };

            match key {
                "get" | "put" | "post" | "patch" | "delete" => {
                    http_method = key.to_owned();
                    raw_path = value.as_str().ok_or_else(|| invalid("a string"))?.to_owned();
                }
                "body" => {
                    body = match value.as_str().ok_or_else(|| invalid("a string"))? {
                        "" => BodySelector::None,
                        "*" => BodySelector::Wildcard,
                        field => BodySelector::Field(field.to_owned()),
                    };
                }
                "response_body" => {
                    response_body =
                        Some(value.as_str().ok_or_else(|| invalid("a string"))?.to_owned());
                }
                "custom" => {
                    let entries = value.as_map().ok_or_else(|| invalid("a map"))?;
                    for (key, value) in entries {
                        let key = key.as_reference().ok_or_else(|| {
                            ParseErrorKind::InvalidBindingKey {
                                method: method.to_owned(),
                                span: span.clone(),
                            }
                        })?;
                        let value = value.as_str().ok_or_else(|| {
                            ParseErrorKind::InvalidMethodOption {
                                option: key.to_owned(),
                                expected: "a string",
                                method: method.to_owned(),
                                span: span.clone(),
                            }
                        })?;
                        match key {
                            "kind" => http_method = value.to_owned(),
                            "path" => raw_path = value.to_owned(),
                            _ => (),
                        }
                    }
                    if http_method.is_empty() || raw_path.is_empty() {
                        return Err(ParseErrorKind::IncompleteHttpBinding {
                            method: method.to_owned(),
                            span: span.clone(),
                        });
                    }
                }
                "additional_bindings" => {
                    let entries = value.as_map().ok_or_else(|| invalid("a map"))?;
                    self.parse_binding(entries, bindings, method, span)?;
                }
                _ => (),
            }
        }

        let path = parse_path(&raw_path).map_err(|source| ParseErrorKind::InvalidPath {
            path: raw_path.clone(),
            source,
            span: span.clone(),
        })?;

        bindings.push((
            HttpBinding {
                method: http_method,
                raw_path,
                body,
                response_body,
                path,
                params: Vec::new(),
            },
            span.clone(),
        ));

        Ok(())
    }

    /// Assigns every field of the request message to a location for one
    /// binding: path variables in path order, then the body field, then the
    /// remaining fields as query parameters in declared field order.
    fn binding_params(
        &self,
        binding: &HttpBinding,
        message: &Message,
        method: &str,
        span: &Span,
    ) -> Result<Vec<Param>, ParseErrorKind> {
        let mut params = Vec::new();
        let mut handled = HashSet::new();

        for segment in &binding.path.segments {
            if let Segment::Variable(variable) = segment {
                let entry = message
                    .entries
                    .iter()
                    .find(|entry| entry.name() == variable.field)
                    .ok_or_else(|| ParseErrorKind::PathParameterNotFound {
                        name: variable.field.clone(),
                        method: method.to_owned(),
                        span: span.clone(),
                    })?;
                params.push(self.param(entry, Location::Path));
                handled.insert(entry.name().to_owned());
            }
        }

        match &binding.body {
            // The whole message is the body; nothing is read from the query.
            BodySelector::Wildcard => return Ok(params),
            BodySelector::Field(name) => {
                let entry = message
                    .entries
                    .iter()
                    .find(|entry| entry.name() == *name)
                    .ok_or_else(|| ParseErrorKind::BodyFieldNotFound {
                        name: name.clone(),
                        method: method.to_owned(),
                        span: span.clone(),
                    })?;
                params.push(self.param(entry, Location::Body));
                handled.insert(entry.name().to_owned());
            }
            BodySelector::None => (),
        }

        for entry in &message.entries {
            if !handled.contains(entry.name()) {
                params.push(self.param(entry, Location::Query));
            }
        }

        Ok(params)
    }

    fn param(&self, entry: &MessageEntry, location: Location) -> Param {
        match entry {
            MessageEntry::Field(field) => self.field_param(field, location),
            MessageEntry::Oneof(oneof) => Param {
                name: oneof.name.clone(),
                kind: ParamKind::Oneof,
                location,
                field: None,
                oneof_fields: oneof
                    .fields
                    .iter()
                    .map(|field| (field.name.clone(), self.field_param(field, location)))
                    .collect(),
            },
        }
    }

    fn field_param(&self, field: &Field, location: Location) -> Param {
        Param {
            name: field.name.clone(),
            kind: self.param_kind(&field.ty),
            location,
            field: Some(field.clone()),
            oneof_fields: BTreeMap::new(),
        }
    }

    fn param_kind(&self, ty: &FieldType) -> ParamKind {
        match ty {
            FieldType::Scalar(_) => ParamKind::Scalar,
            FieldType::Map(_, _) => ParamKind::Map,
            FieldType::Named(name) if self.messages.contains_key(name) => ParamKind::Message,
            FieldType::Named(name) if self.enums.contains_key(name) => ParamKind::Enum,
            FieldType::Named(_) => ParamKind::Unknown,
        }
    }
}

fn named_type(ty: &FieldType) -> Option<String> {
    match ty {
        FieldType::Named(name) => Some(name.clone()),
        _ => None,
    }
}

fn resolve_message(message: ast::Message) -> Message {
    let entries = message
        .entries
        .into_iter()
        .filter_map(|entry| match entry {
            ast::MessageEntry::Field(field) => Some(MessageEntry::Field(resolve_field(field))),
            ast::MessageEntry::Oneof(oneof) => Some(MessageEntry::Oneof(Oneof {
                name: oneof.name,
                fields: oneof
                    .entries
                    .into_iter()
                    .filter_map(|entry| match entry {
                        ast::OneofEntry::Field(field) => Some(resolve_field(field)),
                        ast::OneofEntry::Option(_) => None,
                    })
                    .collect(),
            })),
            // Nested types, reserved ranges and options are validated by the
            // grammar but carry no routing information.
            _ => None,
        })
        .collect();

    Message {
        name: message.name,
        entries,
    }
}

fn resolve_field(field: ast::Field) -> Field {
    Field {
        name: field.name,
        ty: field.ty,
        tag: field.tag,
        label: field.label,
    }
}

fn resolve_enum(enum_: ast::Enum) -> Enum {
    let values = enum_
        .entries
        .into_iter()
        .filter_map(|entry| match entry {
            ast::EnumEntry::Value(value) => Some(EnumValue {
                name: value.name,
                number: value.number,
            }),
            ast::EnumEntry::Option(_) => None,
        })
        .collect();

    Enum {
        name: enum_.name,
        values,
    }
}
