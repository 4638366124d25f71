use super::*;
use crate::error::ParseErrorKind;

fn resolve_source(source: &str) -> Result<Definition, ParseErrorKind> {
    let document = crate::parse::parse_document(source).expect("source should parse");
    resolve(document)
}

fn resolved(source: &str) -> Definition {
    resolve_source(source).expect("source should resolve")
}

#[test]
fn file_declarations() {
    let definition = resolved(
        r#"
        syntax = "proto3";
        package users.v1;
        import "common.kite";
        import "types.kite";

        message Empty {}
        enum Code { OK = 0; }
        "#,
    );

    assert_eq!(definition.syntax, "proto3");
    assert_eq!(definition.package, "users.v1");
    assert_eq!(definition.imports, vec!["common.kite", "types.kite"]);
    assert_eq!(definition.messages.len(), 1);
    assert_eq!(definition.enums["Code"].values[0].name, "OK");
    assert_eq!(definition.enums["Code"].values[0].number, 0);
}

#[test]
fn duplicate_type_name() {
    let err = resolve_source("message Foo {} message Foo {}").unwrap_err();
    match err {
        ParseErrorKind::DuplicateTypeName {
            name,
            first,
            second,
        } => {
            assert_eq!(name, "Foo");
            assert_eq!(first, 8..11);
            assert_eq!(second, 23..26);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // Messages and enums share a namespace.
    let err = resolve_source("message Foo {} enum Foo { A = 0; }").unwrap_err();
    assert!(matches!(
        err,
        ParseErrorKind::DuplicateTypeName { name, .. } if name == "Foo"
    ));
}

#[test]
fn binding_locations() {
    let definition = resolved(
        r#"
        message GetRequest {
            string id = 1;
            int32 page = 2;
            string filter = 3;
        }
        message GetResponse {}

        service Things {
            rpc Get (GetRequest) returns (GetResponse) {
                option (google.api.http) = {
                    get: "/things/{id}"
                };
            }
        }
        "#,
    );

    let binding = &definition.services[0].methods[0].bindings[0];
    assert_eq!(binding.method, "get");
    assert_eq!(binding.raw_path, "/things/{id}");
    assert_eq!(binding.body, BodySelector::None);

    let params: Vec<(&str, Location)> = binding
        .params
        .iter()
        .map(|param| (param.name.as_str(), param.location))
        .collect();
    // Path parameters first, then query parameters in declared field order.
    assert_eq!(
        params,
        vec![
            ("id", Location::Path),
            ("page", Location::Query),
            ("filter", Location::Query),
        ]
    );
    assert_eq!(binding.params[0].kind, ParamKind::Scalar);
}

#[test]
fn binding_body_field() {
    let definition = resolved(
        r#"
        message UpdateRequest {
            string id = 1;
            Thing thing = 2;
            bool validate = 3;
        }
        message Thing { string name = 1; }
        message UpdateResponse {}

        service Things {
            rpc Update (UpdateRequest) returns (UpdateResponse) {
                option (google.api.http) = {
                    patch: "/things/{id}"
                    body: "thing"
                };
            }
        }
        "#,
    );

    let binding = &definition.services[0].methods[0].bindings[0];
    assert_eq!(binding.body, BodySelector::Field("thing".to_owned()));

    let params: Vec<(&str, Location)> = binding
        .params
        .iter()
        .map(|param| (param.name.as_str(), param.location))
        .collect();
    assert_eq!(
        params,
        vec![
            ("id", Location::Path),
            ("thing", Location::Body),
            ("validate", Location::Query),
        ]
    );
    assert_eq!(binding.params[1].kind, ParamKind::Message);
}

#[test]
fn binding_body_wildcard() {
    let definition = resolved(
        r#"
        message CreateRequest {
            string id = 1;
            string name = 2;
        }
        message CreateResponse {}

        service Things {
            rpc Create (CreateRequest) returns (CreateResponse) {
                option (google.api.http) = {
                    post: "/things"
                    body: "*"
                };
            }
        }
        "#,
    );

    let binding = &definition.services[0].methods[0].bindings[0];
    assert_eq!(binding.body, BodySelector::Wildcard);
    // The whole message is read from the body, so no query parameters.
    assert_eq!(binding.params, vec![]);
}

#[test]
fn binding_additional_bindings() {
    let definition = resolved(
        r#"
        message Request { string id = 1; }
        message Response {}

        service Things {
            rpc Get (Request) returns (Response) {
                option (google.api.http) = {
                    get: "/v2/things/{id}"
                    additional_bindings: {
                        get: "/v1/things/{id}"
                    }
                };
            }
        }
        "#,
    );

    let bindings = &definition.services[0].methods[0].bindings;
    assert_eq!(bindings.len(), 2);
    // Nested bindings are recorded before the binding that declares them.
    assert_eq!(bindings[0].raw_path, "/v1/things/{id}");
    assert_eq!(bindings[1].raw_path, "/v2/things/{id}");
}

#[test]
fn binding_custom() {
    let definition = resolved(
        r#"
        message Request { string id = 1; }
        message Response {}

        service Things {
            rpc Watch (Request) returns (Response) {
                option (google.api.http) = {
                    custom: { kind: "head", path: "/things/{id}" }
                };
            }
        }
        "#,
    );

    let binding = &definition.services[0].methods[0].bindings[0];
    assert_eq!(binding.method, "head");
    assert_eq!(binding.raw_path, "/things/{id}");
}

#[test]
fn binding_custom_incomplete() {
    let err = resolve_source(
        r#"
        message Request {}
        message Response {}

        service Things {
            rpc Watch (Request) returns (Response) {
                option (google.api.http) = {
                    custom: { kind: "head" }
                };
            }
        }
        "#,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ParseErrorKind::IncompleteHttpBinding { method, .. } if method == "Watch"
    ));
}

#[test]
fn binding_path_parameter_not_found() {
    let err = resolve_source(
        r#"
        message Request { string id = 1; }
        message Response {}

        service Things {
            rpc Get (Request) returns (Response) {
                option (google.api.http) = {
                    get: "/things/{missing}"
                };
            }
        }
        "#,
    )
    .unwrap_err();

    match err {
        ParseErrorKind::PathParameterNotFound { name, method, .. } => {
            assert_eq!(name, "missing");
            assert_eq!(method, "Get");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn binding_body_field_not_found() {
    let err = resolve_source(
        r#"
        message Request { string id = 1; }
        message Response {}

        service Things {
            rpc Update (Request) returns (Response) {
                option (google.api.http) = {
                    put: "/things/{id}"
                    body: "missing"
                };
            }
        }
        "#,
    )
    .unwrap_err();

    match err {
        ParseErrorKind::BodyFieldNotFound { name, method, .. } => {
            assert_eq!(name, "missing");
            assert_eq!(method, "Update");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn binding_invalid_path() {
    let err = resolve_source(
        r#"
        message Request { string id = 1; }
        message Response {}

        service Things {
            rpc Get (Request) returns (Response) {
                option (google.api.http) = {
                    get: "/things/{id"
                };
            }
        }
        "#,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ParseErrorKind::InvalidPath { path, .. } if path == "/things/{id"
    ));
}

#[test]
fn streaming_method_with_http_binding() {
    let err = resolve_source(
        r#"
        message Request {}
        message Response {}

        service Things {
            rpc Watch (Request) returns (stream Response) {
                option (google.api.http) = {
                    get: "/things"
                };
            }
        }
        "#,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ParseErrorKind::StreamingMethodWithHttpBinding { method, .. } if method == "Watch"
    ));
}

#[test]
fn method_request_not_message() {
    let err = resolve_source(
        r#"
        message Response {}
        service Things {
            rpc Get (int32) returns (Response);
        }
        "#,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ParseErrorKind::InvalidMethod { method, .. } if method == "Get"
    ));
}

#[test]
fn method_request_message_not_found() {
    let err = resolve_source(
        r#"
        message Response {}
        service Things {
            rpc Get (Missing) returns (Response);
        }
        "#,
    )
    .unwrap_err();

    match err {
        ParseErrorKind::MessageNotFound {
            message, method, ..
        } => {
            assert_eq!(message, "Missing");
            assert_eq!(method, "Get");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn service_config() {
    let definition = resolved(
        r#"
        message Request { string id = 1; }
        message Response {}

        service Things {
            // Config declared after the rpc still applies to it.
            rpc Get (Request) returns (Response) {
                option (google.api.http) = { get: "/things/{id}" };
            }
            rpc Fetch (Request) returns (Response) {
                option httpCompress = false;
                option webSocket = true;
            }

            option (config) = {
                HttpPrefix: "/api/"
                HttpCompress: true
                WebSocketPath: "/ws"
                WebSocketByDefault: false
            };
        }
        "#,
    );

    let service = &definition.services[0];
    assert_eq!(service.http_prefix, "/api/");
    assert_eq!(service.compressed, Some(true));
    assert_eq!(service.ws_path, "/ws");
    assert_eq!(service.ws_default, Some(false));

    let get = &service.methods[0];
    assert!(get.compressed);
    assert!(!get.web_socket);
    assert_eq!(
        get.bindings[0].route_path(&service.http_prefix),
        "/api/things/{id}"
    );

    let fetch = &service.methods[1];
    assert!(!fetch.compressed);
    assert!(fetch.web_socket);

    assert!(service.compression_used());
}

#[test]
fn service_config_invalid_value() {
    let err = resolve_source(
        r#"
        service Things {
            option (config) = { HttpPrefix: 42 };
        }
        "#,
    )
    .unwrap_err();

    match err {
        ParseErrorKind::InvalidServiceOption {
            option, expected, ..
        } => {
            assert_eq!(option, "HttpPrefix");
            assert_eq!(expected, "a string");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn method_option_invalid_value() {
    let err = resolve_source(
        r#"
        message Request {}
        message Response {}
        service Things {
            rpc Get (Request) returns (Response) {
                option httpCompress = "yes";
            }
        }
        "#,
    )
    .unwrap_err();

    match err {
        ParseErrorKind::InvalidMethodOption {
            option,
            expected,
            method,
            ..
        } => {
            assert_eq!(option, "httpCompress");
            assert_eq!(expected, "a boolean");
            assert_eq!(method, "Get");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn oneof_param() {
    let definition = resolved(
        r#"
        message SearchRequest {
            string query = 1;
            oneof target {
                string name = 2;
                Kind kind = 3;
            }
        }
        enum Kind { THING = 0; }
        message SearchResponse {}

        service Things {
            rpc Search (SearchRequest) returns (SearchResponse) {
                option (google.api.http) = {
                    get: "/things"
                };
            }
        }
        "#,
    );

    let binding = &definition.services[0].methods[0].bindings[0];
    assert_eq!(binding.params.len(), 2);

    let target = &binding.params[1];
    assert_eq!(target.name, "target");
    assert_eq!(target.kind, ParamKind::Oneof);
    assert_eq!(target.location, Location::Query);
    assert_eq!(target.field, None);

    // Variants inherit the group's location.
    let name = &target.oneof_fields["name"];
    assert_eq!(name.kind, ParamKind::Scalar);
    assert_eq!(name.location, Location::Query);
    let kind = &target.oneof_fields["kind"];
    assert_eq!(kind.kind, ParamKind::Enum);
    assert_eq!(kind.location, Location::Query);
}

#[test]
fn param_kind_unknown() {
    let definition = resolved(
        r#"
        message Request {
            External ref = 1;
        }
        message Response {}

        service Things {
            rpc Get (Request) returns (Response) {
                option (google.api.http) = { get: "/things" };
            }
        }
        "#,
    );

    let binding = &definition.services[0].methods[0].bindings[0];
    assert_eq!(binding.params[0].kind, ParamKind::Unknown);
}

#[test]
fn binding_with_verb_and_wildcards() {
    let definition = resolved(
        r#"
        message Request { string id = 1; }
        message Response {}

        service Things {
            rpc Watch (Request) returns (Response) {
                option (google.api.http) = {
                    get: "/things/*/sub/{id=a/**}:watch"
                };
            }
        }
        "#,
    );

    let binding = &definition.services[0].methods[0].bindings[0];
    assert_eq!(binding.path.verb.as_deref(), Some("watch"));
    assert_eq!(
        binding.route_path(""),
        "/things/.*/sub/{id}"
    );
}
