use std::{fmt, sync::Arc};

use logos::Span;
use miette::{Diagnostic, SourceCode};
use thiserror::Error;

use crate::path::PathError;

/// An error that may occur while parsing or resolving a schema file.
#[derive(Error, Diagnostic)]
#[error("{}", kind)]
#[diagnostic(forward(kind))]
pub struct ParseError {
    kind: ParseErrorKind,
    #[related]
    related: Vec<ParseErrorKind>,
    #[source_code]
    source_code: Arc<dyn SourceCode>,
}

#[derive(Error, Debug, Diagnostic, PartialEq)]
pub(crate) enum ParseErrorKind {
    #[error("invalid token")]
    InvalidToken {
        #[label("found here")]
        span: Span,
    },
    #[error("integer is too large")]
    IntegerOutOfRange {
        #[label("integer defined here")]
        span: Span,
    },
    #[error("invalid string character")]
    InvalidStringCharacters {
        #[label("invalid characters")]
        span: Span,
    },
    #[error("unterminated string")]
    UnterminatedString {
        #[label("string starts here")]
        span: Span,
    },
    #[error("invalid string escape")]
    InvalidStringEscape {
        #[label("defined here")]
        span: Span,
    },
    #[error("string is not valid utf-8")]
    InvalidUtf8String {
        #[label("defined here")]
        span: Span,
    },
    #[error("whitespace is required between an integer literal and an identifier")]
    NoSpaceBetweenIntAndIdent {
        #[label("found here")]
        span: Span,
    },
    #[error("expected {expected}, but found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        #[label("found here")]
        span: Span,
    },
    #[error("expected {expected}, but reached end of file")]
    UnexpectedEof { expected: String },
    #[error("duplicate definition of type `{name}`")]
    DuplicateTypeName {
        name: String,
        #[label("first defined here…")]
        first: Span,
        #[label("…and again here")]
        second: Span,
    },
    #[error("invalid method definition (`{method}`)")]
    #[diagnostic(help("request and response must reference message types"))]
    InvalidMethod {
        method: String,
        #[label("defined here")]
        span: Span,
    },
    #[error("message `{message}` not found (method `{method}`)")]
    MessageNotFound {
        message: String,
        method: String,
        #[label("referenced here")]
        span: Span,
    },
    #[error("streaming methods cannot have `google.api.http` option (method `{method}`)")]
    StreamingMethodWithHttpBinding {
        method: String,
        #[label("option defined here")]
        span: Span,
    },
    #[error("invalid value provided for `{option}`: expected {expected}")]
    InvalidServiceOption {
        option: String,
        expected: &'static str,
        #[label("defined here")]
        span: Span,
    },
    #[error("invalid value provided for `{option}`: expected {expected} (method `{method}`)")]
    InvalidMethodOption {
        option: String,
        expected: &'static str,
        method: String,
        #[label("defined here")]
        span: Span,
    },
    #[error("invalid key of `google.api.http` (method `{method}`)")]
    InvalidBindingKey {
        method: String,
        #[label("option defined here")]
        span: Span,
    },
    #[error("http binding incomplete (method `{method}`)")]
    #[diagnostic(help("a `custom` binding must provide both `kind` and `path`"))]
    IncompleteHttpBinding {
        method: String,
        #[label("option defined here")]
        span: Span,
    },
    #[error("path parameter `{name}` not found (method `{method}`)")]
    PathParameterNotFound {
        name: String,
        method: String,
        #[label("binding defined here")]
        span: Span,
    },
    #[error("body field `{name}` not found (method `{method}`)")]
    BodyFieldNotFound {
        name: String,
        method: String,
        #[label("binding defined here")]
        span: Span,
    },
    #[error("failed to parse path `{path}`")]
    InvalidPath {
        path: String,
        #[source]
        source: PathError,
        #[label("defined here")]
        span: Span,
    },
}

impl ParseError {
    pub(crate) fn new(mut related: Vec<ParseErrorKind>, source: impl Into<String>) -> Self {
        debug_assert!(!related.is_empty());
        let kind = related.remove(0);
        ParseError {
            kind,
            related,
            source_code: Arc::new(source.into()),
        }
    }

    /// Override the source code for this error.
    ///
    /// This may be used to include the file name in the error.
    ///
    /// # Examples
    ///
    /// ```
    /// # use miette::NamedSource;
    /// # use kite_parse::{parse, Definition, ParseError};
    /// #
    /// fn parse_named(file_name: &str, source: &str) -> Result<Definition, ParseError> {
    ///     parse(source).map_err(|err| {
    ///         err.with_source_code(NamedSource::new(file_name, source.to_owned()))
    ///     })
    /// }
    /// ```
    pub fn with_source_code<S>(self, source: S) -> Self
    where
        S: SourceCode + 'static,
    {
        ParseError {
            kind: self.kind,
            related: self.related,
            source_code: Arc::new(source),
        }
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entry(&self.kind)
            .entries(&self.related)
            .finish()
    }
}
