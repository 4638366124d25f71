
use logos::{Lexer, Logos, Span};

use crate::ast;
use crate::error::ParseErrorKind;
use crate::join_span;
use crate::lex::Token;
use crate::model::{FieldLabel, FieldType, Scalar};

/// Parses a schema document into the raw syntax tree.
///
/// Any lexical or grammar error aborts the parse; no partial tree is
/// returned.
pub(crate) fn parse_document(source: &str) -> Result<ast::Document, Vec<ParseErrorKind>> {
    let mut parser = Parser::new(source);
    match parser.parse_document() {
        Ok(document) if parser.lexer.extras.errors.is_empty() => Ok(document),
        _ => Err(std::mem::take(&mut parser.lexer.extras.errors)),
    }
}

struct Parser<'a> {
    lexer: Lexer<'a, Token<'a>>,
    peek: Option<(Token<'a>, Span)>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            lexer: Token::lexer(source),
            peek: None,
        }
    }

    fn parse_document(&mut self) -> Result<ast::Document, ()> {
        let mut entries = Vec::new();

        loop {
            match self.peek() {
                None => break,
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::Ident("syntax"), _)) => {
                    self.bump();
                    self.expect_eq(Token::Equals)?;
                    entries.push(ast::Entry::Syntax(self.parse_string()?));
                }
                Some((Token::Ident("package"), _)) => {
                    self.bump();
                    entries.push(ast::Entry::Package(self.parse_dotted_ident()?.0));
                }
                Some((Token::Ident("import"), _)) => {
                    self.bump();
                    entries.push(ast::Entry::Import(self.parse_string()?));
                }
                Some((Token::Ident("message"), _)) => {
                    entries.push(ast::Entry::Message(self.parse_message()?));
                }
                Some((Token::Ident("service"), _)) => {
                    entries.push(ast::Entry::Service(self.parse_service()?));
                }
                Some((Token::Ident("enum"), _)) => {
                    entries.push(ast::Entry::Enum(self.parse_enum()?));
                }
                Some((Token::Ident("option"), _)) => {
                    entries.push(ast::Entry::Option(self.parse_option()?));
                }
                Some((Token::Ident("extend"), _)) => {
                    entries.push(ast::Entry::Extend(self.parse_extend()?));
                }
                _ => self.unexpected_token(
                    "'syntax', 'package', 'import', 'message', 'service', 'enum', 'option', 'extend' or ';'",
                )?,
            }
        }

        Ok(ast::Document { entries })
    }

    fn parse_message(&mut self) -> Result<ast::Message, ()> {
        self.expect_eq(Token::MESSAGE)?;

        let (name, name_span) = self.parse_ident()?;

        let entries = self.parse_message_body()?;

        Ok(ast::Message {
            name,
            name_span,
            entries,
        })
    }

    fn parse_message_body(&mut self) -> Result<Vec<ast::MessageEntry>, ()> {
        self.expect_eq(Token::LeftBrace)?;

        let mut entries = Vec::new();
        loop {
            match self.peek() {
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::RightBrace, _)) => {
                    self.bump();
                    break;
                }
                Some((Token::Ident("enum"), _)) => {
                    entries.push(ast::MessageEntry::Enum(self.parse_enum()?));
                }
                Some((Token::Ident("option"), _)) => {
                    entries.push(ast::MessageEntry::Option(self.parse_option()?));
                }
                Some((Token::Ident("message"), _)) => {
                    entries.push(ast::MessageEntry::Message(self.parse_message()?));
                }
                Some((Token::Ident("oneof"), _)) => {
                    entries.push(ast::MessageEntry::Oneof(self.parse_oneof()?));
                }
                Some((Token::Ident("extend"), _)) => {
                    entries.push(ast::MessageEntry::Extend(self.parse_extend()?));
                }
                Some((Token::Ident("reserved"), _)) => {
                    entries.push(ast::MessageEntry::Reserved(self.parse_reserved()?));
                }
                Some((Token::Ident("extensions"), _)) => {
                    entries.push(ast::MessageEntry::Extensions(self.parse_extensions()?));
                }
                Some((Token::Ident(_), _)) => {
                    entries.push(ast::MessageEntry::Field(self.parse_field()?));
                }
                _ => self.unexpected_token(
                    "a message field, oneof, reserved range, enum, message or '}'",
                )?,
            }
        }

        Ok(entries)
    }

    fn parse_field(&mut self) -> Result<ast::Field, ()> {
        let label = match self.peek() {
            Some((Token::Ident("optional"), _)) => {
                self.bump();
                Some(FieldLabel::Optional)
            }
            Some((Token::Ident("required"), _)) => {
                self.bump();
                Some(FieldLabel::Required)
            }
            Some((Token::Ident("repeated"), _)) => {
                self.bump();
                Some(FieldLabel::Repeated)
            }
            _ => None,
        };

        let ty = self.parse_type()?;

        let (name, _) = self.parse_ident()?;

        self.expect_eq(Token::Equals)?;

        let tag = self.parse_tag()?;

        let options = match self.peek() {
            Some((Token::LeftBracket, _)) => self.parse_options_list()?,
            _ => vec![],
        };

        Ok(ast::Field {
            label,
            ty,
            name,
            tag,
            options,
        })
    }

    fn parse_type(&mut self) -> Result<FieldType, ()> {
        match self.peek() {
            Some((Token::Ident("map"), _)) => {
                self.bump();
                self.expect_eq(Token::LeftAngleBracket)?;
                let key = self.parse_type()?;
                self.expect_eq(Token::Comma)?;
                let value = self.parse_type()?;
                self.expect_eq(Token::RightAngleBracket)?;
                Ok(FieldType::Map(Box::new(key), Box::new(value)))
            }
            Some((Token::Ident(value), _)) => match Scalar::from_name(value) {
                Some(scalar) => {
                    self.bump();
                    Ok(FieldType::Scalar(scalar))
                }
                None => Ok(FieldType::Named(self.parse_dotted_ident()?.0)),
            },
            _ => self.unexpected_token("a field type"),
        }
    }

    fn parse_oneof(&mut self) -> Result<ast::Oneof, ()> {
        self.expect_eq(Token::ONEOF)?;

        let (name, _) = self.parse_ident()?;

        self.expect_eq(Token::LeftBrace)?;

        let mut entries = Vec::new();
        loop {
            match self.peek() {
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::RightBrace, _)) => {
                    self.bump();
                    break;
                }
                Some((Token::Ident("option"), _)) => {
                    entries.push(ast::OneofEntry::Option(self.parse_option()?));
                }
                Some((Token::Ident(_), _)) => {
                    entries.push(ast::OneofEntry::Field(self.parse_field()?));
                }
                _ => self.unexpected_token("a oneof field, 'option', '}' or ';'")?,
            }
        }

        Ok(ast::Oneof { name, entries })
    }

    fn parse_enum(&mut self) -> Result<ast::Enum, ()> {
        self.expect_eq(Token::ENUM)?;

        let (name, name_span) = self.parse_ident()?;

        self.expect_eq(Token::LeftBrace)?;

        let mut entries = Vec::new();
        loop {
            match self.peek() {
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::RightBrace, _)) => {
                    self.bump();
                    break;
                }
                Some((Token::Ident("option"), _)) => {
                    entries.push(ast::EnumEntry::Option(self.parse_option()?));
                }
                Some((Token::Ident(_), _)) => {
                    entries.push(ast::EnumEntry::Value(self.parse_enum_value()?));
                }
                _ => self.unexpected_token("an identifier, 'option', '}' or ';'")?,
            }
        }

        Ok(ast::Enum {
            name,
            name_span,
            entries,
        })
    }

    fn parse_enum_value(&mut self) -> Result<ast::EnumValue, ()> {
        let (name, _) = self.parse_ident()?;

        self.expect_eq(Token::Equals)?;

        let negative = self.bump_if_eq(Token::Minus);
        let number = match self.peek() {
            Some((Token::IntLiteral(value), span)) => {
                self.bump();
                self.parse_int_value(negative, value, &span)?
            }
            _ => self.unexpected_token("an integer")?,
        };

        let options = match self.peek() {
            Some((Token::LeftBracket, _)) => self.parse_options_list()?,
            _ => vec![],
        };

        Ok(ast::EnumValue {
            name,
            number,
            options,
        })
    }

    fn parse_service(&mut self) -> Result<ast::Service, ()> {
        self.expect_eq(Token::SERVICE)?;

        let (name, name_span) = self.parse_ident()?;

        self.expect_eq(Token::LeftBrace)?;

        let mut entries = Vec::new();
        loop {
            match self.peek() {
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::RightBrace, _)) => {
                    self.bump();
                    break;
                }
                Some((Token::Ident("option"), _)) => {
                    entries.push(ast::ServiceEntry::Option(self.parse_option()?));
                }
                Some((Token::Ident("rpc"), _)) => {
                    entries.push(ast::ServiceEntry::Method(self.parse_method()?));
                }
                _ => self.unexpected_token("'rpc', 'option', '}' or ';'")?,
            }
        }

        Ok(ast::Service {
            name,
            name_span,
            entries,
        })
    }

    fn parse_method(&mut self) -> Result<ast::Method, ()> {
        self.expect_eq(Token::RPC)?;

        let (name, name_span) = self.parse_ident()?;

        self.expect_eq(Token::LeftParen)?;
        let (request, request_streaming) = self.parse_method_type()?;
        self.expect_eq(Token::RightParen)?;

        self.expect_eq(Token::RETURNS)?;

        self.expect_eq(Token::LeftParen)?;
        let (response, response_streaming) = self.parse_method_type()?;
        self.expect_eq(Token::RightParen)?;

        let mut options = Vec::new();
        if self.bump_if_eq(Token::LeftBrace) {
            loop {
                match self.peek() {
                    Some((Token::Semicolon, _)) => {
                        self.bump();
                    }
                    Some((Token::RightBrace, _)) => {
                        self.bump();
                        break;
                    }
                    Some((Token::Ident("option"), _)) => {
                        options.push(self.parse_option()?);
                    }
                    _ => self.unexpected_token("'option', '}' or ';'")?,
                }
            }
        }

        Ok(ast::Method {
            name,
            name_span,
            request,
            request_streaming,
            response,
            response_streaming,
            options,
        })
    }

    /// Parses the parenthesized type of an rpc request or response, with its
    /// optional leading `stream` qualifier. `stream` may itself name a type,
    /// so the following token decides.
    fn parse_method_type(&mut self) -> Result<(FieldType, bool), ()> {
        if self.bump_if_eq(Token::STREAM) {
            match self.peek() {
                Some((Token::RightParen, _)) => Ok((FieldType::Named("stream".to_owned()), false)),
                Some((Token::Dot, _)) => {
                    let mut name = String::from("stream");
                    while self.bump_if_eq(Token::Dot) {
                        name.push('.');
                        name.push_str(&self.parse_ident()?.0);
                    }
                    Ok((FieldType::Named(name), false))
                }
                _ => Ok((self.parse_type()?, true)),
            }
        } else {
            Ok((self.parse_type()?, false))
        }
    }

    fn parse_extend(&mut self) -> Result<ast::Extend, ()> {
        self.expect_eq(Token::EXTEND)?;

        let (name, _) = self.parse_dotted_ident()?;

        self.expect_eq(Token::LeftBrace)?;

        let mut fields = Vec::new();
        loop {
            match self.peek() {
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::RightBrace, _)) => {
                    self.bump();
                    break;
                }
                Some((Token::Ident(_), _)) => {
                    fields.push(self.parse_field()?);
                }
                _ => self.unexpected_token("a message field, '}' or ';'")?,
            }
        }

        Ok(ast::Extend { name, fields })
    }

    fn parse_reserved(&mut self) -> Result<ast::Reserved, ()> {
        self.expect_eq(Token::RESERVED)?;

        Ok(ast::Reserved {
            items: self.parse_reserved_items()?,
        })
    }

    fn parse_extensions(&mut self) -> Result<ast::Extensions, ()> {
        self.expect_eq(Token::EXTENSIONS)?;

        Ok(ast::Extensions {
            items: self.parse_reserved_items()?,
        })
    }

    fn parse_reserved_items(&mut self) -> Result<Vec<ast::ReservedItem>, ()> {
        let mut items = vec![self.parse_reserved_item()?];

        while self.bump_if_eq(Token::Comma) {
            items.push(self.parse_reserved_item()?);
        }

        Ok(items)
    }

    fn parse_reserved_item(&mut self) -> Result<ast::ReservedItem, ()> {
        match self.peek() {
            Some((Token::StringLiteral(_), _)) => Ok(ast::ReservedItem::Name(self.parse_string()?)),
            Some((Token::IntLiteral(_), _)) => {
                let start = self.parse_tag()?;
                let end = if self.bump_if_eq(Token::TO) {
                    match self.peek() {
                        Some((Token::Ident("max"), _)) => {
                            self.bump();
                            ast::RangeEnd::Max
                        }
                        Some((Token::IntLiteral(_), _)) => ast::RangeEnd::Int(self.parse_tag()?),
                        _ => self.unexpected_token("an integer or 'max'")?,
                    }
                } else {
                    ast::RangeEnd::None
                };
                Ok(ast::ReservedItem::Range { start, end })
            }
            _ => self.unexpected_token("a positive integer or string"),
        }
    }

    fn parse_options_list(&mut self) -> Result<Vec<ast::OptionDecl>, ()> {
        self.expect_eq(Token::LeftBracket)?;

        let mut options = vec![self.parse_option_body()?];
        loop {
            match self.peek() {
                Some((Token::Comma, _)) => {
                    self.bump();
                    options.push(self.parse_option_body()?);
                }
                Some((Token::RightBracket, _)) => {
                    self.bump();
                    break;
                }
                _ => self.unexpected_token("',' or ']'")?,
            }
        }

        Ok(options)
    }

    fn parse_option(&mut self) -> Result<ast::OptionDecl, ()> {
        self.expect_eq(Token::OPTION)?;

        self.parse_option_body()
    }

    fn parse_option_body(&mut self) -> Result<ast::OptionDecl, ()> {
        let (name, name_span, parenthesized) = match self.peek() {
            Some((Token::LeftParen, span)) => {
                self.bump();
                let (name, _) = self.parse_dotted_ident()?;
                let (_, end) = self.expect_eq(Token::RightParen)?;
                (name, join_span(span, end), true)
            }
            Some((Token::Ident(_), _)) => {
                let (name, span) = self.parse_dotted_ident()?;
                (name, span, false)
            }
            _ => self.unexpected_token("an identifier or '('")?,
        };

        // `option (ext).attr = value` attribute suffixes only follow
        // parenthesized names; a bare dotted name consumes its dots above.
        let attr = if parenthesized && self.bump_if_eq(Token::Dot) {
            Some(self.parse_dotted_ident()?.0)
        } else {
            None
        };

        self.expect_eq(Token::Equals)?;

        let (value, value_span) = self.parse_value()?;

        Ok(ast::OptionDecl {
            name,
            attr,
            value,
            span: join_span(name_span, value_span),
        })
    }

    fn parse_value(&mut self) -> Result<(ast::Value, Span), ()> {
        match self.peek() {
            Some((Token::StringLiteral(bytes), span)) => {
                self.bump();
                match String::from_utf8(bytes.into_owned()) {
                    Ok(value) => Ok((ast::Value::String(value), span)),
                    Err(_) => {
                        self.add_error(ParseErrorKind::InvalidUtf8String { span });
                        Err(())
                    }
                }
            }
            Some((Token::IntLiteral(value), span)) => {
                self.bump();
                let value = self.parse_int_value(false, value, &span)?;
                Ok((ast::Value::Int(value), span))
            }
            Some((Token::FloatLiteral(value), span)) => {
                self.bump();
                Ok((ast::Value::Float(value.0), span))
            }
            Some((Token::Minus, start)) => {
                self.bump();
                match self.peek() {
                    Some((Token::IntLiteral(value), span)) => {
                        self.bump();
                        let value = self.parse_int_value(true, value, &span)?;
                        Ok((ast::Value::Int(value), join_span(start, span)))
                    }
                    Some((Token::FloatLiteral(value), span)) => {
                        self.bump();
                        Ok((ast::Value::Float(-value.0), join_span(start, span)))
                    }
                    _ => self.unexpected_token("a numeric literal"),
                }
            }
            Some((Token::Plus, start)) => {
                self.bump();
                match self.peek() {
                    Some((Token::IntLiteral(value), span)) => {
                        self.bump();
                        let value = self.parse_int_value(false, value, &span)?;
                        Ok((ast::Value::Int(value), join_span(start, span)))
                    }
                    Some((Token::FloatLiteral(value), span)) => {
                        self.bump();
                        Ok((ast::Value::Float(value.0), join_span(start, span)))
                    }
                    _ => self.unexpected_token("a numeric literal"),
                }
            }
            Some((Token::Ident("true"), span)) => {
                self.bump();
                Ok((ast::Value::Bool(true), span))
            }
            Some((Token::Ident("false"), span)) => {
                self.bump();
                Ok((ast::Value::Bool(false), span))
            }
            Some((Token::Ident(_), _)) => {
                let (name, span) = self.parse_dotted_ident()?;
                Ok((ast::Value::Reference(name), span))
            }
            Some((Token::LeftBracket, start)) => {
                self.bump();
                let mut elements = Vec::new();
                loop {
                    match self.peek() {
                        Some((Token::RightBracket, end)) => {
                            self.bump();
                            return Ok((ast::Value::Array(elements), join_span(start, end)));
                        }
                        Some((Token::Comma, _)) => {
                            self.bump();
                        }
                        _ => elements.push(self.parse_value()?.0),
                    }
                }
            }
            Some((Token::LeftBrace, start)) => {
                self.bump();
                let mut entries = Vec::new();
                loop {
                    match self.peek() {
                        Some((Token::RightBrace, end)) => {
                            self.bump();
                            return Ok((ast::Value::Map(entries), join_span(start, end)));
                        }
                        Some((Token::Comma, _)) => {
                            self.bump();
                        }
                        _ => {
                            let key = self.parse_value()?.0;
                            self.bump_if_eq(Token::Colon);
                            let value = self.parse_value()?.0;
                            entries.push((key, value));
                        }
                    }
                }
            }
            _ => self.unexpected_token("a constant"),
        }
    }

    fn parse_int_value(&mut self, negative: bool, value: u64, span: &Span) -> Result<i64, ()> {
        let limit = if negative {
            i64::MAX as u64 + 1
        } else {
            i64::MAX as u64
        };
        if value > limit {
            self.add_error(ParseErrorKind::IntegerOutOfRange { span: span.clone() });
            return Err(());
        }
        if negative {
            Ok((value as i128).wrapping_neg() as i64)
        } else {
            Ok(value as i64)
        }
    }

    fn parse_tag(&mut self) -> Result<i32, ()> {
        match self.peek() {
            Some((Token::IntLiteral(value), span)) => {
                self.bump();
                match i32::try_from(value) {
                    Ok(tag) => Ok(tag),
                    Err(_) => {
                        self.add_error(ParseErrorKind::IntegerOutOfRange { span });
                        Err(())
                    }
                }
            }
            _ => self.unexpected_token("a positive integer"),
        }
    }

    fn parse_dotted_ident(&mut self) -> Result<(String, Span), ()> {
        let (mut name, mut span) = self.parse_ident()?;

        while self.bump_if_eq(Token::Dot) {
            let (part, part_span) = self.parse_ident()?;
            name.push('.');
            name.push_str(&part);
            span = join_span(span, part_span);
        }

        Ok((name, span))
    }

    fn parse_ident(&mut self) -> Result<(String, Span), ()> {
        match self.peek() {
            Some((Token::Ident(value), span)) => {
                self.bump();
                Ok((value.to_owned(), span))
            }
            _ => self.unexpected_token("an identifier"),
        }
    }

    fn parse_string(&mut self) -> Result<String, ()> {
        match self.peek() {
            Some((Token::StringLiteral(value), span)) => {
                self.bump();
                match String::from_utf8(value.into_owned()) {
                    Ok(string) => Ok(string),
                    Err(_) => {
                        self.add_error(ParseErrorKind::InvalidUtf8String { span });
                        Err(())
                    }
                }
            }
            _ => self.unexpected_token("a string literal"),
        }
    }

    fn expect_eq(&mut self, t: Token) -> Result<(Token<'a>, Span), ()> {
        match self.peek() {
            Some((tok, _)) if tok == t => Ok(self.bump()),
            _ => self.unexpected_token(format!("'{}'", t)),
        }
    }

    fn bump_if_eq(&mut self, t: Token) -> bool {
        match self.peek() {
            Some((tok, _)) if tok == t => {
                self.bump();
                true
            }
            _ => false,
        }
    }

    fn bump(&mut self) -> (Token<'a>, Span) {
        self.peek
            .take()
            .expect("called bump without peek returning Some()")
    }

    fn peek(&mut self) -> Option<(Token<'a>, Span)> {
        if self.peek.is_none() {
            self.peek = self.next();
        }
        self.peek.clone()
    }

    fn next(&mut self) -> Option<(Token<'a>, Span)> {
        if self.peek.is_some() {
            return self.peek.take();
        }
        loop {
            match self.lexer.next() {
                Some(Ok(Token::Comment)) => continue,
                Some(Ok(tok)) => return Some((tok, self.lexer.span())),
                Some(Err(())) => {
                    // Record the invalid character and continue lexing; the
                    // accumulated errors fail the parse as a whole.
                    self.add_error(ParseErrorKind::InvalidToken {
                        span: self.lexer.span(),
                    });
                }
                None => return None,
            }
        }
    }

    fn unexpected_token<T>(&mut self, expected: impl ToString) -> Result<T, ()> {
        match self.peek() {
            Some((found, span)) => {
                self.add_error(ParseErrorKind::UnexpectedToken {
                    expected: expected.to_string(),
                    found: found.to_string(),
                    span,
                });
                Err(())
            }
            None => {
                self.add_error(ParseErrorKind::UnexpectedEof {
                    expected: expected.to_string(),
                });
                Err(())
            }
        }
    }

    fn add_error(&mut self, err: ParseErrorKind) {
        self.lexer.extras.errors.push(err);
    }
}
