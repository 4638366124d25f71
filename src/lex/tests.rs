use super::*;

#[test]
fn simple_tokens() {
    let source = r#"hell0 052 42 0x2A 5.0 0.5 0.42e+2 2e-4 .2e+3 52e3 true
        false "hello \a\b\f\n\r\t\v\?\\\'\" \052 \x2a" _foo"#;
    let mut lexer = Token::lexer(source);

    assert_eq!(lexer.next().unwrap(), Ok(Token::Ident("hell0")));
    assert_eq!(lexer.next().unwrap(), Ok(Token::IntLiteral(42)));
    assert_eq!(lexer.next().unwrap(), Ok(Token::IntLiteral(42)));
    assert_eq!(lexer.next().unwrap(), Ok(Token::IntLiteral(42)));
    assert_eq!(lexer.next().unwrap(), Ok(Token::FloatLiteral(EqFloat(5.))));
    assert_eq!(lexer.next().unwrap(), Ok(Token::FloatLiteral(EqFloat(0.5))));
    assert_eq!(
        lexer.next().unwrap(),
        Ok(Token::FloatLiteral(EqFloat(0.42e+2)))
    );
    assert_eq!(
        lexer.next().unwrap(),
        Ok(Token::FloatLiteral(EqFloat(2e-4)))
    );
    assert_eq!(
        lexer.next().unwrap(),
        Ok(Token::FloatLiteral(EqFloat(0.2e+3)))
    );
    assert_eq!(
        lexer.next().unwrap(),
        Ok(Token::FloatLiteral(EqFloat(52e3)))
    );
    assert_eq!(lexer.next().unwrap(), Ok(Token::Ident("true")));
    assert_eq!(lexer.next().unwrap(), Ok(Token::Ident("false")));
    assert_eq!(
        lexer.next().unwrap(),
        Ok(Token::StringLiteral(
            b"hello \x07\x08\x0c\n\r\t\x0b?\\'\" * *".as_ref().into()
        ))
    );
    assert_eq!(lexer.next().unwrap(), Ok(Token::Ident("_foo")));
    assert_eq!(lexer.next(), None);

    assert_eq!(lexer.extras.errors, vec![]);
}

#[test]
fn punctuation() {
    let source = "service Foo { rpc Bar (A) returns (B); }";
    let mut lexer = Token::lexer(source);

    assert_eq!(lexer.next().unwrap(), Ok(Token::Ident("service")));
    assert_eq!(lexer.next().unwrap(), Ok(Token::Ident("Foo")));
    assert_eq!(lexer.next().unwrap(), Ok(Token::LeftBrace));
    assert_eq!(lexer.next().unwrap(), Ok(Token::Ident("rpc")));
    assert_eq!(lexer.next().unwrap(), Ok(Token::Ident("Bar")));
    assert_eq!(lexer.next().unwrap(), Ok(Token::LeftParen));
    assert_eq!(lexer.next().unwrap(), Ok(Token::Ident("A")));
    assert_eq!(lexer.next().unwrap(), Ok(Token::RightParen));
    assert_eq!(lexer.next().unwrap(), Ok(Token::Ident("returns")));
    assert_eq!(lexer.next().unwrap(), Ok(Token::LeftParen));
    assert_eq!(lexer.next().unwrap(), Ok(Token::Ident("B")));
    assert_eq!(lexer.next().unwrap(), Ok(Token::RightParen));
    assert_eq!(lexer.next().unwrap(), Ok(Token::Semicolon));
    assert_eq!(lexer.next().unwrap(), Ok(Token::RightBrace));
    assert_eq!(lexer.next(), None);

    assert_eq!(lexer.extras.errors, vec![]);
}

#[test]
fn integer_overflow() {
    let source = "99999999999999999999999999999999999999 4";
    let mut lexer = Token::lexer(source);

    assert_eq!(lexer.next(), Some(Ok(Token::IntLiteral(0))));
    assert_eq!(lexer.next(), Some(Ok(Token::IntLiteral(4))));
    assert_eq!(lexer.next(), None);

    assert_eq!(
        lexer.extras.errors,
        vec![ParseErrorKind::IntegerOutOfRange {
            span: 0..(source.len() - 2),
        }]
    );
}

#[test]
fn invalid_token() {
    let source = "okay $";
    let mut lexer = Token::lexer(source);

    assert_eq!(lexer.next(), Some(Ok(Token::Ident("okay"))));
    assert_eq!(lexer.next(), Some(Err(())));
    assert_eq!(lexer.next(), None);
}

#[test]
fn no_space_between_int_and_ident() {
    let source = "42foo";
    let mut lexer = Token::lexer(source);

    assert_eq!(lexer.next(), Some(Ok(Token::IntLiteral(42))));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("foo"))));
    assert_eq!(lexer.next(), None);

    assert_eq!(
        lexer.extras.errors,
        vec![ParseErrorKind::NoSpaceBetweenIntAndIdent { span: 0..5 }]
    );
}

#[test]
fn comments() {
    let source = "foo // line comment\nbar /* block\ncomment */ baz";
    let mut lexer = Token::lexer(source);

    assert_eq!(lexer.next(), Some(Ok(Token::Ident("foo"))));
    assert_eq!(lexer.next(), Some(Ok(Token::Comment)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("bar"))));
    assert_eq!(lexer.next(), Some(Ok(Token::Comment)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("baz"))));
    assert_eq!(lexer.next(), None);

    assert_eq!(lexer.extras.errors, vec![]);
}

#[test]
fn unterminated_block_comment() {
    let source = "foo /* comment";
    let mut lexer = Token::lexer(source);

    assert_eq!(lexer.next(), Some(Ok(Token::Ident("foo"))));
    assert_eq!(lexer.next(), Some(Ok(Token::Comment)));
    assert_eq!(lexer.next(), None);

    assert_eq!(
        lexer.extras.errors,
        vec![ParseErrorKind::UnexpectedEof {
            expected: "comment terminator".to_owned(),
        }]
    );
}

#[test]
fn invalid_string_escape() {
    let source = r#""\z""#;
    let mut lexer = Token::lexer(source);

    assert_eq!(
        lexer.next(),
        Some(Ok(Token::StringLiteral(b"z".as_ref().into())))
    );
    assert_eq!(lexer.next(), None);

    assert_eq!(
        lexer.extras.errors,
        vec![ParseErrorKind::InvalidStringEscape { span: 1..2 }]
    );
}

#[test]
fn unterminated_string() {
    let source = "\"abc\n";
    let mut lexer = Token::lexer(source);

    assert_eq!(
        lexer.next(),
        Some(Ok(Token::StringLiteral(b"abc".as_ref().into())))
    );

    assert_eq!(
        lexer.extras.errors,
        vec![ParseErrorKind::UnterminatedString { span: 4..5 }]
    );
}

#[test]
fn string_eof() {
    let source = "\"abc";
    let mut lexer = Token::lexer(source);

    assert_eq!(
        lexer.next(),
        Some(Ok(Token::StringLiteral(b"abc".as_ref().into())))
    );
    assert_eq!(lexer.next(), None);

    assert_eq!(
        lexer.extras.errors,
        vec![ParseErrorKind::UnexpectedEof {
            expected: "string terminator".to_owned(),
        }]
    );
}
