use super::{lex, token::BareToken::*, token::Token};
use crate::{
    diagnostics::Reporter,
    span::{span, FileName, SourceMap, Spanning},
};

fn lex_with_diagnostics(source: &str) -> (Vec<Token>, String) {
    colored::control::set_override(false);

    let mut map = SourceMap::default();
    let file = map.add_str(FileName::Anonymous, source);
    let reporter = Reporter::new();
    let tokens = lex(&map[file], &reporter);
    let diagnostics = reporter.render_to_string(Some(&map));

    (tokens, diagnostics)
}

#[track_caller]
fn assert_lex(source: &str, expected: Vec<Token>) {
    let (tokens, diagnostics) = lex_with_diagnostics(source);
    assert_eq!(diagnostics, "", "unexpected diagnostics");
    assert_eq!(tokens, expected);
}

#[test]
fn keywords_and_identifiers() {
    assert_lex(
        "func main",
        vec![
            Token::new(span(1, 5), Func),
            Token::new(span(6, 10), Identifier("main".into())),
            Token::new(span(10, 10), EndOfInput),
        ],
    );
}

#[test]
fn keyword_table() {
    let (tokens, diagnostics) =
        lex_with_diagnostics("if else while for try catch finally break continue return none true false self");
    assert_eq!(diagnostics, "");

    let bare: Vec<_> = tokens.into_iter().map(|token| token.bare).collect();
    assert_eq!(
        bare,
        vec![
            If, Else, While, For, Try, Catch, Finally, Break, Continue, Return, NoneLiteral,
            True, False, Self_, EndOfInput,
        ],
    );
}

#[test]
fn numbers_with_separators() {
    assert_lex(
        "1_000",
        vec![
            Token::new(span(1, 6), Number("1000".into())),
            Token::new(span(6, 6), EndOfInput),
        ],
    );
}

#[test]
fn float_literals() {
    assert_lex(
        "3.14 0.5",
        vec![
            Token::new(span(1, 5), Number("3.14".into())),
            Token::new(span(6, 9), Number("0.5".into())),
            Token::new(span(9, 9), EndOfInput),
        ],
    );
}

#[test]
fn malformed_number_with_dangling_separator() {
    let (tokens, diagnostics) = lex_with_diagnostics("12_.3");

    assert_eq!(
        tokens,
        vec![
            Token::new(span(1, 6), Number("12.3".into())),
            Token::new(span(6, 6), EndOfInput),
        ],
    );
    assert!(diagnostics.contains("invalid number format"));
    assert!(diagnostics.contains("expected digit after underscore"));
    assert!(diagnostics.contains("try this 12_0.3"));
}

#[test]
fn number_with_trailing_dot() {
    let (tokens, diagnostics) = lex_with_diagnostics("1.");

    assert_eq!(
        tokens,
        vec![
            Token::new(span(1, 3), Number("1.".into())),
            Token::new(span(3, 3), EndOfInput),
        ],
    );
    assert!(diagnostics.contains("expected digit after dot"));
    assert!(diagnostics.contains("try this 1.0"));
}

#[test]
fn number_does_not_swallow_a_range_operator() {
    assert_lex(
        "0..5",
        vec![
            Token::new(span(1, 2), Number("0".into())),
            Token::new(span(2, 4), DotDot),
            Token::new(span(4, 5), Number("5".into())),
            Token::new(span(5, 5), EndOfInput),
        ],
    );
}

#[test]
fn punctuation_longest_match() {
    assert_lex(
        "**= ** *",
        vec![
            Token::new(span(1, 4), DoubleAsteriskEquals),
            Token::new(span(5, 7), DoubleAsterisk),
            Token::new(span(8, 9), Asterisk),
            Token::new(span(9, 9), EndOfInput),
        ],
    );

    assert_lex(
        "... .. . :: :",
        vec![
            Token::new(span(1, 4), Ellipsis),
            Token::new(span(5, 7), DotDot),
            Token::new(span(8, 9), Dot),
            Token::new(span(10, 12), DoubleColon),
            Token::new(span(13, 14), Colon),
            Token::new(span(14, 14), EndOfInput),
        ],
    );
}

#[test]
fn string_literals_decode_escapes() {
    assert_lex(
        r#""hi\n""#,
        vec![
            Token::new(span(1, 7), Text("hi\n".into())),
            Token::new(span(7, 7), EndOfInput),
        ],
    );
}

#[test]
fn unterminated_string_literal() {
    let (tokens, diagnostics) = lex_with_diagnostics("\"abc");

    assert_eq!(
        tokens,
        vec![
            Token::new(span(1, 5), Text("abc".into())),
            Token::new(span(5, 5), EndOfInput),
        ],
    );
    assert!(diagnostics.contains("unterminated string literal"));
}

#[test]
fn unknown_escape_sequence() {
    let (tokens, diagnostics) = lex_with_diagnostics(r#""a\q""#);

    assert_eq!(tokens[0].bare, Text("a".into()));
    assert!(diagnostics.contains("invalid escape sequence"));
}

#[test]
fn character_literals() {
    assert_lex(
        r"'a' '\n'",
        vec![
            Token::new(span(1, 4), Character('a')),
            Token::new(span(5, 9), Character('\n')),
            Token::new(span(9, 9), EndOfInput),
        ],
    );
}

#[test]
fn empty_character_literal() {
    let (tokens, diagnostics) = lex_with_diagnostics("''");

    assert_eq!(tokens[0].bare, Character('\0'));
    assert!(diagnostics.contains("empty character literal"));
}

#[test]
fn unterminated_character_literal() {
    let (tokens, diagnostics) = lex_with_diagnostics("'ab'");

    assert_eq!(tokens[0].bare, Invalid);
    assert!(diagnostics.contains("unterminated character literal"));
}

#[test]
fn comments_are_skipped() {
    assert_lex(
        "1 // c\n2 /* x */ 3",
        vec![
            Token::new(span(1, 2), Number("1".into())),
            Token::new(span(8, 9), Number("2".into())),
            Token::new(span(18, 19), Number("3".into())),
            Token::new(span(19, 19), EndOfInput),
        ],
    );
}

#[test]
fn block_comments_do_not_nest() {
    // the first `*/` closes the comment
    assert_lex(
        "/* /* */ 1",
        vec![
            Token::new(span(10, 11), Number("1".into())),
            Token::new(span(11, 11), EndOfInput),
        ],
    );
}

#[test]
fn unterminated_block_comment() {
    let (tokens, diagnostics) = lex_with_diagnostics("/*x");

    assert_eq!(tokens, vec![Token::new(span(4, 4), EndOfInput)]);
    assert!(diagnostics.contains("unterminated block comment"));
}

#[test]
fn unknown_token() {
    let (tokens, diagnostics) = lex_with_diagnostics("`");

    assert_eq!(tokens[0].bare, Invalid);
    assert!(diagnostics.contains("unknown token \u{2018}`\u{2019}"));
}

#[test]
fn end_of_input_is_sticky() {
    let mut map = SourceMap::default();
    let file = map.add_str(FileName::Anonymous, "x");
    let reporter = Reporter::new();
    let mut lexer = super::Lexer::new(&map[file], &reporter);

    assert_eq!(lexer.next_token().bare, Identifier("x".into()));
    assert_eq!(lexer.next_token().bare, EndOfInput);
    assert_eq!(lexer.next_token().bare, EndOfInput);
    assert_eq!(reporter.count(), 0);
}

#[test]
fn raw_text_round_trips_through_the_source_map() {
    let source = "let x = (1 + 2_0) * f(\"s\");";
    let mut map = SourceMap::default();
    let file = map.add_str(FileName::Anonymous, source);
    let reporter = Reporter::new();
    let tokens = lex(&map[file], &reporter);

    let mut reconstructed = String::new();
    for token in &tokens {
        if token.bare == EndOfInput {
            break;
        }
        reconstructed.push_str(map.snippet(token.span()));
    }

    let expected: String = source.chars().filter(|c| !c.is_whitespace()).collect();
    assert_eq!(reconstructed, expected);
}
