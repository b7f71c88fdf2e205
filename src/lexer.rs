//! The lexical analyzer (lexer).
//!
//! A fully synchronous stream of [tokens](token::Token): every call to
//! [`Lexer::next_token`] yields the next token of the file and once the end
//! of input is reached, every subsequent call yields the end-of-input token
//! again. The lexer never fails: malformed input is reported to the
//! [reporter](Reporter) and lexing continues with the best recovery.

use crate::{
    diagnostics::{Diagnostic, ErrorKind, Reporter},
    span::{LocalByteIndex, LocalSpan, SourceFile, Span},
    SmallVec,
};
use std::{iter::Peekable, str::CharIndices};
use token::{BareToken, Token};
use BareToken::*;

#[cfg(test)]
mod test;
pub mod token;

/// Lex the given file to its end.
pub fn lex(file: &SourceFile, reporter: &Reporter) -> Vec<Token> {
    let mut lexer = Lexer::new(file, reporter);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token();
        let done = token.bare == EndOfInput;
        tokens.push(token);

        if done {
            break tokens;
        }
    }
}

/// The state of the lexer.
pub struct Lexer<'a> {
    characters: Peekable<CharIndices<'a>>,
    file: &'a SourceFile,
    reporter: &'a Reporter,
    local_span: LocalSpan,
}

impl<'a> Lexer<'a> {
    pub fn new(file: &'a SourceFile, reporter: &'a Reporter) -> Self {
        Self {
            characters: file.content().char_indices().peekable(),
            file,
            reporter,
            local_span: LocalSpan::default(),
        }
    }

    /// Lex the next token of the stream.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let Some((index, character)) = self.peek_with_index() else {
            return Token::new(self.end_of_input_span(), EndOfInput);
        };

        self.local_span = LocalSpan::empty(index);

        match character {
            character if character.is_ascii_digit() => self.lex_number(),
            character if is_identifier_start(character) => self.lex_identifier(),
            '"' => self.lex_text(),
            '\'' => self.lex_character(),
            _ => self.lex_punctuation(character),
        }
    }

    /// Skip whitespace and comments between tokens.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(character) if character.is_whitespace() => self.advance(),
                Some('/') => match self.look_ahead(1) {
                    Some('/') => self.skip_line_comment(),
                    Some('*') => self.skip_block_comment(),
                    _ => return,
                },
                _ => return,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(character) = self.peek() {
            if character == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip a block comment. Block comments do not nest.
    fn skip_block_comment(&mut self) {
        let start = self.index().unwrap();
        self.local_span = LocalSpan::new(start, start + '/' + '*');
        self.advance();
        self.advance();

        loop {
            match self.peek() {
                Some('*') if self.look_ahead(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                Some(_) => self.advance(),
                None => {
                    Diagnostic::error(ErrorKind::Invalid)
                        .message("unterminated block comment")
                        .span(self.span())
                        .hint("close the comment with \u{2018}*/\u{2019}")
                        .report(self.reporter);
                    return;
                }
            }
        }
    }

    fn lex_number(&mut self) -> Token {
        let mut invalid_separators = SmallVec::<LocalSpan, 1>::new();

        self.lex_number_part(&mut invalid_separators);

        // A single trailing dot followed by another dot is left alone;
        // it belongs to a range operator.
        if self.peek() == Some('.') && self.look_ahead(1) != Some('.') {
            let dot = self.index().unwrap();
            self.take();
            self.advance();

            if matches!(self.peek(), Some(character) if character.is_ascii_digit()) {
                self.lex_number_part(&mut invalid_separators);
            } else {
                Diagnostic::error(ErrorKind::Invalid)
                    .message("invalid number format")
                    .span(LocalSpan::new(dot, dot + '.').global(self.file))
                    .note("expected digit after dot")
                    .hint(format!("try this {}0", self.source()))
                    .report(self.reporter);
            }
        }

        let raw = self.source();

        for &separator in &invalid_separators {
            let offset = usize::from(separator.start) - usize::from(self.local_span.start);
            let hint = format!("try this {}0{}", &raw[..=offset], &raw[offset + 1..]);

            Diagnostic::error(ErrorKind::Invalid)
                .message("invalid number format")
                .span(separator.global(self.file))
                .note("expected digit after underscore")
                .hint(hint)
                .report(self.reporter);
        }

        let value = raw.replace('_', "");
        Token::new(self.span(), Number(value))
    }

    /// Lex a run of digits with optional underscore separators.
    fn lex_number_part(&mut self, invalid_separators: &mut SmallVec<LocalSpan, 1>) {
        while let Some(character) = self.peek() {
            match character {
                character if character.is_ascii_digit() => {
                    self.take();
                    self.advance();
                }
                '_' => {
                    let index = self.index().unwrap();
                    self.take();
                    self.advance();

                    if !matches!(self.peek(), Some(character) if character.is_ascii_digit()) {
                        invalid_separators.push(LocalSpan::new(index, index + '_'));
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_identifier(&mut self) -> Token {
        self.take_while(is_identifier_middle);

        let token = match BareToken::keyword(self.source()) {
            Some(keyword) => keyword,
            None => Identifier(self.source().to_owned()),
        };

        Token::new(self.span(), token)
    }

    fn lex_text(&mut self) -> Token {
        self.take();
        self.advance();

        let mut value = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => {
                    // Emit the partial literal; the unconsumed line break is
                    // skipped as trivia before the next token.
                    Diagnostic::error(ErrorKind::Invalid)
                        .message("unterminated string literal")
                        .span(self.span())
                        .note("missing closing \u{2018}\"\u{2019}")
                        .hint(format!("try this \"{value}\""))
                        .report(self.reporter);
                    return Token::new(self.span(), Text(value));
                }
                Some('"') => {
                    self.take();
                    self.advance();
                    return Token::new(self.span(), Text(value));
                }
                Some('\\') => {
                    let backslash = self.index().unwrap();
                    self.take();
                    self.advance();

                    match self.peek() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('0') => value.push('\0'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some('r') if cfg!(windows) => value.push('\r'),
                        other => {
                            let end = self
                                .index()
                                .map_or_else(|| self.file.local_span().end, |index| index);
                            Diagnostic::error(ErrorKind::Invalid)
                                .message("invalid escape sequence")
                                .span(LocalSpan::new(backslash, end).global(self.file))
                                .hint(
                                    "supported escapes are \u{2018}\\n\u{2019}, \
                                     \u{2018}\\t\u{2019}, \u{2018}\\0\u{2019}, \
                                     \u{2018}\\\\\u{2019} and \u{2018}\\\"\u{2019}",
                                )
                                .report(self.reporter);

                            if other.is_none() {
                                continue;
                            }
                        }
                    }

                    if self.peek().is_some() {
                        self.take();
                        self.advance();
                    }
                }
                Some('\t') => {
                    let tab = self.index().unwrap();
                    Diagnostic::error(ErrorKind::Invalid)
                        .message("invalid character in string literal")
                        .span(LocalSpan::new(tab, tab + '\t').global(self.file))
                        .hint("escape it as \u{2018}\\t\u{2019}")
                        .report(self.reporter);
                    self.take();
                    self.advance();
                }
                Some(character) => {
                    value.push(character);
                    self.take();
                    self.advance();
                }
            }
        }
    }

    fn lex_character(&mut self) -> Token {
        self.take();
        self.advance();

        let value = match self.peek() {
            Some('\'') => {
                self.take();
                self.advance();
                Diagnostic::error(ErrorKind::Invalid)
                    .message("empty character literal")
                    .span(self.span())
                    .note("expected exactly one character or escape sequence")
                    .hint("write the character between the quotes, like \u{2018}'c'\u{2019}")
                    .report(self.reporter);
                return Token::new(self.span(), Character('\0'));
            }
            None | Some('\n') | Some('\t') => {
                let hint = match self.peek() {
                    Some('\n') => "escape it as \u{2018}'\\n'\u{2019}",
                    Some('\t') => "escape it as \u{2018}'\\t'\u{2019}",
                    _ => "add the character and a closing \u{2018}'\u{2019}",
                };
                Diagnostic::error(ErrorKind::Invalid)
                    .message("invalid character literal")
                    .span(self.span())
                    .note("unescaped control character")
                    .hint(hint)
                    .report(self.reporter);

                if self.peek().is_some() {
                    self.take();
                    self.advance();
                }
                return Token::new(self.span(), Invalid);
            }
            Some('\\') => {
                let backslash = self.index().unwrap();
                self.take();
                self.advance();

                let escaped = match self.peek() {
                    Some('n') => Some('\n'),
                    Some('t') => Some('\t'),
                    Some('0') => Some('\0'),
                    Some('\\') => Some('\\'),
                    Some('\'') => Some('\''),
                    Some('r') if cfg!(windows) => Some('\r'),
                    _ => None,
                };

                match escaped {
                    Some(character) => {
                        self.take();
                        self.advance();
                        character
                    }
                    None => {
                        let end = self
                            .index()
                            .map_or_else(|| self.file.local_span().end, |index| index);
                        Diagnostic::error(ErrorKind::Invalid)
                            .message("invalid escape sequence")
                            .span(LocalSpan::new(backslash, end).global(self.file))
                            .hint(
                                "supported escapes are \u{2018}\\n\u{2019}, \
                                 \u{2018}\\t\u{2019}, \u{2018}\\0\u{2019}, \
                                 \u{2018}\\\\\u{2019} and \u{2018}\\'\u{2019}",
                            )
                            .report(self.reporter);

                        if self.peek().is_some() {
                            self.take();
                            self.advance();
                        }
                        return Token::new(self.span(), Invalid);
                    }
                }
            }
            Some(character) => {
                self.take();
                self.advance();
                character
            }
        };

        if self.peek() == Some('\'') {
            self.take();
            self.advance();
            Token::new(self.span(), Character(value))
        } else {
            Diagnostic::error(ErrorKind::Invalid)
                .message("unterminated character literal")
                .span(self.span())
                .note("missing closing \u{2018}'\u{2019}")
                .report(self.reporter);
            Token::new(self.span(), Invalid)
        }
    }

    /// Lex a punctuation token by longest match.
    ///
    /// A two- and then a three-character prefix is greedily taken as long as
    /// it resolves to a known token.
    fn lex_punctuation(&mut self, character: char) -> Token {
        self.take();
        self.advance();

        let mut spelling = String::from(character);
        let mut token = BareToken::punctuation(&spelling);

        for _ in 0..2 {
            let Some(next) = self.peek() else { break };

            let mut extended = spelling.clone();
            extended.push(next);

            match BareToken::punctuation(&extended) {
                Some(extended_token) => {
                    self.take();
                    self.advance();
                    spelling = extended;
                    token = Some(extended_token);
                }
                None => break,
            }
        }

        match token {
            Some(token) => Token::new(self.span(), token),
            None => {
                Diagnostic::error(ErrorKind::Unknown)
                    .message(format!("unknown token \u{2018}{spelling}\u{2019}"))
                    .span(self.span())
                    .report(self.reporter);
                Token::new(self.span(), Invalid)
            }
        }
    }

    fn span(&self) -> Span {
        self.local_span.global(self.file)
    }

    fn source(&self) -> &'a str {
        &self.file[self.local_span]
    }

    fn end_of_input_span(&self) -> Span {
        LocalSpan::empty(self.file.local_span().end).global(self.file)
    }

    /// Step to the next character of the input.
    fn advance(&mut self) {
        self.characters.next();
    }

    /// Include the current character in the span of the token-to-be-emitted.
    fn take(&mut self) {
        let (index, character) = self.peek_with_index().unwrap();
        self.local_span.set_end(index + character);
    }

    fn peek(&mut self) -> Option<char> {
        self.peek_with_index().map(|(_, character)| character)
    }

    fn peek_with_index(&mut self) -> Option<(LocalByteIndex, char)> {
        self.characters
            .peek()
            .map(|&(index, character)| (index.try_into().unwrap(), character))
    }

    fn index(&mut self) -> Option<LocalByteIndex> {
        self.peek_with_index().map(|(index, _)| index)
    }

    fn look_ahead(&self, amount: usize) -> Option<char> {
        self.characters
            .clone()
            .nth(amount)
            .map(|(_, character)| character)
    }

    /// [Take](Self::take) the current character and all succeeding ones for
    /// which the predicate holds.
    fn take_while(&mut self, predicate: fn(char) -> bool) {
        while let Some(character) = self.peek() {
            if !predicate(character) {
                break;
            }
            self.take();
            self.advance();
        }
    }
}

const fn is_identifier_start(character: char) -> bool {
    character.is_ascii_alphabetic() || character == '_'
}

const fn is_identifier_middle(character: char) -> bool {
    character.is_ascii_alphanumeric() || character == '_'
}
