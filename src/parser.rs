//! The syntactic analyzer (parser).
//!
//! A hand-written top-down recursive-descent parser with a Pratt-style
//! binary expression loop, bounded look-ahead and no backtracking.
//! Recoverable errors are reported to the [reporter](Reporter) and parsing
//! continues; on an unrecoverable synchronization failure the parser
//! advances a single token and leaves a [`Malformed`](ast::BareStatement)
//! statement behind.
//!
//! Statement-terminating semicolons are always optional: wherever a
//! statement ends, a single `;` may follow and is consumed.

use crate::{
    ast,
    diagnostics::{Diagnostic, ErrorKind, Reporter},
    lexer::token::{BareToken, Token},
    span::{Span, Spanned},
    SmallVec,
};
use BareToken::*;

#[cfg(test)]
mod test;

/// Parse a token stream into the [`Program`](ast::Program) of one source file.
pub fn parse(tokens: Vec<Token>, name: String, reporter: &Reporter) -> ast::Program {
    Parser::new(tokens, reporter).parse_program(name)
}

/// The state of the parser.
struct Parser<'a> {
    tokens: Vec<Token>,
    index: usize,
    inside_extern: bool,
    reporter: &'a Reporter,
}

#[derive(Clone, Copy, Default)]
struct Modifiers {
    public: bool,
    extern_: bool,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token>, reporter: &'a Reporter) -> Self {
        debug_assert!(matches!(tokens.last(), Some(token) if token.bare == EndOfInput));

        Self {
            tokens,
            index: 0,
            inside_extern: false,
            reporter,
        }
    }

    fn parse_program(mut self, name: String) -> ast::Program {
        let mut statements = Vec::new();

        loop {
            if self.consume(Semicolon) {
                continue;
            }
            if self.check(EndOfInput) {
                break;
            }
            self.parse_statement_into(&mut statements);
        }

        ast::Program { name, statements }
    }

    /// Parse one statement form into the given block.
    ///
    /// This exists instead of a plain `parse_statement` at the sequence
    /// level because an `extern { … }` block contributes *several*
    /// statements, each marked `extern`.
    fn parse_statement_into(&mut self, statements: &mut Vec<ast::Statement>) {
        if self.check(Extern) && self.look_ahead(1) == &OpeningCurlyBracket {
            let span = self.span();
            self.advance();

            if self.inside_extern {
                Diagnostic::error(ErrorKind::Syntax)
                    .message("unexpected syntax \u{2018}extern\u{2019}")
                    .span(span)
                    .note("extern blocks cannot be nested")
                    .report(self.reporter);
            }

            let inside_extern = std::mem::replace(&mut self.inside_extern, true);
            let mut block = self.parse_block();
            self.inside_extern = inside_extern;
            self.skip_semicolon();

            for statement in &mut block {
                mark_extern(statement);
            }
            statements.extend(block);
            return;
        }

        statements.push(self.parse_statement());
    }

    fn parse_statement(&mut self) -> ast::Statement {
        let span = self.span();

        match self.token() {
            Import => self.parse_import(),
            Public => {
                self.advance();
                self.parse_declarator(
                    Modifiers {
                        public: true,
                        extern_: self.inside_extern,
                    },
                    span,
                    Public,
                )
            }
            Extern => {
                self.advance();
                self.parse_declarator(
                    Modifiers {
                        public: false,
                        extern_: true,
                    },
                    span,
                    Extern,
                )
            }
            Static | Const | Let => self.parse_variable(self.modifiers(), span),
            Func => self.parse_function(self.modifiers(), span),
            Struct => self.parse_struct(self.modifiers(), span),
            Enum => self.parse_enum(self.modifiers(), span),
            If => self.parse_if(),
            While => self.parse_while(),
            For => self.parse_for(),
            Try => self.parse_try(),
            Return => self.parse_return(),
            Break => {
                self.advance();
                self.skip_semicolon();
                ast::Statement::new(span, ast::BareStatement::Break)
            }
            Continue => {
                self.advance();
                self.skip_semicolon();
                ast::Statement::new(span, ast::BareStatement::Continue)
            }
            Identifier(_) => self.parse_assignment_or_expression(),
            token => {
                Diagnostic::error(ErrorKind::Unexpected)
                    .message(format!("unexpected syntax {token}"))
                    .span(span)
                    .report(self.reporter);
                self.advance();
                ast::Statement::new(span, ast::BareStatement::Malformed)
            }
        }
    }

    /// Parse the declaration that has to follow a `public` or `extern`
    /// modifier.
    fn parse_declarator(
        &mut self,
        modifiers: Modifiers,
        span: Span,
        modifier: BareToken,
    ) -> ast::Statement {
        match self.token() {
            Static | Const | Let => self.parse_variable(modifiers, span),
            Func => self.parse_function(modifiers, span),
            Struct => self.parse_struct(modifiers, span),
            Enum => self.parse_enum(modifiers, span),
            token => {
                Diagnostic::error(ErrorKind::Syntax)
                    .message(format!("unexpected syntax {token}"))
                    .span(self.span())
                    .note(format!(
                        "expected \u{2018}static\u{2019}, \u{2018}const\u{2019}, \
                         \u{2018}func\u{2019}, \u{2018}struct\u{2019} or \
                         \u{2018}enum\u{2019} after {modifier}"
                    ))
                    .report(self.reporter);
                self.parse_statement()
            }
        }
    }

    fn parse_variable(&mut self, modifiers: Modifiers, span: Span) -> ast::Statement {
        let keyword = self.token();
        let mutability = match keyword {
            Static => ast::Mutability::Static,
            Const => ast::Mutability::Constant,
            _ => ast::Mutability::Variable,
        };
        self.advance();

        let Some(binder) = self.expect_identifier() else {
            return ast::Statement::new(span, ast::BareStatement::Malformed);
        };

        let ty = if self.consume(Colon) {
            Some(self.parse_type())
        } else {
            None
        };

        let value = if self.consume(Equals) {
            Some(self.parse_expression())
        } else {
            None
        };

        if mutability != ast::Mutability::Variable {
            if ty.is_none() {
                Diagnostic::error(ErrorKind::Syntax)
                    .message(format!(
                        "{keyword} declaration \u{2018}{binder}\u{2019} \
                         requires a type annotation"
                    ))
                    .span(span)
                    .report(self.reporter);
            }
            if value.is_none() {
                Diagnostic::error(ErrorKind::Syntax)
                    .message(format!(
                        "{keyword} declaration \u{2018}{binder}\u{2019} \
                         must be initialized"
                    ))
                    .span(span)
                    .report(self.reporter);
            }
        }

        self.skip_semicolon();

        ast::Statement::new(
            self.spanned_from(span),
            ast::BareStatement::Variable(Box::new(ast::Variable {
                binder,
                mutability,
                ty,
                value,
                public: modifiers.public,
                extern_: modifiers.extern_,
            })),
        )
    }

    fn parse_function(&mut self, modifiers: Modifiers, span: Span) -> ast::Statement {
        self.advance();

        let Some(binder) = self.expect_identifier() else {
            return ast::Statement::new(span, ast::BareStatement::Malformed);
        };

        let generics = self.parse_optional_generics();

        if self.expect(OpeningRoundBracket).is_none() {
            return ast::Statement::new(self.spanned_from(span), ast::BareStatement::Malformed);
        }

        let mut parameters = SmallVec::new();
        while !self.check(ClosingRoundBracket) && !self.check(EndOfInput) {
            let parameter_span = self.span();
            let variadic = self.consume(Ellipsis);

            let Some(binder) = self.expect_identifier() else {
                break;
            };
            if self.expect(Colon).is_none() {
                break;
            }
            let ty = self.parse_type();

            parameters.push(ast::Parameter {
                span: parameter_span.merge(&ty),
                binder,
                ty,
                variadic,
            });

            // a variadic parameter is necessarily the final one
            if variadic || !self.consume(Comma) {
                break;
            }
        }
        self.expect(ClosingRoundBracket);

        let return_ty = if self.consume(ThinArrowRight) {
            Some(self.parse_type())
        } else {
            None
        };

        let body = if self.check(OpeningCurlyBracket) {
            Some(self.parse_block())
        } else {
            None
        };
        self.skip_semicolon();

        ast::Statement::new(
            self.spanned_from(span),
            ast::BareStatement::Function(Box::new(ast::Function {
                binder,
                generics,
                parameters,
                return_ty,
                body,
                public: modifiers.public,
                extern_: modifiers.extern_,
                async_: false,
            })),
        )
    }

    fn parse_struct(&mut self, modifiers: Modifiers, span: Span) -> ast::Statement {
        self.advance();

        let Some(binder) = self.expect_identifier() else {
            return ast::Statement::new(span, ast::BareStatement::Malformed);
        };

        let generics = self.parse_optional_generics();

        let mut fields = Vec::new();
        if self.expect(OpeningCurlyBracket).is_some() {
            while !self.check(ClosingCurlyBracket) && !self.check(EndOfInput) {
                let field_span = self.span();
                let Some(binder) = self.expect_identifier() else {
                    break;
                };
                if self.expect(Colon).is_none() {
                    break;
                }
                let ty = self.parse_type();

                fields.push(ast::Field {
                    span: field_span.merge(&ty),
                    binder,
                    ty,
                });
                self.skip_semicolon();
            }
            self.expect(ClosingCurlyBracket);
        }
        self.skip_semicolon();

        ast::Statement::new(
            self.spanned_from(span),
            ast::BareStatement::Struct(Box::new(ast::Struct {
                binder,
                generics,
                fields,
                public: modifiers.public,
                extern_: modifiers.extern_,
            })),
        )
    }

    fn parse_enum(&mut self, modifiers: Modifiers, span: Span) -> ast::Statement {
        self.advance();

        let Some(binder) = self.expect_identifier() else {
            return ast::Statement::new(span, ast::BareStatement::Malformed);
        };

        let mut variants = Vec::new();
        if self.expect(OpeningCurlyBracket).is_some() {
            while !self.check(ClosingCurlyBracket) && !self.check(EndOfInput) {
                let variant_span = self.span();
                let Some(binder) = self.expect_identifier() else {
                    break;
                };
                let value = if self.consume(Equals) {
                    Some(self.parse_expression())
                } else {
                    None
                };

                variants.push(ast::Variant {
                    span: variant_span.merge(value.as_ref()),
                    binder,
                    value,
                });

                if !self.consume(Comma) {
                    break;
                }
            }
            self.expect(ClosingCurlyBracket);
        }
        self.skip_semicolon();

        ast::Statement::new(
            self.spanned_from(span),
            ast::BareStatement::Enum(Box::new(ast::Enum {
                binder,
                variants,
                public: modifiers.public,
                extern_: modifiers.extern_,
            })),
        )
    }

    /// Parse an import statement.
    ///
    /// `import A::B::C use { X, Y as Z, * };` — the qualified path is an
    /// ordered segment list; `*` may appear alone or as a member and sets
    /// the import-all flag, as does the absence of a `use` list.
    fn parse_import(&mut self) -> ast::Statement {
        let span = self.span();
        self.advance();

        let mut segments = Vec::new();
        loop {
            let Some(segment) = self.expect_identifier() else {
                break;
            };
            segments.push(segment);

            if !self.consume(DoubleColon) {
                break;
            }
        }

        let mut items = Vec::new();
        let mut all = false;

        if self.consume(Use) {
            if self.consume(Asterisk) {
                all = true;
            } else if self.consume(OpeningCurlyBracket) {
                while !self.check(ClosingCurlyBracket) && !self.check(EndOfInput) {
                    if self.consume(Asterisk) {
                        all = true;
                        break;
                    }

                    let Some(binder) = self.expect_identifier() else {
                        break;
                    };
                    let alias = if self.consume(As) {
                        self.expect_identifier()
                    } else {
                        None
                    };

                    let mut item_span = binder.span;
                    item_span.merging(&alias.as_ref());

                    items.push(ast::ImportItem {
                        span: item_span,
                        binder,
                        alias,
                    });

                    if !self.consume(Comma) {
                        break;
                    }
                }
                self.expect(ClosingCurlyBracket);
            } else {
                Diagnostic::error(ErrorKind::Syntax)
                    .message(format!(
                        "expected \u{2018}*\u{2019} or \u{2018}{{\u{2019} \
                         after \u{2018}use\u{2019}, but got {}",
                        self.token()
                    ))
                    .span(self.span())
                    .report(self.reporter);
            }
        } else {
            all = true;
        }

        self.skip_semicolon();

        ast::Statement::new(
            self.spanned_from(span),
            ast::BareStatement::Import(Box::new(ast::Import {
                segments,
                items,
                all,
            })),
        )
    }

    fn parse_if(&mut self) -> ast::Statement {
        let span = self.span();
        self.advance();

        let condition = self.parse_expression();
        let then = self.parse_block();

        let else_ = if self.consume(Else) {
            if self.check(If) {
                Some(vec![self.parse_statement()])
            } else {
                Some(self.parse_block())
            }
        } else {
            None
        };
        self.skip_semicolon();

        ast::Statement::new(
            self.spanned_from(span),
            ast::BareStatement::If(Box::new(ast::If {
                condition,
                then,
                else_,
            })),
        )
    }

    fn parse_while(&mut self) -> ast::Statement {
        let span = self.span();
        self.advance();

        let condition = self.parse_expression();
        let body = self.parse_block();
        self.skip_semicolon();

        ast::Statement::new(
            self.spanned_from(span),
            ast::BareStatement::While(Box::new(ast::While { condition, body })),
        )
    }

    fn parse_for(&mut self) -> ast::Statement {
        let span = self.span();
        self.advance();

        let Some(binder) = self.expect_identifier() else {
            return ast::Statement::new(span, ast::BareStatement::Malformed);
        };
        if self.expect(In).is_none() {
            return ast::Statement::new(self.spanned_from(span), ast::BareStatement::Malformed);
        }

        let iterator = self.parse_expression();
        let body = self.parse_block();
        self.skip_semicolon();

        ast::Statement::new(
            self.spanned_from(span),
            ast::BareStatement::For(Box::new(ast::For {
                binder,
                iterator,
                body,
            })),
        )
    }

    fn parse_try(&mut self) -> ast::Statement {
        let span = self.span();
        self.advance();

        let try_ = self.parse_block();

        let mut binder = None;
        let catch = if self.consume(Catch) {
            if matches!(self.token(), Identifier(_)) {
                binder = self.expect_identifier();
            }
            Some(self.parse_block())
        } else {
            None
        };

        let finally = if self.consume(Finally) {
            Some(self.parse_block())
        } else {
            None
        };
        self.skip_semicolon();

        ast::Statement::new(
            self.spanned_from(span),
            ast::BareStatement::TryCatch(Box::new(ast::TryCatch {
                try_,
                binder,
                catch,
                finally,
            })),
        )
    }

    fn parse_return(&mut self) -> ast::Statement {
        let span = self.span();
        self.advance();

        let value = if self.starts_expression() {
            Some(self.parse_expression())
        } else {
            None
        };
        self.skip_semicolon();

        ast::Statement::new(
            self.spanned_from(span),
            ast::BareStatement::Return(Box::new(ast::Return { value })),
        )
    }

    /// Parse the statement forms that begin with an identifier.
    ///
    /// The identifier opens a chain of postfix suffixes (indexing, calls,
    /// generic calls, member and scope accesses) which either terminates in
    /// an assignment operator or becomes an expression statement. A
    /// compound assignment `target ⊕= value` desugars to
    /// `target = target ⊕ value` where the duplicated target is a deep
    /// copy without any semantic decorations.
    fn parse_assignment_or_expression(&mut self) -> ast::Statement {
        let span = self.span();

        let Some(binder) = self.expect_identifier() else {
            return ast::Statement::new(span, ast::BareStatement::Malformed);
        };
        let target = ast::Expression::new(binder.span, ast::BareExpression::Variable(binder));
        let target = self.parse_chain(target);

        let operator = match self.token() {
            Equals => Some(None),
            PlusEquals => Some(Some(ast::BinaryOperator::Add)),
            MinusEquals => Some(Some(ast::BinaryOperator::Subtract)),
            AsteriskEquals => Some(Some(ast::BinaryOperator::Multiply)),
            SlashEquals => Some(Some(ast::BinaryOperator::Divide)),
            PercentEquals => Some(Some(ast::BinaryOperator::Remainder)),
            DoubleAsteriskEquals => Some(Some(ast::BinaryOperator::Power)),
            _ => None,
        };

        let bare = match operator {
            Some(compound) => {
                self.advance();
                let value = self.parse_expression();

                let value = match compound {
                    Some(operator) => ast::Expression::new(
                        target.span.merge(&value),
                        ast::BareExpression::Binary(Box::new(ast::Binary {
                            operator,
                            lhs: target.clone(),
                            rhs: value,
                        })),
                    ),
                    None => value,
                };

                ast::BareStatement::Assignment(Box::new(ast::Assignment { target, value }))
            }
            None => ast::BareStatement::Expression(Box::new(target)),
        };

        self.skip_semicolon();
        ast::Statement::new(self.spanned_from(span), bare)
    }

    /// Parse the postfix chain suffixes after a value.
    fn parse_chain(&mut self, mut expression: ast::Expression) -> ast::Expression {
        loop {
            match self.token() {
                OpeningSquareBracket => {
                    self.advance();
                    let index = self.parse_expression();
                    self.expect(ClosingSquareBracket);

                    expression = ast::Expression::new(
                        self.spanned_from(expression.span),
                        ast::BareExpression::Index(Box::new(ast::Index {
                            nested: expression,
                            index,
                        })),
                    );
                }
                OpeningRoundBracket => {
                    self.advance();
                    let arguments = self.parse_arguments();

                    expression = ast::Expression::new(
                        self.spanned_from(expression.span),
                        ast::BareExpression::Call(Box::new(ast::Call {
                            callee: expression,
                            generics: Vec::new(),
                            arguments,
                        })),
                    );
                }
                Less if self.looks_like_generic_call() => {
                    self.advance();

                    let mut generics = Vec::new();
                    while !self.check(Greater) && !self.check(EndOfInput) {
                        generics.push(self.parse_type());
                        if !self.consume(Comma) {
                            break;
                        }
                    }
                    self.expect(Greater);

                    self.expect(OpeningRoundBracket);
                    let arguments = self.parse_arguments();

                    expression = ast::Expression::new(
                        self.spanned_from(expression.span),
                        ast::BareExpression::Call(Box::new(ast::Call {
                            callee: expression,
                            generics,
                            arguments,
                        })),
                    );
                }
                Dot => {
                    self.advance();
                    let Some(member) = self.expect_identifier() else {
                        break;
                    };

                    expression = ast::Expression::new(
                        expression.span.merge(&member),
                        ast::BareExpression::Member(Box::new(ast::Access {
                            nested: expression,
                            member,
                        })),
                    );
                }
                DoubleColon => {
                    self.advance();
                    let Some(member) = self.expect_identifier() else {
                        break;
                    };

                    expression = ast::Expression::new(
                        expression.span.merge(&member),
                        ast::BareExpression::Scope(Box::new(ast::Access {
                            nested: expression,
                            member,
                        })),
                    );
                }
                _ => break,
            }
        }

        expression
    }

    /// Parse a round-bracketed argument list whose opening bracket has
    /// already been consumed.
    fn parse_arguments(&mut self) -> Vec<ast::Expression> {
        let mut arguments = Vec::new();

        while !self.check(ClosingRoundBracket) && !self.check(EndOfInput) {
            arguments.push(self.parse_expression());
            if !self.consume(Comma) {
                break;
            }
        }
        self.expect(ClosingRoundBracket);

        arguments
    }

    /// Decide whether a `<` after an identifier chain opens the generic
    /// list of a call.
    ///
    /// The look-ahead has to resolve to a well-formed type list followed by
    /// `>` and `(` — otherwise the `<` stays a comparison.
    fn looks_like_generic_call(&self) -> bool {
        const LOOK_AHEAD_LIMIT: usize = 32;

        let mut depth = 1_usize;

        for offset in 1..LOOK_AHEAD_LIMIT {
            match self.look_ahead(offset) {
                Less => depth += 1,
                Greater => {
                    depth -= 1;
                    if depth == 0 {
                        return self.look_ahead(offset + 1) == &OpeningRoundBracket;
                    }
                }
                Identifier(_) | I32 | I64 | I128 | F32 | F64 | Bool | Char | Str | Void
                | Any | Func | DoubleColon | Comma | QuestionMark | Asterisk | Ampersand => {}
                _ => return false,
            }
        }

        false
    }

    fn parse_expression(&mut self) -> ast::Expression {
        let lhs = self.parse_binary_expression(0);

        if self.consume(DotDot) {
            let rhs = self.parse_binary_expression(0);

            let span = lhs.span.merge(&rhs);
            return ast::Expression::new(
                span,
                ast::BareExpression::Range(Box::new(ast::Range { lhs, rhs })),
            );
        }

        lhs
    }

    /// Parse a binary expression at the given minimum precedence.
    ///
    /// All binary operators are left-associative which is why the operand
    /// parser recurses one precedence level above the operator just seen.
    fn parse_binary_expression(&mut self, minimum: u8) -> ast::Expression {
        let mut lhs = self.parse_value();

        loop {
            let Some(operator) = binary_operator(&self.token()) else {
                break;
            };
            if operator.precedence() < minimum {
                break;
            }
            self.advance();

            let rhs = self.parse_binary_expression(operator.precedence() + 1);

            let span = lhs.span.merge(&rhs);
            lhs = ast::Expression::new(
                span,
                ast::BareExpression::Binary(Box::new(ast::Binary { operator, lhs, rhs })),
            );
        }

        lhs
    }

    fn parse_value(&mut self) -> ast::Expression {
        let span = self.span();

        match self.token() {
            OpeningRoundBracket => {
                self.advance();
                let mut inner = self.parse_expression();
                self.expect(ClosingRoundBracket);
                inner.span = self.spanned_from(span);
                inner
            }
            Minus => self.parse_unary(span, ast::UnaryOperator::Negate),
            Plus => self.parse_unary(span, ast::UnaryOperator::Identity),
            Ampersand => {
                self.advance();
                let inner = self.parse_binary_expression(0);
                ast::Expression::new(
                    span.merge(&inner),
                    ast::BareExpression::Reference(Box::new(inner)),
                )
            }
            Asterisk => {
                self.advance();
                let inner = self.parse_binary_expression(0);
                ast::Expression::new(
                    span.merge(&inner),
                    ast::BareExpression::Dereference(Box::new(inner)),
                )
            }
            Number(value) => {
                self.advance();
                ast::Expression::new(span, ast::BareExpression::NumberLiteral(value))
            }
            Text(value) => {
                self.advance();
                ast::Expression::new(span, ast::BareExpression::TextLiteral(value))
            }
            Character(value) => {
                self.advance();
                ast::Expression::new(span, ast::BareExpression::CharacterLiteral(value))
            }
            True => {
                self.advance();
                ast::Expression::new(span, ast::BareExpression::BooleanLiteral(true))
            }
            False => {
                self.advance();
                ast::Expression::new(span, ast::BareExpression::BooleanLiteral(false))
            }
            NoneLiteral => {
                self.advance();
                ast::Expression::new(span, ast::BareExpression::NoneLiteral)
            }
            Identifier(name) => {
                self.advance();
                let variable =
                    ast::Expression::new(span, ast::BareExpression::Variable(Spanned::new(span, name)));
                self.parse_chain(variable)
            }
            token => {
                Diagnostic::error(ErrorKind::Unexpected)
                    .message(format!("expected expression, but got {token}"))
                    .span(span)
                    .report(self.reporter);
                ast::Expression::new(span, ast::BareExpression::Error)
            }
        }
    }

    fn parse_unary(&mut self, span: Span, operator: ast::UnaryOperator) -> ast::Expression {
        self.advance();
        let inner = self.parse_binary_expression(0);

        ast::Expression::new(
            span.merge(&inner),
            ast::BareExpression::Unary(Box::new(ast::Unary { operator, inner })),
        )
    }

    fn parse_type(&mut self) -> ast::Type {
        let span = self.span();

        let mut ty = match self.token() {
            I32 => self.parse_literal_type(span, ast::LiteralKind::I32),
            I64 => self.parse_literal_type(span, ast::LiteralKind::I64),
            I128 => self.parse_literal_type(span, ast::LiteralKind::I128),
            F32 => self.parse_literal_type(span, ast::LiteralKind::F32),
            F64 => self.parse_literal_type(span, ast::LiteralKind::F64),
            Bool => self.parse_literal_type(span, ast::LiteralKind::Bool),
            Char => self.parse_literal_type(span, ast::LiteralKind::Char),
            Str => self.parse_literal_type(span, ast::LiteralKind::Str),
            Void => {
                self.advance();
                ast::Type::new(span, ast::BareType::Void)
            }
            Any => {
                self.advance();
                ast::Type::new(span, ast::BareType::Any)
            }
            Func => {
                self.advance();
                ast::Type::new(
                    span,
                    ast::BareType::Function(Box::new(ast::FunctionType::default())),
                )
            }
            Identifier(name) => {
                self.advance();
                let binder = Spanned::new(span, name);

                let mut generics = Vec::new();
                if self.consume(Less) {
                    while !self.check(Greater) && !self.check(EndOfInput) {
                        generics.push(self.parse_type());
                        if !self.consume(Comma) {
                            break;
                        }
                    }
                    self.expect(Greater);

                    if generics.is_empty() {
                        Diagnostic::error(ErrorKind::Syntax)
                            .message("expected type after \u{2018}<\u{2019}")
                            .span(self.span())
                            .report(self.reporter);
                    }
                }

                let mut ty = ast::Type::new(
                    self.spanned_from(span),
                    ast::BareType::Object(Box::new(ast::ObjectType { binder, generics })),
                );

                while self.consume(DoubleColon) {
                    let Some(member) = self.expect_identifier() else {
                        break;
                    };
                    ty = ast::Type::new(
                        self.spanned_from(span),
                        ast::BareType::Scope(Box::new(ast::ScopeType { nested: ty, member })),
                    );
                }

                ty
            }
            token => {
                Diagnostic::error(ErrorKind::Syntax)
                    .message(format!("expected type, but got {token}"))
                    .span(span)
                    .report(self.reporter);
                return ast::Type::new(span, ast::BareType::Void);
            }
        };

        // trailing `?` marks nullability, trailing `*` and `&` wrap the
        // previously parsed type
        loop {
            match self.token() {
                QuestionMark => {
                    self.advance();
                    ty.span = self.spanned_from(span);
                    ty.nullable = true;
                }
                Asterisk => {
                    self.advance();
                    ty = ast::Type::new(
                        self.spanned_from(span),
                        ast::BareType::Pointer(Box::new(ty)),
                    );
                }
                Ampersand => {
                    self.advance();
                    ty = ast::Type::new(
                        self.spanned_from(span),
                        ast::BareType::Reference(Box::new(ty)),
                    );
                }
                _ => break,
            }
        }

        ty
    }

    fn parse_literal_type(&mut self, span: Span, kind: ast::LiteralKind) -> ast::Type {
        self.advance();
        ast::Type::new(span, ast::BareType::Literal(kind))
    }

    fn parse_optional_generics(&mut self) -> Vec<ast::GenericParameter> {
        let mut generics = Vec::new();

        if !self.consume(Less) {
            return generics;
        }

        while !self.check(Greater) && !self.check(EndOfInput) {
            let span = self.span();
            let Some(binder) = self.expect_identifier() else {
                break;
            };
            let bound = if self.consume(Colon) {
                Some(self.parse_type())
            } else {
                None
            };

            generics.push(ast::GenericParameter {
                span: span.merge(bound.as_ref()),
                binder,
                bound,
            });

            if !self.consume(Comma) {
                break;
            }
        }
        self.expect(Greater);

        if generics.is_empty() {
            Diagnostic::error(ErrorKind::Syntax)
                .message("expected generic type")
                .span(self.span())
                .note("a generic list cannot be empty")
                .report(self.reporter);
        }

        generics
    }

    fn parse_block(&mut self) -> Vec<ast::Statement> {
        let mut statements = Vec::new();

        if self.expect(OpeningCurlyBracket).is_none() {
            return statements;
        }

        loop {
            if self.consume(Semicolon) {
                continue;
            }
            if self.check(ClosingCurlyBracket) || self.check(EndOfInput) {
                break;
            }
            self.parse_statement_into(&mut statements);
        }

        if self.check(EndOfInput) {
            Diagnostic::error(ErrorKind::Syntax)
                .message("unexpected end of file, expected \u{2018}}\u{2019} to close the block")
                .span(self.span())
                .report(self.reporter);
        } else {
            self.advance();
        }

        statements
    }

    /// Whether the current token can start an expression.
    fn starts_expression(&self) -> bool {
        matches!(
            self.tokens[self.index].bare,
            Number(_)
                | Text(_)
                | Character(_)
                | True
                | False
                | NoneLiteral
                | Identifier(_)
                | OpeningRoundBracket
                | Minus
                | Plus
                | Asterisk
                | Ampersand
        )
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers {
            public: false,
            extern_: self.inside_extern,
        }
    }

    /// Obtain the current token.
    fn token(&self) -> BareToken {
        self.tokens[self.index].bare.clone()
    }

    /// Obtain the span of the current token.
    fn span(&self) -> Span {
        self.tokens[self.index].span
    }

    /// The span from the given start up to the most recently consumed token.
    fn spanned_from(&self, start: Span) -> Span {
        let end = self.tokens[self.index.saturating_sub(1)].span.end;
        Span::new(start.start, end.max(start.end))
    }

    fn look_ahead(&self, amount: usize) -> &BareToken {
        let index = (self.index + amount).min(self.tokens.len() - 1);
        &self.tokens[index].bare
    }

    /// Step to the next token. Never advances past the end of input.
    fn advance(&mut self) {
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
    }

    fn check(&self, token: BareToken) -> bool {
        self.tokens[self.index].bare == token
    }

    /// Consume the current token if it matches.
    fn consume(&mut self, token: BareToken) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect the current token to match, advance on success and report a
    /// syntax error on failure. Does not advance on failure.
    fn expect(&mut self, token: BareToken) -> Option<Span> {
        if self.check(token.clone()) {
            let span = self.span();
            self.advance();
            Some(span)
        } else {
            Diagnostic::error(ErrorKind::Syntax)
                .message(format!("expected {token}, but got {}", self.token()))
                .span(self.span())
                .report(self.reporter);
            None
        }
    }

    fn expect_identifier(&mut self) -> Option<ast::Identifier> {
        match self.token() {
            Identifier(name) => {
                let identifier = Spanned::new(self.span(), name);
                self.advance();
                Some(identifier)
            }
            token => {
                Diagnostic::error(ErrorKind::Syntax)
                    .message(format!("expected identifier, but got {token}"))
                    .span(self.span())
                    .report(self.reporter);
                None
            }
        }
    }

    fn skip_semicolon(&mut self) {
        self.consume(Semicolon);
    }
}

fn binary_operator(token: &BareToken) -> Option<ast::BinaryOperator> {
    use ast::BinaryOperator as Operator;

    Some(match token {
        DoubleAsterisk => Operator::Power,
        Asterisk => Operator::Multiply,
        Slash => Operator::Divide,
        Percent => Operator::Remainder,
        Plus => Operator::Add,
        Minus => Operator::Subtract,
        Less => Operator::Less,
        LessEqual => Operator::LessEqual,
        Greater => Operator::Greater,
        GreaterEqual => Operator::GreaterEqual,
        DoubleEquals => Operator::Equal,
        NotEquals => Operator::NotEqual,
        DoubleAmpersand => Operator::And,
        DoublePipe => Operator::Or,
        _ => return None,
    })
}

/// Mark a declaration inside an `extern { … }` block as `extern`.
fn mark_extern(statement: &mut ast::Statement) {
    match &mut statement.bare {
        ast::BareStatement::Variable(variable) => variable.extern_ = true,
        ast::BareStatement::Function(function) => function.extern_ = true,
        ast::BareStatement::Struct(r#struct) => r#struct.extern_ = true,
        ast::BareStatement::Enum(r#enum) => r#enum.extern_ = true,
        _ => {}
    }
}
