//! AST and symbol serialization for caching.
//!
//! A hand-rolled JSON emitter. Every enum is written as a stable integer
//! tag so a cache produced by one run can be read back by a later one;
//! the tags below are append-only.

use crate::{
    ast,
    resolver::{
        scope::{SymbolKind, SymbolTable},
        ty::{BareTy, Ty},
    },
    span::Span,
};
use std::fmt::Write as _;

/// Serialize a program to a structured document.
pub fn program(program: &ast::Program) -> String {
    let mut writer = Writer::default();
    writer.program(program);
    writer.output
}

/// Serialize a symbol table to a structured document.
pub fn symbols(table: &SymbolTable) -> String {
    let mut writer = Writer::default();
    writer.symbols(table);
    writer.output
}

// Stable statement tags. 15–20 are the entities the C-family ancestor
// modeled as statement kinds.
const STATEMENT_MALFORMED: u8 = 0;
const STATEMENT_VARIABLE: u8 = 1;
const STATEMENT_FUNCTION: u8 = 2;
const STATEMENT_STRUCT: u8 = 3;
const STATEMENT_ENUM: u8 = 4;
const STATEMENT_IMPORT: u8 = 5;
const STATEMENT_ASSIGNMENT: u8 = 6;
const STATEMENT_EXPRESSION: u8 = 7;
const STATEMENT_IF: u8 = 8;
const STATEMENT_WHILE: u8 = 9;
const STATEMENT_FOR: u8 = 10;
const STATEMENT_TRY_CATCH: u8 = 11;
const STATEMENT_RETURN: u8 = 12;
const STATEMENT_BREAK: u8 = 13;
const STATEMENT_CONTINUE: u8 = 14;
const STATEMENT_PARAMETER: u8 = 15;
const STATEMENT_GENERIC: u8 = 16;
const STATEMENT_IMPORT_FIELD: u8 = 17;
const STATEMENT_IMPORT_ITEM: u8 = 18;
const STATEMENT_STRUCT_FIELD: u8 = 19;
const STATEMENT_ENUM_VARIANT: u8 = 20;

const EXPRESSION_ERROR: u8 = 0;
const EXPRESSION_LITERAL: u8 = 1;
const EXPRESSION_VARIABLE: u8 = 2;
const EXPRESSION_SCOPE: u8 = 3;
const EXPRESSION_MEMBER: u8 = 4;
const EXPRESSION_REFERENCE: u8 = 5;
const EXPRESSION_DEREFERENCE: u8 = 6;
const EXPRESSION_INDEX: u8 = 7;
const EXPRESSION_BINARY: u8 = 8;
const EXPRESSION_UNARY: u8 = 9;
const EXPRESSION_CALL: u8 = 10;
const EXPRESSION_RANGE: u8 = 11;
const EXPRESSION_NONE: u8 = 12;

const TYPE_LITERAL: u8 = 1;
const TYPE_VOID: u8 = 2;
const TYPE_ANY: u8 = 3;
const TYPE_FUNCTION: u8 = 4;
const TYPE_POINTER: u8 = 5;
const TYPE_REFERENCE: u8 = 6;
const TYPE_OBJECT: u8 = 7;
const TYPE_SCOPE: u8 = 8;
const TYPE_NONE: u8 = 9;

const fn literal_tag(kind: ast::LiteralKind) -> u8 {
    use ast::LiteralKind::*;

    match kind {
        Str => 1,
        Char => 2,
        I32 => 3,
        I64 => 4,
        I128 => 5,
        F32 => 6,
        F64 => 7,
        Bool => 8,
        UnkInt => 9,
        UnkFloat => 10,
    }
}

const fn mutability_tag(mutability: ast::Mutability) -> u8 {
    match mutability {
        ast::Mutability::Static => 0,
        ast::Mutability::Constant => 1,
        ast::Mutability::Variable => 2,
    }
}

const fn symbol_kind_tag(kind: SymbolKind) -> u8 {
    match kind {
        SymbolKind::Namespace => 1,
        SymbolKind::Function => 2,
        SymbolKind::Variable => 3,
        SymbolKind::Parameter => 4,
        SymbolKind::Struct => 5,
        SymbolKind::Enum => 6,
        SymbolKind::Alias => 7,
    }
}

#[derive(Default)]
struct Writer {
    output: String,
}

impl Writer {
    fn program(&mut self, program: &ast::Program) {
        self.output.push('{');
        self.string("name", &program.name);
        self.output.push_str(",\"statements\":");
        self.statements(&program.statements);
        self.output.push('}');
    }

    fn statements(&mut self, statements: &[ast::Statement]) {
        self.output.push('[');
        for (index, statement) in statements.iter().enumerate() {
            if index > 0 {
                self.output.push(',');
            }
            self.statement(statement);
        }
        self.output.push(']');
    }

    fn statement(&mut self, statement: &ast::Statement) {
        use ast::BareStatement::*;

        self.output.push('{');

        let kind = match &statement.bare {
            Variable(_) => STATEMENT_VARIABLE,
            Function(_) => STATEMENT_FUNCTION,
            Struct(_) => STATEMENT_STRUCT,
            Enum(_) => STATEMENT_ENUM,
            Import(_) => STATEMENT_IMPORT,
            Assignment(_) => STATEMENT_ASSIGNMENT,
            Expression(_) => STATEMENT_EXPRESSION,
            If(_) => STATEMENT_IF,
            While(_) => STATEMENT_WHILE,
            For(_) => STATEMENT_FOR,
            TryCatch(_) => STATEMENT_TRY_CATCH,
            Return(_) => STATEMENT_RETURN,
            Break => STATEMENT_BREAK,
            Continue => STATEMENT_CONTINUE,
            Malformed => STATEMENT_MALFORMED,
        };
        self.number("kind", kind.into());
        self.span(statement.span);

        match &statement.bare {
            Variable(variable) => {
                self.string(",name", &variable.binder.bare);
                self.number(",mutability", mutability_tag(variable.mutability).into());
                self.flag(",public", variable.public);
                self.flag(",extern", variable.extern_);
                self.flag(",declare", variable.is_declaration());
                if let Some(ty) = &variable.ty {
                    self.output.push_str(",\"type\":");
                    self.ty(ty);
                }
                if let Some(value) = &variable.value {
                    self.output.push_str(",\"value\":");
                    self.expression(value);
                }
            }
            Function(function) => {
                self.string(",name", &function.binder.bare);
                self.flag(",public", function.public);
                self.flag(",extern", function.extern_);
                self.flag(",async", function.async_);
                self.flag(",declare", function.is_declaration());
                self.flag(",variadic", function.is_variadic());

                self.output.push_str(",\"generics\":[");
                for (index, generic) in function.generics.iter().enumerate() {
                    if index > 0 {
                        self.output.push(',');
                    }
                    self.generic(generic);
                }
                self.output.push(']');

                self.output.push_str(",\"params\":[");
                for (index, parameter) in function.parameters.iter().enumerate() {
                    if index > 0 {
                        self.output.push(',');
                    }
                    self.parameter(parameter);
                }
                self.output.push(']');

                if let Some(ty) = &function.return_ty {
                    self.output.push_str(",\"return\":");
                    self.ty(ty);
                }
                if let Some(body) = &function.body {
                    self.output.push_str(",\"body\":");
                    self.statements(body);
                }
            }
            Struct(struct_) => {
                self.string(",name", &struct_.binder.bare);
                self.flag(",public", struct_.public);
                self.flag(",extern", struct_.extern_);

                self.output.push_str(",\"generics\":[");
                for (index, generic) in struct_.generics.iter().enumerate() {
                    if index > 0 {
                        self.output.push(',');
                    }
                    self.generic(generic);
                }
                self.output.push(']');

                self.output.push_str(",\"fields\":[");
                for (index, field) in struct_.fields.iter().enumerate() {
                    if index > 0 {
                        self.output.push(',');
                    }
                    self.output.push('{');
                    self.number("kind", STATEMENT_STRUCT_FIELD.into());
                    self.span(field.span);
                    self.string(",name", &field.binder.bare);
                    self.output.push_str(",\"type\":");
                    self.ty(&field.ty);
                    self.output.push('}');
                }
                self.output.push(']');
            }
            Enum(enum_) => {
                self.string(",name", &enum_.binder.bare);
                self.flag(",public", enum_.public);
                self.flag(",extern", enum_.extern_);

                self.output.push_str(",\"variants\":[");
                for (index, variant) in enum_.variants.iter().enumerate() {
                    if index > 0 {
                        self.output.push(',');
                    }
                    self.output.push('{');
                    self.number("kind", STATEMENT_ENUM_VARIANT.into());
                    self.span(variant.span);
                    self.string(",name", &variant.binder.bare);
                    if let Some(value) = &variant.value {
                        self.output.push_str(",\"value\":");
                        self.expression(value);
                    }
                    self.output.push('}');
                }
                self.output.push(']');
            }
            Import(import) => {
                self.flag(",import_all", import.all);

                self.output.push_str(",\"import_qualified\":[");
                for (index, segment) in import.segments.iter().enumerate() {
                    if index > 0 {
                        self.output.push(',');
                    }
                    self.output.push('{');
                    self.number("kind", STATEMENT_IMPORT_FIELD.into());
                    self.span(segment.span);
                    self.string(",name", &segment.bare);
                    self.output.push('}');
                }
                self.output.push(']');

                self.output.push_str(",\"import_items\":[");
                for (index, item) in import.items.iter().enumerate() {
                    if index > 0 {
                        self.output.push(',');
                    }
                    self.output.push('{');
                    self.number("kind", STATEMENT_IMPORT_ITEM.into());
                    self.span(item.span);
                    self.string(",name", &item.binder.bare);
                    if let Some(alias) = &item.alias {
                        self.string(",alias", &alias.bare);
                    }
                    self.output.push('}');
                }
                self.output.push(']');
            }
            Assignment(assignment) => {
                self.output.push_str(",\"assign\":");
                self.expression(&assignment.target);
                self.output.push_str(",\"value\":");
                self.expression(&assignment.value);
            }
            Expression(expression) => {
                self.output.push_str(",\"value\":");
                self.expression(expression);
            }
            If(if_) => {
                self.output.push_str(",\"value\":");
                self.expression(&if_.condition);
                self.output.push_str(",\"then\":");
                self.statements(&if_.then);
                if let Some(else_) = &if_.else_ {
                    self.output.push_str(",\"else\":");
                    self.statements(else_);
                }
            }
            While(while_) => {
                self.output.push_str(",\"value\":");
                self.expression(&while_.condition);
                self.output.push_str(",\"body\":");
                self.statements(&while_.body);
            }
            For(for_) => {
                self.string(",name", &for_.binder.bare);
                self.output.push_str(",\"value\":");
                self.expression(&for_.iterator);
                self.output.push_str(",\"body\":");
                self.statements(&for_.body);
            }
            TryCatch(try_catch) => {
                self.output.push_str(",\"try\":");
                self.statements(&try_catch.try_);
                if let Some(binder) = &try_catch.binder {
                    self.string(",name", &binder.bare);
                }
                if let Some(catch) = &try_catch.catch {
                    self.output.push_str(",\"catch\":");
                    self.statements(catch);
                }
                if let Some(finally) = &try_catch.finally {
                    self.output.push_str(",\"finally\":");
                    self.statements(finally);
                }
            }
            Return(return_) => {
                if let Some(value) = &return_.value {
                    self.output.push_str(",\"value\":");
                    self.expression(value);
                }
            }
            Break | Continue | Malformed => {}
        }

        self.output.push('}');
    }

    fn parameter(&mut self, parameter: &ast::Parameter) {
        self.output.push('{');
        self.number("kind", STATEMENT_PARAMETER.into());
        self.span(parameter.span);
        self.string(",name", &parameter.binder.bare);
        self.flag(",variadic", parameter.variadic);
        self.output.push_str(",\"type\":");
        self.ty(&parameter.ty);
        self.output.push('}');
    }

    fn generic(&mut self, generic: &ast::GenericParameter) {
        self.output.push('{');
        self.number("kind", STATEMENT_GENERIC.into());
        self.span(generic.span);
        self.string(",name", &generic.binder.bare);
        if let Some(bound) = &generic.bound {
            self.output.push_str(",\"type\":");
            self.ty(bound);
        }
        self.output.push('}');
    }

    fn expression(&mut self, expression: &ast::Expression) {
        use ast::BareExpression::*;

        self.output.push('{');

        match &expression.bare {
            NumberLiteral(value) => {
                self.number("kind", EXPRESSION_LITERAL.into());
                let kind = if value.contains('.') {
                    ast::LiteralKind::UnkFloat
                } else {
                    ast::LiteralKind::UnkInt
                };
                self.number(",literal", literal_tag(kind).into());
                self.string(",value", value);
            }
            TextLiteral(value) => {
                self.number("kind", EXPRESSION_LITERAL.into());
                self.number(",literal", literal_tag(ast::LiteralKind::Str).into());
                self.string(",value", value);
            }
            CharacterLiteral(value) => {
                self.number("kind", EXPRESSION_LITERAL.into());
                self.number(",literal", literal_tag(ast::LiteralKind::Char).into());
                self.string(",value", &value.to_string());
            }
            BooleanLiteral(value) => {
                self.number("kind", EXPRESSION_LITERAL.into());
                self.number(",literal", literal_tag(ast::LiteralKind::Bool).into());
                self.string(",value", if *value { "true" } else { "false" });
            }
            NoneLiteral => self.number("kind", EXPRESSION_NONE.into()),
            Variable(binder) => {
                self.number("kind", EXPRESSION_VARIABLE.into());
                self.string(",name", &binder.bare);
            }
            Scope(access) => {
                self.number("kind", EXPRESSION_SCOPE.into());
                self.string(",name", &access.member.bare);
                self.output.push_str(",\"nested\":");
                self.expression(&access.nested);
            }
            Member(access) => {
                self.number("kind", EXPRESSION_MEMBER.into());
                self.string(",name", &access.member.bare);
                self.output.push_str(",\"nested\":");
                self.expression(&access.nested);
            }
            Reference(inner) => {
                self.number("kind", EXPRESSION_REFERENCE.into());
                self.output.push_str(",\"nested\":");
                self.expression(inner);
            }
            Dereference(inner) => {
                self.number("kind", EXPRESSION_DEREFERENCE.into());
                self.output.push_str(",\"nested\":");
                self.expression(inner);
            }
            Unary(unary) => {
                self.number("kind", EXPRESSION_UNARY.into());
                self.string(",op", &unary.operator.to_string());
                self.output.push_str(",\"nested\":");
                self.expression(&unary.inner);
            }
            Index(index) => {
                self.number("kind", EXPRESSION_INDEX.into());
                self.output.push_str(",\"nested\":");
                self.expression(&index.nested);
                self.output.push_str(",\"index\":");
                self.expression(&index.index);
            }
            Binary(binary) => {
                self.number("kind", EXPRESSION_BINARY.into());
                self.string(",op", &binary.operator.to_string());
                self.output.push_str(",\"lhs\":");
                self.expression(&binary.lhs);
                self.output.push_str(",\"rhs\":");
                self.expression(&binary.rhs);
            }
            Call(call) => {
                self.number("kind", EXPRESSION_CALL.into());
                self.output.push_str(",\"callee\":");
                self.expression(&call.callee);

                self.output.push_str(",\"generics\":[");
                for (index, generic) in call.generics.iter().enumerate() {
                    if index > 0 {
                        self.output.push(',');
                    }
                    self.ty(generic);
                }
                self.output.push(']');

                self.output.push_str(",\"args\":[");
                for (index, argument) in call.arguments.iter().enumerate() {
                    if index > 0 {
                        self.output.push(',');
                    }
                    self.expression(argument);
                }
                self.output.push(']');
            }
            Range(range) => {
                self.number("kind", EXPRESSION_RANGE.into());
                self.output.push_str(",\"lhs\":");
                self.expression(&range.lhs);
                self.output.push_str(",\"rhs\":");
                self.expression(&range.rhs);
            }
            Error => self.number("kind", EXPRESSION_ERROR.into()),
        }

        self.span(expression.span);
        if let Some(symbol) = expression.symbol {
            self.number(",symbol", symbol.value().into());
        }
        self.output.push('}');
    }

    fn ty(&mut self, ty: &ast::Type) {
        use ast::BareType::*;

        self.output.push('{');

        match &ty.bare {
            Literal(kind) => {
                self.number("kind", TYPE_LITERAL.into());
                self.number(",literal", literal_tag(*kind).into());
            }
            Void => self.number("kind", TYPE_VOID.into()),
            Any => self.number("kind", TYPE_ANY.into()),
            Function(_) => self.number("kind", TYPE_FUNCTION.into()),
            Pointer(inner) => {
                self.number("kind", TYPE_POINTER.into());
                self.output.push_str(",\"nested\":");
                self.ty(inner);
            }
            Reference(inner) => {
                self.number("kind", TYPE_REFERENCE.into());
                self.output.push_str(",\"nested\":");
                self.ty(inner);
            }
            Object(object) => {
                self.number("kind", TYPE_OBJECT.into());
                self.string(",name", &object.binder.bare);

                self.output.push_str(",\"generics\":[");
                for (index, generic) in object.generics.iter().enumerate() {
                    if index > 0 {
                        self.output.push(',');
                    }
                    self.ty(generic);
                }
                self.output.push(']');
            }
            Scope(scope) => {
                self.number("kind", TYPE_SCOPE.into());
                self.string(",name", &scope.member.bare);
                self.output.push_str(",\"nested\":");
                self.ty(&scope.nested);
            }
        }

        self.flag(",nullable", ty.nullable);
        if let Some(symbol) = ty.symbol {
            self.number(",symbol", symbol.value().into());
        }
        self.span(ty.span);
        self.output.push('}');
    }

    fn semantic_ty(&mut self, ty: &Ty) {
        self.output.push('{');

        match &ty.bare {
            BareTy::Literal(kind) => {
                self.number("kind", TYPE_LITERAL.into());
                self.number(",literal", literal_tag(*kind).into());
            }
            BareTy::Void => self.number("kind", TYPE_VOID.into()),
            BareTy::Any => self.number("kind", TYPE_ANY.into()),
            BareTy::None => self.number("kind", TYPE_NONE.into()),
            BareTy::Pointer(inner) => {
                self.number("kind", TYPE_POINTER.into());
                self.output.push_str(",\"nested\":");
                self.semantic_ty(inner);
            }
            BareTy::Reference(inner) => {
                self.number("kind", TYPE_REFERENCE.into());
                self.output.push_str(",\"nested\":");
                self.semantic_ty(inner);
            }
            BareTy::Object(symbol) => {
                self.number("kind", TYPE_OBJECT.into());
                self.number(",symbol", symbol.value().into());
            }
        }

        self.flag(",nullable", ty.nullable);
        self.output.push('}');
    }

    fn symbols(&mut self, table: &SymbolTable) {
        self.output.push('[');

        for (index, symbol) in table.iter() {
            if index.value() > 0 {
                self.output.push(',');
            }

            self.output.push('{');
            self.number("index", index.value().into());
            self.number(",kind", symbol_kind_tag(symbol.kind).into());
            self.string(",name", &symbol.name);
            self.string(",mangled_name", &symbol.mangled_name);
            if let Some(parent) = symbol.parent {
                self.number(",parent", parent.value().into());
            }

            self.output.push_str(",\"children\":[");
            for (position, child) in symbol.children.iter().enumerate() {
                if position > 0 {
                    self.output.push(',');
                }
                let _ = write!(self.output, "{}", child.value());
            }
            self.output.push(']');

            self.number(",mutability", mutability_tag(symbol.mutability).into());
            self.flag(",public", symbol.public);
            self.flag(",extern", symbol.extern_);
            self.flag(",async", symbol.async_);
            self.flag(",declare", symbol.declared);
            self.flag(",variadic", symbol.variadic);

            if let Some(ty) = &symbol.ty {
                self.output.push_str(",\"type\":");
                self.semantic_ty(ty);
            }
            if let Some(return_ty) = &symbol.return_ty {
                self.output.push_str(",\"return\":");
                self.semantic_ty(return_ty);
            }
            if !symbol.parameter_tys.is_empty() {
                self.output.push_str(",\"params\":[");
                for (position, ty) in symbol.parameter_tys.iter().enumerate() {
                    if position > 0 {
                        self.output.push(',');
                    }
                    self.semantic_ty(ty);
                }
                self.output.push(']');
            }
            if let Some(target) = symbol.target {
                self.number(",ref", target.value().into());
            }

            self.output.push('}');
        }

        self.output.push(']');
    }

    // ===== primitives =====

    /// Write a key-value pair; a leading comma on the key is emitted before
    /// the quoted key itself.
    fn string(&mut self, key: &str, value: &str) {
        self.key(key);
        self.output.push('"');
        for character in value.chars() {
            match character {
                '"' => self.output.push_str("\\\""),
                '\\' => self.output.push_str("\\\\"),
                '\n' => self.output.push_str("\\n"),
                '\t' => self.output.push_str("\\t"),
                '\r' => self.output.push_str("\\r"),
                character if (character as u32) < 0x20 => {
                    let _ = write!(self.output, "\\u{:04x}", character as u32);
                }
                character => self.output.push(character),
            }
        }
        self.output.push('"');
    }

    fn number(&mut self, key: &str, value: i64) {
        self.key(key);
        let _ = write!(self.output, "{value}");
    }

    fn flag(&mut self, key: &str, value: bool) {
        self.key(key);
        self.output.push_str(if value { "true" } else { "false" });
    }

    fn span(&mut self, span: Span) {
        let _ = write!(
            self.output,
            ",\"span\":[{},{}]",
            span.start.value(),
            span.end.value()
        );
    }

    fn key(&mut self, key: &str) {
        let (comma, key) = match key.strip_prefix(',') {
            Some(key) => (true, key),
            None => (false, key),
        };

        if comma {
            self.output.push(',');
        }
        self.output.push('"');
        self.output.push_str(key);
        self.output.push_str("\":");
    }
}

#[cfg(test)]
mod test {
    use crate::{
        diagnostics::Reporter,
        lexer, parser,
        span::{FileName, SourceMap},
    };

    fn parse(source: &str) -> crate::ast::Program {
        let mut map = SourceMap::default();
        let file = map.add_str(FileName::Anonymous, source);
        let reporter = Reporter::new();
        let tokens = lexer::lex(&map[file], &reporter);
        parser::parse(tokens, "test".into(), &reporter)
    }

    #[test]
    fn stable_statement_tags() {
        let program = parse("let x = 1; break");
        let document = super::program(&program);

        assert!(document.starts_with("{\"name\":\"test\""));
        // `let` is tag 1, `break` tag 13
        assert!(document.contains("\"kind\":1"));
        assert!(document.contains("\"kind\":13"));
    }

    #[test]
    fn literal_tags_and_escapes() {
        let program = parse("let s = \"a\\\"b\";");
        let document = super::program(&program);

        // string literals carry literal tag 1 and escaped content
        assert!(document.contains("\"literal\":1"));
        assert!(document.contains("\"value\":\"a\\\"b\""));
    }

    #[test]
    fn symbols_round_trip_fields() {
        let table = crate::resolver::scope::SymbolTable::new();
        let document = super::symbols(&table);

        assert!(document.starts_with("[{\"index\":0,\"kind\":1"));
        assert!(document.contains("\"name\":\"{universe}\""));
    }
}
