use crate::{
    ast::{self, BareExpression, BareStatement, BareType, BinaryOperator, LiteralKind, Mutability},
    diagnostics::Reporter,
    lexer,
    span::{FileName, SourceMap},
};

fn parse(source: &str) -> (ast::Program, usize) {
    let mut map = SourceMap::default();
    let file = map.add_str(FileName::Anonymous, source);
    let reporter = Reporter::new();
    let tokens = lexer::lex(&map[file], &reporter);
    let program = super::parse(tokens, "test".into(), &reporter);

    (program, reporter.count())
}

#[track_caller]
fn parse_clean(source: &str) -> ast::Program {
    let (program, diagnostics) = parse(source);
    assert_eq!(diagnostics, 0, "unexpected diagnostics");
    program
}

#[track_caller]
fn initializer(program: &ast::Program, index: usize) -> &ast::Expression {
    let BareStatement::Variable(variable) = &program.statements[index].bare else {
        panic!("expected a variable statement");
    };
    variable.value.as_ref().expect("expected an initializer")
}

#[track_caller]
fn binary(expression: &ast::Expression) -> (&ast::Expression, BinaryOperator, &ast::Expression) {
    let BareExpression::Binary(binary) = &expression.bare else {
        panic!("expected a binary expression");
    };
    (&binary.lhs, binary.operator, &binary.rhs)
}

fn number(expression: &ast::Expression) -> &str {
    let BareExpression::NumberLiteral(value) = &expression.bare else {
        panic!("expected a number literal");
    };
    value
}

#[test]
fn precedence() {
    let program = parse_clean("let p = 1 + 2 * 3;");

    let (lhs, operator, rhs) = binary(initializer(&program, 0));
    assert_eq!(operator, BinaryOperator::Add);
    assert_eq!(number(lhs), "1");

    let (lhs, operator, rhs) = binary(rhs);
    assert_eq!(operator, BinaryOperator::Multiply);
    assert_eq!(number(lhs), "2");
    assert_eq!(number(rhs), "3");
}

#[test]
fn power_binds_tighter_than_multiplication() {
    let program = parse_clean("let p = 2 * 3 ** 4;");

    let (lhs, operator, rhs) = binary(initializer(&program, 0));
    assert_eq!(operator, BinaryOperator::Multiply);
    assert_eq!(number(lhs), "2");

    let (_, operator, _) = binary(rhs);
    assert_eq!(operator, BinaryOperator::Power);
}

#[test]
fn equal_precedence_is_left_associative() {
    let program = parse_clean("let p = 1 - 2 - 3;");

    let (lhs, operator, rhs) = binary(initializer(&program, 0));
    assert_eq!(operator, BinaryOperator::Subtract);
    assert_eq!(number(rhs), "3");

    let (lhs, operator, _) = binary(lhs);
    assert_eq!(operator, BinaryOperator::Subtract);
    assert_eq!(number(lhs), "1");
}

#[test]
fn comparisons_bind_looser_than_arithmetic() {
    let program = parse_clean("let p = 1 + 2 < 3 && true;");

    let (lhs, operator, _) = binary(initializer(&program, 0));
    assert_eq!(operator, BinaryOperator::And);

    let (lhs, operator, _) = binary(lhs);
    assert_eq!(operator, BinaryOperator::Less);

    let (_, operator, _) = binary(lhs);
    assert_eq!(operator, BinaryOperator::Add);
}

#[test]
fn parenthesized_subexpressions() {
    let program = parse_clean("let p = (1 + 2) * 3;");

    let (lhs, operator, _) = binary(initializer(&program, 0));
    assert_eq!(operator, BinaryOperator::Multiply);
    let (_, operator, _) = binary(lhs);
    assert_eq!(operator, BinaryOperator::Add);
}

#[test]
fn statement_terminating_semicolons_are_optional() {
    let program = parse_clean("let x = 1 let y = 2");
    assert_eq!(program.statements.len(), 2);
}

#[test]
fn variable_forms() {
    let program = parse_clean("let a: i64 = 1; static b: i32 = 2; const c: f64 = 3.0; let d;");

    let BareStatement::Variable(a) = &program.statements[0].bare else {
        panic!();
    };
    assert_eq!(a.mutability, Mutability::Variable);
    assert!(matches!(
        a.ty.as_ref().unwrap().bare,
        BareType::Literal(LiteralKind::I64)
    ));

    let BareStatement::Variable(b) = &program.statements[1].bare else {
        panic!();
    };
    assert_eq!(b.mutability, Mutability::Static);

    let BareStatement::Variable(c) = &program.statements[2].bare else {
        panic!();
    };
    assert_eq!(c.mutability, Mutability::Constant);

    let BareStatement::Variable(d) = &program.statements[3].bare else {
        panic!();
    };
    assert!(d.is_declaration());
    assert!(d.ty.is_none());
}

#[test]
fn function_declaration_and_definition() {
    let program = parse_clean(
        "public func f<T: i64>(a: i32, ...rest: str) -> i64;\n\
         func g() { return; }",
    );

    let BareStatement::Function(f) = &program.statements[0].bare else {
        panic!();
    };
    assert!(f.public);
    assert!(f.is_declaration());
    assert!(f.is_variadic());
    assert_eq!(f.generics.len(), 1);
    assert_eq!(f.parameters.len(), 2);
    assert_eq!(f.parameters[0].binder.bare, "a");
    assert!(f.parameters[1].variadic);
    assert!(matches!(
        f.return_ty.as_ref().unwrap().bare,
        BareType::Literal(LiteralKind::I64)
    ));

    let BareStatement::Function(g) = &program.statements[1].bare else {
        panic!();
    };
    assert!(!g.is_declaration());
    assert_eq!(g.body.as_ref().unwrap().len(), 1);
}

#[test]
fn import_with_use_list() {
    let program = parse_clean("import a::b use { x, y as z };");

    let BareStatement::Import(import) = &program.statements[0].bare else {
        panic!();
    };
    assert_eq!(import.segments.len(), 2);
    assert_eq!(import.segments[0].bare, "a");
    assert_eq!(import.segments[1].bare, "b");
    assert!(!import.all);
    assert_eq!(import.items.len(), 2);
    assert_eq!(import.items[1].binder.bare, "y");
    assert_eq!(import.items[1].alias.as_ref().unwrap().bare, "z");
}

#[test]
fn import_all_forms() {
    for source in ["import a;", "import a use *;", "import a use { * };", "import a use { x, * };"] {
        let (program, diagnostics) = parse(source);
        assert_eq!(diagnostics, 0);

        let BareStatement::Import(import) = &program.statements[0].bare else {
            panic!();
        };
        assert!(import.all, "{source}");
    }
}

#[test]
fn compound_assignment_desugars() {
    let program = parse_clean("func f() { x += 1; }");

    let BareStatement::Function(f) = &program.statements[0].bare else {
        panic!();
    };
    let BareStatement::Assignment(assignment) = &f.body.as_ref().unwrap()[0].bare else {
        panic!("expected an assignment");
    };

    assert!(matches!(
        assignment.target.bare,
        BareExpression::Variable(_)
    ));
    let (lhs, operator, rhs) = binary(&assignment.value);
    assert_eq!(operator, BinaryOperator::Add);
    assert!(matches!(lhs.bare, BareExpression::Variable(_)));
    assert_eq!(number(rhs), "1");
}

#[test]
fn assignment_through_member_chain() {
    let program = parse_clean("func f() { a.b[0] = 1; }");

    let BareStatement::Function(f) = &program.statements[0].bare else {
        panic!();
    };
    let BareStatement::Assignment(assignment) = &f.body.as_ref().unwrap()[0].bare else {
        panic!();
    };
    assert!(matches!(assignment.target.bare, BareExpression::Index(_)));
}

#[test]
fn generic_call_versus_comparison() {
    let program = parse_clean("func f() { g<i64>(1); let c = a < b; }");

    let BareStatement::Function(f) = &program.statements[0].bare else {
        panic!();
    };
    let body = f.body.as_ref().unwrap();

    let BareStatement::Expression(expression) = &body[0].bare else {
        panic!("expected an expression statement");
    };
    let BareExpression::Call(call) = &expression.bare else {
        panic!("expected a call");
    };
    assert_eq!(call.generics.len(), 1);
    assert_eq!(call.arguments.len(), 1);

    let (_, operator, _) = binary(initializer_of(body, 1));
    assert_eq!(operator, BinaryOperator::Less);
}

#[track_caller]
fn initializer_of(statements: &[ast::Statement], index: usize) -> &ast::Expression {
    let BareStatement::Variable(variable) = &statements[index].bare else {
        panic!("expected a variable statement");
    };
    variable.value.as_ref().expect("expected an initializer")
}

#[test]
fn member_and_scope_chains() {
    let program = parse_clean("func f() { a::b.c(); }");

    let BareStatement::Function(f) = &program.statements[0].bare else {
        panic!();
    };
    let BareStatement::Expression(expression) = &f.body.as_ref().unwrap()[0].bare else {
        panic!();
    };
    let BareExpression::Call(call) = &expression.bare else {
        panic!();
    };
    let BareExpression::Member(member) = &call.callee.bare else {
        panic!("expected a member access callee");
    };
    assert_eq!(member.member.bare, "c");
    assert!(matches!(member.nested.bare, BareExpression::Scope(_)));
}

#[test]
fn unary_reference_and_dereference() {
    let program = parse_clean("let a = -1; let b = &x; let c = *p;");

    assert!(matches!(
        initializer(&program, 0).bare,
        BareExpression::Unary(_)
    ));
    assert!(matches!(
        initializer(&program, 1).bare,
        BareExpression::Reference(_)
    ));
    assert!(matches!(
        initializer(&program, 2).bare,
        BareExpression::Dereference(_)
    ));
}

#[test]
fn range_expressions() {
    let program = parse_clean("func f() { for i in 0 .. n + 1 { } }");

    let BareStatement::Function(f) = &program.statements[0].bare else {
        panic!();
    };
    let BareStatement::For(for_) = &f.body.as_ref().unwrap()[0].bare else {
        panic!("expected a for loop");
    };
    assert_eq!(for_.binder.bare, "i");

    let BareExpression::Range(range) = &for_.iterator.bare else {
        panic!("expected a range");
    };
    assert_eq!(number(&range.lhs), "0");
    assert!(matches!(range.rhs.bare, BareExpression::Binary(_)));
}

#[test]
fn if_else_chain() {
    let program = parse_clean("func f() { if a { } else if b { } else { } }");

    let BareStatement::Function(f) = &program.statements[0].bare else {
        panic!();
    };
    let BareStatement::If(if_) = &f.body.as_ref().unwrap()[0].bare else {
        panic!();
    };

    let else_ = if_.else_.as_ref().unwrap();
    assert_eq!(else_.len(), 1);
    let BareStatement::If(nested) = &else_[0].bare else {
        panic!("expected an else-if chain");
    };
    assert!(nested.else_.is_some());
}

#[test]
fn try_catch_finally() {
    let program = parse_clean("func f() { try { } catch e { } finally { } }");

    let BareStatement::Function(f) = &program.statements[0].bare else {
        panic!();
    };
    let BareStatement::TryCatch(try_catch) = &f.body.as_ref().unwrap()[0].bare else {
        panic!();
    };
    assert_eq!(try_catch.binder.as_ref().unwrap().bare, "e");
    assert!(try_catch.catch.is_some());
    assert!(try_catch.finally.is_some());
}

#[test]
fn struct_and_enum_declarations() {
    let program = parse_clean(
        "public struct Vec2<T: i64> { x: i64; y: i64 }\n\
         enum Color { Red, Green = 2 }",
    );

    let BareStatement::Struct(vec2) = &program.statements[0].bare else {
        panic!();
    };
    assert!(vec2.public);
    assert_eq!(vec2.generics.len(), 1);
    assert_eq!(vec2.fields.len(), 2);
    assert_eq!(vec2.fields[1].binder.bare, "y");

    let BareStatement::Enum(color) = &program.statements[1].bare else {
        panic!();
    };
    assert_eq!(color.variants.len(), 2);
    assert!(color.variants[0].value.is_none());
    assert!(color.variants[1].value.is_some());
}

#[test]
fn extern_block_marks_declarations() {
    let program = parse_clean("extern { func puts(s: str) -> i32; static errno: i32 = 0; }");

    assert_eq!(program.statements.len(), 2);
    let BareStatement::Function(puts) = &program.statements[0].bare else {
        panic!();
    };
    assert!(puts.extern_);
    let BareStatement::Variable(errno) = &program.statements[1].bare else {
        panic!();
    };
    assert!(errno.extern_);
}

#[test]
fn type_suffixes() {
    let program = parse_clean("let a: i32*; let b: str?; let c: Vec2<i64>::Item&;");

    let BareStatement::Variable(a) = &program.statements[0].bare else {
        panic!();
    };
    let BareType::Pointer(inner) = &a.ty.as_ref().unwrap().bare else {
        panic!("expected a pointer type");
    };
    assert!(matches!(inner.bare, BareType::Literal(LiteralKind::I32)));

    let BareStatement::Variable(b) = &program.statements[1].bare else {
        panic!();
    };
    assert!(b.ty.as_ref().unwrap().nullable);

    let BareStatement::Variable(c) = &program.statements[2].bare else {
        panic!();
    };
    let BareType::Reference(inner) = &c.ty.as_ref().unwrap().bare else {
        panic!("expected a reference type");
    };
    let BareType::Scope(scope) = &inner.bare else {
        panic!("expected a scope type");
    };
    assert_eq!(scope.member.bare, "Item");
    assert!(matches!(scope.nested.bare, BareType::Object(_)));
}

#[test]
fn recovery_leaves_malformed_statements() {
    let (program, diagnostics) = parse("@ let x = 1;");

    assert!(diagnostics > 0);
    assert_eq!(program.statements.len(), 2);
    assert!(matches!(program.statements[0].bare, BareStatement::Malformed));
    assert!(matches!(program.statements[1].bare, BareStatement::Variable(_)));
}

#[test]
fn unexpected_token_in_declarator_position() {
    let (program, diagnostics) = parse("public 5; let x = 1;");

    assert!(diagnostics > 0);
    assert!(matches!(
        program.statements.last().unwrap().bare,
        BareStatement::Variable(_)
    ));
}
