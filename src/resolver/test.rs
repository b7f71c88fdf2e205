use super::{analyze, analyze_entry, scope::SymbolKind, ty::BareTy, Session};
use crate::{
    ast::{self, BareStatement, LiteralKind},
    lexer, parser,
    span::{FileName, SourceMap},
};
use std::path::PathBuf;

fn analyze_source(source: &str) -> Session {
    colored::control::set_override(false);

    let mut session = Session::new(PathBuf::from("/nonexistent"));
    let file = session.map.add_str(FileName::Anonymous, source);
    let tokens = lexer::lex(&session.map[file], &session.reporter);
    let program = parser::parse(tokens, "main".into(), &session.reporter);
    analyze(&mut session, program, PathBuf::from("/nonexistent"));

    session
}

#[track_caller]
fn analyze_clean(source: &str) -> Session {
    let session = analyze_source(source);
    let diagnostics = session.reporter.render_to_string(Some(&session.map));
    assert_eq!(diagnostics, "", "unexpected diagnostics");
    session
}

#[track_caller]
fn diagnostics_of(source: &str) -> String {
    let session = analyze_source(source);
    assert!(session.reporter.count() > 0, "expected diagnostics");
    session.reporter.render_to_string(Some(&session.map))
}

fn variable_kind(session: &Session, name: &str) -> LiteralKind {
    let namespace = session.symbols.universe();
    let namespace = session.symbols.local(namespace, "main").unwrap();
    let symbol = session.symbols.local(namespace, name).unwrap();
    let ty = session.symbols[symbol].ty.as_ref().unwrap();
    ty.literal_kind().unwrap()
}

#[test]
fn function_call_resolution() {
    let session = analyze_clean(
        "public func greet(name: str) -> void {}\n\
         func main() { greet(\"world\"); }",
    );

    let namespace = session.symbols.local(session.symbols.universe(), "main").unwrap();
    let greet = session.symbols.local(namespace, "greet").unwrap();
    assert_eq!(session.symbols[greet].kind, SymbolKind::Function);
    assert!(session.symbols[greet].public);

    // the call site is decorated with the function symbol and the argument
    // with its string literal type
    let program = &session.programs[0];
    let BareStatement::Function(main) = &program.statements[1].bare else {
        panic!();
    };
    let BareStatement::Expression(call) = &main.body.as_ref().unwrap()[0].bare else {
        panic!();
    };
    let ast::BareExpression::Call(call) = &call.bare else {
        panic!();
    };
    assert_eq!(call.callee.symbol, Some(greet));
    assert_eq!(
        call.arguments[0].ty.as_ref().unwrap().literal_kind(),
        Some(LiteralKind::Str)
    );
}

#[test]
fn integer_width_inference() {
    let session = analyze_clean("let x: i64 = 5; let y = 5;");

    assert_eq!(variable_kind(&session, "x"), LiteralKind::I64);
    assert_eq!(variable_kind(&session, "y"), LiteralKind::I64);
}

#[test]
fn literal_beyond_the_i64_range_widens_to_i128() {
    let session = analyze_clean("let x = 170141183460469231731687303715884105727;");

    assert_eq!(variable_kind(&session, "x"), LiteralKind::I128);
}

#[test]
fn integer_literal_overflow() {
    let diagnostics = diagnostics_of("let x: i32 = 9999999999;");
    assert!(diagnostics.contains("integer literal overflow"));
}

#[test]
fn float_literals_default_to_f64() {
    let session = analyze_clean("let x = 2.5; let y: f32 = 1.5;");

    assert_eq!(variable_kind(&session, "x"), LiteralKind::F64);
    assert_eq!(variable_kind(&session, "y"), LiteralKind::F32);
}

#[test]
fn none_rejected_by_non_nullable_variable() {
    let diagnostics = diagnostics_of("let x: i64 = none;");
    assert!(diagnostics.contains("none"));
}

#[test]
fn none_accepted_by_nullable_variable() {
    analyze_clean("let x: i64? = none;");
}

#[test]
fn constant_variables_forbid_nullable_types() {
    let diagnostics = diagnostics_of("const c: i64? = 1;");
    assert!(diagnostics.contains("cannot be nullable"));
}

#[test]
fn widening_requires_a_cast() {
    let diagnostics = diagnostics_of("func f(a: i32) -> void { let x: i64 = a; }");
    assert!(diagnostics.contains("requires an explicit cast"));
}

#[test]
fn narrowing_is_permitted_at_initialization() {
    analyze_clean("func f(a: i64) -> void { let x: i32 = a; }");
}

#[test]
fn duplicate_functions_are_rejected() {
    let diagnostics = diagnostics_of("func f() {}\nfunc f() {}");
    assert!(diagnostics.contains("already defined"));
}

#[test]
fn forward_declaration_completed_by_definition() {
    let session = analyze_clean("func f() -> i64;\nfunc f() -> i64 { return 1; }");

    let namespace = session.symbols.local(session.symbols.universe(), "main").unwrap();
    let f = session.symbols.local(namespace, "f").unwrap();
    assert!(!session.symbols[f].declared);
}

#[test]
fn undefined_variable() {
    let diagnostics = diagnostics_of("func f() { let x = y; }");
    assert!(diagnostics.contains("\u{2018}y\u{2019} is not defined"));
}

#[test]
fn condition_must_be_boolean() {
    let diagnostics = diagnostics_of("func f() { if 1 { } }");
    assert!(diagnostics.contains("condition must be of type \u{2018}bool\u{2019}"));
}

#[test]
fn nullable_conditions_are_non_null_tests() {
    analyze_clean("func f(a: i64?) -> void { if a { } while a { } }");
}

#[test]
fn return_type_checking() {
    let diagnostics = diagnostics_of("func f() { return 1; }");
    assert!(diagnostics.contains("unexpected return value"));

    let diagnostics = diagnostics_of("func f() -> i64 { return; }");
    assert!(diagnostics.contains("missing return value"));

    analyze_clean("func f() -> i64 { return 42; }");
}

#[test]
fn assignment_mutability() {
    analyze_clean("func f() { let x = 1; x = 2; x += 3; }");

    let diagnostics = diagnostics_of("const c: i64 = 1; func f() { c = 2; }");
    assert!(diagnostics.contains("cannot assign to constant"));

    let diagnostics = diagnostics_of("static s: i64 = 1; func f() { s = 2; }");
    assert!(diagnostics.contains("cannot assign to static"));
}

#[test]
fn for_loops_infer_the_range_element_type() {
    let session = analyze_clean("func f() { for i in 0..10 { let x = i; } }");

    // the loop variable lives in a nested block scope with the integer
    // type of the endpoints
    let namespace = session.symbols.local(session.symbols.universe(), "main").unwrap();
    let f = session.symbols.local(namespace, "f").unwrap();
    let block = session.symbols.local(f, "@block0").unwrap();
    let i = session.symbols.local(block, "i").unwrap();
    assert_eq!(
        session.symbols[i].ty.as_ref().unwrap().literal_kind(),
        Some(LiteralKind::I32)
    );
}

#[test]
fn range_on_the_i32_boundary_widens_to_i64() {
    let session = analyze_clean("func f() { for i in 0..2147483648 { } }");

    let namespace = session.symbols.local(session.symbols.universe(), "main").unwrap();
    let f = session.symbols.local(namespace, "f").unwrap();
    let block = session.symbols.local(f, "@block0").unwrap();
    let i = session.symbols.local(block, "i").unwrap();
    assert_eq!(
        session.symbols[i].ty.as_ref().unwrap().literal_kind(),
        Some(LiteralKind::I64)
    );
}

#[test]
fn sibling_blocks_permit_shadowing_names() {
    analyze_clean("func f() { if true { let x = 1; } if true { let x = 2; } }");
}

#[test]
fn duplicate_locals_are_rejected() {
    let diagnostics = diagnostics_of("func f() { let x = 1; let x = 2; }");
    assert!(diagnostics.contains("already defined"));
}

#[test]
fn enum_variants_are_scoped_members() {
    let session = analyze_clean(
        "enum Color { Red, Green }\n\
         func f() { let c = Color::Red; }",
    );

    let namespace = session.symbols.local(session.symbols.universe(), "main").unwrap();
    let color = session.symbols.local(namespace, "Color").unwrap();
    assert_eq!(session.symbols[color].kind, SymbolKind::Enum);

    let f = session.symbols.local(namespace, "f").unwrap();
    let c = session.symbols.local(f, "c").unwrap();
    assert_eq!(
        session.symbols[c].ty.as_ref().unwrap().bare,
        BareTy::Object(color)
    );
}

#[test]
fn struct_field_member_access() {
    let session = analyze_clean(
        "struct Point { x: i64; y: i64 }\n\
         func f(p: Point) -> i64 { return p.x; }",
    );

    let namespace = session.symbols.local(session.symbols.universe(), "main").unwrap();
    let point = session.symbols.local(namespace, "Point").unwrap();
    assert_eq!(session.symbols[point].children.len(), 2);
}

#[test]
fn calling_a_non_function_is_an_error() {
    let diagnostics = diagnostics_of("let x: i64 = 1; func f() { x(); }");
    assert!(diagnostics.contains("is not a function"));
}

#[test]
fn arity_checking() {
    let diagnostics = diagnostics_of(
        "func g(a: i64) -> void {}\n\
         func f() { g(1, 2); }",
    );
    assert!(diagnostics.contains("expects 1 argument"));

    // a trailing variadic parameter accepts extras of its type
    analyze_clean(
        "func sum(...values: i64) -> void {}\n\
         func f() { sum(1, 2, 3); }",
    );
}

#[test]
fn variadic_extras_match_the_trailing_type() {
    let diagnostics = diagnostics_of(
        "func sum(...values: i64) -> void {}\n\
         func f() { sum(1, \"two\"); }",
    );
    assert!(diagnostics.contains("expected \u{2018}i64\u{2019}"));
}

#[test]
fn binary_coercion_and_comparison_types() {
    let session = analyze_clean(
        "func f(a: i64) -> void {\n\
             let b = a + 1;\n\
             let c = 1 < 2;\n\
         }",
    );

    let namespace = session.symbols.local(session.symbols.universe(), "main").unwrap();
    let f = session.symbols.local(namespace, "f").unwrap();
    let b = session.symbols.local(f, "b").unwrap();
    assert_eq!(
        session.symbols[b].ty.as_ref().unwrap().literal_kind(),
        Some(LiteralKind::I64)
    );
    let c = session.symbols.local(f, "c").unwrap();
    assert_eq!(
        session.symbols[c].ty.as_ref().unwrap().literal_kind(),
        Some(LiteralKind::Bool)
    );
}

#[test]
fn incompatible_binary_operands() {
    let diagnostics = diagnostics_of("func f() { let x = 1 + \"s\"; }");
    assert!(diagnostics.contains("incompatible types"));
}

#[test]
fn dereferencing_a_non_pointer_is_an_error() {
    let diagnostics = diagnostics_of("func f(a: i64) -> void { let x = *a; }");
    assert!(diagnostics.contains("cannot dereference"));
}

#[test]
fn reference_types() {
    analyze_clean("func f(a: i64) -> void { let r: i64& = &a; }");
}

#[test]
fn nested_functions_are_rejected() {
    let diagnostics = diagnostics_of("func f() { func g() {} }");
    assert!(diagnostics.contains("nested function definitions"));
}

#[test]
fn analysis_is_idempotent() {
    colored::control::set_override(false);

    let mut session = Session::new(PathBuf::from("/nonexistent"));
    let file = session.map.add_str(FileName::Anonymous, "func f() -> i64 { return 1; }");
    let tokens = lexer::lex(&session.map[file], &session.reporter);
    let program = parser::parse(tokens, "main".into(), &session.reporter);

    let first = analyze(&mut session, program, PathBuf::from("/nonexistent"));
    let count = session.symbols.iter().count();

    let file = session.map.add_str(FileName::Anonymous, "func f() -> i64 { return 1; }");
    let tokens = lexer::lex(&session.map[file], &session.reporter);
    let program = parser::parse(tokens, "main".into(), &session.reporter);
    let second = analyze(&mut session, program, PathBuf::from("/nonexistent"));

    assert_eq!(first, second);
    assert_eq!(session.symbols.iter().count(), count);
    assert_eq!(session.reporter.count(), 0);
}

// ===== module loading =====

struct TestProject {
    root: PathBuf,
}

impl TestProject {
    fn new(name: &str, files: &[(&str, &str)]) -> Self {
        let root = std::env::temp_dir().join(format!(
            "sonic-test-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&root);

        for (path, content) in files {
            let path = root.join(path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }

        Self { root }
    }

    fn compile(&self) -> (Session, super::Analysis) {
        colored::control::set_override(false);

        let entry = self.root.join("src/main.sn");
        let mut session = Session::new(entry.parent().unwrap().to_path_buf());
        let analysis = analyze_entry(&mut session, &entry);

        (session, analysis)
    }
}

impl Drop for TestProject {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

#[test]
fn module_alias_resolution() {
    let project = TestProject::new(
        "alias",
        &[
            (
                "src/main.sn",
                "import utils use { * };\nfunc main() { add(1, 2); }",
            ),
            (
                "src/utils.sn",
                "public func add(a: i64, b: i64) -> i64 { return a + b; }",
            ),
        ],
    );

    let (session, analysis) = project.compile();
    let diagnostics = session.reporter.render_to_string(Some(&session.map));
    assert_eq!(diagnostics, "");
    assert!(!analysis.errors);
    assert_eq!(analysis.programs.len(), 2);

    // the alias is transparent: the call site resolves to `utils::add`
    let universe = session.symbols.universe();
    let main_module = session.symbols.local(universe, "main").unwrap();
    let utils = session.symbols.local(universe, "utils").unwrap();
    let add = session.symbols.local(utils, "add").unwrap();

    let alias = session.symbols.local(main_module, "add").unwrap();
    assert_eq!(session.symbols[alias].kind, SymbolKind::Alias);
    assert_eq!(session.symbols.resolve_alias(alias), add);

    let program = analysis
        .programs
        .iter()
        .find(|program| program.name == "main")
        .unwrap();
    let BareStatement::Function(main) = &program.statements[1].bare else {
        panic!();
    };
    let BareStatement::Expression(expression) = &main.body.as_ref().unwrap()[0].bare else {
        panic!();
    };
    let ast::BareExpression::Call(call) = &expression.bare else {
        panic!();
    };
    assert_eq!(call.callee.symbol, Some(add));
    assert_eq!(
        expression.ty.as_ref().unwrap().literal_kind(),
        Some(LiteralKind::I64)
    );
}

#[test]
fn importing_a_private_symbol_is_an_error() {
    let project = TestProject::new(
        "private",
        &[
            (
                "src/main.sn",
                "import utils use { add };\nfunc main() { }",
            ),
            (
                "src/utils.sn",
                "func add(a: i64, b: i64) -> i64 { return a + b; }",
            ),
        ],
    );

    let (session, analysis) = project.compile();
    assert!(analysis.errors);
    let diagnostics = session.reporter.render_to_string(Some(&session.map));
    assert!(diagnostics.contains("symbol \u{2018}add\u{2019} is not public"));
}

#[test]
fn missing_module_is_an_error() {
    let project = TestProject::new(
        "missing",
        &[("src/main.sn", "import nowhere use { x };\nfunc main() { }")],
    );

    let (session, analysis) = project.compile();
    assert!(analysis.errors);
    let diagnostics = session.reporter.render_to_string(Some(&session.map));
    assert!(diagnostics.contains("module \u{2018}nowhere\u{2019} not found"));
}

#[test]
fn import_cycles_terminate() {
    let project = TestProject::new(
        "cycle",
        &[
            (
                "src/main.sn",
                "import a use { * };\nfunc main() { ping(); }",
            ),
            ("src/a.sn", "import b use { * };\npublic func ping() -> void {}"),
            ("src/b.sn", "import a use { * };\npublic func pong() -> void {}"),
        ],
    );

    let (session, analysis) = project.compile();
    let diagnostics = session.reporter.render_to_string(Some(&session.map));
    assert_eq!(diagnostics, "");
    assert!(!analysis.errors);
    assert_eq!(analysis.programs.len(), 3);
}

#[test]
fn import_aliases_can_be_renamed() {
    let project = TestProject::new(
        "rename",
        &[
            (
                "src/main.sn",
                "import utils use { add as plus };\nfunc main() { plus(1, 2); }",
            ),
            (
                "src/utils.sn",
                "public func add(a: i64, b: i64) -> i64 { return a + b; }",
            ),
        ],
    );

    let (session, analysis) = project.compile();
    let diagnostics = session.reporter.render_to_string(Some(&session.map));
    assert_eq!(diagnostics, "");
    assert!(!analysis.errors);

    let universe = session.symbols.universe();
    let main_module = session.symbols.local(universe, "main").unwrap();
    assert!(session.symbols.local(main_module, "plus").is_some());
    assert!(session.symbols.local(main_module, "add").is_none());
}

#[test]
fn directory_imports_become_nested_namespaces() {
    let project = TestProject::new(
        "directory",
        &[
            (
                "src/main.sn",
                "import lib use { * };\nfunc main() { }",
            ),
            ("src/lib/math.sn", "public func square(x: i64) -> i64 { return x * x; }"),
            ("src/lib/text.sn", "public func empty() -> str { return \"\"; }"),
        ],
    );

    let (session, analysis) = project.compile();
    let diagnostics = session.reporter.render_to_string(Some(&session.map));
    assert_eq!(diagnostics, "");
    assert!(!analysis.errors);

    let universe = session.symbols.universe();
    let lib = session.symbols.local(universe, "lib").unwrap();
    assert_eq!(session.symbols[lib].kind, SymbolKind::Namespace);

    let math = session.symbols.local(lib, "math").unwrap();
    assert!(session.symbols.local(math, "square").is_some());
    let text = session.symbols.local(lib, "text").unwrap();
    assert!(session.symbols.local(text, "empty").is_some());
}
