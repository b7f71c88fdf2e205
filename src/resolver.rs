//! The semantic analyzer.
//!
//! Analysis runs three passes per program: an *eager declaration pass* over
//! the top level (types first, then functions and variables so signatures
//! can refer to types declared later in the file), an *import pass* that
//! resolves and recursively loads modules, interleaved with the *body pass*
//! which resolves names and type-checks every statement and expression,
//! decorating the AST in place. Diagnostics are reported to the shared
//! reporter; the analyzer never unwinds.

use crate::{
    ast::{self, LiteralKind, Mutability},
    diagnostics::{Diagnostic, ErrorKind, Reporter},
    lexer, package, parser,
    span::{SourceMap, Span},
    HashMap, FILE_EXTENSION,
};
use scope::{namespace_mangled_name, Symbol, SymbolIndex, SymbolKind, SymbolTable};
use std::path::{Path, PathBuf};
use ty::{BareTy, Ty};

pub mod scope;
#[cfg(test)]
mod test;
pub mod ty;

/// The shared state of a compilation run.
pub struct Session {
    pub map: SourceMap,
    pub symbols: SymbolTable,
    pub reporter: Reporter,
    /// The directory of the main source file.
    pub project_root: PathBuf,
    /// Every analyzed program, root first, then transitively loaded modules
    /// in load order.
    pub programs: Vec<ast::Program>,
    /// The recursion guard of the module loader, keyed by project-relative
    /// module name.
    loaded: HashMap<String, SymbolIndex>,
}

impl Session {
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            map: SourceMap::default(),
            symbols: SymbolTable::new(),
            reporter: Reporter::new(),
            project_root,
            programs: Vec::new(),
            loaded: HashMap::default(),
        }
    }

    /// The module name of a source path: the path relative to the project
    /// root with the extension stripped and separators normalized to `/`.
    pub fn module_name(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.project_root).unwrap_or(path);
        let relative = relative.with_extension("");
        relative.to_string_lossy().replace('\\', "/")
    }
}

/// The handoff to the downstream code generator.
pub struct Analysis {
    /// The root universe symbol owning all namespace symbols.
    pub universe: SymbolIndex,
    /// The analyzed programs, entry first.
    pub programs: Vec<ast::Program>,
    /// Whether diagnostics contained any errors.
    pub errors: bool,
}

/// Load, parse and analyze the entry file together with everything it
/// transitively imports.
pub fn analyze_entry(session: &mut Session, path: &Path) -> Analysis {
    let file = match session.map.load(path) {
        Ok(file) => file,
        Err(error) => {
            Diagnostic::error(ErrorKind::Unknown)
                .message(format!(
                    "could not read \u{2018}{}\u{2019}: {error}",
                    path.display()
                ))
                .report(&session.reporter);
            return Analysis {
                universe: session.symbols.universe(),
                programs: Vec::new(),
                errors: true,
            };
        }
    };

    let tokens = lexer::lex(&session.map[file], &session.reporter);
    let name = session.module_name(path);
    let program = parser::parse(tokens, name, &session.reporter);
    let directory = path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    analyze(session, program, directory);

    Analysis {
        universe: session.symbols.universe(),
        programs: std::mem::take(&mut session.programs),
        errors: session.reporter.has_errors(),
    }
}

/// Analyze one program under the shared universe.
///
/// Re-analysis of an already loaded module is skipped, which both makes the
/// operation idempotent and guards the module loader against import cycles:
/// a namespace is registered before its body is analyzed, so a cycle that
/// resolves back to it sees its eagerly declared names.
pub fn analyze(session: &mut Session, program: ast::Program, directory: PathBuf) -> SymbolIndex {
    let universe = session.symbols.universe();
    analyze_under(session, program, directory, universe, None)
}

fn analyze_under(
    session: &mut Session,
    mut program: ast::Program,
    directory: PathBuf,
    parent: SymbolIndex,
    binder: Option<String>,
) -> SymbolIndex {
    if let Some(&existing) = session.loaded.get(&program.name) {
        return existing;
    }

    let binder = binder.unwrap_or_else(|| program.name.clone());
    let mut symbol = Symbol::new(SymbolKind::Namespace, binder, Span::default());
    symbol.mangled_name = namespace_mangled_name(&program.name);

    let namespace = match session.symbols.declare(parent, symbol) {
        Ok(namespace) => namespace,
        Err(existing) => existing,
    };
    session.loaded.insert(program.name.clone(), namespace);

    let mut analyzer = Analyzer {
        session,
        scope: namespace,
        directory,
        block_counter: 0,
    };
    analyzer.declare_statements(&mut program.statements);
    analyzer.analyze_statements(&mut program.statements);

    session.programs.push(program);
    namespace
}

/// The per-program state of the semantic analyzer.
struct Analyzer<'a> {
    session: &'a mut Session,
    /// The cursor into the symbol graph: the scope declarations go into and
    /// lookups start from.
    scope: SymbolIndex,
    /// The directory of the file under analysis, the anchor of module
    /// resolution.
    directory: PathBuf,
    block_counter: u32,
}

impl Analyzer<'_> {
    fn reporter(&self) -> &Reporter {
        &self.session.reporter
    }

    // ===== eager declaration pass =====

    /// Declare one symbol per top-level statement.
    ///
    /// Structs and enums are declared before functions and variables so
    /// that signatures can refer to types declared later in the file.
    /// Type references in signatures are pre-resolved quietly here; the
    /// body pass re-resolves them loudly once imports are in scope.
    fn declare_statements(&mut self, statements: &mut [ast::Statement]) {
        for statement in statements.iter_mut() {
            match &mut statement.bare {
                ast::BareStatement::Struct(struct_) => {
                    self.declare_struct(struct_, statement.span);
                }
                ast::BareStatement::Enum(enum_) => {
                    self.declare_enum(enum_, statement.span);
                }
                _ => {}
            }
        }

        for statement in statements.iter_mut() {
            match &mut statement.bare {
                ast::BareStatement::Function(function) => {
                    self.declare_function(function, statement.span);
                }
                ast::BareStatement::Variable(variable) => {
                    self.declare_variable(variable, statement.span);
                }
                _ => {}
            }
        }
    }

    fn declare_function(&mut self, function: &mut ast::Function, span: Span) {
        let name = function.binder.bare.clone();

        if let Some(existing) = self.session.symbols.local(self.scope, &name) {
            let existing_kind = self.session.symbols[existing].kind;
            let existing_declared = self.session.symbols[existing].declared;

            // a forward declaration may be completed by a definition,
            // everything else is a duplicate
            if existing_kind == SymbolKind::Function
                && existing_declared
                && !function.is_declaration()
            {
                self.session.symbols[existing].declared = false;
                return;
            }

            let state = if existing_declared {
                "declared"
            } else {
                "defined"
            };
            Diagnostic::error(ErrorKind::Semantic)
                .message(format!(
                    "function \u{2018}{name}\u{2019} is already {state}"
                ))
                .span(function.binder.span)
                .report(self.reporter());
            return;
        }

        let mut symbol = Symbol::new(SymbolKind::Function, name.clone(), span);
        symbol.mangled_name = if function.extern_ {
            name.clone()
        } else {
            self.session.symbols.mangle(self.scope, &name)
        };
        symbol.public = function.public;
        symbol.extern_ = function.extern_;
        symbol.async_ = function.async_;
        symbol.declared = function.is_declaration();
        symbol.variadic = function.is_variadic();
        symbol.return_ty = Some(match &mut function.return_ty {
            Some(ty) => self.resolve_type(ty, true),
            None => Ty::void(),
        });

        let Ok(index) = self.session.symbols.declare(self.scope, symbol) else {
            return;
        };

        let mut parameter_tys = Vec::new();
        for parameter in &mut function.parameters {
            let ty = self.resolve_type(&mut parameter.ty, true);
            parameter_tys.push(ty.clone());

            let mut symbol =
                Symbol::new(SymbolKind::Parameter, parameter.binder.bare.clone(), parameter.span);
            symbol.mangled_name = self
                .session
                .symbols
                .mangle(index, &parameter.binder.bare);
            symbol.ty = Some(ty);
            symbol.variadic = parameter.variadic;

            if self.session.symbols.declare(index, symbol).is_err() {
                Diagnostic::error(ErrorKind::Semantic)
                    .message(format!(
                        "parameter \u{2018}{}\u{2019} is already defined",
                        parameter.binder.bare
                    ))
                    .span(parameter.binder.span)
                    .report(self.reporter());
            }
        }
        self.session.symbols[index].parameter_tys = parameter_tys;
    }

    fn declare_variable(&mut self, variable: &mut ast::Variable, span: Span) {
        let name = variable.binder.bare.clone();

        if let Some(existing) = self.session.symbols.local(self.scope, &name) {
            let state = if self.session.symbols[existing].declared {
                "declared"
            } else {
                "defined"
            };
            Diagnostic::error(ErrorKind::Semantic)
                .message(format!(
                    "variable \u{2018}{name}\u{2019} is already {state}"
                ))
                .span(variable.binder.span)
                .report(self.reporter());
            return;
        }

        let mut symbol = Symbol::new(SymbolKind::Variable, name.clone(), span);
        symbol.mangled_name = if variable.extern_ {
            name.clone()
        } else {
            self.session.symbols.mangle(self.scope, &name)
        };
        symbol.mutability = variable.mutability;
        symbol.public = variable.public;
        symbol.extern_ = variable.extern_;
        symbol.declared = variable.is_declaration();
        symbol.ty = variable.ty.as_mut().map(|ty| self.resolve_type(ty, true));

        let _ = self.session.symbols.declare(self.scope, symbol);
    }

    fn declare_struct(&mut self, struct_: &mut ast::Struct, span: Span) {
        let name = struct_.binder.bare.clone();

        let mut symbol = Symbol::new(SymbolKind::Struct, name.clone(), span);
        symbol.mangled_name = self.session.symbols.mangle(self.scope, &name);
        symbol.public = struct_.public;
        symbol.extern_ = struct_.extern_;

        match self.session.symbols.declare(self.scope, symbol) {
            Ok(index) => {
                for field in &mut struct_.fields {
                    let ty = self.resolve_type(&mut field.ty, true);

                    let mut symbol =
                        Symbol::new(SymbolKind::Variable, field.binder.bare.clone(), field.span);
                    symbol.mangled_name =
                        self.session.symbols.mangle(index, &field.binder.bare);
                    symbol.ty = Some(ty);

                    if self.session.symbols.declare(index, symbol).is_err() {
                        Diagnostic::error(ErrorKind::Semantic)
                            .message(format!(
                                "field \u{2018}{}\u{2019} is already defined",
                                field.binder.bare
                            ))
                            .span(field.binder.span)
                            .report(self.reporter());
                    }
                }
            }
            Err(_) => {
                Diagnostic::error(ErrorKind::Semantic)
                    .message(format!("\u{2018}{name}\u{2019} is already defined"))
                    .span(struct_.binder.span)
                    .report(self.reporter());
            }
        }
    }

    fn declare_enum(&mut self, enum_: &mut ast::Enum, span: Span) {
        let name = enum_.binder.bare.clone();

        let mut symbol = Symbol::new(SymbolKind::Enum, name.clone(), span);
        symbol.mangled_name = self.session.symbols.mangle(self.scope, &name);
        symbol.public = enum_.public;
        symbol.extern_ = enum_.extern_;

        match self.session.symbols.declare(self.scope, symbol) {
            Ok(index) => {
                for variant in &enum_.variants {
                    let mut symbol = Symbol::new(
                        SymbolKind::Variable,
                        variant.binder.bare.clone(),
                        variant.span,
                    );
                    symbol.mangled_name =
                        self.session.symbols.mangle(index, &variant.binder.bare);
                    symbol.ty = Some(Ty::object(index));

                    if self.session.symbols.declare(index, symbol).is_err() {
                        Diagnostic::error(ErrorKind::Semantic)
                            .message(format!(
                                "variant \u{2018}{}\u{2019} is already defined",
                                variant.binder.bare
                            ))
                            .span(variant.binder.span)
                            .report(self.reporter());
                    }
                }
            }
            Err(_) => {
                Diagnostic::error(ErrorKind::Semantic)
                    .message(format!("\u{2018}{name}\u{2019} is already defined"))
                    .span(enum_.binder.span)
                    .report(self.reporter());
            }
        }
    }

    // ===== import + body pass =====

    fn analyze_statements(&mut self, statements: &mut [ast::Statement]) {
        for statement in statements {
            self.analyze_statement(statement);
        }
    }

    fn analyze_statement(&mut self, statement: &mut ast::Statement) {
        let span = statement.span;

        match &mut statement.bare {
            ast::BareStatement::Import(import) => {
                statement.symbol = self.analyze_import(import, span);
            }
            ast::BareStatement::Function(function) => {
                statement.symbol = self.analyze_function(function, span);
            }
            ast::BareStatement::Variable(variable) => {
                statement.symbol = self.analyze_variable(variable, span);
            }
            ast::BareStatement::Struct(struct_) => {
                statement.symbol = self.analyze_struct(struct_);
            }
            ast::BareStatement::Enum(enum_) => {
                statement.symbol = self.analyze_enum(enum_);
            }
            ast::BareStatement::Assignment(assignment) => self.analyze_assignment(assignment),
            ast::BareStatement::Expression(expression) => self.analyze_expression(expression),
            ast::BareStatement::If(if_) => {
                self.check_condition(&mut if_.condition);
                self.analyze_block(&mut if_.then);
                if let Some(else_) = &mut if_.else_ {
                    self.analyze_block(else_);
                }
            }
            ast::BareStatement::While(while_) => {
                self.check_condition(&mut while_.condition);
                self.analyze_block(&mut while_.body);
            }
            ast::BareStatement::For(for_) => {
                statement.symbol = self.analyze_for(for_);
            }
            ast::BareStatement::TryCatch(try_catch) => {
                self.analyze_block(&mut try_catch.try_);

                if try_catch.catch.is_some() || try_catch.finally.is_some() {
                    Diagnostic::warning(ErrorKind::Unimplemented)
                        .message(
                            "\u{2018}catch\u{2019} and \u{2018}finally\u{2019} \
                             blocks are not checked yet",
                        )
                        .span(span)
                        .report(self.reporter());
                }
            }
            ast::BareStatement::Return(return_) => self.analyze_return(return_, span),
            ast::BareStatement::Break
            | ast::BareStatement::Continue
            | ast::BareStatement::Malformed => {}
        }
    }

    fn analyze_function(&mut self, function: &mut ast::Function, span: Span) -> Option<SymbolIndex> {
        if self.enclosing_function().is_some() {
            Diagnostic::error(ErrorKind::Semantic)
                .message("nested function definitions are not allowed")
                .span(span)
                .report(self.reporter());
            return None;
        }

        let index = self
            .session
            .symbols
            .local(self.scope, &function.binder.bare)?;

        // the eager pass resolved the signature quietly; now that imports
        // are in scope, re-resolve it loudly
        let mut parameter_tys = Vec::new();
        for parameter in &mut function.parameters {
            let ty = self.resolve_type(&mut parameter.ty, false);
            parameter_tys.push(ty.clone());

            if let Some(child) = self.session.symbols.local(index, &parameter.binder.bare) {
                self.session.symbols[child].ty = Some(ty);
            }
        }
        let return_ty = match &mut function.return_ty {
            Some(ty) => self.resolve_type(ty, false),
            None => Ty::void(),
        };

        let symbol = &mut self.session.symbols[index];
        symbol.parameter_tys = parameter_tys;
        symbol.return_ty = Some(return_ty);

        if let Some(body) = &mut function.body {
            let enclosing = std::mem::replace(&mut self.scope, index);
            self.analyze_statements(body);
            self.scope = enclosing;
        }

        Some(index)
    }

    fn analyze_variable(&mut self, variable: &mut ast::Variable, span: Span) -> Option<SymbolIndex> {
        // outside of functions, the symbol already exists from the eager
        // declaration pass and only needs its checks and final type
        if self.enclosing_function().is_none() {
            if let Some(index) = self
                .session
                .symbols
                .local(self.scope, &variable.binder.bare)
            {
                let ty = self.check_variable(variable);
                self.session.symbols[index].ty = Some(ty);
                return Some(index);
            }
        }

        let name = variable.binder.bare.clone();

        if let Some(existing) = self.session.symbols.local(self.scope, &name) {
            let state = if self.session.symbols[existing].declared {
                "declared"
            } else {
                "defined"
            };
            Diagnostic::error(ErrorKind::Semantic)
                .message(format!(
                    "variable \u{2018}{name}\u{2019} is already {state}"
                ))
                .span(variable.binder.span)
                .report(self.reporter());
            return None;
        }

        let ty = self.check_variable(variable);

        let mut symbol = Symbol::new(SymbolKind::Variable, name.clone(), span);
        symbol.mangled_name = self.session.symbols.mangle(self.scope, &name);
        symbol.mutability = variable.mutability;
        symbol.declared = variable.is_declaration();
        symbol.ty = Some(ty);

        self.session.symbols.declare(self.scope, symbol).ok()
    }

    /// Check a variable declaration and compute the type of its symbol.
    fn check_variable(&mut self, variable: &mut ast::Variable) -> Ty {
        let name = variable.binder.bare.clone();

        let annotation = variable
            .ty
            .as_mut()
            .map(|ty| self.resolve_type(ty, false));

        if let Some(annotation) = &annotation {
            if annotation.is_void() {
                Diagnostic::error(ErrorKind::Semantic)
                    .message(format!(
                        "variable \u{2018}{name}\u{2019} cannot have type \u{2018}void\u{2019}"
                    ))
                    .span(variable.binder.span)
                    .report(self.reporter());
            }

            if variable.mutability == Mutability::Constant && annotation.nullable {
                Diagnostic::error(ErrorKind::Semantic)
                    .message(format!(
                        "constant variable \u{2018}{name}\u{2019} cannot be nullable"
                    ))
                    .span(variable.binder.span)
                    .report(self.reporter());
            }
        }

        match &mut variable.value {
            Some(value) => {
                self.analyze_expression(value);

                if value.ty.as_ref().is_some_and(Ty::is_none) {
                    let message = if variable.mutability == Mutability::Constant {
                        format!(
                            "constant variable \u{2018}{name}\u{2019} \
                             cannot be initialized with \u{2018}none\u{2019}"
                        )
                    } else {
                        format!(
                            "cannot initialize non-nullable variable \
                             \u{2018}{name}\u{2019} with \u{2018}none\u{2019}"
                        )
                    };

                    if annotation.as_ref().map_or(true, |annotation| {
                        !annotation.nullable || variable.mutability == Mutability::Constant
                    }) {
                        Diagnostic::error(ErrorKind::Semantic)
                            .message(message)
                            .span(value.span)
                            .report(self.reporter());
                    }

                    return annotation.unwrap_or_else(Ty::any);
                }

                match annotation {
                    Some(annotation) => {
                        self.check_assignable(&annotation, value, true);
                        annotation
                    }
                    None => self.default_promotion(value),
                }
            }
            None => {
                if annotation.is_none() {
                    Diagnostic::error(ErrorKind::Semantic)
                        .message(format!(
                            "variable declaration \u{2018}{name}\u{2019} \
                             requires a type annotation"
                        ))
                        .span(variable.binder.span)
                        .report(self.reporter());
                }

                annotation.unwrap_or_else(Ty::any)
            }
        }
    }

    fn analyze_assignment(&mut self, assignment: &mut ast::Assignment) {
        self.analyze_expression(&mut assignment.target);
        self.analyze_expression(&mut assignment.value);

        if let Some(index) = assignment.target.symbol {
            let symbol = &self.session.symbols[index];

            match symbol.kind {
                SymbolKind::Variable | SymbolKind::Parameter => match symbol.mutability {
                    Mutability::Constant => {
                        Diagnostic::error(ErrorKind::Semantic)
                            .message(format!(
                                "cannot assign to constant \u{2018}{}\u{2019}",
                                symbol.name
                            ))
                            .span(assignment.target.span)
                            .report(self.reporter());
                    }
                    Mutability::Static if self.enclosing_function().is_some() => {
                        Diagnostic::error(ErrorKind::Semantic)
                            .message(format!(
                                "cannot assign to static \u{2018}{}\u{2019} \
                                 from a local scope",
                                symbol.name
                            ))
                            .span(assignment.target.span)
                            .report(self.reporter());
                    }
                    _ => {}
                },
                kind => {
                    Diagnostic::error(ErrorKind::Semantic)
                        .message(format!(
                            "cannot assign to {kind} \u{2018}{}\u{2019}",
                            symbol.name
                        ))
                        .span(assignment.target.span)
                        .report(self.reporter());
                }
            }
        }

        if let Some(target_ty) = assignment.target.ty.clone() {
            self.check_assignable(&target_ty, &mut assignment.value, false);
        }
    }

    fn analyze_for(&mut self, for_: &mut ast::For) -> Option<SymbolIndex> {
        self.analyze_expression(&mut for_.iterator);

        let element = match &mut for_.iterator.bare {
            ast::BareExpression::Range(range) => self.range_element_ty(range),
            _ => {
                Diagnostic::warning(ErrorKind::Unimplemented)
                    .message("only range iterators are supported in for loops")
                    .span(for_.iterator.span)
                    .report(self.reporter());
                None
            }
        };

        let block = self.enter_block();

        let mut symbol = Symbol::new(
            SymbolKind::Variable,
            for_.binder.bare.clone(),
            for_.binder.span,
        );
        symbol.mangled_name = self.session.symbols.mangle(block, &for_.binder.bare);
        symbol.ty = Some(element.unwrap_or_else(Ty::any));
        let index = self.session.symbols.declare(block, symbol).ok();

        self.analyze_statements(&mut for_.body);
        self.exit_block(block);

        index
    }

    fn analyze_return(&mut self, return_: &mut ast::Return, span: Span) {
        let Some(function) = self.enclosing_function() else {
            Diagnostic::error(ErrorKind::Semantic)
                .message("return statement outside of a function")
                .span(span)
                .report(self.reporter());

            if let Some(value) = &mut return_.value {
                self.analyze_expression(value);
            }
            return;
        };

        let return_ty = self.session.symbols[function]
            .return_ty
            .clone()
            .unwrap_or_else(Ty::void);

        match &mut return_.value {
            Some(value) => {
                self.analyze_expression(value);

                if return_ty.is_void() {
                    Diagnostic::error(ErrorKind::Semantic)
                        .message("unexpected return value")
                        .span(value.span)
                        .note("the enclosing function returns \u{2018}void\u{2019}")
                        .report(self.reporter());
                } else {
                    self.check_assignable(&return_ty, value, false);
                }
            }
            None => {
                if !return_ty.is_void() {
                    Diagnostic::error(ErrorKind::Semantic)
                        .message("missing return value")
                        .span(span)
                        .note(format!(
                            "the enclosing function returns \u{2018}{}\u{2019}",
                            return_ty.name(&self.session.symbols)
                        ))
                        .report(self.reporter());
                }
            }
        }
    }

    fn analyze_struct(&mut self, struct_: &mut ast::Struct) -> Option<SymbolIndex> {
        let index = self
            .session
            .symbols
            .local(self.scope, &struct_.binder.bare)?;

        for field in &mut struct_.fields {
            let ty = self.resolve_type(&mut field.ty, false);
            if let Some(child) = self.session.symbols.local(index, &field.binder.bare) {
                self.session.symbols[child].ty = Some(ty);
            }
        }

        Some(index)
    }

    fn analyze_enum(&mut self, enum_: &mut ast::Enum) -> Option<SymbolIndex> {
        let index = self.session.symbols.local(self.scope, &enum_.binder.bare)?;

        for variant in &mut enum_.variants {
            if let Some(value) = &mut variant.value {
                self.analyze_expression(value);

                if value.ty.as_ref().is_some_and(|ty| !ty.is_integer()) {
                    Diagnostic::error(ErrorKind::Semantic)
                        .message(format!(
                            "enum variant \u{2018}{}\u{2019} must have an integer value",
                            variant.binder.bare
                        ))
                        .span(value.span)
                        .report(self.reporter());
                }
            }
        }

        Some(index)
    }

    fn check_condition(&mut self, condition: &mut ast::Expression) {
        self.analyze_expression(condition);

        let Some(ty) = &condition.ty else { return };

        // a nullable condition is shorthand for a non-null test
        if !ty.is_bool() && !ty.nullable && !matches!(ty.bare, BareTy::Any) {
            Diagnostic::error(ErrorKind::Semantic)
                .message(format!(
                    "condition must be of type \u{2018}bool\u{2019}, but got \u{2018}{}\u{2019}",
                    ty.name(&self.session.symbols)
                ))
                .span(condition.span)
                .report(self.reporter());
        }
    }

    /// Analyze the statements of a block inside a fresh block scope.
    fn analyze_block(&mut self, statements: &mut [ast::Statement]) {
        let block = self.enter_block();
        self.analyze_statements(statements);
        self.exit_block(block);
    }

    /// Enter a synthetic block scope.
    ///
    /// Block scopes are namespace-kind symbols with unique `@block<n>`
    /// names so that sibling uniqueness holds.
    fn enter_block(&mut self) -> SymbolIndex {
        let name = format!("@block{}", self.block_counter);
        self.block_counter += 1;

        let mut symbol = Symbol::new(SymbolKind::Namespace, &*name, Span::default());
        symbol.mangled_name = self.session.symbols.mangle(self.scope, &name);

        let block = match self.session.symbols.declare(self.scope, symbol) {
            Ok(block) => block,
            Err(existing) => existing,
        };
        self.scope = block;
        block
    }

    fn exit_block(&mut self, block: SymbolIndex) {
        if let Some(parent) = self.session.symbols[block].parent {
            self.scope = parent;
        }
    }

    /// The function symbol the current scope is nested in, if any.
    fn enclosing_function(&self) -> Option<SymbolIndex> {
        let mut current = Some(self.scope);

        while let Some(scope) = current {
            if self.session.symbols[scope].kind == SymbolKind::Function {
                return Some(scope);
            }
            current = self.session.symbols[scope].parent;
        }

        None
    }

    // ===== module resolution =====

    /// Resolve an import statement: locate the module, load and analyze it
    /// and alias the requested public symbols into the current scope.
    fn analyze_import(&mut self, import: &mut ast::Import, span: Span) -> Option<SymbolIndex> {
        let relative: PathBuf = import
            .segments
            .iter()
            .map(|segment| segment.bare.as_str())
            .collect();
        let display: Vec<_> = import
            .segments
            .iter()
            .map(|segment| segment.bare.as_str())
            .collect();
        let display = display.join("::");

        let Some(candidate) = self.locate_module(&relative) else {
            Diagnostic::error(ErrorKind::Semantic)
                .message(format!("module \u{2018}{display}\u{2019} not found"))
                .span(span)
                .note(format!(
                    "searched next to the current file, in the project \
                     ancestors and in \u{2018}{}\u{2019}",
                    package::library_root().display()
                ))
                .report(self.reporter());
            return None;
        };

        let namespace = match candidate {
            Candidate::File(path) => self.load_module_file(&path)?,
            Candidate::Directory(path) => self.load_module_directory(&path)?,
        };

        if import.all {
            // aliases the module itself imported are not re-exported
            for child in self.session.symbols[namespace].children.clone() {
                let symbol = &self.session.symbols[child];

                if !matches!(
                    symbol.kind,
                    SymbolKind::Function
                        | SymbolKind::Struct
                        | SymbolKind::Enum
                        | SymbolKind::Variable
                ) || !symbol.public
                {
                    continue;
                }

                let name = symbol.name.clone();
                self.declare_alias(name, child, span);
            }
        }

        for item in &import.items {
            let Some(found) = self
                .session
                .symbols
                .local(namespace, &item.binder.bare)
            else {
                Diagnostic::error(ErrorKind::Semantic)
                    .message(format!(
                        "module \u{2018}{display}\u{2019} has no member \
                         \u{2018}{}\u{2019}",
                        item.binder.bare
                    ))
                    .span(item.span)
                    .report(self.reporter());
                continue;
            };

            let target = self.session.symbols.resolve_alias(found);
            let symbol = &self.session.symbols[target];

            if !symbol.public {
                Diagnostic::error(ErrorKind::Semantic)
                    .message(format!(
                        "symbol \u{2018}{}\u{2019} is not public",
                        symbol.name
                    ))
                    .span(item.span)
                    .hint(format!(
                        "add \u{2018}public\u{2019} to the declaration of \
                         \u{2018}{}\u{2019}",
                        symbol.name
                    ))
                    .report(self.reporter());
                continue;
            }

            let name = item
                .alias
                .as_ref()
                .unwrap_or(&item.binder)
                .bare
                .clone();
            self.declare_alias(name, target, item.span);
        }

        Some(namespace)
    }

    fn declare_alias(&mut self, name: String, target: SymbolIndex, span: Span) {
        let mut alias = Symbol::new(SymbolKind::Alias, name.clone(), span);
        alias.target = Some(target);

        if self.session.symbols.declare(self.scope, alias).is_err() {
            Diagnostic::error(ErrorKind::Semantic)
                .message(format!("\u{2018}{name}\u{2019} is already defined"))
                .span(span)
                .report(self.reporter());
        }
    }

    /// Search for a module, in order: next to the current file, in each of
    /// its ancestor directories up to the filesystem root, and in the
    /// platform library root. The first base that holds the module as a
    /// `.sn` file or as a directory wins.
    fn locate_module(&self, relative: &Path) -> Option<Candidate> {
        let bases = self
            .directory
            .ancestors()
            .map(Path::to_path_buf)
            .chain(std::iter::once(package::library_root()));

        for base in bases {
            let file = base.join(relative).with_extension(FILE_EXTENSION);
            if file.is_file() {
                return Some(Candidate::File(file));
            }

            let directory = base.join(relative);
            if directory.is_dir() {
                return Some(Candidate::Directory(directory));
            }
        }

        None
    }

    fn load_module_file(&mut self, path: &Path) -> Option<SymbolIndex> {
        let name = self.session.module_name(path);

        if let Some(&existing) = self.session.loaded.get(&name) {
            return Some(existing);
        }

        let file = match self.session.map.load(path) {
            Ok(file) => file,
            Err(error) => {
                Diagnostic::error(ErrorKind::Semantic)
                    .message(format!(
                        "could not read module \u{2018}{}\u{2019}: {error}",
                        path.display()
                    ))
                    .report(self.reporter());
                return None;
            }
        };

        let tokens = lexer::lex(&self.session.map[file], &self.session.reporter);
        let program = parser::parse(tokens, name, &self.session.reporter);
        let directory = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        Some(analyze(self.session, program, directory))
    }

    /// Load a directory as a synthetic namespace: one sub-namespace per
    /// `.sn` file and one nested namespace per sub-directory.
    fn load_module_directory(&mut self, path: &Path) -> Option<SymbolIndex> {
        let name = self.session.module_name(path);

        if let Some(&existing) = self.session.loaded.get(&name) {
            return Some(existing);
        }

        let mut symbol = Symbol::new(SymbolKind::Namespace, directory_stem(path), Span::default());
        symbol.mangled_name = namespace_mangled_name(&name);
        symbol.public = true;

        let namespace = match self
            .session
            .symbols
            .declare(self.session.symbols.universe(), symbol)
        {
            Ok(namespace) => namespace,
            Err(existing) => existing,
        };
        self.session.loaded.insert(name, namespace);

        let mut entries: Vec<PathBuf> = match std::fs::read_dir(path) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .collect(),
            Err(error) => {
                Diagnostic::error(ErrorKind::Semantic)
                    .message(format!(
                        "could not read module directory \u{2018}{}\u{2019}: {error}",
                        path.display()
                    ))
                    .report(self.reporter());
                return None;
            }
        };
        entries.sort();

        for entry in entries {
            if entry.is_dir() {
                if let Some(child) = self.load_module_directory(&entry) {
                    self.adopt_namespace(namespace, child);
                }
            } else if entry.extension().and_then(|extension| extension.to_str())
                == Some(FILE_EXTENSION)
            {
                if let Some(child) = self.load_module_submodule(&entry, namespace) {
                    self.adopt_namespace(namespace, child);
                }
            }
        }

        Some(namespace)
    }

    fn load_module_submodule(
        &mut self,
        path: &Path,
        parent: SymbolIndex,
    ) -> Option<SymbolIndex> {
        let name = self.session.module_name(path);

        if let Some(&existing) = self.session.loaded.get(&name) {
            return Some(existing);
        }

        let file = match self.session.map.load(path) {
            Ok(file) => file,
            Err(error) => {
                Diagnostic::error(ErrorKind::Semantic)
                    .message(format!(
                        "could not read module \u{2018}{}\u{2019}: {error}",
                        path.display()
                    ))
                    .report(self.reporter());
                return None;
            }
        };

        let tokens = lexer::lex(&self.session.map[file], &self.session.reporter);
        let program = parser::parse(tokens, name, &self.session.reporter);
        let directory = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let binder = directory_stem(path);

        Some(analyze_under(
            self.session,
            program,
            directory,
            parent,
            Some(binder),
        ))
    }

    /// Re-parent a loaded namespace under a synthetic directory namespace.
    fn adopt_namespace(&mut self, parent: SymbolIndex, child: SymbolIndex) {
        if self.session.symbols[child].parent == Some(parent) {
            return;
        }

        let old_parent = self.session.symbols[child].parent;
        if let Some(old_parent) = old_parent {
            self.session.symbols[old_parent]
                .children
                .retain(|&existing| existing != child);
        }

        self.session.symbols[child].parent = Some(parent);
        if self.session.symbols.local(parent, &self.session.symbols[child].name.clone()).is_none() {
            self.session.symbols[parent].children.push(child);
        }
    }

    // ===== expressions =====

    fn analyze_expression(&mut self, expression: &mut ast::Expression) {
        let span = expression.span;

        match &mut expression.bare {
            ast::BareExpression::NumberLiteral(value) => {
                let kind = if value.contains('.') {
                    LiteralKind::UnkFloat
                } else {
                    LiteralKind::UnkInt
                };
                expression.ty = Some(Ty::literal(kind));
            }
            ast::BareExpression::TextLiteral(_) => {
                expression.ty = Some(Ty::literal(LiteralKind::Str));
            }
            ast::BareExpression::CharacterLiteral(_) => {
                expression.ty = Some(Ty::literal(LiteralKind::Char));
            }
            ast::BareExpression::BooleanLiteral(_) => {
                expression.ty = Some(Ty::literal(LiteralKind::Bool));
            }
            ast::BareExpression::NoneLiteral => {
                expression.ty = Some(Ty::none());
            }
            ast::BareExpression::Variable(binder) => {
                let Some(found) = self.session.symbols.lookup(self.scope, &binder.bare) else {
                    Diagnostic::error(ErrorKind::Semantic)
                        .message(format!(
                            "variable \u{2018}{}\u{2019} is not defined",
                            binder.bare
                        ))
                        .span(span)
                        .report(self.reporter());
                    return;
                };

                let symbol = &self.session.symbols[found];
                match symbol.kind {
                    SymbolKind::Variable | SymbolKind::Parameter => {
                        expression.ty = symbol.ty.clone();
                        expression.symbol = Some(found);
                    }
                    kind => {
                        Diagnostic::error(ErrorKind::Semantic)
                            .message(format!(
                                "{kind} \u{2018}{}\u{2019} is not a variable",
                                binder.bare
                            ))
                            .span(span)
                            .report(self.reporter());
                    }
                }
            }
            ast::BareExpression::Scope(access) => {
                self.analyze_scope_nested(&mut access.nested);

                let Some(nested) = access.nested.symbol else {
                    return;
                };

                let Some(found) = self.session.symbols.local(nested, &access.member.bare) else {
                    Diagnostic::error(ErrorKind::Semantic)
                        .message(format!(
                            "member \u{2018}{}\u{2019} is not defined in \u{2018}{}\u{2019}",
                            access.member.bare, self.session.symbols[nested].name
                        ))
                        .span(access.member.span)
                        .report(self.reporter());
                    return;
                };

                let found = self.session.symbols.resolve_alias(found);
                expression.symbol = Some(found);
                expression.ty = self.session.symbols[found].ty.clone();
            }
            ast::BareExpression::Member(access) => {
                self.analyze_expression(&mut access.nested);

                // a member access on a value of object type looks the name
                // up among the children of the type's symbol
                let target = match &access.nested.ty {
                    Some(Ty {
                        bare: BareTy::Object(index),
                        ..
                    }) => Some(*index),
                    _ => access.nested.symbol,
                };
                let Some(target) = target else { return };

                let Some(found) = self.session.symbols.local(target, &access.member.bare) else {
                    Diagnostic::error(ErrorKind::Semantic)
                        .message(format!(
                            "member \u{2018}{}\u{2019} is not defined in \u{2018}{}\u{2019}",
                            access.member.bare, self.session.symbols[target].name
                        ))
                        .span(access.member.span)
                        .report(self.reporter());
                    return;
                };

                let found = self.session.symbols.resolve_alias(found);
                expression.symbol = Some(found);
                expression.ty = self.session.symbols[found].ty.clone();
            }
            ast::BareExpression::Reference(inner) => {
                self.analyze_expression(inner);
                expression.ty = inner
                    .ty
                    .clone()
                    .map(|inner| Ty::new(BareTy::Reference(Box::new(inner))));
            }
            ast::BareExpression::Dereference(inner) => {
                self.analyze_expression(inner);

                match inner.ty.clone() {
                    Some(Ty {
                        bare: BareTy::Pointer(pointee),
                        ..
                    }) => expression.ty = Some(*pointee),
                    Some(ty) => {
                        Diagnostic::error(ErrorKind::Semantic)
                            .message(format!(
                                "cannot dereference a value of type \u{2018}{}\u{2019}",
                                ty.name(&self.session.symbols)
                            ))
                            .span(span)
                            .report(self.reporter());
                    }
                    None => {}
                }
            }
            ast::BareExpression::Unary(unary) => {
                self.analyze_expression(&mut unary.inner);

                match &unary.inner.ty {
                    Some(ty) if ty.is_numeric() => expression.ty = Some(ty.clone()),
                    Some(ty) => {
                        Diagnostic::error(ErrorKind::Semantic)
                            .message(format!(
                                "unary \u{2018}{}\u{2019} requires a numeric operand, \
                                 but got \u{2018}{}\u{2019}",
                                unary.operator,
                                ty.name(&self.session.symbols)
                            ))
                            .span(span)
                            .report(self.reporter());
                    }
                    None => {}
                }
            }
            ast::BareExpression::Index(index) => {
                self.analyze_expression(&mut index.nested);
                self.analyze_expression(&mut index.index);

                Diagnostic::warning(ErrorKind::Unimplemented)
                    .message("index expressions are not supported yet")
                    .span(span)
                    .report(self.reporter());
            }
            ast::BareExpression::Binary(binary) => {
                expression.ty = self.analyze_binary(binary, span);
            }
            ast::BareExpression::Call(call) => {
                let (ty, symbol) = self.analyze_call(call, span);
                expression.ty = ty;
                expression.symbol = symbol;
            }
            ast::BareExpression::Range(range) => {
                self.analyze_expression(&mut range.lhs);
                self.analyze_expression(&mut range.rhs);

                for endpoint in [&range.lhs, &range.rhs] {
                    if endpoint.ty.as_ref().is_some_and(|ty| !ty.is_integer()) {
                        Diagnostic::error(ErrorKind::Semantic)
                            .message(format!(
                                "range endpoints must be integers, but got \u{2018}{}\u{2019}",
                                endpoint.ty.as_ref().unwrap().name(&self.session.symbols)
                            ))
                            .span(endpoint.span)
                            .report(self.reporter());
                    }
                }
            }
            ast::BareExpression::Error => {}
        }
    }

    /// Analyze the left part of a `::` access: names may resolve to
    /// namespaces, structs and enums here, not only to values.
    fn analyze_scope_nested(&mut self, expression: &mut ast::Expression) {
        match &mut expression.bare {
            ast::BareExpression::Variable(binder) => {
                let Some(found) = self.session.symbols.lookup(self.scope, &binder.bare) else {
                    Diagnostic::error(ErrorKind::Semantic)
                        .message(format!(
                            "\u{2018}{}\u{2019} is not defined",
                            binder.bare
                        ))
                        .span(expression.span)
                        .report(self.reporter());
                    return;
                };

                expression.symbol = Some(found);
                let symbol = &self.session.symbols[found];
                if matches!(symbol.kind, SymbolKind::Variable | SymbolKind::Parameter) {
                    expression.ty = symbol.ty.clone();
                }
            }
            ast::BareExpression::Scope(access) => {
                self.analyze_scope_nested(&mut access.nested);

                let Some(nested) = access.nested.symbol else {
                    return;
                };
                let Some(found) = self.session.symbols.local(nested, &access.member.bare) else {
                    Diagnostic::error(ErrorKind::Semantic)
                        .message(format!(
                            "member \u{2018}{}\u{2019} is not defined in \u{2018}{}\u{2019}",
                            access.member.bare, self.session.symbols[nested].name
                        ))
                        .span(access.member.span)
                        .report(self.reporter());
                    return;
                };

                expression.symbol = Some(self.session.symbols.resolve_alias(found));
            }
            _ => self.analyze_expression(expression),
        }
    }

    fn analyze_binary(&mut self, binary: &mut ast::Binary, span: Span) -> Option<Ty> {
        self.analyze_expression(&mut binary.lhs);
        self.analyze_expression(&mut binary.rhs);

        let (Some(lhs), Some(rhs)) = (binary.lhs.ty.clone(), binary.rhs.ty.clone()) else {
            return None;
        };

        let operator = binary.operator;

        if operator.is_logical() {
            if !lhs.is_bool() || !rhs.is_bool() {
                Diagnostic::error(ErrorKind::Semantic)
                    .message(format!(
                        "operator \u{2018}{operator}\u{2019} requires \
                         \u{2018}bool\u{2019} operands, but got \u{2018}{}\u{2019} \
                         and \u{2018}{}\u{2019}",
                        lhs.name(&self.session.symbols),
                        rhs.name(&self.session.symbols)
                    ))
                    .span(span)
                    .report(self.reporter());
                return None;
            }
            return Some(Ty::literal(LiteralKind::Bool));
        }

        if operator.is_equality() && lhs.is_bool() && rhs.is_bool() {
            return Some(Ty::literal(LiteralKind::Bool));
        }

        if operator.is_equality()
            && lhs.literal_kind() == rhs.literal_kind()
            && matches!(
                lhs.literal_kind(),
                Some(LiteralKind::Str | LiteralKind::Char)
            )
        {
            return Some(Ty::literal(LiteralKind::Bool));
        }

        let operand = self.unify_numeric(binary, &lhs, &rhs, span)?;

        // arithmetic operators return the operand type, comparisons `bool`
        if operator.is_comparison() {
            Some(Ty::literal(LiteralKind::Bool))
        } else {
            Some(operand)
        }
    }

    /// Apply the numeric coercion of binary expressions: an untyped side
    /// widens to the concrete side of the matching kind.
    fn unify_numeric(
        &mut self,
        binary: &mut ast::Binary,
        lhs: &Ty,
        rhs: &Ty,
        span: Span,
    ) -> Option<Ty> {
        let incompatible = |this: &Self| {
            Diagnostic::error(ErrorKind::Semantic)
                .message(format!(
                    "incompatible types for binary operation: \u{2018}{}\u{2019} \
                     and \u{2018}{}\u{2019}",
                    lhs.name(&this.session.symbols),
                    rhs.name(&this.session.symbols)
                ))
                .span(span)
                .report(this.reporter());
        };

        let (Some(lhs_kind), Some(rhs_kind)) = (lhs.literal_kind(), rhs.literal_kind()) else {
            incompatible(self);
            return None;
        };

        if !lhs_kind.is_numeric() || !rhs_kind.is_numeric() {
            incompatible(self);
            return None;
        }

        if lhs_kind.is_integer() != rhs_kind.is_integer() {
            incompatible(self);
            return None;
        }

        match (lhs_kind, rhs_kind) {
            (kind, other) if kind == other => Some(Ty::literal(kind)),
            (LiteralKind::UnkInt | LiteralKind::UnkFloat, concrete) => {
                self.widen_literal(&mut binary.lhs, concrete);
                Some(Ty::literal(concrete))
            }
            (concrete, LiteralKind::UnkInt | LiteralKind::UnkFloat) => {
                self.widen_literal(&mut binary.rhs, concrete);
                Some(Ty::literal(concrete))
            }
            _ => {
                incompatible(self);
                None
            }
        }
    }

    /// Widen an untyped numeric literal to a concrete kind, checking that a
    /// direct literal fits the target range.
    fn widen_literal(&mut self, expression: &mut ast::Expression, target: LiteralKind) {
        if target.is_integer() {
            if let Some((negative, digits)) = literal_magnitude(expression) {
                self.check_integer_fit(negative, &digits, target, expression.span);
            }
        }
        expression.ty = Some(Ty::literal(target));
    }

    /// Check whether an integer literal fits the target type,
    /// reporting an overflow otherwise.
    fn check_integer_fit(
        &mut self,
        negative: bool,
        digits: &str,
        target: LiteralKind,
        span: Span,
    ) {
        let value = match digits.parse::<i128>() {
            Ok(value) => {
                if negative {
                    -value
                } else {
                    value
                }
            }
            Err(_) => {
                self.report_overflow(target, span);
                return;
            }
        };

        let fits = match target {
            LiteralKind::I32 => i32::try_from(value).is_ok(),
            LiteralKind::I64 => i64::try_from(value).is_ok(),
            LiteralKind::I128 => true,
            _ => true,
        };

        if !fits {
            self.report_overflow(target, span);
        }
    }

    fn report_overflow(&mut self, target: LiteralKind, span: Span) {
        Diagnostic::error(ErrorKind::Semantic)
            .message("integer literal overflow")
            .span(span)
            .note(format!(
                "the literal does not fit into \u{2018}{target}\u{2019}"
            ))
            .report(self.reporter());
    }

    fn analyze_call(
        &mut self,
        call: &mut ast::Call,
        span: Span,
    ) -> (Option<Ty>, Option<SymbolIndex>) {
        let callee = self.resolve_callee(&mut call.callee);

        for argument in &mut call.arguments {
            self.analyze_expression(argument);
        }

        let Some(callee) = callee else {
            return (None, None);
        };

        let symbol = &self.session.symbols[callee];
        if symbol.kind != SymbolKind::Function {
            Diagnostic::error(ErrorKind::Semantic)
                .message(format!(
                    "called symbol \u{2018}{}\u{2019} is not a function",
                    symbol.name
                ))
                .span(call.callee.span)
                .report(self.reporter());
            return (None, None);
        }

        let name = symbol.name.clone();
        let parameters = symbol.parameter_tys.clone();
        let variadic = symbol.variadic;
        let return_ty = symbol.return_ty.clone();

        let required = if variadic {
            parameters.len().saturating_sub(1)
        } else {
            parameters.len()
        };
        let supplied = call.arguments.len();

        if (!variadic && supplied != required) || (variadic && supplied < required) {
            Diagnostic::error(ErrorKind::Semantic)
                .message(format!(
                    "function \u{2018}{name}\u{2019} expects {required} \
                     argument{}, but {supplied} {} supplied",
                    if required == 1 { "" } else { "s" },
                    if supplied == 1 { "was" } else { "were" },
                ))
                .span(span)
                .report(self.reporter());
        }

        // the extras of a variadic call all match the trailing type
        for (index, argument) in call.arguments.iter_mut().enumerate() {
            let parameter = if index < parameters.len() {
                &parameters[index]
            } else if variadic && !parameters.is_empty() {
                &parameters[parameters.len() - 1]
            } else {
                break;
            };
            let parameter = parameter.clone();
            self.check_assignable(&parameter, argument, false);
        }

        (return_ty, Some(callee))
    }

    fn resolve_callee(&mut self, callee: &mut ast::Expression) -> Option<SymbolIndex> {
        match &mut callee.bare {
            ast::BareExpression::Variable(binder) => {
                let Some(found) = self.session.symbols.lookup(self.scope, &binder.bare) else {
                    Diagnostic::error(ErrorKind::Semantic)
                        .message(format!(
                            "called function \u{2018}{}\u{2019} is not defined",
                            binder.bare
                        ))
                        .span(callee.span)
                        .report(self.reporter());
                    return None;
                };
                callee.symbol = Some(found);
                Some(found)
            }
            _ => {
                self.analyze_expression(callee);
                callee.symbol
            }
        }
    }

    // ===== types =====

    /// Resolve a syntactic type to a semantic one.
    ///
    /// In quiet mode, unresolvable object types silently become `any`; the
    /// eager pass uses this to attach whatever is already known.
    fn resolve_type(&mut self, ty: &mut ast::Type, quiet: bool) -> Ty {
        let nullable = ty.nullable;

        let bare = match &mut ty.bare {
            ast::BareType::Literal(kind) => BareTy::Literal(*kind),
            ast::BareType::Void => BareTy::Void,
            ast::BareType::Any => BareTy::Any,
            ast::BareType::Function(_) => {
                if !quiet {
                    Diagnostic::warning(ErrorKind::Unimplemented)
                        .message("function types are not supported yet")
                        .span(ty.span)
                        .report(self.reporter());
                }
                BareTy::Any
            }
            ast::BareType::Pointer(inner) => {
                BareTy::Pointer(Box::new(self.resolve_type(inner, quiet)))
            }
            ast::BareType::Reference(inner) => {
                BareTy::Reference(Box::new(self.resolve_type(inner, quiet)))
            }
            ast::BareType::Object(_) | ast::BareType::Scope(_) => {
                match self.resolve_type_symbol(ty, quiet) {
                    Some(symbol) => match self.session.symbols[symbol].kind {
                        SymbolKind::Struct | SymbolKind::Enum => BareTy::Object(symbol),
                        kind => {
                            if !quiet {
                                Diagnostic::error(ErrorKind::Semantic)
                                    .message(format!(
                                        "expected a struct or enum type, but found \
                                         {kind} \u{2018}{}\u{2019}",
                                        self.session.symbols[symbol].name
                                    ))
                                    .span(ty.span)
                                    .report(self.reporter());
                            }
                            BareTy::Any
                        }
                    },
                    None => BareTy::Any,
                }
            }
        };

        Ty { bare, nullable }
    }

    /// Resolve the symbol of an object or scope type, allowing namespaces
    /// in nested position.
    fn resolve_type_symbol(&mut self, ty: &mut ast::Type, quiet: bool) -> Option<SymbolIndex> {
        match &mut ty.bare {
            ast::BareType::Object(object) => {
                let found = self
                    .session
                    .symbols
                    .lookup(self.scope, &object.binder.bare);

                if found.is_none() && !quiet {
                    Diagnostic::error(ErrorKind::Semantic)
                        .message(format!(
                            "unknown type \u{2018}{}\u{2019}",
                            object.binder.bare
                        ))
                        .span(ty.span)
                        .report(self.reporter());
                }

                for generic in &mut object.generics {
                    self.resolve_type(generic, quiet);
                }

                ty.symbol = found;
                found
            }
            ast::BareType::Scope(_) => {
                // split the borrow: temporarily move the scope type out
                let ast::BareType::Scope(mut scope_ty) =
                    std::mem::replace(&mut ty.bare, ast::BareType::Void)
                else {
                    unreachable!();
                };

                let nested = self.resolve_type_symbol(&mut scope_ty.nested, quiet);
                let found = nested.and_then(|nested| {
                    let found = self
                        .session
                        .symbols
                        .local(nested, &scope_ty.member.bare);

                    if found.is_none() && !quiet {
                        Diagnostic::error(ErrorKind::Semantic)
                            .message(format!(
                                "unknown type \u{2018}{}\u{2019} in \u{2018}{}\u{2019}",
                                scope_ty.member.bare, self.session.symbols[nested].name
                            ))
                            .span(scope_ty.member.span)
                            .report(self.reporter());
                    }

                    found.map(|found| self.session.symbols.resolve_alias(found))
                });

                ty.bare = ast::BareType::Scope(scope_ty);
                ty.symbol = found;
                found
            }
            _ => None,
        }
    }

    // ===== type compatibility =====

    /// Check that an expression is assignable to the target type.
    ///
    /// Untyped literals widen to the target if their kinds match and — for
    /// direct literals — their value fits. At variable initialization,
    /// narrowing conversions between concrete numeric types are permitted
    /// while widening requires an explicit cast, which is not available yet.
    fn check_assignable(
        &mut self,
        target: &Ty,
        expression: &mut ast::Expression,
        at_initialization: bool,
    ) {
        let Some(actual) = expression.ty.clone() else {
            return;
        };

        if matches!(target.bare, BareTy::Any) || matches!(actual.bare, BareTy::Any) {
            return;
        }

        if actual.is_none() {
            if !target.nullable {
                Diagnostic::error(ErrorKind::Semantic)
                    .message(format!(
                        "cannot use \u{2018}none\u{2019} where \u{2018}{}\u{2019} \
                         is expected",
                        target.name(&self.session.symbols)
                    ))
                    .span(expression.span)
                    .report(self.reporter());
            }
            return;
        }

        if actual.nullable && !target.nullable {
            Diagnostic::error(ErrorKind::Semantic)
                .message(format!(
                    "cannot use a possibly-\u{2018}none\u{2019} value of type \
                     \u{2018}{}\u{2019} where \u{2018}{}\u{2019} is expected",
                    actual.name(&self.session.symbols),
                    target.name(&self.session.symbols)
                ))
                .span(expression.span)
                .report(self.reporter());
            return;
        }

        if let (Some(target_kind), Some(actual_kind)) =
            (target.literal_kind(), actual.literal_kind())
        {
            self.check_literal_assignable(target_kind, actual_kind, expression, at_initialization);
            return;
        }

        if !self.types_match(target, &actual) {
            Diagnostic::error(ErrorKind::Semantic)
                .message(format!(
                    "expected \u{2018}{}\u{2019}, but got \u{2018}{}\u{2019}",
                    target.name(&self.session.symbols),
                    actual.name(&self.session.symbols)
                ))
                .span(expression.span)
                .report(self.reporter());
        }
    }

    fn check_literal_assignable(
        &mut self,
        target: LiteralKind,
        actual: LiteralKind,
        expression: &mut ast::Expression,
        at_initialization: bool,
    ) {
        use LiteralKind::*;

        let span = expression.span;
        let mismatch = move |this: &Self| {
            Diagnostic::error(ErrorKind::Semantic)
                .message(format!(
                    "expected \u{2018}{target}\u{2019}, but got \u{2018}{actual}\u{2019}"
                ))
                .span(span)
                .report(this.reporter());
        };

        match actual {
            UnkInt if target.is_integer() => self.widen_literal(expression, target),
            UnkFloat if target.is_float() => self.widen_literal(expression, target),
            UnkInt | UnkFloat => mismatch(self),
            actual if actual == target => {}
            actual
                if at_initialization
                    && actual.is_integer() == target.is_integer()
                    && actual.is_numeric()
                    && target.is_numeric() =>
            {
                // narrowing is permitted at initialization, widening needs
                // an explicit cast
                if actual.bit_width() < target.bit_width() {
                    Diagnostic::error(ErrorKind::Semantic)
                        .message(format!(
                            "widening \u{2018}{actual}\u{2019} to \
                             \u{2018}{target}\u{2019} requires an explicit cast"
                        ))
                        .span(expression.span)
                        .hint("no cast syntax is available yet")
                        .report(self.reporter());
                }
            }
            _ => mismatch(self),
        }
    }

    /// Structural type equality with untyped-literal tolerance.
    fn types_match(&self, expected: &Ty, actual: &Ty) -> bool {
        use BareTy::*;

        match (&expected.bare, &actual.bare) {
            (Any, _) | (_, Any) => true,
            (Literal(expected), Literal(actual)) => {
                expected == actual
                    || (matches!(actual, LiteralKind::UnkInt) && expected.is_integer())
                    || (matches!(actual, LiteralKind::UnkFloat) && expected.is_float())
                    || (matches!(expected, LiteralKind::UnkInt) && actual.is_integer())
                    || (matches!(expected, LiteralKind::UnkFloat) && actual.is_float())
            }
            (Void, Void) => true,
            (BareTy::None, BareTy::None) => true,
            (Pointer(expected), Pointer(actual)) => self.types_match(expected, actual),
            (Reference(expected), Reference(actual)) => self.types_match(expected, actual),
            (Object(expected), Object(actual)) => expected == actual,
            _ => false,
        }
    }

    // ===== literal inference =====

    /// Promote the inferred type of an initializer without annotation to a
    /// concrete one: `UnkInt` defaults to `i64` (or `i128` for literals too
    /// large for it), `UnkFloat` to `f64`.
    fn default_promotion(&mut self, expression: &mut ast::Expression) -> Ty {
        let Some(ty) = expression.ty.clone() else {
            return Ty::any();
        };

        match ty.literal_kind() {
            Some(LiteralKind::UnkInt) => {
                let target = match literal_magnitude(expression) {
                    Some((negative, digits)) => {
                        let target = self.integer_magnitude_kind(&digits, expression.span, true);
                        self.check_integer_fit(negative, &digits, target, expression.span);
                        target
                    }
                    None => LiteralKind::I64,
                };
                self.widen_literal(expression, target);
                Ty::literal(target)
            }
            Some(LiteralKind::UnkFloat) => {
                self.widen_literal(expression, LiteralKind::F64);
                Ty::literal(LiteralKind::F64)
            }
            _ => ty,
        }
    }

    /// The smallest concrete integer type that holds the literal. With
    /// `default_to_i64`, widths below 64 bits are not considered (the
    /// annotation-free default).
    fn integer_magnitude_kind(
        &mut self,
        digits: &str,
        span: Span,
        default_to_i64: bool,
    ) -> LiteralKind {
        let Ok(value) = digits.parse::<i128>() else {
            self.report_overflow(LiteralKind::I128, span);
            return LiteralKind::I128;
        };

        if !default_to_i64 && i32::try_from(value).is_ok() {
            LiteralKind::I32
        } else if i64::try_from(value).is_ok() {
            LiteralKind::I64
        } else {
            LiteralKind::I128
        }
    }

    /// The element type of a range: the integer type of its endpoints.
    fn range_element_ty(&mut self, range: &mut ast::Range) -> Option<Ty> {
        let lhs = range.lhs.ty.clone()?.literal_kind()?;
        let rhs = range.rhs.ty.clone()?.literal_kind()?;

        if !lhs.is_integer() || !rhs.is_integer() {
            return None;
        }

        let concrete = [lhs, rhs]
            .into_iter()
            .find(|kind| *kind != LiteralKind::UnkInt);

        let element = match concrete {
            Some(kind) => kind,
            None => {
                // both endpoints untyped: apply the magnitude rule to the
                // wider of the two
                let lhs_kind = match literal_magnitude(&range.lhs) {
                    Some((_, digits)) => {
                        self.integer_magnitude_kind(&digits, range.lhs.span, false)
                    }
                    None => LiteralKind::I64,
                };
                let rhs_kind = match literal_magnitude(&range.rhs) {
                    Some((_, digits)) => {
                        self.integer_magnitude_kind(&digits, range.rhs.span, false)
                    }
                    None => LiteralKind::I64,
                };

                if rhs_kind.bit_width() > lhs_kind.bit_width() {
                    rhs_kind
                } else {
                    lhs_kind
                }
            }
        };

        self.widen_literal(&mut range.lhs, element);
        self.widen_literal(&mut range.rhs, element);

        Some(Ty::literal(element))
    }
}

enum Candidate {
    File(PathBuf),
    Directory(PathBuf),
}

/// The sign and digits of a direct numeric literal, if the expression is
/// one (possibly behind a unary sign).
fn literal_magnitude(expression: &ast::Expression) -> Option<(bool, String)> {
    match &expression.bare {
        ast::BareExpression::NumberLiteral(value) => Some((false, value.clone())),
        ast::BareExpression::Unary(unary) => {
            let negative = unary.operator == ast::UnaryOperator::Negate;
            match &unary.inner.bare {
                ast::BareExpression::NumberLiteral(value) => Some((negative, value.clone())),
                _ => None,
            }
        }
        _ => None,
    }
}

/// The final path segment of a module file or directory, extension
/// stripped.
fn directory_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
