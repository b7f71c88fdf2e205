//! The symbol graph.
//!
//! Symbols live in a per-universe arena and reference each other by
//! [index](SymbolIndex): `parent` is a non-owning back-edge, `children` the
//! ordered set of symbols declared inside a scope and `target` the referent
//! of an alias. The arena lives as long as the analyzer, so indices never
//! dangle.

use crate::{ast::Mutability, resolver::ty::Ty, span::Span, PROGRAM_ENTRY};
use std::fmt;

/// An index into the symbol arena of a [`SymbolTable`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SymbolIndex(u32);

impl SymbolIndex {
    /// The raw arena index, stable for the lifetime of the table.
    pub const fn value(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SymbolKind {
    Namespace,
    Function,
    Variable,
    Parameter,
    Struct,
    Enum,
    Alias,
}

impl SymbolKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::Function => "function",
            Self::Variable => "variable",
            Self::Parameter => "parameter",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Alias => "alias",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named entity introduced into a scope.
#[derive(Debug)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// The fully-qualified assembly-level name. `extern` symbols keep their
    /// source name and `main` is exempt from mangling.
    pub mangled_name: String,
    pub parent: Option<SymbolIndex>,
    /// The symbols declared inside this scope, in declaration order.
    pub children: Vec<SymbolIndex>,
    /// The declared type of a variable, parameter, field or enum variant.
    pub ty: Option<Ty>,
    /// The return type of a function.
    pub return_ty: Option<Ty>,
    pub parameter_tys: Vec<Ty>,
    pub mutability: Mutability,
    pub public: bool,
    pub extern_: bool,
    pub async_: bool,
    /// Declared but not defined (forward declaration).
    pub declared: bool,
    pub variadic: bool,
    /// The referent of an alias.
    pub target: Option<SymbolIndex>,
    pub span: Span,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            name: name.into(),
            mangled_name: String::new(),
            parent: None,
            children: Vec::new(),
            ty: None,
            return_ty: None,
            parameter_tys: Vec::new(),
            mutability: Mutability::Variable,
            public: false,
            extern_: false,
            async_: false,
            declared: false,
            variadic: false,
            target: None,
            span,
        }
    }
}

/// The arena of all symbols of a compilation run.
///
/// Its root is the *universe*: the namespace whose children are all loaded
/// module namespaces.
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    universe: SymbolIndex,
}

impl SymbolTable {
    pub fn new() -> Self {
        let universe = Symbol::new(SymbolKind::Namespace, "{universe}", Span::default());

        Self {
            symbols: vec![universe],
            universe: SymbolIndex(0),
        }
    }

    pub fn universe(&self) -> SymbolIndex {
        self.universe
    }

    /// Iterate over every symbol of the arena in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolIndex, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(index, symbol)| (SymbolIndex(index as u32), symbol))
    }

    fn insert(&mut self, symbol: Symbol) -> SymbolIndex {
        let index = SymbolIndex(self.symbols.len() as u32);
        self.symbols.push(symbol);
        index
    }

    /// Declare a symbol as a child of the given scope.
    ///
    /// No two sibling children may share a name: a collision returns the
    /// existing symbol as the error value and inserts nothing.
    pub fn declare(
        &mut self,
        parent: SymbolIndex,
        mut symbol: Symbol,
    ) -> Result<SymbolIndex, SymbolIndex> {
        if let Some(existing) = self.local(parent, &symbol.name) {
            return Err(existing);
        }

        symbol.parent = Some(parent);
        let index = self.insert(symbol);
        self[parent].children.push(index);
        Ok(index)
    }

    /// Find a name among the direct children of the given scope.
    pub fn local(&self, scope: SymbolIndex, name: &str) -> Option<SymbolIndex> {
        self[scope]
            .children
            .iter()
            .copied()
            .find(|&child| self[child].name == name)
    }

    /// Resolve a name from the given scope outwards.
    ///
    /// Searches the scope's children first, then walks the parent edges up
    /// to the universe. Aliases are transparent: hitting one immediately
    /// resolves to its referent.
    pub fn lookup(&self, scope: SymbolIndex, name: &str) -> Option<SymbolIndex> {
        let mut current = Some(scope);

        while let Some(scope) = current {
            if let Some(found) = self.local(scope, name) {
                return Some(self.resolve_alias(found));
            }
            current = self[scope].parent;
        }

        None
    }

    /// Follow alias edges to the symbol they ultimately refer to.
    pub fn resolve_alias(&self, index: SymbolIndex) -> SymbolIndex {
        let mut index = index;

        while let Some(target) = self[index].target {
            index = target;
        }

        index
    }

    /// The mangled name of a child-to-be of the given scope.
    ///
    /// `main` is kept unmangled; `extern` symbols are exempted by their
    /// declaration sites which never call this.
    pub fn mangle(&self, parent: SymbolIndex, name: &str) -> String {
        if name == PROGRAM_ENTRY && self[parent].kind == SymbolKind::Namespace {
            return name.to_owned();
        }

        let parent = &self[parent].mangled_name;
        if parent.is_empty() {
            name.to_owned()
        } else {
            format!("{parent}_{name}")
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<SymbolIndex> for SymbolTable {
    type Output = Symbol;

    fn index(&self, index: SymbolIndex) -> &Self::Output {
        &self.symbols[index.0 as usize]
    }
}

impl std::ops::IndexMut<SymbolIndex> for SymbolTable {
    fn index_mut(&mut self, index: SymbolIndex) -> &mut Self::Output {
        &mut self.symbols[index.0 as usize]
    }
}

/// Derive the mangled name of a module namespace from its module path.
pub fn namespace_mangled_name(module: &str) -> String {
    module
        .chars()
        .map(|character| match character {
            '/' | '\\' | '.' | '-' => '_',
            character => character,
        })
        .collect()
}
