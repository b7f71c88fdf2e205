//! Semantic types.
//!
//! Small owned values attached to expressions and symbols during analysis,
//! in contrast to the syntactic [`ast::Type`](crate::ast::Type) tree they
//! are resolved from. Cloning them is cheap and keeps the analyzed AST free
//! of non-owning pointers.

use crate::ast::LiteralKind;
use crate::resolver::scope::{SymbolIndex, SymbolTable};

#[derive(Clone, PartialEq, Debug)]
pub struct Ty {
    pub bare: BareTy,
    pub nullable: bool,
}

#[derive(Clone, PartialEq, Debug)]
pub enum BareTy {
    Literal(LiteralKind),
    Void,
    /// The `any` type. It is compatible with every other type and doubles
    /// as the silent placeholder for types that could not be resolved,
    /// keeping follow-up diagnostics from cascading.
    Any,
    /// The type of the `none` literal.
    None,
    Pointer(Box<Ty>),
    Reference(Box<Ty>),
    Object(SymbolIndex),
}

impl Ty {
    pub fn new(bare: BareTy) -> Self {
        Self {
            bare,
            nullable: false,
        }
    }

    pub fn literal(kind: LiteralKind) -> Self {
        Self::new(BareTy::Literal(kind))
    }

    pub fn void() -> Self {
        Self::new(BareTy::Void)
    }

    pub fn any() -> Self {
        Self::new(BareTy::Any)
    }

    pub fn none() -> Self {
        Self {
            bare: BareTy::None,
            nullable: true,
        }
    }

    pub fn object(symbol: SymbolIndex) -> Self {
        Self::new(BareTy::Object(symbol))
    }

    pub fn literal_kind(&self) -> Option<LiteralKind> {
        match self.bare {
            BareTy::Literal(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.bare, BareTy::Literal(kind) if kind.is_integer())
    }

    pub fn is_float(&self) -> bool {
        matches!(self.bare, BareTy::Literal(kind) if kind.is_float())
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.bare, BareTy::Literal(LiteralKind::Bool))
    }

    pub fn is_void(&self) -> bool {
        matches!(self.bare, BareTy::Void)
    }

    pub fn is_none(&self) -> bool {
        matches!(self.bare, BareTy::None)
    }

    /// Render the type for use in a diagnostic.
    pub fn name(&self, table: &SymbolTable) -> String {
        let mut name = match &self.bare {
            BareTy::Literal(kind) => kind.to_string(),
            BareTy::Void => "void".into(),
            BareTy::Any => "any".into(),
            BareTy::None => "none".into(),
            BareTy::Pointer(inner) => format!("{}*", inner.name(table)),
            BareTy::Reference(inner) => format!("{}&", inner.name(table)),
            BareTy::Object(symbol) => table[*symbol].name.clone(),
        };

        if self.nullable && !self.is_none() {
            name.push('?');
        }

        name
    }
}
