//! The compiler front-end of the Sonic programming language.
//!
//! The pipeline is strictly staged: the [lexer](crate::lexer) turns source text
//! into tokens, the [parser](crate::parser) builds the [AST](crate::ast) and the
//! [resolver](crate::resolver) loads modules, declares and resolves symbols and
//! type-checks the tree in place. All stages publish their errors through the
//! shared [diagnostics](crate::diagnostics) reporter; a non-empty reporter at the
//! end of the run halts the pipeline before any code is emitted.

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub mod ast;
pub mod cli;
pub mod diagnostics;
pub mod lexer;
pub mod package;
pub mod parser;
pub mod resolver;
pub mod serialize;
pub mod span;

/// The file extension of Sonic source files.
pub const FILE_EXTENSION: &str = "sn";

/// The name of the program entry point.
pub const PROGRAM_ENTRY: &str = "main";

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = "The Sonic Project Developers";
pub const LICENSE: &str = "MIT License";

/// An owned or borrowed string, mostly used for diagnostic texts.
pub type Str = std::borrow::Cow<'static, str>;

pub type SmallVec<T, const N: usize> = smallvec::SmallVec<[T; N]>;
