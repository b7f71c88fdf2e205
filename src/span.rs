//! Data structures and procedures for handling source locations.

use std::{fmt, num::TryFromIntError, ops::Range};

pub use source_map::{FileName, SourceFile, SourceFileIndex, SourceMap};

pub mod source_map;

/// A global byte index.
///
/// Here, "global" means relative to a [`SourceMap`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
pub struct ByteIndex(u32);

impl ByteIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// Map a global byte index to a local one.
    pub fn local(self, file: &SourceFile) -> LocalByteIndex {
        LocalByteIndex::new(self.0 - file.span().start.0)
    }
}

impl std::ops::Add<u32> for ByteIndex {
    type Output = Self;

    fn add(self, offset: u32) -> Self::Output {
        Self(self.0 + offset)
    }
}

/// A file-local byte index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
pub struct LocalByteIndex(u32);

impl LocalByteIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Map a local byte index to a global one.
    pub fn global(self, file: &SourceFile) -> ByteIndex {
        ByteIndex::new(file.span().start.0 + self.0)
    }
}

impl TryFrom<usize> for LocalByteIndex {
    type Error = TryFromIntError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Ok(Self(index.try_into()?))
    }
}

impl From<LocalByteIndex> for usize {
    fn from(index: LocalByteIndex) -> Self {
        index.0 as usize
    }
}

impl std::ops::Add<u32> for LocalByteIndex {
    type Output = Self;

    fn add(self, offset: u32) -> Self::Output {
        Self(self.0 + offset)
    }
}

impl std::ops::Add<char> for LocalByteIndex {
    type Output = Self;

    fn add(self, character: char) -> Self::Output {
        self + character.len_utf8() as u32
    }
}

/// A global byte span of source code.
///
/// The start is inclusive, the end exclusive. `Span::default()` is the
/// unknown location: it points at the padding byte before the first file
/// of the [`SourceMap`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Span {
    pub start: ByteIndex,
    pub end: ByteIndex,
}

impl Span {
    pub fn new(start: ByteIndex, end: ByteIndex) -> Self {
        debug_assert!(start <= end);

        Self { start, end }
    }

    /// Create an empty span at the given index.
    pub fn empty(index: ByteIndex) -> Self {
        Self::new(index, index)
    }

    pub fn length(self) -> u32 {
        self.end.0 - self.start.0
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn local(self, file: &SourceFile) -> LocalSpan {
        LocalSpan::new(self.start.local(file), self.end.local(file))
    }

    /// Widen the span to cover the other one as well, if it exists.
    #[must_use]
    pub fn merge(self, other: impl PossiblySpanning) -> Self {
        match other.possible_span() {
            Some(other) => Self::new(self.start, other.end),
            None => self,
        }
    }

    /// Extend this span in place up to the end of the other one.
    pub fn merging<S: PossiblySpanning>(&mut self, other: &S) {
        if let Some(other) = other.possible_span() {
            self.end = other.end;
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.0, self.end.0)
    }
}

/// A span inside a single source file.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct LocalSpan {
    pub start: LocalByteIndex,
    pub end: LocalByteIndex,
}

impl LocalSpan {
    pub fn new(start: LocalByteIndex, end: LocalByteIndex) -> Self {
        Self { start, end }
    }

    pub fn empty(index: LocalByteIndex) -> Self {
        Self::new(index, index)
    }

    pub fn global(self, file: &SourceFile) -> Span {
        Span::new(self.start.global(file), self.end.global(file))
    }

    pub fn set_end(&mut self, index: LocalByteIndex) {
        self.end = index;
    }
}

impl From<LocalSpan> for Range<usize> {
    fn from(span: LocalSpan) -> Self {
        span.start.into()..span.end.into()
    }
}

pub trait Spanning {
    fn span(&self) -> Span;
}

impl Spanning for Span {
    fn span(&self) -> Span {
        *self
    }
}

impl<S: Spanning> Spanning for &S {
    fn span(&self) -> Span {
        (**self).span()
    }
}

pub trait PossiblySpanning {
    fn possible_span(&self) -> Option<Span>;
}

impl<S: Spanning> PossiblySpanning for S {
    fn possible_span(&self) -> Option<Span> {
        Some(self.span())
    }
}

impl<S: Spanning> PossiblySpanning for Option<&S> {
    fn possible_span(&self) -> Option<Span> {
        self.map(Spanning::span)
    }
}

/// A value with a source location attached.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Spanned<Bare> {
    pub bare: Bare,
    pub span: Span,
}

impl<Bare> Spanned<Bare> {
    pub const fn new(span: Span, bare: Bare) -> Self {
        Self { bare, span }
    }

    pub fn map<Output>(self, mapper: impl FnOnce(Bare) -> Output) -> Spanned<Output> {
        Spanned::new(self.span, mapper(self.bare))
    }

    pub const fn as_ref(&self) -> Spanned<&Bare> {
        Spanned::new(self.span, &self.bare)
    }
}

impl<Bare> Spanning for Spanned<Bare> {
    fn span(&self) -> Span {
        self.span
    }
}

impl<Bare: fmt::Debug> fmt::Debug for Spanned<Bare> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?}", self.bare, self.span)
    }
}

impl<Bare: fmt::Display> fmt::Display for Spanned<Bare> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.bare.fmt(f)
    }
}

/// Convenience function for constructing a global span in test code.
pub fn span(start: u32, end: u32) -> Span {
    Span::new(ByteIndex::new(start), ByteIndex::new(end))
}
