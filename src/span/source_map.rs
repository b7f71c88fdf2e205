use super::{ByteIndex, LocalSpan, Span, Spanning};
use std::{
    fmt, io,
    ops::Range,
    path::{Path, PathBuf},
};
use unicode_width::UnicodeWidthStr;

#[cfg(test)]
mod test;

/// A mapping from [index](SourceFileIndex) to [source file](SourceFile).
///
/// The source files are laid out next to each other, each padded on its left
/// by one byte to reserve space for end-of-input pseudo tokens. This also
/// frees up byte index `0` which allows `Span::default()` to be interpreted
/// as an unknown location.
#[derive(Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    fn next_offset(&self) -> ByteIndex {
        const PADDING: u32 = 1;

        self.files
            .last()
            .map(|file| file.span().end)
            .unwrap_or_default()
            + PADDING
    }

    /// Open a file given its path and add it as a [`SourceFile`] to the map.
    pub fn load(&mut self, path: &Path) -> io::Result<SourceFileIndex> {
        let source = std::fs::read_to_string(path)?;
        Ok(self.add(FileName::Path(path.to_owned()), source))
    }

    /// Add text to the map creating a [`SourceFile`] in the process.
    pub fn add(&mut self, name: FileName, source: String) -> SourceFileIndex {
        let index = SourceFileIndex(self.files.len());
        self.files
            .push(SourceFile::new(name, source, self.next_offset()));
        index
    }

    pub fn add_str(&mut self, name: FileName, source: &str) -> SourceFileIndex {
        self.add(name, source.to_owned())
    }

    pub fn file(&self, span: Span) -> &SourceFile {
        debug_assert!(span != Span::default());

        self.files
            .iter()
            .find(|file| {
                file.span().start <= span.start && span.start <= file.span().end
            })
            .unwrap()
    }

    /// Resolve a span to the string content it points to.
    pub fn snippet(&self, span: Span) -> &str {
        let file = self.file(span);
        let span = span.local(file);
        &file[span]
    }

    /// Resolve a span to the line that contains its start.
    ///
    /// Multi-line spans are clamped to the first line; the diagnostic
    /// renderer only underlines the line the offending token starts on.
    pub fn line_with_highlight(&self, span: Span) -> LineWithHighlight<'_> {
        let file = self.file(span);
        let local = span.local(file);
        let content = file.content();

        let start = usize::from(local.start).min(content.len());
        let end = usize::from(local.end).min(content.len());

        let line_start = content[..start].rfind('\n').map_or(0, |index| index + 1);
        let line_end = content[start..]
            .find('\n')
            .map_or(content.len(), |index| start + index);
        let number = content[..line_start].matches('\n').count() as u32 + 1;

        let highlight_end = end.clamp(start, line_end);
        let prefix = &content[line_start..start];
        let snippet = &content[start..highlight_end];

        let highlight_start = prefix.chars().count() as u32 + 1;

        LineWithHighlight {
            file: file.name(),
            number,
            content: &content[line_start..line_end],
            prefix,
            highlight: Highlight {
                start: highlight_start,
                end: highlight_start + snippet.chars().count() as u32,
                width: snippet.width().max(1),
            },
        }
    }
}

impl std::ops::Index<SourceFileIndex> for SourceMap {
    type Output = SourceFile;

    fn index(&self, index: SourceFileIndex) -> &Self::Output {
        &self.files[index.0]
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SourceFileIndex(usize);

/// A line of source code containing the start of a highlighted span.
#[derive(Debug, PartialEq, Eq)]
pub struct LineWithHighlight<'a> {
    pub file: &'a FileName,
    /// The one-indexed line number.
    pub number: u32,
    /// The content of the line without its terminator.
    pub content: &'a str,
    /// The content of the line up to the highlight.
    pub prefix: &'a str,
    pub highlight: Highlight,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Highlight {
    /// The one-indexed column the highlight starts at.
    pub start: u32,
    /// The column one past the end of the highlight.
    pub end: u32,
    /// The display width of the highlighted snippet, at least one.
    pub width: usize,
}

/// A source file registered in a [source map](SourceMap).
pub struct SourceFile {
    name: FileName,
    content: String,
    span: Span,
}

impl SourceFile {
    fn new(name: FileName, content: String, start: ByteIndex) -> Self {
        let end = start + content.len() as u32;
        Self {
            span: Span::new(start, end),
            name,
            content,
        }
    }

    pub fn name(&self) -> &FileName {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn local_span(&self) -> LocalSpan {
        self.span.local(self)
    }
}

impl Spanning for SourceFile {
    fn span(&self) -> Span {
        self.span
    }
}

impl std::ops::Index<LocalSpan> for SourceFile {
    type Output = str;

    fn index(&self, index: LocalSpan) -> &Self::Output {
        &self.content[Range::from(index)]
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum FileName {
    Anonymous,
    Path(PathBuf),
}

impl FileName {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Anonymous => None,
        }
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("<anonymous>"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}
