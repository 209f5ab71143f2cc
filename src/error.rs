use std::error;
use std::fmt;

/// Generic error wrapper that ties an error kind to the place in the source
/// it was detected at. The kind carries the stage-specific information
/// (lexing, parsing, semantic analysis...), the wrapper carries everything
/// needed to render a `file:line:col` report with a snippet.
#[derive(Debug, Clone)]
pub struct Error<T> {
    pub kind: T,
    file: Option<std::path::PathBuf>,
    snippet: Option<Snippet>,
    contexts: Vec<&'static str>,
}

/// Byte range into the compiled source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub const fn new(offset: usize) -> Self {
        Self { offset, len: 1 }
    }
    pub const fn as_range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
    /// Recover the line/column position of the span's start, along with the
    /// full line it sits on.
    pub fn snippet_from_source(&self, source: &SourceMetadata) -> Option<Snippet> {
        let mut offset = 0;
        for (i, line) in source.input().split_terminator('\n').enumerate() {
            let next_offset = offset + line.len() + 1;
            if next_offset > self.offset {
                return Some(Snippet {
                    position: Position {
                        line: i,
                        col: self.offset - offset,
                    },
                    line: line.to_string(),
                });
            }
            offset = next_offset;
        }
        None
    }
}

/// The source text being compiled, together with the (optional) file it was
/// read from. One of these is created per compilation run and shared by all
/// stages that need to point back into the source.
#[derive(Debug)]
pub struct SourceMetadata<'a> {
    file: Option<std::path::PathBuf>,
    source: &'a str,
}

impl<'a> SourceMetadata<'a> {
    pub const fn new(source: &'a str) -> Self {
        Self { file: None, source }
    }
    pub const fn input(&self) -> &'a str {
        self.source
    }
    #[must_use]
    pub fn with_file(mut self, file: std::path::PathBuf) -> Self {
        self.file = Some(file);
        self
    }
}

impl<T> Error<T> {
    pub const fn new(kind: T) -> Self {
        Self {
            kind,
            file: None,
            snippet: None,
            contexts: Vec::new(),
        }
    }
    pub fn map_kind<F, U>(self, mapper: F) -> Error<U>
    where
        F: FnOnce(T) -> U,
    {
        Error {
            kind: mapper(self.kind),
            file: self.file,
            snippet: self.snippet,
            contexts: self.contexts,
        }
    }
    #[must_use]
    pub fn with_source(mut self, span: Span, source: &SourceMetadata) -> Self {
        self.file = source.file.clone();
        self.snippet = span.snippet_from_source(source);
        self
    }
    /// The source given is only applied if no location was attached yet.
    #[must_use]
    pub fn with_backup_source(self, span: Span, source: &SourceMetadata) -> Self {
        if self.snippet.is_some() {
            self
        } else {
            self.with_source(span, source)
        }
    }
    #[must_use]
    pub fn add_context(mut self, ctx: &'static str) -> Self {
        self.contexts.push(ctx);
        self
    }
    pub fn position(&self) -> Option<Position> {
        self.snippet.as_ref().map(|s| s.position)
    }
}

/// A single source line plus the position the error points at inside it.
#[derive(Debug, Clone)]
pub struct Snippet {
    position: Position,
    line: String,
}

/// Zero-based line/column pair. Rendered one-based, like rustc does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

/// What a stage wanted when it found something else: either a specific
/// item or a free-form description of the acceptable set.
#[derive(Debug)]
pub enum WantedSpec<T> {
    Specific(T),
    Description(&'static str),
}

impl<T: fmt::Display> fmt::Display for WantedSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Specific(item) => item.fmt(f),
            Self::Description(desc) => f.write_str(desc),
        }
    }
}

impl<T: error::Error + 'static> error::Error for Error<T> {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl<T: fmt::Display> fmt::Display for Error<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let snippet = match &self.snippet {
            Some(snippet) => snippet,
            None => {
                write!(f, "{} (no location info)", self.kind)?;
                return self
                    .contexts
                    .iter()
                    .try_for_each(|ctx| write!(f, "\nwhile {}", ctx));
            }
        };
        let file = self
            .file
            .as_ref()
            .and_then(|path| path.to_str())
            .unwrap_or("<unknown source>");
        let line = snippet.position.line + 1;
        let col = snippet.position.col + 1;
        write!(
            f,
            "{kind}\n   --> {file}:{line}:{col}\n    |\n{line:3} | {src}\n    | {marker:>col$}",
            kind = self.kind,
            file = file,
            line = line,
            col = col,
            src = snippet.line,
            marker = '^',
        )?;
        self.contexts
            .iter()
            .try_for_each(|ctx| write!(f, "\nwhile {}", ctx))
    }
}
