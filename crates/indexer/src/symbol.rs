use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator used in canonical symbol keys (`A.B.Name`).
pub const SEPARATOR: char = '.';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("symbol name is empty")]
    Empty,

    #[error("empty segment in `{0}`")]
    EmptySegment(String),

    #[error("invalid character in segment `{0}`")]
    InvalidSegment(String),
}

/// Fully-qualified type name as an ordered list of segments.
///
/// The last segment is the declared name, everything before it is the
/// namespace. `A\B\Name`, `A::B::Name` and `A.B.Name` all parse to the same
/// symbol; a leading separator (`\A\B`) is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    segments: Vec<String>,
}

impl Symbol {
    pub fn parse(raw: &str) -> Result<Self, SymbolError> {
        let segments = split_qualified(raw)?;
        Ok(Self { segments })
    }

    pub fn from_segments<I, S>(segments: I) -> Result<Self, SymbolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(SymbolError::Empty);
        }
        for segment in &segments {
            validate_segment(segment, segment)?;
        }
        Ok(Self { segments })
    }

    pub fn name(&self) -> &str {
        // never empty, enforced by constructors
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn namespace(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Canonical map key.
    pub fn key(&self) -> String {
        join_segments(&self.segments)
    }

    /// Namespace prefixes from most to least specific; the empty prefix is
    /// never produced.
    pub fn prefixes(&self) -> Prefixes<'_> {
        let namespace = self.namespace();
        Prefixes {
            namespace,
            len: namespace.len(),
        }
    }
}

impl FromStr for Symbol {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Shrinking window over a symbol's namespace segments.
#[derive(Debug, Clone)]
pub struct Prefixes<'a> {
    namespace: &'a [String],
    len: usize,
}

impl<'a> Iterator for Prefixes<'a> {
    type Item = &'a [String];

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let window = &self.namespace[..self.len];
        self.len -= 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl ExactSizeIterator for Prefixes<'_> {}

pub fn join_segments(segments: &[String]) -> String {
    let mut out = String::new();
    for (idx, segment) in segments.iter().enumerate() {
        if idx > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(segment);
    }
    out
}

/// Split a qualified name written with `.`, `\` or `::` separators.
pub(crate) fn split_qualified(raw: &str) -> Result<Vec<String>, SymbolError> {
    let normalized = raw.trim().replace("::", ".").replace('\\', ".");
    let normalized = normalized.strip_prefix(SEPARATOR).unwrap_or(&normalized);
    if normalized.is_empty() {
        return Err(SymbolError::Empty);
    }

    let mut segments = Vec::new();
    for segment in normalized.split(SEPARATOR) {
        if segment.is_empty() {
            return Err(SymbolError::EmptySegment(raw.to_string()));
        }
        validate_segment(segment, raw)?;
        segments.push(segment.to_string());
    }
    Ok(segments)
}

fn validate_segment(segment: &str, raw: &str) -> Result<(), SymbolError> {
    if segment.is_empty() {
        return Err(SymbolError::EmptySegment(raw.to_string()));
    }
    if !segment.chars().all(is_ident_char) {
        return Err(SymbolError::InvalidSegment(segment.to_string()));
    }
    Ok(())
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
