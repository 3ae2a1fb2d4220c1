use crate::lexer::{LexError, Lexer, Token};
use crate::symbol::{join_segments, SEPARATOR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const NAMESPACE_KEYWORD: &str = "namespace";
const DECLARATION_KEYWORDS: &[&str] = &["class", "interface", "trait", "enum"];
/// Words that can follow `class` in an anonymous class but never name one.
const HERITAGE_KEYWORDS: &[&str] = &["extends", "implements"];

/// Per-file failure. Never aborts a batch.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", .0.display())]
    InvalidUtf8(PathBuf),

    #[error("malformed {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: LexError,
    },
}

/// Declarations found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDeclarations {
    /// First namespace declaration, `None` for the global namespace
    pub namespace: Option<String>,

    /// Declared type names in textual order
    pub names: Vec<String>,
}

impl FileDeclarations {
    /// Fully-qualified keys of every declared name.
    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.names.iter().map(move |name| match &self.namespace {
            Some(namespace) => format!("{namespace}{SEPARATOR}{name}"),
            None => name.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionReport {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub symbols: usize,
}

/// Result of extracting a batch of files.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub class_map: BTreeMap<String, PathBuf>,
    pub namespaces: BTreeMap<String, Vec<PathBuf>>,
    pub report: ExtractionReport,
}

/// Best-effort declaration scanner.
///
/// This is a token-level heuristic, not a parser: it finds the first
/// `namespace` declaration and every `class`/`interface`/`trait`/`enum`
/// declaration outside comments and string literals.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymbolExtractor;

impl SymbolExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract declarations from `files`, mapping every namespace found to
    /// `associated_path`. Later files win on duplicate keys.
    pub fn extract(&self, files: &[PathBuf], associated_path: &Path) -> Extraction {
        let mut extraction = Extraction::default();

        for file in files {
            extraction.report.files_scanned += 1;
            let declarations = match Self::extract_file(file) {
                Ok(declarations) => declarations,
                Err(err) => {
                    log::debug!("Skipping {}: {err}", file.display());
                    extraction.report.files_skipped += 1;
                    continue;
                }
            };

            if let Some(namespace) = &declarations.namespace {
                let dirs = extraction.namespaces.entry(namespace.clone()).or_default();
                if !dirs.iter().any(|dir| dir == associated_path) {
                    dirs.push(associated_path.to_path_buf());
                }
            }

            for key in declarations.keys() {
                extraction.report.symbols += 1;
                if let Some(previous) = extraction.class_map.insert(key.clone(), file.clone()) {
                    if &previous != file {
                        log::debug!(
                            "{key} declared in both {} and {}; keeping the latter",
                            previous.display(),
                            file.display()
                        );
                    }
                }
            }
        }

        extraction
    }

    pub fn extract_file(path: &Path) -> Result<FileDeclarations, ExtractionError> {
        let bytes = std::fs::read(path).map_err(|source| ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source =
            String::from_utf8(bytes).map_err(|_| ExtractionError::InvalidUtf8(path.to_path_buf()))?;
        Self::extract_source(&source).map_err(|source| ExtractionError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn extract_source(source: &str) -> Result<FileDeclarations, LexError> {
        let tokens = Lexer::tokenize(source)?;
        let mut declarations = FileDeclarations::default();

        let mut idx = 0;
        while idx < tokens.len() {
            let Token::Ident(word) = tokens[idx] else {
                idx += 1;
                continue;
            };
            let previous = idx.checked_sub(1).map(|prev| tokens[prev]);
            let after_member_access = previous.is_some_and(|token| token.is_member_access());
            let anonymous = previous == Some(Token::Ident("new"));

            if word == NAMESPACE_KEYWORD && declarations.namespace.is_none() && !after_member_access {
                if let Some((segments, consumed)) = qualified_name(&tokens[idx + 1..]) {
                    declarations.namespace = Some(join_segments(&segments));
                    idx += 1 + consumed;
                    continue;
                }
            } else if DECLARATION_KEYWORDS.contains(&word) && !after_member_access && !anonymous {
                match tokens.get(idx + 1) {
                    Some(Token::Ident(name)) if !HERITAGE_KEYWORDS.contains(name) => {
                        declarations.names.push((*name).to_string());
                        idx += 2;
                        continue;
                    }
                    _ => {}
                }
            }
            idx += 1;
        }

        Ok(declarations)
    }
}

/// `Ident (sep Ident)*` at the start of `tokens`; returns segments and the
/// number of tokens consumed.
fn qualified_name(tokens: &[Token<'_>]) -> Option<(Vec<String>, usize)> {
    let mut segments = Vec::new();
    let mut idx = 0;
    loop {
        let Some(Token::Ident(segment)) = tokens.get(idx) else {
            break;
        };
        segments.push((*segment).to_string());
        idx += 1;
        match (tokens.get(idx), tokens.get(idx + 1)) {
            (Some(sep), Some(Token::Ident(_))) if sep.is_name_separator() => idx += 1,
            _ => break,
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some((segments, idx))
    }
}
