//! Lightweight tokenizer for declaration scanning.
//!
//! Only distinguishes what declaration extraction needs: identifiers,
//! qualified-name separators and member-access operators. Comments and string
//! literals are consumed and never produce tokens.

use crate::symbol::{is_ident_char, is_ident_start};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated block comment starting on line {0}")]
    UnterminatedComment(usize),

    #[error("unterminated string literal starting on line {0}")]
    UnterminatedString(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Ident(&'a str),
    /// `\` namespace separator
    Backslash,
    /// `::`
    DoubleColon,
    /// `->`
    Arrow,
    Dot,
    Punct(char),
}

impl Token<'_> {
    /// Tokens after which a keyword is a member reference, not a declaration.
    pub fn is_member_access(&self) -> bool {
        matches!(self, Token::DoubleColon | Token::Arrow | Token::Dot)
    }

    pub fn is_name_separator(&self) -> bool {
        matches!(self, Token::Backslash | Token::DoubleColon | Token::Dot)
    }
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
        }
    }

    /// Tokenize the whole input.
    pub fn tokenize(src: &'a str) -> Result<Vec<Token<'a>>, LexError> {
        let mut lexer = Self::new(src);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_line = self.line;
        // opening `/*`
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                None => return Err(LexError::UnterminatedComment(start_line)),
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
            }
        }
    }

    fn skip_string(&mut self, quote: char) -> Result<(), LexError> {
        let (start_pos, start_line) = (self.pos, self.line);
        self.bump();
        loop {
            match self.bump() {
                None if quote == '"' => return Err(LexError::UnterminatedString(start_line)),
                None => {
                    // a stray apostrophe or backtick in prose; the literal ends with its line
                    self.pos = start_pos;
                    self.line = start_line;
                    self.bump();
                    self.skip_line();
                    return Ok(());
                }
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == quote => return Ok(()),
                Some(_) => {}
            }
        }
    }

    /// Heredoc or nowdoc body: `<<<ID`, `<<<'ID'` or `<<<"ID"` up to the line
    /// starting with `ID`. Returns `false` (consuming nothing) when the
    /// opener is not followed by a label.
    fn skip_heredoc(&mut self) -> Result<bool, LexError> {
        let src = self.src;
        let rest = &src[self.pos + 3..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        let unquoted = trimmed.trim_start_matches(['\'', '"']);
        let label_len = unquoted
            .char_indices()
            .find(|&(_, c)| !is_ident_char(c))
            .map_or(unquoted.len(), |(idx, _)| idx);
        let label = &unquoted[..label_len];
        if label.is_empty() || !label.starts_with(is_ident_start) {
            return Ok(false);
        }

        let start_line = self.line;
        self.skip_line();
        loop {
            if self.peek().is_none() {
                return Err(LexError::UnterminatedString(start_line));
            }
            // at the start of a body line
            self.bump();
            let line = src[self.pos..].trim_start_matches([' ', '\t']);
            let closes = line
                .strip_prefix(label)
                .is_some_and(|after| !after.starts_with(is_ident_char));
            if closes {
                let indent = src[self.pos..].len() - line.len();
                self.pos += indent + label.len();
                return Ok(true);
            }
            self.skip_line();
        }
    }

    fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_ident_char(c) {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }

    pub fn next_token(&mut self) -> Result<Option<Token<'a>>, LexError> {
        loop {
            let Some(c) = self.peek() else {
                return Ok(None);
            };

            if c.is_whitespace() {
                self.bump();
                continue;
            }

            match (c, self.peek_second()) {
                ('/', Some('/')) => {
                    self.skip_line();
                    continue;
                }
                ('/', Some('*')) => {
                    self.skip_block_comment()?;
                    continue;
                }
                // `#[...]` is an attribute, any other `#` starts a line comment
                ('#', next) if next != Some('[') => {
                    self.skip_line();
                    continue;
                }
                ('<', Some('<')) if self.src[self.pos..].starts_with("<<<") => {
                    if self.skip_heredoc()? {
                        continue;
                    }
                }
                ('"', _) | ('\'', _) | ('`', _) => {
                    self.skip_string(c)?;
                    continue;
                }
                (':', Some(':')) => {
                    self.bump();
                    self.bump();
                    return Ok(Some(Token::DoubleColon));
                }
                ('-', Some('>')) => {
                    self.bump();
                    self.bump();
                    return Ok(Some(Token::Arrow));
                }
                _ => {}
            }

            if is_ident_start(c) {
                return Ok(Some(Token::Ident(self.ident())));
            }

            if c.is_ascii_digit() {
                // numbers are irrelevant; swallow them so `1.5` is not `Dot`
                while self.peek().is_some_and(|c| is_ident_char(c) || c == '.') {
                    self.bump();
                }
                continue;
            }

            self.bump();
            return Ok(Some(match c {
                '\\' => Token::Backslash,
                '.' => Token::Dot,
                other => Token::Punct(other),
            }));
        }
    }
}
