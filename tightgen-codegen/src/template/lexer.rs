//! Template tokenizer.
//!
//! Splits template source into literal text and `{{ ... }}` tags. A block
//! tag (`{{#...}}`, `{{/...}}`, `{{else...}}`, `{{!...}}`) that is the only
//! thing on its line consumes the whole line, including its newline, so
//! block structure does not leave blank lines in the output.

use crate::error::TemplateError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Kind of a template token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal text.
    Text(String),
    /// `{{ path }}`.
    Expr(String),
    /// `{{#keyword args}}`, holding everything after `#`.
    Open(String),
    /// `{{/keyword}}`, holding the keyword.
    Close(String),
    /// `{{else}}` or `{{else if cond}}`, holding everything after `else`.
    Else(String),
    /// `{{> name}}`, holding the fragment name.
    Include(String),
}

/// A token with the position of its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token kind.
    pub kind: TokenKind,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

/// Maps byte offsets to line and column.
struct LineIndex<'a> {
    source: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(source: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, starts }
    }

    fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&start| start <= offset);
        let start = self.starts[line - 1];
        let column = self.source[start..offset].chars().count() + 1;
        (line, column)
    }

    fn line_start(&self, offset: usize) -> usize {
        let line = self.starts.partition_point(|&start| start <= offset);
        self.starts[line - 1]
    }
}

/// Tokenizes template source.
///
/// # Errors
/// Returns `TemplateError::Syntax` for an unterminated or empty tag.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TemplateError> {
    let index = LineIndex::new(source);
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(found) = source[pos..].find(OPEN) {
        let tag_start = pos + found;
        let (line, column) = index.position(tag_start);
        let body_start = tag_start + OPEN.len();
        let body_end = source[body_start..]
            .find(CLOSE)
            .map(|i| body_start + i)
            .ok_or_else(|| TemplateError::syntax(line, column, "unterminated tag"))?;
        let tag_end = body_end + CLOSE.len();

        let kind = classify(source[body_start..body_end].trim())
            .map_err(|message| TemplateError::syntax(line, column, message))?;

        let mut text_end = tag_start;
        let mut next = tag_end;
        if is_block(&kind) {
            let line_start = index.line_start(tag_start);
            let rest_of_line = source[tag_end..].find('\n').map(|i| tag_end + i);
            let after = &source[tag_end..rest_of_line.unwrap_or(source.len())];
            if is_blank(&source[line_start..tag_start]) && is_blank(after) {
                text_end = line_start.max(pos);
                next = rest_of_line.map_or(source.len(), |i| i + 1);
            }
        }

        if text_end > pos {
            let (text_line, text_column) = index.position(pos);
            tokens.push(Token {
                kind: TokenKind::Text(source[pos..text_end].to_string()),
                line: text_line,
                column: text_column,
            });
        }
        if let Some(kind) = kind {
            tokens.push(Token { kind, line, column });
        }
        pos = next;
    }

    if pos < source.len() {
        let (line, column) = index.position(pos);
        tokens.push(Token {
            kind: TokenKind::Text(source[pos..].to_string()),
            line,
            column,
        });
    }

    Ok(tokens)
}

/// Classifies a tag body. Comments yield `None`.
fn classify(body: &str) -> Result<Option<TokenKind>, &'static str> {
    if body.is_empty() {
        return Err("empty tag");
    }
    let kind = if body.starts_with('!') {
        return Ok(None);
    } else if let Some(rest) = body.strip_prefix('#') {
        TokenKind::Open(rest.trim().to_string())
    } else if let Some(rest) = body.strip_prefix('/') {
        TokenKind::Close(rest.trim().to_string())
    } else if let Some(rest) = body.strip_prefix('>') {
        TokenKind::Include(rest.trim().to_string())
    } else if body == "else" {
        TokenKind::Else(String::new())
    } else if let Some(rest) = body.strip_prefix("else ") {
        TokenKind::Else(rest.trim().to_string())
    } else {
        TokenKind::Expr(body.to_string())
    };
    Ok(Some(kind))
}

fn is_block(kind: &Option<TokenKind>) -> bool {
    matches!(
        kind,
        None | Some(TokenKind::Open(_) | TokenKind::Close(_) | TokenKind::Else(_))
    )
}

fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c == ' ' || c == '\t' || c == '\r')
}
