use crate::error::SyntaxError;
use crate::position::LineIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident,
    Number,
    Str,
    Punct,
    Comment,
}

/// A token as a byte span into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

const MULTI_CHAR_PUNCT: &[&str] = &[
    "...", "->", "=>", "==", "!=", "<=", ">=", "&&", "||", "+=", "-=", "*=", "/=",
];

pub(crate) fn tokenize(src: &str, index: &LineIndex) -> Result<Vec<Token>, SyntaxError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < src.len() {
        let Some(ch) = src[pos..].chars().next() else {
            break;
        };

        if ch.is_whitespace() {
            pos += ch.len_utf8();
            continue;
        }

        let start = pos;
        let kind = if src[pos..].starts_with("//") {
            pos = src[pos..].find('\n').map_or(src.len(), |n| pos + n);
            TokenKind::Comment
        } else if ch == '"' || ch == '`' {
            pos = scan_string(src, pos, ch).ok_or_else(|| {
                SyntaxError::new("Unterminated string literal", index.position_of(src, start))
            })?;
            TokenKind::Str
        } else if ch.is_ascii_digit() {
            pos += 1;
            while pos < src.len() {
                let b = bytes[pos];
                let continues_fraction =
                    b == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit);
                if b.is_ascii_alphanumeric() || b == b'_' || continues_fraction {
                    pos += 1;
                } else {
                    break;
                }
            }
            TokenKind::Number
        } else if ch.is_alphabetic() || ch == '_' {
            pos += ch.len_utf8();
            while let Some(next) = src[pos..].chars().next() {
                if next.is_alphanumeric() || next == '_' {
                    pos += next.len_utf8();
                } else {
                    break;
                }
            }
            TokenKind::Ident
        } else {
            let width = MULTI_CHAR_PUNCT
                .iter()
                .find(|p| src[pos..].starts_with(**p))
                .map_or(ch.len_utf8(), |p| p.len());
            pos += width;
            TokenKind::Punct
        };

        tokens.push(Token {
            kind,
            start,
            end: pos,
        });
    }

    Ok(tokens)
}

/// Returns the byte offset just past the closing quote.
fn scan_string(src: &str, start: usize, quote: char) -> Option<usize> {
    let mut escaped = false;
    for (i, ch) in src[start + 1..].char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' && quote == '"' {
            escaped = true;
        } else if ch == quote {
            return Some(start + 1 + i + 1);
        } else if ch == '\n' && quote == '"' {
            return None;
        }
    }
    None
}
