//! Minimal HCL tokenizer
//!
//! Produces just enough structure to find module blocks and their top-level
//! attributes: identifiers, string literals, `=`, and block delimiters.
//! Braces inside strings, template interpolations, heredocs and comments
//! never surface as delimiter tokens, which is what makes depth tracking
//! over the token stream reliable.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier such as `module`, `source`, `for_each`
    Ident,
    /// Quoted string literal, quotes included
    Str,
    /// Heredoc body including the `<<EOF` marker and closing line
    Heredoc,
    /// `=` used as an assignment
    Equals,
    OpenBrace,
    CloseBrace,
    /// Any other punctuation, operator or number byte
    Other,
}

/// A token as a byte range into the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_trivia(&mut self) {
        while let Some(b) = self.peek_at(0) {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'#' => self.skip_line(),
                b'/' if self.peek_at(1) == Some(b'/') => self.skip_line(),
                b'/' if self.peek_at(1) == Some(b'*') => {
                    self.pos = match self.source[self.pos + 2..].find("*/") {
                        Some(offset) => self.pos + 2 + offset + 2,
                        None => self.bytes.len(),
                    };
                }
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        self.pos = match self.source[self.pos..].find('\n') {
            Some(offset) => self.pos + offset + 1,
            None => self.bytes.len(),
        };
    }

    /// Returns the position just past the closing quote of the string starting at `start`.
    fn string_end(&self, start: usize) -> usize {
        let mut i = start + 1;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b'"' => return i + 1,
                // `$${` and `%%{` are escaped template markers
                b'$' | b'%' if self.bytes.get(i + 1) == Some(&self.bytes[i]) => i += 2,
                b'$' | b'%' if self.bytes.get(i + 1) == Some(&b'{') => {
                    i = self.template_end(i + 2);
                }
                _ => i += 1,
            }
        }
        self.bytes.len()
    }

    /// Returns the position just past the `}` closing a template opened before `start`.
    fn template_end(&self, start: usize) -> usize {
        let mut depth = 0usize;
        let mut i = start;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'"' => i = self.string_end(i),
                b'{' => {
                    depth += 1;
                    i += 1;
                }
                b'}' if depth == 0 => return i + 1,
                b'}' => {
                    depth -= 1;
                    i += 1;
                }
                _ => i += 1,
            }
        }
        self.bytes.len()
    }

    /// Returns the end of a heredoc starting at `start` (`<<`), or None if the
    /// bytes there are not a heredoc opener.
    fn heredoc_end(&self, start: usize) -> Option<usize> {
        let rest = &self.source[start + 2..];
        let rest = rest.strip_prefix('-').unwrap_or(rest);
        let marker_len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        if marker_len == 0 {
            return None;
        }
        let marker = &rest[..marker_len];
        let after_marker = &rest[marker_len..];
        let newline = after_marker.find('\n')?;
        if !after_marker[..newline].trim().is_empty() {
            return None;
        }

        let body_start = self.bytes.len() - after_marker.len() + newline + 1;
        let mut line_start = body_start;
        for line in self.source[body_start..].split_inclusive('\n') {
            line_start += line.len();
            if line.trim() == marker {
                return Some(line_start);
            }
        }
        Some(self.bytes.len())
    }

    fn is_ident_start(b: u8) -> bool {
        b.is_ascii_alphabetic() || b == b'_'
    }

    fn is_ident_continue(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.skip_trivia();
        let start = self.pos;
        let b = self.peek_at(0)?;

        let (kind, end) = match b {
            b'{' => (TokenKind::OpenBrace, start + 1),
            b'}' => (TokenKind::CloseBrace, start + 1),
            b'"' => (TokenKind::Str, self.string_end(start)),
            b'=' | b'!' | b'<' | b'>' if self.peek_at(1) == Some(b'=') => {
                (TokenKind::Other, start + 2)
            }
            b'=' if self.peek_at(1) == Some(b'>') => (TokenKind::Other, start + 2),
            b'=' => (TokenKind::Equals, start + 1),
            b'<' if self.peek_at(1) == Some(b'<') => match self.heredoc_end(start) {
                Some(end) => (TokenKind::Heredoc, end),
                None => (TokenKind::Other, start + 2),
            },
            b if Self::is_ident_start(b) => {
                let len = self.bytes[start..]
                    .iter()
                    .take_while(|b| Self::is_ident_continue(**b))
                    .count();
                (TokenKind::Ident, start + len)
            }
            _ => {
                let width = self.source[start..].chars().next().map_or(1, char::len_utf8);
                (TokenKind::Other, start + width)
            }
        };

        self.pos = end.min(self.bytes.len());
        Some(Token {
            kind,
            start,
            end: self.pos,
        })
    }
}

/// Decode a quoted string token into its value.
///
/// Template sequences are kept verbatim; only backslash escapes are decoded.
pub fn string_value(raw: &str) -> String {
    let inner = raw.strip_prefix('"').unwrap_or(raw);
    let inner = inner.strip_suffix('"').unwrap_or(inner);

    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some(other) => value.push(other),
            None => value.push('\\'),
        }
    }
    value
}
