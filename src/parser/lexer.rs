use crate::error::ParseError;
use crate::parser::types::Span;
use std::str::Chars;

const EOF_CHAR: char = '\0';

/// Punctuation, longest first so that `===` wins over `==`.
///
/// `>` is never glued to anything: `>>`, `>=` and friends are recombined by the
/// parser from adjacent tokens so that nested generics like `List<List<String>>`
/// still close correctly.
const PUNCTUATION: &[&str] = &[
    "===", "!==", "<<=", "&&", "||", "==", "!=", "<=", "+=", "-=", "*=", "/=", "&=", "|=", "^=",
    "<<", "++", "--", "=>", "?.", "(", ")", "{", "}", "[", "]", ";", ",", ".", "@", "=", "<",
    ">", "!", "~", "?", ":", "+", "-", "*", "/", "&", "|", "^", "%",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifiers and keywords alike; keywords are recognised by the parser.
    Ident,
    Number,
    String,
    Punct,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    /// Byte offsets into the source.
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }

    /// Apex keywords are case-insensitive.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Ident && self.text.eq_ignore_ascii_case(keyword)
    }
}

struct Cursor<'a> {
    chars: Chars<'a>,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn peek(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF_CHAR)
    }

    fn second(&self) -> char {
        let mut chars = self.chars.clone();
        chars.next();
        chars.next().unwrap_or(EOF_CHAR)
    }

    fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    fn advance(&mut self) -> char {
        let Some(c) = self.chars.next() else {
            return EOF_CHAR;
        };
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn advance_while(&mut self, f: impl Fn(char) -> bool) {
        while !self.is_eof() && f(self.peek()) {
            self.advance();
        }
    }
}

/// Splits Apex source into tokens, dropping whitespace and comments.
pub struct Lexer<'a> {
    source: &'a str,
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            cursor: Cursor::new(source),
        }
    }

    /// Tokenizes the whole input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.trivia()?;
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match (self.cursor.peek(), self.cursor.second()) {
                ('/', '/') => self.cursor.advance_while(|c| c != '\n'),
                ('/', '*') => {
                    let span = self.cursor.span();
                    self.cursor.advance();
                    self.cursor.advance();
                    loop {
                        if self.cursor.is_eof() {
                            return Err(ParseError::new("unterminated block comment", span));
                        }
                        if self.cursor.peek() == '*' && self.cursor.second() == '/' {
                            self.cursor.advance();
                            self.cursor.advance();
                            break;
                        }
                        self.cursor.advance();
                    }
                }
                (c, _) if c.is_whitespace() && !self.cursor.is_eof() => {
                    self.cursor.advance_while(char::is_whitespace)
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        let start = self.cursor.offset;
        let span = self.cursor.span();

        if self.cursor.is_eof() {
            return Ok(self.token(TokenKind::Eof, start, span));
        }

        let kind = match self.cursor.advance() {
            'A'..='Z' | 'a'..='z' | '_' => {
                self.cursor
                    .advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
                TokenKind::Ident
            }
            '0'..='9' => {
                self.number();
                TokenKind::Number
            }
            '\'' => {
                self.string(span)?;
                TokenKind::String
            }
            first => {
                let rest = &self.source[start..];
                let punct = PUNCTUATION
                    .iter()
                    .find(|p| rest.starts_with(**p))
                    .ok_or_else(|| ParseError::new(format!("unexpected character `{}`", first), span))?;
                for _ in 1..punct.len() {
                    self.cursor.advance();
                }
                TokenKind::Punct
            }
        };

        Ok(self.token(kind, start, span))
    }

    fn number(&mut self) {
        self.cursor.advance_while(|c| c.is_ascii_digit());
        if self.cursor.peek() == '.' && self.cursor.second().is_ascii_digit() {
            self.cursor.advance();
            self.cursor.advance_while(|c| c.is_ascii_digit());
        }
        if matches!(self.cursor.peek(), 'l' | 'L' | 'd' | 'D') {
            self.cursor.advance();
        }
    }

    fn string(&mut self, span: Span) -> Result<(), ParseError> {
        loop {
            match self.cursor.advance() {
                '\\' => {
                    self.cursor.advance();
                }
                '\'' => return Ok(()),
                '\n' => return Err(ParseError::new("unterminated string literal", span)),
                EOF_CHAR if self.cursor.is_eof() => {
                    return Err(ParseError::new("unterminated string literal", span))
                }
                _ => {}
            }
        }
    }

    fn token(&self, kind: TokenKind, start: usize, span: Span) -> Token {
        let end = self.cursor.offset;
        Token {
            kind,
            text: self.source[start..end].to_string(),
            span,
            start,
            end,
        }
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(source).tokenize()
}
