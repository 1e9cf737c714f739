use std::fmt;

use super::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    /// Numeric literal, kept as written.
    Number(String),

    LeftParen,
    RightParen,
    Comma,
    Dot,
    Question,
    Colon,

    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    EqualEqual,
    BangEqual,
    AndAnd,
    OrOr,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(s) => write!(f, "{s}"),
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Question => write!(f, "?"),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::Less => write!(f, "<"),
            TokenKind::LessEqual => write!(f, "<="),
            TokenKind::Greater => write!(f, ">"),
            TokenKind::GreaterEqual => write!(f, ">="),
            TokenKind::EqualEqual => write!(f, "=="),
            TokenKind::BangEqual => write!(f, "!="),
            TokenKind::AndAnd => write!(f, "&&"),
            TokenKind::OrOr => write!(f, "||"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based column of the first character.
    pub column: usize,
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, ExprError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ExprError> {
        self.skip_whitespace();
        let column = self.pos + 1;
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                column,
            });
        };

        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(Token {
                kind: TokenKind::Identifier(self.read_identifier()),
                column,
            });
        }
        if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
            return Ok(Token {
                kind: TokenKind::Number(self.read_number(column)?),
                column,
            });
        }

        self.bump();
        let two = |lexer: &mut Self, next: char, double: TokenKind, single: TokenKind| {
            if lexer.peek() == Some(next) {
                lexer.bump();
                double
            } else {
                single
            }
        };
        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '<' => two(self, '=', TokenKind::LessEqual, TokenKind::Less),
            '>' => two(self, '=', TokenKind::GreaterEqual, TokenKind::Greater),
            '!' => two(self, '=', TokenKind::BangEqual, TokenKind::Bang),
            '=' if self.peek() == Some('=') => {
                self.bump();
                TokenKind::EqualEqual
            }
            '&' if self.peek() == Some('&') => {
                self.bump();
                TokenKind::AndAnd
            }
            '|' if self.peek() == Some('|') => {
                self.bump();
                TokenKind::OrOr
            }
            other => {
                return Err(ExprError::Lex {
                    message: format!("unexpected character '{other}'"),
                    column,
                });
            }
        };
        Ok(Token { kind, column })
    }

    fn read_identifier(&mut self) -> String {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                s.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        s
    }

    fn read_number(&mut self, column: usize) -> Result<String, ExprError> {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                s.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            s.push('e');
            self.pos += 1;
            if let Some(sign @ ('+' | '-')) = self.peek() {
                s.push(sign);
                self.pos += 1;
            }
            let digits_start = s.len();
            while let Some(c) = self.peek().filter(|c| c.is_ascii_digit()) {
                s.push(c);
                self.pos += 1;
            }
            if s.len() == digits_start {
                return Err(ExprError::Lex {
                    message: format!("malformed exponent in '{s}'"),
                    column,
                });
            }
        }
        // GLSL float suffix.
        if matches!(self.peek(), Some('f' | 'F')) {
            self.pos += 1;
        }
        if s.matches('.').count() > 1 {
            return Err(ExprError::Lex {
                message: format!("malformed number '{s}'"),
                column,
            });
        }
        Ok(s)
    }
}
