use super::ExprError;
use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{Token, TokenKind};

/// Nesting limit for pasted text; deeper input is rejected rather than recursed into.
const MAX_DEPTH: usize = 128;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Expr, ExprError> {
        if self.peek_kind() == &TokenKind::Eof {
            return Err(self.error("empty expression"));
        }
        let expr = self.parse_ternary()?;
        if self.peek_kind() != &TokenKind::Eof {
            return Err(self.error(format!("unexpected '{}'", self.peek_kind())));
        }
        Ok(expr)
    }

    fn peek(&self) -> &Token {
        // The lexer always terminates the stream with Eof.
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> ExprError {
        ExprError::Parse {
            message: message.into(),
            column: self.peek().column,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ExprError> {
        if self.peek_kind() == &kind {
            Ok(self.advance())
        } else {
            Err(self.error(format!(
                "expected '{kind}', found '{}'",
                self.peek_kind()
            )))
        }
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("expression nests too deeply"));
        }
        Ok(())
    }

    fn parse_ternary(&mut self) -> Result<Expr, ExprError> {
        self.enter()?;
        let cond = self.parse_binary(2)?;
        let expr = if self.peek_kind() == &TokenKind::Question {
            self.advance();
            let then = self.parse_ternary()?;
            self.expect(TokenKind::Colon)?;
            let otherwise = self.parse_ternary()?;
            Expr::Ternary {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            }
        } else {
            cond
        };
        self.depth -= 1;
        Ok(expr)
    }

    fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
        Some(match kind {
            TokenKind::OrOr => BinaryOp::Or,
            TokenKind::AndAnd => BinaryOp::And,
            TokenKind::EqualEqual => BinaryOp::Eq,
            TokenKind::BangEqual => BinaryOp::Ne,
            TokenKind::Less => BinaryOp::Lt,
            TokenKind::LessEqual => BinaryOp::Le,
            TokenKind::Greater => BinaryOp::Gt,
            TokenKind::GreaterEqual => BinaryOp::Ge,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            _ => return None,
        })
    }

    /// Precedence climbing over left-associative binary operators.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_unary()?;
        while let Some(op) = Self::binary_op(self.peek_kind()) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(prec + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek_kind() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;
        while self.peek_kind() == &TokenKind::Dot {
            self.advance();
            match self.advance().kind {
                TokenKind::Identifier(field) => {
                    expr = Expr::Member {
                        base: Box::new(expr),
                        field,
                    };
                }
                other => {
                    return Err(ExprError::Parse {
                        message: format!("expected field name after '.', found '{other}'"),
                        column: self.tokens[self.pos - 1].column,
                    });
                }
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::Identifier(name) => {
                if self.peek_kind() != &TokenKind::LeftParen {
                    return Ok(Expr::Ident(name));
                }
                self.advance();
                let mut args = Vec::new();
                if self.peek_kind() != &TokenKind::RightParen {
                    loop {
                        args.push(self.parse_ternary()?);
                        if self.peek_kind() == &TokenKind::Comma {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RightParen)?;
                Ok(Expr::Call { callee: name, args })
            }
            TokenKind::LeftParen => {
                let inner = self.parse_ternary()?;
                self.expect(TokenKind::RightParen)?;
                Ok(inner)
            }
            other => Err(ExprError::Parse {
                message: format!("unexpected '{other}'"),
                column: token.column,
            }),
        }
    }
}
