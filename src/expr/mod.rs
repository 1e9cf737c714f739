//! Expression AST used by the `Expr` node.
//!
//! User text is parsed, identifiers naming the node's inputs are replaced by
//! the resolved upstream expressions, and the tree is printed back as GLSL.
//! Substitution works on whole identifier tokens, so `a` never touches `ab`,
//! a callee named `a`, or a swizzle field `.a`.

pub mod ast;
pub mod lexer;
pub mod parser;

use std::collections::HashMap;

use thiserror::Error;

pub use ast::Expr;
use ast::{POSTFIX_PRECEDENCE, TERNARY_PRECEDENCE, UNARY_PRECEDENCE};
use lexer::Lexer;
use parser::Parser;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("{message} at column {column}")]
    Lex { message: String, column: usize },
    #[error("{message} at column {column}")]
    Parse { message: String, column: usize },
}

pub fn parse(src: &str) -> Result<Expr, ExprError> {
    let tokens = Lexer::new(src).tokenize()?;
    Parser::new(tokens).parse()
}

/// Replace free identifiers found in `bindings` with their bound GLSL text.
pub fn substitute(expr: &Expr, bindings: &HashMap<String, String>) -> Expr {
    match expr {
        Expr::Ident(name) => match bindings.get(name) {
            Some(text) => Expr::Bound(text.clone()),
            None => Expr::Ident(name.clone()),
        },
        Expr::Number(_) | Expr::Bound(_) => expr.clone(),
        Expr::Call { callee, args } => Expr::Call {
            callee: callee.clone(),
            args: args.iter().map(|a| substitute(a, bindings)).collect(),
        },
        Expr::Member { base, field } => Expr::Member {
            base: Box::new(substitute(base, bindings)),
            field: field.clone(),
        },
        Expr::Unary { op, operand } => Expr::Unary {
            op: *op,
            operand: Box::new(substitute(operand, bindings)),
        },
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: Box::new(substitute(lhs, bindings)),
            rhs: Box::new(substitute(rhs, bindings)),
        },
        Expr::Ternary {
            cond,
            then,
            otherwise,
        } => Expr::Ternary {
            cond: Box::new(substitute(cond, bindings)),
            then: Box::new(substitute(then, bindings)),
            otherwise: Box::new(substitute(otherwise, bindings)),
        },
    }
}

/// Print as GLSL with only the parentheses precedence requires.
pub fn print(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(expr, 0, &mut out);
    out
}

/// Parse, substitute and print in one go.
pub fn compile_expression(
    src: &str,
    bindings: &HashMap<String, String>,
) -> Result<String, ExprError> {
    let parsed = parse(src)?;
    Ok(print(&substitute(&parsed, bindings)))
}

fn write_expr(expr: &Expr, min_prec: u8, out: &mut String) {
    let wrap = expr.precedence() < min_prec;
    if wrap {
        out.push('(');
    }
    match expr {
        Expr::Number(n) => out.push_str(&float_literal(n)),
        Expr::Ident(name) => out.push_str(name),
        Expr::Bound(text) => {
            if is_atomic(text) {
                out.push_str(text);
            } else {
                out.push('(');
                out.push_str(text);
                out.push(')');
            }
        }
        Expr::Call { callee, args } => {
            out.push_str(callee);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(arg, 0, out);
            }
            out.push(')');
        }
        Expr::Member { base, field } => {
            write_expr(base, POSTFIX_PRECEDENCE, out);
            out.push('.');
            out.push_str(field);
        }
        Expr::Unary { op, operand } => {
            out.push_str(op.glsl());
            // Nested unary operands are parenthesised so `- -x` never prints as `--x`.
            write_expr(operand, UNARY_PRECEDENCE + 1, out);
        }
        Expr::Binary { op, lhs, rhs } => {
            let prec = op.precedence();
            write_expr(lhs, prec, out);
            out.push(' ');
            out.push_str(op.glsl());
            out.push(' ');
            write_expr(rhs, prec + 1, out);
        }
        Expr::Ternary {
            cond,
            then,
            otherwise,
        } => {
            write_expr(cond, TERNARY_PRECEDENCE + 1, out);
            out.push_str(" ? ");
            write_expr(then, TERNARY_PRECEDENCE, out);
            out.push_str(" : ");
            write_expr(otherwise, TERNARY_PRECEDENCE, out);
        }
    }
    if wrap {
        out.push(')');
    }
}

/// Integer literals become floats; GLSL ES does not promote `2` to `2.0`.
fn float_literal(n: &str) -> String {
    if n.contains(['.', 'e', 'E']) {
        n.to_string()
    } else {
        format!("{n}.0")
    }
}

/// Identifiers, numbers and member chains need no parentheses when spliced.
fn is_atomic(text: &str) -> bool {
    !text.is_empty()
        && !text.starts_with('.')
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}
