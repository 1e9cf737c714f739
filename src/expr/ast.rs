#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(String),
    Ident(String),
    /// Already-compiled GLSL spliced in by substitution.
    Bound(String),
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Member {
        base: Box<Expr>,
        field: String,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

impl UnaryOp {
    pub fn glsl(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn glsl(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    /// Binding strength; higher binds tighter. All binary operators are left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 2,
            BinaryOp::And => 3,
            BinaryOp::Eq | BinaryOp::Ne => 4,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 5,
            BinaryOp::Add | BinaryOp::Sub => 6,
            BinaryOp::Mul | BinaryOp::Div => 7,
        }
    }
}

pub const TERNARY_PRECEDENCE: u8 = 1;
pub const UNARY_PRECEDENCE: u8 = 8;
pub const POSTFIX_PRECEDENCE: u8 = 9;

impl Expr {
    pub fn precedence(&self) -> u8 {
        match self {
            Expr::Ternary { .. } => TERNARY_PRECEDENCE,
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { .. } => UNARY_PRECEDENCE,
            // Bound text is parenthesised by the printer unless it is atomic.
            Expr::Number(_) | Expr::Ident(_) | Expr::Bound(_) | Expr::Call { .. } | Expr::Member { .. } => {
                POSTFIX_PRECEDENCE
            }
        }
    }

    /// Identifiers that are read as values (not callees or swizzle fields), in first-use order.
    pub fn free_identifiers(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers(&self, out: &mut Vec<String>) {
        match self {
            Expr::Ident(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Expr::Number(_) | Expr::Bound(_) => {}
            Expr::Call { args, .. } => args.iter().for_each(|a| a.collect_identifiers(out)),
            Expr::Member { base, .. } => base.collect_identifiers(out),
            Expr::Unary { operand, .. } => operand.collect_identifiers(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_identifiers(out);
                rhs.collect_identifiers(out);
            }
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                cond.collect_identifiers(out);
                then.collect_identifiers(out);
                otherwise.collect_identifiers(out);
            }
        }
    }
}
