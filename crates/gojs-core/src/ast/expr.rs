use std::fmt::{Display, Formatter};

use crate::ast::{FuncBody, Ident, NodeId};
use crate::span::Span;

pub type BExpr = Box<Expr>;

common_struct! {
    pub struct Expr {
        pub id: NodeId,
        #[serde(default)]
        pub span: Span,
        pub kind: ExprKind,
    }
}

common_enum! {
    pub enum ExprKind {
        Ident(Ident),
        Lit(ExprLit),
        Paren(BExpr),
        Selector(ExprSelector),
        Index(ExprIndex),
        Star(BExpr),
        Unary(ExprUnary),
        Binary(ExprBinary),
        Call(ExprCall),
        TypeAssert(ExprTypeAssert),
        FuncLit(ExprFuncLit),
        /// Target text produced during lowering (a temporary or a register
        /// slot); never produced by a parser.
        Synthetic(String),
    }
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind) -> Self {
        Self {
            id,
            span: Span::null(),
            kind,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Removes any number of enclosing parentheses.
    pub fn strip_parens(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Paren(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }

    /// `_` as an assignment target.
    pub fn is_blank(&self) -> bool {
        matches!(&self.strip_parens().kind, ExprKind::Ident(ident) if ident.is_blank())
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Ident(_) => "identifier",
            ExprKind::Lit(_) => "literal",
            ExprKind::Paren(_) => "parenthesized expression",
            ExprKind::Selector(_) => "selector",
            ExprKind::Index(_) => "index expression",
            ExprKind::Star(_) => "dereference",
            ExprKind::Unary(_) => "unary expression",
            ExprKind::Binary(_) => "binary expression",
            ExprKind::Call(_) => "call",
            ExprKind::TypeAssert(_) => "type assertion",
            ExprKind::FuncLit(_) => "function literal",
            ExprKind::Synthetic(_) => "synthetic expression",
        }
    }
}

common_enum! {
    #[derive(Copy, Eq)]
    pub enum LitKind {
        Int,
        Float,
        Imag,
        Char,
        String,
    }
}

common_struct! {
    pub struct ExprLit {
        pub kind: LitKind,
        /// Source spelling of the literal.
        pub value: String,
    }
}

impl ExprLit {
    pub fn int(value: impl Into<String>) -> Self {
        Self {
            kind: LitKind::Int,
            value: value.into(),
        }
    }
}

common_struct! {
    pub struct ExprSelector {
        pub x: BExpr,
        pub sel: Ident,
    }
}

common_struct! {
    pub struct ExprIndex {
        pub x: BExpr,
        pub index: BExpr,
    }
}

common_enum! {
    #[derive(Copy, Eq)]
    pub enum UnOp {
        Neg,
        Plus,
        Not,
        /// Bitwise complement, `^x`.
        Complement,
        /// Address-of, `&x`.
        Addr,
    }
}

common_struct! {
    pub struct ExprUnary {
        pub op: UnOp,
        pub x: BExpr,
    }
}

common_enum! {
    #[derive(Copy, Eq, Hash)]
    pub enum BinOp {
        Add,
        Sub,
        Mul,
        Quo,
        Rem,
        And,
        Or,
        Xor,
        Shl,
        Shr,
        AndNot,
        LAnd,
        LOr,
        Eql,
        Neq,
        Lss,
        Leq,
        Gtr,
        Geq,
    }
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eql | BinOp::Neq | BinOp::Lss | BinOp::Leq | BinOp::Gtr | BinOp::Geq
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Quo => "/",
            BinOp::Rem => "%",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::AndNot => "&^",
            BinOp::LAnd => "&&",
            BinOp::LOr => "||",
            BinOp::Eql => "==",
            BinOp::Neq => "!=",
            BinOp::Lss => "<",
            BinOp::Leq => "<=",
            BinOp::Gtr => ">",
            BinOp::Geq => ">=",
        }
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

common_struct! {
    pub struct ExprBinary {
        pub op: BinOp,
        pub x: BExpr,
        pub y: BExpr,
    }
}

common_struct! {
    pub struct ExprCall {
        pub fun: BExpr,
        pub args: Vec<Expr>,
        /// `f(xs...)`
        #[serde(default)]
        pub ellipsis: bool,
    }
}

common_struct! {
    pub struct ExprTypeAssert {
        pub x: BExpr,
        /// `None` for the `x.(type)` guard of a type switch.
        pub ty: Option<BExpr>,
    }
}

common_struct! {
    pub struct ExprFuncLit {
        pub func: Box<FuncBody>,
    }
}
