use std::collections::HashMap;

use crate::ast::{
    AssignOp, BinOp, Block, BranchKind, CaseClause, Expr, ExprBinary, ExprCall, ExprIndex,
    ExprKind, ExprLit, ExprSelector, Ident, LitKind, NodeId, Stmt, StmtAssign, StmtBranch,
    StmtIncDec, StmtKind,
};
use crate::semantic::{ConstValue, ObjectId, ObjectKind, TypeInfo};
use crate::span::Span;
use crate::types::{BasicKind, Type};

const BUILTINS: &[&str] = &[
    "append", "cap", "close", "delete", "len", "panic", "print", "println", "recover",
];

/// Builds trees while recording the facts a type checker would have
/// produced for them. Names live in one flat scope; declaring a name again
/// shadows the previous object.
pub struct AstBuilder {
    next_id: u32,
    next_pos: u32,
    info: TypeInfo,
    scope: HashMap<String, ObjectId>,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        let mut this = Self {
            next_id: 0,
            next_pos: 1,
            info: TypeInfo::new(),
            scope: HashMap::new(),
        };
        this.declare("nil", ObjectKind::Nil, Type::untyped_nil());
        this.declare("true", ObjectKind::Const, Type::Basic(BasicKind::UntypedBool));
        this.declare("false", ObjectKind::Const, Type::Basic(BasicKind::UntypedBool));
        for name in BUILTINS {
            this.declare(name, ObjectKind::Builtin, Type::Tuple(Vec::new()));
        }
        this
    }

    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut TypeInfo {
        &mut self.info
    }

    pub fn into_info(self) -> TypeInfo {
        self.info
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Every node gets a distinct, increasing position in file 0.
    fn next_span(&mut self) -> Span {
        let lo = self.next_pos;
        self.next_pos += 1;
        Span::new(0, lo, lo + 1)
    }

    pub fn declare(&mut self, name: &str, kind: ObjectKind, ty: Type) -> ObjectId {
        let id = self.info.new_object(name, kind, ty);
        self.scope.insert(name.to_string(), id);
        id
    }

    pub fn var(&mut self, name: &str, ty: Type) -> ObjectId {
        self.declare(name, ObjectKind::Var, ty)
    }

    pub fn lookup(&self, name: &str) -> Option<ObjectId> {
        self.scope.get(name).copied()
    }

    pub fn expr(&mut self, kind: ExprKind, ty: Option<Type>) -> Expr {
        let id = self.next_id();
        if let Some(ty) = ty {
            self.info.record_type(id, ty);
        }
        Expr::new(id, kind).with_span(self.next_span())
    }

    /// A use of a name declared earlier. Variables and constants get their
    /// object's type recorded on the use, as a type checker would.
    pub fn ident(&mut self, name: &str) -> Expr {
        let expr = self.expr(ExprKind::Ident(Ident::new(name)), None);
        if let Some(object) = self.lookup(name) {
            self.info.bind(expr.id, object);
            let Some(obj) = self.info.object(object).cloned() else {
                return expr;
            };
            match obj.kind {
                ObjectKind::Var | ObjectKind::Const | ObjectKind::Func | ObjectKind::Nil => {
                    self.info.record_type(expr.id, obj.ty);
                }
                ObjectKind::TypeName | ObjectKind::Builtin | ObjectKind::PkgName => {}
            }
            match name {
                "true" => self.info.record_value(expr.id, ConstValue::Bool(true)),
                "false" => self.info.record_value(expr.id, ConstValue::Bool(false)),
                _ => {}
            }
        }
        expr
    }

    /// Declares a variable and returns its defining identifier. Like a type
    /// checker, no expression type is recorded on a definition.
    pub fn define(&mut self, name: &str, ty: Type) -> Expr {
        let object = self.var(name, ty);
        let expr = self.expr(ExprKind::Ident(Ident::new(name)), None);
        self.info.bind(expr.id, object);
        expr
    }

    pub fn blank(&mut self) -> Expr {
        self.expr(ExprKind::Ident(Ident::new("_")), None)
    }

    pub fn nil(&mut self) -> Expr {
        self.ident("nil")
    }

    pub fn int(&mut self, value: i64) -> Expr {
        self.typed_int(value, Type::int())
    }

    pub fn typed_int(&mut self, value: i64, ty: Type) -> Expr {
        let expr = self.expr(
            ExprKind::Lit(ExprLit {
                kind: LitKind::Int,
                value: value.to_string(),
            }),
            Some(ty),
        );
        self.info.record_value(expr.id, ConstValue::Int(value));
        expr
    }

    pub fn string(&mut self, value: &str) -> Expr {
        let expr = self.expr(
            ExprKind::Lit(ExprLit {
                kind: LitKind::String,
                value: format!("{:?}", value),
            }),
            Some(Type::string()),
        );
        self.info
            .record_value(expr.id, ConstValue::String(value.to_string()));
        expr
    }

    /// A type used in expression position, such as a type-switch case or the
    /// callee of a conversion.
    pub fn type_expr(&mut self, ty: Type) -> Expr {
        let name = ty.to_string();
        let object = self.info.new_object(&name, ObjectKind::TypeName, ty.clone());
        let expr = self.expr(ExprKind::Ident(Ident::new(name)), Some(ty));
        self.info.bind(expr.id, object);
        expr
    }

    pub fn package(&mut self, name: &str) -> Expr {
        if self.lookup(name).is_none() {
            self.declare(name, ObjectKind::PkgName, Type::Tuple(Vec::new()));
        }
        self.ident(name)
    }

    pub fn paren(&mut self, x: Expr) -> Expr {
        let ty = self.info_type(&x);
        self.expr(ExprKind::Paren(Box::new(x)), ty)
    }

    pub fn binary(&mut self, op: BinOp, x: Expr, y: Expr) -> Expr {
        let ty = if op.is_comparison() || matches!(op, BinOp::LAnd | BinOp::LOr) {
            Some(Type::bool())
        } else {
            self.info_type(&x)
        };
        self.expr(
            ExprKind::Binary(ExprBinary {
                op,
                x: Box::new(x),
                y: Box::new(y),
            }),
            ty,
        )
    }

    pub fn selector(&mut self, x: Expr, field: &str, ty: Type) -> Expr {
        self.expr(
            ExprKind::Selector(ExprSelector {
                x: Box::new(x),
                sel: Ident::new(field),
            }),
            Some(ty),
        )
    }

    pub fn index(&mut self, x: Expr, index: Expr, ty: Type) -> Expr {
        self.expr(
            ExprKind::Index(ExprIndex {
                x: Box::new(x),
                index: Box::new(index),
            }),
            Some(ty),
        )
    }

    pub fn star(&mut self, x: Expr, ty: Type) -> Expr {
        self.expr(ExprKind::Star(Box::new(x)), Some(ty))
    }

    pub fn call(&mut self, fun: Expr, args: Vec<Expr>, ty: Type) -> Expr {
        self.expr(
            ExprKind::Call(ExprCall {
                fun: Box::new(fun),
                args,
                ellipsis: false,
            }),
            Some(ty),
        )
    }

    pub fn call_of(&mut self, fun: Expr, args: Vec<Expr>) -> ExprCall {
        ExprCall {
            fun: Box::new(fun),
            args,
            ellipsis: false,
        }
    }

    fn info_type(&self, expr: &Expr) -> Option<Type> {
        use crate::semantic::SemanticModel;
        self.info.type_of(expr.id).cloned()
    }

    pub fn stmt(&mut self, kind: StmtKind) -> Stmt {
        let id = self.next_id();
        Stmt::new(id, kind).with_span(self.next_span())
    }

    pub fn expr_stmt(&mut self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn assign(&mut self, lhs: Vec<Expr>, op: AssignOp, rhs: Vec<Expr>) -> Stmt {
        self.stmt(StmtKind::Assign(StmtAssign { lhs, op, rhs }))
    }

    pub fn block(&mut self, stmts: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::Block(Block::new(stmts)))
    }

    pub fn branch(&mut self, kind: BranchKind, label: Option<&str>) -> Stmt {
        self.stmt(StmtKind::Branch(StmtBranch {
            kind,
            label: label.map(Ident::new),
        }))
    }

    pub fn inc(&mut self, x: Expr) -> Stmt {
        self.stmt(StmtKind::IncDec(StmtIncDec { x, inc: true }))
    }

    pub fn dec(&mut self, x: Expr) -> Stmt {
        self.stmt(StmtKind::IncDec(StmtIncDec { x, inc: false }))
    }

    pub fn clause(&mut self, list: Vec<Expr>, body: Vec<Stmt>) -> CaseClause {
        let id = self.next_id();
        let span = self.next_span();
        CaseClause {
            id,
            span,
            list,
            body,
        }
    }

    /// Records the implicit object a type-switch binding takes in `clause`.
    pub fn implicit(&mut self, clause: &CaseClause, name: &str, ty: Type) -> ObjectId {
        let object = self.info.new_object(name, ObjectKind::Var, ty);
        self.info.record_implicit(clause.id, object);
        object
    }

    /// A use of an implicit type-switch object inside its clause body.
    pub fn implicit_use(&mut self, object: ObjectId) -> Expr {
        let Some(obj) = self.info.object(object).cloned() else {
            return self.blank();
        };
        let expr = self.expr(ExprKind::Ident(Ident::new(&obj.name)), Some(obj.ty));
        self.info.bind(expr.id, object);
        expr
    }
}
