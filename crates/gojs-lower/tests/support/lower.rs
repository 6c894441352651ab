use gojs_core::ast::{AstBuilder, Block, FuncBody, Stmt};
use gojs_core::config::LowerConfig;
use gojs_core::semantic::ObjectKind;
use gojs_core::types::{Signature, Type};
use gojs_core::Result;
use gojs_lower::{lower_function, JsExprLowering, LoweredBody};

/// A function without parameters or results around `stmts`.
pub fn func(stmts: Vec<Stmt>) -> FuncBody {
    FuncBody::new(Signature::new(vec![], vec![]), Block::new(stmts))
}

pub fn try_lower_with(b: AstBuilder, func: &FuncBody, config: &LowerConfig) -> Result<LoweredBody> {
    let info = b.into_info();
    let mut exprs = JsExprLowering::new();
    lower_function(&info, &mut exprs, func, config)
}

pub fn try_lower(b: AstBuilder, func: &FuncBody) -> Result<LoweredBody> {
    try_lower_with(b, func, &LowerConfig::default())
}

pub fn lower(b: AstBuilder, func: &FuncBody) -> LoweredBody {
    try_lower(b, func).expect("lowering failed")
}

/// Emitted code of a plain function around `stmts`.
pub fn lower_stmts(b: AstBuilder, stmts: Vec<Stmt>) -> String {
    lower(b, &func(stmts)).code
}

/// Declares a function without results taking `params`.
pub fn declare_func(b: &mut AstBuilder, name: &str, params: Vec<Type>) {
    b.declare(name, ObjectKind::Func, Type::signature(params, vec![]));
}

/// `name(args)` as a statement.
pub fn call_stmt(b: &mut AstBuilder, name: &str, args: Vec<gojs_core::ast::Expr>) -> Stmt {
    let fun = b.ident(name);
    let call = b.call(fun, args, Type::Tuple(vec![]));
    b.expr_stmt(call)
}
