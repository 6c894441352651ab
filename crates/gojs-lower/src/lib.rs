//! Statement lowering: turns type-checked function bodies into JavaScript
//! statements that call into the `Go$` runtime support library.

use gojs_core::ast::FuncBody;
use gojs_core::config::LowerConfig;
use gojs_core::{Result, SemanticModel};

mod assign;
mod branching;
mod context;
mod control;
mod env;
pub mod expr;
pub mod names;
mod range;
pub mod runtime;
mod stmt;
mod writer;

pub use env::Env;
pub use expr::{ExprLowering, JsExprLowering};
pub use names::NameAllocator;
pub use writer::CodeWriter;

use context::FunctionLowerer;

/// Emitted statements of one function body together with the synthetic
/// variables they use. The caller declares `locals` once at the top of the
/// function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredBody {
    pub code: String,
    pub locals: Vec<String>,
}

impl LoweredBody {
    pub fn var_declaration(&self) -> Option<String> {
        if self.locals.is_empty() {
            None
        } else {
            Some(format!("var {};", self.locals.join(", ")))
        }
    }

    /// Declaration of the locals followed by the code.
    pub fn render(&self, config: &LowerConfig) -> String {
        match (self.var_declaration(), self.code.is_empty()) {
            (Some(decl), true) => decl,
            (Some(decl), false) => format!("{}{}{}", decl, config.line_ending, self.code),
            (None, _) => self.code.clone(),
        }
    }
}

/// Lowers the body of one function.
pub fn lower_function<'a>(
    model: &'a dyn SemanticModel,
    exprs: &'a mut dyn ExprLowering,
    func: &FuncBody,
    config: &'a LowerConfig,
) -> Result<LoweredBody> {
    tracing::debug!(
        "lowering function body with {} statements",
        func.body.stmts.len()
    );
    lower_body(Env::new(model, config), exprs, func)
}

/// Lowers the body of a function literal nested in the function `parent`
/// belongs to.
pub fn lower_closure<'a>(
    parent: &Env<'a>,
    exprs: &'a mut dyn ExprLowering,
    func: &FuncBody,
) -> Result<LoweredBody> {
    tracing::trace!(
        "lowering function literal with {} statements",
        func.body.stmts.len()
    );
    lower_body(parent.child(), exprs, func)
}

fn lower_body<'a>(
    env: Env<'a>,
    exprs: &'a mut dyn ExprLowering,
    func: &FuncBody,
) -> Result<LoweredBody> {
    let mut lowerer = FunctionLowerer::new(env, exprs, func);
    lowerer.lower_stmts(&func.body.stmts)?;
    Ok(lowerer.finish())
}
