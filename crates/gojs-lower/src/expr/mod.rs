//! The expression-lowering seam the statement engine composes around.

use gojs_core::ast::{Expr, TypeSpec};
use gojs_core::semantic::Object;
use gojs_core::types::{Signature, Type};
use gojs_core::Result;

use crate::env::Env;
use crate::names::mangle;

mod js;

pub use js::JsExprLowering;

pub trait ExprLowering {
    /// Target text of `expr`, without any representation conversion.
    fn lower(&mut self, env: &Env<'_>, expr: &Expr) -> Result<String>;

    /// Target text of `expr` converted to the representation of `target`;
    /// struct and array values come back as fresh copies.
    fn lower_converted(&mut self, env: &Env<'_>, expr: &Expr, target: &Type) -> Result<String>;

    /// Comma separated call arguments, variadic packing included.
    fn lower_args(
        &mut self,
        env: &Env<'_>,
        sig: &Signature,
        args: &[Expr],
        ellipsis: bool,
    ) -> Result<String>;

    /// Condition that holds when the dynamic type stored in `type_var`
    /// matches `ty`.
    fn type_check(&self, type_var: &str, ty: &Type) -> String;

    fn object_name(&self, env: &Env<'_>, object: &Object) -> String {
        env.narrowed_name(object.id)
            .map(str::to_string)
            .unwrap_or_else(|| mangle(&object.name))
    }

    fn zero_value(&self, ty: &Type) -> String;

    /// Statements for a local type declaration.
    fn lower_type_spec(&mut self, _env: &Env<'_>, _spec: &TypeSpec) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
