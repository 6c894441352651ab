use gojs_core::ast::{AssignOp, BranchKind, ExprCall, ExprKind, StmtBranch, StmtDefer, StmtReturn};
use gojs_core::error::Error;
use gojs_core::semantic::ObjectKind;
use gojs_core::span::Span;
use gojs_core::types::Type;
use gojs_core::Result;

use crate::context::FunctionLowerer;
use crate::runtime;

impl FunctionLowerer<'_> {
    pub(crate) fn lower_branch(&mut self, stmt: &StmtBranch) -> Result<()> {
        let label = stmt.label.as_ref().map(|label| label.as_str());
        let suffix = label.map(|label| format!(" {}", label)).unwrap_or_default();
        match stmt.kind {
            BranchKind::Break => self.line(format!("break{};", suffix)),
            BranchKind::Continue => {
                // The emitted loops only run their step on the normal path.
                if let Some(post) = self.loops.post_for(label).cloned() {
                    self.lower_stmt(&post, None)?;
                }
                self.line(format!("continue{};", suffix));
            }
            BranchKind::Goto => return self.unsupported("goto"),
            // Consumed when the clause bodies are grouped.
            BranchKind::Fallthrough => {}
        }
        Ok(())
    }

    pub(crate) fn lower_return(&mut self, stmt: &StmtReturn, span: Span) -> Result<()> {
        let mut results = stmt.results.clone();
        if let Some(names) = self.result_names.clone() {
            if !results.is_empty() {
                self.lower_assign(&names, AssignOp::Assign, &results, span)?;
            }
            results = names;
        }

        match results.as_slice() {
            [] => self.line("return;"),
            [single] if self.sig.results.len() > 1 => {
                // A call passing its results through unchanged.
                let text = self.expr(single)?;
                self.line(format!("return {};", text));
            }
            [single] => {
                let text = match self.sig.results.first().cloned() {
                    Some(ty) => self.converted(single, &ty)?,
                    None => self.expr(single)?,
                };
                self.line(format!("return {};", text));
            }
            many => {
                let mut values = Vec::with_capacity(many.len());
                for (i, result) in many.iter().enumerate() {
                    values.push(match self.sig.results.get(i).cloned() {
                        Some(ty) => self.converted(result, &ty)?,
                        None => self.expr(result)?,
                    });
                }
                self.line(format!("return [{}];", values.join(", ")));
            }
        }
        Ok(())
    }

    /// Arguments are evaluated now; the call runs when the function exits.
    pub(crate) fn lower_defer(&mut self, stmt: &StmtDefer, span: Span) -> Result<()> {
        let call = &stmt.call;
        let fun = call.fun.strip_parens();
        if let Some(object) = self.env.object_of(fun) {
            if object.kind == ObjectKind::Builtin {
                if object.name == "recover" {
                    self.line(format!(
                        "{}.push({{ fun: {}, args: [] }});",
                        runtime::DEFERRED,
                        runtime::RECOVER
                    ));
                    return Ok(());
                }
                return self.defer_builtin(call);
            }
        }

        let fun_ty = self.expect_type(fun)?;
        let Type::Signature(sig) = fun_ty.underlying() else {
            return Err(Error::UnsupportedExpr {
                kind: format!("deferred call of {}", fun_ty),
                span,
            });
        };
        let args = self
            .exprs
            .lower_args(&self.env, sig, &call.args, call.ellipsis)?;

        if let ExprKind::Selector(selector) = &fun.kind {
            let is_package = self
                .env
                .object_of(&selector.x)
                .is_some_and(|object| object.kind == ObjectKind::PkgName);
            if !is_package {
                let recv = self.expr(&selector.x)?;
                self.line(format!(
                    "{}.push({{ recv: {}, method: \"{}\", args: [{}] }});",
                    runtime::DEFERRED,
                    recv,
                    selector.sel,
                    args
                ));
                return Ok(());
            }
        }
        let callee = self.expr(&call.fun)?;
        self.line(format!(
            "{}.push({{ fun: {}, args: [{}] }});",
            runtime::DEFERRED,
            callee,
            args
        ));
        Ok(())
    }

    /// Builtins are not values: the deferred record gets a wrapper function
    /// whose parameters receive the eagerly evaluated arguments.
    fn defer_builtin(&mut self, call: &ExprCall) -> Result<()> {
        let mut params = Vec::with_capacity(call.args.len());
        let mut values = Vec::with_capacity(call.args.len());
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            let name = self.fresh("_arg");
            values.push(self.expr(arg)?);
            let ty = self.env.type_of(arg).cloned();
            args.push(self.env.synthetic(name.clone(), ty));
            params.push(name);
        }
        let wrapped = self.env.synthesize(
            ExprKind::Call(ExprCall {
                fun: call.fun.clone(),
                args,
                ellipsis: call.ellipsis,
            }),
            call.fun.span,
            None,
        );
        let body = self.expr(&wrapped)?;
        self.line(format!(
            "{}.push({{ fun: function({}) {{ {}; }}, args: [{}] }});",
            runtime::DEFERRED,
            params.join(", "),
            body,
            values.join(", ")
        ));
        Ok(())
    }
}
