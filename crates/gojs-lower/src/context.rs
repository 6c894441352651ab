use gojs_core::ast::{Expr, FuncBody, Stmt};
use gojs_core::config::LowerConfig;
use gojs_core::error::Error;
use gojs_core::types::{Signature, Type};
use gojs_core::Result;

use crate::env::Env;
use crate::expr::ExprLowering;
use crate::names::{collect_source_names, mangle, NameAllocator};
use crate::writer::CodeWriter;
use crate::LoweredBody;

struct LoopFrame {
    label: Option<String>,
    post: Option<Stmt>,
}

/// Enclosing loops, innermost last. Counted loops carry their post
/// statement so `continue` can run it before jumping.
#[derive(Default)]
pub(crate) struct LoopStack {
    frames: Vec<LoopFrame>,
}

impl LoopStack {
    pub fn push(&mut self, label: Option<&str>, post: Option<Stmt>) {
        self.frames.push(LoopFrame {
            label: label.map(str::to_string),
            post,
        });
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Post statement of the loop a `continue` with `label` resumes.
    pub fn post_for(&self, label: Option<&str>) -> Option<&Stmt> {
        let frame = match label {
            None => self.frames.last(),
            Some(label) => self
                .frames
                .iter()
                .rev()
                .find(|frame| frame.label.as_deref() == Some(label)),
        };
        frame.and_then(|frame| frame.post.as_ref())
    }
}

/// State of one function body lowering.
pub(crate) struct FunctionLowerer<'a> {
    pub env: Env<'a>,
    pub exprs: &'a mut dyn ExprLowering,
    pub out: CodeWriter,
    pub names: NameAllocator,
    pub loops: LoopStack,
    pub sig: Signature,
    pub result_names: Option<Vec<Expr>>,
}

impl<'a> FunctionLowerer<'a> {
    pub fn new(env: Env<'a>, exprs: &'a mut dyn ExprLowering, func: &FuncBody) -> Self {
        let mut names = NameAllocator::new();
        for name in collect_source_names(env.model(), func) {
            names.reserve(name);
        }
        for name in env.narrowed_names() {
            names.reserve(name);
        }
        let out = CodeWriter::new(env.config().indent.clone());
        Self {
            env,
            exprs,
            out,
            names,
            loops: LoopStack::default(),
            sig: func.sig.clone(),
            result_names: func.results.clone(),
        }
    }

    pub fn finish(self) -> LoweredBody {
        LoweredBody {
            code: self.out.finish(&self.env.config().line_ending),
            locals: self.names.into_allocated(),
        }
    }

    pub fn config(&self) -> &'a LowerConfig {
        self.env.config()
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        self.out.line(text);
    }

    /// Runs `f` one indentation level deeper.
    pub fn indented<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.out.indent();
        let result = f(self);
        self.out.dedent();
        result
    }

    pub fn fresh(&mut self, prefix: &str) -> String {
        self.names.fresh(&mangle(prefix))
    }

    pub fn expr(&mut self, expr: &Expr) -> Result<String> {
        self.exprs.lower(&self.env, expr)
    }

    pub fn converted(&mut self, expr: &Expr, target: &Type) -> Result<String> {
        self.exprs.lower_converted(&self.env, expr, target)
    }

    pub fn expect_type(&self, expr: &Expr) -> Result<Type> {
        self.env.expect_type(expr).cloned()
    }

    /// Type an assignment target expects; defining identifiers fall back to
    /// their object's type.
    pub fn lhs_type(&self, expr: &Expr) -> Result<Type> {
        self.env
            .type_or_object_type(expr)
            .cloned()
            .ok_or(Error::MissingType {
                node: expr.id,
                span: expr.span,
            })
    }
}

pub(crate) fn label_prefix(label: Option<&str>) -> String {
    label.map(|label| format!("{}: ", label)).unwrap_or_default()
}
