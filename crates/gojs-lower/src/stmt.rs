use gojs_core::ast::{AssignOp, DeclSpec, Stmt, StmtDecl, StmtFor, StmtKind};
use gojs_core::span::Span;
use gojs_core::Result;

use crate::context::{label_prefix, FunctionLowerer};
use crate::runtime;

impl FunctionLowerer<'_> {
    pub(crate) fn lower_stmts<'s>(&mut self, stmts: impl IntoIterator<Item = &'s Stmt>) -> Result<()> {
        for stmt in stmts {
            self.lower_stmt(stmt, None)?;
        }
        Ok(())
    }

    /// Lowers one statement. `label` names the statement when it is the
    /// target of a labeled statement.
    pub(crate) fn lower_stmt(&mut self, stmt: &Stmt, label: Option<&str>) -> Result<()> {
        tracing::trace!("lowering {} statement {}", stmt.kind_name(), stmt.id);
        match &stmt.kind {
            StmtKind::Block(block) => {
                self.line("{");
                self.indented(|this| this.lower_stmts(&block.stmts))?;
                self.line("}");
                Ok(())
            }
            StmtKind::If(stmt_if) => self.lower_if(stmt_if, label),
            StmtKind::Switch(switch) => self.lower_switch(switch, label),
            StmtKind::TypeSwitch(switch) => self.lower_type_switch(switch, label),
            StmtKind::For(stmt_for) => self.lower_for(stmt_for, label),
            StmtKind::Range(range) => self.lower_range(range, stmt.span, label),
            StmtKind::Branch(branch) => self.lower_branch(branch),
            StmtKind::Return(ret) => self.lower_return(ret, stmt.span),
            StmtKind::Defer(defer) => self.lower_defer(defer, stmt.span),
            StmtKind::Expr(expr) => {
                let text = self.expr(expr)?;
                self.line(format!("{};", text));
                Ok(())
            }
            StmtKind::Decl(decl) => self.lower_decl(decl, stmt.span),
            StmtKind::Labeled(labeled) => self.lower_stmt(&labeled.stmt, Some(labeled.label.as_str())),
            StmtKind::Assign(assign) => {
                self.lower_assign(&assign.lhs, assign.op, &assign.rhs, stmt.span)
            }
            StmtKind::IncDec(inc_dec) => self.lower_inc_dec(inc_dec, stmt.span),
            StmtKind::Select(_) => self.unsupported("select"),
            StmtKind::Go(_) => self.unsupported("go"),
            StmtKind::Send(_) => self.unsupported("send"),
            StmtKind::Empty => Ok(()),
        }
    }

    /// Counted loops become `while` loops with the post statement at the end
    /// of the body.
    fn lower_for(&mut self, stmt: &StmtFor, label: Option<&str>) -> Result<()> {
        if let Some(init) = &stmt.init {
            self.lower_stmt(init, None)?;
        }
        let cond = match &stmt.cond {
            Some(cond) => self.expr(cond)?,
            None => "true".to_string(),
        };
        self.line(format!("{}while ({}) {{", label_prefix(label), cond));
        self.loops.push(label, stmt.post.as_deref().cloned());
        let body = self.indented(|this| {
            this.lower_stmts(&stmt.body.stmts)?;
            match &stmt.post {
                Some(post) => this.lower_stmt(post, None),
                None => Ok(()),
            }
        });
        self.loops.pop();
        body?;
        self.line("}");
        Ok(())
    }

    fn lower_decl(&mut self, decl: &StmtDecl, span: Span) -> Result<()> {
        for spec in &decl.specs {
            match spec {
                DeclSpec::Var(spec) if spec.values.is_empty() => {
                    for name in &spec.names {
                        if name.is_blank() {
                            continue;
                        }
                        let ty = self.lhs_type(name)?;
                        let zero = self.exprs.zero_value(&ty);
                        self.assign_to(name, &zero)?;
                    }
                }
                DeclSpec::Var(spec) => {
                    self.lower_assign(&spec.names, AssignOp::Define, &spec.values, span)?;
                }
                DeclSpec::Const(_) => {}
                DeclSpec::Type(spec) => {
                    for line in self.exprs.lower_type_spec(&self.env, spec)? {
                        self.line(line);
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn unsupported(&mut self, kind: &str) -> Result<()> {
        tracing::trace!("emitting runtime stub for unsupported {}", kind);
        self.line(runtime::unsupported_stmt(kind));
        Ok(())
    }
}
