//! `if` chains, expression switches and type switches share one lowering:
//! a chain of conditionals over fallthrough-expanded clause bodies, wrapped
//! in a one-shot `switch` when a `break` needs a target.

use gojs_core::ast::{
    BinOp, BranchKind, CaseClause, Expr, ExprBinary, ExprKind, Stmt, StmtIf, StmtKind,
    StmtSwitch, StmtTypeSwitch,
};
use gojs_core::error::Error;
use gojs_core::types::Type;
use gojs_core::Result;

use crate::context::{label_prefix, FunctionLowerer};
use crate::runtime;

/// One arm: an empty condition list marks the unconditional arm.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Clause<'s> {
    pub conds: &'s [Expr],
    pub body: &'s [Stmt],
}

impl<'s> From<&'s CaseClause> for Clause<'s> {
    fn from(clause: &'s CaseClause) -> Self {
        Clause {
            conds: &clause.list,
            body: &clause.body,
        }
    }
}

/// How the conditions of a clause are turned into target conditions.
pub(crate) enum ClauseTest {
    /// Conditions are boolean expressions.
    Plain,
    /// Conditions are compared against the evaluated switch tag.
    Tag(Expr),
    /// Conditions are types checked against the subject's dynamic type.
    Type {
        ref_var: String,
        type_var: String,
        bind: Option<String>,
    },
}

/// Bodies executed per clause once fallthrough is expanded: a clause stays
/// open, collecting the following bodies, until a body does not end in
/// `fallthrough`.
pub(crate) fn case_groups<'s>(clauses: &[Clause<'s>]) -> Vec<Vec<&'s Stmt>> {
    let mut groups = vec![Vec::new(); clauses.len()];
    let mut open = Vec::new();
    for (i, clause) in clauses.iter().enumerate() {
        open.push(i);
        for &j in &open {
            groups[j].extend(clause.body.iter());
        }
        if !clause.body.last().is_some_and(Stmt::is_fallthrough) {
            open.clear();
        }
    }
    groups
}

/// Whether an unlabeled `break` in `stmts` targets the enclosing switch.
/// Nested loops, switches and selects own their breaks; function literals
/// are expressions and never searched.
pub(crate) fn has_unlabeled_break(stmts: &[Stmt]) -> bool {
    stmts.iter().any(stmt_breaks)
}

fn stmt_breaks(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Branch(branch) => branch.kind == BranchKind::Break && branch.label.is_none(),
        StmtKind::Block(block) => has_unlabeled_break(&block.stmts),
        StmtKind::If(stmt_if) => {
            has_unlabeled_break(&stmt_if.body.stmts)
                || stmt_if.else_branch.as_deref().is_some_and(stmt_breaks)
        }
        StmtKind::Labeled(labeled) => stmt_breaks(&labeled.stmt),
        StmtKind::For(_)
        | StmtKind::Range(_)
        | StmtKind::Switch(_)
        | StmtKind::TypeSwitch(_)
        | StmtKind::Select(_) => false,
        StmtKind::Return(_)
        | StmtKind::Defer(_)
        | StmtKind::Expr(_)
        | StmtKind::Decl(_)
        | StmtKind::Assign(_)
        | StmtKind::IncDec(_)
        | StmtKind::Go(_)
        | StmtKind::Send(_)
        | StmtKind::Empty => false,
    }
}

impl FunctionLowerer<'_> {
    pub(crate) fn lower_if(&mut self, stmt: &StmtIf, label: Option<&str>) -> Result<()> {
        if let Some(init) = &stmt.init {
            self.lower_stmt(init, None)?;
        }
        let mut clauses = Vec::new();
        let mut current = stmt;
        loop {
            clauses.push(Clause {
                conds: std::slice::from_ref(&current.cond),
                body: &current.body.stmts,
            });
            let Some(else_branch) = current.else_branch.as_deref() else {
                break;
            };
            match &else_branch.kind {
                StmtKind::If(next) if next.init.is_none() => current = next,
                // The init statement has to run only when the chain gets this far.
                StmtKind::If(_) => {
                    clauses.push(Clause {
                        conds: &[],
                        body: std::slice::from_ref(else_branch),
                    });
                    break;
                }
                StmtKind::Block(block) => {
                    clauses.push(Clause {
                        conds: &[],
                        body: &block.stmts,
                    });
                    break;
                }
                StmtKind::Empty => break,
                _ => {
                    return Err(Error::MalformedElse {
                        kind: else_branch.kind_name(),
                        span: else_branch.span,
                    })
                }
            }
        }
        self.lower_branching(&clauses, false, &ClauseTest::Plain, label)
    }

    pub(crate) fn lower_switch(&mut self, stmt: &StmtSwitch, label: Option<&str>) -> Result<()> {
        if let Some(init) = &stmt.init {
            self.lower_stmt(init, None)?;
        }
        let test = match &stmt.tag {
            Some(tag) => {
                let ref_var = self.fresh("_ref");
                let text = self.expr(tag)?;
                self.line(format!("{} = {};", ref_var, text));
                let ty = self.env.type_of(tag).cloned();
                ClauseTest::Tag(self.env.synthetic(ref_var, ty))
            }
            None => ClauseTest::Plain,
        };
        let clauses: Vec<Clause<'_>> = stmt.clauses.iter().map(Clause::from).collect();
        self.lower_branching(&clauses, true, &test, label)
    }

    pub(crate) fn lower_type_switch(
        &mut self,
        stmt: &StmtTypeSwitch,
        label: Option<&str>,
    ) -> Result<()> {
        if let Some(init) = &stmt.init {
            self.lower_stmt(init, None)?;
        }
        let mut narrowed = Vec::new();
        let bind = match &stmt.binding {
            Some(binding) if !binding.is_blank() => {
                let name = self.fresh(binding.as_str());
                for clause in &stmt.clauses {
                    if let Some(object) = self.env.implicit_of(clause.id) {
                        self.env.narrow(object.id, name.clone());
                        narrowed.push(object.id);
                    }
                }
                Some(name)
            }
            _ => None,
        };

        let subject = match &stmt.subject.strip_parens().kind {
            ExprKind::TypeAssert(assert) if assert.ty.is_none() => &*assert.x,
            _ => &stmt.subject,
        };
        let ref_var = self.fresh("_ref");
        let type_var = self.fresh("_type");
        let text = self.expr(subject)?;
        self.line(format!("{} = {};", ref_var, text));
        self.line(format!(
            "{type_var} = {ref_var} !== null ? {ref_var}.constructor : null;"
        ));

        let clauses: Vec<Clause<'_>> = stmt.clauses.iter().map(Clause::from).collect();
        let test = ClauseTest::Type {
            ref_var,
            type_var,
            bind,
        };
        let result = self.lower_branching(&clauses, true, &test, label);
        for object in narrowed {
            self.env.unnarrow(object);
        }
        result
    }

    pub(crate) fn lower_branching(
        &mut self,
        clauses: &[Clause<'_>],
        is_switch: bool,
        test: &ClauseTest,
        label: Option<&str>,
    ) -> Result<()> {
        if clauses.is_empty() {
            return Ok(());
        }
        let wrap = is_switch
            && (label.is_some()
                || self.config().always_wrap_switch
                || clauses.iter().any(|clause| has_unlabeled_break(clause.body)));
        let groups = case_groups(clauses);

        if !wrap {
            return self.lower_chain(clauses, &groups, test);
        }
        self.line(format!("{}switch (undefined) {{", label_prefix(label)));
        self.line("default:");
        self.indented(|this| this.lower_chain(clauses, &groups, test))?;
        self.line("}");
        Ok(())
    }

    fn lower_chain(
        &mut self,
        clauses: &[Clause<'_>],
        groups: &[Vec<&Stmt>],
        test: &ClauseTest,
    ) -> Result<()> {
        if let [only] = clauses {
            if only.conds.is_empty() {
                self.clause_prefix(test, &[])?;
                return self.lower_stmts(groups[0].iter().copied());
            }
        }

        let mut default = None;
        let mut else_prefix = "";
        for (clause, body) in clauses.iter().zip(groups) {
            if clause.conds.is_empty() {
                default = Some(body);
                continue;
            }
            let conds = clause
                .conds
                .iter()
                .map(|cond| self.lower_cond(test, cond))
                .collect::<Result<Vec<_>>>()?;
            self.line(format!("{}if ({}) {{", else_prefix, conds.join(" || ")));
            self.indented(|this| {
                this.clause_prefix(test, clause.conds)?;
                this.lower_stmts(body.iter().copied())
            })?;
            else_prefix = "} else ";
        }
        if let Some(body) = default {
            self.line("} else {");
            self.indented(|this| {
                this.clause_prefix(test, &[])?;
                this.lower_stmts(body.iter().copied())
            })?;
        }
        self.line("}");
        Ok(())
    }

    fn lower_cond(&mut self, test: &ClauseTest, cond: &Expr) -> Result<String> {
        match test {
            ClauseTest::Plain => self.expr(cond),
            ClauseTest::Tag(reference) => {
                let comparison = self.env.synthesize(
                    ExprKind::Binary(ExprBinary {
                        op: BinOp::Eql,
                        x: Box::new(reference.clone()),
                        y: Box::new(cond.clone()),
                    }),
                    cond.span,
                    Some(Type::bool()),
                );
                self.expr(&comparison)
            }
            ClauseTest::Type { type_var, .. } => {
                let ty = self.expect_type(cond)?;
                Ok(self.exprs.type_check(type_var, &ty))
            }
        }
    }

    /// Binds the narrowed variable of a type switch at the top of a clause.
    fn clause_prefix(&mut self, test: &ClauseTest, conds: &[Expr]) -> Result<()> {
        let ClauseTest::Type {
            ref_var,
            bind: Some(bind),
            ..
        } = test
        else {
            return Ok(());
        };
        let unwrap = match conds {
            [single] => {
                let ty = self.expect_type(single)?;
                !ty.is_interface() && !ty.is_untyped_nil()
            }
            _ => false,
        };
        if unwrap {
            self.line(format!("{} = {}.{};", bind, ref_var, runtime::VAL));
        } else {
            self.line(format!("{} = {};", bind, ref_var));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gojs_core::ast::{AstBuilder, StmtBranch};

    fn fallthrough(b: &mut AstBuilder) -> Stmt {
        b.branch(BranchKind::Fallthrough, None)
    }

    #[test]
    fn fallthrough_appends_following_bodies() {
        let mut b = AstBuilder::new();
        let a = b.block(vec![]);
        let ft = fallthrough(&mut b);
        let first = vec![a.clone(), ft];
        let second = vec![b.block(vec![])];
        let third = vec![b.block(vec![])];
        let clauses = [
            Clause {
                conds: &[],
                body: &first,
            },
            Clause {
                conds: &[],
                body: &second,
            },
            Clause {
                conds: &[],
                body: &third,
            },
        ];
        let groups = case_groups(&clauses);
        let ids = |group: &Vec<&Stmt>| group.iter().map(|s| s.id).collect::<Vec<_>>();
        assert_eq!(
            ids(&groups[0]),
            vec![first[0].id, first[1].id, second[0].id]
        );
        assert_eq!(ids(&groups[1]), vec![second[0].id]);
        assert_eq!(ids(&groups[2]), vec![third[0].id]);
    }

    #[test]
    fn breaks_inside_nested_loops_belong_to_the_loop() {
        let mut b = AstBuilder::new();
        let brk = b.branch(BranchKind::Break, None);
        let inner = b.stmt(StmtKind::For(gojs_core::ast::StmtFor {
            init: None,
            cond: None,
            post: None,
            body: gojs_core::ast::Block::new(vec![brk.clone()]),
        }));
        assert!(!has_unlabeled_break(std::slice::from_ref(&inner)));

        let nested = b.block(vec![brk]);
        assert!(has_unlabeled_break(std::slice::from_ref(&nested)));

        let labeled = b.stmt(StmtKind::Branch(StmtBranch {
            kind: BranchKind::Break,
            label: Some("outer".into()),
        }));
        assert!(!has_unlabeled_break(&[labeled]));
    }
}
