//! Per-function allocation of synthetic variable names.

use std::collections::HashSet;

use gojs_core::ast::{
    Block, CaseClause, DeclSpec, Expr, ExprKind, FuncBody, Stmt, StmtKind,
};
use gojs_core::semantic::ObjectId;
use gojs_core::SemanticModel;

/// Words the target language reserves; source identifiers spelled like one
/// of these are renamed with a trailing `$`.
pub const JS_RESERVED: &[&str] = &[
    "abstract", "arguments", "boolean", "break", "byte", "case", "catch", "char", "class",
    "const", "continue", "debugger", "default", "delete", "do", "double", "else", "enum", "eval",
    "export", "extends", "false", "final", "finally", "float", "for", "function", "goto", "if",
    "implements", "import", "in", "instanceof", "int", "interface", "let", "long", "native",
    "new", "null", "package", "private", "protected", "public", "return", "short", "static",
    "super", "switch", "synchronized", "this", "throw", "throws", "transient", "true", "try",
    "typeof", "undefined", "var", "void", "volatile", "while", "with", "yield",
];

pub fn mangle(name: &str) -> String {
    if JS_RESERVED.contains(&name) {
        format!("{}$", name)
    } else {
        name.to_string()
    }
}

/// Hands out names unique within one function. A prefix is tried as-is,
/// then with `1`, `2`, ... appended.
#[derive(Debug, Clone)]
pub struct NameAllocator {
    taken: HashSet<String>,
    allocated: Vec<String>,
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl NameAllocator {
    pub fn new() -> Self {
        Self {
            taken: JS_RESERVED.iter().map(|word| word.to_string()).collect(),
            allocated: Vec::new(),
        }
    }

    /// Marks a name as used without declaring it.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    pub fn fresh(&mut self, prefix: &str) -> String {
        let mut counter = 0usize;
        loop {
            let candidate = if counter == 0 {
                prefix.to_string()
            } else {
                format!("{}{}", prefix, counter)
            };
            if self.taken.insert(candidate.clone()) {
                tracing::trace!("allocated synthetic variable {}", candidate);
                self.allocated.push(candidate.clone());
                return candidate;
            }
            counter += 1;
        }
    }

    /// Synthetic names in allocation order.
    pub fn allocated(&self) -> &[String] {
        &self.allocated
    }

    pub fn into_allocated(self) -> Vec<String> {
        self.allocated
    }
}

/// Target spellings of every identifier the function body mentions, nested
/// function literals included. Uses of implicit type-switch objects are
/// skipped: those are renamed to allocated names anyway.
pub fn collect_source_names(model: &dyn SemanticModel, func: &FuncBody) -> HashSet<String> {
    let mut collector = NameCollector {
        model,
        names: HashSet::new(),
        implicits: HashSet::new(),
    };
    collector.func(func);
    collector.names
}

struct NameCollector<'a> {
    model: &'a dyn SemanticModel,
    names: HashSet<String>,
    implicits: HashSet<ObjectId>,
}

impl NameCollector<'_> {
    fn func(&mut self, func: &FuncBody) {
        for param in &func.params {
            self.names.insert(mangle(param.as_str()));
        }
        for result in func.results.iter().flatten() {
            self.expr(result);
        }
        self.block(&func.body);
    }

    fn block(&mut self, block: &Block) {
        self.stmts(&block.stmts);
    }

    fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn opt_stmt(&mut self, stmt: Option<&Stmt>) {
        if let Some(stmt) = stmt {
            self.stmt(stmt);
        }
    }

    fn clauses(&mut self, clauses: &[CaseClause]) {
        for clause in clauses {
            clause.list.iter().for_each(|expr| self.expr(expr));
            self.stmts(&clause.body);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Block(block) => self.block(block),
            StmtKind::If(stmt) => {
                self.opt_stmt(stmt.init.as_deref());
                self.expr(&stmt.cond);
                self.block(&stmt.body);
                self.opt_stmt(stmt.else_branch.as_deref());
            }
            StmtKind::Switch(stmt) => {
                self.opt_stmt(stmt.init.as_deref());
                if let Some(tag) = &stmt.tag {
                    self.expr(tag);
                }
                self.clauses(&stmt.clauses);
            }
            StmtKind::TypeSwitch(stmt) => {
                self.opt_stmt(stmt.init.as_deref());
                if stmt.binding.is_some() {
                    for clause in &stmt.clauses {
                        if let Some(object) = self.model.implicit_of(clause.id) {
                            self.implicits.insert(object.id);
                        }
                    }
                }
                self.expr(&stmt.subject);
                self.clauses(&stmt.clauses);
            }
            StmtKind::For(stmt) => {
                self.opt_stmt(stmt.init.as_deref());
                if let Some(cond) = &stmt.cond {
                    self.expr(cond);
                }
                self.opt_stmt(stmt.post.as_deref());
                self.block(&stmt.body);
            }
            StmtKind::Range(stmt) => {
                stmt.key.iter().chain(stmt.value.iter()).for_each(|e| self.expr(e));
                self.expr(&stmt.x);
                self.block(&stmt.body);
            }
            StmtKind::Branch(_) | StmtKind::Empty => {}
            StmtKind::Return(stmt) => stmt.results.iter().for_each(|e| self.expr(e)),
            StmtKind::Defer(stmt) => {
                self.expr(&stmt.call.fun);
                stmt.call.args.iter().for_each(|e| self.expr(e));
            }
            StmtKind::Expr(expr) => self.expr(expr),
            StmtKind::Decl(decl) => {
                for spec in &decl.specs {
                    match spec {
                        DeclSpec::Var(spec) | DeclSpec::Const(spec) => {
                            spec.names.iter().chain(&spec.values).for_each(|e| self.expr(e));
                        }
                        DeclSpec::Type(spec) => {
                            self.names.insert(mangle(spec.name.as_str()));
                        }
                    }
                }
            }
            StmtKind::Labeled(stmt) => self.stmt(&stmt.stmt),
            StmtKind::Assign(stmt) => {
                stmt.lhs.iter().chain(&stmt.rhs).for_each(|e| self.expr(e));
            }
            StmtKind::IncDec(stmt) => self.expr(&stmt.x),
            StmtKind::Select(stmt) => {
                for clause in &stmt.clauses {
                    self.opt_stmt(clause.comm.as_deref());
                    self.stmts(&clause.body);
                }
            }
            StmtKind::Go(stmt) => {
                self.expr(&stmt.call.fun);
                stmt.call.args.iter().for_each(|e| self.expr(e));
            }
            StmtKind::Send(stmt) => {
                self.expr(&stmt.chan);
                self.expr(&stmt.value);
            }
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(ident) => {
                if ident.is_blank() {
                    return;
                }
                let implicit = self
                    .model
                    .object_of(expr.id)
                    .is_some_and(|object| self.implicits.contains(&object.id));
                if !implicit {
                    self.names.insert(mangle(ident.as_str()));
                }
            }
            ExprKind::Lit(_) | ExprKind::Synthetic(_) => {}
            ExprKind::Paren(inner) | ExprKind::Star(inner) => self.expr(inner),
            ExprKind::Selector(selector) => self.expr(&selector.x),
            ExprKind::Index(index) => {
                self.expr(&index.x);
                self.expr(&index.index);
            }
            ExprKind::Unary(unary) => self.expr(&unary.x),
            ExprKind::Binary(binary) => {
                self.expr(&binary.x);
                self.expr(&binary.y);
            }
            ExprKind::Call(call) => {
                self.expr(&call.fun);
                call.args.iter().for_each(|e| self.expr(e));
            }
            ExprKind::TypeAssert(assert) => {
                self.expr(&assert.x);
                if let Some(ty) = &assert.ty {
                    self.expr(ty);
                }
            }
            ExprKind::FuncLit(lit) => self.func(&lit.func),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fresh_names_count_up_per_prefix() {
        let mut names = NameAllocator::new();
        assert_eq!(names.fresh("_ref"), "_ref");
        assert_eq!(names.fresh("_ref"), "_ref1");
        assert_eq!(names.fresh("_i"), "_i");
        assert_eq!(names.fresh("_ref"), "_ref2");
        assert_eq!(names.allocated(), &["_ref", "_ref1", "_i", "_ref2"]);
    }

    #[test]
    fn reserved_and_source_names_are_skipped() {
        let mut names = NameAllocator::new();
        names.reserve("_key");
        assert_eq!(names.fresh("_key"), "_key1");
        assert_eq!(names.fresh("new"), "new1");
        assert!(names.is_taken("_key"));
    }

    #[test]
    fn reserved_words_are_mangled() {
        assert_eq!(mangle("delete"), "delete$");
        assert_eq!(mangle("count"), "count");
    }
}
