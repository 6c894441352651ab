use gojs_core::ast::{Expr, ExprIndex, ExprKind, StmtRange};
use gojs_core::error::Error;
use gojs_core::span::Span;
use gojs_core::types::{BasicKind, Type, TypeMap};
use gojs_core::Result;

use crate::context::{label_prefix, FunctionLowerer};
use crate::runtime;

/// What a `range` clause iterates over, decided from the static type of the
/// ranged expression.
enum RangeKind {
    String,
    Map(TypeMap),
    /// Arrays and pointers to arrays: the length is a constant.
    Array { len: u64, elem: Type },
    Slice(Type),
    Chan,
}

impl RangeKind {
    fn classify(ty: &Type) -> Option<RangeKind> {
        match ty.underlying() {
            Type::Basic(kind) if kind.is_string() => Some(RangeKind::String),
            Type::Map(map) => Some(RangeKind::Map(map.clone())),
            Type::Array(array) => Some(RangeKind::Array {
                len: array.len,
                elem: (*array.elem).clone(),
            }),
            Type::Pointer(inner) => match inner.underlying() {
                Type::Array(array) => Some(RangeKind::Array {
                    len: array.len,
                    elem: (*array.elem).clone(),
                }),
                _ => None,
            },
            Type::Slice(elem) => Some(RangeKind::Slice((**elem).clone())),
            Type::Chan(_) => Some(RangeKind::Chan),
            _ => None,
        }
    }
}

impl FunctionLowerer<'_> {
    pub(crate) fn lower_range(
        &mut self,
        stmt: &StmtRange,
        span: Span,
        label: Option<&str>,
    ) -> Result<()> {
        let ty = self.expect_type(&stmt.x)?;
        let kind = RangeKind::classify(&ty).ok_or_else(|| Error::UnsupportedRange {
            ty: ty.to_string(),
            span,
        })?;

        let ref_var = self.fresh("_ref");
        let text = self.expr(&stmt.x)?;
        self.line(format!("{} = {};", ref_var, text));
        let i_var = self.fresh("_i");
        self.line(format!("{} = 0;", i_var));
        let prefix = label_prefix(label);

        match kind {
            RangeKind::String => {
                let rune_var = self.fresh("_rune");
                self.line(format!(
                    "{prefix}for (; {i_var} < {ref_var}.length; {i_var} += {rune_var}[1]) {{"
                ));
                self.range_body(stmt, label, |this| {
                    this.line(format!(
                        "{} = {}({}, {});",
                        rune_var,
                        runtime::DECODE_RUNE,
                        ref_var,
                        i_var
                    ));
                    let rune = Type::Basic(BasicKind::Int32);
                    this.bind_range_target(stmt.value.as_ref(), format!("{}[0]", rune_var), &rune)?;
                    this.bind_range_target(stmt.key.as_ref(), i_var.clone(), &Type::int())
                })
            }
            RangeKind::Map(map) => {
                let keys_var = self.fresh("_keys");
                self.line(format!(
                    "{keys_var} = {ref_var} !== null ? {}({ref_var}) : [];",
                    runtime::KEYS
                ));
                self.line(format!(
                    "{prefix}for (; {i_var} < {keys_var}.length; {i_var}++) {{"
                ));
                self.range_body(stmt, label, |this| {
                    let entry_var = this.fresh("_entry");
                    this.line(format!("{entry_var} = {ref_var}[{keys_var}[{i_var}]];"));
                    // Entries deleted by an earlier iteration are skipped.
                    this.line(format!("if ({entry_var} === undefined) {{ continue; }}"));
                    this.bind_range_target(stmt.value.as_ref(), format!("{}.v", entry_var), &map.elem)?;
                    this.bind_range_target(stmt.key.as_ref(), format!("{}.k", entry_var), &map.key)
                })
            }
            RangeKind::Array { len, elem } => {
                self.line(format!("{prefix}for (; {i_var} < {len}; {i_var}++) {{"));
                self.range_body(stmt, label, |this| {
                    this.bind_range_element(stmt, &ty, &ref_var, &i_var, &elem)?;
                    this.bind_range_target(stmt.key.as_ref(), i_var.clone(), &Type::int())
                })
            }
            RangeKind::Slice(elem) => {
                self.line(format!(
                    "{prefix}for (; {i_var} < {ref_var}.length; {i_var}++) {{"
                ));
                self.range_body(stmt, label, |this| {
                    this.bind_range_element(stmt, &ty, &ref_var, &i_var, &elem)?;
                    this.bind_range_target(stmt.key.as_ref(), i_var.clone(), &Type::int())
                })
            }
            RangeKind::Chan => {
                self.line(runtime::panic_stub("Channels not supported"));
                Ok(())
            }
        }
    }

    /// Emits the loop body after the opening line the caller printed.
    fn range_body<F>(&mut self, stmt: &StmtRange, label: Option<&str>, bind: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.loops.push(label, None);
        let body = self.indented(|this| {
            bind(this)?;
            this.lower_stmts(&stmt.body.stmts)
        });
        self.loops.pop();
        body?;
        self.line("}");
        Ok(())
    }

    /// Writes `source`, a value of type `ty`, into a key or value target.
    fn bind_range_target(&mut self, target: Option<&Expr>, source: String, ty: &Type) -> Result<()> {
        let Some(target) = target.filter(|target| !target.is_blank()) else {
            return Ok(());
        };
        let source = self.env.synthetic(source, Some(ty.clone()));
        let target_ty = self
            .env
            .type_or_object_type(target)
            .cloned()
            .unwrap_or_else(|| ty.clone());
        let text = self.converted(&source, &target_ty)?;
        self.assign_to(target, &text)
    }

    /// Reads the current element of an array or slice into the value target,
    /// copying struct and array elements.
    fn bind_range_element(
        &mut self,
        stmt: &StmtRange,
        container: &Type,
        ref_var: &str,
        i_var: &str,
        elem: &Type,
    ) -> Result<()> {
        let Some(target) = stmt.value.as_ref().filter(|target| !target.is_blank()) else {
            return Ok(());
        };
        let x = self.env.synthetic(ref_var, Some(container.clone()));
        let index = self.env.synthetic(i_var, Some(Type::int()));
        let read = self.env.synthesize(
            ExprKind::Index(ExprIndex {
                x: Box::new(x),
                index: Box::new(index),
            }),
            stmt.x.span,
            Some(elem.clone()),
        );
        let target_ty = self
            .env
            .type_or_object_type(target)
            .cloned()
            .unwrap_or_else(|| elem.clone());
        let text = self.converted(&read, &target_ty)?;
        self.assign_to(target, &text)
    }
}
