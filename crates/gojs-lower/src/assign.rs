use gojs_core::ast::{
    AssignOp, Expr, ExprBinary, ExprIndex, ExprKind, ExprLit, ExprSelector, StmtIncDec, UnOp,
};
use gojs_core::error::Error;
use gojs_core::semantic::ConstValue;
use gojs_core::span::Span;
use gojs_core::types::{Type, TypeStruct};
use gojs_core::Result;

use crate::context::FunctionLowerer;
use crate::env::Env;
use crate::runtime;

/// Which operands of an assignment target are evaluated ahead of the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    /// Operands with side effects, so a read-modify-write runs them once.
    Effects,
    /// Every operand that is not a constant, so writes to earlier targets of
    /// the same statement cannot move a later target.
    Values,
}

/// Whether evaluating `expr` a second time yields the same value and has no
/// side effects.
fn is_stable(env: &Env<'_>, expr: &Expr) -> bool {
    if env.value_of(expr).is_some() {
        return true;
    }
    match &expr.kind {
        ExprKind::Ident(_) | ExprKind::Lit(_) | ExprKind::Synthetic(_) => true,
        ExprKind::Paren(inner) | ExprKind::Star(inner) => is_stable(env, inner),
        ExprKind::Selector(selector) => is_stable(env, &selector.x),
        ExprKind::Index(index) => is_stable(env, &index.x) && is_stable(env, &index.index),
        // Taking an address allocates a new pointer each time.
        ExprKind::Unary(unary) => unary.op != UnOp::Addr && is_stable(env, &unary.x),
        ExprKind::Binary(binary) => is_stable(env, &binary.x) && is_stable(env, &binary.y),
        ExprKind::Call(_) | ExprKind::TypeAssert(_) | ExprKind::FuncLit(_) => false,
    }
}

impl FunctionLowerer<'_> {
    /// Lowers `lhs op rhs` into single-target writes.
    pub(crate) fn lower_assign(
        &mut self,
        lhs: &[Expr],
        op: AssignOp,
        rhs: &[Expr],
        span: Span,
    ) -> Result<()> {
        let arity = || Error::InvalidArity {
            lhs: lhs.len(),
            rhs: rhs.len(),
            span,
        };

        if let Some(bin_op) = op.binary_op() {
            let ([target], [value]) = (lhs, rhs) else {
                return Err(arity());
            };
            let ty = self.lhs_type(target)?;
            let target = self.resolve_place(target, Capture::Effects)?;
            let value_ty = self.env.type_of(value).cloned();
            let paren = self.env.synthesize(
                ExprKind::Paren(Box::new(value.clone())),
                value.span,
                value_ty,
            );
            let binary = self.env.synthesize(
                ExprKind::Binary(ExprBinary {
                    op: bin_op,
                    x: Box::new(target.clone()),
                    y: Box::new(paren),
                }),
                span,
                Some(ty),
            );
            let text = self.expr(&binary)?;
            return self.assign_to(&target, &text);
        }

        match (lhs, rhs) {
            ([target], [value]) => {
                if target.is_blank() {
                    let text = self.expr(value)?;
                    self.line(format!("{};", text));
                    return Ok(());
                }
                let ty = self.lhs_type(target)?;
                let text = self.converted(value, &ty)?;
                self.assign_to(target, &text)
            }
            (targets, [value]) if targets.len() > 1 => {
                let slots = match self.env.type_of(value) {
                    Some(Type::Tuple(slots)) if slots.len() == targets.len() => slots.clone(),
                    _ => return Err(arity()),
                };
                let places = self.resolve_places(targets)?;
                let text = self.expr(value)?;
                self.line(format!("{} = {};", runtime::TUPLE, text));
                for (i, ((target, place), slot)) in
                    targets.iter().zip(&places).zip(slots).enumerate()
                {
                    if target.is_blank() {
                        continue;
                    }
                    let source = self
                        .env
                        .synthetic(format!("{}[{}]", runtime::TUPLE, i), Some(slot));
                    let ty = self.lhs_type(target)?;
                    let text = self.converted(&source, &ty)?;
                    self.assign_to(place, &text)?;
                }
                Ok(())
            }
            (targets, values) if targets.len() == values.len() && targets.len() > 1 => {
                let places = self.resolve_places(targets)?;
                let mut parts = Vec::with_capacity(values.len());
                for (target, value) in targets.iter().zip(values) {
                    parts.push(if target.is_blank() {
                        self.expr(value)?
                    } else {
                        let ty = self.lhs_type(target)?;
                        self.converted(value, &ty)?
                    });
                }
                // Every value is evaluated before the first write.
                self.line(format!("{} = [{}];", runtime::TUPLE, parts.join(", ")));
                for (i, place) in places.iter().enumerate() {
                    self.assign_to(place, &format!("{}[{}]", runtime::TUPLE, i))?;
                }
                Ok(())
            }
            _ => Err(arity()),
        }
    }

    /// `x++` and `x--` as `x += 1` and `x -= 1`, with the literal typed as
    /// the exact element type for indexed targets.
    pub(crate) fn lower_inc_dec(&mut self, stmt: &StmtIncDec, span: Span) -> Result<()> {
        let mut ty = self.lhs_type(&stmt.x)?;
        if let ExprKind::Index(index) = &stmt.x.strip_parens().kind {
            if let Some(elem) = self.expect_type(&index.x)?.elem() {
                ty = elem.clone();
            }
        }
        let one = self
            .env
            .synthesize(ExprKind::Lit(ExprLit::int("1")), span, Some(ty));
        self.env.record_value(one.id, ConstValue::Int(1));
        let op = if stmt.inc {
            AssignOp::AddAssign
        } else {
            AssignOp::SubAssign
        };
        self.lower_assign(std::slice::from_ref(&stmt.x), op, &[one], span)
    }

    /// Writes the already lowered `rhs` into `target`.
    pub(crate) fn assign_to(&mut self, target: &Expr, rhs: &str) -> Result<()> {
        if target.is_blank() {
            return Ok(());
        }
        let target = target.strip_parens();
        let unsupported = |kind: String| Error::UnsupportedTarget {
            kind,
            span: target.span,
        };

        match &target.kind {
            ExprKind::Ident(_) | ExprKind::Synthetic(_) => {
                let name = self.expr(target)?;
                self.line(format!("{} = {};", name, rhs));
            }
            ExprKind::Selector(_) => {
                let ty = self.lhs_type(target)?;
                let dest = self.expr(target)?;
                match ty.underlying() {
                    Type::Struct(fields) => self.copy_struct(&dest, rhs, fields),
                    _ => self.line(format!("{} = {};", dest, rhs)),
                }
            }
            ExprKind::Star(pointer) => {
                let pointer_ty = self.expect_type(pointer)?;
                let Type::Pointer(elem) = pointer_ty.underlying() else {
                    return Err(unsupported(format!("dereference of {}", pointer_ty)));
                };
                let dest = self.expr(pointer)?;
                match elem.underlying() {
                    Type::Struct(fields) => self.copy_struct(&dest, rhs, fields),
                    Type::Array(array) => {
                        let (l, r) = self.copy_operands(&dest, rhs);
                        let i = self.fresh("_i");
                        self.line(format!(
                            "for ({i} = 0; {i} < {len}; {i}++) {{ {l}[{i}] = {r}[{i}]; }}",
                            len = array.len
                        ));
                    }
                    _ => self.line(format!("{}.{}({});", dest, runtime::SET, rhs)),
                }
            }
            ExprKind::Index(index) => {
                let container = self.expect_type(&index.x)?;
                match container.underlying() {
                    Type::Array(_) | Type::Pointer(_) => {
                        let x = self.expr(&index.x)?;
                        let i = self.expr(&index.index)?;
                        self.line(format!("{}[{}] = {};", x, i, rhs));
                    }
                    Type::Slice(_) => {
                        let slice = self.temp(&index.x, "_slice")?;
                        let i = self.temp(&index.index, "_index")?;
                        self.line(runtime::index_check(&i, &slice));
                        self.line(format!("{slice}.array[{slice}.offset + {i}] = {rhs};"));
                    }
                    Type::Map(map) => {
                        // A captured key already holds the converted value.
                        let key = match &index.index.kind {
                            ExprKind::Synthetic(name) => name.clone(),
                            _ => {
                                let key = self.fresh("_key");
                                let key_text = self.converted(&index.index, &map.key)?;
                                self.line(format!("{} = {};", key, key_text));
                                key
                            }
                        };
                        let x = self.expr(&index.x)?;
                        self.line(format!(
                            "{}[{}] = {{ k: {}, v: {} }};",
                            x,
                            runtime::map_key(&key, &map.key),
                            key,
                            rhs
                        ));
                    }
                    _ => return Err(unsupported(format!("index into {}", container))),
                }
            }
            _ => return Err(unsupported(target.kind_name().to_string())),
        }
        Ok(())
    }

    fn resolve_places(&mut self, targets: &[Expr]) -> Result<Vec<Expr>> {
        targets
            .iter()
            .map(|target| self.resolve_place(target, Capture::Values))
            .collect()
    }

    /// Rebuilds `target` so the operands `capture` selects are read from
    /// temporaries assigned here, in source order. Lowering the result as a
    /// read or as a write evaluates nothing else with side effects.
    fn resolve_place(&mut self, target: &Expr, capture: Capture) -> Result<Expr> {
        let target = target.strip_parens();
        let kind = match &target.kind {
            ExprKind::Selector(selector) => {
                let through_pointer = self
                    .env
                    .type_of(&selector.x)
                    .is_some_and(|ty| matches!(ty.underlying(), Type::Pointer(_)));
                let x = if through_pointer {
                    self.capture(&selector.x, "_ptr", None, capture)?
                } else {
                    self.resolve_place(&selector.x, capture)?
                };
                ExprKind::Selector(ExprSelector {
                    x: Box::new(x),
                    sel: selector.sel.clone(),
                })
            }
            ExprKind::Index(index) => {
                let container = self.expect_type(&index.x)?;
                let (x, i) = match container.underlying() {
                    // Array values are variables in their own right.
                    Type::Array(_) => {
                        let x = self.resolve_place(&index.x, capture)?;
                        (x, self.capture(&index.index, "_index", None, capture)?)
                    }
                    Type::Map(map) => {
                        let x = self.capture(&index.x, "_map", None, capture)?;
                        let key =
                            self.capture(&index.index, "_key", Some(map.key.as_ref()), capture)?;
                        (x, key)
                    }
                    Type::Slice(_) => {
                        let x = self.capture(&index.x, "_slice", None, capture)?;
                        (x, self.capture(&index.index, "_index", None, capture)?)
                    }
                    _ => {
                        let x = self.capture(&index.x, "_array", None, capture)?;
                        (x, self.capture(&index.index, "_index", None, capture)?)
                    }
                };
                ExprKind::Index(ExprIndex {
                    x: Box::new(x),
                    index: Box::new(i),
                })
            }
            ExprKind::Star(pointer) => {
                ExprKind::Star(Box::new(self.capture(pointer, "_ptr", None, capture)?))
            }
            _ => return Ok(target.clone()),
        };
        let ty = self.env.type_of(target).cloned();
        Ok(self.env.synthesize(kind, target.span, ty))
    }

    /// `expr` itself when it may be evaluated again, otherwise a temporary
    /// holding its value, converted to `convert` when given.
    fn capture(
        &mut self,
        expr: &Expr,
        prefix: &str,
        convert: Option<&Type>,
        capture: Capture,
    ) -> Result<Expr> {
        let constant = self.env.value_of(expr).is_some()
            || matches!(
                expr.strip_parens().kind,
                ExprKind::Lit(_) | ExprKind::Synthetic(_)
            );
        if constant || (capture == Capture::Effects && is_stable(&self.env, expr)) {
            return Ok(expr.clone());
        }
        let name = self.fresh(prefix);
        let (text, ty) = match convert {
            Some(ty) => (self.converted(expr, ty)?, Some(ty.clone())),
            None => (
                self.expr(expr)?,
                self.env.type_or_object_type(expr).cloned(),
            ),
        };
        self.line(format!("{} = {};", name, text));
        Ok(self.env.synthetic(name, ty))
    }

    /// Name holding the value of `expr`: a temporary names itself, anything
    /// else is stored into a fresh one.
    fn temp(&mut self, expr: &Expr, prefix: &str) -> Result<String> {
        if let ExprKind::Synthetic(name) = &expr.kind {
            return Ok(name.clone());
        }
        let name = self.fresh(prefix);
        let text = self.expr(expr)?;
        self.line(format!("{} = {};", name, text));
        Ok(name)
    }

    /// Evaluates both sides of a value copy once into fresh temporaries.
    fn copy_operands(&mut self, dest: &str, rhs: &str) -> (String, String) {
        let l = self.fresh("_l");
        let r = self.fresh("_r");
        self.line(format!("{} = {};", l, dest));
        self.line(format!("{} = {};", r, rhs));
        (l, r)
    }

    /// Overwrites the struct at `dest` field by field.
    fn copy_struct(&mut self, dest: &str, rhs: &str, fields: &TypeStruct) {
        let (l, r) = self.copy_operands(dest, rhs);
        for field in &fields.fields {
            self.line(format!("{l}.{name} = {r}.{name};", name = field.name));
        }
    }
}

#[cfg(test)]
mod tests {
    use gojs_core::ast::{AssignOp, AstBuilder, Block, FuncBody, Stmt};
    use gojs_core::config::LowerConfig;
    use gojs_core::error::Error;
    use gojs_core::semantic::ObjectKind;
    use gojs_core::types::{Signature, Type};
    use pretty_assertions::assert_eq;

    use super::is_stable;
    use crate::env::Env;
    use crate::{lower_function, JsExprLowering};

    fn lower(b: AstBuilder, stmts: Vec<Stmt>) -> gojs_core::Result<String> {
        let info = b.into_info();
        let config = LowerConfig::default();
        let mut exprs = JsExprLowering::new();
        let func = FuncBody::new(Signature::new(vec![], vec![]), Block::new(stmts));
        lower_function(&info, &mut exprs, &func, &config).map(|body| body.code)
    }

    #[test]
    fn compound_assignment_parenthesizes_the_operand() {
        let mut b = AstBuilder::new();
        b.var("x", Type::int());
        b.var("y", Type::int());
        let x = b.ident("x");
        let y = b.ident("y");
        let one = b.int(1);
        let sum = b.binary(gojs_core::ast::BinOp::Add, y, one);
        let stmt = b.assign(vec![x], AssignOp::MulAssign, vec![sum]);
        assert_eq!(lower(b, vec![stmt]).unwrap(), "x = x * (y + 1);");
    }

    #[test]
    fn operands_with_calls_are_not_stable() {
        let mut b = AstBuilder::new();
        b.var("s", Type::slice(Type::int()));
        b.declare(
            "f",
            ObjectKind::Func,
            Type::signature(vec![], vec![Type::int()]),
        );
        let s = b.ident("s");
        let one = b.int(1);
        let read = b.index(s, one, Type::int());
        let fun = b.ident("f");
        let call = b.call(fun, vec![], Type::int());
        let s = b.ident("s");
        let by_call = b.index(s, call, Type::int());

        let info = b.into_info();
        let config = LowerConfig::default();
        let env = Env::new(&info, &config);
        assert!(is_stable(&env, &read));
        assert!(!is_stable(&env, &by_call));
    }

    #[test]
    fn compound_assignment_needs_one_target() {
        let mut b = AstBuilder::new();
        b.var("x", Type::int());
        let x = b.ident("x");
        let y = b.ident("x");
        let one = b.int(1);
        let stmt = b.assign(vec![x, y], AssignOp::AddAssign, vec![one]);
        let err = lower(b, vec![stmt]).unwrap_err();
        assert!(matches!(err, Error::InvalidArity { lhs: 2, rhs: 1, .. }));
    }
}
