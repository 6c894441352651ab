//! Basic JavaScript expression lowering.

use itertools::Itertools;

use gojs_core::ast::{
    BinOp, Expr, ExprBinary, ExprCall, ExprFuncLit, ExprIndex, ExprKind, ExprLit, ExprUnary,
    LitKind, UnOp,
};
use gojs_core::error::Error;
use gojs_core::semantic::{ConstValue, ObjectKind};
use gojs_core::types::{BasicKind, Signature, Type};
use gojs_core::Result;

use crate::env::Env;
use crate::expr::ExprLowering;
use crate::names::mangle;
use crate::runtime;

#[derive(Debug, Clone, Default)]
pub struct JsExprLowering;

impl JsExprLowering {
    pub fn new() -> Self {
        Self
    }

    fn source_type(env: &Env<'_>, expr: &Expr) -> Result<Type> {
        env.type_or_object_type(expr)
            .cloned()
            .ok_or(Error::MissingType {
                node: expr.id,
                span: expr.span,
            })
    }

    /// Lowers an operand of a binary or unary operator, parenthesizing
    /// nested binary expressions.
    fn operand(&mut self, env: &Env<'_>, expr: &Expr) -> Result<String> {
        let text = self.lower(env, expr)?;
        if matches!(expr.kind, ExprKind::Binary(_)) && env.value_of(expr).is_none() {
            Ok(format!("({})", text))
        } else {
            Ok(text)
        }
    }

    fn lower_ident(&self, env: &Env<'_>, expr: &Expr, name: &str) -> Result<String> {
        if name == "_" {
            return Err(Error::UnsupportedExpr {
                kind: "blank identifier".to_string(),
                span: expr.span,
            });
        }
        match env.object_of(expr) {
            Some(object) if object.kind == ObjectKind::Nil => Ok("null".to_string()),
            Some(object) => Ok(self.object_name(env, object)),
            None => Ok(mangle(name)),
        }
    }

    fn lower_index(&mut self, env: &Env<'_>, expr: &Expr, index: &ExprIndex) -> Result<String> {
        let container = Self::source_type(env, &index.x)?;
        let x = self.lower(env, &index.x)?;
        match container.underlying() {
            Type::Array(_) | Type::Pointer(_) => {
                Ok(format!("{}[{}]", x, self.lower(env, &index.index)?))
            }
            Type::Slice(_) => {
                let i = self.lower(env, &index.index)?;
                Ok(format!("{x}.array[{x}.offset + {i}]"))
            }
            Type::Basic(kind) if kind.is_string() => {
                Ok(format!("{}.charCodeAt({})", x, self.lower(env, &index.index)?))
            }
            Type::Map(map) => {
                let key = self.lower_converted(env, &index.index, &map.key)?;
                let slot = runtime::map_key(&key, &map.key);
                let zero = self.zero_value(&map.elem);
                if matches!(env.type_of(expr), Some(Type::Tuple(_))) {
                    Ok(format!(
                        "(function(entry) {{ return entry !== undefined ? [entry.v, true] : [{zero}, false]; }})({x}[{slot}])"
                    ))
                } else {
                    Ok(format!("({x}[{slot}] || {{ v: {zero} }}).v"))
                }
            }
            _ => Err(Error::UnsupportedExpr {
                kind: format!("index into {}", container),
                span: expr.span,
            }),
        }
    }

    fn lower_unary(&mut self, env: &Env<'_>, expr: &Expr, unary: &ExprUnary) -> Result<String> {
        let text = match unary.op {
            UnOp::Addr => return self.lower_addr(env, &unary.x),
            UnOp::Not => return Ok(format!("!{}", self.operand(env, &unary.x)?)),
            UnOp::Plus => self.operand(env, &unary.x)?,
            UnOp::Neg => format!("-{}", self.operand(env, &unary.x)?),
            UnOp::Complement => format!("~{}", self.operand(env, &unary.x)?),
        };
        Ok(match env.type_of(expr).and_then(Type::basic) {
            Some(kind) => wrap_integer(text, *kind),
            None => text,
        })
    }

    fn lower_addr(&mut self, env: &Env<'_>, x: &Expr) -> Result<String> {
        let ty = Self::source_type(env, x)?;
        let target = self.lower(env, x)?;
        match ty.underlying() {
            Type::Struct(_) | Type::Array(_) => Ok(target),
            _ => Ok(format!(
                "new {}(function() {{ return {target}; }}, function($v) {{ {target} = $v; }})",
                runtime::POINTER
            )),
        }
    }

    fn lower_binary(
        &mut self,
        env: &Env<'_>,
        expr: &Expr,
        binary: &ExprBinary,
    ) -> Result<String> {
        let x_ty = env.type_or_object_type(&binary.x).cloned();
        let y_ty = env.type_or_object_type(&binary.y).cloned();
        let x = self.side(env, &binary.x, x_ty.as_ref(), y_ty.as_ref())?;
        let y = self.side(env, &binary.y, y_ty.as_ref(), x_ty.as_ref())?;

        let arithmetic =
            !binary.op.is_comparison() && !matches!(binary.op, BinOp::LAnd | BinOp::LOr);
        let kind = if arithmetic {
            env.type_of(expr)
                .and_then(Type::basic)
                .or_else(|| x_ty.as_ref().and_then(Type::basic))
                .copied()
        } else {
            None
        };

        let text = match binary.op {
            BinOp::Eql => format!("{x} === {y}"),
            BinOp::Neq => format!("{x} !== {y}"),
            BinOp::AndNot => format!("{x} & ~{y}"),
            BinOp::Shr if kind.is_some_and(|kind| kind.is_unsigned()) => format!("{x} >>> {y}"),
            BinOp::Quo if kind.is_some_and(|kind| kind.is_integer()) => {
                format!("Math.trunc({x} / {y})")
            }
            op => format!("{} {} {}", x, op.symbol(), y),
        };
        Ok(match kind {
            Some(kind) => wrap_integer(text, kind),
            None => text,
        })
    }

    /// One side of a binary operation; an untyped `nil` compared against a
    /// typed value becomes that type's nil representation.
    fn side(
        &mut self,
        env: &Env<'_>,
        expr: &Expr,
        ty: Option<&Type>,
        other: Option<&Type>,
    ) -> Result<String> {
        match (ty, other) {
            (Some(ty), Some(other)) if ty.is_untyped_nil() && !other.is_untyped_nil() => {
                Ok(self.zero_value(other))
            }
            _ => self.operand(env, expr),
        }
    }

    fn lower_call(&mut self, env: &Env<'_>, expr: &Expr, call: &ExprCall) -> Result<String> {
        let fun = call.fun.strip_parens();
        if let Some(object) = env.object_of(fun) {
            match object.kind {
                ObjectKind::Builtin => return self.lower_builtin(env, expr, &object.name, call),
                ObjectKind::TypeName => {
                    let [arg] = call.args.as_slice() else {
                        return Err(Error::UnsupportedExpr {
                            kind: format!(
                                "conversion to {} with {} arguments",
                                object.ty,
                                call.args.len()
                            ),
                            span: expr.span,
                        });
                    };
                    return self.lower_converted(env, arg, &object.ty);
                }
                _ => {}
            }
        }

        let fun_ty = Self::source_type(env, fun)?;
        let Type::Signature(sig) = fun_ty.underlying() else {
            return Err(Error::UnsupportedExpr {
                kind: format!("call of {}", fun_ty),
                span: expr.span,
            });
        };
        let args = self.lower_args(env, sig, &call.args, call.ellipsis)?;
        let callee = self.lower(env, &call.fun)?;
        if matches!(fun.kind, ExprKind::FuncLit(_)) {
            Ok(format!("({})({})", callee, args))
        } else {
            Ok(format!("{}({})", callee, args))
        }
    }

    fn lower_builtin(
        &mut self,
        env: &Env<'_>,
        expr: &Expr,
        name: &str,
        call: &ExprCall,
    ) -> Result<String> {
        let arity = || Error::UnsupportedExpr {
            kind: format!("{} with {} arguments", name, call.args.len()),
            span: expr.span,
        };
        let arg = |i: usize| call.args.get(i).ok_or_else(&arity);

        match name {
            "len" | "cap" => {
                let x = arg(0)?;
                let ty = Self::source_type(env, x)?;
                let text = self.lower(env, x)?;
                match ty.underlying() {
                    Type::Array(array) => Ok(array.len.to_string()),
                    Type::Pointer(inner) => match inner.underlying() {
                        Type::Array(array) => Ok(array.len.to_string()),
                        _ => Err(arity()),
                    },
                    Type::Slice(_) if name == "cap" => Ok(format!("{}.capacity", text)),
                    Type::Basic(_) | Type::Slice(_) => Ok(format!("{}.length", text)),
                    Type::Map(_) => Ok(format!(
                        "({text} !== null ? {}({text}).length : 0)",
                        runtime::KEYS
                    )),
                    _ => Err(arity()),
                }
            }
            "append" => {
                let slice_expr = arg(0)?;
                let slice = self.lower(env, slice_expr)?;
                if call.ellipsis {
                    let rest = self.lower(env, arg(1)?)?;
                    return Ok(format!("{}({}, {})", runtime::APPEND_SLICE, slice, rest));
                }
                let elem = Self::source_type(env, slice_expr)?.elem().cloned();
                let mut parts = vec![slice];
                for value in call.args.iter().skip(1) {
                    parts.push(match &elem {
                        Some(elem) => self.lower_converted(env, value, elem)?,
                        None => self.lower(env, value)?,
                    });
                }
                Ok(format!("{}({})", runtime::APPEND, parts.join(", ")))
            }
            "panic" => {
                let value = self.lower_converted(env, arg(0)?, &Type::empty_interface())?;
                Ok(format!("throw new {}({})", runtime::PANIC, value))
            }
            "recover" => Ok(format!("{}()", runtime::RECOVER)),
            "delete" => {
                let map = arg(0)?;
                let ty = Self::source_type(env, map)?;
                let Type::Map(map_ty) = ty.underlying() else {
                    return Err(arity());
                };
                let key = self.lower_converted(env, arg(1)?, &map_ty.key)?;
                let target = self.lower(env, map)?;
                Ok(format!(
                    "delete {}[{}]",
                    target,
                    runtime::map_key(&key, &map_ty.key)
                ))
            }
            "print" | "println" => {
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.lower(env, arg))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("console.log({})", args.join(", ")))
            }
            other => Err(Error::UnsupportedExpr {
                kind: format!("builtin {}", other),
                span: expr.span,
            }),
        }
    }

    fn lower_func_lit(&mut self, env: &Env<'_>, lit: &ExprFuncLit) -> Result<String> {
        let body = crate::lower_closure(env, self, &lit.func)?;
        let config = env.config();
        let params = lit
            .func
            .params
            .iter()
            .map(|param| mangle(param.as_str()))
            .join(", ");
        let rendered = body.render(config);
        if rendered.is_empty() {
            return Ok(format!("function({}) {{}}", params));
        }
        let mut text = format!("function({}) {{", params);
        for line in rendered.lines() {
            text.push('\n');
            if !line.is_empty() {
                text.push_str(&config.indent);
            }
            text.push_str(line);
        }
        text.push_str("\n}");
        Ok(text)
    }
}

impl ExprLowering for JsExprLowering {
    fn lower(&mut self, env: &Env<'_>, expr: &Expr) -> Result<String> {
        if let Some(value) = env.value_of(expr) {
            return render_const(value);
        }
        match &expr.kind {
            ExprKind::Ident(ident) => self.lower_ident(env, expr, ident.as_str()),
            ExprKind::Synthetic(text) => Ok(text.clone()),
            ExprKind::Lit(lit) => lower_lit(expr, lit),
            ExprKind::Paren(inner) => Ok(format!("({})", self.lower(env, inner)?)),
            ExprKind::Selector(selector) => {
                Ok(format!("{}.{}", self.lower(env, &selector.x)?, selector.sel))
            }
            ExprKind::Index(index) => self.lower_index(env, expr, index),
            ExprKind::Star(inner) => {
                let pointer = Self::source_type(env, inner)?;
                let x = self.lower(env, inner)?;
                match pointer.underlying() {
                    Type::Pointer(elem)
                        if matches!(elem.underlying(), Type::Struct(_) | Type::Array(_)) =>
                    {
                        Ok(x)
                    }
                    _ => Ok(format!("{}.{}()", x, runtime::GET)),
                }
            }
            ExprKind::Unary(unary) => self.lower_unary(env, expr, unary),
            ExprKind::Binary(binary) => self.lower_binary(env, expr, binary),
            ExprKind::Call(call) => self.lower_call(env, expr, call),
            ExprKind::TypeAssert(assert) => {
                let Some(ty_expr) = &assert.ty else {
                    return Err(Error::UnsupportedExpr {
                        kind: "type switch guard outside a type switch".to_string(),
                        span: expr.span,
                    });
                };
                let ty = Self::source_type(env, ty_expr)?;
                let x = self.lower(env, &assert.x)?;
                let comma_ok = matches!(env.type_of(expr), Some(Type::Tuple(_)));
                Ok(format!(
                    "{}({}, {}{})",
                    runtime::ASSERT_TYPE,
                    x,
                    type_name(&ty),
                    if comma_ok { ", true" } else { "" }
                ))
            }
            ExprKind::FuncLit(lit) => self.lower_func_lit(env, lit),
        }
    }

    fn lower_converted(&mut self, env: &Env<'_>, expr: &Expr, target: &Type) -> Result<String> {
        let Some(source) = env.type_or_object_type(expr).cloned() else {
            return self.lower(env, expr);
        };
        if source.is_untyped_nil() {
            return Ok(self.zero_value(target));
        }
        let text = self.lower(env, expr)?;

        if target.is_interface() {
            if source.is_interface() {
                return Ok(text);
            }
            return Ok(match source.underlying() {
                Type::Struct(_) if needs_copy(expr) => format!("{}({})", runtime::CLONE, text),
                Type::Struct(_) => text,
                _ => format!("new {}({})", type_name(&source), text),
            });
        }
        if env.value_of(expr).is_some() {
            return Ok(text);
        }

        match (source.underlying(), target.underlying()) {
            (Type::Struct(_), _) | (Type::Array(_), _) if needs_copy(expr) => {
                Ok(format!("{}({})", runtime::CLONE, text))
            }
            (Type::Basic(from), Type::Basic(to)) if from != to && to.is_integer() => {
                if from.is_integer() {
                    Ok(wrap_integer(text, *to))
                } else {
                    Ok(wrap_integer(format!("Math.trunc({})", text), *to))
                }
            }
            _ => Ok(text),
        }
    }

    fn lower_args(
        &mut self,
        env: &Env<'_>,
        sig: &Signature,
        args: &[Expr],
        ellipsis: bool,
    ) -> Result<String> {
        let packed = sig.variadic && !ellipsis;
        let fixed = if packed {
            sig.params.len().saturating_sub(1)
        } else {
            args.len()
        };
        let mut parts = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().take(fixed).enumerate() {
            parts.push(match sig.params.get(i) {
                Some(ty) => self.lower_converted(env, arg, ty)?,
                None => self.lower(env, arg)?,
            });
        }
        if packed {
            let elem = sig.params.last().and_then(Type::elem).cloned();
            let mut rest = Vec::new();
            for arg in args.iter().skip(fixed) {
                rest.push(match &elem {
                    Some(elem) => self.lower_converted(env, arg, elem)?,
                    None => self.lower(env, arg)?,
                });
            }
            parts.push(format!("new {}([{}])", runtime::SLICE, rest.join(", ")));
        }
        Ok(parts.join(", "))
    }

    fn type_check(&self, type_var: &str, ty: &Type) -> String {
        if ty.is_untyped_nil() {
            return format!("{} === null", type_var);
        }
        match ty.underlying() {
            Type::Interface(iface) if iface.methods.is_empty() => {
                format!("{} !== null", type_var)
            }
            Type::Interface(_) => format!(
                "{type_var} !== null && {}.Go$implementedBy.indexOf({type_var}) !== -1",
                type_name(ty)
            ),
            _ => format!("{} === {}", type_var, type_name(ty)),
        }
    }

    fn zero_value(&self, ty: &Type) -> String {
        match ty.underlying() {
            Type::Basic(kind) if kind.is_string() => "\"\"".to_string(),
            Type::Basic(BasicKind::Bool | BasicKind::UntypedBool) => "false".to_string(),
            Type::Basic(BasicKind::UntypedNil) => "null".to_string(),
            Type::Basic(kind) if kind.is_complex() => {
                format!("new {}(0, 0)", basic_type_name(*kind))
            }
            Type::Basic(_) => "0".to_string(),
            Type::Struct(structure) => match ty {
                Type::Named(named) => format!(
                    "new {}({})",
                    mangle(&named.name),
                    structure
                        .fields
                        .iter()
                        .map(|field| self.zero_value(&field.ty))
                        .join(", ")
                ),
                _ if structure.fields.is_empty() => "{}".to_string(),
                _ => format!(
                    "{{ {} }}",
                    structure
                        .fields
                        .iter()
                        .map(|field| format!("{}: {}", field.name, self.zero_value(&field.ty)))
                        .join(", ")
                ),
            },
            Type::Array(array) if array.len <= 16 => format!(
                "[{}]",
                std::iter::repeat_with(|| self.zero_value(&array.elem))
                    .take(array.len as usize)
                    .join(", ")
            ),
            Type::Array(array) => format!(
                "{}({}, function() {{ return {}; }})",
                runtime::MAKE_ARRAY,
                array.len,
                self.zero_value(&array.elem)
            ),
            Type::Slice(_) => runtime::SLICE_NIL.to_string(),
            Type::Named(_)
            | Type::Map(_)
            | Type::Pointer(_)
            | Type::Chan(_)
            | Type::Interface(_)
            | Type::Signature(_) => "null".to_string(),
            Type::Tuple(_) => "undefined".to_string(),
        }
    }
}

/// Struct and array values produced by a call are already fresh.
fn needs_copy(expr: &Expr) -> bool {
    !matches!(
        expr.strip_parens().kind,
        ExprKind::Call(_) | ExprKind::FuncLit(_)
    )
}

/// Truncates `text` to the width of a narrow integer kind.
fn wrap_integer(text: String, kind: BasicKind) -> String {
    match (kind.narrow_bits(), kind.is_unsigned()) {
        (Some(32), false) => format!("({}) >> 0", text),
        (Some(32), true) => format!("({}) >>> 0", text),
        (Some(bits), false) => format!("({}) << {shift} >> {shift}", text, shift = 32 - bits),
        (Some(bits), true) => format!("({}) & {:#x}", text, (1u32 << bits) - 1),
        (None, _) => text,
    }
}

fn render_const(value: &ConstValue) -> Result<String> {
    Ok(match value {
        ConstValue::Bool(value) => value.to_string(),
        ConstValue::Int(value) => value.to_string(),
        ConstValue::Float(value) => value.to_string(),
        ConstValue::String(value) => encode_string(value)?,
    })
}

/// Source strings are byte sequences; each byte becomes one UTF-16 unit.
pub fn encode_string(value: &str) -> Result<String> {
    let units: String = value.bytes().map(char::from).collect();
    Ok(serde_json::to_string(&units)?)
}

fn lower_lit(expr: &Expr, lit: &ExprLit) -> Result<String> {
    let unsupported = || Error::UnsupportedExpr {
        kind: format!("literal {}", lit.value),
        span: expr.span,
    };
    match lit.kind {
        LitKind::Int | LitKind::Float => Ok(lit.value.replace('_', "")),
        LitKind::String if lit.value.starts_with('`') => {
            encode_string(lit.value.trim_matches('`'))
        }
        LitKind::String => Ok(lit.value.clone()),
        LitKind::Char => char_code(&lit.value)
            .map(|code| code.to_string())
            .ok_or_else(unsupported),
        LitKind::Imag => Err(unsupported()),
    }
}

fn char_code(spelling: &str) -> Option<u32> {
    let inner = spelling.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    match (chars.next()?, chars.next(), chars.next()) {
        (c, None, _) => Some(c as u32),
        ('\\', Some(escape), None) => match escape {
            'n' => Some(10),
            't' => Some(9),
            'r' => Some(13),
            '0' => Some(0),
            '\\' => Some(92),
            '\'' => Some(39),
            _ => None,
        },
        _ => None,
    }
}

fn basic_type_name(kind: BasicKind) -> String {
    let name = match kind {
        BasicKind::UntypedBool => "bool",
        BasicKind::UntypedInt => "int",
        BasicKind::UntypedRune => "int32",
        BasicKind::UntypedFloat => "float64",
        BasicKind::UntypedString => "string",
        BasicKind::UntypedNil => return "null".to_string(),
        BasicKind::UnsafePointer => "unsafePointer",
        other => other.name(),
    };
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("Go${}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

/// Runtime constructor identifying values of `ty`.
pub fn type_name(ty: &Type) -> String {
    match ty {
        Type::Named(named) => mangle(&named.name),
        Type::Basic(kind) => basic_type_name(*kind),
        Type::Pointer(elem) => format!("{}.Go$Ptr", type_name(elem)),
        Type::Struct(_) => "Go$Struct".to_string(),
        Type::Array(_) => "Go$Array".to_string(),
        Type::Slice(_) => runtime::SLICE.to_string(),
        Type::Map(_) => "Go$Map".to_string(),
        Type::Chan(_) => "Go$Chan".to_string(),
        Type::Interface(_) => "Go$Interface".to_string(),
        Type::Signature(_) => "Go$Func".to_string(),
        Type::Tuple(_) => "Go$Tuple".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gojs_core::ast::AstBuilder;
    use gojs_core::config::LowerConfig;
    use pretty_assertions::assert_eq;

    fn lower_with(b: AstBuilder, expr: &Expr) -> String {
        let info = b.into_info();
        let config = LowerConfig::default();
        let env = Env::new(&info, &config);
        JsExprLowering::new().lower(&env, expr).unwrap()
    }

    #[test]
    fn narrow_arithmetic_is_truncated() {
        let mut b = AstBuilder::new();
        let byte = Type::Basic(BasicKind::Uint8);
        b.var("x", byte.clone());
        let x = b.ident("x");
        let one = b.typed_int(1, byte);
        let sum = b.binary(BinOp::Add, x, one);
        assert_eq!(lower_with(b, &sum), "(x + 1) & 0xff");
    }

    #[test]
    fn slice_and_map_reads() {
        let mut b = AstBuilder::new();
        b.var("s", Type::slice(Type::int()));
        b.var("m", Type::map(Type::string(), Type::int()));
        let s = b.ident("s");
        let i = b.int(2);
        let read = b.index(s, i, Type::int());
        let m = b.ident("m");
        let k = b.string("a");
        let lookup = b.index(m, k, Type::int());
        let info = b.into_info();
        let config = LowerConfig::default();
        let env = Env::new(&info, &config);
        let mut js = JsExprLowering::new();
        assert_eq!(js.lower(&env, &read).unwrap(), "s.array[s.offset + 2]");
        assert_eq!(js.lower(&env, &lookup).unwrap(), r#"(m["a"] || { v: 0 }).v"#);
    }

    #[test]
    fn strings_are_encoded_per_byte() {
        assert_eq!(encode_string("hi\n").unwrap(), r#""hi\n""#);
        assert_eq!(encode_string("é").unwrap(), "\"\u{c3}\u{a9}\"");
    }

    #[test]
    fn type_checks_by_kind() {
        let js = JsExprLowering::new();
        let point = Type::named("Point", Type::structure(vec![("x", Type::int())]));
        assert_eq!(js.type_check("_type", &point), "_type === Point");
        assert_eq!(js.type_check("_type", &Type::int()), "_type === Go$Int");
        assert_eq!(js.type_check("_type", &Type::untyped_nil()), "_type === null");
        assert_eq!(
            js.type_check("_type", &Type::empty_interface()),
            "_type !== null"
        );
    }

    #[test]
    fn zero_values_follow_the_type() {
        let js = JsExprLowering::new();
        let point = Type::named(
            "Point",
            Type::structure(vec![("x", Type::int()), ("label", Type::string())]),
        );
        assert_eq!(js.zero_value(&point), r#"new Point(0, "")"#);
        assert_eq!(js.zero_value(&Type::array(Type::bool(), 2)), "[false, false]");
        assert_eq!(js.zero_value(&Type::slice(Type::int())), "Go$Slice.Go$nil");
    }
}
