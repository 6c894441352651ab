use std::collections::HashMap;

use gojs_core::ast::{Expr, ExprKind, NodeId};
use gojs_core::config::LowerConfig;
use gojs_core::error::Error;
use gojs_core::semantic::{ConstValue, Object, ObjectId};
use gojs_core::span::Span;
use gojs_core::types::Type;
use gojs_core::{Result, SemanticModel};

/// Semantic view of one function lowering: the read-only model plus an
/// overlay describing the synthetic nodes created while lowering it, and the
/// narrowed-variable table of the type switches currently being lowered.
pub struct Env<'a> {
    model: &'a dyn SemanticModel,
    config: &'a LowerConfig,
    types: HashMap<NodeId, Type>,
    values: HashMap<NodeId, ConstValue>,
    next_synthetic: u32,
    narrowed: HashMap<ObjectId, String>,
}

impl<'a> Env<'a> {
    pub fn new(model: &'a dyn SemanticModel, config: &'a LowerConfig) -> Self {
        Self {
            model,
            config,
            types: HashMap::new(),
            values: HashMap::new(),
            next_synthetic: NodeId::SYNTHETIC_BASE,
            narrowed: HashMap::new(),
        }
    }

    /// Environment for a function literal nested in this one. Narrowed
    /// variables stay visible; synthetic nodes do not.
    pub fn child(&self) -> Env<'a> {
        Env {
            narrowed: self.narrowed.clone(),
            ..Env::new(self.model, self.config)
        }
    }

    pub fn model(&self) -> &'a dyn SemanticModel {
        self.model
    }

    pub fn config(&self) -> &'a LowerConfig {
        self.config
    }

    pub fn type_of(&self, expr: &Expr) -> Option<&Type> {
        self.types
            .get(&expr.id)
            .or_else(|| self.model.type_of(expr.id))
    }

    pub fn expect_type(&self, expr: &Expr) -> Result<&Type> {
        self.type_of(expr).ok_or(Error::MissingType {
            node: expr.id,
            span: expr.span,
        })
    }

    pub fn value_of(&self, expr: &Expr) -> Option<&ConstValue> {
        self.values
            .get(&expr.id)
            .or_else(|| self.model.value_of(expr.id))
    }

    pub fn object_of(&self, expr: &Expr) -> Option<&'a Object> {
        self.model.object_of(expr.id)
    }

    pub fn implicit_of(&self, clause: NodeId) -> Option<&'a Object> {
        self.model.implicit_of(clause)
    }

    /// Static type of `expr`, falling back to the type of the object it
    /// defines (defining identifiers carry no expression type).
    pub fn type_or_object_type(&self, expr: &Expr) -> Option<&Type> {
        self.type_of(expr)
            .or_else(|| self.object_of(expr).map(|object| &object.ty))
    }

    pub fn synthesize(&mut self, kind: ExprKind, span: Span, ty: Option<Type>) -> Expr {
        let id = NodeId(self.next_synthetic);
        self.next_synthetic += 1;
        if let Some(ty) = ty {
            self.types.insert(id, ty);
        }
        Expr::new(id, kind).with_span(span)
    }

    /// An expression standing for already-lowered text such as a temporary.
    pub fn synthetic(&mut self, text: impl Into<String>, ty: Option<Type>) -> Expr {
        self.synthesize(ExprKind::Synthetic(text.into()), Span::null(), ty)
    }

    pub fn record_value(&mut self, node: NodeId, value: ConstValue) {
        self.values.insert(node, value);
    }

    pub fn narrow(&mut self, object: ObjectId, name: impl Into<String>) {
        self.narrowed.insert(object, name.into());
    }

    pub fn unnarrow(&mut self, object: ObjectId) {
        self.narrowed.remove(&object);
    }

    pub fn narrowed_name(&self, object: ObjectId) -> Option<&str> {
        self.narrowed.get(&object).map(String::as_str)
    }

    pub fn narrowed_names(&self) -> impl Iterator<Item = &str> {
        self.narrowed.values().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gojs_core::ast::AstBuilder;

    #[test]
    fn overlay_types_shadow_nothing_in_the_model() {
        let mut b = AstBuilder::new();
        b.var("x", Type::int());
        let x = b.ident("x");
        let info = b.into_info();
        let config = LowerConfig::default();
        let mut env = Env::new(&info, &config);

        let tmp = env.synthetic("_ref", Some(Type::string()));
        assert!(tmp.id.is_synthetic());
        assert_eq!(env.type_of(&tmp), Some(&Type::string()));
        assert_eq!(env.type_of(&x), Some(&Type::int()));
    }

    #[test]
    fn missing_types_report_the_node() {
        let info = gojs_core::TypeInfo::new();
        let config = LowerConfig::default();
        let env = Env::new(&info, &config);
        let expr = Expr::new(NodeId(7), ExprKind::Synthetic("x".into()));
        let err = env.expect_type(&expr).unwrap_err();
        assert!(matches!(err, Error::MissingType { node, .. } if node == NodeId(7)));
    }

    #[test]
    fn children_inherit_narrowed_names() {
        let info = gojs_core::TypeInfo::new();
        let config = LowerConfig::default();
        let mut env = Env::new(&info, &config);
        env.narrow(ObjectId(3), "v");
        let child = env.child();
        assert_eq!(child.narrowed_name(ObjectId(3)), Some("v"));
        env.unnarrow(ObjectId(3));
        assert_eq!(env.narrowed_name(ObjectId(3)), None);
    }
}
