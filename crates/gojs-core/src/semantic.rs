//! Read-only semantic facts about a type-checked tree.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ast::NodeId;
use crate::types::Type;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[display("obj{_0}")]
pub struct ObjectId(pub u32);

common_enum! {
    #[derive(Copy, Eq)]
    pub enum ObjectKind {
        Var,
        Const,
        TypeName,
        Func,
        Builtin,
        PkgName,
        Nil,
    }
}

common_struct! {
    /// A resolved binding: what an identifier refers to.
    pub struct Object {
        pub id: ObjectId,
        pub name: String,
        pub kind: ObjectKind,
        pub ty: Type,
    }
}

common_enum! {
    pub enum ConstValue {
        Bool(bool),
        Int(i64),
        Float(f64),
        String(String),
    }
}

/// The oracle the lowering engine consults, keyed by node identity.
pub trait SemanticModel {
    /// Resolved static type of an expression.
    fn type_of(&self, node: NodeId) -> Option<&Type>;
    /// Constant value of an expression, when it is a constant.
    fn value_of(&self, node: NodeId) -> Option<&ConstValue>;
    /// Object an identifier defines or uses.
    fn object_of(&self, node: NodeId) -> Option<&Object>;
    /// Implicit per-clause object of a type switch with a binding.
    fn implicit_of(&self, clause: NodeId) -> Option<&Object>;
}

/// In-memory [`SemanticModel`] filled in by a type checker or by the
/// `AstBuilder` of the `test-support` feature.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    types: HashMap<NodeId, Type>,
    values: HashMap<NodeId, ConstValue>,
    objects: Vec<Object>,
    bindings: HashMap<NodeId, ObjectId>,
    implicits: HashMap<NodeId, ObjectId>,
}

impl TypeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_type(&mut self, node: NodeId, ty: Type) {
        self.types.insert(node, ty);
    }

    pub fn record_value(&mut self, node: NodeId, value: ConstValue) {
        self.values.insert(node, value);
    }

    pub fn new_object(&mut self, name: impl Into<String>, kind: ObjectKind, ty: Type) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(Object {
            id,
            name: name.into(),
            kind,
            ty,
        });
        id
    }

    pub fn bind(&mut self, node: NodeId, object: ObjectId) {
        self.bindings.insert(node, object);
    }

    pub fn record_implicit(&mut self, clause: NodeId, object: ObjectId) {
        self.implicits.insert(clause, object);
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id.0 as usize)
    }

    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.iter()
    }
}

impl SemanticModel for TypeInfo {
    fn type_of(&self, node: NodeId) -> Option<&Type> {
        self.types.get(&node)
    }

    fn value_of(&self, node: NodeId) -> Option<&ConstValue> {
        self.values.get(&node)
    }

    fn object_of(&self, node: NodeId) -> Option<&Object> {
        self.bindings.get(&node).and_then(|id| self.object(*id))
    }

    fn implicit_of(&self, clause: NodeId) -> Option<&Object> {
        self.implicits.get(&clause).and_then(|id| self.object(*id))
    }
}
