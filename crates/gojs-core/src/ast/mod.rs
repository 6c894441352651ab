//! Source-language syntax trees handed to the lowering engine.
//!
//! Trees are immutable once built. Every expression, statement and case
//! clause carries a [`NodeId`] that keys the semantic model; the lowering
//! engine never mutates source nodes and records facts about the synthetic
//! nodes it creates in its own overlay.

use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-support"))]
mod build;
mod expr;
mod stmt;

#[cfg(any(test, feature = "test-support"))]
pub use build::*;
pub use expr::*;
pub use stmt::*;

/// Identity of a tree node, used to query the semantic model.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[display("#{_0}")]
pub struct NodeId(pub u32);

impl NodeId {
    /// Ids at or above this value belong to nodes synthesized during lowering.
    pub const SYNTHETIC_BASE: u32 = 1 << 31;

    pub fn is_synthetic(self) -> bool {
        self.0 >= Self::SYNTHETIC_BASE
    }
}

/// A simple identifier - a single name like `foo` or `_`
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Ident {
    pub name: String,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn as_str(&self) -> &str {
        self.name.as_str()
    }

    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self {
        Ident::new(name)
    }
}
