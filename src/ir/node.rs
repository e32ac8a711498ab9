//! Evaluation-tree node foundation
//!
//! Every variant of the query evaluation tree implements [`Node`], and every
//! [`Node`] gets its canonical text from the blanket [`CanonicalText`] impl.
//! Fields are discovered by `#[derive(Serialize)]`, so adding a field to a
//! variant adds it to the text without touching any formatting code.

use std::fmt;

use serde::Serialize;
use tracing::trace;

use super::encoder::{self, EncodeOptions};
use crate::error::EncodingError;

/// Discriminator for the node variants, used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    // Query document
    Query,
    Selector,
    TableRef,
    ColumnRef,
    Term,
    Comparison,
    Literal,

    // Expression tree
    LiteralExpr,
    ColumnExpr,
    BinaryExpr,

    // Table document
    Table,

    /// Variants defined outside this crate.
    Custom(&'static str),
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Query => write!(f, "Query"),
            NodeType::Selector => write!(f, "Selector"),
            NodeType::TableRef => write!(f, "TableRef"),
            NodeType::ColumnRef => write!(f, "ColumnRef"),
            NodeType::Term => write!(f, "Term"),
            NodeType::Comparison => write!(f, "Comparison"),
            NodeType::Literal => write!(f, "Literal"),
            NodeType::LiteralExpr => write!(f, "Expr::Literal"),
            NodeType::ColumnExpr => write!(f, "Expr::Column"),
            NodeType::BinaryExpr => write!(f, "Expr::Binary"),
            NodeType::Table => write!(f, "Table"),
            NodeType::Custom(name) => write!(f, "Custom::{}", name),
        }
    }
}

/// Core trait for all evaluation-tree nodes.
///
/// The public field set of a variant is whatever its `Serialize` impl
/// writes; implementations are expected to derive it.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so trees can be logged from any thread.
pub trait Node: Serialize + fmt::Debug + Send + Sync {
    /// Returns the discriminator type for this node
    fn node_type(&self) -> NodeType;
}

/// Canonical text of a node.
///
/// Implemented for every [`Node`] by a blanket impl; a variant cannot
/// provide its own, which keeps the format uniform across the tree.
pub trait CanonicalText {
    /// Compact canonical text with default options.
    fn to_text(&self) -> Result<String, EncodingError>;

    /// Canonical text with explicit layout and depth limit.
    fn to_text_with(&self, options: &EncodeOptions) -> Result<String, EncodingError>;
}

impl<N: Node + ?Sized> CanonicalText for N {
    fn to_text(&self) -> Result<String, EncodingError> {
        self.to_text_with(&EncodeOptions::default())
    }

    fn to_text_with(&self, options: &EncodeOptions) -> Result<String, EncodingError> {
        trace!("Encoding {} node", self.node_type());
        encoder::encode(self, options)
    }
}

/// Implements `Display` for node variants by forwarding to
/// [`CanonicalText::to_text`]. An encoding failure becomes `fmt::Error`.
#[macro_export]
macro_rules! impl_node_display {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ::std::fmt::Display for $ty {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    match $crate::ir::node::CanonicalText::to_text(self) {
                        Ok(text) => f.write_str(&text),
                        Err(err) => {
                            ::tracing::warn!("Cannot display {} node: {}", $crate::ir::node::Node::node_type(self), err);
                            Err(::std::fmt::Error)
                        }
                    }
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize)]
    struct Marker {
        label: &'static str,
        weight: u32,
    }

    impl Node for Marker {
        fn node_type(&self) -> NodeType {
            NodeType::Custom("Marker")
        }
    }

    crate::impl_node_display!(Marker);

    #[test]
    fn test_to_text_uses_fields() {
        let marker = Marker { label: "m", weight: 3 };
        assert_eq!(marker.to_text().unwrap(), r#"{"label":"m","weight":3}"#);
    }

    #[test]
    fn test_display_matches_to_text() {
        let marker = Marker { label: "m", weight: 3 };
        assert_eq!(marker.to_string(), marker.to_text().unwrap());
    }

    #[test]
    fn test_node_type_display() {
        assert_eq!(NodeType::BinaryExpr.to_string(), "Expr::Binary");
        assert_eq!(NodeType::Custom("Plan").to_string(), "Custom::Plan");
    }
}
