use async_graphql_value::ConstValue;

use super::Ast;

/// Well-known annotations carried by shape nodes and property signatures.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    /// Stable name of the node; names every GraphQL type emitted for it.
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub default: Option<ConstValue>,
    pub deprecation_reason: Option<String>,
    pub brands: Vec<String>,
    /// Number refinements marked as integers compile to `Int`.
    pub integer: bool,
    /// Interfaces a named object declares it implements.
    pub extends_interface: Vec<Ast>,
    /// Named object compiles to a GraphQL interface instead of an object type.
    pub graphql_interface: bool,
    /// Struct backing a named, constructible object.
    pub surrogate: Option<Ast>,
    /// Content fingerprint, used as cache key when no identifier exists.
    pub reference: Option<String>,
}

impl Annotations {
    pub fn has_brand(&self, brand: &str) -> bool {
        self.brands.iter().any(|b| b == brand)
    }
}
