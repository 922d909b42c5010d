use std::time::Duration;

use serde::Deserialize;

use crate::ast::{GQL_ID, TAG};

/// Settings read by the compiler while translating shapes into GraphQL types.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    pub query_type_name: String,
    pub mutation_type_name: String,
    /// Discriminator field; omitted from input objects and read by union type resolvers.
    pub tag_field: String,
    /// Synthetic payload field carrying the parent value of a nested resolver.
    pub parent_field: String,
    /// Brand that turns a string into a GraphQL `ID`.
    pub id_brand: String,
    pub union_members: UnionMemberPolicy,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            query_type_name: String::from("Query"),
            mutation_type_name: String::from("Mutation"),
            tag_field: String::from(TAG),
            parent_field: String::from("parent"),
            id_brand: String::from(GQL_ID),
            union_members: UnionMemberPolicy::default(),
        }
    }
}

impl CompilerConfig {
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// What to do with union members that do not compile to object types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnionMemberPolicy {
    /// Drop the member and log a warning.
    #[default]
    Warn,
    /// Fail compilation.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// How long requests are collected before a batch is dispatched.
    pub batch_delay_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { batch_delay_ms: 1 }
    }
}

impl BackendConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub listen: String,
    pub path: String,
    pub playground: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: String::from("127.0.0.1:4000"),
            path: String::from("/graphql"),
            playground: true,
        }
    }
}

impl ServerConfig {
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
