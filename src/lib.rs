//! Derives `async-graphql` schemas from shape descriptors and typed operations.
//!
//! Shapes ([`ast::Ast`]) describe data; operations ([`Operation`]) describe
//! requests with a payload, a success shape and a failure shape. A
//! [`SchemaDefinition`] registers operations as root fields or as resolvers of
//! fields of named types, and [`compile`] turns it into an executable
//! [`BuiltSchema`] whose resolvers submit requests to an [`ExecutionBackend`].

pub mod ast;
pub mod backend;
pub mod compile;
pub mod config;
pub mod error;
pub mod operation;
pub mod registry;
pub mod resolver;
pub mod server;
pub mod value;

pub use async_graphql_value::ConstValue;
pub use ast::{Ast, PropertySignature};
pub use backend::{BoxFuture, ExecutionBackend, Outcome, TaggedBackend};
pub use compile::{compile, compile_with, Compiler};
pub use config::{BackendConfig, CompilerConfig, ServerConfig, UnionMemberPolicy};
pub use error::{CompileError, Error, ExecutionError, LiteralError, Result, SchemaError};
pub use operation::{Operation, OperationRequest};
pub use registry::SchemaDefinition;
pub use server::{BuiltSchema, GraphQLRequest, GraphQLResponse, GraphQLServer};
