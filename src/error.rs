use async_graphql_value::ConstValue;
use thiserror::Error;

/// Configuration errors raised while compiling shapes into GraphQL types.
///
/// Any of these aborts schema construction; there is no partial schema.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompileError {
    #[error("{kind} must have an identifier annotation: {node}")]
    MissingIdentifier { kind: &'static str, node: String },

    #[error("Only tagged class transformations are supported, {node} has no surrogate annotation")]
    NotASurrogateTransform { node: String },

    #[error("`{object}` extends `{interface}`, which does not compile to an interface")]
    NotAnInterface { object: String, interface: String },

    #[error("Unions are not supported in input position: {node}")]
    InputUnion { node: String },

    #[error("Cannot compile tuple type without element or rest definition: {node}")]
    EmptyTuple { node: String },

    #[error("Could not compile {position} type for {node}")]
    UnsupportedNode {
        position: &'static str,
        node: String,
    },

    #[error("Union {node} has no object type members")]
    UnionWithoutObjects { node: String },

    #[error("Union {union} cannot contain non-object members: {members}")]
    NonObjectUnionMembers { union: String, members: String },

    #[error("Type name `{name}` is produced by two different shapes")]
    DuplicateTypeName { name: String },

    #[error("Schema definition has operations but no execution backend")]
    MissingBackend,

    #[error("`{type_name}` has no field `{field}` to resolve")]
    UnknownField { type_name: String, field: String },
}

/// Errors raised by a custom scalar while parsing a query literal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LiteralError {
    #[error("Unsupported literal kind: {kind}")]
    UnsupportedKind { kind: &'static str },

    #[error("Variable `${name}` is not defined")]
    UnboundVariable { name: String },

    #[error("Failed to decode {scalar}: {message}")]
    Decode { scalar: String, message: String },
}

/// Errors surfaced by an execution backend for a single operation request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutionError {
    #[error("Operation `{tag}` failed")]
    Failure { tag: String, value: ConstValue },

    #[error("No handler registered for operation `{tag}`")]
    UnknownOperation { tag: String },

    #[error("Handler for `{tag}` returned {actual} results for {expected} requests")]
    BatchMismatch {
        tag: String,
        expected: usize,
        actual: usize,
    },

    #[error("Operation `{tag}` was dropped before it completed")]
    Dropped { tag: String },

    #[error("Invalid payload for `{tag}`: {message}")]
    Payload { tag: String, message: String },
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to build GraphQL schema: {message}")]
    BuildError { message: String },

    #[error(transparent)]
    Compile(#[from] CompileError),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        Error::Schema(SchemaError::Compile(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
