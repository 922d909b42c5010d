mod axum;
mod service;

pub use self::axum::{GraphQLRequest, GraphQLResponse, GraphQLServer};
pub use service::BuiltSchema;
