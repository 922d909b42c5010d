use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::ast::Ast;
use crate::backend::ExecutionBackend;
use crate::error::CompileError;
use crate::operation::Operation;

/// Everything the compiler needs to assemble a schema: root operations,
/// per-type field resolvers and the backend that executes them.
///
/// Every `with_*` method leaves `self` untouched and returns an extended copy.
#[derive(Clone, Default)]
pub struct SchemaDefinition {
    query: IndexMap<String, Arc<Operation>>,
    mutation: IndexMap<String, Arc<Operation>>,
    field_resolvers: IndexMap<String, Arc<Operation>>,
    backend: Option<Arc<dyn ExecutionBackend>>,
}

impl SchemaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queries<I, N>(&self, queries: I) -> Self
    where
        I: IntoIterator<Item = (N, Operation)>,
        N: Into<String>,
    {
        let mut next = self.clone();
        next.query
            .extend(queries.into_iter().map(|(name, op)| (name.into(), Arc::new(op))));
        next
    }

    pub fn with_mutations<I, N>(&self, mutations: I) -> Self
    where
        I: IntoIterator<Item = (N, Operation)>,
        N: Into<String>,
    {
        let mut next = self.clone();
        next.mutation
            .extend(mutations.into_iter().map(|(name, op)| (name.into(), Arc::new(op))));
        next
    }

    /// Binds operations as resolvers of fields of the named type `shape`.
    ///
    /// Each field must exist on the shape or on one of the interfaces it
    /// extends.
    pub fn resolve_field<I, N>(&self, shape: &Ast, fields: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = (N, Operation)>,
        N: Into<String>,
    {
        let type_name = shape
            .identifier_annotation()
            .ok_or_else(|| CompileError::MissingIdentifier {
                kind: shape.kind_name(),
                node: shape.to_string(),
            })?
            .to_string();

        let mut known: Vec<String> = shape
            .struct_properties()
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.name)
            .collect();
        for interface in shape.extends_interface_annotation() {
            known.extend(
                interface
                    .struct_properties()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|p| p.name),
            );
        }

        let mut next = self.clone();
        for (field, op) in fields {
            let field = field.into();
            if !known.contains(&field) {
                return Err(CompileError::UnknownField {
                    type_name,
                    field,
                });
            }
            next.field_resolvers
                .insert(format!("{}.{}", type_name, field), Arc::new(op));
        }
        Ok(next)
    }

    pub fn with_backend(&self, backend: impl ExecutionBackend + 'static) -> Self {
        self.with_shared_backend(Arc::new(backend))
    }

    pub fn with_shared_backend(&self, backend: Arc<dyn ExecutionBackend>) -> Self {
        let mut next = self.clone();
        next.backend = Some(backend);
        next
    }

    pub fn query(&self) -> &IndexMap<String, Arc<Operation>> {
        &self.query
    }

    pub fn mutation(&self) -> &IndexMap<String, Arc<Operation>> {
        &self.mutation
    }

    pub fn field_resolvers(&self) -> &IndexMap<String, Arc<Operation>> {
        &self.field_resolvers
    }

    pub fn field_resolver(&self, type_name: &str, field: &str) -> Option<&Arc<Operation>> {
        self.field_resolvers.get(&format!("{}.{}", type_name, field))
    }

    pub fn backend(&self) -> Option<&Arc<dyn ExecutionBackend>> {
        self.backend.as_ref()
    }

    pub fn has_operations(&self) -> bool {
        !(self.query.is_empty() && self.mutation.is_empty() && self.field_resolvers.is_empty())
    }
}

impl fmt::Debug for SchemaDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDefinition")
            .field("query", &self.query.keys().collect::<Vec<_>>())
            .field("mutation", &self.mutation.keys().collect::<Vec<_>>())
            .field("field_resolvers", &self.field_resolvers.keys().collect::<Vec<_>>())
            .field("backend", &self.backend.is_some())
            .finish()
    }
}
