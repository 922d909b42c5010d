//! Shape-to-GraphQL compiler.
//!
//! A [`Compiler`] walks shapes into an intermediate set of [`CompiledType`]s,
//! memoized per compilation pass, and emits them as an `async-graphql`
//! dynamic schema. Field maps of named types are produced by deferred thunks so
//! that self-referential shapes terminate.

mod cache;
mod emit;
mod input;
mod output;
mod scalar;
mod types;

use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::ast::Ast;
use crate::config::CompilerConfig;
use crate::error::{CompileError, SchemaError};
use crate::operation::Operation;
use crate::registry::SchemaDefinition;
use crate::server::BuiltSchema;

pub use cache::{CacheKey, Scope, TypeCache};
pub use scalar::ScalarCodec;
pub use types::{
    CompiledType, EnumValue, GqlTypeRef, InputField, NamedRef, OutputField, Representation,
    TypeKind,
};

type Deferred<'a> = Box<dyn FnOnce(&mut Compiler<'a>) -> Result<(), CompileError> + 'a>;

/// State of one compilation pass over a [`SchemaDefinition`].
pub struct Compiler<'a> {
    config: &'a CompilerConfig,
    definition: &'a SchemaDefinition,
    cache: TypeCache,
    deferred: VecDeque<Deferred<'a>>,
}

impl<'a> Compiler<'a> {
    pub fn new(definition: &'a SchemaDefinition, config: &'a CompilerConfig) -> Self {
        Self {
            config,
            definition,
            cache: TypeCache::new(),
            deferred: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        self.config
    }

    pub fn definition(&self) -> &SchemaDefinition {
        self.definition
    }

    /// The named type compiled for `ast`, if any. Builtin scalars are never
    /// cached and always yield `None`.
    pub fn lookup(&self, ast: &Ast) -> Option<Arc<CompiledType>> {
        let ast = ast.resolve();
        [Scope::Output, Scope::Leaf, Scope::Input]
            .into_iter()
            .find_map(|scope| self.cache.get(scope, &ast))
    }

    fn defer(&mut self, thunk: impl FnOnce(&mut Compiler<'a>) -> Result<(), CompileError> + 'a) {
        self.deferred.push_back(Box::new(thunk));
    }

    /// Runs deferred field thunks until none are left. Thunks may compile
    /// further types and queue more thunks.
    pub fn flush(&mut self) -> Result<(), CompileError> {
        while let Some(thunk) = self.deferred.pop_front() {
            thunk(self)?;
        }
        Ok(())
    }

    /// Named types compiled so far, in first-compiled order.
    pub fn types(&self) -> impl Iterator<Item = &Arc<CompiledType>> {
        self.cache.types()
    }

    /// Builds a root object whose fields resolve `operations`.
    pub fn root_type(
        &mut self,
        name: &str,
        operations: &IndexMap<String, Arc<Operation>>,
    ) -> Result<Arc<CompiledType>, CompileError> {
        let mut fields = IndexMap::new();
        for (field, operation) in operations {
            let ty = self.output_type(&operation.success)?;
            let description = operation.success.description_annotation().map(str::to_string);
            tracing::debug!(root = name, field = %field, operation = %operation.tag, "bound root field");
            fields.insert(
                field.clone(),
                self.bound_field(operation.clone(), ty, description, None)?,
            );
        }

        let root = CompiledType::object(name, None);
        root.set_fields(fields);
        root.set_interfaces(Vec::new());
        Ok(Arc::new(root))
    }
}

/// Compiles `definition` with the default configuration.
pub fn compile(definition: &SchemaDefinition) -> Result<BuiltSchema, SchemaError> {
    compile_with(definition, &CompilerConfig::default())
}

pub fn compile_with(
    definition: &SchemaDefinition,
    config: &CompilerConfig,
) -> Result<BuiltSchema, SchemaError> {
    if definition.has_operations() && definition.backend().is_none() {
        return Err(CompileError::MissingBackend.into());
    }

    let mut compiler = Compiler::new(definition, config);
    let query = compiler.root_type(&config.query_type_name, definition.query())?;
    let mutation = if definition.mutation().is_empty() {
        None
    } else {
        Some(compiler.root_type(&config.mutation_type_name, definition.mutation())?)
    };
    compiler.flush()?;
    compiler.finish(query, mutation)
}
