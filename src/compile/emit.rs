use std::sync::Arc;

use async_graphql::dynamic::{
    Enum, EnumItem, Field, InputObject, InputValue, Interface, InterfaceField, Object, Scalar,
    Schema, SchemaBuilder, Union,
};
use indexmap::IndexMap;

use crate::error::{CompileError, SchemaError};
use crate::server::BuiltSchema;
use crate::value::PropertyResolver;

use super::types::{CompiledType, InputField, OutputField, TypeKind};
use super::Compiler;

impl Compiler<'_> {
    /// Emits every compiled type plus the root objects as a dynamic schema.
    ///
    /// Deferred thunks must have been flushed; types are registered once per
    /// name.
    pub fn finish(
        self,
        query: Arc<CompiledType>,
        mutation: Option<Arc<CompiledType>>,
    ) -> Result<BuiltSchema, SchemaError> {
        let mut emitted: IndexMap<String, Arc<CompiledType>> = IndexMap::new();
        let roots = std::iter::once(&query).chain(mutation.as_ref());
        for ty in roots.chain(self.cache.types()) {
            match emitted.get(&ty.name) {
                Some(existing) if Arc::ptr_eq(existing, ty) || existing.same_as(ty) => {}
                Some(_) => {
                    return Err(CompileError::DuplicateTypeName {
                        name: ty.name.clone(),
                    }
                    .into())
                }
                None => {
                    emitted.insert(ty.name.clone(), ty.clone());
                }
            }
        }

        let tag_field = self.config.tag_field.as_str();
        let mut builder = Schema::build(
            &query.name,
            mutation.as_ref().map(|m| m.name.as_str()),
            None,
        );
        for ty in emitted.values() {
            builder = register(builder, ty, tag_field);
        }

        let schema = builder.finish().map_err(|err| SchemaError::BuildError {
            message: err.to_string(),
        })?;
        tracing::debug!(types = emitted.len(), "schema compiled");
        Ok(BuiltSchema::from_dynamic_schema(schema))
    }
}

fn register(builder: SchemaBuilder, ty: &CompiledType, tag_field: &str) -> SchemaBuilder {
    let description = ty.description.as_deref();
    match &ty.kind {
        TypeKind::Scalar(codec) => {
            let codec = codec.clone();
            let mut scalar = Scalar::new(&ty.name).validator(move |value| codec.is_valid(value));
            if let Some(description) = description {
                scalar = scalar.description(description);
            }
            builder.register(scalar)
        }
        TypeKind::Enum(values) => {
            let mut enumeration = values
                .iter()
                .fold(Enum::new(&ty.name), |e, value| e.item(EnumItem::new(&value.name)));
            if let Some(description) = description {
                enumeration = enumeration.description(description);
            }
            builder.register(enumeration)
        }
        TypeKind::Object { .. } => {
            let mut object = Object::new(&ty.name);
            if let Some(description) = description {
                object = object.description(description);
            }
            for (name, field) in ty.fields().into_iter().flatten() {
                object = object.field(output_field(name, field, tag_field));
            }
            for interface in ty.interfaces() {
                object = object.implement(&interface.name);
            }
            builder.register(object)
        }
        TypeKind::Interface { .. } => {
            let mut interface = Interface::new(&ty.name);
            if let Some(description) = description {
                interface = interface.description(description);
            }
            for (name, field) in ty.fields().into_iter().flatten() {
                interface = interface.field(interface_field(name, field));
            }
            builder.register(interface)
        }
        TypeKind::Union { members } => {
            let mut union = members
                .iter()
                .fold(Union::new(&ty.name), |u, member| u.possible_type(&member.name));
            if let Some(description) = description {
                union = union.description(description);
            }
            builder.register(union)
        }
        TypeKind::InputObject { .. } => {
            let mut input = InputObject::new(&ty.name);
            if let Some(description) = description {
                input = input.description(description);
            }
            for (name, field) in ty.input_fields().into_iter().flatten() {
                input = input.field(input_value(name, field));
            }
            builder.register(input)
        }
    }
}

fn output_field(name: &str, field: &OutputField, tag_field: &str) -> Field {
    let type_ref = field.ty.to_type_ref();
    let mut output = match &field.resolver {
        Some(resolver) => {
            let resolver = resolver.clone();
            Field::new(name, type_ref, move |ctx| resolver.resolve(ctx))
        }
        None => {
            let resolver = PropertyResolver::new(name, field.ty.clone(), tag_field);
            Field::new(name, type_ref, move |ctx| resolver.resolve(ctx))
        }
    };

    for (arg, input) in &field.args {
        output = output.argument(input_value(arg, input));
    }
    if let Some(description) = &field.description {
        output = output.description(description);
    }
    if let Some(reason) = &field.deprecation {
        output = output.deprecation(Some(reason.as_str()));
    }
    output
}

fn interface_field(name: &str, field: &OutputField) -> InterfaceField {
    let mut output = InterfaceField::new(name, field.ty.to_type_ref());
    for (arg, input) in &field.args {
        output = output.argument(input_value(arg, input));
    }
    if let Some(description) = &field.description {
        output = output.description(description);
    }
    if let Some(reason) = &field.deprecation {
        output = output.deprecation(Some(reason.as_str()));
    }
    output
}

fn input_value(name: &str, field: &InputField) -> InputValue {
    let mut input = InputValue::new(name, field.ty.to_type_ref());
    if let Some(default) = &field.default {
        input = input.default_value(default.clone());
    }
    if let Some(description) = &field.description {
        input = input.description(description);
    }
    if let Some(reason) = &field.deprecation {
        input = input.deprecation(Some(reason.as_str()));
    }
    input
}
