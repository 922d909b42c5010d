use indexmap::IndexMap;

use crate::ast::{Ast, AstKind, PropertySignature};
use crate::error::CompileError;
use crate::operation::Operation;

use super::cache::Scope;
use super::types::{CompiledType, GqlTypeRef, InputField, NamedRef};
use super::Compiler;

impl<'a> Compiler<'a> {
    /// Input type of `ast`. Non-null unless the shape is `union(T, undefined)`.
    pub fn input_type(&mut self, ast: &Ast) -> Result<GqlTypeRef, CompileError> {
        let ast = ast.resolve();
        if let Some(member) = ast.optional_member() {
            return Ok(self.input_type(member)?.nullable());
        }
        Ok(self.input_base(&ast)?.non_null())
    }

    fn input_base(&mut self, ast: &Ast) -> Result<GqlTypeRef, CompileError> {
        if let Some(leaf) = self.leaf_type(ast)? {
            return Ok(GqlTypeRef::named(leaf));
        }

        match ast.kind() {
            AstKind::TupleType { elements, rest } => {
                let item = elements
                    .first()
                    .or_else(|| rest.first())
                    .ok_or_else(|| CompileError::EmptyTuple {
                        node: ast.to_string(),
                    })?;
                Ok(self.input_type(item)?.list())
            }
            AstKind::Union { .. } => Err(CompileError::InputUnion {
                node: ast.to_string(),
            }),
            AstKind::TypeLiteral {
                property_signatures,
            } => self
                .input_object(ast, property_signatures)
                .map(GqlTypeRef::named),
            AstKind::Refinement { from, .. } => self.input_base(&from.resolve()),
            AstKind::Suspend(_) => self.input_base(&ast.resolve()),
            AstKind::Transformation { .. }
            | AstKind::Keyword(_)
            | AstKind::Literal(_)
            | AstKind::Enums { .. }
            | AstKind::Declaration { .. } => Err(CompileError::UnsupportedNode {
                position: "input",
                node: ast.to_string(),
            }),
        }
    }

    fn input_object(
        &mut self,
        ast: &Ast,
        properties: &[PropertySignature],
    ) -> Result<NamedRef, CompileError> {
        let name = ast
            .identifier_annotation()
            .ok_or_else(|| CompileError::MissingIdentifier {
                kind: "TypeLiteral",
                node: ast.to_string(),
            })?;

        let (ty, created) = self.cache.get_or_try_insert(Scope::Input, ast, |_| {
            Ok::<_, CompileError>(CompiledType::input_object(name, ast.description_annotation()))
        })?;

        if created {
            tracing::debug!(name = %ty.name, "compiled input object");
            let owner = ty.clone();
            let properties = properties.to_vec();
            self.defer(move |compiler| {
                let fields = compiler.input_fields(&properties)?;
                owner.set_input_fields(fields);
                Ok(())
            });
        }
        Ok(NamedRef::of(&ty))
    }

    /// One input field per property, skipping the tag discriminator.
    pub fn input_fields<'p>(
        &mut self,
        properties: impl IntoIterator<Item = &'p PropertySignature>,
    ) -> Result<IndexMap<String, InputField>, CompileError> {
        let mut fields = IndexMap::new();
        for property in properties {
            if property.name == self.config.tag_field {
                continue;
            }
            let ty = self.input_type(&property.ty)?;
            let ty = if property.is_optional { ty.nullable() } else { ty };
            fields.insert(
                property.name.clone(),
                InputField {
                    ty,
                    description: property.description_annotation().map(str::to_string),
                    default: property.default_annotation().cloned(),
                    deprecation: property.deprecation_annotation().map(str::to_string),
                },
            );
        }
        Ok(fields)
    }

    /// Arguments of a field resolved by `operation`: its payload without the
    /// synthetic parent entry.
    pub fn argument_fields(
        &mut self,
        operation: &Operation,
    ) -> Result<IndexMap<String, InputField>, CompileError> {
        let config = self.config;
        self.input_fields(operation.arguments(&config.parent_field))
    }
}
