use std::sync::Arc;

use indexmap::IndexMap;

use crate::ast::{Ast, AstKind, PropertySignature};
use crate::config::UnionMemberPolicy;
use crate::error::CompileError;
use crate::operation::Operation;
use crate::resolver::OperationResolver;

use super::cache::Scope;
use super::types::{CompiledType, GqlTypeRef, NamedRef, OutputField, TypeKind};
use super::Compiler;

impl<'a> Compiler<'a> {
    /// Output type of `ast`. Non-null unless the shape is a union with an
    /// `undefined` member.
    pub fn output_type(&mut self, ast: &Ast) -> Result<GqlTypeRef, CompileError> {
        let ast = ast.resolve();
        if let AstKind::Union { types } = ast.kind() {
            let members: Vec<Ast> = types
                .iter()
                .filter(|member| !member.resolve().is_undefined())
                .cloned()
                .collect();
            let optional = members.len() < types.len();
            let ty = match members.as_slice() {
                [member] => self.output_type(member)?,
                _ => GqlTypeRef::named(self.union_type(&ast, &members)?),
            };
            return Ok(if optional { ty.nullable() } else { ty.non_null() });
        }
        Ok(self.output_base(&ast)?.non_null())
    }

    fn output_base(&mut self, ast: &Ast) -> Result<GqlTypeRef, CompileError> {
        if let Some(leaf) = self.leaf_type(ast)? {
            return Ok(GqlTypeRef::named(leaf));
        }

        match ast.kind() {
            AstKind::TupleType { elements, rest } => {
                let item = rest
                    .first()
                    .or_else(|| elements.first())
                    .ok_or_else(|| CompileError::EmptyTuple {
                        node: ast.to_string(),
                    })?;
                Ok(self.output_type(item)?.list())
            }
            AstKind::TypeLiteral {
                property_signatures,
            } => self
                .struct_interface(ast, property_signatures)
                .map(GqlTypeRef::named),
            AstKind::Transformation { .. } => match ast.surrogate_annotation() {
                Some(surrogate) => self
                    .surrogate_type(ast, surrogate)
                    .map(GqlTypeRef::named),
                None => Err(CompileError::NotASurrogateTransform {
                    node: ast.to_string(),
                }),
            },
            AstKind::Refinement { from, .. } => self.output_base(&from.resolve()),
            AstKind::Suspend(_) => self.output_base(&ast.resolve()),
            AstKind::Union { .. } => self.output_type(ast).map(GqlTypeRef::nullable),
            AstKind::Keyword(_)
            | AstKind::Literal(_)
            | AstKind::Enums { .. }
            | AstKind::Declaration { .. } => Err(CompileError::UnsupportedNode {
                position: "output",
                node: ast.to_string(),
            }),
        }
    }

    /// A bare struct: an interface named by its identifier.
    fn struct_interface(
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

        let (ty, created) = self.cache.get_or_try_insert(Scope::Output, ast, |_| {
            Ok::<_, CompileError>(CompiledType::interface(name, ast.description_annotation()))
        })?;

        if created {
            tracing::debug!(name = %ty.name, "compiled interface");
            let owner = ty.clone();
            let properties = properties.to_vec();
            self.defer(move |compiler| {
                let fields = compiler.output_fields(&owner.name, &[], &properties)?;
                owner.set_fields(fields);
                Ok(())
            });
        }
        Ok(NamedRef::of(&ty))
    }

    /// A tagged class: an object (or interface) whose fields come from the
    /// surrogate struct and whose interfaces come from its extends annotation.
    fn surrogate_type(&mut self, ast: &Ast, surrogate: &Ast) -> Result<NamedRef, CompileError> {
        let name = ast
            .identifier_annotation()
            .ok_or_else(|| CompileError::MissingIdentifier {
                kind: "Transformation",
                node: ast.to_string(),
            })?;
        let is_interface = ast.is_graphql_interface();

        let (ty, created) = self.cache.get_or_try_insert(Scope::Output, ast, |_| {
            let description = ast
                .description_annotation()
                .or_else(|| surrogate.description_annotation());
            Ok::<_, CompileError>(if is_interface {
                CompiledType::interface(name, description)
            } else {
                CompiledType::object(name, description)
            })
        })?;

        if created {
            tracing::debug!(name = %ty.name, interface = is_interface, "compiled tagged class");
            let properties = surrogate
                .struct_properties()
                .ok_or_else(|| CompileError::NotASurrogateTransform {
                    node: ast.to_string(),
                })?;
            let extends = ast.extends_interface_annotation().to_vec();
            let owner = ty.clone();
            self.defer(move |compiler| {
                let mut interfaces = Vec::with_capacity(extends.len());
                for node in &extends {
                    compiler.output_type(node)?;
                    let interface = compiler
                        .lookup(node)
                        .filter(|compiled| compiled.is_interface())
                        .ok_or_else(|| CompileError::NotAnInterface {
                            object: owner.name.clone(),
                            interface: node.to_string(),
                        })?;
                    interfaces.push(interface);
                }

                let names: Vec<String> = interfaces.iter().map(|i| i.name.clone()).collect();
                let fields = compiler.output_fields(&owner.name, &names, &properties)?;
                owner.set_fields(fields);
                owner.set_interfaces(interfaces);
                Ok(())
            });
        }
        Ok(NamedRef::of(&ty))
    }

    /// Union over the object members of `members`, named by joining their names.
    fn union_type(&mut self, ast: &Ast, members: &[Ast]) -> Result<NamedRef, CompileError> {
        if let Some(ty) = self.cache.get(Scope::Output, ast) {
            return Ok(NamedRef::of(&ty));
        }

        let mut objects: Vec<Arc<CompiledType>> = Vec::new();
        let mut dropped = Vec::new();
        for member in members {
            self.output_type(member)?;
            match self.lookup(member) {
                Some(ty) if ty.is_object() => {
                    if !objects.iter().any(|o| Arc::ptr_eq(o, &ty)) {
                        objects.push(ty);
                    }
                }
                Some(ty) => dropped.push(ty.name.clone()),
                None => dropped.push(member.to_string()),
            }
        }

        if objects.is_empty() {
            return Err(CompileError::UnionWithoutObjects {
                node: ast.to_string(),
            });
        }

        let name = objects
            .iter()
            .map(|o| o.name.as_str())
            .collect::<Vec<_>>()
            .join("_");

        if !dropped.is_empty() {
            match self.config.union_members {
                UnionMemberPolicy::Warn => {
                    tracing::warn!(union = %name, dropped = ?dropped, "dropping non-object union members");
                }
                UnionMemberPolicy::Reject => {
                    return Err(CompileError::NonObjectUnionMembers {
                        union: name,
                        members: dropped.join(", "),
                    });
                }
            }
        }

        let ty = self.cache.insert(
            Scope::Output,
            ast,
            CompiledType::new(
                name,
                ast.description_annotation(),
                TypeKind::Union { members: objects },
            ),
        );
        tracing::debug!(name = %ty.name, "compiled union");
        Ok(NamedRef::of(&ty))
    }

    /// Output fields of the named type `owner`, binding registered operations
    /// by `owner.field`, then by each of `interfaces`.
    fn output_fields(
        &mut self,
        owner: &str,
        interfaces: &[String],
        properties: &[PropertySignature],
    ) -> Result<IndexMap<String, OutputField>, CompileError> {
        let definition = self.definition;
        let mut fields = IndexMap::new();

        for property in properties {
            if property.name == self.config.tag_field {
                continue;
            }
            let ty = self.output_type(&property.ty)?;
            let ty = if property.is_optional { ty.nullable() } else { ty };
            let description = property.description_annotation().map(str::to_string);
            let deprecation = property.deprecation_annotation().map(str::to_string);

            let binding = definition.field_resolver(owner, &property.name).or_else(|| {
                interfaces
                    .iter()
                    .find_map(|interface| definition.field_resolver(interface, &property.name))
            });

            let field = match binding {
                Some(operation) => {
                    tracing::debug!(
                        type_name = owner,
                        field = %property.name,
                        operation = %operation.tag,
                        "bound field resolver"
                    );
                    self.bound_field(operation.clone(), ty, description, deprecation)?
                }
                None => OutputField {
                    ty,
                    description,
                    deprecation,
                    args: IndexMap::new(),
                    resolver: None,
                },
            };
            fields.insert(property.name.clone(), field);
        }
        Ok(fields)
    }

    /// A field resolved by submitting `operation` to the execution backend.
    pub(super) fn bound_field(
        &mut self,
        operation: Arc<Operation>,
        ty: GqlTypeRef,
        description: Option<String>,
        deprecation: Option<String>,
    ) -> Result<OutputField, CompileError> {
        let args = self.argument_fields(&operation)?;
        let backend = self
            .definition
            .backend()
            .cloned()
            .ok_or(CompileError::MissingBackend)?;
        let resolver = OperationResolver::new(
            operation,
            backend,
            ty.clone(),
            &self.config.parent_field,
            &self.config.tag_field,
        );

        Ok(OutputField {
            ty,
            description,
            deprecation,
            args,
            resolver: Some(Arc::new(resolver)),
        })
    }
}
