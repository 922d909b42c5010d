use async_graphql::dynamic::TypeRef;
use async_graphql_value::{ConstValue, Value, Variables};

use crate::ast::{Ast, AstKind, Keyword, TransformationKind};
use crate::error::{CompileError, LiteralError};

use super::cache::Scope;
use super::types::{CompiledType, EnumValue, NamedRef, TypeKind};
use super::Compiler;

/// Coercion functions of a custom scalar, backed by the shape's own codec.
#[derive(Debug, Clone)]
pub struct ScalarCodec {
    name: String,
    shape: Ast,
}

impl ScalarCodec {
    pub fn new(name: impl Into<String>, shape: Ast) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    pub fn shape(&self) -> &Ast {
        &self.shape
    }

    pub fn parse_value(&self, value: &ConstValue) -> Result<ConstValue, LiteralError> {
        self.shape.decode(value).map_err(|message| LiteralError::Decode {
            scalar: self.name.clone(),
            message,
        })
    }

    pub fn serialize(&self, value: &ConstValue) -> Result<ConstValue, LiteralError> {
        self.shape.encode(value).map_err(|message| LiteralError::Decode {
            scalar: self.name.clone(),
            message,
        })
    }

    /// Decodes a query literal. Variables are looked up in `variables`; only
    /// int, float, string and boolean literals are accepted otherwise.
    pub fn parse_literal(
        &self,
        literal: &Value,
        variables: &Variables,
    ) -> Result<ConstValue, LiteralError> {
        let raw = match literal {
            Value::Variable(name) => {
                variables
                    .get(name)
                    .cloned()
                    .ok_or_else(|| LiteralError::UnboundVariable {
                        name: name.to_string(),
                    })?
            }
            Value::Number(n) => ConstValue::Number(n.clone()),
            Value::String(s) => ConstValue::String(s.clone()),
            Value::Boolean(b) => ConstValue::Boolean(*b),
            other => {
                return Err(LiteralError::UnsupportedKind {
                    kind: literal_kind(other),
                })
            }
        };
        self.parse_value(&raw)
    }

    /// Validator installed on the emitted scalar type.
    pub fn is_valid(&self, value: &ConstValue) -> bool {
        self.parse_literal(&value.clone().into_value(), &Variables::default())
            .is_ok()
    }
}

fn literal_kind(value: &Value) -> &'static str {
    match value {
        Value::Variable(_) => "Variable",
        Value::Null => "NullValue",
        Value::Number(_) => "NumberValue",
        Value::String(_) => "StringValue",
        Value::Boolean(_) => "BooleanValue",
        Value::Binary(_) => "BinaryValue",
        Value::Enum(_) => "EnumValue",
        Value::List(_) => "ListValue",
        Value::Object(_) => "ObjectValue",
    }
}

impl Compiler<'_> {
    /// Compiles keywords, refinements of keywords, literals, enums,
    /// declarations and final transformations. `None` when `ast` is not a leaf.
    pub(super) fn leaf_type(&mut self, ast: &Ast) -> Result<Option<NamedRef>, CompileError> {
        match ast.kind() {
            AstKind::Keyword(keyword) => Ok(self.keyword_type(*keyword, ast, false)),
            AstKind::Refinement { .. } => {
                let mut integer = false;
                let mut branded = false;
                let mut base = ast.clone();
                while let AstKind::Refinement { from, .. } = base.kind() {
                    integer |= base.annotations().integer;
                    branded |= base.annotations().has_brand(&self.config.id_brand);
                    base = from.clone();
                }
                match base.kind() {
                    AstKind::Keyword(keyword) => {
                        let branded = branded || base.annotations().has_brand(&self.config.id_brand);
                        Ok(self.keyword_type(*keyword, &base, integer).map(|named| {
                            if branded && *keyword == Keyword::String {
                                NamedRef::builtin(TypeRef::ID)
                            } else {
                                named
                            }
                        }))
                    }
                    _ => self.leaf_type(&base),
                }
            }
            AstKind::Literal(value) => Ok(match value {
                ConstValue::String(_) => Some(NamedRef::builtin(TypeRef::STRING)),
                ConstValue::Number(_) => Some(NamedRef::builtin(TypeRef::FLOAT)),
                ConstValue::Boolean(_) => Some(NamedRef::builtin(TypeRef::BOOLEAN)),
                _ => None,
            }),
            AstKind::Enums { enums } => {
                let (ty, created) = self.cache.get_or_try_insert(Scope::Leaf, ast, |idx| {
                    let name = ast
                        .identifier_annotation()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Enum{}", idx));
                    let values = enums
                        .iter()
                        .map(|(name, value)| EnumValue {
                            name: name.clone(),
                            value: value.clone(),
                        })
                        .collect();
                    Ok::<_, CompileError>(CompiledType::new(
                        name,
                        ast.description_annotation(),
                        TypeKind::Enum(values),
                    ))
                })?;
                if created {
                    tracing::debug!(name = %ty.name, "compiled enum");
                }
                Ok(Some(NamedRef::of(&ty)))
            }
            AstKind::Declaration { .. } => {
                let (ty, created) = self.cache.get_or_try_insert(Scope::Leaf, ast, |idx| {
                    let name = ast
                        .identifier_annotation()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Scalar{}", idx));
                    Ok::<_, CompileError>(custom_scalar(name, ast))
                })?;
                if created {
                    tracing::debug!(name = %ty.name, "compiled custom scalar");
                }
                Ok(Some(NamedRef::of(&ty)))
            }
            AstKind::Transformation {
                transformation: TransformationKind::Final(_),
                ..
            } if ast.surrogate_annotation().is_none() => {
                let (ty, created) = self.cache.get_or_try_insert(Scope::Leaf, ast, |_| {
                    let name = ast.identifier_annotation().ok_or_else(|| {
                        CompileError::MissingIdentifier {
                            kind: "Transformation",
                            node: ast.to_string(),
                        }
                    })?;
                    Ok(custom_scalar(name.to_string(), ast))
                })?;
                if created {
                    tracing::debug!(name = %ty.name, "compiled custom scalar");
                }
                Ok(Some(NamedRef::of(&ty)))
            }
            _ => Ok(None),
        }
    }

    fn keyword_type(&self, keyword: Keyword, ast: &Ast, integer: bool) -> Option<NamedRef> {
        let name = match keyword {
            Keyword::Boolean => TypeRef::BOOLEAN,
            Keyword::Number if integer || ast.annotations().integer => TypeRef::INT,
            Keyword::Number => TypeRef::FLOAT,
            Keyword::String if ast.annotations().has_brand(&self.config.id_brand) => TypeRef::ID,
            Keyword::String => TypeRef::STRING,
            Keyword::BigInt | Keyword::Undefined | Keyword::Unknown => return None,
        };
        Some(NamedRef::builtin(name))
    }
}

fn custom_scalar(name: String, ast: &Ast) -> CompiledType {
    let codec = ScalarCodec::new(name.clone(), ast.clone());
    CompiledType::new(name, ast.description_annotation(), TypeKind::Scalar(codec))
}
