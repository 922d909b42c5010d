use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::TypeRef;
use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::ast::Ast;
use crate::resolver::OperationResolver;

use super::scalar::ScalarCodec;

/// A named GraphQL type produced by the compiler.
#[derive(Debug)]
pub struct CompiledType {
    pub name: String,
    pub description: Option<String>,
    pub kind: TypeKind,
}

#[derive(Debug)]
pub enum TypeKind {
    Scalar(ScalarCodec),
    Enum(Vec<EnumValue>),
    Object {
        fields: OnceCell<IndexMap<String, OutputField>>,
        interfaces: OnceCell<Vec<Arc<CompiledType>>>,
    },
    Interface {
        fields: OnceCell<IndexMap<String, OutputField>>,
    },
    Union {
        members: Vec<Arc<CompiledType>>,
    },
    InputObject {
        fields: OnceCell<IndexMap<String, InputField>>,
    },
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
    pub value: ConstValue,
}

#[derive(Debug, Clone)]
pub struct OutputField {
    pub ty: GqlTypeRef,
    pub description: Option<String>,
    pub deprecation: Option<String>,
    pub args: IndexMap<String, InputField>,
    pub resolver: Option<Arc<OperationResolver>>,
}

#[derive(Debug, Clone)]
pub struct InputField {
    pub ty: GqlTypeRef,
    pub description: Option<String>,
    pub default: Option<ConstValue>,
    pub deprecation: Option<String>,
}

impl CompiledType {
    pub fn new(name: impl Into<String>, description: Option<&str>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            description: description.map(str::to_string),
            kind,
        }
    }

    pub fn object(name: impl Into<String>, description: Option<&str>) -> Self {
        Self::new(
            name,
            description,
            TypeKind::Object {
                fields: OnceCell::new(),
                interfaces: OnceCell::new(),
            },
        )
    }

    pub fn interface(name: impl Into<String>, description: Option<&str>) -> Self {
        Self::new(
            name,
            description,
            TypeKind::Interface {
                fields: OnceCell::new(),
            },
        )
    }

    pub fn input_object(name: impl Into<String>, description: Option<&str>) -> Self {
        Self::new(
            name,
            description,
            TypeKind::InputObject {
                fields: OnceCell::new(),
            },
        )
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, TypeKind::Object { .. })
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface { .. })
    }

    pub fn fields(&self) -> Option<&IndexMap<String, OutputField>> {
        match &self.kind {
            TypeKind::Object { fields, .. } | TypeKind::Interface { fields } => fields.get(),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&OutputField> {
        self.fields().and_then(|fields| fields.get(name))
    }

    pub fn input_fields(&self) -> Option<&IndexMap<String, InputField>> {
        match &self.kind {
            TypeKind::InputObject { fields } => fields.get(),
            _ => None,
        }
    }

    pub fn interfaces(&self) -> &[Arc<CompiledType>] {
        match &self.kind {
            TypeKind::Object { interfaces, .. } => interfaces.get().map(Vec::as_slice).unwrap_or(&[]),
            _ => &[],
        }
    }

    pub fn members(&self) -> &[Arc<CompiledType>] {
        match &self.kind {
            TypeKind::Union { members } => members,
            _ => &[],
        }
    }

    pub fn scalar(&self) -> Option<&ScalarCodec> {
        match &self.kind {
            TypeKind::Scalar(codec) => Some(codec),
            _ => None,
        }
    }

    pub(super) fn set_fields(&self, value: IndexMap<String, OutputField>) {
        if let TypeKind::Object { fields, .. } | TypeKind::Interface { fields } = &self.kind {
            let _ = fields.set(value);
        }
    }

    pub(super) fn set_interfaces(&self, value: Vec<Arc<CompiledType>>) {
        if let TypeKind::Object { interfaces, .. } = &self.kind {
            let _ = interfaces.set(value);
        }
    }

    pub(super) fn set_input_fields(&self, value: IndexMap<String, InputField>) {
        if let TypeKind::InputObject { fields } = &self.kind {
            let _ = fields.set(value);
        }
    }

    pub fn representation(&self) -> Representation {
        match &self.kind {
            TypeKind::Scalar(codec) => Representation::Encoded(codec.shape().clone()),
            TypeKind::Enum(_) => Representation::Enum(self.enum_values()),
            TypeKind::Object { .. } => Representation::Object,
            TypeKind::Interface { .. } | TypeKind::Union { .. } => Representation::Abstract,
            TypeKind::InputObject { .. } => Representation::Plain,
        }
    }

    fn enum_values(&self) -> Arc<[EnumValue]> {
        match &self.kind {
            TypeKind::Enum(values) => values.clone().into(),
            _ => Arc::from(Vec::new()),
        }
    }

    /// Two unions over the same members are the same GraphQL type.
    pub(crate) fn same_as(&self, other: &CompiledType) -> bool {
        match (&self.kind, &other.kind) {
            (TypeKind::Union { members: a }, TypeKind::Union { members: b }) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| Arc::ptr_eq(a, b))
            }
            _ => false,
        }
    }
}

/// Runtime treatment of a value declared with a given named type.
#[derive(Debug, Clone)]
pub enum Representation {
    Plain,
    Encoded(Ast),
    Enum(Arc<[EnumValue]>),
    Object,
    Abstract,
}

#[derive(Debug, Clone)]
pub struct NamedRef {
    pub name: String,
    pub representation: Representation,
}

impl NamedRef {
    pub fn builtin(name: &str) -> Self {
        Self {
            name: name.to_string(),
            representation: Representation::Plain,
        }
    }

    pub fn of(ty: &CompiledType) -> Self {
        Self {
            name: ty.name.clone(),
            representation: ty.representation(),
        }
    }
}

/// Field type reference. Named types are referenced by name.
#[derive(Debug, Clone)]
pub enum GqlTypeRef {
    Named(NamedRef),
    List(Box<GqlTypeRef>),
    NonNull(Box<GqlTypeRef>),
}

impl GqlTypeRef {
    pub fn named(named: NamedRef) -> Self {
        GqlTypeRef::Named(named)
    }

    pub fn list(self) -> Self {
        GqlTypeRef::List(Box::new(self))
    }

    pub fn non_null(self) -> Self {
        match self {
            GqlTypeRef::NonNull(_) => self,
            other => GqlTypeRef::NonNull(Box::new(other)),
        }
    }

    pub fn nullable(self) -> Self {
        match self {
            GqlTypeRef::NonNull(inner) => *inner,
            other => other,
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, GqlTypeRef::NonNull(_))
    }

    pub fn named_type(&self) -> &NamedRef {
        match self {
            GqlTypeRef::Named(named) => named,
            GqlTypeRef::List(inner) | GqlTypeRef::NonNull(inner) => inner.named_type(),
        }
    }

    pub fn to_type_ref(&self) -> TypeRef {
        match self {
            GqlTypeRef::Named(named) => TypeRef::named(named.name.clone()),
            GqlTypeRef::List(inner) => TypeRef::List(Box::new(inner.to_type_ref())),
            GqlTypeRef::NonNull(inner) => TypeRef::NonNull(Box::new(inner.to_type_ref())),
        }
    }
}

impl fmt::Display for GqlTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GqlTypeRef::Named(named) => f.write_str(&named.name),
            GqlTypeRef::List(inner) => write!(f, "[{}]", inner),
            GqlTypeRef::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}
