//! Shape descriptors: an immutable tagged tree describing the data shapes that
//! get compiled into GraphQL types.

mod annotations;
mod codec;
mod fingerprint;
mod partial;

use std::fmt;
use std::sync::Arc;

use async_graphql_value::ConstValue;

pub use annotations::Annotations;
pub use codec::{Codec, Predicate};
pub use partial::deep_partial;

pub const TAG: &str = "_tag";

pub const GQL_ID: &str = "GqlID";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    String,
    Number,
    Boolean,
    BigInt,
    Undefined,
    Unknown,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::String => "string",
            Keyword::Number => "number",
            Keyword::Boolean => "boolean",
            Keyword::BigInt => "bigint",
            Keyword::Undefined => "undefined",
            Keyword::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone)]
pub enum TransformationKind {
    Final(Codec),
    Composition,
}

#[derive(Clone)]
pub struct Thunk(Arc<dyn Fn() -> Ast + Send + Sync>);

impl Thunk {
    pub fn force(&self) -> Ast {
        (self.0)()
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Thunk")
    }
}

#[derive(Debug, Clone)]
pub enum AstKind {
    Keyword(Keyword),
    Literal(ConstValue),
    Refinement {
        from: Ast,
        predicate: Predicate,
    },
    Transformation {
        from: Ast,
        to: Ast,
        transformation: TransformationKind,
    },
    TypeLiteral {
        property_signatures: Vec<PropertySignature>,
    },
    TupleType {
        elements: Vec<Ast>,
        rest: Vec<Ast>,
    },
    Union {
        types: Vec<Ast>,
    },
    Enums {
        enums: Vec<(String, ConstValue)>,
    },
    Declaration {
        type_parameters: Vec<Ast>,
        codec: Codec,
    },
    Suspend(Thunk),
}

#[derive(Debug)]
pub struct AstNode {
    kind: AstKind,
    annotations: Annotations,
}

/// Handle to a shape node. Clones share the node; identity is pointer identity.
#[derive(Debug, Clone)]
pub struct Ast(Arc<AstNode>);

impl Ast {
    pub fn new(kind: AstKind) -> Self {
        Self::with_annotations(kind, Annotations::default())
    }

    pub fn with_annotations(kind: AstKind, annotations: Annotations) -> Self {
        Self(Arc::new(AstNode { kind, annotations }))
    }

    pub fn kind(&self) -> &AstKind {
        &self.0.kind
    }

    pub fn annotations(&self) -> &Annotations {
        &self.0.annotations
    }

    pub fn node_id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Ast) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn annotate(&self, f: impl FnOnce(&mut Annotations)) -> Ast {
        let mut annotations = self.annotations().clone();
        f(&mut annotations);
        Ast::with_annotations(self.kind().clone(), annotations)
    }

    pub fn identifier(&self, identifier: impl Into<String>) -> Ast {
        let identifier = identifier.into();
        self.annotate(|a| a.identifier = Some(identifier))
    }

    pub fn description(&self, description: impl Into<String>) -> Ast {
        let description = description.into();
        self.annotate(|a| a.description = Some(description))
    }

    pub fn default_value(&self, value: ConstValue) -> Ast {
        self.annotate(|a| a.default = Some(value))
    }

    pub fn deprecated(&self, reason: impl Into<String>) -> Ast {
        let reason = reason.into();
        self.annotate(|a| a.deprecation_reason = Some(reason))
    }

    pub fn brand(&self, brand: impl Into<String>) -> Ast {
        let brand = brand.into();
        self.annotate(|a| a.brands.push(brand))
    }

    pub fn extends_interface(&self, interface: Ast) -> Ast {
        self.annotate(|a| a.extends_interface.push(interface))
    }

    pub fn as_graphql_interface(&self) -> Ast {
        self.annotate(|a| a.graphql_interface = true)
    }

    pub fn surrogate(&self, surrogate: Ast) -> Ast {
        self.annotate(|a| a.surrogate = Some(surrogate))
    }

    pub fn reference(&self, reference: impl Into<String>) -> Ast {
        let reference = reference.into();
        self.annotate(|a| a.reference = Some(reference))
    }

    /// Identifier naming this node. Transformations fall back to their `to` side.
    pub fn identifier_annotation(&self) -> Option<&str> {
        if let Some(id) = self.annotations().identifier.as_deref() {
            return Some(id);
        }
        match self.kind() {
            AstKind::Transformation { to, .. } => to.annotations().identifier.as_deref(),
            _ => None,
        }
    }

    pub fn description_annotation(&self) -> Option<&str> {
        self.annotations().description.as_deref()
    }

    pub fn deprecation_annotation(&self) -> Option<&str> {
        self.annotations().deprecation_reason.as_deref()
    }

    /// Surrogate struct of a named object, looked up on the node then its `to` side.
    pub fn surrogate_annotation(&self) -> Option<&Ast> {
        if let Some(surrogate) = &self.annotations().surrogate {
            return Some(surrogate);
        }
        match self.kind() {
            AstKind::Transformation { to, .. } => to.annotations().surrogate.as_ref(),
            _ => None,
        }
    }

    pub fn extends_interface_annotation(&self) -> &[Ast] {
        match self.kind() {
            AstKind::Transformation { to, .. } if self.annotations().extends_interface.is_empty() => {
                &to.annotations().extends_interface
            }
            _ => &self.annotations().extends_interface,
        }
    }

    pub fn is_graphql_interface(&self) -> bool {
        self.annotations().graphql_interface
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self.kind(), AstKind::Keyword(Keyword::Undefined))
    }

    pub fn optional_member(&self) -> Option<&Ast> {
        match self.kind() {
            AstKind::Union { types } if types.len() == 2 => {
                match (types[0].is_undefined(), types[1].is_undefined()) {
                    (false, true) => Some(&types[0]),
                    (true, false) => Some(&types[1]),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn resolve(&self) -> Ast {
        let mut ast = self.clone();
        while let AstKind::Suspend(thunk) = ast.kind() {
            ast = thunk.force();
        }
        ast
    }

    /// Properties of a struct, or of the surrogate struct behind a named object.
    pub fn struct_properties(&self) -> Option<Vec<PropertySignature>> {
        let ast = self.resolve();
        match ast.kind() {
            AstKind::TypeLiteral {
                property_signatures,
            } => Some(property_signatures.clone()),
            AstKind::Transformation { .. } => ast
                .surrogate_annotation()
                .and_then(|surrogate| surrogate.struct_properties()),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind() {
            AstKind::Keyword(Keyword::String) => "StringKeyword",
            AstKind::Keyword(Keyword::Number) => "NumberKeyword",
            AstKind::Keyword(Keyword::Boolean) => "BooleanKeyword",
            AstKind::Keyword(Keyword::BigInt) => "BigIntKeyword",
            AstKind::Keyword(Keyword::Undefined) => "UndefinedKeyword",
            AstKind::Keyword(Keyword::Unknown) => "UnknownKeyword",
            AstKind::Literal(_) => "Literal",
            AstKind::Refinement { .. } => "Refinement",
            AstKind::Transformation { .. } => "Transformation",
            AstKind::TypeLiteral { .. } => "TypeLiteral",
            AstKind::TupleType { .. } => "TupleType",
            AstKind::Union { .. } => "Union",
            AstKind::Enums { .. } => "Enums",
            AstKind::Declaration { .. } => "Declaration",
            AstKind::Suspend(_) => "Suspend",
        }
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identifier_annotation() {
            Some(id) => write!(f, "{}<{}>", self.kind_name(), id),
            None => f.write_str(self.kind_name()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PropertySignature {
    pub name: String,
    pub ty: Ast,
    pub is_optional: bool,
    pub is_readonly: bool,
    pub annotations: Annotations,
}

impl PropertySignature {
    pub fn required(name: impl Into<String>, ty: Ast) -> Self {
        Self {
            name: name.into(),
            ty,
            is_optional: false,
            is_readonly: true,
            annotations: Annotations::default(),
        }
    }

    pub fn optional(name: impl Into<String>, ty: Ast) -> Self {
        Self {
            name: name.into(),
            ty: optional_of(ty),
            is_optional: true,
            is_readonly: true,
            annotations: Annotations::default(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.annotations.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: ConstValue) -> Self {
        self.annotations.default = Some(value);
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.annotations.deprecation_reason = Some(reason.into());
        self
    }

    pub fn value_type(&self) -> Ast {
        if self.is_optional {
            if let Some(member) = self.ty.optional_member() {
                return member.clone();
            }
        }
        self.ty.clone()
    }

    pub fn is_nullable(&self) -> bool {
        self.is_optional || self.ty.optional_member().is_some()
    }

    pub fn description_annotation(&self) -> Option<&str> {
        self.annotations
            .description
            .as_deref()
            .or_else(|| self.ty.description_annotation())
    }

    pub fn default_annotation(&self) -> Option<&ConstValue> {
        self.annotations
            .default
            .as_ref()
            .or(self.ty.annotations().default.as_ref())
    }

    pub fn deprecation_annotation(&self) -> Option<&str> {
        self.annotations
            .deprecation_reason
            .as_deref()
            .or_else(|| self.ty.deprecation_annotation())
    }
}

pub fn keyword(keyword: Keyword) -> Ast {
    Ast::new(AstKind::Keyword(keyword))
}

pub fn string() -> Ast {
    keyword(Keyword::String)
}

pub fn number() -> Ast {
    keyword(Keyword::Number)
}

pub fn int() -> Ast {
    let is_integer = Predicate::new(|v| match v {
        ConstValue::Number(n) => n.is_i64() || n.is_u64(),
        _ => false,
    });
    refine(number(), is_integer)
        .identifier("Int")
        .annotate(|a| a.integer = true)
}

pub fn boolean() -> Ast {
    keyword(Keyword::Boolean)
}

pub fn undefined() -> Ast {
    keyword(Keyword::Undefined)
}

pub fn unknown() -> Ast {
    keyword(Keyword::Unknown)
}

pub fn id() -> Ast {
    string().brand(GQL_ID)
}

pub fn literal(value: ConstValue) -> Ast {
    Ast::new(AstKind::Literal(value))
}

pub fn refine(from: Ast, predicate: Predicate) -> Ast {
    Ast::new(AstKind::Refinement { from, predicate })
}

pub fn struct_of(property_signatures: Vec<PropertySignature>) -> Ast {
    Ast::new(AstKind::TypeLiteral {
        property_signatures,
    })
}

pub fn array_of(item: Ast) -> Ast {
    Ast::new(AstKind::TupleType {
        elements: Vec::new(),
        rest: vec![item],
    })
}

pub fn tuple_of(elements: Vec<Ast>) -> Ast {
    Ast::new(AstKind::TupleType {
        elements,
        rest: Vec::new(),
    })
}

pub fn union_of(types: Vec<Ast>) -> Ast {
    Ast::new(AstKind::Union { types })
}

pub fn optional_of(ty: Ast) -> Ast {
    union_of(vec![ty, undefined()])
}

pub fn enums(enums: Vec<(String, ConstValue)>) -> Ast {
    Ast::new(AstKind::Enums { enums })
}

pub fn declare(type_parameters: Vec<Ast>, codec: Codec) -> Ast {
    Ast::new(AstKind::Declaration {
        type_parameters,
        codec,
    })
}

pub fn transform(from: Ast, to: Ast, codec: Codec) -> Ast {
    Ast::new(AstKind::Transformation {
        from,
        to,
        transformation: TransformationKind::Final(codec),
    })
}

pub fn compose(from: Ast, to: Ast) -> Ast {
    Ast::new(AstKind::Transformation {
        from,
        to,
        transformation: TransformationKind::Composition,
    })
}

pub fn suspend(f: impl Fn() -> Ast + Send + Sync + 'static) -> Ast {
    Ast::new(AstKind::Suspend(Thunk(Arc::new(f))))
}

/// Named object: a transformation from its encoded struct into an opaque
/// instance, annotated with the surrogate struct (including a `_tag` literal).
pub fn tagged_class(tag: &str, fields: Vec<PropertySignature>) -> Ast {
    tagged_class_extending(tag, fields, Vec::new())
}

/// Named object implementing `interfaces`. Interface fields are merged into the
/// surrogate by key; the object's own fields win.
pub fn tagged_class_extending(
    tag: &str,
    fields: Vec<PropertySignature>,
    interfaces: Vec<Ast>,
) -> Ast {
    let mut merged = fields;
    for interface in &interfaces {
        for property in interface.struct_properties().unwrap_or_default() {
            if property.name != TAG && !merged.iter().any(|p| p.name == property.name) {
                merged.push(property);
            }
        }
    }

    let tag_value = ConstValue::String(tag.to_string());
    let mut properties = vec![PropertySignature::required(TAG, literal(tag_value.clone()))];
    properties.extend(merged.into_iter().filter(|p| p.name != TAG));

    let surrogate = struct_of(properties).identifier(tag);
    let instance = declare(Vec::new(), Codec::identity()).annotate(|a| {
        a.identifier = Some(tag.to_string());
        a.surrogate = Some(surrogate.clone());
    });
    let constructor = Codec::new(
        move |v| match v {
            ConstValue::Object(fields) => {
                let mut fields = fields.clone();
                fields.insert(async_graphql_value::Name::new(TAG), tag_value.clone());
                Ok(ConstValue::Object(fields))
            }
            other => Err(format!("Expected object, actual {}", other)),
        },
        |v| Ok(v.clone()),
    );

    transform(surrogate.clone(), instance, constructor).annotate(|a| {
        a.identifier = Some(tag.to_string());
        a.surrogate = Some(surrogate);
        a.extends_interface = interfaces;
    })
}

pub fn tagged_interface(tag: &str, fields: Vec<PropertySignature>) -> Ast {
    tagged_class(tag, fields).as_graphql_interface()
}
