use std::fmt;
use std::sync::Arc;

use async_graphql_value::{ConstValue, Name};
use indexmap::IndexMap;

use super::{Ast, AstKind, Keyword, TransformationKind};

type CodecFn = Arc<dyn Fn(&ConstValue) -> Result<ConstValue, String> + Send + Sync>;

/// Decode/encode pair attached to declarations and final transformations.
///
/// `decode` maps the wire representation to the domain value, `encode` goes back.
#[derive(Clone)]
pub struct Codec {
    decode: CodecFn,
    encode: CodecFn,
}

impl Codec {
    pub fn new<D, E>(decode: D, encode: E) -> Self
    where
        D: Fn(&ConstValue) -> Result<ConstValue, String> + Send + Sync + 'static,
        E: Fn(&ConstValue) -> Result<ConstValue, String> + Send + Sync + 'static,
    {
        Self {
            decode: Arc::new(decode),
            encode: Arc::new(encode),
        }
    }

    pub fn identity() -> Self {
        Self::new(|v| Ok(v.clone()), |v| Ok(v.clone()))
    }

    pub fn decode(&self, value: &ConstValue) -> Result<ConstValue, String> {
        (self.decode)(value)
    }

    pub fn encode(&self, value: &ConstValue) -> Result<ConstValue, String> {
        (self.encode)(value)
    }

    /// Address of the codec's functions; shared only by clones of one codec.
    pub(crate) fn address(&self) -> String {
        format!(
            "{:x}.{:x}",
            Arc::as_ptr(&self.decode) as *const () as usize,
            Arc::as_ptr(&self.encode) as *const () as usize
        )
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Codec")
    }
}

#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&ConstValue) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(f: impl Fn(&ConstValue) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn test(&self, value: &ConstValue) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate")
    }
}

fn expected(what: &str, actual: &ConstValue) -> String {
    format!("Expected {}, actual {}", what, actual)
}

impl Ast {
    /// Parses a wire value into the domain value described by this shape.
    pub fn decode(&self, value: &ConstValue) -> Result<ConstValue, String> {
        match self.kind() {
            AstKind::Keyword(keyword) => decode_keyword(*keyword, value),
            AstKind::Literal(literal) => {
                if literal == value {
                    Ok(value.clone())
                } else {
                    Err(expected(&literal.to_string(), value))
                }
            }
            AstKind::Refinement { from, predicate } => {
                let decoded = from.decode(value)?;
                if predicate.test(&decoded) {
                    Ok(decoded)
                } else {
                    Err(format!("Refinement of {} failed for {}", self, value))
                }
            }
            AstKind::Transformation {
                from,
                to,
                transformation,
            } => {
                let decoded = from.decode(value)?;
                match transformation {
                    TransformationKind::Final(codec) => codec.decode(&decoded),
                    TransformationKind::Composition => to.decode(&decoded),
                }
            }
            AstKind::TypeLiteral {
                property_signatures,
            } => {
                let ConstValue::Object(object) = value else {
                    return Err(expected("object", value));
                };
                let mut out = IndexMap::new();
                for property in property_signatures {
                    match object.get(property.name.as_str()) {
                        Some(ConstValue::Null) | None if property.is_optional => {}
                        None => return Err(format!("Property `{}` is missing", property.name)),
                        Some(field) => {
                            let decoded = property
                                .ty
                                .decode(field)
                                .map_err(|e| format!("{}: {}", property.name, e))?;
                            out.insert(Name::new(&property.name), decoded);
                        }
                    }
                }
                Ok(ConstValue::Object(out))
            }
            AstKind::TupleType { elements, rest } => {
                let ConstValue::List(items) = value else {
                    return Err(expected("list", value));
                };
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match elements.get(i).or_else(|| rest.first()) {
                        Some(element) => element.decode(item),
                        None => Err(format!("Unexpected element at index {}", i)),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(ConstValue::List)
            }
            AstKind::Union { types } => {
                if value == &ConstValue::Null && types.iter().any(Ast::is_undefined) {
                    return Ok(ConstValue::Null);
                }
                let mut issues = Vec::new();
                for member in types.iter().filter(|t| !t.is_undefined()) {
                    match member.decode(value) {
                        Ok(decoded) => return Ok(decoded),
                        Err(issue) => issues.push(issue),
                    }
                }
                Err(issues.join(" | "))
            }
            AstKind::Enums { enums } => {
                let key = match value {
                    ConstValue::Enum(name) => Some(name.as_str()),
                    ConstValue::String(s) => Some(s.as_str()),
                    _ => None,
                };
                if let Some((_, v)) = key.and_then(|k| enums.iter().find(|(name, _)| name == k)) {
                    return Ok(v.clone());
                }
                enums
                    .iter()
                    .find(|(_, v)| v == value)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| expected("enum member", value))
            }
            AstKind::Declaration { codec, .. } => codec.decode(value),
            AstKind::Suspend(thunk) => thunk.force().decode(value),
        }
    }

    /// Serializes a domain value back into its wire representation.
    pub fn encode(&self, value: &ConstValue) -> Result<ConstValue, String> {
        match self.kind() {
            AstKind::Keyword(_) | AstKind::Literal(_) => Ok(value.clone()),
            AstKind::Refinement { from, .. } => from.encode(value),
            AstKind::Transformation {
                from,
                to,
                transformation,
            } => {
                let encoded = match transformation {
                    TransformationKind::Final(codec) => codec.encode(value)?,
                    TransformationKind::Composition => to.encode(value)?,
                };
                from.encode(&encoded)
            }
            AstKind::TypeLiteral {
                property_signatures,
            } => {
                let ConstValue::Object(object) = value else {
                    return Err(expected("object", value));
                };
                let mut out = object.clone();
                for property in property_signatures {
                    if let Some(field) = object.get(property.name.as_str()) {
                        out.insert(Name::new(&property.name), property.ty.encode(field)?);
                    }
                }
                Ok(ConstValue::Object(out))
            }
            AstKind::TupleType { elements, rest } => {
                let ConstValue::List(items) = value else {
                    return Err(expected("list", value));
                };
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match elements.get(i).or_else(|| rest.first()) {
                        Some(element) => element.encode(item),
                        None => Ok(item.clone()),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(ConstValue::List)
            }
            AstKind::Union { types } => {
                if value == &ConstValue::Null {
                    return Ok(ConstValue::Null);
                }
                let mut issues = Vec::new();
                for member in types.iter().filter(|t| !t.is_undefined()) {
                    match member.encode(value) {
                        Ok(encoded) => return Ok(encoded),
                        Err(issue) => issues.push(issue),
                    }
                }
                Err(issues.join(" | "))
            }
            AstKind::Enums { enums } => enums
                .iter()
                .find(|(_, v)| v == value)
                .map(|(key, _)| ConstValue::Enum(Name::new(key)))
                .ok_or_else(|| expected("enum value", value)),
            AstKind::Declaration { codec, .. } => codec.encode(value),
            AstKind::Suspend(thunk) => thunk.force().encode(value),
        }
    }
}

fn decode_keyword(keyword: Keyword, value: &ConstValue) -> Result<ConstValue, String> {
    let ok = match keyword {
        Keyword::String => matches!(value, ConstValue::String(_)),
        Keyword::Number => matches!(value, ConstValue::Number(_)),
        Keyword::Boolean => matches!(value, ConstValue::Boolean(_)),
        Keyword::BigInt => matches!(value, ConstValue::Number(_) | ConstValue::String(_)),
        Keyword::Undefined => matches!(value, ConstValue::Null),
        Keyword::Unknown => true,
    };
    if ok {
        Ok(value.clone())
    } else {
        Err(expected(keyword.as_str(), value))
    }
}
