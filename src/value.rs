use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use async_graphql::Error;
use async_graphql_value::{ConstValue, Name};

use crate::compile::{GqlTypeRef, Representation};

/// The parent object of a resolver invocation, if there is one.
///
/// Objects travel between resolvers as owned `ConstValue`s; the root value is
/// a plain `null`.
pub fn parent_value<'a>(parent: &'a FieldValue<'a>) -> Option<&'a ConstValue> {
    parent
        .downcast_ref::<ConstValue>()
        .or_else(|| parent.as_value())
        .filter(|value| !matches!(value, ConstValue::Null))
}

/// Adapts a domain value to what the GraphQL executor expects for `ty`.
pub fn to_field_value<'a>(
    value: ConstValue,
    ty: &GqlTypeRef,
    tag_field: &str,
) -> Result<Option<FieldValue<'a>>, Error> {
    if matches!(value, ConstValue::Null) {
        return Ok(None);
    }

    match ty {
        GqlTypeRef::NonNull(inner) => to_field_value(value, inner, tag_field),
        GqlTypeRef::List(inner) => {
            let ConstValue::List(items) = value else {
                return Err(Error::new(format!("Expected a list, got {}", value)));
            };
            let values = items
                .into_iter()
                .map(|item| Ok(to_field_value(item, inner, tag_field)?.unwrap_or(FieldValue::NULL)))
                .collect::<Result<Vec<_>, Error>>()?;
            Ok(Some(FieldValue::list(values)))
        }
        GqlTypeRef::Named(named) => match &named.representation {
            Representation::Plain => Ok(Some(FieldValue::value(value))),
            Representation::Encoded(shape) => shape
                .encode(&value)
                .map(|encoded| Some(FieldValue::value(encoded)))
                .map_err(|message| {
                    Error::new(format!("Failed to serialize {}: {}", named.name, message))
                }),
            Representation::Enum(values) => {
                let key = values
                    .iter()
                    .find(|v| v.value == value)
                    .or_else(|| match &value {
                        ConstValue::String(s) => values.iter().find(|v| &v.name == s),
                        ConstValue::Enum(key) => values.iter().find(|v| v.name == key.as_str()),
                        _ => None,
                    })
                    .ok_or_else(|| {
                        Error::new(format!("{} is not a member of enum {}", value, named.name))
                    })?;
                Ok(Some(FieldValue::value(ConstValue::Enum(Name::new(&key.name)))))
            }
            Representation::Object => Ok(Some(FieldValue::owned_any(value))),
            Representation::Abstract => {
                let tag = match &value {
                    ConstValue::Object(fields) => match fields.get(tag_field) {
                        Some(ConstValue::String(tag)) => tag.clone(),
                        _ => {
                            return Err(Error::new(format!(
                                "Cannot resolve the type of a {} value without a `{}` field",
                                named.name, tag_field
                            )))
                        }
                    },
                    other => {
                        return Err(Error::new(format!(
                            "Expected an object for {}, got {}",
                            named.name, other
                        )))
                    }
                };
                Ok(Some(FieldValue::owned_any(value).with_type(tag)))
            }
        },
    }
}

/// Default resolution for fields without a bound operation: read the
/// property from the parent object.
#[derive(Debug, Clone)]
pub struct PropertyResolver {
    field: String,
    ty: GqlTypeRef,
    tag_field: String,
}

impl PropertyResolver {
    pub fn new(field: impl Into<String>, ty: GqlTypeRef, tag_field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ty,
            tag_field: tag_field.into(),
        }
    }

    pub fn resolve<'a>(&self, ctx: ResolverContext<'a>) -> FieldFuture<'a> {
        let value = match parent_value(ctx.parent_value) {
            Some(ConstValue::Object(fields)) => fields.get(self.field.as_str()).cloned(),
            _ => None,
        };
        let result = to_field_value(value.unwrap_or(ConstValue::Null), &self.ty, &self.tag_field);
        FieldFuture::new(async move { result })
    }
}
