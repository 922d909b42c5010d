use async_graphql_value::{ConstValue, Name};
use indexmap::IndexMap;

use crate::ast::{deep_partial, struct_of, undefined, Ast, PropertySignature};
use crate::error::ExecutionError;

/// A named request kind: payload fields in, `success` or `failure` out.
#[derive(Debug, Clone)]
pub struct Operation {
    pub tag: String,
    pub payload: Vec<PropertySignature>,
    pub success: Ast,
    pub failure: Ast,
}

impl Operation {
    pub fn new(tag: impl Into<String>, success: Ast) -> Self {
        Self {
            tag: tag.into(),
            payload: Vec::new(),
            success,
            failure: undefined(),
        }
    }

    pub fn payload(mut self, payload: Vec<PropertySignature>) -> Self {
        self.payload = payload;
        self
    }

    pub fn field(mut self, property: PropertySignature) -> Self {
        self.payload.push(property);
        self
    }

    pub fn failure(mut self, failure: Ast) -> Self {
        self.failure = failure;
        self
    }

    pub fn deep_partial_success(mut self) -> Self {
        self.success = deep_partial(&self.success);
        self
    }

    pub fn arguments<'a>(
        &'a self,
        parent_field: &'a str,
    ) -> impl Iterator<Item = &'a PropertySignature> + 'a {
        self.payload.iter().filter(move |p| p.name != parent_field)
    }

    /// Builds the request for one resolver invocation.
    pub fn request(
        &self,
        parent: Option<&ConstValue>,
        args: ConstValue,
        parent_field: &str,
    ) -> Result<OperationRequest, ExecutionError> {
        let arguments = struct_of(self.arguments(parent_field).cloned().collect());
        let args = match args {
            ConstValue::Null => ConstValue::Object(IndexMap::new()),
            other => other,
        };
        let decoded = arguments.decode(&args).map_err(|message| ExecutionError::Payload {
            tag: self.tag.clone(),
            message,
        })?;

        let mut payload = match decoded {
            ConstValue::Object(fields) => fields,
            _ => IndexMap::new(),
        };
        if let Some(parent) = parent {
            payload.insert(Name::new(parent_field), parent.clone());
        }

        Ok(OperationRequest {
            tag: self.tag.clone(),
            payload: ConstValue::Object(payload),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    pub tag: String,
    pub payload: ConstValue,
}

impl OperationRequest {
    pub fn new(tag: impl Into<String>, payload: ConstValue) -> Self {
        Self {
            tag: tag.into(),
            payload,
        }
    }

    pub fn get(&self, field: &str) -> Option<&ConstValue> {
        match &self.payload {
            ConstValue::Object(fields) => fields.get(field),
            _ => None,
        }
    }

    pub fn key(&self) -> String {
        format!(
            "{}:{}",
            self.tag,
            serde_json::to_string(&self.payload).unwrap_or_default()
        )
    }
}
