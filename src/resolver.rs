use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use async_graphql::ErrorExtensions;
use async_graphql_value::ConstValue;

use crate::backend::ExecutionBackend;
use crate::compile::GqlTypeRef;
use crate::error::ExecutionError;
use crate::operation::Operation;
use crate::value::{parent_value, to_field_value};

/// Field resolver bound to an operation and the execution backend.
///
/// Each invocation builds a fresh request from the parent value and the field
/// arguments and submits it to the shared backend.
pub struct OperationResolver {
    operation: Arc<Operation>,
    backend: Arc<dyn ExecutionBackend>,
    output: GqlTypeRef,
    parent_field: String,
    tag_field: String,
}

impl OperationResolver {
    pub fn new(
        operation: Arc<Operation>,
        backend: Arc<dyn ExecutionBackend>,
        output: GqlTypeRef,
        parent_field: impl Into<String>,
        tag_field: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            backend,
            output,
            parent_field: parent_field.into(),
            tag_field: tag_field.into(),
        }
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn output(&self) -> &GqlTypeRef {
        &self.output
    }

    /// Submits the request for one invocation. `parent` is `None` for root
    /// fields.
    pub async fn call(
        &self,
        parent: Option<ConstValue>,
        args: ConstValue,
    ) -> Result<ConstValue, ExecutionError> {
        let request = self
            .operation
            .request(parent.as_ref(), args, &self.parent_field)?;
        self.backend.execute(request).await
    }

    pub fn resolve<'a>(self: &Arc<Self>, ctx: ResolverContext<'a>) -> FieldFuture<'a> {
        let parent = parent_value(ctx.parent_value).cloned();
        let args = ConstValue::Object(ctx.args.as_index_map().clone());
        let resolver = self.clone();

        FieldFuture::new(async move {
            let value = resolver
                .call(parent, args)
                .await
                .map_err(into_graphql_error)?;
            to_field_value(value, &resolver.output, &resolver.tag_field)
        })
    }
}

impl fmt::Debug for OperationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationResolver")
            .field("operation", &self.operation.tag)
            .field("output", &self.output.to_string())
            .finish()
    }
}

/// Field error for a failed request. Operation failures carry their failure
/// value in the `failure` extension.
pub fn into_graphql_error(err: ExecutionError) -> async_graphql::Error {
    let error = async_graphql::Error::new(err.to_string());
    match err {
        ExecutionError::Failure { tag, value } => error.extend_with(move |_, e| {
            e.set("operation", tag);
            e.set("failure", value);
        }),
        other => {
            tracing::debug!(error = %other, "operation request failed");
            error
        }
    }
}
