use async_graphql::{dynamic, Request, Response, ServerError, Variables};

/// A compiled schema ready to execute requests.
#[derive(Clone, Debug)]
pub struct BuiltSchema {
    pub graphql_schema: dynamic::Schema,
}

impl BuiltSchema {
    pub fn from_dynamic_schema(graphql_schema: dynamic::Schema) -> Self {
        Self { graphql_schema }
    }

    pub fn sdl(&self) -> String {
        self.graphql_schema.sdl()
    }

    pub async fn execute(&self, request: Request) -> Response {
        self.graphql_schema.execute(request).await
    }

    pub async fn execute_query(&self, query: &str) -> Response {
        let request = Request::new(query);
        self.execute(request).await
    }

    pub async fn execute_with_variables(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Response {
        match serde_json::from_value::<Variables>(variables) {
            Ok(vars) => self.execute(Request::new(query).variables(vars)).await,
            Err(err) => Response::from_errors(vec![ServerError::new(
                format!("Invalid variables: {}", err),
                None,
            )]),
        }
    }
}
