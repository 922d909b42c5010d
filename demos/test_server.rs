use anyhow::Result;
use async_graphql_value::ConstValue;
use convoy_schema::ast::{number, optional_of, string, struct_of, tagged_class};
use convoy_schema::{
    compile, BackendConfig, GraphQLServer, Operation, PropertySignature, SchemaDefinition,
    ServerConfig, TaggedBackend,
};
use tracing_subscriber::EnvFilter;

fn user() -> convoy_schema::Ast {
    tagged_class(
        "User",
        vec![
            PropertySignature::required("name", string()),
            PropertySignature::required("random", number()),
        ],
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let pagination = struct_of(vec![PropertySignature::optional("cursor", string())])
        .identifier("Pagination");

    let get_current_user = Operation::new("GetCurrentUser", optional_of(user()))
        .field(PropertySignature::optional("pagination", pagination));
    let get_random = Operation::new("GetRandom", number())
        .field(PropertySignature::required("parent", user()));

    let backend = TaggedBackend::new(&BackendConfig::default())
        .handler("GetCurrentUser", |_| async move {
            let user = serde_json::json!({"_tag": "User", "name": "Alex", "random": 0});
            Ok(ConstValue::from_json(user).unwrap_or(ConstValue::Null))
        })
        .handler("GetRandom", |_| async move {
            let nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.subsec_nanos())
                .unwrap_or_default();
            Ok(ConstValue::from(f64::from(nanos % 1000) / 1000.0))
        });

    let definition = SchemaDefinition::new()
        .with_queries([("currentUser", get_current_user)])
        .resolve_field(&user(), [("random", get_random)])?
        .with_backend(backend);

    let schema = compile(&definition)?;

    println!("Generated GraphQL Schema:");
    println!("{}", schema.sdl());

    let config = ServerConfig {
        listen: String::from("127.0.0.1:8080"),
        ..ServerConfig::default()
    };

    GraphQLServer::new(schema)
        .with_config(config)
        .serve()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
