use std::time::Duration;

use async_graphql_value::ConstValue;
use convoy_schema::ast::{array_of, int, number, optional_of, string, tagged_class};
use convoy_schema::{
    compile, BuiltSchema, GraphQLServer, Operation, PropertySignature, SchemaDefinition,
    ServerConfig, TaggedBackend,
};
use serde_json::json;
use tokio::net::TcpListener;

fn create_test_schema() -> BuiltSchema {
    let user = tagged_class(
        "User",
        vec![
            PropertySignature::required("name", string()),
            PropertySignature::required("random", number()),
        ],
    );

    let backend = TaggedBackend::with_delay_ms(1)
        .handler("GetCurrentUser", |_| async move {
            Ok(ConstValue::from_json(json!({"_tag": "User", "name": "Alex", "random": 0.5}))
                .unwrap_or(ConstValue::Null))
        })
        .handler("Echo", |request| async move {
            Ok(request.get("message").cloned().unwrap_or(ConstValue::Null))
        })
        .handler("Sum", |request| async move {
            let total: i64 = match request.get("numbers") {
                Some(ConstValue::List(numbers)) => numbers
                    .iter()
                    .filter_map(|n| match n {
                        ConstValue::Number(n) => n.as_i64(),
                        _ => None,
                    })
                    .sum(),
                _ => 0,
            };
            Ok(ConstValue::from(total))
        });

    let definition = SchemaDefinition::new()
        .with_queries([
            ("currentUser", Operation::new("GetCurrentUser", optional_of(user))),
            (
                "echo",
                Operation::new("Echo", string())
                    .field(PropertySignature::required("message", string())),
            ),
            (
                "sum",
                Operation::new("Sum", int())
                    .field(PropertySignature::required("numbers", array_of(int()))),
            ),
        ])
        .with_backend(backend);

    compile(&definition).unwrap()
}

async fn find_available_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

async fn start_test_server() -> (String, tokio::task::JoinHandle<()>) {
    let port = find_available_port().await;
    let listen = format!("127.0.0.1:{}", port);
    let base_url = format!("http://{}", listen);

    let server = GraphQLServer::new(create_test_schema()).with_config(ServerConfig {
        listen,
        ..ServerConfig::default()
    });

    let handle = tokio::spawn(async move {
        let _ = server.serve().await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    (base_url, handle)
}

#[tokio::test]
async fn test_e2e_current_user() {
    let (base_url, handle) = start_test_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/graphql", base_url))
        .json(&json!({
            "query": "{ currentUser { name } }"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({"data": {"currentUser": {"name": "Alex"}}}));

    handle.abort();
}

#[tokio::test]
async fn test_e2e_query_with_argument() {
    let (base_url, handle) = start_test_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/graphql", base_url))
        .json(&json!({
            "query": r#"{ echo(message: "Hello, E2E!") }"#
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["echo"], "Hello, E2E!");

    handle.abort();
}

#[tokio::test]
async fn test_e2e_query_with_variables() {
    let (base_url, handle) = start_test_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/graphql", base_url))
        .json(&json!({
            "query": "query Echo($msg: String!) { echo(message: $msg) }",
            "variables": {"msg": "from variables"}
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["echo"], "from variables");

    handle.abort();
}

#[tokio::test]
async fn test_e2e_query_with_list_argument() {
    let (base_url, handle) = start_test_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/graphql", base_url))
        .json(&json!({
            "query": "{ sum(numbers: [1, 2, 3, 4, 5]) }"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["sum"], 15);

    handle.abort();
}

#[tokio::test]
async fn test_e2e_invalid_query() {
    let (base_url, handle) = start_test_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/graphql", base_url))
        .json(&json!({
            "query": "{ nonexistent }"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["errors"].is_array());

    handle.abort();
}

#[tokio::test]
async fn test_e2e_health_check() {
    let (base_url, handle) = start_test_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    handle.abort();
}

#[tokio::test]
async fn test_e2e_playground_html() {
    let (base_url, handle) = start_test_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/graphql", base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    assert!(body.contains("<!DOCTYPE html>"));

    handle.abort();
}

#[tokio::test]
async fn test_e2e_multiple_queries_same_connection() {
    let (base_url, handle) = start_test_server().await;
    let client = reqwest::Client::new();

    for i in 0..5 {
        let response = client
            .post(format!("{}/graphql", base_url))
            .json(&json!({
                "query": format!(r#"{{ echo(message: "msg-{}") }}"#, i)
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["data"]["echo"], format!("msg-{}", i));
    }

    handle.abort();
}
