use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_graphql_value::ConstValue;
use convoy_schema::ast::{
    declare, enums, number, optional_of, string, struct_of, tagged_class, tagged_class_extending,
    transform, union_of, Codec,
};
use convoy_schema::compile::{Compiler, GqlTypeRef};
use convoy_schema::{
    compile, Ast, CompileError, CompilerConfig, ExecutionError, Operation, PropertySignature,
    SchemaDefinition, SchemaError, TaggedBackend,
};
use serde_json::json;

fn value(json: serde_json::Value) -> ConstValue {
    ConstValue::from_json(json).unwrap()
}

fn user() -> Ast {
    tagged_class(
        "User",
        vec![
            PropertySignature::required("name", string()),
            PropertySignature::required("random", number()),
        ],
    )
}

fn upper() -> Ast {
    declare(
        vec![],
        Codec::new(
            |v| match v {
                ConstValue::String(s) => Ok(ConstValue::String(s.to_uppercase())),
                other => Err(format!("Expected string, actual {}", other)),
            },
            |v| Ok(v.clone()),
        ),
    )
}

#[test]
fn test_named_types_are_compiled_once() {
    let definition = SchemaDefinition::new();
    let config = CompilerConfig::default();
    let mut compiler = Compiler::new(&definition, &config);

    compiler.output_type(&user()).unwrap();
    compiler.output_type(&user()).unwrap();
    compiler.flush().unwrap();

    let first = compiler.lookup(&user()).unwrap();
    let second = compiler.lookup(&user()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let scalar = upper().identifier("Upper");
    compiler.input_type(&scalar).unwrap();
    compiler.output_type(&scalar).unwrap();
    assert_eq!(compiler.types().filter(|ty| ty.name == "Upper").count(), 1);
}

#[test]
fn test_anonymous_scalars_get_indexed_names() {
    let definition = SchemaDefinition::new();
    let config = CompilerConfig::default();
    let mut compiler = Compiler::new(&definition, &config);

    let first = upper();
    let second = upper();
    assert_eq!(compiler.input_type(&first).unwrap().to_string(), "Scalar0!");
    assert_eq!(compiler.input_type(&second).unwrap().to_string(), "Scalar1!");
    assert_eq!(compiler.input_type(&first).unwrap().to_string(), "Scalar0!");
}

#[test]
fn test_optional_fields_are_nullable() {
    let definition = SchemaDefinition::new();
    let config = CompilerConfig::default();
    let mut compiler = Compiler::new(&definition, &config);

    let profile = tagged_class(
        "Profile",
        vec![
            PropertySignature::required("name", string()),
            PropertySignature::optional("bio", string()),
            PropertySignature::required("website", optional_of(string())),
        ],
    );
    compiler.output_type(&profile).unwrap();
    compiler.flush().unwrap();

    let compiled = compiler.lookup(&profile).unwrap();
    let ty = |name: &str| compiled.field(name).unwrap().ty.to_string();
    assert_eq!(ty("name"), "String!");
    assert_eq!(ty("bio"), "String");
    assert_eq!(ty("website"), "String");
}

#[test]
fn test_interfaces_propagate_to_objects() {
    let node = struct_of(vec![PropertySignature::required("id", number())]).identifier("Node");
    let post = tagged_class_extending(
        "Post",
        vec![PropertySignature::required("title", string())],
        vec![node],
    );
    let definition = SchemaDefinition::new()
        .with_queries([("post", Operation::new("GetPost", post))])
        .with_backend(TaggedBackend::with_delay_ms(1));

    let sdl = compile(&definition).unwrap().sdl();
    assert!(sdl.contains("type Post implements Node"));
    assert!(sdl.contains("interface Node"));
    assert!(sdl.contains("id: Float!"));
}

#[test]
fn test_union_of_objects_is_named_after_members() {
    let definition = SchemaDefinition::new();
    let config = CompilerConfig::default();
    let mut compiler = Compiler::new(&definition, &config);

    let a = tagged_class("A", vec![PropertySignature::required("a", string())]);
    let b = tagged_class("B", vec![PropertySignature::required("b", string())]);
    let ty = compiler.output_type(&union_of(vec![a.clone(), b.clone()])).unwrap();
    compiler.flush().unwrap();

    assert_eq!(ty.to_string(), "A_B!");
    let union = compiler.lookup(&union_of(vec![a, b]));
    assert!(union.is_none(), "anonymous unions are keyed by node");
    let compiled: Vec<_> = compiler.types().map(|t| t.name.clone()).collect();
    assert!(compiled.contains(&"A_B".to_string()));
}

#[test]
fn test_input_struct_without_identifier_fails() {
    let filter = struct_of(vec![PropertySignature::required("q", string())]);
    let definition = SchemaDefinition::new()
        .with_queries([(
            "search",
            Operation::new("Search", string()).field(PropertySignature::required("filter", filter)),
        )])
        .with_backend(TaggedBackend::with_delay_ms(1));

    let err = compile(&definition).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::Compile(CompileError::MissingIdentifier { kind: "TypeLiteral", .. })
    ));
}

#[test]
fn test_operations_require_a_backend() {
    let definition =
        SchemaDefinition::new().with_queries([("me", Operation::new("GetMe", user()))]);
    assert!(matches!(
        compile(&definition),
        Err(SchemaError::Compile(CompileError::MissingBackend))
    ));
}

#[test]
fn test_deep_partial_success_makes_fields_nullable() {
    let definition = SchemaDefinition::new()
        .with_queries([("me", Operation::new("GetMe", user()).deep_partial_success())])
        .with_backend(TaggedBackend::with_delay_ms(1));

    let sdl = compile(&definition).unwrap().sdl();
    assert!(sdl.contains("name: String\n"));
    assert!(!sdl.contains("name: String!"));
}

fn current_user_schema(calls: Arc<AtomicUsize>) -> convoy_schema::BuiltSchema {
    let pagination = struct_of(vec![PropertySignature::optional("cursor", string())])
        .identifier("Pagination");
    let get_current_user = Operation::new("GetCurrentUser", optional_of(user()))
        .field(PropertySignature::optional("pagination", pagination));
    let get_random = Operation::new("GetRandom", number())
        .field(PropertySignature::required("parent", user()));

    let backend = TaggedBackend::with_delay_ms(1)
        .handler("GetCurrentUser", move |_request| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value(json!({"_tag": "User", "name": "Alex", "random": 0})))
            }
        })
        .handler("GetRandom", |request| async move {
            match request.get("parent") {
                Some(ConstValue::Object(parent)) if parent.contains_key("name") => {
                    Ok(ConstValue::from(4))
                }
                _ => Err(ExecutionError::Failure {
                    tag: request.tag.clone(),
                    value: ConstValue::String("missing parent".into()),
                }),
            }
        });

    let definition = SchemaDefinition::new()
        .with_queries([("currentUser", get_current_user)])
        .resolve_field(&user(), [("random", get_random)])
        .unwrap()
        .with_backend(backend);

    compile(&definition).unwrap()
}

#[tokio::test]
async fn test_current_user_end_to_end() {
    let schema = current_user_schema(Arc::new(AtomicUsize::new(0)));

    let sdl = schema.sdl();
    assert!(sdl.contains("currentUser(pagination: Pagination): User"));
    assert!(sdl.contains("name: String!"));
    assert!(sdl.contains("input Pagination"));

    let response = schema.execute_query("{ currentUser { name } }").await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({"currentUser": {"name": "Alex"}})
    );
}

#[tokio::test]
async fn test_field_resolver_receives_parent() {
    let schema = current_user_schema(Arc::new(AtomicUsize::new(0)));

    let response = schema
        .execute_query("{ currentUser { name random } }")
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({"currentUser": {"name": "Alex", "random": 4}})
    );
}

#[tokio::test]
async fn test_identical_requests_run_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let schema = current_user_schema(calls.clone());

    let response = schema
        .execute_query("{ a: currentUser { name } b: currentUser { name } }")
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_backend_failure_is_scoped_to_its_field() {
    let fail = Operation::new("Fail", optional_of(string()));
    let ok = Operation::new("Ok", string());
    let backend = TaggedBackend::with_delay_ms(1)
        .handler("Fail", |request| async move {
            Err(ExecutionError::Failure {
                tag: request.tag,
                value: value(json!({"code": 500})),
            })
        })
        .handler("Ok", |_| async move { Ok(ConstValue::from("fine")) });
    let definition = SchemaDefinition::new()
        .with_queries([("fail", fail), ("ok", ok)])
        .with_backend(backend);
    let schema = compile(&definition).unwrap();

    let response = schema.execute_query("{ fail ok }").await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({"fail": null, "ok": "fine"})
    );
}

#[tokio::test]
async fn test_union_values_resolve_by_tag() {
    let a = tagged_class("A", vec![PropertySignature::required("a", string())]);
    let b = tagged_class("B", vec![PropertySignature::required("b", string())]);
    let backend = TaggedBackend::with_delay_ms(1)
        .handler("GetThing", |_| async move { Ok(value(json!({"_tag": "B", "b": "bee"}))) });
    let definition = SchemaDefinition::new()
        .with_queries([("thing", Operation::new("GetThing", union_of(vec![a, b])))])
        .with_backend(backend);
    let schema = compile(&definition).unwrap();

    assert!(schema.sdl().contains("union A_B = A | B"));
    let response = schema
        .execute_query("{ thing { __typename ... on B { b } } }")
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({"thing": {"__typename": "B", "b": "bee"}})
    );
}

#[tokio::test]
async fn test_custom_scalars_decode_arguments() {
    let shout = Operation::new("Shout", string())
        .field(PropertySignature::required("text", upper().identifier("Upper")));
    let backend = TaggedBackend::with_delay_ms(1).handler("Shout", |request| async move {
        Ok(request.get("text").cloned().unwrap_or(ConstValue::Null))
    });
    let definition = SchemaDefinition::new()
        .with_queries([("shout", shout)])
        .with_backend(backend);
    let schema = compile(&definition).unwrap();

    let response = schema.execute_query(r#"{ shout(text: "hey") }"#).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(response.data.into_json().unwrap(), json!({"shout": "HEY"}));

    let response = schema.execute_query(r#"{ shout(text: ["hey"]) }"#).await;
    assert!(!response.errors.is_empty());
}

#[tokio::test]
async fn test_enum_arguments_map_to_values() {
    let role = enums(vec![
        ("Admin".to_string(), ConstValue::from(1)),
        ("Guest".to_string(), ConstValue::from(2)),
    ])
    .identifier("Role");
    let echo = Operation::new("EchoRole", role.clone())
        .field(PropertySignature::required("role", role));
    let backend = TaggedBackend::with_delay_ms(1).handler("EchoRole", |request| async move {
        assert_eq!(request.get("role"), Some(&ConstValue::from(2)));
        Ok(ConstValue::from(2))
    });
    let definition = SchemaDefinition::new()
        .with_queries([("echo", echo)])
        .with_backend(backend);
    let schema = compile(&definition).unwrap();

    let response = schema.execute_query("{ echo(role: Guest) }").await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(response.data.into_json().unwrap(), json!({"echo": "Guest"}));
}

#[test]
fn test_type_refs_render_like_sdl() {
    let definition = SchemaDefinition::new();
    let config = CompilerConfig::default();
    let mut compiler = Compiler::new(&definition, &config);

    let ty: GqlTypeRef = compiler
        .output_type(&convoy_schema::ast::array_of(optional_of(user())))
        .unwrap();
    assert_eq!(ty.to_string(), "[User]!");
}

fn suffixed(suffix: &'static str) -> Ast {
    declare(
        vec![],
        Codec::new(
            |v| Ok(v.clone()),
            move |v| match v {
                ConstValue::String(s) => Ok(ConstValue::String(format!("{}-{}", s, suffix))),
                other => Ok(other.clone()),
            },
        ),
    )
}

fn thing_schema(partial: bool) -> convoy_schema::BuiltSchema {
    let thing = tagged_class(
        "Thing",
        vec![
            PropertySignature::required("a", suffixed("A")),
            PropertySignature::required("b", suffixed("B")),
        ],
    );
    let mut get_thing = Operation::new("GetThing", thing);
    if partial {
        get_thing = get_thing.deep_partial_success();
    }
    let backend = TaggedBackend::with_delay_ms(1).handler("GetThing", |_| async move {
        Ok(value(json!({"_tag": "Thing", "a": "x", "b": "y"})))
    });
    let definition = SchemaDefinition::new()
        .with_queries([("thing", get_thing)])
        .with_backend(backend);
    compile(&definition).unwrap()
}

#[tokio::test]
async fn test_partial_anonymous_scalars_keep_their_codecs() {
    for partial in [false, true] {
        let schema = thing_schema(partial);

        let sdl = schema.sdl();
        let scalar_of = |field: &str| {
            sdl.lines()
                .map(str::trim)
                .find_map(|line| line.strip_prefix(&format!("{}: ", field)))
                .map(|ty| ty.trim_end_matches('!').to_string())
                .unwrap()
        };
        assert_ne!(scalar_of("a"), scalar_of("b"), "{}", sdl);

        let response = schema.execute_query("{ thing { a b } }").await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({"thing": {"a": "x-A", "b": "y-B"}})
        );
    }
}

#[test]
fn test_partial_and_full_object_cannot_share_a_name() {
    let definition = SchemaDefinition::new()
        .with_queries([
            ("full", Operation::new("Full", user())),
            ("partial", Operation::new("Partial", user()).deep_partial_success()),
        ])
        .with_backend(TaggedBackend::with_delay_ms(1));

    let err = compile(&definition).unwrap_err();
    assert!(
        matches!(
            &err,
            SchemaError::Compile(CompileError::DuplicateTypeName { name }) if name == "User"
        ),
        "{:?}",
        err
    );
}

fn date() -> Ast {
    transform(
        string(),
        declare(vec![], Codec::identity()),
        Codec::new(
            |v| Ok(v.clone()),
            |v| match v {
                ConstValue::String(s) => Ok(ConstValue::String(format!("{}T00:00:00Z", s))),
                other => Err(format!("Expected string, actual {}", other)),
            },
        ),
    )
}

#[tokio::test]
async fn test_final_transformation_compiles_to_named_scalar() {
    let backend = TaggedBackend::with_delay_ms(1)
        .handler("Today", |_| async move { Ok(ConstValue::from("2024-01-01")) });
    let definition = SchemaDefinition::new()
        .with_queries([("today", Operation::new("Today", date().identifier("Date")))])
        .with_backend(backend);
    let schema = compile(&definition).unwrap();

    let sdl = schema.sdl();
    assert!(sdl.contains("scalar Date"), "{}", sdl);
    assert!(sdl.contains("today: Date!"), "{}", sdl);

    let response = schema.execute_query("{ today }").await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({"today": "2024-01-01T00:00:00Z"})
    );
}

#[test]
fn test_final_transformation_without_identifier_fails() {
    let definition = SchemaDefinition::new()
        .with_queries([("today", Operation::new("Today", date()))])
        .with_backend(TaggedBackend::with_delay_ms(1));

    let err = compile(&definition).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::Compile(CompileError::MissingIdentifier { kind: "Transformation", .. })
    ));
}

#[test]
fn test_anonymous_enums_get_indexed_names() {
    let definition = SchemaDefinition::new();
    let config = CompilerConfig::default();
    let mut compiler = Compiler::new(&definition, &config);

    let color = enums(vec![("Red".to_string(), ConstValue::from(0))]);
    let size = enums(vec![("Small".to_string(), ConstValue::from(0))]);
    assert_eq!(compiler.output_type(&color).unwrap().to_string(), "Enum0!");
    assert_eq!(compiler.input_type(&size).unwrap().to_string(), "Enum1!");
    assert_eq!(compiler.input_type(&color).unwrap().to_string(), "Enum0!");
}
