use http::{Method, StatusCode};
use micro_router::{
    BoxError, GenerateOptions, HttpEvent, ResponseContent, RouteContext, RouteDefinition, RouteRegistrar, Router,
    RouterError, binding_fn, handler_fn,
};
use serde_json::{Value, json};

fn event(method: Method, uri: &str) -> HttpEvent {
    HttpEvent::parse(method, uri).unwrap()
}

fn echo_params() -> micro_router::ActionDefinition {
    handler_fn(|ctx: RouteContext| async move { Value::Object(ctx.into_params().into_map()) }).into()
}

async fn params_of(router: &Router, method: Method, uri: &str) -> Value {
    match router.dispatch(&event(method, uri)).await.unwrap().content() {
        ResponseContent::Json(value) => value.clone(),
        other => panic!("unexpected content {other:?}"),
    }
}

#[tokio::test]
async fn generated_urls_bind_back_to_their_params() {
    let router = Router::builder()
        .define([
            RouteDefinition::new("/users/:id(\\d+)/posts/:slug").method("GET").name("posts.show").action(echo_params()),
            RouteDefinition::new("/:tenant/files/:path+").method("GET").name("files").action(echo_params()),
        ])
        .build()
        .unwrap();

    let cases = [
        ("posts.show", json!({ "id": 42, "slug": "hello-world" })),
        ("posts.show", json!({ "id": 7, "slug": "a b" })),
        ("files", json!({ "tenant": "acme", "path": "docs/2024/report.pdf" })),
    ];

    for (name, params) in cases {
        let mut options = GenerateOptions::named(name);
        for (key, value) in params.as_object().unwrap() {
            options = options.param(key.clone(), value.clone());
        }
        let url = router.generate(&options).unwrap();
        assert_eq!(params_of(&router, Method::GET, &url).await, params, "round trip of {url}");
    }
}

#[tokio::test]
async fn optional_params_fall_back_to_defaults() {
    let router = Router::builder()
        .define([RouteDefinition::new("/users/:id?").method("GET").default_value("id", 7).action(echo_params())])
        .build()
        .unwrap();

    assert_eq!(params_of(&router, Method::GET, "/users/").await, json!({ "id": 7 }));
    assert_eq!(params_of(&router, Method::GET, "/users").await, json!({ "id": 7 }));
    assert_eq!(params_of(&router, Method::GET, "/users/12").await, json!({ "id": 12 }));
}

#[tokio::test]
async fn required_repeat_needs_a_segment() {
    let router = Router::builder().get("/files/:seg+", echo_params()).build().unwrap();

    assert_eq!(params_of(&router, Method::GET, "/files/a/b/c").await, json!({ "seg": "a/b/c" }));
    let error = router.dispatch(&event(Method::GET, "/files/")).await.unwrap_err();
    assert!(matches!(error, RouterError::RouteNotFound { .. }));
}

#[tokio::test]
async fn strict_routes_respect_slash_and_case() {
    let strict = Router::builder()
        .define([RouteDefinition::new("/a/").method("GET").strict(true).action(echo_params())])
        .build()
        .unwrap();
    assert!(strict.dispatch(&event(Method::GET, "/a/")).await.is_ok());
    assert!(strict.dispatch(&event(Method::GET, "/a")).await.is_err());
    assert!(strict.dispatch(&event(Method::GET, "/A/")).await.is_err());

    let loose = Router::builder().get("/a/", echo_params()).build().unwrap();
    for uri in ["/a", "/a/", "/A", "/A/"] {
        assert!(loose.dispatch(&event(Method::GET, uri)).await.is_ok(), "{uri}");
    }
}

#[tokio::test]
async fn other_methods_are_reported() {
    let router = Router::builder()
        .response_resolver(micro_router::DefaultResponseResolver)
        .post("/widgets", echo_params())
        .build()
        .unwrap();

    let error = router.dispatch(&event(Method::GET, "/widgets")).await.unwrap_err();
    assert_eq!(error.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(matches!(error, RouterError::MethodNotAllowed { ref allowed, .. } if *allowed == [Method::POST]));

    let response = router.dispatch(&event(Method::OPTIONS, "/widgets")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(http::header::ALLOW).unwrap(), "POST");
    assert_eq!(response.content(), &ResponseContent::Json(json!({ "Allow": "POST" })));
}

#[tokio::test]
async fn fallback_routes_are_tried_last() {
    let router = Router::builder()
        .fallback(handler_fn(|_ctx| async { "fallback" }))
        .get("/users/:id(\\d+)", handler_fn(|_ctx| async { "user" }))
        .build()
        .unwrap();

    let response = router.dispatch(&event(Method::GET, "/users/12")).await.unwrap();
    assert_eq!(response.content(), &ResponseContent::Text("user".into()));

    let response = router.dispatch(&event(Method::GET, "/unknown/path")).await.unwrap();
    assert_eq!(response.content(), &ResponseContent::Text("fallback".into()));
    assert!(router.get_current_route().unwrap().is_fallback());
}

#[test]
fn children_inherit_middleware_and_rules() {
    let router = Router::builder()
        .middleware("A", NoopMiddleware)
        .middleware("B", NoopMiddleware)
        .define([RouteDefinition::group()
            .path("/users")
            .middleware("A")
            .rule("id", "\\d+")
            .child(RouteDefinition::new("/:id").method("GET").middleware("B").name("users.show").action(echo_params()))])
        .build()
        .unwrap();

    let route = router.get_routes().get_by_name("users.show").unwrap();
    assert_eq!(route.middleware(), ["A", "B"]);
    assert_eq!(route.options().rules["id"], "\\d+");
    assert!(route.matches(&event(Method::GET, "/users/3"), true));
    assert!(!route.matches(&event(Method::GET, "/users/x"), true));
}

struct NoopMiddleware;

impl micro_router::Middleware for NoopMiddleware {}

#[tokio::test]
async fn binding_failures_depend_on_optionality() {
    let find_user = || {
        binding_fn(|_key: String, value: Value| async move {
            Ok::<_, BoxError>((value == json!(1)).then(|| json!({ "id": 1, "name": "ada" })))
        })
    };
    let router = Router::builder()
        .define([
            RouteDefinition::new("/users/:user").method("GET").binding("user", find_user()).action(echo_params()),
            RouteDefinition::new("/profile/:user?")
                .method("GET")
                .binding("user", find_user())
                .action(echo_params()),
        ])
        .build()
        .unwrap();

    assert_eq!(params_of(&router, Method::GET, "/users/1").await, json!({ "user": { "id": 1, "name": "ada" } }));

    let error = router.dispatch(&event(Method::GET, "/users/2")).await.unwrap_err();
    assert!(matches!(error, RouterError::ResourceNotFound { ref param, .. } if param == "user"));
    assert_eq!(error.status_code(), StatusCode::NOT_FOUND);

    assert_eq!(params_of(&router, Method::GET, "/profile/2").await, json!({}));
}

#[tokio::test]
async fn end_to_end_named_route() {
    let router = Router::builder()
        .define([RouteDefinition::new("/users/:id(\\d+)").method("GET").name("users.get").action(echo_params())])
        .build()
        .unwrap();

    assert_eq!(params_of(&router, Method::GET, "/users/42").await, json!({ "id": 42 }));
    assert_eq!(router.get_current_route().unwrap().name(), Some("users.get"));
    assert_eq!(router.get_parameters().unwrap().get("id"), Some(&json!(42)));

    let url = router.generate(&GenerateOptions::named("users.get").param("id", 42)).unwrap();
    assert_eq!(url, "/users/42");
}
