use super::*;
use crate::action::{ComponentRef, Controller, ControllerRef};
use crate::binding::binding_fn;
use crate::dispatcher::Dispatcher;
use crate::error::BoxError;
use crate::event::HttpEvent;
use crate::handler_fn;
use crate::response::DefaultResponseResolver;
use async_trait::async_trait;
use mockall::mock;
use serde_json::json;
use std::any::Any;

mock! {
    Services {}

    impl Container for Services {
        fn resolve(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>>;
        fn resolve_controller(&self, name: &str) -> Option<Arc<dyn Controller>>;
    }
}

fn echo() -> Action {
    Action::Callable(Arc::new(handler_fn(|ctx: RouteContext| async move { Value::Object(ctx.into_params().into_map()) })))
}

fn route(path: &str) -> Route {
    Route::create(RouteOptions::new(path, Method::GET, echo()))
}

fn event(method: Method, uri: &str) -> HttpEvent {
    HttpEvent::parse(method, uri).unwrap()
}

#[test]
fn test_matches_method_and_path() {
    let route = route("/users/:id(\\d+)");

    assert!(route.matches(&event(Method::GET, "/users/12"), true));
    assert!(route.matches(&event(Method::GET, "/users/12/"), true));
    assert!(!route.matches(&event(Method::GET, "/users/abc"), true));
    assert!(!route.matches(&event(Method::POST, "/users/12"), true));
    assert!(route.matches(&event(Method::POST, "/users/12"), false));
}

#[test]
fn test_matches_domain_and_protocol() {
    let mut options = RouteOptions::new("/", Method::GET, echo());
    options.domain = Some("{tenant}.example.com".into());
    options.protocol = Some(Protocol::Https);
    let route = Route::create(options);

    assert!(route.matches(&event(Method::GET, "https://acme.example.com/"), true));
    assert!(!route.matches(&event(Method::GET, "http://acme.example.com/"), true));
    assert!(!route.matches(&event(Method::GET, "https://example.org/"), true));
    assert!(!route.matches(&event(Method::GET, "/"), true));
}

#[test]
fn test_no_matchers_never_match() {
    let route = route("/").with_matchers(vec![]);
    assert!(!route.matches(&event(Method::GET, "/"), true));

    let method_only = self::route("/").with_matchers(vec![Arc::new(crate::matcher::MethodMatcher)]);
    assert!(!method_only.matches(&event(Method::GET, "/"), false));
}

#[test]
fn test_invalid_pattern_does_not_match() {
    let route = route("/:id([)");
    assert!(route.compile().unwrap_err().is_configuration());
    assert!(!route.matches(&event(Method::GET, "/1"), true));
}

#[test]
fn test_alias_matches() {
    let mut options = RouteOptions::new("/members/:id", Method::GET, echo());
    options.alias = vec!["/people/:id".into()];
    let route = Route::create(options);

    assert!(route.matches(&event(Method::GET, "/members/1"), true));
    assert!(route.matches(&event(Method::GET, "/people/1"), true));
}

#[tokio::test]
async fn test_bind_coerces_and_defaults() {
    let mut options = RouteOptions::new("/posts/:id/:page?/:format?=html", Method::GET, echo());
    options.defaults = Defaults::from([("page".to_owned(), json!(1)), ("locale".to_owned(), json!("en"))]);
    let route = Arc::new(Route::create(options));

    let ctx = route.bind(&event(Method::GET, "/posts/42?q=x")).await.unwrap();
    assert_eq!(ctx.param("id"), Some(&json!(42)));
    assert_eq!(ctx.param("page"), Some(&json!(1)));
    assert_eq!(ctx.param("format"), Some(&json!("html")));
    assert_eq!(ctx.param("locale"), Some(&json!("en")));
    assert_eq!(ctx.query_param("q"), Some("x"));

    let ctx = route.bind(&event(Method::GET, "/posts/0042/3/json")).await.unwrap();
    assert_eq!(ctx.param("id"), Some(&json!("0042")));
    assert_eq!(ctx.param("page"), Some(&json!(3)));
    assert_eq!(ctx.param("format"), Some(&json!("json")));
}

#[tokio::test]
async fn test_bind_domain_param() {
    let mut options = RouteOptions::new("/users/:id", Method::GET, echo());
    options.domain = Some(":tenant.example.com".into());
    let route = Arc::new(Route::create(options));

    let ctx = route.bind(&event(Method::GET, "http://acme.example.com/users/7")).await.unwrap();
    assert_eq!(ctx.param("tenant"), Some(&json!("acme")));
    assert_eq!(ctx.param("id"), Some(&json!(7)));
    assert_eq!(ctx.host(), Some("acme.example.com"));
}

#[tokio::test]
async fn test_bind_decodes_path() {
    let route = Arc::new(route("/tags/:name"));
    let ctx = route.bind(&event(Method::GET, "/tags/rust%20lang")).await.unwrap();
    assert_eq!(ctx.param("name"), Some(&json!("rust lang")));
}

#[tokio::test]
async fn test_bind_with_binding() {
    let mut options = RouteOptions::new("/users/:user@id/:team?", Method::GET, echo());
    options.bindings.insert(
        "user".into(),
        Arc::new(binding_fn(|key: String, value: Value| async move {
            Ok(match value.as_i64() {
                Some(1) => Some(json!({ "lookup": key, "name": "alice" })),
                _ => None,
            })
        })),
    );
    options.bindings.insert(
        "team".into(),
        Arc::new(binding_fn(|_key: String, _value: Value| async move { Err::<Option<Value>, BoxError>("db down".into()) })),
    );
    options.defaults.insert("team".into(), json!("none"));
    let route = Arc::new(Route::create(options));

    let ctx = route.bind(&event(Method::GET, "/users/1/core")).await.unwrap();
    assert_eq!(ctx.param("user"), Some(&json!({ "lookup": "id", "name": "alice" })));
    assert_eq!(ctx.param("team"), Some(&json!("none")));

    let error = route.bind(&event(Method::GET, "/users/2")).await.unwrap_err();
    assert!(matches!(&error, RouterError::ResourceNotFound { param, .. } if param == "user"));
    assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_run_callable() {
    let route = Arc::new(route("/users/:id"));
    let event = event(Method::GET, "/users/5");
    let ctx = route.bind(&event).await.unwrap();

    let response = route.run(&ctx, &event).await.unwrap();
    assert_eq!(response.content(), &ResponseContent::Json(json!({ "id": 5 })));
}

#[derive(Default)]
struct Greeter {
    greeting: &'static str,
}

#[async_trait]
impl Controller for Greeter {
    async fn call(&self, method: &str, ctx: &RouteContext) -> Result<OutgoingResponse, BoxError> {
        let name = ctx.param_as::<String>("name").unwrap_or_default();
        Ok(OutgoingResponse::default().with_content(ResponseContent::Text(format!("{method}: {}{name}", self.greeting))))
    }
}

#[tokio::test]
async fn test_run_controller_prefers_container() {
    let action = Action::Controller { controller: ControllerRef::of::<Greeter>("Greeter"), method: "hello".into() };
    let event = event(Method::GET, "/hi/bob");

    let plain = Arc::new(Route::create(RouteOptions::new("/hi/:name", Method::GET, action.clone())));
    let ctx = plain.bind(&event).await.unwrap();
    let response = plain.run(&ctx, &event).await.unwrap();
    assert_eq!(response.content(), &ResponseContent::Text("hello: bob".into()));

    let mut services = MockServices::new();
    services
        .expect_resolve_controller()
        .withf(|name| name == "Greeter")
        .times(1)
        .returning(|_| Some(Arc::new(Greeter { greeting: "hey " }) as Arc<dyn Controller>));
    let container: Arc<dyn Container> = Arc::new(services);
    let resolved =
        Arc::new(Route::create(RouteOptions::new("/hi/:name", Method::GET, action)).with_container(Some(container)));
    let ctx = resolved.bind(&event).await.unwrap();
    let response = resolved.run(&ctx, &event).await.unwrap();
    assert_eq!(response.content(), &ResponseContent::Text("hello: hey bob".into()));
}

struct PageDispatcher;

#[async_trait]
impl Dispatcher for PageDispatcher {
    async fn dispatch(&self, target: DispatchTarget<'_>, _ctx: &RouteContext) -> Result<OutgoingResponse, BoxError> {
        let DispatchTarget::Component(component) = target else {
            return Err("not a component".into());
        };
        Ok(OutgoingResponse::default().with_content(ResponseContent::Text(component.name().to_owned())))
    }
}

#[tokio::test]
async fn test_run_component_requires_dispatcher() {
    let options = RouteOptions::new("/page", Method::GET, Action::Component(ComponentRef::new("HomePage")));
    let event = event(Method::GET, "/page");

    let missing = Arc::new(Route::create(options.clone()));
    let ctx = missing.bind(&event).await.unwrap();
    assert!(matches!(missing.run(&ctx, &event).await, Err(RouterError::MissingDispatcher { .. })));

    let dispatchers = Dispatchers::empty().with(DispatcherType::Component, PageDispatcher);
    let route = Arc::new(Route::create(options).with_dispatchers(&dispatchers));
    let ctx = route.bind(&event).await.unwrap();
    let response = route.run(&ctx, &event).await.unwrap();
    assert_eq!(response.content(), &ResponseContent::Text("HomePage".into()));
}

#[tokio::test]
async fn test_redirect_wins_over_action() {
    let mut options = RouteOptions::new("/old", Method::GET, echo());
    options.redirect = Some(Redirect::permanent("/new"));
    let event = event(Method::GET, "/old");

    let route = Arc::new(Route::create(options.clone()));
    let ctx = route.bind(&event).await.unwrap();
    let response = route.run(&ctx, &event).await.unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers().get(http::header::LOCATION).unwrap(), "/new");

    options.redirect = Some(Redirect::dynamic(|route, _event| Redirect::to(format!("{}/moved", route.path()))));
    let route = Arc::new(Route::create(options).with_response_resolver(Some(Arc::new(DefaultResponseResolver))));
    let ctx = route.bind(&event).await.unwrap();
    let response = route.run(&ctx, &event).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers().get(http::header::LOCATION).unwrap(), "/old/moved");
}

#[tokio::test]
async fn test_handler_error_is_wrapped() {
    let action = Action::Callable(Arc::new(handler_fn(|_ctx: RouteContext| async {
        Err::<String, BoxError>("boom".into())
    })));
    let route = Arc::new(Route::create(RouteOptions::new("/", Method::GET, action)));
    let event = event(Method::GET, "/");
    let ctx = route.bind(&event).await.unwrap();

    let error = route.run(&ctx, &event).await.unwrap_err();
    assert!(matches!(error, RouterError::Handler { .. }));
    assert_eq!(error.to_string(), "handler error: boom");
}

#[test]
fn test_generate() {
    let route = route("/users/:id/posts/:page?/:rest*");

    let url = route
        .generate(&GenerateOptions::new().param("id", 5).param("rest", "a b/c").param("sort", "desc").hash("top"))
        .unwrap();
    assert_eq!(url, "/users/5/posts/a%20b/c?sort=desc#top");

    let url = route.generate(&GenerateOptions::new().param("id", "x").query("q", "1")).unwrap();
    assert_eq!(url, "/users/x/posts?q=1");

    let error = route.generate(&GenerateOptions::new()).unwrap_err();
    assert!(matches!(error, RouterError::MissingParameter { ref param, .. } if param == "id"));
}

#[test]
fn test_generate_defaults_and_slashes() {
    let mut options = RouteOptions::new("/list/:page=1/", Method::GET, echo());
    options.strict = true;
    let route = Route::create(options);
    assert_eq!(route.generate(&GenerateOptions::new()).unwrap(), "/list/1/");

    assert_eq!(self::route("/").generate(&GenerateOptions::new()).unwrap(), "/");
    assert_eq!(self::route("/:opt?").generate(&GenerateOptions::new()).unwrap(), "/");
}

#[tokio::test]
async fn test_generate_keeps_prefix_of_empty_optional() {
    let route = Arc::new(route("/x/user-:id?"));

    let url = route.generate(&GenerateOptions::new()).unwrap();
    assert_eq!(url, "/x/user-");
    let event = event(Method::GET, &url);
    assert!(route.matches(&event, true));
    assert!(route.bind(&event).await.unwrap().params().is_empty());

    let url = route.generate(&GenerateOptions::new().param("id", 7)).unwrap();
    assert_eq!(url, "/x/user-7");
    let ctx = route.bind(&self::event(Method::GET, &url)).await.unwrap();
    assert_eq!(ctx.param("id"), Some(&json!(7)));
}

#[test]
fn test_generate_with_domain() {
    let mut options = RouteOptions::new("/dash", Method::GET, echo());
    options.domain = Some("{tenant}.example.com".into());
    options.protocol = Some(Protocol::Https);
    let route = Route::create(options);

    let url = route.generate(&GenerateOptions::new().param("tenant", "acme").with_domain(None)).unwrap();
    assert_eq!(url, "https://acme.example.com/dash");

    let url = route.generate(&GenerateOptions::new().param("tenant", "acme").with_domain(Some(Protocol::Http))).unwrap();
    assert_eq!(url, "http://acme.example.com/dash");

    let url = route.generate(&GenerateOptions::new().param("tenant", "acme")).unwrap();
    assert_eq!(url, "/dash");
}

#[test]
fn test_summary_and_middleware() {
    let mut options = RouteOptions::new("/admin", Method::POST, echo());
    options.middleware = vec!["auth".into(), "log".into(), "csrf".into()];
    options.exclude_middleware = vec!["log".into()];
    let route = Route::create(options);

    assert_eq!(route.middleware(), vec!["auth", "csrf"]);
    let summary = route.summary();
    assert_eq!(summary.method, "POST");
    assert_eq!(summary.handler, "Callable");
    assert_eq!(summary.name, NOT_SET);
    assert_eq!(summary.domain, NOT_SET);
    assert_eq!(route.to_string(), "POST /admin -> Callable (name: N/A, domain: N/A)");
}

#[test]
fn test_protocol_from_str() {
    assert_eq!("HTTPS".parse::<Protocol>().unwrap(), Protocol::Https);
    assert!("ftp".parse::<Protocol>().unwrap_err().is_configuration());
}
