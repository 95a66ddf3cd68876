use http::{Method, StatusCode};
use micro_router::{
    DefaultResponseResolver, GenerateOptions, HttpEvent, RouteContext, RouteDefinition, RouteRegistrar, Router,
    RouterError, handler_fn,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Deserialize, Debug)]
struct Page {
    page: u32,
}

async fn list_users(ctx: RouteContext) -> serde_json::Value {
    let page = ctx.params().deserialize::<Page>().map(|p| p.page).unwrap_or(1);
    json!({ "users": ["ada", "grace"], "page": page })
}

async fn show_user(ctx: RouteContext) -> String {
    format!("user {} via {}", ctx.param("id").cloned().unwrap_or_default(), ctx.method())
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 not found")
}

#[tokio::main]
async fn main() -> Result<(), RouterError> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let router = Router::builder()
        .response_resolver(DefaultResponseResolver)
        .define([
            RouteDefinition::new("/users/:page?").method("GET").name("users.index").default_value("page", 1).handler(handler_fn(list_users)),
            RouteDefinition::new("/users/:id(\\d+)/profile").method("GET").name("users.show").handler(handler_fn(show_user)),
        ])
        .post("/users", handler_fn(|_ctx| async { (StatusCode::CREATED, "created") }))
        .fallback(handler_fn(|_ctx| not_found()))
        .build()?;

    for route in router.dump_routes() {
        info!(method = route.method, path = route.path, name = route.name, handler = route.handler, "route");
    }

    for (method, uri) in [
        (Method::GET, "/users"),
        (Method::GET, "/users/3"),
        (Method::GET, "/users/42/profile"),
        (Method::POST, "/users"),
        (Method::DELETE, "/users"),
        (Method::OPTIONS, "/users"),
        (Method::GET, "/nowhere"),
    ] {
        let event = HttpEvent::parse(method.clone(), uri).expect("valid uri");
        match router.dispatch(&event).await {
            Ok(response) => info!(%method, uri, status = %response.status(), content = ?response.content(), "dispatched"),
            Err(e) => warn!(%method, uri, status = %e.status_code(), cause = %e, "dispatch failed"),
        }
    }

    let url = router.generate(&GenerateOptions::named("users.show").param("id", 42).query("tab", "posts"))?;
    info!(url, "generated");

    Ok(())
}
