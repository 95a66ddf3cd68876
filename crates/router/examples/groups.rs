//! Nested groups, controllers, middleware and entity binding.

use async_trait::async_trait;
use http::{HeaderValue, Method, StatusCode};
use micro_router::middleware::ResponseResult;
use micro_router::{
    BoxError, Controller, ControllerRef, HttpEvent, Middleware, OutgoingResponse, ResponseContent, RouteContext,
    RouteDefinition, RouteRegistrar, Router, RouterError, binding_fn, handler_fn,
};
use serde_json::{Value, json};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Default)]
struct ArticleController;

#[async_trait]
impl Controller for ArticleController {
    async fn call(&self, method: &str, ctx: &RouteContext) -> Result<OutgoingResponse, BoxError> {
        let content = match method {
            "index" => json!({ "articles": [1, 2, 3] }),
            "show" => json!({ "article": ctx.param("article") }),
            other => return Err(format!("no action `{other}`").into()),
        };
        Ok(OutgoingResponse::default().with_content(ResponseContent::Json(content)))
    }
}

/// Rejects requests without an `api_key` query parameter.
struct ApiKey;

#[async_trait]
impl Middleware for ApiKey {
    async fn on_request(&self, ctx: &RouteContext) -> Result<Option<OutgoingResponse>, BoxError> {
        if ctx.query_param("api_key").is_some() {
            return Ok(None);
        }
        Ok(Some(OutgoingResponse::new(StatusCode::UNAUTHORIZED)))
    }
}

struct PoweredBy;

#[async_trait]
impl Middleware for PoweredBy {
    async fn on_response(&self, _ctx: &RouteContext, resp: &mut ResponseResult) {
        if let Ok(response) = resp {
            response.headers_mut().insert("x-powered-by", HeaderValue::from_static("micro-router"));
        }
    }
}

async fn find_article(_key: String, id: Value) -> Result<Option<Value>, BoxError> {
    Ok(id.as_i64().filter(|id| *id <= 3).map(|id| json!({ "id": id, "title": format!("article #{id}") })))
}

#[tokio::main]
async fn main() -> Result<(), RouterError> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let router = Router::builder()
        .middleware("api_key", ApiKey)
        .middleware("powered_by", PoweredBy)
        .group(
            RouteDefinition::new("/api/v1").name("api.v1").middleware("powered_by").rule("article", "\\d+"),
            |v1| {
                v1.group(
                    RouteDefinition::new("/articles")
                        .name("articles")
                        .action(ControllerRef::of::<ArticleController>("ArticleController"))
                        .binding("article", binding_fn(find_article)),
                    |articles| articles.get("/", "index").get("/:article", "show"),
                )
                .group(RouteDefinition::new("/admin").name("admin").middleware("api_key"), |admin| {
                    admin.delete("/cache", handler_fn(|_ctx| async { (StatusCode::NO_CONTENT, ()) }))
                })
            },
        )
        .build()?;

    for route in router.dump_routes() {
        info!("{} {} -> {}", route.method, route.path, route.handler);
    }

    for (method, uri) in [
        (Method::GET, "/api/v1/articles"),
        (Method::GET, "/api/v1/articles/2"),
        (Method::GET, "/api/v1/articles/9"),
        (Method::DELETE, "/api/v1/admin/cache"),
        (Method::DELETE, "/api/v1/admin/cache?api_key=secret"),
    ] {
        let event = HttpEvent::parse(method.clone(), uri).expect("valid uri");
        match router.dispatch(&event).await {
            Ok(response) => info!(%method, uri, status = %response.status(), headers = ?response.headers(), "dispatched"),
            Err(e) => warn!(%method, uri, status = %e.status_code(), cause = %e, "dispatch failed"),
        }
    }

    Ok(())
}
