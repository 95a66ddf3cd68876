use micro_router::{RouteContext, RouteDefinition, RouteRegistrar, Router, handler_fn};

/// Resource names used to grow route tables of different sizes.
const RESOURCES: [&str; 12] =
    ["users", "posts", "comments", "tags", "orders", "invoices", "products", "carts", "reviews", "teams", "projects", "files"];

/// `(path, method, name)` of the routes declared for every resource.
const ACTIONS: [(&str, &str, &str); 6] = [
    ("/", "GET", "index"),
    ("/", "POST", "store"),
    ("/:id", "GET", "show"),
    ("/:id", "PUT", "update"),
    ("/:id", "DELETE", "destroy"),
    ("/:id/files/:path*", "GET", "files"),
];

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    method: &'static str,
    uri: &'static str,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, method: &'static str, uri: &'static str) -> Self {
        Self { name, group, method, uri }
    }

    pub fn small(name: &'static str, method: &'static str, uri: &'static str) -> Self {
        Self::new(name, TestGroup::Small, method, uri)
    }

    pub fn normal(name: &'static str, method: &'static str, uri: &'static str) -> Self {
        Self::new(name, TestGroup::Normal, method, uri)
    }

    pub fn large(name: &'static str, method: &'static str, uri: &'static str) -> Self {
        Self::new(name, TestGroup::Large, method, uri)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn uri(&self) -> &'static str {
        self.uri
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

impl TestGroup {
    /// How many resources the route table for this group declares.
    pub fn resources(self) -> usize {
        match self {
            TestGroup::Small => 2,
            TestGroup::Normal => 6,
            TestGroup::Large => RESOURCES.len(),
        }
    }
}

/// Builds a router with a REST style group per resource plus a fallback route.
///
/// Every resource `r` gets the named routes `r.index`, `r.store`, `r.show`,
/// `r.update`, `r.destroy` and `r.files`.
///
/// # Panics
///
/// Panics if the fixture routes fail to compile.
pub fn router(group: TestGroup) -> Router {
    let builder = RESOURCES.iter().take(group.resources()).fold(Router::builder(), |builder, resource| {
        builder.group(RouteDefinition::new(format!("/api/{resource}")).name(*resource).rule("id", "\\d+"), |r| {
            r.define(ACTIONS.iter().map(|(path, method, name)| {
                RouteDefinition::new(*path).method(*method).name(*name).handler(handler_fn(echo))
            }))
        })
    });

    builder.fallback(handler_fn(echo)).build().expect("fixture routes should compile")
}

async fn echo(ctx: RouteContext) -> serde_json::Value {
    serde_json::Value::Object(ctx.into_params().into_map())
}
