use crate::RouterError;
use crate::event::IncomingEvent;
use crate::route::Route;
use http::StatusCode;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Upper bound on nested dynamic redirects, so a resolver returning itself cannot loop forever.
const MAX_REDIRECT_RESOLUTIONS: usize = 8;

type RedirectFn = dyn Fn(&Route, &dyn IncomingEvent) -> Redirect + Send + Sync;

/// Where a redirect route sends the client.
#[derive(Clone)]
pub enum Redirect {
    /// `302 Found` to the location
    To(String),
    Status { status: u16, location: String },
    /// computed per request, the result is resolved again
    Dynamic(Arc<RedirectFn>),
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self::To(location.into())
    }

    pub fn permanent(location: impl Into<String>) -> Self {
        Self::Status { status: StatusCode::MOVED_PERMANENTLY.as_u16(), location: location.into() }
    }

    pub fn with_status(status: u16, location: impl Into<String>) -> Self {
        Self::Status { status, location: location.into() }
    }

    /// Builds a redirect from a `{status: location}` map, using its first entry
    pub fn from_map(map: BTreeMap<u16, String>) -> Result<Self, RouterError> {
        map.into_iter()
            .next()
            .map(|(status, location)| Self::Status { status, location })
            .ok_or_else(|| RouterError::configuration("redirect map is empty"))
    }

    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&Route, &dyn IncomingEvent) -> Redirect + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Resolves the redirect into its status and `Location`, following dynamic redirects.
    pub fn resolve(&self, route: &Route, event: &dyn IncomingEvent) -> Result<(StatusCode, String), RouterError> {
        let mut current = self.clone();

        for _ in 0..MAX_REDIRECT_RESOLUTIONS {
            let (status, location) = match current {
                Self::To(location) => (StatusCode::FOUND, location),
                Self::Status { status, location } => {
                    let status = StatusCode::from_u16(status)
                        .map_err(|e| RouterError::configuration(format!("invalid redirect status {status}: {e}")))?;
                    (status, location)
                }
                Self::Dynamic(f) => {
                    current = f(route, event);
                    continue;
                }
            };
            return Ok((status, location));
        }

        Err(RouterError::configuration(format!(
            "redirect of route `{}` did not resolve within {MAX_REDIRECT_RESOLUTIONS} steps",
            route.path()
        )))
    }
}

impl fmt::Debug for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::To(location) => f.debug_tuple("To").field(location).finish(),
            Self::Status { status, location } => {
                f.debug_struct("Status").field("status", status).field("location", location).finish()
            }
            Self::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

impl From<&str> for Redirect {
    fn from(location: &str) -> Self {
        Self::to(location)
    }
}

impl From<String> for Redirect {
    fn from(location: String) -> Self {
        Self::To(location)
    }
}
