//! Route matchers.
//!
//! A route matches an event only when every one of its matchers agrees. The default
//! set checks domain, method, protocol and path; hosts may add their own through
//! [`fn_matcher`].
//!
//! ## Thread Safety
//!
//! Matchers must be `Send + Sync`: matching only reads from the route and the event, so
//! one route may be matched concurrently by many in-flight requests.
//!
//! # Examples
//!
//! ```
//! use micro_router::matcher::{default_matchers, fn_matcher};
//! use micro_router::IncomingEvent;
//! use std::sync::Arc;
//!
//! let mut matchers = default_matchers();
//! matchers.push(Arc::new(fn_matcher(|_route, event: &dyn IncomingEvent| event.query().is_empty())));
//! ```

use crate::event::IncomingEvent;
use crate::route::Route;
use std::fmt;
use std::sync::Arc;

/// What a matcher checks; method matchers are skipped when probing alternate verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    Domain,
    Method,
    Protocol,
    Uri,
    Custom,
}

/// Core trait for route matching.
pub trait Matcher: Send + Sync {
    fn kind(&self) -> MatcherKind {
        MatcherKind::Custom
    }

    /// Returns `true` if the event satisfies this matcher for `route`.
    fn matches(&self, route: &Route, event: &dyn IncomingEvent) -> bool;
}

/// A matcher that wraps a closure.
struct FnMatcher<F>(F);

impl<F> Matcher for FnMatcher<F>
where
    F: Fn(&Route, &dyn IncomingEvent) -> bool + Send + Sync,
{
    fn matches(&self, route: &Route, event: &dyn IncomingEvent) -> bool {
        (self.0)(route, event)
    }
}

/// Creates a custom matcher from a closure.
pub fn fn_matcher<F>(f: F) -> impl Matcher
where
    F: Fn(&Route, &dyn IncomingEvent) -> bool + Send + Sync,
{
    FnMatcher(f)
}

/// Matches the request host against the route domain; routes without a domain accept any host.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomainMatcher;

impl Matcher for DomainMatcher {
    fn kind(&self) -> MatcherKind {
        MatcherKind::Domain
    }

    fn matches(&self, route: &Route, event: &dyn IncomingEvent) -> bool {
        route.domain_matches(event)
    }
}

/// Matches the HTTP method.
#[derive(Debug, Default, Clone, Copy)]
pub struct MethodMatcher;

impl Matcher for MethodMatcher {
    fn kind(&self) -> MatcherKind {
        MatcherKind::Method
    }

    fn matches(&self, route: &Route, event: &dyn IncomingEvent) -> bool {
        event.is_method(route.method())
    }
}

/// Matches `http`/`https` routes against whether the event is secure.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProtocolMatcher;

impl Matcher for ProtocolMatcher {
    fn kind(&self) -> MatcherKind {
        MatcherKind::Protocol
    }

    fn matches(&self, route: &Route, event: &dyn IncomingEvent) -> bool {
        route.protocol().is_none_or(|protocol| protocol.is_secure() == event.is_secure())
    }
}

/// Matches the full URI (domain and path) against the compiled route regexes.
#[derive(Debug, Default, Clone, Copy)]
pub struct UriMatcher;

impl Matcher for UriMatcher {
    fn kind(&self) -> MatcherKind {
        MatcherKind::Uri
    }

    fn matches(&self, route: &Route, event: &dyn IncomingEvent) -> bool {
        route.uri_matches(event)
    }
}

/// Domain, method, protocol and uri matchers, in that order.
pub fn default_matchers() -> Vec<Arc<dyn Matcher>> {
    vec![Arc::new(DomainMatcher), Arc::new(MethodMatcher), Arc::new(ProtocolMatcher), Arc::new(UriMatcher)]
}

/// Debug helper listing matcher kinds
pub(crate) struct MatcherKinds<'a>(pub &'a [Arc<dyn Matcher>]);

impl fmt::Debug for MatcherKinds<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(|m| m.kind())).finish()
    }
}
