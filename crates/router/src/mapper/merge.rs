//! Per-field merge rules applied when a child definition inherits from its parent.
//!
//! Every function is pure: the parent value is borrowed, the child value is consumed
//! and the merged value returned.

use crate::action::ActionDefinition;
use std::collections::BTreeMap;

/// Child wins, the parent fills in when the child leaves the field unset.
pub fn merge_scalar<T: Clone>(parent: Option<&T>, child: Option<T>) -> Option<T> {
    child.or_else(|| parent.cloned())
}

/// Shallow merge, child keys override parent keys.
pub fn merge_map<V: Clone>(parent: &BTreeMap<String, V>, child: BTreeMap<String, V>) -> BTreeMap<String, V> {
    let mut merged = parent.clone();
    merged.extend(child);
    merged
}

/// Parent entries first, then the child's; duplicates are kept.
pub fn merge_list(parent: &[String], child: Vec<String>) -> Vec<String> {
    let mut merged = parent.to_vec();
    merged.extend(child);
    merged
}

/// Dot-joins names, dropping empty, leading and trailing parts.
pub fn merge_name(parent: Option<&str>, child: Option<&str>) -> Option<String> {
    normalize_name(&format!("{}.{}", parent.unwrap_or_default(), child.unwrap_or_default()))
}

/// Collapses repeated dots and trims the ends; an empty name becomes `None`.
pub fn normalize_name(name: &str) -> Option<String> {
    let parts: Vec<&str> = name.split('.').map(str::trim).filter(|part| !part.is_empty()).collect();
    (!parts.is_empty()).then(|| parts.join("."))
}

/// Slash-joins two paths and collapses repeated slashes.
///
/// A trailing slash of the child is kept so strict routes can still declare one.
pub fn join_paths(parent: &str, child: &str) -> String {
    let mut joined = String::with_capacity(parent.len() + child.len() + 2);
    for part in ["/", parent, "/", child] {
        for c in part.chars() {
            if c == '/' && joined.ends_with('/') {
                continue;
            }
            joined.push(c);
        }
    }

    let declared_trailing = if child.is_empty() { parent.ends_with('/') } else { child.ends_with('/') };
    if joined.len() > 1 && joined.ends_with('/') && !declared_trailing {
        joined.pop();
    }
    joined
}

/// Resolves the action a child ends up with.
///
/// A child without an action inherits the parent's. A bare method name on the child
/// combined with a controller on the parent becomes a controller method. Any other
/// child action wins outright.
pub fn merge_action(parent: Option<&ActionDefinition>, child: Option<ActionDefinition>) -> Option<ActionDefinition> {
    match (parent, child) {
        (
            Some(ActionDefinition::Controller(controller) | ActionDefinition::ControllerMethod { controller, .. }),
            Some(ActionDefinition::Method(method)),
        ) => Some(ActionDefinition::controller_method(controller.clone(), method)),
        (_, Some(child)) => Some(child),
        (parent, None) => parent.cloned(),
    }
}
