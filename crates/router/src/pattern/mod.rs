//! Pattern compiler: turns placeholder paths and domains into anchored regular expressions.
//!
//! A path such as `/users/:id(\d+)/files/:rest*` is split on `/`, every segment is
//! lexed into a [`SegmentConstraint`] and the constraints are rendered into one
//! regex per declared path. Nothing here holds state; [`crate::route::Route`] caches
//! the results.
//!
//! Every capture group gets a synthetic name (`p0`, `p1`, ...) assigned in
//! declaration order, so user rules that contain their own capturing groups do not
//! shift the mapping between captures and parameters.

mod lexer;

pub use lexer::Quantifier;

use crate::RouterError;
use crate::params::coerce;
use lexer::{SourceKind, lex};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::collections::BTreeMap;

/// Param name to regex fragment.
pub type Rules = BTreeMap<String, String>;

/// Param name to fallback value.
pub type Defaults = BTreeMap<String, Value>;

/// Rule applied to a path placeholder without an explicit one.
pub const DEFAULT_SEGMENT_RULE: &str = "[^/]+?";

/// Rule applied to a domain placeholder without an explicit one.
pub const DEFAULT_DOMAIN_RULE: &str = ".+";

/// One path segment, or the domain, after parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentConstraint {
    /// Plain text, matched as is
    Literal(String),
    /// A placeholder capturing a parameter
    Param(ParamConstraint),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamConstraint {
    pub param: String,
    /// key used for entity binding lookups, the param name unless `@alias` is given
    pub alias: String,
    pub rule: String,
    pub quantifier: Quantifier,
    pub default: Option<Value>,
    pub optional: bool,
    pub prefix: String,
    pub suffix: String,
}

impl SegmentConstraint {
    pub fn as_param(&self) -> Option<&ParamConstraint> {
        match self {
            Self::Param(param) => Some(param),
            Self::Literal(_) => None,
        }
    }
}

/// Parses every non-empty segment of `path`, left to right.
pub fn segments_constraints(path: &str, rules: &Rules, defaults: &Defaults) -> Result<Vec<SegmentConstraint>, RouterError> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| constraint_from(segment, SourceKind::Segment, rules, defaults))
        .collect()
}

/// Parses the route domain; no domain gives no constraint.
pub fn domain_constraint(
    domain: Option<&str>,
    rules: &Rules,
    defaults: &Defaults,
) -> Result<Option<SegmentConstraint>, RouterError> {
    domain.filter(|d| !d.is_empty()).map(|d| constraint_from(d, SourceKind::Domain, rules, defaults)).transpose()
}

fn constraint_from(src: &str, kind: SourceKind, rules: &Rules, defaults: &Defaults) -> Result<SegmentConstraint, RouterError> {
    let Some(placeholder) = lex(src, kind)? else {
        return Ok(SegmentConstraint::Literal(src.to_owned()));
    };

    let fallback_rule = match kind {
        SourceKind::Segment => DEFAULT_SEGMENT_RULE,
        SourceKind::Domain => DEFAULT_DOMAIN_RULE,
    };
    let rule = placeholder
        .regex
        .or_else(|| rules.get(&placeholder.name).cloned())
        .unwrap_or_else(|| fallback_rule.to_owned());
    let default = placeholder.default.as_deref().map(coerce).or_else(|| defaults.get(&placeholder.name).cloned());
    let quantifier = placeholder.quantifier.unwrap_or_default();

    Ok(SegmentConstraint::Param(ParamConstraint {
        alias: placeholder.alias.unwrap_or_else(|| placeholder.name.clone()),
        param: placeholder.name,
        rule,
        quantifier,
        default,
        optional: quantifier.is_optional(),
        prefix: placeholder.prefix,
        suffix: placeholder.suffix,
    }))
}

fn group_name(index: usize) -> String {
    format!("p{index}")
}

fn capture(rule: &str, index: usize) -> String {
    format!("(?P<{}>{rule})", group_name(index))
}

fn repeat_capture(rule: &str, index: usize) -> String {
    capture(&format!("(?:{rule})(?:/(?:{rule}))*"), index)
}

/// Renders one path segment; `next_group` is the index of the capture group to emit.
pub fn segment_pattern(constraint: &SegmentConstraint, next_group: &mut usize) -> String {
    let param = match constraint {
        SegmentConstraint::Literal(literal) => return format!("/{}", regex::escape(literal)),
        SegmentConstraint::Param(param) => param,
    };

    let index = *next_group;
    *next_group += 1;

    let prefix = regex::escape(&param.prefix);
    let suffix = regex::escape(&param.suffix);

    if param.prefix.is_empty() {
        match param.quantifier {
            Quantifier::Optional => format!("(?:/{}{suffix})?", capture(&param.rule, index)),
            Quantifier::OneOrMore => format!("/{}{suffix}", repeat_capture(&param.rule, index)),
            Quantifier::ZeroOrMore => format!("(?:/{}{suffix})?", repeat_capture(&param.rule, index)),
            Quantifier::One => format!("/{}{suffix}", capture(&param.rule, index)),
        }
    } else {
        match param.quantifier {
            Quantifier::Optional => format!("/{prefix}{}?{suffix}", capture(&param.rule, index)),
            Quantifier::OneOrMore => format!("/{prefix}{}{suffix}", repeat_capture(&param.rule, index)),
            Quantifier::ZeroOrMore => format!("/{prefix}{}?{suffix}", repeat_capture(&param.rule, index)),
            Quantifier::One => format!("/{prefix}{}{suffix}", capture(&param.rule, index)),
        }
    }
}

/// Renders the domain: the literal host, or `prefix(rule)suffix` with an optional capture.
pub fn domain_pattern(constraint: &SegmentConstraint, next_group: &mut usize) -> String {
    match constraint {
        SegmentConstraint::Literal(literal) => regex::escape(literal),
        SegmentConstraint::Param(param) => {
            let index = *next_group;
            *next_group += 1;
            let optional = if param.optional { "?" } else { "" };
            format!(
                "{}{}{optional}{}",
                regex::escape(&param.prefix),
                capture(&param.rule, index),
                regex::escape(&param.suffix)
            )
        }
    }
}

fn build_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, RouterError> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| RouterError::configuration(format!("invalid route pattern `{pattern}`: {e}")))
}

/// Compiles the standalone, case-insensitive regex used to test a request host.
pub fn domain_regex(constraint: &SegmentConstraint) -> Result<Regex, RouterError> {
    let pattern = format!("^{}$", domain_pattern(constraint, &mut 0));
    build_regex(&pattern, true)
}

/// One declared path (the main path or an alias) compiled to its full-URI regex.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    path: String,
    regex: Regex,
    segments: Vec<SegmentConstraint>,
    /// domain param first (if any), then path params, in capture order
    params: Vec<ParamConstraint>,
}

impl CompiledPattern {
    /// Builds `^` + domain + segments + trailing slash + `$`.
    ///
    /// Non-strict patterns accept an optional trailing slash and ignore case; strict
    /// ones keep a trailing slash only if `path` declares it and are case-sensitive.
    pub fn compile(
        path: &str,
        domain: Option<&SegmentConstraint>,
        rules: &Rules,
        defaults: &Defaults,
        strict: bool,
    ) -> Result<Self, RouterError> {
        let segments = segments_constraints(path, rules, defaults)?;
        let mut next_group = 0;
        let mut params = Vec::new();
        let mut pattern = String::from("^");

        if let Some(domain) = domain {
            pattern.push_str(&domain_pattern(domain, &mut next_group));
            params.extend(domain.as_param().cloned());
        }

        if segments.is_empty() {
            pattern.push('/');
        } else {
            for segment in &segments {
                pattern.push_str(&segment_pattern(segment, &mut next_group));
                params.extend(segment.as_param().cloned());
            }

            if !strict {
                pattern.push_str("/?");
            } else if path.ends_with('/') {
                pattern.push('/');
            }
        }
        pattern.push('$');

        let regex = build_regex(&pattern, !strict)?;
        Ok(Self { path: path.to_owned(), regex, segments, params })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn segments(&self) -> &[SegmentConstraint] {
        &self.segments
    }

    pub fn params(&self) -> &[ParamConstraint] {
        &self.params
    }

    #[inline]
    pub fn is_match(&self, uri: &str) -> bool {
        self.regex.is_match(uri)
    }

    /// Runs the regex and pairs every param constraint with its captured text.
    pub fn captures<'p, 'u>(&'p self, uri: &'u str) -> Option<Vec<(&'p ParamConstraint, Option<&'u str>)>> {
        let captures = self.regex.captures(uri)?;
        Some(
            self.params
                .iter()
                .enumerate()
                .map(|(index, param)| (param, captures.name(&group_name(index)).map(|m| m.as_str())))
                .collect(),
        )
    }
}
