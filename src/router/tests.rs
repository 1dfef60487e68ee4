use super::{split_segments, CompiledPattern, Lookup, ParamKind, ParamVec, Router, SegmentMatcher};
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::PatternErrorKind;
use http::Method;
use std::sync::Arc;

fn noop() -> super::Handler {
    Arc::new(|_res: &mut HandlerResponse, _req: &HandlerRequest| {})
}

fn kind_of(pattern: &str) -> PatternErrorKind {
    CompiledPattern::compile(pattern).unwrap_err().kind
}

#[test]
fn test_root_path() {
    let p = CompiledPattern::compile("/").unwrap();
    assert!(p.is_empty());
    assert!(p.matches(&[]));
    assert_eq!(p, CompiledPattern::compile("").unwrap());
}

#[test]
fn test_split_discards_empty_artifacts() {
    assert!(split_segments("/").is_empty());
    assert!(split_segments("").is_empty());
    assert_eq!(split_segments("/a/b/").as_slice(), &["a", "b"]);
    assert_eq!(split_segments("a//b").as_slice(), &["a", "b"]);
}

#[test]
fn test_literal_path() {
    let p = CompiledPattern::compile("/a/b").unwrap();
    assert_eq!(p.len(), 2);
    assert!(p.matches(&["a", "b"]));
    assert!(!p.matches(&["a"]));
    assert!(!p.matches(&["a", "b", "c"]));
    assert_eq!(p.param_names().count(), 0);
}

#[test]
fn test_parameter_syntaxes() {
    let cases = [
        ("/items/{id}", ParamKind::Any),
        ("/items/:id", ParamKind::Any),
        ("/items/{id:int}", ParamKind::Integer),
        ("/items/{id:uuid}", ParamKind::Uuid),
        ("/items/{id:[a-z]+}", ParamKind::Custom),
        ("/items/:id([a-z]+)", ParamKind::Custom),
    ];
    for (pattern, expected) in cases {
        let p = CompiledPattern::compile(pattern).unwrap();
        match &p.matchers()[1] {
            SegmentMatcher::Regex(re) => {
                assert_eq!(re.name(), "id", "{pattern}");
                assert_eq!(re.kind(), expected, "{pattern}");
            }
            other => panic!("{pattern}: expected regex matcher, got {other:?}"),
        }
    }
}

#[test]
fn test_anonymous_inline_regex_named_by_index() {
    let p = CompiledPattern::compile("/files/{dir}/([a-z0-9_-]+)").unwrap();
    let names: Vec<&str> = p.param_names().collect();
    assert_eq!(names, vec!["dir", "1"]);

    let segments = ["files", "docs", "read_me"];
    assert!(p.matches(&segments));
    let mut params = ParamVec::new();
    p.extract(&segments, &mut params);
    assert_eq!(params[1].0.as_ref(), "1");
    assert_eq!(params[1].1, "read_me");
    assert!(!p.matches(&["files", "docs", "READ.ME"]));
}

#[test]
fn test_regex_with_braces_inside() {
    let p = CompiledPattern::compile("/codes/{code:[A-Z]{3}}").unwrap();
    assert!(p.matches(&["codes", "ABC"]));
    assert!(!p.matches(&["codes", "ABCD"]));
}

#[test]
fn test_compilation_is_structural() {
    let a = CompiledPattern::compile("/users/{id:int}/posts").unwrap();
    let b = CompiledPattern::compile("users/{id:int}/posts/").unwrap();
    let c = CompiledPattern::compile("/users/{uid:int}/posts").unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_malformed_patterns() {
    assert_eq!(kind_of("/a/{id"), PatternErrorKind::UnbalancedBraces);
    assert_eq!(kind_of("/a/id}"), PatternErrorKind::UnbalancedBraces);
    assert_eq!(kind_of("/a/:id([0-9]+"), PatternErrorKind::UnbalancedParens);
    assert_eq!(kind_of("/a/([0-9]+"), PatternErrorKind::UnbalancedParens);
    assert_eq!(kind_of("/a/{}"), PatternErrorKind::EmptyName);
    assert_eq!(kind_of("/a/:"), PatternErrorKind::EmptyName);
    assert_eq!(kind_of("/a/{:int}"), PatternErrorKind::EmptyName);
    assert_eq!(kind_of("/a/{id:}"), PatternErrorKind::EmptyExpression);
    assert_eq!(kind_of("/a/()"), PatternErrorKind::EmptyExpression);
    assert_eq!(
        kind_of("/a/{user-id}"),
        PatternErrorKind::InvalidName("user-id".to_string())
    );
    assert_eq!(
        kind_of("/a/{id}/b/:id"),
        PatternErrorKind::DuplicateName("id".to_string())
    );
    assert!(matches!(
        kind_of("/a/{id:[0-9}"),
        PatternErrorKind::InvalidRegex(_)
    ));
    assert_eq!(kind_of("/a/b{c"), PatternErrorKind::UnbalancedBraces);
    assert_eq!(kind_of("/a/b}c{"), PatternErrorKind::UnbalancedBraces);
}

#[test]
fn test_literal_with_balanced_braces() {
    let p = CompiledPattern::compile("/a{b}/x{y}z").unwrap();
    assert!(p.param_names().next().is_none());
    assert!(p.matches(&["a{b}", "x{y}z"]));
    assert!(!p.matches(&["ab", "xyz"]));
}

#[test]
fn test_numeric_names_are_reserved_for_anonymous_params() {
    assert_eq!(kind_of("/{1}/(x+)"), PatternErrorKind::InvalidName("1".to_string()));
    assert_eq!(kind_of("/(x+)/{0}"), PatternErrorKind::InvalidName("0".to_string()));
    assert_eq!(kind_of("/:42"), PatternErrorKind::InvalidName("42".to_string()));

    let p = CompiledPattern::compile("/{v1}/(x+)/{_2}").unwrap();
    assert_eq!(p.param_names().collect::<Vec<_>>(), vec!["v1", "1", "_2"]);
}

#[test]
fn test_error_identifies_segment_index() {
    let err = CompiledPattern::compile("/ok/also-ok/{bad:(}").unwrap_err();
    assert_eq!(err.pattern, "/ok/also-ok/{bad:(}");
    assert_eq!(err.segment, 2);
}

#[test]
fn test_router_first_match_wins() {
    let mut router = Router::new();
    router.add_route(Method::GET, "/users/{id}", noop()).unwrap();
    router.add_route(Method::GET, "/users/me", noop()).unwrap();

    match router.lookup(&Method::GET, "/users/me") {
        Lookup::Found(c) => assert_eq!(c.pattern().source(), "/users/{id}"),
        _ => panic!("expected a match"),
    }
}

#[test]
fn test_router_method_not_allowed_lists_matching_methods() {
    let mut router = Router::new();
    router.add_route(Method::GET, "/a", noop()).unwrap();
    router.add_route(Method::PUT, "/a", noop()).unwrap();
    router.add_route(Method::POST, "/b", noop()).unwrap();

    match router.lookup(&Method::DELETE, "/a") {
        Lookup::MethodNotAllowed(allowed) => assert_eq!(allowed, vec![Method::GET, Method::PUT]),
        _ => panic!("expected MethodNotAllowed"),
    }
}

#[test]
fn test_empty_router_is_not_found() {
    let router = Router::new();
    assert!(matches!(router.lookup(&Method::GET, "/"), Lookup::NotFound));
}

#[test]
fn test_failed_registration_leaves_table_untouched() {
    let mut router = Router::new();
    assert!(router.add_route(Method::GET, "/x/{id:(}", noop()).is_err());
    assert!(router.is_empty());
    assert!(router.candidates(&Method::GET).is_empty());
}
