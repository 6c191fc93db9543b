#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use std::time::Duration;

#[test]
fn test_http_method_parse_is_case_insensitive() {
    assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
    assert_eq!("PATCH".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
    assert!("FETCH".parse::<HttpMethod>().is_err());
}

#[test]
fn test_route_path_params() {
    let route = Route::new(HttpMethod::Get, "/accounts/{id}/posts/{postId}");
    assert_eq!(route.path_params(), vec!["id", "postId"]);
    assert!(Route::new(HttpMethod::Get, "/health").path_params().is_empty());
}

#[test]
fn test_group_name_prefers_service_override() {
    let h = Handler::new("GetUser", "users");
    assert_eq!(h.group_name(), "users");
    let h = h.with_service("user-service");
    assert_eq!(h.group_name(), "user-service");
    let h = Handler::new("Ping", "");
    assert_eq!(h.group_name(), "default");
}

#[test]
fn test_memory_mb() {
    assert_eq!(Handler::new("A", "p").with_memory("512MB").memory_mb(), Some(512));
    assert_eq!(Handler::new("A", "p").with_memory("2GB").memory_mb(), Some(2048));
    assert_eq!(Handler::new("A", "p").memory_mb(), None);
}

#[test]
fn test_memory_mb_overflow_is_none() {
    let h = Handler::new("A", "p").with_memory("18014398509481984GB");
    assert_eq!(h.memory_mb(), None);
}

#[test]
fn test_rate_limit_per_minute_saturates() {
    let h = Handler::new("A", "p").with_rate_limit(1_000_000_000_000_000_000, RatePeriod::Second);
    assert_eq!(h.rate_limit.as_ref().unwrap().per_minute(), i64::MAX);
    let h = Handler::new("A", "p").with_rate_limit(i64::MAX, RatePeriod::Second);
    assert_eq!(h.rate_limit.as_ref().unwrap().per_minute(), i64::MAX);
    let h = Handler::new("A", "p").with_rate_limit(i64::MAX, RatePeriod::Hour);
    assert!(h.rate_limit.as_ref().unwrap().per_minute() > 0);
}

#[test]
fn test_rate_limit_per_minute() {
    let h = Handler::new("A", "p").with_rate_limit(100, RatePeriod::Minute);
    assert_eq!(h.rate_limit.as_ref().unwrap().per_minute(), 100);
    let h = Handler::new("A", "p").with_rate_limit(10, RatePeriod::Second);
    assert_eq!(h.rate_limit.as_ref().unwrap().per_minute(), 600);
    let h = Handler::new("A", "p").with_rate_limit(1000, RatePeriod::Day);
    assert_eq!(h.rate_limit.as_ref().unwrap().per_minute(), 1);
    assert_eq!(
        h.rate_limit.as_ref().unwrap().window(),
        Duration::from_secs(86_400)
    );
}

#[test]
fn test_service_groups_merge_same_package() {
    let handlers = vec![
        Handler::new("GetUser", "users")
            .with_target(DeploymentTarget::Container)
            .with_route(HttpMethod::Get, "/u"),
        Handler::new("CreateUser", "users")
            .with_target(DeploymentTarget::Container)
            .with_route(HttpMethod::Post, "/u"),
        Handler::new("Ping", "health")
            .with_target(DeploymentTarget::Function)
            .with_route(HttpMethod::Get, "/ping"),
    ];
    let groups = service_groups(&handlers);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "users");
    assert_eq!(groups[0].handlers.len(), 2);
}

#[test]
fn test_service_groups_sorted_and_aggregates() {
    let handlers = vec![
        Handler::new("B", "zeta")
            .with_target(DeploymentTarget::Container)
            .with_timeout(Duration::from_secs(30))
            .with_concurrency(10),
        Handler::new("A", "alpha").with_target(DeploymentTarget::Container),
        Handler::new("C", "zeta")
            .with_target(DeploymentTarget::Container)
            .with_timeout(Duration::from_secs(120)),
    ];
    let groups = service_groups(&handlers);
    let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
    assert_eq!(groups[1].max_timeout_secs(), Some(120));
    assert_eq!(groups[1].max_concurrency(), Some(10));
    assert_eq!(groups[0].max_timeout_secs(), None);
}
