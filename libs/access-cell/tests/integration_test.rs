use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use access_cell::router::access_routes;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn create_test_app() -> Router {
    access_routes(TestConfig::default().to_arc())
}

async fn get_json(uri: &str, user: &TestUser) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", JwtTestUtils::bearer_for(user))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_permissions_for_nurse() {
    let (status, body) = get_json("/permissions", &TestUser::nurse("nurse@example.com")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "nurse");
    let permissions: Vec<&str> = body["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert_eq!(
        permissions,
        [
            "view_patients",
            "view_appointments",
            "view_medical_records",
            "update_medical_records"
        ]
    );
}

#[tokio::test]
async fn test_unknown_role_has_no_permissions() {
    let (status, body) = get_json("/permissions", &TestUser::new("x@example.com", "janitor")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["role"].is_null());
    assert_eq!(body["permissions"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_check_permission_endpoint() {
    let patient = TestUser::patient("p@example.com");
    let (_, body) = get_json("/check?permission=manage_users", &patient).await;
    assert_eq!(body["granted"], false);

    let admin = TestUser::admin("admin@example.com");
    let (_, body) = get_json("/check?permission=manage_users", &admin).await;
    assert_eq!(body["granted"], true);
}

#[tokio::test]
async fn test_check_roles_endpoint() {
    let staff = TestUser::staff("desk@example.com");
    let (status, body) = get_json("/roles?allowed=admin,staff", &staff).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["granted"], true);

    let (_, body) = get_json("/roles?allowed=doctor", &staff).await;
    assert_eq!(body["granted"], false);
}

#[tokio::test]
async fn test_navigation_for_doctor() {
    let (status, body) = get_json("/navigation", &TestUser::doctor("doc@example.com")).await;

    assert_eq!(status, StatusCode::OK);
    let sections = body["sections"].as_array().unwrap();
    assert_eq!(sections[0]["title"], "Main");
    assert_eq!(sections[1]["items"][1]["path"], "/prescriptions");
    // Role lists are never exposed
    assert!(sections[0]["items"][0].get("roles").is_none());
}

#[tokio::test]
async fn test_requires_authentication() {
    let request = Request::builder()
        .uri("/permissions")
        .body(Body::empty())
        .unwrap();

    let response = create_test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
