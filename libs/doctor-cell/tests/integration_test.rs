use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::router::doctor_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn create_test_app(server: &MockServer) -> Router {
    doctor_routes(TestConfig::with_supabase_url(&server.uri()).to_arc())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn request(method: &str, uri: &str, user: &TestUser, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", JwtTestUtils::bearer_for(user))
        .header("content-type", "application/json");
    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn mount_doctor(server: &MockServer, id: i64) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(id, "Jean", "Martin", "Cardiology")
        ])))
        .mount(server)
        .await;
}

fn slots(body: &Value) -> Vec<(String, bool)> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|s| {
            (
                s["heure"].as_str().unwrap().to_string(),
                s["disponible"].as_bool().unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_availability_all_free_without_appointments() {
    let server = MockServer::start().await;
    mount_doctor(&server, 7).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", "eq.7"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (status, body) = send(
        create_test_app(&server),
        request(
            "GET",
            "/7/availability?date=2024-03-01",
            &TestUser::patient("p@clinic.fr"),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let slots = slots(&body);
    assert_eq!(slots.len(), 10);
    assert_eq!(slots[0].0, "08:00");
    assert!(slots.iter().all(|(_, free)| *free));
}

#[tokio::test]
async fn test_availability_marks_booked_hour() {
    let server = MockServer::start().await;
    mount_doctor(&server, 7).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", "eq.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "scheduled_at": "2024-03-01T09:00:00" }
        ])))
        .mount(&server)
        .await;

    let (status, body) = send(
        create_test_app(&server),
        request(
            "GET",
            "/7/availability?date=2024-03-01",
            &TestUser::staff("desk@clinic.fr"),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    for (hour, free) in slots(&body) {
        assert_eq!(free, hour != "09:00", "slot {}", hour);
    }
}

#[tokio::test]
async fn test_availability_unknown_doctor_is_404() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (status, _) = send(
        create_test_app(&server),
        request(
            "GET",
            "/99/availability?date=2024-03-01",
            &TestUser::staff("desk@clinic.fr"),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_availability_rejects_bad_date() {
    let server = MockServer::start().await;

    let (status, body) = send(
        create_test_app(&server),
        request(
            "GET",
            "/7/availability?date=01-03-2024",
            &TestUser::staff("desk@clinic.fr"),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["date"].is_array());
}

#[tokio::test]
async fn test_show_doctor_embeds_facility() {
    let server = MockServer::start().await;

    let mut row = MockSupabaseResponses::doctor_response(7, "Jean", "Martin", "Cardiology");
    row["facility"] = MockSupabaseResponses::facility_response(1, "Clinique du Parc");
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("select", "*,facility:facilities(*)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&server)
        .await;

    let (status, body) = send(
        create_test_app(&server),
        request("GET", "/7", &TestUser::nurse("n@clinic.fr"), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["specialty"], "Cardiology");
    assert_eq!(body["facility"]["name"], "Clinique du Parc");
}

#[tokio::test]
async fn test_list_filters_by_specialty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("specialty", "ilike.*cardio*"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "0-0/1")
                .set_body_json(json!([MockSupabaseResponses::doctor_response(
                    7, "Jean", "Martin", "Cardiology"
                )])),
        )
        .mount(&server)
        .await;

    let (status, body) = send(
        create_test_app(&server),
        request("GET", "/?specialty=cardio", &TestUser::patient("p@clinic.fr"), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["id"], 7);
}

#[tokio::test]
async fn test_create_doctor_checks_facility() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/facilities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (status, body) = send(
        create_test_app(&server),
        request(
            "POST",
            "/",
            &TestUser::admin("admin@clinic.fr"),
            Some(json!({ "first_name": "Jean", "last_name": "Martin", "facility_id": 9 })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["facility_id"].is_array());
}

#[tokio::test]
async fn test_staff_cannot_delete_doctor() {
    let server = MockServer::start().await;

    let (status, _) = send(
        create_test_app(&server),
        request("DELETE", "/7", &TestUser::staff("desk@clinic.fr"), None),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
