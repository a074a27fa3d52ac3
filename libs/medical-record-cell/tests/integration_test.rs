use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use medical_record_cell::router::{medical_record_routes, prescription_routes};
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn record_app(server: &MockServer) -> Router {
    medical_record_routes(TestConfig::with_supabase_url(&server.uri()).to_arc())
}

fn prescription_app(server: &MockServer) -> Router {
    prescription_routes(TestConfig::with_supabase_url(&server.uri()).to_arc())
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

async fn mount_patient(server: &MockServer, id: i64) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(id, "Awa", "Diallo")
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_create_record() {
    let server = MockServer::start().await;
    mount_patient(&server, 3).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/medical_records"))
        .and(query_param("patient_id", "eq.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/medical_records"))
        .and(body_partial_json(json!({ "patient_id": 3, "allergies": "Penicillin" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::medical_record_response(10, 3)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        record_app(&server),
        request(
            "POST",
            "/",
            &TestUser::doctor("dr@clinic.fr"),
            Some(json!({ "patient_id": 3, "allergies": "Penicillin" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 10);
    assert_eq!(body["patient_id"], 3);
}

#[tokio::test]
async fn test_second_record_for_patient_is_rejected() {
    let server = MockServer::start().await;
    mount_patient(&server, 3).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/medical_records"))
        .and(query_param("patient_id", "eq.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 10 }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/medical_records"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(
        record_app(&server),
        request(
            "POST",
            "/",
            &TestUser::admin("admin@clinic.fr"),
            Some(json!({ "patient_id": 3 })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["patient_id"].is_array());
}

#[tokio::test]
async fn test_nurse_updates_but_cannot_create_records() {
    let server = MockServer::start().await;
    let nurse = TestUser::nurse("n@clinic.fr");

    let mut updated = MockSupabaseResponses::medical_record_response(10, 3);
    updated["treatments"] = json!("Ibuprofen as needed");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/medical_records"))
        .and(query_param("id", "eq.10"))
        .and(body_partial_json(json!({ "treatments": "Ibuprofen as needed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        record_app(&server),
        request(
            "PUT",
            "/10",
            &nurse,
            Some(json!({ "treatments": "Ibuprofen as needed", "patient_id": 99 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patient_id"], 3);

    let (status, _) = send(
        record_app(&server),
        request("POST", "/", &nurse, Some(json!({ "patient_id": 3 }))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_record_by_patient_is_404_when_missing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/medical_records"))
        .and(query_param("patient_id", "eq.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (status, _) = send(
        record_app(&server),
        request("GET", "/patient/4", &TestUser::staff("desk@clinic.fr"), None),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_prescription_requires_all_fields() {
    let server = MockServer::start().await;

    let (status, body) = send(
        prescription_app(&server),
        request(
            "POST",
            "/",
            &TestUser::doctor("dr@clinic.fr"),
            Some(json!({ "medication": "Amoxicillin 500mg" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    for field in ["doctor_id", "patient_id", "dosage", "duration", "prescribed_on"] {
        assert!(body["errors"][field].is_array(), "{} missing", field);
    }
    assert!(body["errors"]["medication"].is_null());
}

#[tokio::test]
async fn test_prescription_with_unknown_doctor_is_rejected() {
    let server = MockServer::start().await;
    mount_patient(&server, 3).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (status, body) = send(
        prescription_app(&server),
        request(
            "POST",
            "/",
            &TestUser::doctor("dr@clinic.fr"),
            Some(json!({
                "doctor_id": 99,
                "patient_id": 3,
                "medication": "Amoxicillin 500mg",
                "dosage": "1 capsule three times a day",
                "duration": "7 days",
                "prescribed_on": "2024-03-01"
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["doctor_id"].is_array());
    assert!(body["errors"]["patient_id"].is_null());
}

#[tokio::test]
async fn test_list_prescriptions_by_medication() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/prescriptions"))
        .and(query_param("medication", "ilike.*amoxi*"))
        .and(query_param("patient_id", "eq.3"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "0-0/1")
                .set_body_json(json!([MockSupabaseResponses::prescription_response(5, 7, 3)])),
        )
        .mount(&server)
        .await;

    let (status, body) = send(
        prescription_app(&server),
        request(
            "GET",
            "/?medication=amoxi&patient_id=3",
            &TestUser::nurse("n@clinic.fr"),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["prescribed_on"], "2024-03-01");
}

#[tokio::test]
async fn test_staff_cannot_prescribe() {
    let server = MockServer::start().await;

    let (status, _) = send(
        prescription_app(&server),
        request("DELETE", "/5", &TestUser::staff("desk@clinic.fr"), None),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
