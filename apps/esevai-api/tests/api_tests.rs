//! End-to-end tests for the e-Sevai API router
//!
//! Each test builds the full router over a fresh in-memory database and
//! drives it with `oneshot` requests.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use esevai_api::{build_router, config::Config, seed::seed_catalog, state::AppState};
use http_body_util::BodyExt;
use lopdf::{dictionary, Document, Object, Stream};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

// ============================================================
// Harness
// ============================================================

async fn test_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let state = AppState::with_pool(pool, Config::default()).await.unwrap();
    seed_catalog(&state.db).await.unwrap();
    build_router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

async fn patch(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PATCH, uri, Some(body)).await
}

async fn create_user(app: &Router, email: &str) -> String {
    let (status, user) = post(
        app,
        "/api/users",
        json!({ "name": "Meena K", "email": email, "phone": "9840012345" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    user["id"].as_str().unwrap().to_string()
}

async fn create_request(app: &Router, user_id: &str, service_code: &str) -> Value {
    let (status, request) = post(
        app,
        "/api/requests",
        json!({
            "user_id": user_id,
            "service_code": service_code,
            "documents": [{ "storage_id": "st_1", "file_name": "aadhaar.pdf" }],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    request
}

fn letter_pdf(num_pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for n in 1..=num_pages {
        let content = format!("BT 50 700 Td (Page-{}) Tj ET", n);
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => num_pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn signature_png() -> Vec<u8> {
    let (width, height) = (8u32, 4u32);
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        let data: Vec<u8> = (0..width * height)
            .flat_map(|i| [0, 0, 0, if i % 2 == 0 { 255 } else { 0 }])
            .collect();
        writer.write_image_data(&data).unwrap();
    }
    out
}

fn png_data_url() -> String {
    format!("data:image/png;base64,{}", BASE64.encode(signature_png()))
}

// ============================================================
// Catalog
// ============================================================

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let app = test_app().await;

    let (status, report) = post(&app, "/api/admin/seed", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report, json!({ "categories": 5, "services": 12 }));

    let (_, categories) = get(&app, "/api/categories").await;
    assert_eq!(categories.as_array().unwrap().len(), 5);
    let (_, services) = get(&app, "/api/services").await;
    assert_eq!(services.as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_categories_sorted_by_name() {
    let app = test_app().await;
    let (_, categories) = get(&app, "/api/categories").await;
    let names: Vec<&str> = categories
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[tokio::test]
async fn test_filter_services_by_category() {
    let app = test_app().await;
    let (status, services) = get(&app, "/api/services?category=certificates").await;
    assert_eq!(status, StatusCode::OK);

    let services = services.as_array().unwrap();
    assert_eq!(services.len(), 4);
    assert!(services
        .iter()
        .all(|s| s["category_id"] == json!("certificates")));

    let (_, none) = get(&app, "/api/services?category=no-such-category").await;
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn test_get_service() {
    let app = test_app().await;
    let (status, service) = get(&app, "/api/services/CERT-INCOME").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(service["price"], json!(6000));
    assert_eq!(service["required_documents"].as_array().unwrap().len(), 3);

    let (status, body) = get(&app, "/api/services/NOPE").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], json!(404));
}

// ============================================================
// Users and requests
// ============================================================

#[tokio::test]
async fn test_create_user_validation_and_duplicates() {
    let app = test_app().await;

    let (status, user) = post(
        &app,
        "/api/users",
        json!({ "name": "  Ravi  ", "email": "Ravi@Example.COM" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["name"], json!("Ravi"));
    assert_eq!(user["email"], json!("ravi@example.com"));
    assert_eq!(user["role"], json!("customer"));

    let (status, _) = post(
        &app,
        "/api/users",
        json!({ "name": "Other", "email": "ravi@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = post(&app, "/api/users", json!({ "name": "", "email": "a@b.in" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, "/api/users", json!({ "name": "X", "email": "nope" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_initial_status_depends_on_price() {
    let app = test_app().await;
    let user_id = create_user(&app, "meena@example.com").await;

    let paid = create_request(&app, &user_id, "CERT-INCOME").await;
    assert_eq!(paid["status"], json!("PAYMENT_PENDING"));
    assert_eq!(paid["documents"][0]["content_type"], json!("application/pdf"));

    let free = create_request(&app, &user_id, "ID-RATION-CARD").await;
    assert_eq!(free["status"], json!("PENDING"));

    let (status, list) = get(&app, &format!("/api/users/{}/requests", user_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_request_unknown_refs() {
    let app = test_app().await;
    let user_id = create_user(&app, "meena@example.com").await;

    let (status, _) = post(
        &app,
        "/api/requests",
        json!({ "user_id": "missing", "service_code": "CERT-INCOME" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(
        &app,
        "/api/requests",
        json!({ "user_id": user_id, "service_code": "NOPE" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/api/users/missing/requests").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_updates_stop_at_terminal() {
    let app = test_app().await;
    let user_id = create_user(&app, "meena@example.com").await;
    let request = create_request(&app, &user_id, "ID-RATION-CARD").await;
    let uri = format!("/api/requests/{}/status", request["id"].as_str().unwrap());

    let (status, updated) = patch(&app, &uri, json!({ "status": "IN_PROGRESS" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], json!("IN_PROGRESS"));

    let (status, updated) = patch(
        &app,
        &uri,
        json!({
            "status": "COMPLETED",
            "output_document": { "storage_id": "out_1", "file_name": "card.pdf" },
            "notes": "Issued",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["output_document"]["storage_id"], json!("out_1"));
    assert_eq!(updated["notes"], json!("Issued"));

    // Re-applying the same status is accepted
    let (status, _) = patch(&app, &uri, json!({ "status": "COMPLETED" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = patch(&app, &uri, json!({ "status": "PENDING" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], json!(409));

    let (_, stored) = get(&app, &format!("/api/requests/{}", request["id"].as_str().unwrap())).await;
    assert_eq!(stored["status"], json!("COMPLETED"));
    assert_eq!(stored["output_document"]["file_name"], json!("card.pdf"));
}

// ============================================================
// Payments
// ============================================================

#[tokio::test]
async fn test_paid_payment_releases_request() {
    let app = test_app().await;
    let user_id = create_user(&app, "meena@example.com").await;
    let request = create_request(&app, &user_id, "REG-BIRTH").await;
    let request_id = request["id"].as_str().unwrap();

    let (status, payment) = post(
        &app,
        "/api/payments",
        json!({ "request_id": request_id, "gateway_order_id": "order_abc" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["amount"], json!(10000));
    assert_eq!(payment["currency"], json!("INR"));
    assert_eq!(payment["status"], json!("CREATED"));

    let payment_uri = format!("/api/payments/{}", payment["id"].as_str().unwrap());
    let (status, paid) = patch(
        &app,
        &payment_uri,
        json!({
            "status": "PAID",
            "gateway": {
                "order_id": "order_abc",
                "payment_id": "pay_123",
                "signature": "sig_456",
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["gateway_payment_id"], json!("pay_123"));
    assert_eq!(paid["gateway_signature"], json!("sig_456"));

    let (_, stored_request) = get(&app, &format!("/api/requests/{}", request_id)).await;
    assert_eq!(stored_request["status"], json!("IN_PROGRESS"));

    let (_, stored_payment) = get(&app, &payment_uri).await;
    assert_eq!(stored_payment["status"], json!("PAID"));

    // PAID only moves on to REFUNDED
    let (status, _) = patch(&app, &payment_uri, json!({ "status": "FAILED" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = patch(&app, &payment_uri, json!({ "status": "REFUNDED" })).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = patch(&app, &payment_uri, json!({ "status": "PAID" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_failed_payment_keeps_request_pending() {
    let app = test_app().await;
    let user_id = create_user(&app, "meena@example.com").await;
    let request = create_request(&app, &user_id, "BILL-EB").await;
    let request_id = request["id"].as_str().unwrap();

    let (_, payment) = post(&app, "/api/payments", json!({ "request_id": request_id })).await;
    let payment_uri = format!("/api/payments/{}", payment["id"].as_str().unwrap());

    let (status, _) = patch(&app, &payment_uri, json!({ "status": "FAILED" })).await;
    assert_eq!(status, StatusCode::OK);

    let (_, stored_request) = get(&app, &format!("/api/requests/{}", request_id)).await;
    assert_eq!(stored_request["status"], json!("PAYMENT_PENDING"));
}

#[tokio::test]
async fn test_payment_rejected_for_free_or_unpayable_requests() {
    let app = test_app().await;
    let user_id = create_user(&app, "meena@example.com").await;

    let free = create_request(&app, &user_id, "WEL-OLD-AGE-PENSION").await;
    let (status, _) = post(&app, "/api/payments", json!({ "request_id": free["id"] })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = post(&app, "/api/payments", json!({ "request_id": "missing" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/api/payments/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================
// Messages
// ============================================================

#[tokio::test]
async fn test_message_thread() {
    let app = test_app().await;
    let user_id = create_user(&app, "meena@example.com").await;
    let request = create_request(&app, &user_id, "CERT-NATIVITY").await;
    let uri = format!("/api/requests/{}/messages", request["id"].as_str().unwrap());

    for body in ["Uploaded ration card", "Please re-upload a clearer copy"] {
        let (status, message) = post(&app, &uri, json!({ "sender_id": user_id, "body": body })).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(message["body"], json!(body));
    }

    let (status, _) = post(&app, &uri, json!({ "sender_id": user_id, "body": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, thread) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let bodies: Vec<&str> = thread
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["body"].as_str().unwrap())
        .collect();
    assert_eq!(
        bodies,
        vec!["Uploaded ration card", "Please re-upload a clearer copy"]
    );

    let (status, _) = get(&app, "/api/requests/missing/messages").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================
// E-sign
// ============================================================

#[tokio::test]
async fn test_esign_stamps_pdf() {
    let app = test_app().await;
    let pdf = letter_pdf(2);

    let (status, body) = post(
        &app,
        "/api/esign",
        json!({
            "pdf_base64": BASE64.encode(&pdf),
            "signer_name": "Village Officer",
            "signatures": [
                { "page": 1, "x": 400.0, "y": 650.0, "width": 120.0, "height": 40.0, "image": png_data_url() },
                {
                    "page": 2, "x": 500.0, "y": 800.0, "width": 150.0, "height": 50.0,
                    "viewport": { "width": 816.0, "height": 1056.0 },
                    "image": BASE64.encode(signature_png()),
                },
            ],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page_count"], json!(2));
    assert_eq!(body["signatures_applied"], json!(2));

    let signed = BASE64.decode(body["pdf_base64"].as_str().unwrap()).unwrap();
    assert!(signed.starts_with(b"%PDF"));
    assert_eq!(
        body["sha256"].as_str().unwrap(),
        hex::encode(Sha256::digest(&signed))
    );

    let doc = Document::load_mem(&signed).unwrap();
    let last_page = *doc.get_pages().get(&2).unwrap();
    let content = String::from_utf8_lossy(&doc.get_page_content(last_page).unwrap()).into_owned();
    assert!(content.contains("Do"));
    assert!(content.contains("Digitally signed on"));
    assert!(content.contains("by Village Officer"));
}

#[tokio::test]
async fn test_esign_rejects_bad_input() {
    let app = test_app().await;
    let pdf = BASE64.encode(letter_pdf(1));

    let (status, body) = post(
        &app,
        "/api/esign",
        json!({
            "pdf_base64": pdf,
            "signatures": [
                { "page": 3, "x": 10.0, "y": 10.0, "width": 50.0, "height": 20.0, "image": png_data_url() },
            ],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("page"));

    let (status, _) = post(
        &app,
        "/api/esign",
        json!({ "pdf_base64": "%%% not base64", "signatures": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &app,
        "/api/esign",
        json!({
            "pdf_base64": pdf,
            "signatures": [
                { "page": 1, "x": 10.0, "y": 10.0, "width": 50.0, "height": 20.0, "image": "data:image/png;base64,@@@" },
            ],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &app,
        "/api/esign",
        json!({
            "pdf_base64": BASE64.encode(b"not a pdf"),
            "signatures": [
                { "page": 1, "x": 10.0, "y": 10.0, "width": 50.0, "height": 20.0, "image": png_data_url() },
            ],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
