//! Shared fixtures: a fake car-rental API bound to a local port, and helpers
//! to drive the portal router in-process.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use car_rental_portal::{config::Config, routes, AppState};

pub type Hits = Arc<Mutex<Vec<String>>>;

pub struct Upstream {
    pub base_url: String,
    pub hits: Hits,
}

impl Upstream {
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    pub fn hit_count(&self, prefix: &str) -> usize {
        self.hits().iter().filter(|h| h.starts_with(prefix)).count()
    }
}

async fn record(State(hits): State<Hits>, request: Request, next: Next) -> Response {
    hits.lock()
        .unwrap()
        .push(format!("{} {}", request.method(), request.uri().path()));
    next.run(request).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn fake_login(Json(body): Json<Value>) -> Response {
    match (body["email"].as_str(), body["password"].as_str()) {
        (Some("a@b.com"), Some("x")) => Json(json!({
            "_id": "1", "name": "A", "email": "a@b.com", "role": "admin", "token": "tok"
        }))
        .into_response(),
        (Some("u@b.com"), Some("x")) => Json(json!({
            "_id": 2, "name": "U", "email": "u@b.com", "role": { "weird": true }, "token": "utok"
        }))
        .into_response(),
        (Some("notoken@b.com"), _) => Json(json!({ "_id": "3", "name": "N" })).into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid credentials" })),
        )
            .into_response(),
    }
}

async fn fake_cars() -> Json<Value> {
    Json(json!([
        { "_id": "c1", "make": "Honda", "model": "Civic", "year": 2022, "rentalPrice": 40, "available": true },
        { "_id": "c2", "make": "Honda", "model": "Civic", "year": 2023, "rentalPrice": 45, "available": true },
        { "_id": "c3", "make": "Honda", "model": "Accord", "year": 2021, "rentalPrice": 55 }
    ]))
}

async fn fake_car(Path(id): Path<String>) -> Response {
    if id == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "No car" }))).into_response();
    }
    Json(json!({ "_id": id, "make": "Honda", "model": "Civic" })).into_response()
}

async fn fake_providers() -> Json<Value> {
    Json(json!([
        { "_id": "p1", "name": "Hertz", "address": "1 Main St", "telephone": "555-0100" }
    ]))
}

async fn fake_create_booking(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if bearer(&headers).is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Not authorized" }))).into_response();
    }
    if body["carModel"] == "Slow Civic" {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    if body["carModel"] == "Sold Out" {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "Car not available" }))).into_response();
    }
    (StatusCode::CREATED, Json(json!({ "success": true, "data": body }))).into_response()
}

fn admin_bookings() -> Value {
    json!([
        { "_id": "b1", "carModel": "Civic", "pickupDate": "2024-06-01", "returnDate": "2024-06-03",
          "provider": { "_id": "p1", "name": "Hertz", "address": "1 Main St", "telephone": "555-0100" },
          "status": "pending", "paymentStatus": "unpaid", "user": "1" },
        { "_id": "b2", "carModel": "Accord", "pickupDate": "2024-06-05", "returnDate": "2024-06-09",
          "provider": { "_id": "p1", "name": "Hertz", "address": "1 Main St", "telephone": "555-0100" },
          "status": "completed", "paymentStatus": "paid", "user": "2" }
    ])
}

async fn fake_my_bookings(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(_) => Json(json!({ "success": true, "count": 1, "data": [admin_bookings()[0].clone()] }))
            .into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Not authorized" }))).into_response(),
    }
}

async fn fake_admin_bookings(headers: HeaderMap) -> Response {
    if bearer(&headers) != Some("tok") {
        return (StatusCode::FORBIDDEN, Json(json!({ "message": "Not authorized" }))).into_response();
    }
    Json(json!({ "bookings": admin_bookings() })).into_response()
}

async fn fake_update_booking(headers: HeaderMap, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    if bearer(&headers) != Some("tok") {
        return (StatusCode::FORBIDDEN, Json(json!({ "message": "Not authorized" }))).into_response();
    }
    Json(json!({ "success": true, "id": id, "data": body })).into_response()
}

pub async fn spawn_upstream() -> Upstream {
    let hits: Hits = Arc::default();
    let app = Router::new()
        .route("/api/auth/login", post(fake_login))
        .route("/api/cars/search", get(fake_cars))
        .route("/api/cars/{id}", get(fake_car))
        .route("/api/users/providers", get(fake_providers))
        .route("/api/bookings", post(fake_create_booking).get(fake_my_bookings))
        .route("/api/admins/bookings", get(fake_admin_bookings))
        .route("/api/admins/bookings/{id}", put(fake_update_booking))
        .layer(from_fn_with_state(hits.clone(), record));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Upstream {
        base_url: format!("http://{addr}"),
        hits,
    }
}

pub fn portal(upstream: &Upstream) -> Router {
    portal_with(upstream, |_| {})
}

/// Portal over `upstream` with adjusted configuration.
pub fn portal_with(upstream: &Upstream, adjust: impl FnOnce(&mut Config)) -> Router {
    let mut config = Config::with_defaults(&upstream.base_url, "integration-secret");
    adjust(&mut config);
    routes::router(AppState::new(config).unwrap())
}

pub async fn send(app: &Router, request: axum::http::Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> axum::http::Request<Body> {
    let mut builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> axum::http::Request<Body> {
    let mut builder = axum::http::Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// `name=value` part of the response's session cookie, if one was set.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("portal_session="))
        .and_then(|v| v.split(';').next())
        .map(String::from)
}

/// Log in through the portal and return the session cookie.
pub async fn login(app: &Router, email: &str, password: &str) -> String {
    let response = send(
        app,
        json_request("POST", "/auth/login", None, json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response).expect("session cookie")
}
