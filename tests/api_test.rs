//! End-to-end HTTP tests against a server backed by the in-memory store.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use booking_engine::api::OPENAPI_PATH;
use booking_engine::api::dto::{
    EventSummaryResponse, RegistrationDto, RegistrationResponse, WaitlistResponse,
};
use booking_engine::app_state::AppState;
use booking_engine::domain::{AdmissionPolicy, Event, RegistrationStatus};
use booking_engine::persistence::{MemoryStore, RegistrationStore};
use booking_engine::server::build_app;
use booking_engine::service::RegistrationEngine;
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base: String,
    store: Arc<MemoryStore>,
    client: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        let store = Arc::new(MemoryStore::new(Duration::from_secs(2)));
        let shared: Arc<dyn RegistrationStore> = Arc::clone(&store) as Arc<dyn RegistrationStore>;
        let state = AppState {
            engine: Arc::new(RegistrationEngine::new(shared, AdmissionPolicy::default())),
        };
        let app = build_app(state, Duration::from_secs(10));

        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("failed to bind test listener");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("listener has no address");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base: base_url(addr),
            store,
            client: reqwest::Client::new(),
        }
    }

    async fn event(&self, capacity: u32) -> Event {
        let Some(capacity) = NonZeroU32::new(capacity) else {
            panic!("capacity must be positive");
        };
        self.store.insert_event(capacity).await
    }

    async fn submit(&self, body: Value) -> reqwest::Response {
        let Ok(response) = self
            .client
            .post(format!("{}/api/v1/registrations", self.base))
            .json(&body)
            .send()
            .await
        else {
            panic!("request failed");
        };
        response
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        let Ok(response) = self.client.get(format!("{}{path}", self.base)).send().await else {
            panic!("request failed");
        };
        response
    }
}

fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}")
}

async fn body<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> T {
    let Ok(parsed) = response.json::<T>().await else {
        panic!("unexpected response body");
    };
    parsed
}

fn register(user: i64, event: &Event, status: &str) -> Value {
    json!({ "user_id": user, "event_id": event.id, "status": status })
}

#[tokio::test]
async fn full_event_waitlists_and_withdrawal_promotes() {
    let server = TestServer::start().await;
    let ev = server.event(2).await;

    for user in [1, 2] {
        let response = server.submit(register(user, &ev, "confirmed")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let parsed: RegistrationResponse = body(response).await;
        assert_eq!(parsed.status, RegistrationStatus::Confirmed);
        assert_eq!(parsed.message, "Registration updated");
    }

    let response = server.submit(register(3, &ev, "confirmed")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let parsed: RegistrationResponse = body(response).await;
    assert_eq!(parsed.status, RegistrationStatus::Waitlist);
    assert_eq!(
        parsed.message,
        "Event is full. You have been added to the waitlist."
    );

    let response = server.submit(register(1, &ev, "withdrawn")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = server
        .get(&format!("/api/v1/events/{}/registrations/3", ev.id))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let promoted: RegistrationDto = body(response).await;
    assert_eq!(promoted.status, RegistrationStatus::Confirmed);

    let summary: EventSummaryResponse = body(
        server
            .get(&format!("/api/v1/events/{}/summary", ev.id))
            .await,
    )
    .await;
    assert_eq!(summary.spots_filled, 2);
    assert_eq!(summary.waitlist_count, 0);
    assert_eq!(summary.withdrawn_count, 1);
    assert_eq!(summary.spots_remaining, 0);
}

#[tokio::test]
async fn withdrawn_member_resubmitting_to_full_event_stays_withdrawn() {
    let server = TestServer::start().await;
    let ev = server.event(1).await;
    let _ = server.submit(register(1, &ev, "confirmed")).await;
    let _ = server.submit(register(2, &ev, "confirmed")).await;

    let response = server.submit(register(2, &ev, "withdrawn")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = server.submit(register(2, &ev, "confirmed")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let parsed: RegistrationResponse = body(response).await;
    assert_eq!(parsed.status, RegistrationStatus::Withdrawn);
    assert_eq!(parsed.message, "Registration updated");

    let queue: WaitlistResponse = body(
        server
            .get(&format!("/api/v1/events/{}/waitlist", ev.id))
            .await,
    )
    .await;
    assert!(queue.waitlist.is_empty());
}

#[tokio::test]
async fn waitlist_lists_members_in_promotion_order() {
    let server = TestServer::start().await;
    let ev = server.event(1).await;
    for user in [20, 21, 22] {
        let _ = server.submit(register(user, &ev, "confirmed")).await;
    }

    let queue: WaitlistResponse = body(
        server
            .get(&format!("/api/v1/events/{}/waitlist", ev.id))
            .await,
    )
    .await;
    let entries: Vec<(u32, i64)> = queue
        .waitlist
        .iter()
        .map(|e| (e.position, e.user_id.get()))
        .collect();
    assert_eq!(entries, vec![(1, 21), (2, 22)]);

    let participants: Value = body(
        server
            .get(&format!("/api/v1/events/{}/participants", ev.id))
            .await,
    )
    .await;
    assert_eq!(participants["participants"][0]["user_id"], json!(20));
}

#[tokio::test]
async fn missing_event_id_is_rejected_before_store_access() {
    let server = TestServer::start().await;
    let response = server
        .submit(json!({ "user_id": 1, "status": "confirmed" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let parsed: Value = body(response).await;
    assert_eq!(parsed["error"]["code"], json!(1001));
    assert_eq!(parsed["error"]["retryable"], json!(false));
    assert_eq!(server.store.registration_rows().await, 0);
}

#[tokio::test]
async fn unknown_status_and_malformed_json_are_invalid() {
    let server = TestServer::start().await;
    let ev = server.event(1).await;

    let response = server.submit(register(1, &ev, "waitlist")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let Ok(response) = server
        .client
        .post(format!("{}/api/v1/registrations", server.base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
    else {
        panic!("request failed");
    };
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.store.registration_rows().await, 0);
}

#[tokio::test]
async fn unknown_event_is_not_found() {
    let server = TestServer::start().await;
    let response = server
        .submit(json!({ "user_id": 1, "event_id": 999, "status": "confirmed" }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let parsed: Value = body(response).await;
    assert_eq!(parsed["error"]["code"], json!(2001));

    let response = server.get("/api/v1/events/999/summary").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(server.store.registration_rows().await, 0);
}

#[tokio::test]
async fn camel_case_fields_are_accepted() {
    let server = TestServer::start().await;
    let ev = server.event(3).await;
    let response = server
        .submit(json!({ "userId": 5, "eventId": ev.id, "status": "confirmed" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn resubmitting_never_duplicates_rows() {
    let server = TestServer::start().await;
    let ev = server.event(1).await;

    for status in ["confirmed", "withdrawn", "confirmed", "confirmed"] {
        let _ = server.submit(register(8, &ev, status)).await;
    }
    assert_eq!(server.store.registration_rows().await, 1);
}

#[tokio::test]
async fn concurrent_requests_respect_capacity() {
    let server = Arc::new(TestServer::start().await);
    let ev = server.event(3).await;

    let mut handles = Vec::new();
    for user in 1..=15 {
        let server = Arc::clone(&server);
        handles.push(tokio::spawn(async move {
            server.submit(register(user, &ev, "confirmed")).await.status()
        }));
    }

    let mut ok = 0;
    let mut conflict = 0;
    for handle in handles {
        match handle.await {
            Ok(StatusCode::OK) => ok += 1,
            Ok(StatusCode::CONFLICT) => conflict += 1,
            other => panic!("unexpected status: {other:?}"),
        }
    }
    assert_eq!(ok, 3);
    assert_eq!(conflict, 12);
}

#[tokio::test]
async fn negative_path_id_is_invalid() {
    let server = TestServer::start().await;
    let response = server.get("/api/v1/events/-1/waitlist").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let server = TestServer::start().await;
    let health = server.get("/health").await;
    assert_eq!(health.status(), StatusCode::OK);
    let parsed: Value = body(health).await;
    assert_eq!(parsed["status"], json!("healthy"));
    assert_eq!(parsed["storage"], json!("memory"));

    let doc = server.get(OPENAPI_PATH).await;
    assert_eq!(doc.status(), StatusCode::OK);
    let parsed: Value = body(doc).await;
    assert!(parsed["paths"].get("/api/v1/registrations").is_some());
}
