//! HTTP routes under `/api/email`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use chronomail_core::app::ScheduleService;
use chronomail_core::domain::{ScheduleId, ScheduleRequest, SendRequest};
use chronomail_core::error::ScheduleError;
use chronomail_core::ports::Clock;
use serde::Serialize;

/// Shared application state.
pub struct AppState {
    pub service: Arc<ScheduleService>,
    pub clock: Arc<dyn Clock>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/email/send", post(send_email))
        .route("/api/email/schedule", post(schedule_email))
        .route("/api/email/scheduled", get(list_scheduled))
        .route("/api/email/pending", get(list_pending))
        .route(
            "/api/email/schedule/{id}",
            get(get_schedule).delete(cancel_schedule),
        )
        .route("/api/email/stats", get(stats))
        .route("/api/email/health", get(health))
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageResponse {
    message: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheduled_id: Option<ScheduleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheduled_time: Option<DateTime<Utc>>,
}

impl MessageResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: "SUCCESS",
            scheduled_id: None,
            scheduled_time: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: "ERROR",
            scheduled_id: None,
            scheduled_time: None,
        }
    }

    fn into_response_with(self, code: StatusCode) -> Response {
        (code, Json(self)).into_response()
    }
}

/// Store failures are the server's fault; everything else is the caller's.
fn error_status(error: &ScheduleError) -> StatusCode {
    match error {
        ScheduleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn internal_error(error: ScheduleError) -> Response {
    tracing::error!(error = %error, "request failed");
    MessageResponse::error(error.to_string()).into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn send_email(State(state): State<Arc<AppState>>, Json(request): Json<SendRequest>) -> Response {
    match state.service.send_immediate(request).await {
        Ok(()) => MessageResponse::success("Email sent successfully!").into_response_with(StatusCode::OK),
        Err(e) => MessageResponse::error(format!("Failed to send email: {e}"))
            .into_response_with(error_status(&e)),
    }
}

async fn schedule_email(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScheduleRequest>,
) -> Response {
    if let Err(e) = request.ensure_future(state.clock.now()) {
        return MessageResponse::error(format!("Failed to schedule email: {e}"))
            .into_response_with(StatusCode::BAD_REQUEST);
    }

    match state.service.schedule_email(request).await {
        Ok(record) => MessageResponse {
            scheduled_id: Some(record.id),
            scheduled_time: Some(record.scheduled_time),
            ..MessageResponse::success("Email scheduled successfully!")
        }
        .into_response_with(StatusCode::OK),
        Err(e) => MessageResponse::error(format!("Failed to schedule email: {e}"))
            .into_response_with(error_status(&e)),
    }
}

async fn list_scheduled(State(state): State<Arc<AppState>>) -> Response {
    match state.service.list_all().await {
        Ok(records) => Json(records).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn list_pending(State(state): State<Arc<AppState>>) -> Response {
    match state.service.list_pending().await {
        Ok(records) => Json(records).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_schedule(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let Ok(id) = id.parse::<ScheduleId>() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match state.service.get_schedule(id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(e),
    }
}

async fn cancel_schedule(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    // An unparseable id cannot exist, so it is reported like any unknown id.
    let cancelled = match id.parse::<ScheduleId>() {
        Ok(id) => match state.service.cancel_schedule(id).await {
            Ok(cancelled) => cancelled,
            Err(e) => return internal_error(e),
        },
        Err(_) => false,
    };

    if cancelled {
        MessageResponse::success("Scheduled email cancelled successfully!")
            .into_response_with(StatusCode::OK)
    } else {
        MessageResponse::error(
            "Failed to cancel scheduled email. It may have already been sent or doesn't exist.",
        )
        .into_response_with(StatusCode::BAD_REQUEST)
    }
}

async fn stats(State(state): State<Arc<AppState>>) -> Response {
    match state.service.status_counts().await {
        Ok(counts) => Json(counts).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
    timestamp: DateTime<Utc>,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "UP",
        service: "ChronoMail",
        timestamp: state.clock.now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use chrono::{Duration, TimeZone};
    use chronomail_core::domain::OutgoingEmail;
    use chronomail_core::error::TransportError;
    use chronomail_core::impls::InMemoryScheduleStore;
    use chronomail_core::ports::{FixedClock, MailTransport};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct Refusing;

    #[async_trait]
    impl MailTransport for Refusing {
        async fn send(&self, _email: &OutgoingEmail) -> Result<(), TransportError> {
            Err(TransportError::Delivery("relay refused".to_string()))
        }
    }

    struct Accepting;

    #[async_trait]
    impl MailTransport for Accepting {
        async fn send(&self, _email: &OutgoingEmail) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
    }

    fn router(transport: Arc<dyn MailTransport>) -> Router {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(t0()));
        let store = Arc::new(InMemoryScheduleStore::new(clock.clone()));
        let service = Arc::new(ScheduleService::new(store, transport));
        create_router(Arc::new(AppState { service, clock }))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn schedule_body(to: &str, at: DateTime<Utc>) -> Value {
        json!({
            "recipientEmail": to,
            "subject": "Reminder",
            "body": "Tomorrow",
            "scheduledTime": at,
        })
    }

    #[tokio::test]
    async fn send_success() {
        let app = router(Arc::new(Accepting));
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/email/send",
            Some(json!({ "receiversMail": "bob@example.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "SUCCESS");
        assert_eq!(body["message"], "Email sent successfully!");
    }

    #[tokio::test]
    async fn send_failure_is_bad_request() {
        let app = router(Arc::new(Refusing));
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/email/send",
            Some(json!({ "receiversMail": "bob@example.com", "subject": "hi" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "ERROR");
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("Failed to send email: ")
        );
    }

    #[tokio::test]
    async fn schedule_then_list_and_fetch() {
        let app = router(Arc::new(Accepting));
        let at = t0() + Duration::hours(1);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/email/schedule",
            Some(schedule_body("alice@example.com", at)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "SUCCESS");
        let id = body["scheduledId"].as_str().unwrap().to_string();
        assert!(id.starts_with("sched-"));
        assert_eq!(body["scheduledTime"], json!(at));

        let (_, all) = call(&app, Method::GET, "/api/email/scheduled", None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);
        assert_eq!(all[0]["recipientAddress"], "alice@example.com");
        assert_eq!(all[0]["status"], "PENDING");

        let (_, pending) = call(&app, Method::GET, "/api/email/pending", None).await;
        assert_eq!(pending[0]["id"], id.as_str());

        let (status, one) = call(&app, Method::GET, &format!("/api/email/schedule/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["id"], id.as_str());
    }

    #[tokio::test]
    async fn schedule_rejects_past_time() {
        let app = router(Arc::new(Accepting));
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/email/schedule",
            Some(schedule_body("alice@example.com", t0())),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "ERROR");
        let (_, all) = call(&app, Method::GET, "/api/email/scheduled", None).await;
        assert_eq!(all, json!([]));
    }

    #[tokio::test]
    async fn schedule_rejects_bad_recipient() {
        let app = router(Arc::new(Accepting));
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/email/schedule",
            Some(schedule_body("nobody", t0() + Duration::hours(1))),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("Failed to schedule email: ")
        );
    }

    #[tokio::test]
    async fn cancel_then_cancel_again() {
        let app = router(Arc::new(Accepting));
        let (_, body) = call(
            &app,
            Method::POST,
            "/api/email/schedule",
            Some(schedule_body("alice@example.com", t0() + Duration::hours(1))),
        )
        .await;
        let uri = format!("/api/email/schedule/{}", body["scheduledId"].as_str().unwrap());

        let (status, first) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["status"], "SUCCESS");

        let (status, second) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(second["status"], "ERROR");

        let (_, stats) = call(&app, Method::GET, "/api/email/stats", None).await;
        assert_eq!(stats["cancelled"], 1);
        assert_eq!(stats["pending"], 0);
    }

    #[tokio::test]
    async fn unknown_ids() {
        let app = router(Arc::new(Accepting));

        let (status, _) = call(&app, Method::GET, "/api/email/schedule/sched-garbage", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&app, Method::DELETE, "/api/email/schedule/42", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "ERROR");
    }

    #[tokio::test]
    async fn health_reports_up() {
        let app = router(Arc::new(Accepting));
        let (status, body) = call(&app, Method::GET, "/api/email/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "UP");
        assert_eq!(body["service"], "ChronoMail");
        assert_eq!(body["timestamp"], json!(t0()));
    }
}
