//! # API REST
//!
//! REST API implementation for MedAI.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, multipart uploads, CORS, API key checks)
//!
//! Uses `api-shared` for DTOs and the core `ReminderSession` for all reminder state.

#![warn(rust_2018_idioms)]

use api_shared::{
    validate_api_key, CalendarEventRes, CalendarRes, EnrichmentState, HealthRes, HealthService,
    IngestRes, ListRemindersRes, MedicineRecordRes, OcrPayloadReq, Reminder, UpdateReminderReq,
    UploadPrescriptionReq, API_KEY_HEADER,
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path as AxumPath, Query, Request, State},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{Json, Response},
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use medai_core::{
    ConfigError, CoreConfig, EntryId, GoogleImageSearch, HttpOcrClient, MedAiError, OcrService,
    RawOcrResult, ReminderSession, ValidationError,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Largest prescription photo accepted by `POST /prescriptions`.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_UPLOAD_NAME: &str = "prescription.jpg";

type ApiError = (StatusCode, &'static str);

/// Application state for the REST API server
///
/// Holds the reminder session that owns all reminder state, the OCR client used for uploads, and
/// the API key required on mutating requests (if any).
#[derive(Clone)]
pub struct AppState {
    session: Arc<ReminderSession>,
    ocr: Arc<dyn OcrService>,
    api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        session: Arc<ReminderSession>,
        ocr: Arc<dyn OcrService>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            session,
            ocr,
            api_key: api_key.map(Into::into),
        }
    }

    /// Wires the production OCR and image search clients from `cfg` into a fresh session.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if either HTTP client cannot be built.
    pub fn from_config(cfg: &CoreConfig, api_key: Option<String>) -> Result<Self, ConfigError> {
        let search = GoogleImageSearch::from_config(cfg)?;
        let ocr = HttpOcrClient::new(cfg)?;
        Ok(Self::new(
            Arc::new(ReminderSession::new(search)),
            Arc::new(ocr),
            api_key,
        ))
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        upload_prescription,
        ingest_ocr,
        list_reminders,
        add_reminder,
        update_reminder,
        delete_reminder,
        calendar,
    ),
    components(schemas(
        HealthRes,
        UploadPrescriptionReq,
        OcrPayloadReq,
        IngestRes,
        MedicineRecordRes,
        Reminder,
        EnrichmentState,
        ListRemindersRes,
        UpdateReminderReq,
        CalendarEventRes,
        CalendarRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full REST application: routes, API key checks, Swagger UI and CORS.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/prescriptions", post(upload_prescription))
        .route("/prescriptions/ocr", post(ingest_ocr))
        .route("/reminders", get(list_reminders).post(add_reminder))
        .route(
            "/reminders/:id",
            put(update_reminder).delete(delete_reminder),
        )
        .route("/calendar", get(calendar))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    api.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
}

/// Rejects mutating requests without the configured API key. Reads are always allowed.
async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if [Method::GET, Method::HEAD, Method::OPTIONS].contains(request.method()) {
        return Ok(next.run(request).await);
    }

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match validate_api_key(state.api_key.as_deref(), provided) {
        Ok(()) => Ok(next.run(request).await),
        Err(e) => {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "rejected request: {}",
                e
            );
            Err((StatusCode::UNAUTHORIZED, "Invalid API key"))
        }
    }
}

fn validation_status(e: &ValidationError) -> ApiError {
    match e {
        ValidationError::UnknownEntry(_) | ValidationError::IndexOutOfRange { .. } => {
            (StatusCode::NOT_FOUND, "Reminder not found")
        }
        ValidationError::UnknownField(_) => (StatusCode::BAD_REQUEST, "Unknown reminder field"),
        ValidationError::InvalidFieldValue { .. } | ValidationError::InvalidValue(_) => {
            (StatusCode::BAD_REQUEST, "Invalid reminder value")
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// # Returns
/// * `Json<HealthRes>` - Health status response containing service status
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/prescriptions",
    request_body(content = UploadPrescriptionReq, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Prescription read and reminders seeded", body = IngestRes),
        (status = 400, description = "Missing or unreadable image field"),
        (status = 401, description = "Invalid API key"),
        (status = 502, description = "OCR service error")
    )
)]
/// Upload a prescription photo
///
/// Sends the `image` form field to the OCR service and replaces the reminder list with one entry
/// per medicine found. Image lookups for the new entries continue in the background.
///
/// # Errors
/// Returns `400 Bad Request` if the form has no `image` field, or `502 Bad Gateway` if the OCR
/// service fails. The reminder list is unchanged on error.
#[axum::debug_handler]
async fn upload_prescription(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestRes>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Multipart read error: {:?}", e);
        (StatusCode::BAD_REQUEST, "Invalid multipart body")
    })? {
        if field.name() != Some(medai_core::constants::OCR_IMAGE_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_NAME)
            .to_string();
        let bytes = field.bytes().await.map_err(|e| {
            tracing::error!("Image read error: {:?}", e);
            (StatusCode::BAD_REQUEST, "Invalid image field")
        })?;
        upload = Some((file_name, bytes));
        break;
    }

    let Some((file_name, bytes)) = upload else {
        return Err((StatusCode::BAD_REQUEST, "Missing image field"));
    };
    if bytes.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Empty image"));
    }

    let summary = state
        .session
        .extract(state.ocr.as_ref(), bytes.to_vec(), &file_name)
        .await
        .map_err(|e| {
            tracing::error!("Prescription extraction error: {:?}", e);
            match e {
                MedAiError::ExternalService(_) => (StatusCode::BAD_GATEWAY, "OCR service error"),
                MedAiError::Validation(v) => validation_status(&v),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
            }
        })?;

    Ok(Json(IngestRes::new(summary, state.session.snapshot().await)))
}

#[utoipa::path(
    post,
    path = "/prescriptions/ocr",
    request_body = OcrPayloadReq,
    responses(
        (status = 200, description = "Reminders seeded from OCR output", body = IngestRes),
        (status = 401, description = "Invalid API key")
    )
)]
/// Seed reminders from OCR output that was obtained elsewhere
///
/// Malformed fields are treated as absent rather than rejected.
#[axum::debug_handler]
async fn ingest_ocr(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Json<IngestRes> {
    let summary = state.session.ingest(RawOcrResult::from_value(payload)).await;
    Json(IngestRes::new(summary, state.session.snapshot().await))
}

#[utoipa::path(
    get,
    path = "/reminders",
    responses(
        (status = 200, description = "Current reminder list", body = ListRemindersRes)
    )
)]
/// List reminders in order, with each entry's image lookup state
#[axum::debug_handler]
async fn list_reminders(State(state): State<AppState>) -> Json<ListRemindersRes> {
    let reminders = state
        .session
        .snapshot()
        .await
        .into_iter()
        .map(Reminder::from)
        .collect();
    Json(ListRemindersRes { reminders })
}

#[utoipa::path(
    post,
    path = "/reminders",
    responses(
        (status = 201, description = "Blank reminder appended", body = Reminder),
        (status = 401, description = "Invalid API key")
    )
)]
/// Append a blank reminder
#[axum::debug_handler]
async fn add_reminder(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Reminder>), ApiError> {
    let entry = state.session.add().await;
    let snapshot = state
        .session
        .snapshot_of(entry.id)
        .await
        .ok_or((StatusCode::NOT_FOUND, "Reminder not found"))?;
    Ok((StatusCode::CREATED, Json(snapshot.into())))
}

#[utoipa::path(
    put,
    path = "/reminders/{id}",
    params(("id" = String, Path, description = "Reminder id (32 lowercase hex characters)")),
    request_body = UpdateReminderReq,
    responses(
        (status = 200, description = "Reminder updated", body = Reminder),
        (status = 400, description = "Invalid id, field or value"),
        (status = 401, description = "Invalid API key"),
        (status = 404, description = "Reminder not found")
    )
)]
/// Update one field of a reminder
///
/// Setting `medicine` on a reminder without an image starts an image lookup.
///
/// # Errors
/// Returns `400 Bad Request` for a malformed id, unknown field or invalid value, and
/// `404 Not Found` if no reminder has the id.
#[axum::debug_handler]
async fn update_reminder(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdateReminderReq>,
) -> Result<Json<Reminder>, ApiError> {
    let id = parse_entry_id(&id)?;
    let update = req.into_update().map_err(|e| {
        tracing::error!("Invalid reminder update: {:?}", e);
        validation_status(&e)
    })?;

    state.session.update(id, update).await.map_err(|e| {
        tracing::error!("Update reminder error: {:?}", e);
        validation_status(&e)
    })?;

    let snapshot = state
        .session
        .snapshot_of(id)
        .await
        .ok_or((StatusCode::NOT_FOUND, "Reminder not found"))?;
    Ok(Json(snapshot.into()))
}

#[utoipa::path(
    delete,
    path = "/reminders/{id}",
    params(("id" = String, Path, description = "Reminder id (32 lowercase hex characters)")),
    responses(
        (status = 204, description = "Reminder removed"),
        (status = 400, description = "Invalid id"),
        (status = 401, description = "Invalid API key"),
        (status = 404, description = "Reminder not found")
    )
)]
/// Remove a reminder
///
/// Any image lookup still running for it is discarded when it completes.
#[axum::debug_handler]
async fn delete_reminder(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_entry_id(&id)?;
    state.session.remove(id).await.map_err(|e| {
        tracing::error!("Remove reminder error: {:?}", e);
        validation_status(&e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct CalendarQuery {
    /// Day to place events on (`YYYY-MM-DD`); defaults to today.
    #[param(value_type = Option<String>)]
    date: Option<NaiveDate>,
    /// Expand every daily dose over each reminder's course.
    course: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/calendar",
    params(CalendarQuery),
    responses(
        (
            status = 200,
            description = "Calendar events derived from the reminder list",
            body = CalendarRes
        ),
        (status = 400, description = "Invalid query")
    )
)]
/// Calendar events for reminders that have both a medicine and a time
///
/// Events are recomputed from the current list on every request.
#[axum::debug_handler]
async fn calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Json<CalendarRes> {
    let day = query
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let events = if query.course.unwrap_or(false) {
        state.session.course(day).await
    } else {
        state.session.calendar(day).await
    };

    Json(CalendarRes {
        events: events.into_iter().map(CalendarEventRes::from).collect(),
    })
}

fn parse_entry_id(id: &str) -> Result<EntryId, ApiError> {
    EntryId::parse(id).map_err(|e| {
        tracing::error!("Invalid reminder id: {:?}", e);
        (StatusCode::BAD_REQUEST, "Invalid reminder id")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest};
    use http_body_util::BodyExt;
    use medai_core::{DisabledImageSearch, ExternalServiceError};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct FixedOcr(Result<Value, u16>);

    #[async_trait]
    impl OcrService for FixedOcr {
        async fn extract(
            &self,
            _image: Vec<u8>,
            _file_name: &str,
        ) -> Result<RawOcrResult, ExternalServiceError> {
            match &self.0 {
                Ok(value) => Ok(RawOcrResult::from_value(value.clone())),
                Err(status) => Err(ExternalServiceError::Status {
                    service: "ocr",
                    status: *status,
                    body: String::new(),
                }),
            }
        }
    }

    fn metformin() -> Value {
        json!({
            "extracted_text": "Take Metformin 500mg twice daily",
            "medicine_data": [{
                "medicine": "Metformin",
                "dosage": "500mg",
                "schedule": "twice daily",
                "days_to_take": 30
            }]
        })
    }

    fn app_with(ocr: FixedOcr, api_key: Option<&str>) -> Router {
        let session = Arc::new(ReminderSession::new(Arc::new(DisabledImageSearch)));
        router(AppState::new(
            session,
            Arc::new(ocr),
            api_key.map(str::to_owned),
        ))
    }

    fn app() -> Router {
        app_with(FixedOcr(Ok(metformin())), None)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: Method, uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn multipart_request(field: &str, bytes: &[u8]) -> HttpRequest<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--BOUNDARY\r\n\
                 Content-Disposition: form-data; name=\"{field}\"; filename=\"rx.jpg\"\r\n\
                 Content-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n--BOUNDARY--\r\n");

        HttpRequest::builder()
            .method(Method::POST)
            .uri("/prescriptions")
            .header(
                header::CONTENT_TYPE,
                "multipart/form-data; boundary=BOUNDARY",
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: &Router, request: HttpRequest<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), empty_request(Method::GET, "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_ocr_payload_to_calendar() {
        let app = app();

        let (status, body) = send(
            &app,
            json_request(Method::POST, "/prescriptions/ocr", metformin()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reminders"][0]["daysToTake"], 30);
        assert_eq!(body["reminders"][0]["frequency"], "twice daily");
        let id = body["reminders"][0]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            json_request(
                Method::PUT,
                &format!("/reminders/{id}"),
                json!({ "field": "time", "value": "09:00" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["time"], "09:00");

        let (status, body) = send(
            &app,
            empty_request(Method::GET, "/calendar?date=2026-10-19"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["events"],
            json!([{ "id": id, "title": "Metformin (500mg)", "start": "2026-10-19T09:00:00" }])
        );

        let (_, body) = send(
            &app,
            empty_request(Method::GET, "/calendar?date=2026-10-19&course=true"),
        )
        .await;
        assert_eq!(body["events"].as_array().unwrap().len(), 30);
    }

    #[tokio::test]
    async fn test_upload_prescription() {
        let app = app();
        let (status, body) = send(&app, multipart_request("image", b"jpeg-bytes")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["extractedText"], "Take Metformin 500mg twice daily");
        assert_eq!(body["records"][0]["medicine"], "Metformin");
        assert_eq!(body["reminders"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_errors() {
        let (status, _) = send(&app(), multipart_request("photo", b"jpeg-bytes")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let failing = app_with(FixedOcr(Err(503)), None);
        let (status, _) = send(&failing, multipart_request("image", b"jpeg-bytes")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (_, body) = send(&failing, empty_request(Method::GET, "/reminders")).await;
        assert_eq!(body["reminders"], json!([]));
    }

    #[tokio::test]
    async fn test_add_update_delete_reminder() {
        let app = app();

        let (status, body) = send(&app, empty_request(Method::POST, "/reminders")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["medicine"], "");
        assert_eq!(body["daysToTake"], 1);
        assert_eq!(body["enrichment"], "absent");
        let id = body["id"].as_str().unwrap().to_string();
        let uri = format!("/reminders/{id}");

        let (status, _) = send(
            &app,
            json_request(Method::PUT, &uri, json!({ "field": "daysToTake", "value": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            json_request(
                Method::PUT,
                &uri,
                json!({ "field": "daysToTake", "value": u32::MAX }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            json_request(Method::PUT, &uri, json!({ "field": "colour", "value": "red" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, empty_request(Method::DELETE, &uri)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, empty_request(Method::DELETE, &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, empty_request(Method::DELETE, "/reminders/not-an-id")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_key_guards_mutations_only() {
        let app = app_with(FixedOcr(Ok(metformin())), Some("secret"));

        let (status, _) = send(&app, empty_request(Method::POST, "/reminders")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, empty_request(Method::GET, "/reminders")).await;
        assert_eq!(status, StatusCode::OK);

        let request = HttpRequest::builder()
            .method(Method::POST)
            .uri("/reminders")
            .header(API_KEY_HEADER, "secret")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}
