//! Event endpoints
//!
//! Every route is scoped to the owner named in the `x-scicloud-owner` header.

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    routing::{get, post},
};
use chrono::NaiveDate;
use scicloud_core::controller::compute_layout;
use scicloud_core::validation::FieldError;
use scicloud_core::{
    Category, Event, EventDraft, EventFilter, EventId, EventPatch, Layout, OwnerId,
    SciCloudError, TimeOfDay,
};
use serde::{Deserialize, Serialize};

use crate::routes::AppError;
use crate::state::AppState;

pub const OWNER_HEADER: &str = "x-scicloud-owner";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/search", get(search_events))
        .route("/events/validate", post(validate_draft))
        .route(
            "/events/{id}",
            get(get_event).patch(update_event).delete(delete_event),
        )
        .route("/events/{id}/move", post(move_event))
        .route("/events/{id}/layout", get(event_layout))
}

/// The requesting owner, from the `x-scicloud-owner` header.
pub struct Owner(pub OwnerId);

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Owner(OwnerId::new(v)))
            .ok_or_else(|| SciCloudError::NotAuthenticated.into())
    }
}

/// GET /events - List the owner's events
async fn list_events(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(filter): Query<EventFilter>,
) -> Result<Json<Vec<Event>>, AppError> {
    let events = state.repository(owner).list_events(&filter).await?;
    Ok(Json(events))
}

/// Query string for search. Spelled out rather than flattening
/// `EventFilter`, which breaks numeric fields in query strings.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<Category>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// GET /events/search?q= - Match title or description
async fn search_events(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Event>>, AppError> {
    let filter = EventFilter {
        start_date: params.start_date,
        end_date: params.end_date,
        category: params.category,
        limit: params.limit,
        offset: params.offset,
    };
    let events = state
        .repository(owner)
        .search_events(&params.q, &filter)
        .await?;
    Ok(Json(events))
}

/// GET /events/{id}
async fn get_event(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<Json<Event>, AppError> {
    let event = state
        .repository(owner)
        .get_event(&EventId::new(&id))
        .await?
        .ok_or(SciCloudError::NotFound(id))?;
    Ok(Json(event))
}

/// POST /events - Create from a draft, with overlap checking
async fn create_event(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(draft): Json<EventDraft>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let mut controller = state.controller(owner, draft.date).await?;

    controller.open_create_dialog(draft.date, draft.start_time);
    if let Some(open) = controller.draft_mut() {
        *open = draft;
    }
    let event = controller.submit().await?;

    Ok((StatusCode::CREATED, Json(event)))
}

/// PATCH /events/{id} - Partial update using persisted field names
async fn update_event(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
    Json(patch): Json<EventPatch>,
) -> Result<Json<Event>, AppError> {
    let event = state
        .repository(owner)
        .update_event(&EventId::new(id), patch)
        .await?;
    Ok(Json(event))
}

/// DELETE /events/{id}
async fn delete_event(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .repository(owner)
        .delete_event(&EventId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
}

/// POST /events/{id}/move - Drag-reschedule, keeping the duration
async fn move_event(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<Event>, AppError> {
    let id = EventId::new(id);
    let event = state
        .repository(owner.clone())
        .get_event(&id)
        .await?
        .ok_or_else(|| SciCloudError::NotFound(id.to_string()))?;

    let mut controller = state.controller(owner, Some(event.date)).await?;
    controller.begin_drag(id.clone());
    let moved = controller.handle_drop(&id, req.date, req.start_time).await?;

    Ok(Json(moved))
}

/// GET /events/{id}/layout - Position in the time grid
async fn event_layout(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<Json<Layout>, AppError> {
    let event = state
        .repository(owner)
        .get_event(&EventId::new(&id))
        .await?
        .ok_or(SciCloudError::NotFound(id))?;
    Ok(Json(compute_layout(&event, &state.layout)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub draft: EventDraft,
    /// The event being edited, skipped in the overlap check
    #[serde(default)]
    pub exclude_id: Option<EventId>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub errors: Vec<FieldError>,
}

/// POST /events/validate - Field errors for a draft, without saving
async fn validate_draft(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, AppError> {
    let controller = state.controller(owner, req.draft.date).await?;
    let errors = controller.validate(&req.draft, req.exclude_id.as_ref());

    Ok(Json(ValidateResponse {
        valid: errors.is_empty(),
        errors,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use scicloud_core::store::MemoryStore;
    use scicloud_core::{Clock, LayoutConfig};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::routes::app;

    fn test_app() -> Router {
        let today = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            Clock::fixed(today),
            LayoutConfig::default(),
        );
        app(state)
    }

    fn request(method: &str, uri: &str, owner: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(owner) = owner {
            builder = builder.header(OWNER_HEADER, owner);
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn draft(title: &str, start: &str, end: &str) -> Value {
        json!({
            "title": title,
            "date": "2024-07-10",
            "startTime": start,
            "endTime": end,
            "category": "meeting"
        })
    }

    async fn create(app: &Router, owner: &str, body: Value) -> Value {
        let (status, event) = send(app, request("POST", "/events", Some(owner), Some(body))).await;
        assert_eq!(status, StatusCode::CREATED, "{}", event);
        event
    }

    #[tokio::test]
    async fn test_missing_owner_is_unauthorized() {
        let app = test_app();
        let (status, body) = send(&app, request("GET", "/events", None, None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().contains("Not authenticated"));
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let app = test_app();
        let event = create(&app, "ada", draft("Sync", "09:00", "10:00")).await;
        assert_eq!(event["startTime"], "09:00");
        assert_eq!(event["category"], "meeting");

        let (status, events) = send(
            &app,
            request("GET", "/events?startDate=2024-07-01&endDate=2024-07-31&limit=10", Some("ada"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(events.as_array().unwrap().len(), 1);

        let (_, others) = send(&app, request("GET", "/events", Some("bob"), None)).await;
        assert_eq!(others.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_create_overlap_is_unprocessable() {
        let app = test_app();
        create(&app, "ada", draft("Sync", "09:00", "10:00")).await;

        let (status, body) = send(
            &app,
            request("POST", "/events", Some("ada"), Some(draft("Review", "09:30", "10:30"))),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"][0]["field"], "startTime");
        assert_eq!(body["fields"][0]["kind"], "overlaps");
    }

    #[tokio::test]
    async fn test_create_missing_fields_lists_each() {
        let app = test_app();
        let (status, body) = send(
            &app,
            request("POST", "/events", Some("ada"), Some(json!({ "title": "" }))),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["title", "date", "startTime", "endTime"]);
    }

    #[tokio::test]
    async fn test_get_foreign_event_is_not_found() {
        let app = test_app();
        let event = create(&app, "ada", draft("Sync", "09:00", "10:00")).await;
        let uri = format!("/events/{}", event["id"].as_str().unwrap());

        let (status, _) = send(&app, request("GET", &uri, Some("bob"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, fetched) = send(&app, request("GET", &uri, Some("ada"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, event);
    }

    #[tokio::test]
    async fn test_patch_rejects_inverted_range() {
        let app = test_app();
        let event = create(&app, "ada", draft("Sync", "09:00", "10:00")).await;
        let uri = format!("/events/{}", event["id"].as_str().unwrap());

        let (status, _) = send(
            &app,
            request("PATCH", &uri, Some("ada"), Some(json!({ "start_time": "11:00" }))),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, updated) = send(
            &app,
            request("PATCH", &uri, Some("ada"), Some(json!({ "location": "Lab 1" }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["location"], "Lab 1");
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let app = test_app();
        let event = create(&app, "ada", draft("Sync", "09:00", "10:00")).await;
        let uri = format!("/events/{}", event["id"].as_str().unwrap());

        let (status, _) = send(&app, request("DELETE", &uri, Some("ada"), None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, request("DELETE", &uri, Some("ada"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_move_keeps_duration() {
        let app = test_app();
        let event = create(&app, "ada", draft("Sync", "09:00", "10:30")).await;
        let uri = format!("/events/{}/move", event["id"].as_str().unwrap());

        let (status, moved) = send(
            &app,
            request(
                "POST",
                &uri,
                Some("ada"),
                Some(json!({ "date": "2024-07-12", "startTime": "14:00" })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(moved["date"], "2024-07-12");
        assert_eq!(moved["endTime"], "15:30");
    }

    #[tokio::test]
    async fn test_layout() {
        let app = test_app();
        let event = create(&app, "ada", draft("Sync", "09:00", "10:30")).await;
        let uri = format!("/events/{}/layout", event["id"].as_str().unwrap());

        let (status, layout) = send(&app, request("GET", &uri, Some("ada"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(layout, json!({ "kind": "timed", "top": 36.0, "height": 6.0 }));
    }

    #[tokio::test]
    async fn test_validate_excludes_edited_event() {
        let app = test_app();
        let event = create(&app, "ada", draft("Sync", "09:00", "10:00")).await;

        let (_, body) = send(
            &app,
            request(
                "POST",
                "/events/validate",
                Some("ada"),
                Some(json!({ "draft": draft("Sync", "09:30", "10:30") })),
            ),
        )
        .await;
        assert_eq!(body["valid"], false);

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/events/validate",
                Some("ada"),
                Some(json!({ "draft": draft("Sync", "09:30", "10:30"), "excludeId": event["id"] })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
    }

    #[tokio::test]
    async fn test_search() {
        let app = test_app();
        create(&app, "ada", draft("PCR run", "09:00", "10:00")).await;
        create(&app, "ada", draft("Lunch", "12:00", "13:00")).await;

        let (status, found) = send(
            &app,
            request("GET", "/events/search?q=pcr&limit=5", Some("ada"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["title"], "PCR run");
    }
}
