use crate::backend::BookingBackend;
use crate::booking_service::{AnnotatedTimeslot, BookingOverview, BookingService};
use crate::calendar::CalendarMirror;
use crate::error::ServiceError;
use crate::session::{SessionAccount, SessionStore, SESSION_HEADER};
use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
struct RegisterRequest {
    #[validate(email)]
    email: String,
    #[validate(length(min = 1))]
    name: String,
    #[validate(length(min = 1))]
    password: String,
    #[serde(default)]
    is_volunteer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BookingRequest {
    slot_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
struct PublishTimeslotRequest {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    #[validate(length(min = 1))]
    subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Clone)]
pub struct AppState<B: BookingBackend> {
    pub service: BookingService<B>,
    pub sessions: SessionStore,
}

pub fn create_app<B: BookingBackend>(backend: B, calendar: Arc<dyn CalendarMirror>) -> Router {
    let state = AppState {
        service: BookingService::new(backend, calendar),
        sessions: SessionStore::default(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    let protected = Router::new()
        .route("/logout", get(logout))
        .route("/api/slots", get(get_available_slots))
        .route("/api/book", post(book_slot))
        .route("/api/bookings", get(get_bookings))
        .route("/api/bookings/:id", delete(cancel_booking))
        .route("/api/volunteer/slots", post(publish_timeslot))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session::<B>,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state)
        .layer(cors)
}

/// Resolves the session token header to an account id and passes it on as a
/// request extension. No token or an unknown token ends the request here.
async fn require_session<B: BookingBackend>(
    State(state): State<AppState<B>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ServiceError::NotLoggedIn)?;
    let account_id = state
        .sessions
        .account(token)
        .ok_or(ServiceError::NotLoggedIn)?;

    request.extensions_mut().insert(SessionAccount(account_id));
    Ok(next.run(request).await)
}

async fn register<B: BookingBackend>(
    State(state): State<AppState<B>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;
    state.service.register(
        request.email,
        request.name,
        &request.password,
        request.is_volunteer,
    )?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Registration successful".into(),
        }),
    ))
}

async fn login<B: BookingBackend>(
    State(state): State<AppState<B>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let account = state
        .service
        .authenticate(&request.email, &request.password)?;
    let token = state.sessions.open(account.id);
    Ok(Json(LoginResponse { token }))
}

async fn logout<B: BookingBackend>(
    State(state): State<AppState<B>>,
    headers: HeaderMap,
) -> Json<MessageResponse> {
    if let Some(token) = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        state.sessions.close(token);
    }
    Json(MessageResponse {
        message: "Logged out".into(),
    })
}

async fn get_available_slots<B: BookingBackend>(
    State(state): State<AppState<B>>,
) -> Result<Json<Vec<AnnotatedTimeslot>>, ServiceError> {
    Ok(Json(state.service.available_timeslots()?))
}

async fn book_slot<B: BookingBackend>(
    State(state): State<AppState<B>>,
    Extension(session): Extension<SessionAccount>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.service.book(session.0, request.slot_id).await?;
    Ok(Json(MessageResponse {
        message: "Booking successful".into(),
    }))
}

async fn get_bookings<B: BookingBackend>(
    State(state): State<AppState<B>>,
    Extension(session): Extension<SessionAccount>,
) -> Result<Json<Vec<BookingOverview>>, ServiceError> {
    Ok(Json(state.service.bookings_for_student(session.0)?))
}

async fn cancel_booking<B: BookingBackend>(
    State(state): State<AppState<B>>,
    Extension(session): Extension<SessionAccount>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.service.cancel(session.0, booking_id).await?;
    Ok(Json(MessageResponse {
        message: "Booking cancelled successfully".into(),
    }))
}

async fn publish_timeslot<B: BookingBackend>(
    State(state): State<AppState<B>>,
    Extension(session): Extension<SessionAccount>,
    Json(request): Json<PublishTimeslotRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    request.validate()?;
    state.service.publish_timeslot(
        session.0,
        request.start_time,
        request.end_time,
        &request.subject,
    )?;
    Ok(Json(MessageResponse {
        message: "Timeslot added successfully".into(),
    }))
}
