use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use axum_extra::extract::CookieJar;
use axum_extra::extract::Multipart;
use pdf_excel_core::ExtractOptions;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::conversion::{
    content_disposition, convert_pdf_upload, convert_spreadsheet_upload, read_upload,
};
use crate::error::ApiError;
use crate::models::{
    ApiInfoResponse, EXTRACTION_PATH_HEADER, HealthResponse, LoginForm, PDF_CONTENT_TYPE,
    SESSION_COOKIE, XLSX_CONTENT_TYPE,
};
use crate::scratch::ScratchDir;
use crate::session::{
    CredentialVerifier, SessionStore, StaticCredentials, expired_session_cookie, session_cookie,
};
use crate::templates::{IndexTemplate, LoginTemplate};

#[derive(Clone)]
pub struct AppState {
    pub scratch: Arc<ScratchDir>,
    pub sessions: Arc<SessionStore>,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub extract_options: ExtractOptions,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        scratch: ScratchDir,
        credentials: impl CredentialVerifier + 'static,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            scratch: Arc::new(scratch),
            sessions: Arc::new(SessionStore::default()),
            credentials: Arc::new(credentials),
            extract_options: ExtractOptions::default(),
            max_upload_bytes,
        }
    }

    pub fn from_config(config: &ServerConfig) -> std::io::Result<Self> {
        let scratch = ScratchDir::new(&config.scratch_dir)?;
        let credentials = StaticCredentials::new(config.users.iter().cloned());
        Ok(Self::new(scratch, credentials, config.max_upload_bytes))
    }
}

/// Principal of a live session. Rejects with 401 before any body is read.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub principal: String,
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        state
            .sessions
            .from_jar(&jar)
            .map(|session| Self {
                principal: session.principal,
            })
            .ok_or_else(|| ApiError::Unauthorized("Login required".to_string()))
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(index_route))
        .route("/api", get(api_route))
        .route("/health", get(health_route))
        .route("/login", get(login_form_route).post(login_route))
        .route("/logout", get(logout_route))
        .route("/pdf-to-excel", post(pdf_to_excel_route))
        .route("/excel-to-pdf", post(excel_to_pdf_route))
        .fallback(not_found_route)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index_route(State(state): State<AppState>, jar: CookieJar) -> Response {
    match state.sessions.from_jar(&jar) {
        Some(session) => IndexTemplate {
            principal: &session.principal,
        }
        .into_response(),
        None => Redirect::to("/login").into_response(),
    }
}

async fn api_route() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse::describe())
}

async fn health_route() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

async fn login_form_route(State(state): State<AppState>, jar: CookieJar) -> Response {
    if state.sessions.from_jar(&jar).is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate::blank().into_response()
}

async fn login_route(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim();
    let Some(principal) = state.credentials.verify(username, &form.password) else {
        warn!(%username, "login rejected");
        return LoginTemplate::rejected().into_response();
    };

    if let Some(cookie) = jar.get(SESSION_COOKIE)
        && let Some(previous) = state.sessions.destroy(cookie.value())
    {
        info!(
            principal = %previous.principal,
            age_secs = previous.age().num_seconds(),
            "replaced previous session"
        );
    }

    let session_id = state.sessions.create(principal.as_str());
    info!(%principal, active_sessions = state.sessions.len(), "login succeeded");
    (jar.add(session_cookie(session_id)), Redirect::to("/")).into_response()
}

async fn logout_route(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE)
        && let Some(session) = state.sessions.destroy(cookie.value())
    {
        info!(
            principal = %session.principal,
            age_secs = session.age().num_seconds(),
            active_sessions = state.sessions.len(),
            "logged out"
        );
    }
    (jar.remove(expired_session_cookie()), Redirect::to("/login")).into_response()
}

async fn pdf_to_excel_route(
    State(state): State<AppState>,
    user: Authenticated,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;
    info!(principal = %user.principal, file = %upload.file_name, "pdf-to-excel requested");

    let converted = convert_pdf_upload(&state.scratch, &upload, &state.extract_options).await?;
    let download_name = upload.download_name("xlsx");

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, XLSX_CONTENT_TYPE)
        .header(header::CONTENT_DISPOSITION, content_disposition(&download_name))
        .header(EXTRACTION_PATH_HEADER, converted.report.path.as_str())
        .body(Body::from(converted.bytes))?)
}

async fn excel_to_pdf_route(
    State(state): State<AppState>,
    user: Authenticated,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;
    info!(principal = %user.principal, file = %upload.file_name, "excel-to-pdf requested");

    let converted = convert_spreadsheet_upload(&state.scratch, &upload).await?;
    let download_name = upload.download_name("pdf");

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, PDF_CONTENT_TYPE)
        .header(header::CONTENT_DISPOSITION, content_disposition(&download_name))
        .body(Body::from(converted.bytes))?)
}

async fn not_found_route() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}
