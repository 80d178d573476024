//! In-process fake of the obligations API and the identity service.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use tramite::client::ResourceClient;
use tramite::models::{Session, SessionUser};
use tramite::session::SessionProvider;
use tramite::store::Workspace;

pub const TOKEN: &str = "test-token";

type Reply<T> = Result<T, Response>;
type AuthReply<T> = Result<T, (StatusCode, Json<Value>)>;

#[derive(Default)]
pub struct Backend {
    pub companies: Vec<Value>,
    pub obligations: Vec<Value>,
    pub summary: Value,
    /// Delay before answering the obligation list of a company.
    pub delays: HashMap<i64, Duration>,
    /// Answer the next request with this status and raw body instead.
    pub fail_next: Option<(StatusCode, String)>,
    /// Store the next created entity but answer with a body that is not one.
    pub garble_next_create: bool,
    pub hits: usize,
    next_id: i64,
}

impl Backend {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub type Shared = Arc<Mutex<Backend>>;

pub struct TestApi {
    pub url: String,
    pub backend: Shared,
}

impl TestApi {
    pub fn hits(&self) -> usize {
        self.backend.lock().unwrap().hits
    }

    pub fn seed_company(&self, name: &str) -> i64 {
        let mut backend = self.backend.lock().unwrap();
        let id = backend.next_id();
        backend.companies.push(json!({
            "id": id,
            "nombre_comercial": name,
            "razon_social": format!("{} S.A.", name),
            "cedula_juridica": format!("3-101-{:06}", id),
            "user_id": Uuid::nil(),
            "created_at": "2025-01-01T00:00:00+00:00"
        }));
        id
    }

    pub fn seed_obligation(&self, company: i64, title: &str, due: &str) -> i64 {
        let mut backend = self.backend.lock().unwrap();
        let id = backend.next_id();
        backend.obligations.push(json!({
            "id": id,
            "empresa_id": company,
            "titulo": title,
            "fecha_vencimiento": due,
            "monto_estimado": null,
            "frecuencia": "Única",
            "completada": false
        }));
        id
    }

    pub fn delay(&self, company: i64, delay: Duration) {
        self.backend.lock().unwrap().delays.insert(company, delay);
    }

    pub fn fail_next(&self, status: StatusCode, body: &str) {
        self.backend.lock().unwrap().fail_next = Some((status, body.to_string()));
    }

    pub fn garble_next_create(&self) {
        self.backend.lock().unwrap().garble_next_create = true;
    }

    pub fn set_frequency(&self, obligation: i64, frequency: &str) {
        let mut backend = self.backend.lock().unwrap();
        if let Some(row) = backend.obligations.iter_mut().find(|o| o["id"] == obligation) {
            row["frecuencia"] = json!(frequency);
        }
    }

    pub fn obligation(&self, id: i64) -> Option<Value> {
        let backend = self.backend.lock().unwrap();
        backend.obligations.iter().find(|o| o["id"] == id).cloned()
    }
}

pub fn session() -> Session {
    Session {
        access_token: TOKEN.to_string(),
        refresh_token: Some("refresh".to_string()),
        user: SessionUser {
            id: Uuid::new_v4(),
            email: Some("ana@example.com".to_string()),
        },
        expires_at: Utc::now() + chrono::Duration::hours(1),
    }
}

pub fn client(api: &TestApi, provider: &SessionProvider) -> ResourceClient {
    ResourceClient::new(api.url.clone(), reqwest::Client::new(), provider)
}

/// A signed-in provider and a workspace pointed at `api`.
pub fn workspace(api: &TestApi) -> (SessionProvider, Workspace) {
    let provider = SessionProvider::with_session(session());
    let workspace = Workspace::new(client(api, &provider));
    (provider, workspace)
}

// ============================================================
// Obligations API
// ============================================================

fn error(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

/// Count the hit, honor `fail_next`, then check the bearer token.
fn enter(backend: &Shared, headers: &HeaderMap) -> Reply<()> {
    let mut backend = backend.lock().unwrap();
    backend.hits += 1;
    if let Some((status, body)) = backend.fail_next.take() {
        return Err((status, [(header::CONTENT_TYPE, "application/json")], body).into_response());
    }
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == format!("Bearer {}", TOKEN) => Ok(()),
        Some(_) => Err(error(StatusCode::UNAUTHORIZED, "Invalid token")),
        None => Err(error(StatusCode::UNAUTHORIZED, "Authorization header missing")),
    }
}

const NOT_OWNED: &str = "Empresa no encontrada o no pertenece al usuario.";

fn created_reply(backend: &mut Backend, body: Value) -> Value {
    if std::mem::take(&mut backend.garble_next_create) {
        json!({ "ok": true })
    } else {
        body
    }
}

async fn list_companies(State(backend): State<Shared>, headers: HeaderMap) -> Reply<Json<Value>> {
    enter(&backend, &headers)?;
    let backend = backend.lock().unwrap();
    Ok(Json(Value::Array(backend.companies.clone())))
}

async fn create_company(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Reply<Json<Value>> {
    enter(&backend, &headers)?;
    let mut backend = backend.lock().unwrap();
    let id = backend.next_id();
    body["id"] = json!(id);
    body["user_id"] = json!(Uuid::nil());
    body["created_at"] = json!("2025-01-01T00:00:00+00:00");
    backend.companies.push(body.clone());
    Ok(Json(created_reply(&mut backend, body)))
}

async fn list_obligations(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(company): Path<i64>,
) -> Reply<Json<Value>> {
    enter(&backend, &headers)?;
    let (items, delay) = {
        let backend = backend.lock().unwrap();
        if !backend.companies.iter().any(|c| c["id"] == company) {
            return Err(error(StatusCode::NOT_FOUND, NOT_OWNED));
        }
        let items: Vec<Value> = backend
            .obligations
            .iter()
            .filter(|o| o["empresa_id"] == company)
            .cloned()
            .collect();
        (items, backend.delays.get(&company).copied())
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    Ok(Json(Value::Array(items)))
}

async fn create_obligation(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Reply<Json<Value>> {
    enter(&backend, &headers)?;
    let mut backend = backend.lock().unwrap();
    let company = body["empresa_id"].clone();
    if !backend.companies.iter().any(|c| c["id"] == company) {
        return Err(error(StatusCode::NOT_FOUND, NOT_OWNED));
    }
    let id = backend.next_id();
    body["id"] = json!(id);
    body["completada"] = json!(false);
    body["user_id"] = json!(Uuid::nil());
    body["created_at"] = json!("2025-01-01T00:00:00+00:00");
    backend.obligations.push(body.clone());
    Ok(Json(created_reply(&mut backend, body)))
}

async fn update_obligation(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(patch): Json<Value>,
) -> Reply<Json<Value>> {
    enter(&backend, &headers)?;
    let mut backend = backend.lock().unwrap();
    let obligation = backend
        .obligations
        .iter_mut()
        .find(|o| o["id"] == id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Obligación no encontrada o no pertenece al usuario."))?;
    if let Some(fields) = patch.as_object() {
        for (key, value) in fields {
            obligation[key] = value.clone();
        }
    }
    Ok(Json(obligation.clone()))
}

async fn delete_obligation(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply<StatusCode> {
    enter(&backend, &headers)?;
    let mut backend = backend.lock().unwrap();
    let before = backend.obligations.len();
    backend.obligations.retain(|o| o["id"] != id);
    if backend.obligations.len() == before {
        return Err(error(StatusCode::NOT_FOUND, "Obligación no encontrada o no pertenece al usuario."));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn dashboard_summary(State(backend): State<Shared>, headers: HeaderMap) -> Reply<Json<Value>> {
    enter(&backend, &headers)?;
    let backend = backend.lock().unwrap();
    Ok(Json(backend.summary.clone()))
}

pub async fn spawn_api() -> TestApi {
    let backend = Shared::default();
    backend.lock().unwrap().summary = json!({
        "total_estimado_mes": 0,
        "proximas_obligaciones": [],
        "obligaciones_vencidas": []
    });

    let app = Router::new()
        .route("/empresas/", get(list_companies).post(create_company))
        .route("/empresas/{id}/obligaciones/", get(list_obligations))
        .route("/obligaciones/", post(create_obligation))
        .route("/obligaciones/{id}", patch(update_obligation).delete(delete_obligation))
        .route("/dashboard/summary", get(dashboard_summary))
        .layer(TraceLayer::new_for_http())
        .with_state(backend.clone());

    TestApi {
        url: serve(app).await,
        backend,
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });
    format!("http://{}", addr)
}

/// URL where nothing is listening.
pub async fn closed_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    drop(listener);
    format!("http://{}", addr)
}

// ============================================================
// Identity service
// ============================================================

pub const AUTH_KEY: &str = "anon-key";
pub const PASSWORD: &str = "correct horse";

#[derive(Default)]
pub struct AuthBackend {
    pub logouts: usize,
    pub refreshes: usize,
    /// Accounts that must confirm their email before signing in.
    pub confirm_email: bool,
}

pub type SharedAuth = Arc<Mutex<AuthBackend>>;

fn token_body(email: &str, access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh",
        "user": { "id": Uuid::nil(), "email": email }
    })
}

fn check_key(headers: &HeaderMap) -> AuthReply<()> {
    match headers.get("apikey").and_then(|v| v.to_str().ok()) {
        Some(AUTH_KEY) => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "No API key found in request"})),
        )),
    }
}

async fn token(
    State(auth): State<SharedAuth>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> AuthReply<Json<Value>> {
    check_key(&headers)?;
    match query.get("grant_type").map(String::as_str) {
        Some("password") => {
            if body["password"] != PASSWORD {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_grant",
                        "error_description": "Invalid login credentials"
                    })),
                ));
            }
            let email = body["email"].as_str().unwrap_or_default();
            Ok(Json(token_body(email, TOKEN)))
        }
        Some("refresh_token") => {
            auth.lock().unwrap().refreshes += 1;
            Ok(Json(token_body("ana@example.com", "refreshed-token")))
        }
        _ => Err((StatusCode::BAD_REQUEST, Json(json!({"msg": "unsupported grant type"})))),
    }
}

async fn signup(
    State(auth): State<SharedAuth>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AuthReply<Json<Value>> {
    check_key(&headers)?;
    let email = body["email"].as_str().unwrap_or_default();
    if auth.lock().unwrap().confirm_email {
        Ok(Json(json!({
            "id": Uuid::nil(),
            "email": email,
            "confirmation_sent_at": "2025-01-01T00:00:00Z"
        })))
    } else {
        Ok(Json(token_body(email, TOKEN)))
    }
}

async fn logout(State(auth): State<SharedAuth>, headers: HeaderMap) -> AuthReply<StatusCode> {
    check_key(&headers)?;
    auth.lock().unwrap().logouts += 1;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn spawn_auth() -> (String, SharedAuth) {
    let auth = SharedAuth::default();
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/signup", post(signup))
        .route("/auth/v1/logout", post(logout))
        .with_state(auth.clone());
    (serve(app).await, auth)
}
