use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

pub const APP_KEY_HEADER: &str = "x-okapi-key";
pub const DEFAULT_APP_KEY: &str = "mysecretkey";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResourceQuery {
    pub foo: Option<String>,
}

#[derive(Debug, Default)]
pub struct Contacts {
    next_id: u64,
    items: BTreeMap<u64, Contact>,
}

impl Contacts {
    fn insert(&mut self, input: ContactInput) -> Contact {
        self.next_id += 1;
        let contact = Contact {
            id: self.next_id,
            first_name: input.first_name,
            last_name: input.last_name,
        };
        self.items.insert(contact.id, contact.clone());
        contact
    }
}

#[derive(Clone)]
pub struct AppState {
    app_key: Arc<str>,
    contacts: Arc<RwLock<Contacts>>,
}

pub fn app(app_key: &str) -> Router {
    let state = AppState {
        app_key: Arc::from(app_key),
        contacts: Arc::default(),
    };
    Router::new()
        .route("/myapi/v1/myresource", get(my_resource))
        .route("/myapi/v1/contact-forms", post(create_contact_form))
        .route("/myapi/v1/contacts", post(create_contact))
        .route(
            "/myapi/v1/contacts/{id}",
            get(get_contact)
                .put(replace_contact)
                .patch(update_contact)
                .delete(delete_contact),
        )
        .route("/myapi/v1/upload", post(upload))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), require_app_key))
        .with_state(state)
}

pub async fn run(listener: TcpListener, app_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(app_key)).await
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({ "code": code, "message": message }))).into_response()
}

async fn require_app_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = request
        .headers()
        .get(APP_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    if key != Some(state.app_key.as_ref()) {
        debug!(uri = %request.uri(), "rejecting request with bad app key");
        return error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "BAD_APP_KEY");
    }
    next.run(request).await
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "NOT_FOUND", "RESOURCE_NOT_FOUND")
}

async fn my_resource(Query(query): Query<ResourceQuery>) -> Json<serde_json::Value> {
    Json(json!({ "foo": query.foo.unwrap_or_else(|| "bar".to_string()) }))
}

async fn create_contact_form(
    State(state): State<AppState>,
    Form(input): Form<ContactInput>,
) -> (StatusCode, Json<Contact>) {
    let contact = state.contacts.write().await.insert(input);
    (StatusCode::CREATED, Json(contact))
}

async fn create_contact(
    State(state): State<AppState>,
    Json(input): Json<ContactInput>,
) -> (StatusCode, Json<Contact>) {
    let contact = state.contacts.write().await.insert(input);
    (StatusCode::CREATED, Json(contact))
}

async fn get_contact(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.contacts.read().await.items.get(&id) {
        Some(contact) => Json(contact.clone()).into_response(),
        None => not_found().await,
    }
}

async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<ContactInput>,
) -> Response {
    let mut contacts = state.contacts.write().await;
    let Some(contact) = contacts.items.get_mut(&id) else {
        return not_found().await;
    };
    if let Some(first_name) = input.first_name {
        contact.first_name = Some(first_name);
    }
    if let Some(last_name) = input.last_name {
        contact.last_name = Some(last_name);
    }
    Json(contact.clone()).into_response()
}

/// Overwrite both names; a name missing from the input is cleared.
async fn replace_contact(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<ContactInput>,
) -> Response {
    let mut contacts = state.contacts.write().await;
    let Some(contact) = contacts.items.get_mut(&id) else {
        return not_found().await;
    };
    contact.first_name = input.first_name;
    contact.last_name = input.last_name;
    Json(contact.clone()).into_response()
}

async fn delete_contact(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.contacts.write().await.items.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found().await,
    }
}

/// Echo the first uploaded file back with its own content type.
async fn upload(mut multipart: Multipart) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.file_name().is_none() {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        return match field.bytes().await {
            Ok(bytes) => (StatusCode::CREATED, [(header::CONTENT_TYPE, content_type)], bytes).into_response(),
            Err(err) => error_response(StatusCode::BAD_REQUEST, "BAD_REQUEST", &err.body_text()),
        };
    }
    error_response(StatusCode::BAD_REQUEST, "BAD_REQUEST", "NO_FILE")
}
