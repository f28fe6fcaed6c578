use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Contact, APP_KEY_HEADER};
use serde_json::Value;
use tower::ServiceExt;

const KEY: &str = "mySecretAppKey";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str) -> http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(APP_KEY_HEADER, KEY)
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    request(method, uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    request(method, uri).body(String::new()).unwrap()
}

// --- app key ---

#[tokio::test]
async fn missing_app_key_returns_401() {
    let resp = app(KEY)
        .oneshot(
            Request::builder()
                .uri("/myapi/v1/myresource")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["message"], "BAD_APP_KEY");
}

#[tokio::test]
async fn wrong_app_key_returns_401() {
    let resp = app(KEY)
        .oneshot(
            Request::builder()
                .uri("/myapi/v1/myresource")
                .header(APP_KEY_HEADER, "nope")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- myresource ---

#[tokio::test]
async fn my_resource_defaults_foo() {
    let resp = app(KEY)
        .oneshot(empty_request("GET", "/myapi/v1/myresource"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({ "foo": "bar" }));
}

#[tokio::test]
async fn my_resource_echoes_query() {
    let resp = app(KEY)
        .oneshot(empty_request("GET", "/myapi/v1/myresource?foo=rab"))
        .await
        .unwrap();

    let body: Value = body_json(resp).await;
    assert_eq!(body["foo"], "rab");
}

// --- fallback ---

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let resp = app(KEY)
        .oneshot(empty_request("GET", "/baduri/vundefined"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["message"], "RESOURCE_NOT_FOUND");
}

// --- contacts ---

#[tokio::test]
async fn create_contact_returns_201() {
    let resp = app(KEY)
        .oneshot(json_request(
            "POST",
            "/myapi/v1/contacts",
            r#"{"firstName":"John","lastName":"Doe"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let contact: Contact = body_json(resp).await;
    assert_eq!(contact.id, 1);
    assert_eq!(contact.first_name.as_deref(), Some("John"));
}

#[tokio::test]
async fn create_contact_form_returns_201() {
    let resp = app(KEY)
        .oneshot(
            request("POST", "/myapi/v1/contact-forms")
                .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body("firstName=John&lastName=Doe".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let contact: Contact = body_json(resp).await;
    assert_eq!(contact.last_name.as_deref(), Some("Doe"));
}

#[tokio::test]
async fn get_contact_not_found() {
    let resp = app(KEY)
        .oneshot(empty_request("GET", "/myapi/v1/contacts/42"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn patch_contact_not_found() {
    let resp = app(KEY)
        .oneshot(json_request("PATCH", "/myapi/v1/contacts/42", r#"{"firstName":"Jane"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_contact_not_found() {
    let resp = app(KEY)
        .oneshot(json_request("PUT", "/myapi/v1/contacts/42", r#"{"firstName":"Jane"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_contact_replaces_both_names() {
    use tower::Service;

    let mut app = app(KEY).into_service();
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/myapi/v1/contacts",
            r#"{"firstName":"John","lastName":"Doe"}"#,
        ))
        .await
        .unwrap();
    let created: Contact = body_json(resp).await;

    let uri = format!("/myapi/v1/contacts/{}", created.id);
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PUT", &uri, r#"{"firstName":"Jane"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let replaced: Contact = body_json(resp).await;
    assert_eq!(replaced.id, created.id);
    assert_eq!(replaced.first_name.as_deref(), Some("Jane"));
    assert!(replaced.last_name.is_none());
}

#[tokio::test]
async fn delete_contact_not_found() {
    let resp = app(KEY)
        .oneshot(empty_request("DELETE", "/myapi/v1/contacts/42"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- upload ---

#[tokio::test]
async fn upload_echoes_file() {
    let boundary = "okapiboundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"package\"; filename=\"package.json\"\r\n\
         Content-Type: application/json\r\n\r\n\
         {{\"name\":\"okapi\"}}\r\n\
         --{boundary}--\r\n"
    );
    let resp = app(KEY)
        .oneshot(
            request("POST", "/myapi/v1/upload")
                .header(
                    http::header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "application/json");
    assert_eq!(body_bytes(resp).await.as_ref(), br#"{"name":"okapi"}"#);
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    use tower::Service;

    let mut app = app(KEY).into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/myapi/v1/contacts",
            r#"{"firstName":"John","lastName":"Doe"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Contact = body_json(resp).await;
    let uri = format!("/myapi/v1/contacts/{}", created.id);

    // patch
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PATCH", &uri, r#"{"firstName":"Jane"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let patched: Contact = body_json(resp).await;
    assert_eq!(patched.first_name.as_deref(), Some("Jane"));
    assert_eq!(patched.last_name.as_deref(), Some("Doe"));

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &uri))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Contact = body_json(resp).await;
    assert_eq!(fetched, patched);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &uri))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &uri))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
