//! Test the explain endpoints over a real socket.

use std::net::SocketAddr;
use std::sync::Arc;

use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::auth::{Claims, JwtConfig};
use crate::http::{AppState, router};
use crate::search::FilterLimits;
use crate::time::FixedTimeSource;

const SECRET: &[u8] = b"e2e-explain-secret";
/// 2100-01-01T00:00:00Z.
const FAR_FUTURE: u64 = 4_102_444_800;

#[allow(clippy::expect_used)]
async fn start_server() -> SocketAddr {
    let state = AppState {
        jwt: Arc::new(JwtConfig::new_hs256(SECRET.to_vec()).expect("valid secret")),
        limits: FilterLimits::default(),
        time: Arc::new(FixedTimeSource::default()),
    };
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router(state)).await;
    });
    addr
}

#[allow(clippy::expect_used)]
fn token(claims: &Claims) -> String {
    let key = EncodingKey::from_secret(SECRET);
    encode(&Header::default(), claims, &key).expect("encodes")
}

fn reader_token() -> String {
    token(&Claims {
        sub: "reader".to_owned(),
        exp: FAR_FUTURE,
        libraries: Some(vec!["lib-1".to_owned()]),
        ..Claims::default()
    })
}

/// Send one HTTP/1.1 request and return the status code and body.
#[allow(clippy::expect_used)]
async fn send(
    addr: SocketAddr,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: &str,
) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let auth = token.map_or_else(String::new, |token| {
        format!("Authorization: Bearer {token}\r\n")
    });
    let request = format!(
        "{method} {path} HTTP/1.1\r\n\
         Host: localhost\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         {auth}\r\n{body}",
        body.len()
    );
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("status line");
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_owned())
        .unwrap_or_default();
    (status, body)
}

#[allow(clippy::expect_used)]
fn json_body(body: &str) -> Value {
    serde_json::from_str(body).expect("JSON body")
}

#[tokio::test]
async fn test_healthz() {
    let addr = start_server().await;
    let (status, _) = send(addr, "GET", "/healthz", None, "").await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_book_explain() {
    let addr = start_server().await;
    let token = reader_token();
    let body = json!({
        "condition": {"allOf": [
            {"tag": {"operator": "is", "value": "fiction"}},
            {"readStatus": {"operator": "isNot", "value": "READ"}}
        ]}
    });
    let (status, response) = send(
        addr,
        "POST",
        "/api/v1/books/search/explain",
        Some(&token),
        &body.to_string(),
    )
    .await;
    assert_eq!(status, 200, "{response}");
    assert_eq!(
        json_body(&response),
        json!({
            "sql": "SELECT b.ID FROM BOOK b \
                    LEFT JOIN READ_PROGRESS r ON b.ID = r.BOOK_ID AND r.USER_ID = $1 \
                    WHERE (b.LIBRARY_ID IN ($2) \
                    AND b.ID IN (SELECT bmt.BOOK_ID FROM BOOK_METADATA_TAG bmt \
                    WHERE LOWER(bmt.TAG) = LOWER($3)) \
                    AND (r.COMPLETED IS NULL OR r.COMPLETED IS FALSE))",
            "params": ["reader", "lib-1", "fiction"],
            "joins": [{"join": "readProgress", "id": "reader"}]
        })
    );
}

#[tokio::test]
async fn test_series_explain_without_filter() {
    let addr = start_server().await;
    let token = reader_token();
    let (status, response) = send(
        addr,
        "POST",
        "/api/v1/series/search/explain",
        Some(&token),
        r#"{"condition": null}"#,
    )
    .await;
    assert_eq!(status, 200, "{response}");
    assert_eq!(
        json_body(&response),
        json!({
            "sql": "SELECT s.ID FROM SERIES s WHERE s.LIBRARY_ID IN ($1)",
            "params": ["lib-1"],
            "joins": []
        })
    );
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let addr = start_server().await;
    let (status, _) = send(addr, "POST", "/api/v1/books/search/explain", None, "{}").await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_blank_subject_is_rejected() {
    let addr = start_server().await;
    let token = token(&Claims {
        sub: " ".to_owned(),
        exp: FAR_FUTURE,
        ..Claims::default()
    });
    let (status, _) = send(
        addr,
        "POST",
        "/api/v1/books/search/explain",
        Some(&token),
        "{}",
    )
    .await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_unknown_attribute_is_unprocessable() {
    let addr = start_server().await;
    let token = reader_token();
    let body = r#"{"condition": {"collectionId": {"operator": "is", "value": "c1"}}}"#;
    let (status, _) = send(
        addr,
        "POST",
        "/api/v1/books/search/explain",
        Some(&token),
        body,
    )
    .await;
    assert_eq!(status, 422);
}

#[tokio::test]
async fn test_oversized_filter_is_bad_request() {
    let addr = start_server().await;
    let token = reader_token();
    let leaf = json!({"deleted": {"operator": "isFalse"}});
    let depth = FilterLimits::DEFAULT_MAX_DEPTH;
    let deep = (0..depth).fold(leaf, |inner, _| json!({"anyOf": [inner]}));
    let (status, response) = send(
        addr,
        "POST",
        "/api/v1/books/search/explain",
        Some(&token),
        &json!({ "condition": deep }).to_string(),
    )
    .await;
    assert_eq!(status, 400);
    let body = json_body(&response);
    let error = body["error"].as_str().unwrap_or_default();
    assert!(error.contains("nested deeper"), "{response}");
}
