use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Duration;

use zipkey_registry::Registry;
use zipkey_server::{AppState, serve};

const BOUNDARY: &str = "zipkey-test-boundary";

/// Resposta HTTP crua: status, cabeçalhos e corpo (ainda em chunks, se houver).
struct RawResponse {
    status: u16,
    head: String,
    body: String,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}

/// Helper: envia um request e lê a resposta inteira (Connection: close).
async fn send_request(port: u16, request: Vec<u8>) -> RawResponse {
    let mut stream = TcpStream::connect(format!("127.0.0.1:{port}"))
        .await
        .unwrap();
    stream.write_all(&request).await.unwrap();
    stream.flush().await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8_lossy(&raw).to_string();

    let (head, body) = raw.split_once("\r\n\r\n").expect("resposta sem cabeçalhos");
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("status inválido");

    RawResponse {
        status,
        head: head.to_string(),
        body: body.to_string(),
    }
}

async fn get(port: u16, path: &str) -> RawResponse {
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    send_request(port, request.into_bytes()).await
}

async fn upload(port: u16, file: Option<(&str, &[u8])>, option: Option<&str>) -> RawResponse {
    let mut body = Vec::new();
    if let Some((name, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(option) = option {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"expiryOption\"\r\n\r\n{option}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut request = format!(
        "POST /upload HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Type: multipart/form-data; boundary={BOUNDARY}\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    request.extend_from_slice(&body);
    send_request(port, request).await
}

/// Extrai o código de 6 dígitos da página de sucesso.
fn extract_code(page: &str) -> String {
    let start = page.find(r#"<div class="code">"#).expect("página sem código")
        + r#"<div class="code">"#.len();
    page[start..start + 6].to_string()
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

async fn start_server(port: u16) -> (tokio::task::JoinHandle<()>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState::new(
        Registry::new(),
        dir.path().to_path_buf(),
        10 * 1024 * 1024,
    ));

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{port}"))
        .await
        .unwrap();
    let handle = tokio::spawn(async move {
        let _ = serve(listener, state, std::future::pending()).await;
    });

    // Aguardar servidor estar pronto
    tokio::time::sleep(Duration::from_millis(50)).await;
    (handle, dir)
}

#[tokio::test]
async fn test_index_page() {
    let port = 17400;
    let _server = start_server(port).await;

    let response = get(port, "/").await;
    assert_eq!(response.status, 200);
    assert!(response.body.contains(r#"action="/upload""#));

    let response = get(port, "/download.html").await;
    assert_eq!(response.status, 200);
    assert!(response.body.contains(r#"name="code""#));
}

#[tokio::test]
async fn test_upload_without_file() {
    let port = 17401;
    let (_server, dir) = start_server(port).await;

    let response = upload(port, None, Some("24h")).await;
    assert_eq!(response.status, 400);
    assert!(response.body.contains("No file uploaded."));
    assert_eq!(files_in(dir.path()), 0);
}

#[tokio::test]
async fn test_one_time_download() {
    let port = 17402;
    let (_server, dir) = start_server(port).await;

    let response = upload(port, Some(("secret.txt", &b"top secret"[..])), Some("once")).await;
    assert_eq!(response.status, 200);
    assert_eq!(files_in(dir.path()), 1);
    let code = extract_code(&response.body);

    let response = get(port, &format!("/download/{code}")).await;
    assert_eq!(response.status, 200);
    assert!(response.body.contains("top secret"));
    assert!(
        response
            .header("content-disposition")
            .unwrap()
            .contains("filename=\"secret.txt\"")
    );

    let response = get(port, &format!("/download/{code}")).await;
    assert_eq!(response.status, 404);
    assert!(response.body.contains("Invalid or Expired Code"));

    // O arquivo é apagado logo após a transferência
    for _ in 0..50 {
        if files_in(dir.path()) == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(files_in(dir.path()), 0);
}

#[tokio::test]
async fn test_multi_download() {
    let port = 17403;
    let (_server, dir) = start_server(port).await;

    let response = upload(port, Some(("shared.bin", &b"shared bytes"[..])), Some("48h")).await;
    let code = extract_code(&response.body);

    for _ in 0..3 {
        let response = get(port, &format!("/download/{code}")).await;
        assert_eq!(response.status, 200);
        assert!(response.body.contains("shared bytes"));
    }
    assert_eq!(files_in(dir.path()), 1);
}

#[tokio::test]
async fn test_unknown_policy_falls_back_to_24h() {
    let port = 17404;
    let _server = start_server(port).await;

    let response = upload(port, Some(("a.txt", &b"fallback"[..])), Some("1w")).await;
    assert_eq!(response.status, 200);
    assert!(response.body.contains("24 hours"));
    let code = extract_code(&response.body);

    for _ in 0..2 {
        let response = get(port, &format!("/download/{code}")).await;
        assert_eq!(response.status, 200);
    }
}

#[tokio::test]
async fn test_missing_policy_falls_back_to_24h() {
    let port = 17405;
    let _server = start_server(port).await;

    let response = upload(port, Some(("a.txt", &b"no option"[..])), None).await;
    assert_eq!(response.status, 200);
    assert!(response.body.contains("24 hours"));
}

#[tokio::test]
async fn test_invalid_code() {
    let port = 17406;
    let _server = start_server(port).await;

    let response = get(port, "/download/999999").await;
    assert_eq!(response.status, 404);
    assert!(response.body.contains("Invalid or Expired Code"));
}

#[tokio::test]
async fn test_download_form_redirects() {
    let port = 17407;
    let _server = start_server(port).await;

    let response = get(port, "/download?code=123456").await;
    assert_eq!(response.status, 303);
    assert_eq!(response.header("location"), Some("/download/123456"));
}

#[tokio::test]
async fn test_upload_keeps_extension_on_disk() {
    let port = 17408;
    let (_server, dir) = start_server(port).await;

    upload(port, Some(("photo.png", &b"\x89PNG"[..])), Some("24h")).await;

    let entry = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
    let name = entry.file_name().to_string_lossy().to_string();
    assert!(name.ends_with(".png"));
    assert_ne!(name, "photo.png");
}

fn remove_all_uploads(dir: &Path) {
    for entry in std::fs::read_dir(dir).unwrap() {
        std::fs::remove_file(entry.unwrap().path()).unwrap();
    }
}

#[tokio::test]
async fn test_missing_backing_file_is_server_error() {
    let port = 17409;
    let (_server, dir) = start_server(port).await;

    let response = upload(port, Some(("gone.txt", &b"hello"[..])), Some("48h")).await;
    let code = extract_code(&response.body);
    remove_all_uploads(dir.path());

    let response = get(port, &format!("/download/{code}")).await;
    assert_eq!(response.status, 500);
    assert!(response.header("content-disposition").is_none());
}

#[tokio::test]
async fn test_missing_backing_file_spends_one_time_code() {
    let port = 17410;
    let (_server, dir) = start_server(port).await;

    let response = upload(port, Some(("gone.txt", &b"hello"[..])), Some("once")).await;
    let code = extract_code(&response.body);
    remove_all_uploads(dir.path());

    let response = get(port, &format!("/download/{code}")).await;
    assert_eq!(response.status, 500);

    let response = get(port, &format!("/download/{code}")).await;
    assert_eq!(response.status, 404);
    assert!(response.body.contains("Invalid or Expired Code"));
}

#[tokio::test]
async fn test_download_form_without_digits() {
    let port = 17411;
    let _server = start_server(port).await;

    let response = get(port, "/download?code=abc").await;
    assert_eq!(response.status, 404);
    assert!(response.body.contains("Invalid or Expired Code"));
}
