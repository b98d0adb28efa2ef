//! Request-side tests: `ReconClient` against a one-shot HTTP listener on
//! the loopback interface.

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use recon_client::{ReconClient, ReconcileService, SaveRequest, ServiceConfig, ServiceError};
use recon_model::{ComparisonResult, DocumentHandle, MappingEntry};

/// What the listener received.
struct Recorded {
    head: String,
    body: Vec<u8>,
}

impl Recorded {
    fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.head, name)
    }

    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Contents of one multipart part, by part name.
    fn part(&self, name: &str) -> Option<String> {
        let text = self.body_text();
        let start = text.find(&format!("name=\"{name}\""))?;
        let rest = &text[start..];
        let content = &rest[rest.find("\r\n\r\n")? + 4..];
        Some(content[..content.find("\r\n--")?].to_string())
    }
}

fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

async fn read_more(stream: &mut TcpStream, buf: &mut Vec<u8>) {
    let mut chunk = [0u8; 8192];
    let n = stream.read(&mut chunk).await.unwrap();
    assert!(n > 0, "client closed the connection mid-request");
    buf.extend_from_slice(&chunk[..n]);
}

fn dechunk(mut raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(line_end) = find(raw, b"\r\n") {
        let size_text = std::str::from_utf8(&raw[..line_end]).unwrap();
        let size = usize::from_str_radix(size_text.split(';').next().unwrap().trim(), 16).unwrap();
        if size == 0 {
            break;
        }
        let start = line_end + 2;
        out.extend_from_slice(&raw[start..start + size]);
        raw = &raw[start + size + 2..];
    }
    out
}

async fn read_request(stream: &mut TcpStream) -> Recorded {
    let mut buf = Vec::new();
    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        read_more(stream, &mut buf).await;
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut body = buf.split_off(head_end);

    if let Some(len) = header_value(&head, "content-length").and_then(|v| v.parse::<usize>().ok()) {
        while body.len() < len {
            read_more(stream, &mut body).await;
        }
        body.truncate(len);
    } else if header_value(&head, "transfer-encoding").is_some_and(|v| v.contains("chunked")) {
        while !body.ends_with(b"0\r\n\r\n") {
            read_more(stream, &mut body).await;
        }
        body = dechunk(&body);
    }
    Recorded { head, body }
}

/// Accept one request, answer it with `response`, and hand back what was
/// received. The returned config points at the listener.
async fn serve_once(response: Vec<u8>) -> (ServiceConfig, JoinHandle<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let recorded = read_request(&mut stream).await;
        stream.write_all(&response).await.unwrap();
        stream.shutdown().await.unwrap();
        recorded
    });
    let config = ServiceConfig::default().with_base_url(format!("http://{addr}/api/"));
    (config, handle)
}

fn reply(status: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut head = format!(
        "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n",
        body.len()
    );
    for (name, value) in headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");
    let mut out = head.into_bytes();
    out.extend_from_slice(body);
    out
}

fn json_reply(status: &str, body: &str) -> Vec<u8> {
    reply(status, &[("content-type", "application/json")], body.as_bytes())
}

fn stock() -> DocumentHandle {
    DocumentHandle::from_bytes("stock.csv", b"SKU,Qty\nA1,3\n".to_vec())
}

fn audit() -> DocumentHandle {
    DocumentHandle::from_bytes("audit.csv", b"Code,Amount\nA1,3\n".to_vec())
}

#[tokio::test]
async fn discovery_uploads_the_file_part_with_the_token() {
    let (config, server) = serve_once(json_reply("200 OK", r#"{"columns":["SKU","Qty"]}"#)).await;
    let client = ReconClient::new(config.with_api_token(Some("t0k".to_string()))).unwrap();

    let columns = client.discover_columns(&stock()).await.unwrap();
    assert_eq!(columns, vec!["SKU".to_string(), "Qty".to_string()]);

    let request = server.await.unwrap();
    assert_eq!(
        request.request_line(),
        "POST /api/logistica/analisar-colunas HTTP/1.1"
    );
    assert_eq!(request.header("authorization"), Some("Bearer t0k"));
    assert!(
        request
            .header("content-type")
            .is_some_and(|v| v.starts_with("multipart/form-data; boundary="))
    );
    assert!(request.body_text().contains("filename=\"stock.csv\""));
    assert_eq!(request.part("file").as_deref(), Some("SKU,Qty\nA1,3\n"));
}

#[tokio::test]
async fn discovery_rejection_carries_the_service_message() {
    let (config, server) = serve_once(json_reply(
        "400 Bad Request",
        r#"{"message":"Arquivo invalido","error":"Bad Request"}"#,
    ))
    .await;
    let client = ReconClient::new(config).unwrap();

    let err = client.discover_columns(&stock()).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::DiscoveryFailed {
            document: "stock.csv".to_string(),
            reason: "Arquivo invalido".to_string(),
        }
    );
    assert!(server.await.unwrap().header("authorization").is_none());
}

#[tokio::test]
async fn comparison_sends_both_documents_and_json_mappings() {
    let (config, server) = serve_once(json_reply(
        "200 OK",
        r#"{"matching":["A1"],"missingFromTarget":["B2"],"narrative":"B2 never shipped."}"#,
    ))
    .await;
    let client = ReconClient::new(config).unwrap();
    let mappings = vec![
        MappingEntry::new("SKU", "Code"),
        MappingEntry::new("Qty", "Amount").with_instruction("bags of 60kg"),
    ];

    let result = client.compare(&stock(), &audit(), &mappings).await.unwrap();
    assert_eq!(result.matching, vec!["A1".to_string()]);
    assert_eq!(result.missing_from_target, vec!["B2".to_string()]);
    assert!(result.unknown_terms.is_empty());
    assert_eq!(result.narrative.as_deref(), Some("B2 never shipped."));

    let request = server.await.unwrap();
    assert_eq!(
        request.request_line(),
        "POST /api/logistica/comparar-documentos HTTP/1.1"
    );
    assert_eq!(request.part("source").as_deref(), Some("SKU,Qty\nA1,3\n"));
    assert_eq!(request.part("target").as_deref(), Some("Code,Amount\nA1,3\n"));
    let body = request.body_text();
    assert!(body.contains("filename=\"stock.csv\""));
    assert!(body.contains("filename=\"audit.csv\""));

    let sent: Value = serde_json::from_str(&request.part("mappings").unwrap()).unwrap();
    assert_eq!(
        sent,
        json!([
            {"sourceColumn": "SKU", "targetColumn": "Code"},
            {"sourceColumn": "Qty", "targetColumn": "Amount", "instruction": "bags of 60kg"}
        ])
    );
}

#[tokio::test]
async fn comparison_failure_without_message_uses_the_status() {
    let (config, _server) = serve_once(reply(
        "500 Internal Server Error",
        &[("content-type", "text/html")],
        b"<html>oops</html>",
    ))
    .await;
    let client = ReconClient::new(config).unwrap();

    let err = client
        .compare(&stock(), &audit(), &[MappingEntry::new("SKU", "Code")])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ServiceError::ComparisonFailed {
            reason: "service responded with 500 Internal Server Error".to_string(),
        }
    );
}

#[tokio::test]
async fn comparison_without_matching_is_malformed() {
    let (config, _server) = serve_once(json_reply("200 OK", r#"{"missingFromSource":[]}"#)).await;
    let client = ReconClient::new(config).unwrap();

    let err = client
        .compare(&stock(), &audit(), &[MappingEntry::new("SKU", "Code")])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::MalformedResult { .. }));
}

#[tokio::test]
async fn save_posts_the_json_body() {
    let (config, server) = serve_once(json_reply("201 Created", r#"{"id":17}"#)).await;
    let client = ReconClient::new(config).unwrap();
    let result = ComparisonResult {
        matching: vec!["A1".to_string()],
        ..Default::default()
    };
    let mappings = vec![MappingEntry::new("SKU", "Code")];

    let id = client
        .save(&SaveRequest::new("October audit", &mappings, &result))
        .await
        .unwrap();
    assert_eq!(id, "17");

    let request = server.await.unwrap();
    assert_eq!(
        request.request_line(),
        "POST /api/logistica/resultados HTTP/1.1"
    );
    assert_eq!(request.header("content-type"), Some("application/json"));
    let sent: Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(sent["name"], "October audit");
    assert_eq!(sent["mappings"][0]["targetColumn"], "Code");
    assert_eq!(sent["result"]["matching"], json!(["A1"]));
    assert!(sent.get("narrative").is_none());
}

#[tokio::test]
async fn delete_addresses_the_id_as_one_segment() {
    let (config, server) = serve_once(reply("200 OK", &[], b"")).await;
    let client = ReconClient::new(config).unwrap();

    client.delete("lot 7/a").await.unwrap();

    let request = server.await.unwrap();
    assert_eq!(
        request.request_line(),
        "DELETE /api/logistica/resultados/lot%207%2Fa HTTP/1.1"
    );
}

#[tokio::test]
async fn delete_rejection_is_delete_failed() {
    let (config, _server) = serve_once(json_reply("404 Not Found", r#"{"error":"not found"}"#)).await;
    let client = ReconClient::new(config).unwrap();

    let err = client.delete("42").await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::DeleteFailed {
            reason: "not found".to_string(),
        }
    );
}

#[tokio::test]
async fn export_reads_name_and_type_from_headers() {
    let (config, server) = serve_once(reply(
        "200 OK",
        &[
            ("content-type", "application/pdf"),
            ("content-disposition", "attachment; filename=\"auditoria.pdf\""),
        ],
        b"%PDF-1.7",
    ))
    .await;
    let client = ReconClient::new(config).unwrap();
    let result = ComparisonResult {
        matching: vec!["A1".to_string()],
        ..Default::default()
    };

    let document = client.export(&result).await.unwrap();
    assert_eq!(document.file_name, "auditoria.pdf");
    assert_eq!(document.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(document.bytes, b"%PDF-1.7");

    let request = server.await.unwrap();
    assert_eq!(
        request.request_line(),
        "POST /api/logistica/exportar HTTP/1.1"
    );
    assert_eq!(request.header("accept"), Some("*/*"));
    let sent: Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(sent["matching"], json!(["A1"]));
}

#[tokio::test]
async fn export_with_empty_body_is_rejected() {
    let (config, _server) = serve_once(reply(
        "200 OK",
        &[("content-type", "application/pdf")],
        b"",
    ))
    .await;
    let client = ReconClient::new(config).unwrap();

    let err = client.export(&ComparisonResult::default()).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::ExportFailed {
            reason: "service returned an empty document".to_string(),
        }
    );
}

#[tokio::test]
async fn unreachable_service_fails_the_running_operation() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let config = ServiceConfig::default().with_base_url(format!("http://{addr}/api"));
    let client = ReconClient::new(config).unwrap();

    let err = client.discover_columns(&stock()).await.unwrap_err();
    assert!(matches!(err, ServiceError::DiscoveryFailed { document, .. } if document == "stock.csv"));
}
