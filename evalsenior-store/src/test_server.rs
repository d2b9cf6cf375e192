//! One-shot HTTP server for exercising the clients

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A captured request
#[derive(Debug)]
pub(crate) struct Captured {
    pub request_line: String,
    pub headers: String,
    pub body: String,
}

/// Serve exactly one request with the given status, content type and body
///
/// Returns the base URL and a handle resolving to the captured request.
pub(crate) async fn serve_once(
    status: &str,
    content_type: &str,
    body: &str,
) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    );

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = find(&buf, b"\r\n\r\n") {
                break pos + 4;
            }
            if n == 0 {
                break buf.len();
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);

        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        let (request_line, headers) = head.split_once("\r\n").unwrap_or((&head, ""));
        Captured {
            request_line: request_line.to_string(),
            headers: headers.to_string(),
            body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
        }
    });

    (format!("http://{}/exec", addr), handle)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
