//! Canned-response HTTP/1.1 server for client tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub struct Route {
    method: &'static str,
    path: &'static str,
    status: u16,
    raw: Option<String>,
    data: Option<String>,
    pagination: Option<String>,
    /// Extra bytes claimed in Content-Length but never sent.
    missing: usize,
}

impl Route {
    /// Respond with `body` verbatim.
    pub fn new(method: &'static str, path: &'static str, status: u16, body: &str) -> Self {
        Self {
            method,
            path,
            status,
            raw: Some(body.to_string()),
            data: None,
            pagination: None,
            missing: 0,
        }
    }

    /// Respond 200 with `data` wrapped in a success envelope.
    pub fn ok(method: &'static str, path: &'static str, data: &str) -> Self {
        Self {
            method,
            path,
            status: 200,
            raw: None,
            data: Some(data.to_string()),
            pagination: None,
            missing: 0,
        }
    }

    pub fn with_pagination(mut self, pagination: &str) -> Self {
        self.pagination = Some(pagination.to_string());
        self
    }

    /// Close the connection `missing` bytes short of the declared length.
    pub fn truncated(mut self, missing: usize) -> Self {
        self.missing = missing;
        self
    }

    fn body(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }
        let data = self.data.as_deref().unwrap_or("null");
        match &self.pagination {
            Some(p) => format!(r#"{{"success":true,"data":{data},"pagination":{p}}}"#),
            None => format!(r#"{{"success":true,"data":{data}}}"#),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string.
    pub target: String,
    pub authorization: Option<String>,
    pub body: String,
}

pub struct MockServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let log = requests.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = routes.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, &routes, &log).await;
                });
            }
        });

        Self { addr, requests }
    }

    pub fn url(&self, prefix: &str) -> String {
        format!("http://{}{}", self.addr, prefix)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: &[Route],
    log: &Mutex<Vec<RecordedRequest>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                "authorization" => authorization = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }
    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[head_end..]).to_string();

    let path = target.split('?').next().unwrap_or_default();
    let route = routes
        .iter()
        .find(|r| r.method == method && r.path == path);
    let (status, payload, missing) = match route {
        Some(r) => (r.status, r.body(), r.missing),
        None => (
            404,
            r#"{"success":false,"error":{"code":"NOT_FOUND","message":"no route"}}"#.to_string(),
            0,
        ),
    };

    log.lock().expect("request log").push(RecordedRequest {
        method,
        target,
        authorization,
        body,
    });

    let response = format!(
        "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len() + missing
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
