//! In-process stand-in for the conversion service plus recording doubles.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use migrator_shared::error::MigrationError;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::Mutex,
};

use crate::{presenter::SaveRequest, sink::DownloadSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedUpload {
    pub file_name: Option<String>,
    pub file_bytes: Vec<u8>,
    pub source_format: Option<String>,
    pub target_format: Option<String>,
}

#[derive(Clone)]
pub enum UploadReply {
    Json(serde_json::Value),
    Error(StatusCode, &'static str),
    Raw(&'static str),
}

#[derive(Clone)]
pub struct ServerState {
    pub reply: Arc<Mutex<UploadReply>>,
    pub uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
    pub download_queries: Arc<Mutex<Vec<String>>>,
    pub files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl ServerState {
    pub fn new(reply: UploadReply) -> Self {
        Self {
            reply: Arc::new(Mutex::new(reply)),
            uploads: Arc::new(Mutex::new(Vec::new())),
            download_queries: Arc::new(Mutex::new(Vec::new())),
            files: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

pub fn ok_reply() -> UploadReply {
    UploadReply::Json(serde_json::json!({
        "file": "a.csv",
        "source": "csv",
        "target": "json",
        "message": "ok",
        "migratedFile": "out123.json",
    }))
}

async fn handle_upload(State(state): State<ServerState>, mut multipart: Multipart) -> Response {
    let mut upload = ReceivedUpload {
        file_name: None,
        file_bytes: Vec::new(),
        source_format: None,
        target_format: None,
    };
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.file_bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            }
            "sourceFormat" => upload.source_format = field.text().await.ok(),
            "targetFormat" => upload.target_format = field.text().await.ok(),
            _ => {}
        }
    }
    state.uploads.lock().await.push(upload);

    match state.reply.lock().await.clone() {
        UploadReply::Json(value) => Json(value).into_response(),
        UploadReply::Error(status, body) => (status, body).into_response(),
        UploadReply::Raw(body) => (StatusCode::OK, body).into_response(),
    }
}

async fn handle_download(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let Some(filename) = query.get("filename").cloned() else {
        return (StatusCode::BAD_REQUEST, "Missing filename parameter").into_response();
    };
    state.download_queries.lock().await.push(filename.clone());
    match state.files.lock().await.get(&filename) {
        Some(bytes) => bytes.clone().into_response(),
        None => (
            StatusCode::NOT_FOUND,
            format!("Migrated file not found: {filename}"),
        )
            .into_response(),
    }
}

pub async fn spawn_conversion_server(reply: UploadReply) -> anyhow::Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::new(reply);
    let app = Router::new()
        .route("/upload", post(handle_upload))
        .route("/download-migrated", get(handle_download))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

/// Answers every request with a 500 whose body is cut off mid-stream.
pub async fn spawn_truncated_error_server() -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 64\r\n\r\npartial",
                )
                .await;
            let _ = socket.shutdown().await;
        }
    });
    Ok(format!("http://{addr}"))
}

/// Address that refuses connections.
pub async fn closed_server_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

#[derive(Default)]
pub struct RecordingSink {
    pub saved: Mutex<Vec<SaveRequest>>,
}

#[async_trait]
impl DownloadSink for RecordingSink {
    async fn save(&self, request: SaveRequest) -> Result<PathBuf, MigrationError> {
        let path = PathBuf::from(request.file_name());
        self.saved.lock().await.push(request);
        Ok(path)
    }
}

pub fn temp_dir(label: &str) -> PathBuf {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    std::env::temp_dir().join(format!("migrator_{label}_{suffix}"))
}
