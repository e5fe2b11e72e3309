use anyhow::{anyhow, Context, Result};
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;

use crate::board_store::{Board, BoardStore, InsertPosition};
use crate::config_store::ConfigStore;
use crate::main_ui_html::build_main_ui_html;
use crate::snippet::generate_snippet;

pub struct AppState {
    pub config: Mutex<ConfigStore>,
    pub board: Mutex<BoardSession>,
    pub server_port: AtomicU16,
}

type ApiResponse = (StatusCode, Json<Value>);

/// The live board plus its backing store. Every mutation goes through
/// `apply`: the transform produces the next board value, that value is
/// persisted, and only then does it become the current board.
pub struct BoardSession {
    store: BoardStore,
    board: Board,
}

impl BoardSession {
    pub fn new(store: BoardStore) -> Self {
        let board = store.load();
        Self { store, board }
    }

    pub fn current(&self) -> &Board {
        &self.board
    }

    pub fn apply(&mut self, transform: impl FnOnce(Board) -> Board) -> Result<()> {
        let next = transform(self.board.clone());
        self.store.persist(&next)?;
        self.board = next;
        Ok(())
    }
}

impl AppState {
    pub fn new(config: ConfigStore, board: BoardSession) -> Self {
        Self {
            config: Mutex::new(config),
            board: Mutex::new(board),
            server_port: AtomicU16::new(0),
        }
    }
}

pub struct AppServer {
    port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl AppServer {
    pub fn start(state: Arc<AppState>, preferred_port: u16) -> Result<Self> {
        let listener = bind_listener(preferred_port)?;
        let port = listener
            .local_addr()
            .context("failed to inspect server local address")?
            .port();
        listener
            .set_nonblocking(true)
            .context("failed to set listener non-blocking")?;

        state.server_port.store(port, Ordering::Relaxed);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let thread_handle = thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();
            let Ok(runtime) = runtime else {
                return;
            };

            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(_) => return,
                };

                let app = build_router(state);
                let server = axum::serve(listener, app).with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                });
                let _ = server.await;
            });
        });

        Ok(Self {
            port,
            shutdown_tx: Some(shutdown_tx),
            thread_handle: Some(thread_handle),
        })
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for AppServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Clone, Serialize)]
struct UiGroup {
    id: String,
    title: String,
    urls: Vec<String>,
    snippets: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct UiSnapshot {
    groups: Vec<UiGroup>,
    preview_size: u32,
    use_table_wrapper: bool,
    confirm_delete: bool,
}

#[derive(Debug, Deserialize)]
struct GroupRemoveReq {
    group_id: String,
}

#[derive(Debug, Deserialize)]
struct GroupRenameReq {
    group_id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct GroupUrlsReq {
    group_id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct UrlRemoveReq {
    group_id: String,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct UrlUpdateReq {
    group_id: String,
    index: usize,
    value: String,
}

#[derive(Debug, Deserialize)]
struct UrlInsertReq {
    group_id: String,
    index: usize,
    position: InsertPosition,
}

#[derive(Debug, Deserialize)]
struct RenderConfigReq {
    preview_size: u32,
    use_table_wrapper: bool,
}

fn build_router(state: Arc<AppState>) -> Router {
    let port = state.server_port.load(Ordering::Relaxed);
    let local_origin = HeaderValue::from_str(&format!("http://127.0.0.1:{port}"))
        .expect("127.0.0.1 origin should be valid");
    let localhost_origin = HeaderValue::from_str(&format!("http://localhost:{port}"))
        .expect("localhost origin should be valid");

    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("null"),
            local_origin,
            localhost_origin,
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(get_main_page))
        .route("/ping", get(get_ping))
        .route("/app/init", get(get_app_init))
        .route("/app/group-add", post(post_group_add))
        .route("/app/group-remove", post(post_group_remove))
        .route("/app/group-rename", post(post_group_rename))
        .route("/app/group-urls", post(post_group_urls))
        .route("/app/url-remove", post(post_url_remove))
        .route("/app/url-update", post(post_url_update))
        .route("/app/url-insert", post(post_url_insert))
        .route("/app/config", post(post_render_config))
        .layer(cors)
        .with_state(state)
}

async fn get_main_page() -> Html<String> {
    Html(build_main_ui_html())
}

async fn get_ping() -> ApiResponse {
    ok_json(json!({}))
}

async fn get_app_init(State(state): State<Arc<AppState>>) -> ApiResponse {
    snapshot_response(&state)
}

async fn post_group_add(State(state): State<Arc<AppState>>) -> ApiResponse {
    {
        let mut session = match state.board.lock() {
            Ok(guard) => guard,
            Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "board store lock error"),
        };
        if let Err(err) = session.apply(Board::add_group) {
            return err_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("save error: {err}"),
            );
        }
    }

    snapshot_response(&state)
}

async fn post_group_remove(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GroupRemoveReq>,
) -> ApiResponse {
    {
        let mut session = match state.board.lock() {
            Ok(guard) => guard,
            Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "board store lock error"),
        };
        if session.current().group(&payload.group_id).is_none() {
            return err_json(StatusCode::NOT_FOUND, "group not found");
        }
        if let Err(err) = session.apply(|board| board.remove_group(&payload.group_id)) {
            return err_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("save error: {err}"),
            );
        }
    }

    snapshot_response(&state)
}

async fn post_group_rename(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GroupRenameReq>,
) -> ApiResponse {
    {
        let mut session = match state.board.lock() {
            Ok(guard) => guard,
            Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "board store lock error"),
        };
        if session.current().group(&payload.group_id).is_none() {
            return err_json(StatusCode::NOT_FOUND, "group not found");
        }
        if let Err(err) =
            session.apply(|board| board.rename_group(&payload.group_id, &payload.title))
        {
            return err_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("save error: {err}"),
            );
        }
    }

    snapshot_response(&state)
}

async fn post_group_urls(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GroupUrlsReq>,
) -> ApiResponse {
    {
        let mut session = match state.board.lock() {
            Ok(guard) => guard,
            Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "board store lock error"),
        };
        if session.current().group(&payload.group_id).is_none() {
            return err_json(StatusCode::NOT_FOUND, "group not found");
        }
        if let Err(err) =
            session.apply(|board| board.set_group_urls(&payload.group_id, &payload.text))
        {
            return err_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("save error: {err}"),
            );
        }
    }

    snapshot_response(&state)
}

async fn post_url_remove(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UrlRemoveReq>,
) -> ApiResponse {
    {
        let mut session = match state.board.lock() {
            Ok(guard) => guard,
            Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "board store lock error"),
        };
        if session.current().group(&payload.group_id).is_none() {
            return err_json(StatusCode::NOT_FOUND, "group not found");
        }
        if let Err(err) =
            session.apply(|board| board.remove_url_at(&payload.group_id, payload.index))
        {
            return err_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("save error: {err}"),
            );
        }
    }

    snapshot_response(&state)
}

async fn post_url_update(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UrlUpdateReq>,
) -> ApiResponse {
    {
        let mut session = match state.board.lock() {
            Ok(guard) => guard,
            Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "board store lock error"),
        };
        if session.current().group(&payload.group_id).is_none() {
            return err_json(StatusCode::NOT_FOUND, "group not found");
        }
        if let Err(err) = session
            .apply(|board| board.set_url_at(&payload.group_id, payload.index, &payload.value))
        {
            return err_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("save error: {err}"),
            );
        }
    }

    snapshot_response(&state)
}

async fn post_url_insert(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UrlInsertReq>,
) -> ApiResponse {
    {
        let mut session = match state.board.lock() {
            Ok(guard) => guard,
            Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "board store lock error"),
        };
        if session.current().group(&payload.group_id).is_none() {
            return err_json(StatusCode::NOT_FOUND, "group not found");
        }
        if let Err(err) = session.apply(|board| {
            board.insert_url_at(&payload.group_id, payload.index, payload.position)
        }) {
            return err_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("save error: {err}"),
            );
        }
    }

    snapshot_response(&state)
}

async fn post_render_config(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RenderConfigReq>,
) -> ApiResponse {
    {
        let mut config = match state.config.lock() {
            Ok(guard) => guard,
            Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "config lock error"),
        };
        if let Err(err) = config.set_render_config(payload.preview_size, payload.use_table_wrapper)
        {
            return err_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("save error: {err}"),
            );
        }
    }

    snapshot_response(&state)
}

fn snapshot_response(state: &AppState) -> ApiResponse {
    let config = match state.config.lock() {
        Ok(guard) => guard,
        Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "config lock error"),
    };
    let session = match state.board.lock() {
        Ok(guard) => guard,
        Err(_) => return err_json(StatusCode::INTERNAL_SERVER_ERROR, "board store lock error"),
    };

    ok_snapshot(build_ui_snapshot(&config, session.current()))
}

fn ok_json(payload: Value) -> ApiResponse {
    let mut body = serde_json::Map::new();
    body.insert("ok".to_string(), Value::Bool(true));

    if let Some(obj) = payload.as_object() {
        for (key, value) in obj {
            body.insert(key.clone(), value.clone());
        }
    } else if !payload.is_null() {
        body.insert("data".to_string(), payload);
    }

    (StatusCode::OK, Json(Value::Object(body)))
}

fn ok_snapshot(snapshot: UiSnapshot) -> ApiResponse {
    (
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "groups": snapshot.groups,
            "preview_size": snapshot.preview_size,
            "use_table_wrapper": snapshot.use_table_wrapper,
            "confirm_delete": snapshot.confirm_delete,
        })),
    )
}

fn err_json(status: StatusCode, message: &str) -> ApiResponse {
    (
        status,
        Json(json!({
            "ok": false,
            "error": message,
        })),
    )
}

fn build_ui_snapshot(config: &ConfigStore, board: &Board) -> UiSnapshot {
    let render_config = config.render_config();

    let groups = board
        .groups
        .iter()
        .map(|group| UiGroup {
            id: group.id.clone(),
            title: group.title.clone(),
            urls: group.urls.clone(),
            snippets: group
                .urls
                .iter()
                .map(|url| generate_snippet(url, &render_config))
                .collect(),
        })
        .collect();

    UiSnapshot {
        groups,
        preview_size: render_config.preview_size,
        use_table_wrapper: render_config.use_table_wrapper,
        confirm_delete: config.confirm_delete(),
    }
}

fn bind_listener(preferred_port: u16) -> Result<TcpListener> {
    for offset in 0..200u16 {
        let port = preferred_port.saturating_add(offset);
        if port == 0 {
            continue;
        }

        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            return Ok(listener);
        }
    }

    Err(anyhow!("failed to bind server port"))
}

#[cfg(target_os = "windows")]
pub fn open_in_browser(url: &str) -> Result<()> {
    use std::os::windows::ffi::OsStrExt;

    let to_wide_null = |value: &std::ffi::OsStr| {
        value
            .encode_wide()
            .chain(std::iter::once(0))
            .collect::<Vec<u16>>()
    };
    let operation = to_wide_null(std::ffi::OsStr::new("open"));
    let target = to_wide_null(std::ffi::OsStr::new(url));

    let result = unsafe {
        windows_sys::Win32::UI::Shell::ShellExecuteW(
            std::ptr::null_mut(),
            operation.as_ptr(),
            target.as_ptr(),
            std::ptr::null(),
            std::ptr::null(),
            windows_sys::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL,
        )
    };
    let result_code = result as isize;
    if result_code <= 32 {
        return Err(anyhow!(
            "ShellExecuteW failed (code: {result_code}) for {url}"
        ));
    }

    Ok(())
}

#[cfg(not(target_os = "windows"))]
pub fn open_in_browser(_url: &str) -> Result<()> {
    Ok(())
}
