use actix_cors::Cors;
use actix_web::http::{header, StatusCode};
use actix_web::{
    delete, dev::Server, get, post, put, web, App, HttpResponse, HttpServer, Responder,
    ResponseError,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::application::UploadMergeUseCase;
use crate::domain::error::{AppError, Result};
use crate::domain::table::{MergeRequest, PreviewTarget, TableSide};
use crate::domain::user::{LoginRequest, SignupRequest};
use crate::interfaces::state::AppState;

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub app_state: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ParseError(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PreconditionError(_) => StatusCode::CONFLICT,
            AppError::Internal(_) | AppError::ConfigError(_) | AppError::IoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct PreviewQuery {
    #[serde(default)]
    rows: Option<usize>,
}

fn parse_side(raw: &str) -> Result<TableSide> {
    raw.parse::<TableSide>().map_err(AppError::ValidationError)
}

fn respond<T: Serialize>(logs: &Mutex<Vec<LogEntry>>, source: &str, result: Result<T>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => log_error(logs, source, e),
    }
}

fn log_error(logs: &Mutex<Vec<LogEntry>>, source: &str, e: AppError) -> HttpResponse {
    let level = if e.status_code().is_server_error() {
        "ERROR"
    } else {
        "WARN"
    };
    add_log(logs, level, source, &e.to_string());
    e.error_response()
}

#[post("/tables/{side}")]
async fn upload_table(
    data: web::Data<HttpState>,
    side: web::Path<String>,
    body: web::Bytes,
) -> impl Responder {
    let result = parse_side(&side).and_then(|side| {
        add_log(
            &data.logs,
            "INFO",
            "Upload",
            &format!("Receiving {} table ({} bytes)", side, body.len()),
        );
        // Parse without holding the workspace lock
        let parser = data.app_state.workspace()?.parser().clone();
        let parsed = UploadMergeUseCase::parse_upload(&parser, side, &body)?;

        let mut workspace = data.app_state.workspace()?;
        let rows = workspace.default_preview_rows();
        Ok(workspace.install_table(side, parsed).preview(rows))
    });

    respond(&data.logs, "Upload", result)
}

#[get("/tables/{side}/preview")]
async fn preview_table(
    data: web::Data<HttpState>,
    side: web::Path<String>,
    query: web::Query<PreviewQuery>,
) -> impl Responder {
    let result = parse_side(&side).and_then(|side| {
        data.app_state
            .workspace()?
            .preview(PreviewTarget::from(side), query.rows)
    });

    respond(&data.logs, "Preview", result)
}

#[get("/selection")]
async fn get_selection(data: web::Data<HttpState>) -> impl Responder {
    let result = data
        .app_state
        .workspace()
        .map(|workspace| workspace.selection().clone());

    respond(&data.logs, "Merge", result)
}

#[put("/selection")]
async fn update_selection(
    data: web::Data<HttpState>,
    req: web::Json<MergeRequest>,
) -> impl Responder {
    let result = data
        .app_state
        .workspace()
        .map(|mut workspace| workspace.update_selection(&req).clone());

    respond(&data.logs, "Merge", result)
}

#[post("/merge")]
async fn merge_tables(data: web::Data<HttpState>, req: web::Json<MergeRequest>) -> impl Responder {
    let result = data
        .app_state
        .workspace()
        .and_then(|mut workspace| workspace.merge(&req));

    if let Ok(summary) = &result {
        add_log(
            &data.logs,
            "INFO",
            "Merge",
            &format!(
                "{} join on {} = {}: {} rows, {} columns",
                summary.selection.join_type,
                summary.selection.left_key,
                summary.selection.right_key,
                summary.row_count,
                summary.column_count
            ),
        );
    }

    respond(&data.logs, "Merge", result)
}

#[get("/merged/preview")]
async fn preview_merged(
    data: web::Data<HttpState>,
    query: web::Query<PreviewQuery>,
) -> impl Responder {
    let result = data
        .app_state
        .workspace()
        .and_then(|workspace| workspace.preview(PreviewTarget::Merged, query.rows));

    respond(&data.logs, "Preview", result)
}

#[get("/merged/download")]
async fn download_merged(data: web::Data<HttpState>) -> impl Responder {
    match data.app_state.workspace().and_then(|workspace| workspace.export()) {
        Ok(file) => {
            add_log(
                &data.logs,
                "INFO",
                "Download",
                &format!("Serving {} ({} bytes)", file.file_name, file.content.len()),
            );
            HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file.file_name),
                ))
                .body(file.content)
        }
        Err(e) => log_error(&data.logs, "Download", e),
    }
}

#[delete("/workspace")]
async fn reset_workspace(data: web::Data<HttpState>) -> impl Responder {
    match data.app_state.workspace() {
        Ok(mut workspace) => {
            workspace.reset();
            add_log(&data.logs, "INFO", "Workspace", "Workspace cleared");
            HttpResponse::NoContent().finish()
        }
        Err(e) => log_error(&data.logs, "Workspace", e),
    }
}

#[post("/auth/signup")]
async fn signup(data: web::Data<HttpState>, req: web::Json<SignupRequest>) -> impl Responder {
    let result = data.app_state.auth.signup(req.into_inner()).await;
    respond(&data.logs, "Auth", result)
}

#[post("/auth/login")]
async fn login(data: web::Data<HttpState>, req: web::Json<LoginRequest>) -> impl Responder {
    let result = data.app_state.auth.login(req.into_inner()).await;
    respond(&data.logs, "Auth", result)
}

#[post("/auth/logout")]
async fn logout(data: web::Data<HttpState>) -> impl Responder {
    match data.app_state.auth.logout().await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => log_error(&data.logs, "Auth", e),
    }
}

#[get("/auth/me")]
async fn current_user(data: web::Data<HttpState>) -> impl Responder {
    let result = data
        .app_state
        .auth
        .current_user()
        .await
        .and_then(|user| user.ok_or_else(|| AppError::AuthError("not signed in".to_string())));

    respond(&data.logs, "Auth", result)
}

#[derive(Serialize, Deserialize)]
struct AuthStatus {
    authenticated: bool,
}

#[get("/auth/status")]
async fn auth_status(data: web::Data<HttpState>) -> impl Responder {
    let result = data
        .app_state
        .auth
        .is_authenticated()
        .await
        .map(|authenticated| AuthStatus { authenticated });

    respond(&data.logs, "Auth", result)
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    match data.logs.lock() {
        Ok(logs) => HttpResponse::Ok().json(&*logs),
        Err(_) => AppError::Internal("log buffer lock poisoned".to_string()).error_response(),
    }
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    if let Ok(mut logs) = logs.lock() {
        logs.push(entry.clone());
        if logs.len() > MAX_LOG_ENTRIES {
            logs.remove(0);
        }
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Everything served under `/api`
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(upload_table)
            .service(preview_table)
            .service(get_selection)
            .service(update_selection)
            .service(merge_tables)
            .service(preview_merged)
            .service(download_merged)
            .service(reset_workspace)
            .service(signup)
            .service(login)
            .service(logout)
            .service(current_user)
            .service(auth_status)
            .service(get_logs),
    );
}

pub fn start_server(
    app_state: Arc<AppState>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
) -> std::io::Result<Server> {
    let host = app_state.config.server.host.clone();
    let port = app_state.config.server.port;
    let upload_limit = app_state.config.server.max_upload_bytes;
    let state = web::Data::new(HttpState { app_state, logs });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for the local dashboard

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(upload_limit))
            .app_data(web::JsonConfig::default().limit(upload_limit))
            .configure(routes)
    })
    .bind((host.as_str(), port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::{JoinSelection, MergeSummary, TablePreview};
    use crate::domain::user::CurrentUser;
    use crate::infrastructure::config::AppConfig;
    use crate::infrastructure::users::JsonUserRepository;
    use actix_web::test as actix_test;
    use serde_json::json;
    use uuid::Uuid;

    fn test_state() -> web::Data<HttpState> {
        let dir = std::env::temp_dir().join(format!("tablemerge_http_{}", Uuid::new_v4()));
        let mut config = AppConfig::default();
        config.storage.data_dir = dir.clone();

        let repo = Arc::new(JsonUserRepository::new(&dir));
        let app_state = AppState::new(config, repo).unwrap();
        web::Data::new(HttpState {
            app_state: Arc::new(app_state),
            logs: Arc::new(Mutex::new(Vec::new())),
        })
    }

    #[actix_web::test]
    async fn test_upload_merge_download() {
        let app =
            actix_test::init_service(App::new().app_data(test_state()).configure(routes)).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/tables/left")
            .set_payload("id,name\n1,A\n2,B\n")
            .to_request();
        let preview: TablePreview = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(preview.headers, vec!["id", "name"]);
        assert_eq!(preview.total_rows, 2);

        let req = actix_test::TestRequest::post()
            .uri("/api/tables/right")
            .set_payload("id,score\n1,10\n3,30\n")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = actix_test::TestRequest::post()
            .uri("/api/merge")
            .set_json(json!({ "join_type": "outer" }))
            .to_request();
        let summary: MergeSummary = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary.row_count, 3);
        assert_eq!(summary.preview.headers, vec!["id", "name", "score"]);

        let req = actix_test::TestRequest::get().uri("/api/merged/download").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert_eq!(disposition, "attachment; filename=\"merged_output.csv\"");
        let body = actix_test::read_body(resp).await;
        assert_eq!(&body[..], b"id,name,score\r\n1,A,10\r\n2,B,\r\n,,30\r\n");
    }

    #[actix_web::test]
    async fn test_merge_without_uploads_conflicts() {
        let app =
            actix_test::init_service(App::new().app_data(test_state()).configure(routes)).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/merge")
            .set_json(json!({}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = actix_test::TestRequest::get().uri("/api/merged/download").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_unknown_side_is_bad_request() {
        let app =
            actix_test::init_service(App::new().app_data(test_state()).configure(routes)).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/tables/middle")
            .set_payload("id\n1\n")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_selection_follows_uploads() {
        let app =
            actix_test::init_service(App::new().app_data(test_state()).configure(routes)).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/tables/right")
            .set_payload("country,gini\nCL,0.44\n")
            .to_request();
        actix_test::call_service(&app, req).await;

        let req = actix_test::TestRequest::get().uri("/api/selection").to_request();
        let selection: JoinSelection = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(selection.right_key, "country");

        let req = actix_test::TestRequest::get()
            .uri("/api/tables/right/preview?rows=0")
            .to_request();
        let preview: TablePreview = actix_test::call_and_read_body_json(&app, req).await;
        assert!(preview.rows.is_empty());
        assert_eq!(preview.total_rows, 1);
    }

    #[actix_web::test]
    async fn test_put_selection_drives_merge() {
        let app =
            actix_test::init_service(App::new().app_data(test_state()).configure(routes)).await;

        for (side, csv) in [("left", "id,name\n1,A\n"), ("right", "code,id\n1,X\n")] {
            let req = actix_test::TestRequest::post()
                .uri(&format!("/api/tables/{}", side))
                .set_payload(csv)
                .to_request();
            actix_test::call_service(&app, req).await;
        }

        let req = actix_test::TestRequest::put()
            .uri("/api/selection")
            .set_json(json!({ "right_key": "code", "join_type": "left" }))
            .to_request();
        let selection: JoinSelection = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(selection.left_key, "id");
        assert_eq!(selection.right_key, "code");

        let req = actix_test::TestRequest::post()
            .uri("/api/merge")
            .set_json(json!({}))
            .to_request();
        let summary: MergeSummary = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary.preview.headers, vec!["id", "name", "id_r"]);
        assert_eq!(summary.preview.rows, vec![vec!["1", "A", "X"]]);
    }

    #[actix_web::test]
    async fn test_auth_status() {
        let app =
            actix_test::init_service(App::new().app_data(test_state()).configure(routes)).await;

        let req = actix_test::TestRequest::get().uri("/api/auth/status").to_request();
        let status: AuthStatus = actix_test::call_and_read_body_json(&app, req).await;
        assert!(!status.authenticated);

        let req = actix_test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "demo@project.com", "password": "Dashboard123" }))
            .to_request();
        actix_test::call_service(&app, req).await;

        let req = actix_test::TestRequest::get().uri("/api/auth/status").to_request();
        let status: AuthStatus = actix_test::call_and_read_body_json(&app, req).await;
        assert!(status.authenticated);
    }

    #[actix_web::test]
    async fn test_demo_login_and_logout() {
        let app =
            actix_test::init_service(App::new().app_data(test_state()).configure(routes)).await;

        let req = actix_test::TestRequest::get().uri("/api/auth/me").to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = actix_test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "demo@project.com", "password": "Dashboard123" }))
            .to_request();
        let user: CurrentUser = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(user.name.as_deref(), Some("Demo User"));

        let req = actix_test::TestRequest::get().uri("/api/auth/me").to_request();
        assert!(actix_test::call_service(&app, req).await.status().is_success());

        let req = actix_test::TestRequest::post().uri("/api/auth/logout").to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = actix_test::TestRequest::get().uri("/api/auth/me").to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_logs_record_requests() {
        let state = test_state();
        let app =
            actix_test::init_service(App::new().app_data(state.clone()).configure(routes)).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/merge")
            .set_json(json!({}))
            .to_request();
        actix_test::call_service(&app, req).await;

        let req = actix_test::TestRequest::get().uri("/api/logs").to_request();
        let logs: Vec<LogEntry> = actix_test::call_and_read_body_json(&app, req).await;
        assert!(logs.iter().any(|l| l.level == "WARN" && l.source == "Merge"));
    }

    #[test]
    fn test_log_buffer_is_bounded() {
        let logs = Mutex::new(Vec::new());
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            add_log(&logs, "INFO", "Test", &i.to_string());
        }
        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(logs[0].message, "5");
    }
}
