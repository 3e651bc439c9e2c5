mod logs;
mod multipart;
mod session;

pub use logs::{add_log, add_log_entry, LogEntry};
pub use session::SESSION_COOKIE;

use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::error::JsonPayloadError;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{
    delete, dev::Server, get, middleware, post, put, web, App, HttpRequest, HttpResponse,
    HttpServer,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use validator::{Validate, ValidationErrors};

use crate::application::use_cases::merge_service::FileSummary;
use crate::application::{MergeService, PresetService, TableService};
use crate::domain::error::{AppError, Result};
use crate::domain::preset::{ColumnSelector, Preset};
use crate::domain::session::SessionState;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::session_store::SessionStore;
use crate::infrastructure::storage::secure_filename;

const INDEX_HTML: &str = include_str!("../../../static/index.html");

pub struct HttpState {
    pub config: AppConfig,
    pub sessions: SessionStore,
    pub table_service: TableService,
    pub preset_service: PresetService,
    pub merge_service: MergeService,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl HttpState {
    /// Record a failed request and hand the error back for the response.
    fn fail(&self, source: &str, err: AppError) -> AppError {
        let level = if err.is_client_error() { "WARN" } else { "ERROR" };
        add_log(&self.logs, level, source, &err.to_string());
        err
    }

    /// Snapshot of an existing session, or `not_found` when there is none
    fn existing_session(&self, req: &HttpRequest, not_found: &str) -> Result<(String, SessionState)> {
        session::session_id(req)
            .and_then(|id| self.sessions.get(&id).map(|state| (id, state)))
            .ok_or_else(|| AppError::NotFound(not_found.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct MessageResponse<T: Serialize> {
    message: &'static str,
    #[serde(flatten)]
    payload: T,
}

fn ok_with<T: Serialize>(message: &'static str, payload: T) -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse { message, payload })
}

fn ok_message(message: &'static str) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "message": message }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ColumnsRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "No columns selected"))]
    pub columns: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SavePresetRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Preset name and columns are required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Preset name and columns are required"))]
    pub columns: Vec<Option<ColumnSelector>>,
    #[serde(default)]
    pub use_index: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePresetRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "At least one column must be selected"))]
    pub columns: Vec<Option<ColumnSelector>>,
    #[serde(default)]
    pub use_index: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyPresetRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Preset name not provided"))]
    pub preset_name: String,
}

fn validation_error(errors: ValidationErrors) -> AppError {
    let message = errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string());
    AppError::ValidationError(message)
}

/// Run CSV work off the async workers
async fn blocking<F, R>(f: F) -> Result<R>
where
    F: FnOnce() -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| AppError::Internal(format!("Background task failed: {}", e)))?
}

#[get("/")]
async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

#[post("/upload")]
async fn upload(
    data: web::Data<HttpState>,
    req: HttpRequest,
    payload: Multipart,
) -> Result<HttpResponse> {
    let max_bytes = data.config.max_upload_bytes;
    multipart::check_content_length(&req, max_bytes).map_err(|e| data.fail("Upload", e))?;

    let file = multipart::read_files(payload, "file", max_bytes)
        .await
        .map_err(|e| data.fail("Upload", e))?
        .into_iter()
        .next()
        .ok_or_else(|| data.fail("Upload", AppError::ValidationError("No file uploaded".into())))?;

    let id = session::session_id_or_new(&req);
    let mut state = data
        .sessions
        .get_or_create(&id)
        .map_err(|e| data.fail("Upload", e.with_context("Failed to process file")))?;

    let worker = data.clone();
    let (summary, state) = blocking(move || {
        let summary = worker.table_service.upload(&mut state, &file)?;
        Ok((summary, state))
    })
    .await
    .map_err(|e| data.fail("Upload", e.with_context("Failed to process file")))?;

    add_log(
        &data.logs,
        "INFO",
        "Upload",
        &format!(
            "Uploaded {} ({} rows, {} columns)",
            summary.filename,
            summary.total_rows,
            summary.columns.len()
        ),
    );
    data.sessions.save(&id, state);

    Ok(HttpResponse::Ok()
        .cookie(session::session_cookie(&id))
        .json(MessageResponse {
            message: "File uploaded successfully!",
            payload: summary,
        }))
}

#[post("/process")]
async fn process(
    data: web::Data<HttpState>,
    req: HttpRequest,
    body: web::Json<ColumnsRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    body.validate()
        .map_err(|e| data.fail("Process", validation_error(e)))?;

    let (id, mut state) = data
        .existing_session(&req, "File not found")
        .map_err(|e| data.fail("Process", e))?;

    let worker = data.clone();
    let (summary, state) = blocking(move || {
        let summary = worker.table_service.process(&mut state, &body.columns)?;
        Ok((summary, state))
    })
    .await
    .map_err(|e| data.fail("Process", e.with_context("Failed to process file")))?;

    add_log(
        &data.logs,
        "INFO",
        "Process",
        &format!(
            "Wrote {} ({} columns)",
            summary.filename, summary.stats.selection.num_columns
        ),
    );
    data.sessions.save(&id, state);

    Ok(ok_with("File processed successfully!", summary))
}

#[post("/stats")]
async fn stats(
    data: web::Data<HttpState>,
    req: HttpRequest,
    body: web::Json<ColumnsRequest>,
) -> Result<HttpResponse> {
    let (_, state) = data
        .existing_session(&req, "No file loaded")
        .map_err(|e| data.fail("Stats", e))?;
    let body = body.into_inner();
    body.validate()
        .map_err(|e| data.fail("Stats", validation_error(e)))?;

    let worker = data.clone();
    let stats = blocking(move || worker.table_service.stats(&state, &body.columns))
        .await
        .map_err(|e| data.fail("Stats", e.with_context("Failed to compute statistics")))?;

    Ok(ok_with("Statistics computed", stats))
}

#[derive(Serialize)]
struct PresetList {
    presets: Vec<Preset>,
}

#[get("/presets")]
async fn list_presets(data: web::Data<HttpState>) -> Result<HttpResponse> {
    let presets = data
        .preset_service
        .list()
        .await
        .map_err(|e| data.fail("Presets", e.with_context("Failed to load presets")))?;
    Ok(HttpResponse::Ok().json(PresetList { presets }))
}

#[post("/presets")]
async fn save_preset(
    data: web::Data<HttpState>,
    body: web::Json<SavePresetRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    body.validate()
        .map_err(|e| data.fail("Presets", validation_error(e)))?;

    let preset = data
        .preset_service
        .save(&body.name, body.columns, body.use_index)
        .await
        .map_err(|e| data.fail("Presets", e.with_context("Failed to save preset")))?;

    add_log(
        &data.logs,
        "INFO",
        "Presets",
        &format!("Saved preset {} ({} columns)", preset.name, preset.columns.len()),
    );
    Ok(ok_message("Preset saved successfully!"))
}

#[put("/presets/{name}")]
async fn update_preset(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    body: web::Json<UpdatePresetRequest>,
) -> Result<HttpResponse> {
    let name = path.into_inner();
    let body = body.into_inner();
    body.validate()
        .map_err(|e| data.fail("Presets", validation_error(e)))?;

    data.preset_service
        .update(&name, body.columns, body.use_index)
        .await
        .map_err(|e| data.fail("Presets", e.with_context("Failed to update preset")))?;

    add_log(&data.logs, "INFO", "Presets", &format!("Updated preset {}", name));
    Ok(ok_message("Preset updated successfully!"))
}

#[delete("/presets/{name}")]
async fn delete_preset(
    data: web::Data<HttpState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let name = path.into_inner();
    data.preset_service
        .delete(&name)
        .await
        .map_err(|e| data.fail("Presets", e.with_context("Failed to remove preset")))?;

    add_log(&data.logs, "INFO", "Presets", &format!("Removed preset {}", name));
    Ok(ok_message("Preset removed successfully!"))
}

#[derive(Serialize)]
struct ResolvedColumns {
    columns: Vec<String>,
}

#[post("/apply-preset")]
async fn apply_preset(
    data: web::Data<HttpState>,
    req: HttpRequest,
    body: web::Json<ApplyPresetRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    body.validate()
        .map_err(|e| data.fail("ApplyPreset", validation_error(e)))?;

    let preset = data
        .preset_service
        .find(&body.preset_name)
        .await
        .map_err(|e| data.fail("ApplyPreset", e))?;
    let (_, state) = data
        .existing_session(&req, "No file loaded")
        .map_err(|e| data.fail("ApplyPreset", e))?;

    let worker = data.clone();
    let columns = blocking(move || {
        let table = worker.table_service.current_table(&state)?;
        worker.preset_service.apply(&preset, &table)
    })
    .await
    .map_err(|e| data.fail("ApplyPreset", e))?;

    Ok(ok_with("Preset applied", ResolvedColumns { columns }))
}

#[derive(Serialize)]
struct ColumnInfo {
    column_info: Vec<FileSummary>,
}

#[post("/upload-multiple")]
async fn upload_multiple(
    data: web::Data<HttpState>,
    req: HttpRequest,
    payload: Multipart,
) -> Result<HttpResponse> {
    let max_bytes = data.config.max_upload_bytes;
    multipart::check_content_length(&req, max_bytes)
        .map_err(|e| data.fail("UploadMultiple", e))?;

    let files = multipart::read_files(payload, "files", max_bytes)
        .await
        .map_err(|e| data.fail("UploadMultiple", e))?;

    let id = session::session_id_or_new(&req);
    let mut state = data
        .sessions
        .get_or_create(&id)
        .map_err(|e| data.fail("UploadMultiple", e.with_context("Failed to process files")))?;

    let worker = data.clone();
    let (column_info, state) = blocking(move || {
        let summaries = worker.merge_service.upload_multiple(&mut state, &files)?;
        Ok((summaries, state))
    })
    .await
    .map_err(|e| data.fail("UploadMultiple", e.with_context("Failed to process files")))?;

    add_log(
        &data.logs,
        "INFO",
        "UploadMultiple",
        &format!("Registered {} files for merging", column_info.len()),
    );
    data.sessions.save(&id, state);

    Ok(HttpResponse::Ok()
        .cookie(session::session_cookie(&id))
        .json(MessageResponse {
            message: "Files processed successfully",
            payload: ColumnInfo { column_info },
        }))
}

#[post("/merge-files")]
async fn merge_files(data: web::Data<HttpState>, req: HttpRequest) -> Result<HttpResponse> {
    let (id, mut state) = data
        .existing_session(&req, "No files to merge")
        .map_err(|_| {
            data.fail(
                "Merge",
                AppError::ValidationError("No files to merge".to_string()),
            )
        })?;

    let worker = data.clone();
    let (summary, state) = blocking(move || {
        let summary = worker.merge_service.merge(&mut state)?;
        Ok((summary, state))
    })
    .await
    .map_err(|e| data.fail("Merge", e.with_context("Failed to merge files")))?;

    add_log(
        &data.logs,
        "INFO",
        "Merge",
        &format!(
            "Merged into {} ({} rows)",
            summary.filename, summary.stats.num_rows
        ),
    );
    data.sessions.save(&id, state);

    Ok(ok_with("Files merged successfully", summary))
}

#[get("/download/{filename}")]
async fn download(
    data: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let filename = path.into_inner();
    let not_found = |reason: String| {
        data.fail(
            "Download",
            AppError::NotFound(format!("Failed to download file: {}", reason)),
        )
    };

    if secure_filename(&filename) != filename || filename.is_empty() {
        return Err(not_found(format!("invalid file name {}", filename)));
    }
    let (_, state) = data
        .existing_session(&req, "no active session")
        .map_err(|e| not_found(e.message().to_string()))?;

    let bytes = tokio::fs::read(state.work_dir.join(&filename))
        .await
        .map_err(|e| not_found(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .body(bytes))
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> HttpResponse {
    HttpResponse::Ok().json(logs::snapshot(&data.logs))
}

fn json_config(max_bytes: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(max_bytes)
        .error_handler(move |err, _req| {
            let app_err = match err {
                JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                    multipart::too_large(max_bytes)
                }
                other => AppError::ValidationError(format!("Invalid JSON body: {}", other)),
            };
            app_err.into()
        })
}

/// Register every route; shared by the server and the tests.
pub fn routes(cfg: &mut web::ServiceConfig, max_body_bytes: usize) {
    cfg.app_data(json_config(max_body_bytes))
        .service(index)
        .service(upload)
        .service(process)
        .service(stats)
        .service(list_presets)
        .service(save_preset)
        .service(update_preset)
        .service(delete_preset)
        .service(apply_preset)
        .service(upload_multiple)
        .service(merge_files)
        .service(download)
        .service(get_logs);
}

pub fn start_server(state: web::Data<HttpState>) -> std::io::Result<Server> {
    let host = state.config.host.clone();
    let port = state.config.port;
    let max_body_bytes = state.config.max_upload_bytes;

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(|cfg| routes(cfg, max_body_bytes))
    })
    .bind((host.as_str(), port))?
    .run();

    Ok(server)
}
