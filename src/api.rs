use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::spawn;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::{
    app_state::{AppState, Status},
    canvas::{FsWorkspace, ScatterPlacer},
    models::{DirChoice, DirListing},
    notice::{Notice, StatusNotifier},
    prompt::{PromptInfo, WebPrompt},
    vault::Vault,
    workflow::{self, LayContext},
};

// --- Payloads y Respuestas de la API ---

#[derive(Deserialize)]
pub struct SelectDirPayload {
    path: String,
}

#[derive(Deserialize)]
pub struct PromptPayload {
    text: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    is_busy: bool,
    message: String,
    notices: Vec<Notice>,
    vault: Option<PathBuf>,
    prompt: Option<PromptInfo>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(code: StatusCode, message: &str) -> ApiError {
    (code, Json(json!({ "error": message })))
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/list-directory", post(list_directory_handler))
        .route("/api/select-vault", post(select_vault_handler))
        .route("/api/lay-on-canvas", post(lay_on_canvas_handler))
        .route("/api/prompt", post(prompt_submit_handler))
        .route("/api/prompt/cancel", post(prompt_cancel_handler))
        .route("/api/status", get(status_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

// --- Handlers ---

/// Subdirectorios y número de notas de una ruta (el home si viene vacía),
/// para que el frontend navegue hasta el vault.
#[axum::debug_handler]
async fn list_directory_handler(
    Json(payload): Json<SelectDirPayload>,
) -> Result<Json<DirListing>, ApiError> {
    let path = match payload.path.trim() {
        "" => dirs::home_dir().ok_or_else(|| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "No se pudo determinar el directorio home del usuario.",
            )
        })?,
        p => PathBuf::from(p),
    };

    if !path.is_dir() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "La ruta proporcionada no es un directorio válido.",
        ));
    }

    list_directory(&path).map(Json).map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Error al leer el directorio: {}", e),
        )
    })
}

#[axum::debug_handler]
async fn select_vault_handler(
    State(state): State<AppState>,
    Json(payload): Json<SelectDirPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let vault = Vault::open(&payload.path)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;

    info!("Vault seleccionado: {}", vault.root().display());
    *state.vault.lock().unwrap() = Some(vault);
    Ok(Json(json!({ "message": "Vault seleccionado." })))
}

/// Lanza el flujo en segundo plano. El frontend consulta `/api/status`
/// para ver el modal pendiente y los avisos.
#[axum::debug_handler]
async fn lay_on_canvas_handler(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let vault = state.vault.lock().unwrap().clone().ok_or_else(|| {
        api_error(StatusCode::BAD_REQUEST, "Primero debe seleccionar un vault.")
    })?;

    let busy = try_mark_busy(&state.status).ok_or_else(|| {
        api_error(StatusCode::CONFLICT, "Ya hay una ejecución en curso.")
    })?;

    let run_state = state.clone();
    let handle = spawn(async move {
        let state = run_state;
        let mut settings = state.settings.lock().unwrap().clone();
        let workspace = FsWorkspace::new(vault.clone());
        let mut prompt = WebPrompt::new(state.prompts.clone());
        let notifier = StatusNotifier::new(state.status.clone());
        let mut placer = ScatterPlacer::new(StdRng::from_rng(&mut rand::rng()));

        let result = workflow::lay_on_canvas(LayContext {
            vault: &vault,
            workspace: &workspace,
            prompt: &mut prompt,
            notifier: &notifier,
            placer: &mut placer,
            settings: &mut settings,
        })
        .await;

        *state.settings.lock().unwrap() = settings.clone();
        if let Err(e) = settings.save(&state.config.settings_path) {
            warn!("No se pudieron guardar los ajustes: {e:#}");
        }

        match result {
            Ok(summary) => state.status.lock().unwrap().message = format!("¡Listo! {}", summary),
            Err(err) if err.is_clean_end() => {}
            Err(err) => error!("Ejecución fallida: {}", err),
        }
        drop(busy);
    });
    *state.current_run.lock().unwrap() = Some(handle);

    Ok(StatusCode::ACCEPTED)
}

#[axum::debug_handler]
async fn prompt_submit_handler(
    State(state): State<AppState>,
    Json(payload): Json<PromptPayload>,
) -> Result<StatusCode, ApiError> {
    if state.prompts.submit(payload.text) {
        Ok(StatusCode::OK)
    } else {
        Err(api_error(StatusCode::NOT_FOUND, "No hay ninguna consulta pendiente."))
    }
}

#[axum::debug_handler]
async fn prompt_cancel_handler(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    if state.prompts.cancel() {
        Ok(StatusCode::OK)
    } else {
        Err(api_error(StatusCode::NOT_FOUND, "No hay ninguna consulta pendiente."))
    }
}

#[axum::debug_handler]
async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.status.lock().unwrap().clone();
    let vault = state
        .vault
        .lock()
        .unwrap()
        .as_ref()
        .map(|v| v.root().to_path_buf());
    Json(StatusResponse {
        is_busy: status.is_busy,
        message: status.message,
        notices: status.notices,
        vault,
        prompt: state.prompts.current(),
    })
}

// --- Handler de Apagado y Utilidades ---

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<AppState>) -> StatusCode {
    info!("Petición de apagado recibida.");
    // Un modal abierto dejaría la tarea esperando para siempre.
    state.prompts.cancel();
    if let Some(sender) = state.shutdown_sender.lock().unwrap().take() {
        let _ = sender.send(());
    }
    StatusCode::OK
}

/// Mientras vive, el estado figura como ocupado. Al soltarse (también si la
/// tarea entra en pánico) se libera.
struct BusyGuard {
    status: Arc<Mutex<Status>>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        status.is_busy = false;
    }
}

/// Marca el estado como ocupado si no lo estaba. `None` si ya lo estaba.
fn try_mark_busy(status: &Arc<Mutex<Status>>) -> Option<BusyGuard> {
    let mut current = status.lock().unwrap_or_else(PoisonError::into_inner);
    if current.is_busy {
        return None;
    }
    current.is_busy = true;
    current.message = "Esperando la consulta...".to_string();
    Some(BusyGuard {
        status: status.clone(),
    })
}

fn list_directory(path: &Path) -> std::io::Result<DirListing> {
    let mut note_count = 0;
    let mut subdirs = Vec::new();

    for entry in WalkDir::new(path).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        if entry.file_type().is_dir() {
            subdirs.push(DirChoice {
                name,
                path: entry.into_path(),
            });
        } else if name.to_lowercase().ends_with(".md") {
            note_count += 1;
        }
    }

    Ok(DirListing {
        path: path.to_path_buf(),
        parent: path.parent().map(Path::to_path_buf),
        note_count,
        subdirs,
    })
}
