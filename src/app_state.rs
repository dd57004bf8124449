use std::sync::{Arc, Mutex};
use tokio::{sync::oneshot, task::JoinHandle};
use crate::{config::AppConfig, notice::Notice, prompt::PendingPrompts, settings::Settings, vault::Vault};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub vault: Arc<Mutex<Option<Vault>>>,
    pub settings: Arc<Mutex<Settings>>,
    pub status: Arc<Mutex<Status>>,
    pub prompts: PendingPrompts,
    /// Tarea de la ejecución en curso (o de la última), para esperarla al cerrar.
    pub current_run: Arc<Mutex<Option<JoinHandle<()>>>>,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Status {
    pub is_busy: bool,
    pub message: String,
    pub notices: Vec<Notice>,
}
