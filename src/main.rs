// Módulos de la aplicación
mod api;
mod app_state;
mod canvas;
mod config;
mod error;
mod matcher;
mod models;
mod notice;
mod prompt;
mod settings;
mod vault;
mod workflow;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use axum::Router;
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::oneshot;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    app_state::{AppState, Status},
    canvas::{FsWorkspace, ScatterPlacer},
    config::AppConfig,
    notice::ConsoleNotifier,
    prompt::{PendingPrompts, PromptOutcome, TerminalPrompt, Prompt},
    settings::Settings,
    vault::Vault,
    workflow::LayContext,
};

/// Coloca en un canvas las notas del vault que coinciden con una consulta.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Arranca el servidor web con el frontend (por defecto).
    Serve,
    /// Ejecuta el flujo una vez desde la terminal.
    Lay {
        /// Directorio del vault (por defecto VAULT_DIR).
        #[arg(long)]
        vault: Option<PathBuf>,
        /// Consulta regex; si se omite, se pide por la terminal.
        #[arg(short, long)]
        query: Option<String>,
    },
}

/// Prompt que devuelve una consulta dada en la línea de comandos.
struct FixedPrompt(String);

impl Prompt for FixedPrompt {
    async fn request_text(&mut self, _title: &str, _default: Option<&str>) -> PromptOutcome {
        PromptOutcome::Submitted(self.0.clone())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let outcome = match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Lay { vault, query } => lay(vault, query).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_settings(cfg: &AppConfig) -> Settings {
    Settings::load_or(&cfg.settings_path, Settings::with_canvas_name(&cfg.canvas_name))
}

/// Una ejecución en la terminal. `NoMatch` y `Cancelled` no son fallos.
async fn lay(vault_dir: Option<PathBuf>, query: Option<String>) -> Result<()> {
    let cfg = AppConfig::from_env().context("Error al cargar la configuración")?;
    let root = vault_dir
        .or_else(|| cfg.vault_dir.clone())
        .ok_or_else(|| anyhow!("Indica el vault con --vault o VAULT_DIR"))?;
    let vault = Vault::open(root)?;
    let mut settings = load_settings(&cfg);

    let workspace = FsWorkspace::new(vault.clone());
    let mut placer = ScatterPlacer::new(StdRng::from_rng(&mut rand::rng()));
    let notifier = ConsoleNotifier;

    let result = match query {
        Some(q) => {
            workflow::lay_on_canvas(LayContext {
                vault: &vault,
                workspace: &workspace,
                prompt: &mut FixedPrompt(q),
                notifier: &notifier,
                placer: &mut placer,
                settings: &mut settings,
            })
            .await
        }
        None => {
            workflow::lay_on_canvas(LayContext {
                vault: &vault,
                workspace: &workspace,
                prompt: &mut TerminalPrompt::stdio(),
                notifier: &notifier,
                placer: &mut placer,
                settings: &mut settings,
            })
            .await
        }
    };

    if let Err(e) = settings.save(&cfg.settings_path) {
        warn!("No se pudieron guardar los ajustes: {e:#}");
    }

    match result {
        Ok(_) => Ok(()),
        Err(err) if err.is_clean_end() => Ok(()),
        Err(err) => Err(err.into()),
    }
}

async fn serve() -> Result<()> {
    // 2. Cargar configuración y ajustes
    let cfg = AppConfig::from_env().context("Error al cargar la configuración")?;
    let settings = load_settings(&cfg);

    // 3. Abrir el vault inicial, si está configurado
    let vault = match &cfg.vault_dir {
        Some(dir) => match Vault::open(dir) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("VAULT_DIR ignorado: {e}");
                None
            }
        },
        None => None,
    };

    // Crear canal para la señal de apagado.
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // 4. Crear estado compartido de la aplicación
    let app_state = AppState {
        config: cfg.clone(),
        vault: Arc::new(Mutex::new(vault)),
        settings: Arc::new(Mutex::new(settings)),
        status: Arc::new(Mutex::new(Status {
            is_busy: false,
            message: "Servidor listo.".to_string(),
            notices: Vec::new(),
        })),
        prompts: PendingPrompts::default(),
        current_run: Arc::new(Mutex::new(None)),
        shutdown_sender: Arc::new(Mutex::new(Some(shutdown_tx))),
    };

    // 5. Configurar el router de la API y el servicio de ficheros estáticos
    let app = Router::new()
        .merge(api::create_router(app_state.clone()))
        .fallback_service(ServeDir::new("frontend"))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 6. Iniciar el servidor
    let server_addr = &cfg.server_addr;
    let listener = tokio::net::TcpListener::bind(server_addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {server_addr}"))?;
    let server_url = format!("http://{}", server_addr);
    info!("🚀 Servidor escuchando en {}", &server_url);

    // Abrir el frontend en el navegador por defecto
    if webbrowser::open(&server_url).is_err() {
        info!("No se pudo abrir el navegador. Por favor, accede a {} manualmente.", server_url);
    }

    // Configurar el apagado ordenado.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await?;

    // 7. Esperar a la ejecución en curso antes de persistir los ajustes
    app_state.prompts.cancel();
    let running = app_state.current_run.lock().unwrap().take();
    if let Some(run) = running {
        if let Err(e) = run.await {
            warn!("La ejecución en curso terminó de forma anómala: {e}");
        }
    }
    let settings = app_state.settings.lock().unwrap().clone();
    settings.save(&cfg.settings_path)?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}
