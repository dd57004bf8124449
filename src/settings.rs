//! Ajustes entre ejecuciones.
//!
//! El nombre del canvas lo fija siempre la configuración (`CANVAS_NAME`);
//! en disco sólo se guarda lo que cambia de una ejecución a otra (la última
//! consulta). Se cargan al arrancar y se guardan al cerrar y tras cada ejecución.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Nombre del canvas que se crea en cada ejecución. No se persiste.
    #[serde(skip)]
    pub canvas_name: String,
    /// Última consulta enviada; se ofrece como valor por defecto.
    #[serde(default)]
    pub last_query: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_canvas_name(crate::config::DEFAULT_CANVAS_NAME)
    }
}

impl Settings {
    pub fn with_canvas_name(canvas_name: &str) -> Self {
        Self {
            canvas_name: canvas_name.to_string(),
            last_query: None,
        }
    }

    /// Carga el estado guardado en `path` sobre `base`, que aporta el nombre del canvas.
    /// Si el fichero no existe o no se puede leer, devuelve `base` tal cual.
    pub fn load_or(path: &Path, base: Settings) -> Settings {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Sin ajustes guardados en {}; usando valores por defecto.", path.display());
                return base;
            }
            Err(e) => {
                warn!("No se pudieron leer los ajustes de {}: {e}", path.display());
                return base;
            }
        };
        match serde_json::from_str::<Settings>(&raw) {
            Ok(stored) => Settings {
                last_query: stored.last_query,
                ..base
            },
            Err(e) => {
                warn!("Ajustes dañados en {}: {e}. Usando valores por defecto.", path.display());
                base
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creando {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("guardando ajustes en {}", path.display()))?;
        info!("Ajustes guardados en {}", path.display());
        Ok(())
    }

    /// Nombre del canvas con la extensión `.canvas` asegurada.
    pub fn canvas_file_name(&self) -> String {
        let name = self.canvas_name.trim();
        if name.to_lowercase().ends_with(".canvas") {
            name.to_string()
        } else {
            format!("{name}.canvas")
        }
    }
}
