//! Carga y gestión de configuración de la aplicación (vault, servidor y canvas).

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

/// Nombre por defecto del canvas que se crea en cada ejecución.
pub const DEFAULT_CANVAS_NAME: &str = "New Canvas.canvas";

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub vault_dir: Option<PathBuf>,
    pub server_addr: String,
    pub canvas_name: String,
    pub settings_path: PathBuf,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env`, pero leyendo de una función arbitraria
    /// (útil en tests para no tocar el entorno del proceso).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vault_dir = lookup("VAULT_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let server_addr =
            lookup("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:3323".to_string());

        let canvas_name =
            lookup("CANVAS_NAME").unwrap_or_else(|| DEFAULT_CANVAS_NAME.to_string());
        if canvas_name.trim().is_empty() {
            return Err(anyhow!("CANVAS_NAME no puede estar vacío"));
        }

        let settings_path = match lookup("SETTINGS_PATH") {
            Some(p) => PathBuf::from(p),
            None => dirs::config_dir()
                .ok_or_else(|| {
                    anyhow!("No se pudo determinar el directorio de configuración; define SETTINGS_PATH")
                })?
                .join("canvas-scatter")
                .join("settings.json"),
        };

        Ok(Self {
            vault_dir,
            server_addr,
            canvas_name,
            settings_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_only_settings_path_is_set() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("SETTINGS_PATH", "/tmp/s.json")])).unwrap();
        assert_eq!(cfg.vault_dir, None);
        assert_eq!(cfg.server_addr, "127.0.0.1:3323");
        assert_eq!(cfg.canvas_name, DEFAULT_CANVAS_NAME);
        assert_eq!(cfg.settings_path, PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn reads_every_variable() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("VAULT_DIR", "/notes"),
            ("SERVER_ADDR", "0.0.0.0:9000"),
            ("CANVAS_NAME", "Mapa.canvas"),
            ("SETTINGS_PATH", "/tmp/s.json"),
        ]))
        .unwrap();
        assert_eq!(cfg.vault_dir, Some(PathBuf::from("/notes")));
        assert_eq!(cfg.server_addr, "0.0.0.0:9000");
        assert_eq!(cfg.canvas_name, "Mapa.canvas");
    }

    #[test]
    fn blank_vault_dir_is_ignored_and_blank_canvas_name_rejected() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("VAULT_DIR", "  "),
            ("SETTINGS_PATH", "/tmp/s.json"),
        ]))
        .unwrap();
        assert!(cfg.vault_dir.is_none());

        let err = AppConfig::from_lookup(lookup_from(&[
            ("CANVAS_NAME", " "),
            ("SETTINGS_PATH", "/tmp/s.json"),
        ]));
        assert!(err.is_err());
    }
}
