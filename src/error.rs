//! Errores del flujo "colocar notas en el canvas".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayError {
    /// La consulta no es una expresión regular válida.
    #[error("Consulta no válida: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("No se encontraron notas coincidentes.")]
    NoMatch,

    /// Ya existe un documento con el nombre del canvas; no se sobrescribe.
    #[error("Ya existe un documento llamado '{name}'")]
    DocumentCreateConflict { name: String },

    /// El nombre del documento está vacío o sale del vault (`..`, ruta absoluta).
    #[error("Nombre de documento no válido: '{name}'")]
    InvalidDocumentName { name: String },

    /// La vista abierta no admite insertar nodos. El canvas vacío se queda en el vault.
    #[error("No se pudo abrir la vista de canvas (tipo de vista: '{view_type}')")]
    ViewType { view_type: String },

    #[error("Consulta cancelada por el usuario.")]
    Cancelled,

    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error de serialización: {0}")]
    Json(#[from] serde_json::Error),
}

impl LayError {
    /// Resultados "esperados" que terminan el flujo sin fallo real.
    pub fn is_clean_end(&self) -> bool {
        matches!(self, Self::NoMatch | Self::Cancelled)
    }
}

pub type LayResult<T> = Result<T, LayError>;
