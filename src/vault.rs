//! Acceso al vault: un directorio con notas markdown.
//!
//! Hace de colección de documentos (listado de notas) y de creador de
//! documentos nuevos (el canvas).

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Component, Path, PathBuf},
};

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{
    error::{LayError, LayResult},
    models::Document,
};

#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(anyhow!("La ruta no es un directorio: {}", root.display()));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Todas las notas markdown del vault, recorriendo subdirectorios en
    /// orden de nombre. Los directorios ocultos (`.obsidian`, `.trash`...) se omiten.
    pub fn list_markdown_files(&self) -> Vec<Document> {
        let documents: Vec<Document> = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("Saltando entrada ilegible del vault: {err}");
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(std::ffi::OsStr::to_str)
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
            })
            .filter_map(|e| self.document_for(e.path()))
            .collect();

        debug!("{} notas markdown en {}", documents.len(), self.root.display());
        documents
    }

    /// Crea un documento nuevo con el contenido dado.
    /// Falla con `DocumentCreateConflict` si ya existe; nunca sobrescribe.
    pub fn create(&self, name: &str, content: &str) -> LayResult<Document> {
        let rel = normalize_rel_path(name).ok_or_else(|| LayError::InvalidDocumentName {
            name: name.to_string(),
        })?;
        let abs = self.root.join(&rel);
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&abs) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(LayError::DocumentCreateConflict { name: rel });
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(content.as_bytes())?;

        info!("Documento creado: {}", abs.display());
        Ok(Document::new(rel))
    }

    pub fn absolute_path(&self, document: &Document) -> PathBuf {
        self.root.join(&document.path)
    }

    fn document_for(&self, path: &Path) -> Option<Document> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Some(Document::new(rel))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

/// Ruta relativa con `/`, sin `..` ni componentes absolutos.
fn normalize_rel_path(name: &str) -> Option<String> {
    let mut parts = Vec::new();
    for component in Path::new(name.trim()).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
