//! Modelos de dominio (documentos del vault y nodos del canvas).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use uuid::Uuid;

/// Contenido inicial de un canvas recién creado.
pub const EMPTY_CANVAS: &str = r#"{"nodes":[],"edges":[]}"#;

/// Tamaño por defecto de un nodo de fichero en el canvas.
pub const FILE_NODE_WIDTH: f64 = 400.0;
pub const FILE_NODE_HEIGHT: f64 = 400.0;

/// Una nota del vault.
/// `path` es relativo a la raíz del vault y usa `/` como separador;
/// `name` es el nombre del fichero con su extensión.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub path: String,
    pub name: String,
}

impl Document {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self { path, name }
    }

    /// Extensión en minúsculas, sin el punto.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Un nodo del canvas. Sólo se modelan los campos que usamos; el resto
/// (color, texto, url...) se conserva tal cual en `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CanvasNode {
    /// Crea un nodo (`type: "file"`) que referencia una nota del vault.
    pub fn file(document: &Document, position: Position) -> Self {
        Self {
            id: new_node_id(),
            node_type: "file".to_string(),
            file: Some(document.path.clone()),
            x: position.x,
            y: position.y,
            width: FILE_NODE_WIDTH,
            height: FILE_NODE_HEIGHT,
            extra: Map::new(),
        }
    }
}

/// Documento de canvas: dos colecciones ordenadas, nodos y aristas.
/// Las aristas no se interpretan, sólo se conservan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasDocument {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<Value>,
}

/// Identificador de nodo: 16 dígitos hexadecimales, como los que genera el editor de canvas.
fn new_node_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

/// Contenido de un directorio, para elegir el vault desde el frontend.
#[derive(Debug, Clone, Serialize)]
pub struct DirListing {
    pub path: PathBuf,
    pub parent: Option<PathBuf>,
    /// Notas markdown directamente en este directorio.
    pub note_count: usize,
    pub subdirs: Vec<DirChoice>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DirChoice {
    pub name: String,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_name_is_last_path_segment() {
        let doc = Document::new("daily/2024/Apple.md");
        assert_eq!(doc.name, "Apple.md");
        assert_eq!(doc.extension().as_deref(), Some("md"));

        let root = Document::new("New Canvas.canvas");
        assert_eq!(root.name, "New Canvas.canvas");
        assert_eq!(root.extension().as_deref(), Some("canvas"));
    }

    #[test]
    fn empty_canvas_parses_to_empty_collections() {
        let canvas: CanvasDocument = serde_json::from_str(EMPTY_CANVAS).unwrap();
        assert!(canvas.nodes.is_empty());
        assert!(canvas.edges.is_empty());
    }

    #[test]
    fn file_node_serializes_in_canvas_shape() {
        let doc = Document::new("notes/Apple.md");
        let node = CanvasNode::file(&doc, Position { x: 12.5, y: 999.0 });
        assert_eq!(node.id.len(), 16);
        assert!(node.id.chars().all(|c| c.is_ascii_hexdigit()));

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "file");
        assert_eq!(value["file"], "notes/Apple.md");
        assert_eq!(value["x"], 12.5);
        assert_eq!(value["y"], 999.0);
        assert_eq!(value["width"], 400.0);
    }

    #[test]
    fn unknown_node_fields_survive_a_round_trip() {
        let raw = r#"{"nodes":[{"id":"a","type":"text","text":"hola","x":0,"y":0,"width":10,"height":10}],"edges":[{"id":"e","fromNode":"a","toNode":"a"}]}"#;
        let canvas: CanvasDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(canvas.nodes[0].extra["text"], "hola");
        assert_eq!(canvas.nodes[0].file, None);

        let back = serde_json::to_value(&canvas).unwrap();
        assert_eq!(back["nodes"][0]["text"], "hola");
        assert_eq!(back["edges"][0]["fromNode"], "a");
    }
}
