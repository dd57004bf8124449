//! Vista de canvas y espacio de trabajo sobre el sistema de archivos.
//!
//! `FsWorkspace` abre documentos del vault en una vista nueva. Si la vista
//! es de tipo `canvas` se devuelve como `GraphView`, que permite insertar
//! nodos de fichero; cualquier otra vista se devuelve como `NotAGraph`.

use std::{fs, path::PathBuf};

use rand::Rng;
use tracing::{debug, info};

use crate::{
    error::LayResult,
    models::{CanvasDocument, CanvasNode, Document, Position},
    vault::Vault,
};

pub const CANVAS_VIEW_TYPE: &str = "canvas";
pub const MARKDOWN_VIEW_TYPE: &str = "markdown";

/// Extensión máxima (exclusiva) de las coordenadas aleatorias en ambos ejes.
pub const SCATTER_EXTENT: f64 = 1000.0;

/// Vista capaz de recibir nodos de fichero.
pub trait GraphView: Send {
    fn view_type(&self) -> &str;
    fn insert_file_node(&mut self, document: &Document, position: Position) -> LayResult<()>;
    /// Persiste el estado de la vista en su documento.
    fn save(&mut self) -> LayResult<()>;
}

/// Resultado de abrir un documento en una vista nueva.
pub enum OpenedView {
    Graph(Box<dyn GraphView>),
    NotAGraph { view_type: String },
}

pub trait Workspace {
    fn open_in_new_view(&self, document: &Document) -> LayResult<OpenedView>;
}

/// Tipo de vista declarado para un documento según su extensión.
pub fn view_type_for(document: &Document) -> String {
    match document.extension().as_deref() {
        Some("canvas") => CANVAS_VIEW_TYPE.to_string(),
        Some("md") => MARKDOWN_VIEW_TYPE.to_string(),
        Some(other) => other.to_string(),
        None => "empty".to_string(),
    }
}

/// Espacio de trabajo que abre los documentos directamente del disco.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    vault: Vault,
}

impl FsWorkspace {
    pub fn new(vault: Vault) -> Self {
        Self { vault }
    }
}

impl Workspace for FsWorkspace {
    fn open_in_new_view(&self, document: &Document) -> LayResult<OpenedView> {
        let view_type = view_type_for(document);
        debug!("Abriendo {} en una vista '{}'", document.path, view_type);
        if view_type != CANVAS_VIEW_TYPE {
            return Ok(OpenedView::NotAGraph { view_type });
        }
        let view = CanvasView::load(self.vault.absolute_path(document))?;
        Ok(OpenedView::Graph(Box::new(view)))
    }
}

/// Canvas cargado en memoria desde un fichero `.canvas`.
#[derive(Debug)]
pub struct CanvasView {
    path: PathBuf,
    canvas: CanvasDocument,
}

impl CanvasView {
    pub fn load(path: PathBuf) -> LayResult<Self> {
        let raw = fs::read_to_string(&path)?;
        let canvas: CanvasDocument = serde_json::from_str(&raw)?;
        Ok(Self { path, canvas })
    }

    #[cfg(test)]
    pub fn canvas(&self) -> &CanvasDocument {
        &self.canvas
    }
}

impl GraphView for CanvasView {
    fn view_type(&self) -> &str {
        CANVAS_VIEW_TYPE
    }

    fn insert_file_node(&mut self, document: &Document, position: Position) -> LayResult<()> {
        self.canvas.nodes.push(CanvasNode::file(document, position));
        Ok(())
    }

    fn save(&mut self) -> LayResult<()> {
        let json = serde_json::to_string_pretty(&self.canvas)?;
        fs::write(&self.path, json)?;
        info!(
            "Canvas guardado en {} ({} nodos)",
            self.path.display(),
            self.canvas.nodes.len()
        );
        Ok(())
    }
}

/// Posiciones uniformes en `[0, SCATTER_EXTENT)` en ambos ejes, sin evitar solapamientos.
pub struct ScatterPlacer<R: Rng> {
    rng: R,
}

impl<R: Rng> ScatterPlacer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn next_position(&mut self) -> Position {
        Position {
            x: self.rng.random_range(0.0..SCATTER_EXTENT),
            y: self.rng.random_range(0.0..SCATTER_EXTENT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EMPTY_CANVAS;
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::tempdir;

    #[test]
    fn view_type_follows_extension() {
        assert_eq!(view_type_for(&Document::new("a/New Canvas.canvas")), "canvas");
        assert_eq!(view_type_for(&Document::new("Apple.MD")), "markdown");
        assert_eq!(view_type_for(&Document::new("foto.png")), "png");
        assert_eq!(view_type_for(&Document::new("LEEME")), "empty");
    }

    #[test]
    fn placer_stays_inside_the_square() {
        let mut placer = ScatterPlacer::new(StdRng::seed_from_u64(7));
        for _ in 0..10_000 {
            let p = placer.next_position();
            assert!((0.0..SCATTER_EXTENT).contains(&p.x));
            assert!((0.0..SCATTER_EXTENT).contains(&p.y));
        }
    }

    #[test]
    fn workspace_opens_canvas_as_graph_and_markdown_as_not_a_graph() {
        let dir = tempdir().unwrap();
        let vault = Vault::open(dir.path()).unwrap();
        let canvas_doc = vault.create("Mapa.canvas", EMPTY_CANVAS).unwrap();
        let note = vault.create("Nota.md", "# hola").unwrap();
        let workspace = FsWorkspace::new(vault);

        match workspace.open_in_new_view(&canvas_doc).unwrap() {
            OpenedView::Graph(view) => assert_eq!(view.view_type(), "canvas"),
            OpenedView::NotAGraph { view_type } => panic!("vista inesperada: {view_type}"),
        }
        match workspace.open_in_new_view(&note).unwrap() {
            OpenedView::NotAGraph { view_type } => assert_eq!(view_type, "markdown"),
            OpenedView::Graph(_) => panic!("una nota no es un canvas"),
        }
    }

    #[test]
    fn inserted_nodes_are_persisted_on_save() {
        let dir = tempdir().unwrap();
        let vault = Vault::open(dir.path()).unwrap();
        let doc = vault.create("Mapa.canvas", EMPTY_CANVAS).unwrap();
        let path = vault.absolute_path(&doc);

        let mut view = CanvasView::load(path.clone()).unwrap();
        view.insert_file_node(&Document::new("Apple.md"), Position { x: 1.0, y: 2.0 })
            .unwrap();
        view.insert_file_node(&Document::new("b/Banana.md"), Position { x: 3.0, y: 4.0 })
            .unwrap();
        assert_eq!(view.canvas().nodes.len(), 2);
        view.save().unwrap();

        let stored: CanvasDocument =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        let files: Vec<_> = stored.nodes.iter().map(|n| n.file.clone().unwrap()).collect();
        assert_eq!(files, vec!["Apple.md", "b/Banana.md"]);
        assert_eq!(stored.nodes[1].x, 3.0);
        assert!(stored.edges.is_empty());
    }

    #[test]
    fn loading_a_corrupt_canvas_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roto.canvas");
        fs::write(&path, "no es json").unwrap();
        assert!(CanvasView::load(path).is_err());
    }
}
