//! Flujo principal: pedir consulta → filtrar notas → crear canvas → colocar nodos.

use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::{
    canvas::{OpenedView, ScatterPlacer, Workspace},
    error::{LayError, LayResult},
    matcher::QueryMatcher,
    models::{Document, EMPTY_CANVAS},
    notice::Notifier,
    prompt::{Prompt, PromptOutcome, QUERY_PROMPT_TITLE},
    settings::Settings,
    vault::Vault,
};

/// Resumen de una ejecución completada.
#[derive(Debug, Clone)]
pub struct LaySummary {
    pub query: String,
    pub canvas: Document,
    pub nodes_added: usize,
}

impl std::fmt::Display for LaySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} notas añadidas a '{}' (consulta: '{}').",
            self.nodes_added, self.canvas.path, self.query
        )
    }
}

/// Colaboradores del flujo. La consulta se pide con `prompt`; los avisos
/// van a `notifier`; `settings` aporta el nombre del canvas y guarda la
/// última consulta.
pub struct LayContext<'a, P, W, R: Rng> {
    pub vault: &'a Vault,
    pub workspace: &'a W,
    pub prompt: &'a mut P,
    pub notifier: &'a dyn Notifier,
    pub placer: &'a mut ScatterPlacer<R>,
    pub settings: &'a mut Settings,
}

/// Ejecuta el flujo completo. Cualquier error se comunica también al usuario
/// como aviso; no hay reintentos ni se borra el canvas si falla un paso posterior.
pub async fn lay_on_canvas<P, W, R>(ctx: LayContext<'_, P, W, R>) -> LayResult<LaySummary>
where
    P: Prompt,
    W: Workspace,
    R: Rng,
{
    let notifier = ctx.notifier;
    let result = run(ctx).await;
    if let Err(err) = &result {
        if err.is_clean_end() {
            warn!("Ejecución terminada sin canvas: {err}");
        } else {
            error!("Error colocando notas en el canvas: {err}");
        }
        notifier.notice(&err.to_string());
    }
    result
}

async fn run<P, W, R>(ctx: LayContext<'_, P, W, R>) -> LayResult<LaySummary>
where
    P: Prompt,
    W: Workspace,
    R: Rng,
{
    let LayContext {
        vault,
        workspace,
        prompt,
        notifier,
        placer,
        settings,
    } = ctx;

    // 1) Consulta
    let query = obtain_query(prompt, settings.last_query.as_deref()).await?;
    settings.last_query = Some(query.clone());
    let matcher = QueryMatcher::new(&query)?;

    // 2) Filtrado
    let documents = vault.list_markdown_files();
    let matching = matcher.filter(&documents);
    let Some(first) = matching.first() else {
        return Err(LayError::NoMatch);
    };
    notifier.notice(&format!(
        "{} notas encontradas. P. ej. {}",
        matching.len(),
        first.path
    ));
    debug!("Notas coincidentes: {:?}", matching);

    // 3) Canvas
    let canvas = vault.create(&settings.canvas_file_name(), EMPTY_CANVAS)?;
    let nodes_added = populate(workspace, &canvas, &matching, placer)?;

    notifier.notice(&format!("{nodes_added} notas añadidas al canvas."));
    let summary = LaySummary {
        query,
        canvas,
        nodes_added,
    };
    info!("{summary}");
    Ok(summary)
}

async fn obtain_query<P: Prompt>(prompt: &mut P, default: Option<&str>) -> LayResult<String> {
    match prompt.request_text(QUERY_PROMPT_TITLE, default).await {
        PromptOutcome::Submitted(text) => Ok(text.trim().to_string()),
        PromptOutcome::Cancelled => Err(LayError::Cancelled),
    }
}

/// Abre el canvas y añade un nodo por nota, en el orden del filtrado.
fn populate<W, R>(
    workspace: &W,
    canvas: &Document,
    documents: &[Document],
    placer: &mut ScatterPlacer<R>,
) -> LayResult<usize>
where
    W: Workspace,
    R: Rng,
{
    let mut view = match workspace.open_in_new_view(canvas)? {
        OpenedView::Graph(view) => view,
        OpenedView::NotAGraph { view_type } => {
            return Err(LayError::ViewType { view_type });
        }
    };
    debug!("Vista '{}' abierta para {}", view.view_type(), canvas.path);

    for document in documents {
        view.insert_file_node(document, placer.next_position())?;
    }
    view.save()?;
    Ok(documents.len())
}
