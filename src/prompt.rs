//! Petición de texto al usuario.
//!
//! El flujo se suspende en `request_text` hasta que el usuario envía la
//! consulta o cierra el diálogo. Cerrar el diálogo (EOF en terminal, botón
//! "Cancelar" en el frontend) resuelve como `Cancelled`.

use std::future::Future;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::oneshot;
use tracing::{debug, warn};

pub const QUERY_PROMPT_TITLE: &str = "Introduce una Regex o etiqueta para buscar notas:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Submitted(String),
    Cancelled,
}

pub trait Prompt {
    /// `default` es el valor que se ofrece prerrellenado (la última consulta).
    fn request_text(
        &mut self,
        title: &str,
        default: Option<&str>,
    ) -> impl Future<Output = PromptOutcome> + Send;
}

// --- Terminal ---

/// Prompt por líneas: escribe el título y lee una línea.
/// Una línea vacía toma el valor por defecto; EOF cancela.
pub struct LinePrompt<R, W> {
    reader: R,
    writer: W,
}

pub type TerminalPrompt = LinePrompt<BufReader<Stdin>, Stdout>;

impl TerminalPrompt {
    pub fn stdio() -> Self {
        LinePrompt::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LinePrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R, W> Prompt for LinePrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn request_text(&mut self, title: &str, default: Option<&str>) -> PromptOutcome {
        let header = match default {
            Some(d) if !d.is_empty() => format!("{title} [{d}] "),
            _ => format!("{title} "),
        };
        if let Err(e) = self.writer.write_all(header.as_bytes()).await {
            warn!("No se pudo escribir el prompt: {e}");
        }
        if let Err(e) = self.writer.flush().await {
            warn!("No se pudo vaciar la salida del prompt: {e}");
        }

        let mut line = String::new();
        match self.reader.read_line(&mut line).await {
            Ok(0) => PromptOutcome::Cancelled,
            Ok(_) => {
                let text = line.trim_end_matches(['\r', '\n']);
                match default {
                    Some(d) if text.trim().is_empty() => PromptOutcome::Submitted(d.to_string()),
                    _ => PromptOutcome::Submitted(text.to_string()),
                }
            }
            Err(e) => {
                warn!("Error leyendo la entrada del usuario: {e}");
                PromptOutcome::Cancelled
            }
        }
    }
}

// --- Frontend web ---

struct PendingPrompt {
    title: String,
    default: Option<String>,
    responder: oneshot::Sender<PromptOutcome>,
}

/// Información del modal pendiente que se envía al frontend.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PromptInfo {
    pub title: String,
    pub default: Option<String>,
}

/// Ranura compartida entre el flujo (que espera) y la API (que responde).
#[derive(Clone, Default)]
pub struct PendingPrompts {
    slot: Arc<Mutex<Option<PendingPrompt>>>,
}

impl PendingPrompts {
    pub fn current(&self) -> Option<PromptInfo> {
        self.slot.lock().unwrap().as_ref().map(|p| PromptInfo {
            title: p.title.clone(),
            default: p.default.clone(),
        })
    }

    /// Envía el texto al flujo que espera. Devuelve `false` si no había modal abierto.
    pub fn submit(&self, text: String) -> bool {
        self.resolve(PromptOutcome::Submitted(text))
    }

    pub fn cancel(&self) -> bool {
        self.resolve(PromptOutcome::Cancelled)
    }

    fn resolve(&self, outcome: PromptOutcome) -> bool {
        let pending = self.slot.lock().unwrap().take();
        match pending {
            Some(p) => {
                debug!("Modal '{}' resuelto: {:?}", p.title, outcome);
                // Si el flujo ya no espera, no hay nada más que hacer.
                let _ = p.responder.send(outcome);
                true
            }
            None => false,
        }
    }
}

/// Prompt que publica un modal pendiente y espera la respuesta del frontend.
pub struct WebPrompt {
    pending: PendingPrompts,
}

impl WebPrompt {
    pub fn new(pending: PendingPrompts) -> Self {
        Self { pending }
    }
}

impl Prompt for WebPrompt {
    async fn request_text(&mut self, title: &str, default: Option<&str>) -> PromptOutcome {
        let (tx, rx) = oneshot::channel();
        let previous = self.pending.slot.lock().unwrap().replace(PendingPrompt {
            title: title.to_string(),
            default: default.map(str::to_string),
            responder: tx,
        });
        if let Some(old) = previous {
            let _ = old.responder.send(PromptOutcome::Cancelled);
        }

        rx.await.unwrap_or(PromptOutcome::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    /// Salida que siempre falla, como una terminal cerrada.
    struct BrokenWriter;

    impl AsyncWrite for BrokenWriter {
        fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "cerrada")))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "cerrada")))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn line_prompt_still_reads_when_the_output_fails() {
        let outcome = LinePrompt::new(&b"^ap\n"[..], BrokenWriter)
            .request_text("Consulta:", None)
            .await;
        assert_eq!(outcome, PromptOutcome::Submitted("^ap".to_string()));
    }

    #[tokio::test]
    async fn line_prompt_returns_the_typed_line() {
        let mut out = Vec::new();
        let outcome = LinePrompt::new(&b"  ^ap  \n"[..], &mut out)
            .request_text("Consulta:", None)
            .await;
        assert_eq!(outcome, PromptOutcome::Submitted("  ^ap  ".to_string()));
        assert_eq!(String::from_utf8(out).unwrap(), "Consulta: ");
    }

    #[tokio::test]
    async fn line_prompt_uses_default_on_blank_line_and_cancels_on_eof() {
        let mut out = Vec::new();
        let outcome = LinePrompt::new(&b"\n"[..], &mut out)
            .request_text("Consulta:", Some("apple"))
            .await;
        assert_eq!(outcome, PromptOutcome::Submitted("apple".to_string()));
        assert_eq!(String::from_utf8(out).unwrap(), "Consulta: [apple] ");

        let outcome = LinePrompt::new(&b""[..], Vec::new())
            .request_text("Consulta:", Some("apple"))
            .await;
        assert_eq!(outcome, PromptOutcome::Cancelled);
    }

    async fn wait_for_modal(pending: &PendingPrompts) -> PromptInfo {
        for _ in 0..200 {
            if let Some(info) = pending.current() {
                return info;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("el modal nunca se publicó");
    }

    #[tokio::test]
    async fn web_prompt_waits_for_submit() {
        let pending = PendingPrompts::default();
        let mut prompt = WebPrompt::new(pending.clone());
        let task = tokio::spawn(async move { prompt.request_text("Título", Some("ap")).await });

        let info = wait_for_modal(&pending).await;
        assert_eq!(info.title, "Título");
        assert_eq!(info.default.as_deref(), Some("ap"));

        assert!(pending.submit("^ap".to_string()));
        assert_eq!(task.await.unwrap(), PromptOutcome::Submitted("^ap".to_string()));
        assert!(pending.current().is_none());
        assert!(!pending.submit("otra".to_string()));
    }

    #[tokio::test]
    async fn web_prompt_resolves_cancelled_on_dismiss() {
        let pending = PendingPrompts::default();
        let mut prompt = WebPrompt::new(pending.clone());
        let task = tokio::spawn(async move { prompt.request_text("Título", None).await });

        wait_for_modal(&pending).await;
        assert!(pending.cancel());
        assert_eq!(task.await.unwrap(), PromptOutcome::Cancelled);
        assert!(!pending.cancel());
    }
}
