//! Avisos informativos para el usuario (no bloqueantes).

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::app_state::Status;

/// Máximo de avisos que se guardan para el frontend.
const MAX_NOTICES: usize = 50;

pub trait Notifier: Send + Sync {
    fn notice(&self, message: &str);
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Imprime los avisos en la salida estándar.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notice(&self, message: &str) {
        info!("Aviso: {message}");
        println!("{message}");
    }
}

/// Publica los avisos en el estado compartido que consulta el frontend.
pub struct StatusNotifier {
    status: Arc<Mutex<Status>>,
}

impl StatusNotifier {
    pub fn new(status: Arc<Mutex<Status>>) -> Self {
        Self { status }
    }
}

impl Notifier for StatusNotifier {
    fn notice(&self, message: &str) {
        info!("Aviso: {message}");
        let mut status = self.status.lock().unwrap();
        status.message = message.to_string();
        status.notices.push(Notice {
            at: Utc::now(),
            message: message.to_string(),
        });
        let excess = status.notices.len().saturating_sub(MAX_NOTICES);
        status.notices.drain(..excess);
    }
}

/// Acumula los avisos en memoria.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notice(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_notifier_keeps_the_latest_notices() {
        let status = Arc::new(Mutex::new(Status::default()));
        let notifier = StatusNotifier::new(status.clone());
        for i in 0..(MAX_NOTICES + 5) {
            notifier.notice(&format!("aviso {i}"));
        }

        let status = status.lock().unwrap();
        assert_eq!(status.notices.len(), MAX_NOTICES);
        assert_eq!(status.notices[0].message, "aviso 5");
        assert_eq!(status.message, format!("aviso {}", MAX_NOTICES + 4));
    }
}
