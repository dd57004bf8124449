//! Filtro de notas por consulta regex sobre el nombre del fichero.
//!
//! Sólo se compara el nombre (no la ruta, ni el contenido, ni las etiquetas).

use regex::{Regex, RegexBuilder};

use crate::{error::LayResult, models::Document};

#[derive(Debug, Clone)]
pub struct QueryMatcher {
    regex: Regex,
}

impl QueryMatcher {
    /// Compila la consulta como regex sin distinguir mayúsculas.
    pub fn new(query: &str) -> LayResult<Self> {
        let regex = RegexBuilder::new(query).case_insensitive(true).build()?;
        Ok(Self { regex })
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.regex.is_match(&document.name)
    }

    /// Subsecuencia de `documents` que coincide, en el mismo orden.
    pub fn filter(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .filter(|doc| self.matches(doc))
            .cloned()
            .collect()
    }
}
