//! Rendering a sequence of queries as one multi-statement string.

use crate::error::Error;
use crate::escape::Escaper;
use crate::query::Query;

/// A sequence of queries rendered back-to-back, joined with `;`.
#[derive(Debug, Clone, Default)]
pub struct MultiQuery {
    queries: Vec<Query>,
    unsafe_multi_query: Option<String>,
}

impl MultiQuery {
    pub fn new(queries: impl IntoIterator<Item = Query>) -> Self {
        Self {
            queries: queries.into_iter().collect(),
            unsafe_multi_query: None,
        }
    }

    /// Construct a raw multi-query whose text is returned verbatim from
    /// `render`, bypassing all statement rendering.
    pub fn unsafe_(text: impl Into<String>) -> Self {
        Self {
            queries: Vec::new(),
            unsafe_multi_query: Some(text.into()),
        }
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    pub fn get(&self, index: usize) -> Option<&Query> {
        self.queries.get(index)
    }

    /// Render every statement and join them with `;`. No trailing `;` is
    /// added after the final statement.
    pub fn render(&self, escaper: Option<&dyn Escaper>) -> Result<String, Error> {
        if let Some(raw) = &self.unsafe_multi_query {
            return Ok(raw.clone());
        }

        let mut out = String::new();
        for query in &self.queries {
            if !out.is_empty() {
                out.push(';');
            }
            out.push_str(&query.render(escaper)?);
        }

        Ok(out)
    }
}
