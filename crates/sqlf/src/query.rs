//! Query templates and their bound arguments.

use crate::arg::QueryArg;
use crate::error::Error;
use crate::escape::Escaper;
use crate::render::render_template;

/// A SQL template paired with its bound arguments.
///
/// Arguments are not validated at construction; a partial template may be
/// built up with [`Query::append`] and only checked when rendered.
#[derive(Debug, Clone)]
pub struct Query {
    text: String,
    params: Vec<QueryArg>,
    unsafe_query: bool,
}

impl Query {
    pub fn new(text: impl Into<String>, params: impl IntoIterator<Item = QueryArg>) -> Self {
        Self {
            text: text.into(),
            params: params.into_iter().collect(),
            unsafe_query: false,
        }
    }

    /// Construct a raw query that bypasses rendering entirely: `render`
    /// returns the text verbatim, with no escaping and no directive
    /// expansion. Don't use this unless you have pre-built, trusted SQL.
    pub fn unsafe_(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
            unsafe_query: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[QueryArg] {
        &self.params
    }

    pub fn is_unsafe(&self) -> bool {
        self.unsafe_query
    }

    /// Splice another query onto this one: template text and bound argument
    /// lists are concatenated in order, consuming `other`. The combined query
    /// renders exactly as if it had been built from the concatenated template.
    pub fn append(&mut self, other: Query) {
        self.text.push_str(&other.text);
        self.params.extend(other.params);
    }

    /// Splice bare template text, binding no arguments.
    pub fn append_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Render the template against the bound arguments.
    ///
    /// Passing `None` skips string escaping entirely (values pass through
    /// raw); that mode is for tests and trusted input only.
    pub fn render(&self, escaper: Option<&dyn Escaper>) -> Result<String, Error> {
        self.render_with(escaper, &self.params)
    }

    /// Render with `params` overriding the bound arguments for this call.
    pub fn render_with(
        &self,
        escaper: Option<&dyn Escaper>,
        params: &[QueryArg],
    ) -> Result<String, Error> {
        if self.unsafe_query {
            return Ok(self.text.clone());
        }

        render_template(&self.text, params, escaper)
    }
}
