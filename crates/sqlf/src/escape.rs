//! String-escaping capability injected into the renderer.

/// Connection-specific escaping for text embedded in SQL string literals.
///
/// The renderer never escapes string values itself; it delegates to whatever
/// implementation the caller injects, typically backed by the database
/// connection's native escaping primitive. Identifier quoting does not go
/// through this trait.
pub trait Escaper {
    fn escape(&self, raw: &str) -> String;
}

impl<F> Escaper for F
where
    F: Fn(&str) -> String,
{
    fn escape(&self, raw: &str) -> String {
        self(raw)
    }
}
