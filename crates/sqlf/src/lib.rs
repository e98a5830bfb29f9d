//! printf-style SQL statement formatting with typed arguments.
//!
//! Build a [`Query`] from a template containing `%` directives plus a list of
//! [`QueryArg`] values, then render it to a single SQL string with every
//! argument quoted, escaped, or structurally expanded. String escaping is
//! delegated to an injected [`Escaper`]; passing `None` skips escaping, which
//! is only acceptable for tests and trusted input.
//!
//! # Directives
//!
//! | Directive | Argument | Renders as |
//! |---|---|---|
//! | `%d` `%s` `%f` `%u` | Int / String / Double / Int | the value, quoted and escaped per its tag |
//! | `%m` | any scalar or Null | same as above |
//! | `%K` | scalar | a `/* ... */` comment with terminators broken up |
//! | `%T` `%C` | String, TwoTuple, ThreeTuple | back-tick quoted identifier |
//! | `%=d` `%=s` `%=f` `%=u` `%=m` | scalar or Null | ` = value`, or ` IS NULL` |
//! | `%V` | List of equal-width Lists | `(a, b), (c, d), ...` |
//! | `%Ld` `%Ls` `%Lf` `%Lu` `%Lm` | List | comma-joined values |
//! | `%LC` | List of identifiers | comma-joined quoted identifiers |
//! | `%La` `%Lo` | PairList | parenthesized `key = value` clauses joined with ` AND `/` OR ` |
//! | `%U` `%W` | PairList | `key = value` clauses joined with `, ` / ` AND ` |
//! | `%Q` | Query (or scalar) | the sub-query rendered and inlined |
//! | `%%` | — | a literal `%` |
//!
//! # Example
//!
//! ```
//! use sqlf::{Query, QueryArg};
//!
//! let query = Query::new(
//!     "SELECT %LC FROM %T WHERE %W",
//!     [
//!         QueryArg::list([QueryArg::string("id"), QueryArg::string("name")]),
//!         QueryArg::string("user"),
//!         QueryArg::pair_list([("active", QueryArg::bool(true))]),
//!     ],
//! );
//! assert_eq!(
//!     query.render(None).unwrap(),
//!     "SELECT `id`, `name` FROM `user` WHERE `active` = TRUE",
//! );
//! ```

mod arg;
mod error;
mod escape;
mod multi;
mod query;
mod render;

pub use arg::{ArgType, QueryArg};
pub use error::Error;
pub use escape::Escaper;
pub use multi::MultiQuery;
pub use query::Query;

/// Render `template` against `params` with no connection escaper.
///
/// Shorthand for one-off formatting where the caller escapes separately or
/// trusts the input.
pub fn queryf(
    template: &str,
    params: impl IntoIterator<Item = QueryArg>,
) -> Result<String, Error> {
    Query::new(template, params).render(None)
}
