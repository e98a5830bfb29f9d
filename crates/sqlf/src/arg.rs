//! Typed query arguments.

use std::fmt;

use indexmap::IndexMap;

use crate::error::Error;
use crate::query::Query;

/// A value bound to a `%` directive in a query template.
///
/// Exactly one variant per accepted argument kind; the renderer dispatches on
/// the tag and checks it against the directive that consumes it.
#[derive(Debug, Clone)]
pub enum QueryArg {
    String(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    Null,
    /// An owned sub-query, inlined by `%Q` or any value directive.
    Query(Query),
    /// Ordered values, consumed by `%V` rows and `%Ld`/`%Ls`/`%Lf`/`%Lu`/`%LC`.
    List(Vec<QueryArg>),
    /// Ordered (identifier, value) pairs; insertion order is rendering order.
    /// Consumed by `%U`, `%W`, `%La` and `%Lo`.
    PairList(Vec<(String, QueryArg)>),
    /// Qualified identifier: table.column.
    TwoTuple(String, String),
    /// Qualified identifier with alias: table.column AS alias.
    ThreeTuple(String, String, String),
}

/// The tag of a [`QueryArg`], used in type checks and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    String,
    Int,
    Double,
    Bool,
    Null,
    Query,
    List,
    PairList,
    TwoTuple,
    ThreeTuple,
}

impl ArgType {
    pub fn as_str(self) -> &'static str {
        match self {
            ArgType::String => "string",
            ArgType::Int => "int",
            ArgType::Double => "double",
            ArgType::Bool => "bool",
            ArgType::Null => "null",
            ArgType::Query => "query",
            ArgType::List => "list",
            ArgType::PairList => "pair_list",
            ArgType::TwoTuple => "two_tuple",
            ArgType::ThreeTuple => "three_tuple",
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Convenience constructors
impl QueryArg {
    pub fn string(value: impl Into<String>) -> Self {
        QueryArg::String(value.into())
    }

    pub fn int(value: i64) -> Self {
        QueryArg::Int(value)
    }

    pub fn double(value: f64) -> Self {
        QueryArg::Double(value)
    }

    pub fn bool(value: bool) -> Self {
        QueryArg::Bool(value)
    }

    pub fn null() -> Self {
        QueryArg::Null
    }

    pub fn query(query: Query) -> Self {
        QueryArg::Query(query)
    }

    pub fn list(items: impl IntoIterator<Item = QueryArg>) -> Self {
        QueryArg::List(items.into_iter().collect())
    }

    pub fn pair_list<K: Into<String>>(pairs: impl IntoIterator<Item = (K, QueryArg)>) -> Self {
        QueryArg::PairList(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    pub fn two_tuple(first: impl Into<String>, second: impl Into<String>) -> Self {
        QueryArg::TwoTuple(first.into(), second.into())
    }

    pub fn three_tuple(
        first: impl Into<String>,
        second: impl Into<String>,
        third: impl Into<String>,
    ) -> Self {
        QueryArg::ThreeTuple(first.into(), second.into(), third.into())
    }
}

impl QueryArg {
    pub fn arg_type(&self) -> ArgType {
        match self {
            QueryArg::String(_) => ArgType::String,
            QueryArg::Int(_) => ArgType::Int,
            QueryArg::Double(_) => ArgType::Double,
            QueryArg::Bool(_) => ArgType::Bool,
            QueryArg::Null => ArgType::Null,
            QueryArg::Query(_) => ArgType::Query,
            QueryArg::List(_) => ArgType::List,
            QueryArg::PairList(_) => ArgType::PairList,
            QueryArg::TwoTuple(..) => ArgType::TwoTuple,
            QueryArg::ThreeTuple(..) => ArgType::ThreeTuple,
        }
    }

    pub fn is_string(&self) -> bool {
        self.arg_type() == ArgType::String
    }

    pub fn is_int(&self) -> bool {
        self.arg_type() == ArgType::Int
    }

    pub fn is_double(&self) -> bool {
        self.arg_type() == ArgType::Double
    }

    pub fn is_bool(&self) -> bool {
        self.arg_type() == ArgType::Bool
    }

    pub fn is_null(&self) -> bool {
        self.arg_type() == ArgType::Null
    }

    pub fn is_query(&self) -> bool {
        self.arg_type() == ArgType::Query
    }

    pub fn is_list(&self) -> bool {
        self.arg_type() == ArgType::List
    }

    pub fn is_pair_list(&self) -> bool {
        self.arg_type() == ArgType::PairList
    }

    pub fn is_two_tuple(&self) -> bool {
        self.arg_type() == ArgType::TwoTuple
    }

    pub fn is_three_tuple(&self) -> bool {
        self.arg_type() == ArgType::ThreeTuple
    }

    fn mismatch(&self, expected: ArgType) -> Error {
        Error::TypeMismatch {
            expected,
            actual: self.arg_type(),
        }
    }

    pub fn get_string(&self) -> Result<&str, Error> {
        match self {
            QueryArg::String(value) => Ok(value),
            _ => Err(self.mismatch(ArgType::String)),
        }
    }

    pub fn get_int(&self) -> Result<i64, Error> {
        match self {
            QueryArg::Int(value) => Ok(*value),
            _ => Err(self.mismatch(ArgType::Int)),
        }
    }

    pub fn get_double(&self) -> Result<f64, Error> {
        match self {
            QueryArg::Double(value) => Ok(*value),
            _ => Err(self.mismatch(ArgType::Double)),
        }
    }

    pub fn get_bool(&self) -> Result<bool, Error> {
        match self {
            QueryArg::Bool(value) => Ok(*value),
            _ => Err(self.mismatch(ArgType::Bool)),
        }
    }

    pub fn get_query(&self) -> Result<&Query, Error> {
        match self {
            QueryArg::Query(query) => Ok(query),
            _ => Err(self.mismatch(ArgType::Query)),
        }
    }

    pub fn get_list(&self) -> Result<&[QueryArg], Error> {
        match self {
            QueryArg::List(items) => Ok(items),
            _ => Err(self.mismatch(ArgType::List)),
        }
    }

    pub fn get_pairs(&self) -> Result<&[(String, QueryArg)], Error> {
        match self {
            QueryArg::PairList(pairs) => Ok(pairs),
            _ => Err(self.mismatch(ArgType::PairList)),
        }
    }

    pub fn get_two_tuple(&self) -> Result<(&str, &str), Error> {
        match self {
            QueryArg::TwoTuple(first, second) => Ok((first, second)),
            _ => Err(self.mismatch(ArgType::TwoTuple)),
        }
    }

    pub fn get_three_tuple(&self) -> Result<(&str, &str, &str), Error> {
        match self {
            QueryArg::ThreeTuple(first, second, third) => Ok((first, second, third)),
            _ => Err(self.mismatch(ArgType::ThreeTuple)),
        }
    }

    /// Scalar-to-text conversion used by `%K`, `%Q` fallback and value
    /// emission. Only String, Int, Double and Bool convert; everything else
    /// is an [`Error::UnsupportedConversion`].
    pub fn as_sql_string(&self) -> Result<String, Error> {
        match self {
            QueryArg::String(value) => Ok(value.clone()),
            QueryArg::Int(value) => Ok(value.to_string()),
            QueryArg::Double(value) => Ok(value.to_string()),
            QueryArg::Bool(value) => Ok(if *value { "TRUE" } else { "FALSE" }.to_string()),
            _ => Err(Error::UnsupportedConversion {
                actual: self.arg_type(),
            }),
        }
    }
}

// Loose construction from native Rust values, the call-site equivalent of
// tagging each argument by hand.
impl From<&str> for QueryArg {
    fn from(value: &str) -> Self {
        QueryArg::String(value.to_string())
    }
}

impl From<String> for QueryArg {
    fn from(value: String) -> Self {
        QueryArg::String(value)
    }
}

impl From<i64> for QueryArg {
    fn from(value: i64) -> Self {
        QueryArg::Int(value)
    }
}

impl From<i32> for QueryArg {
    fn from(value: i32) -> Self {
        QueryArg::Int(value as i64)
    }
}

impl From<f64> for QueryArg {
    fn from(value: f64) -> Self {
        QueryArg::Double(value)
    }
}

impl From<bool> for QueryArg {
    fn from(value: bool) -> Self {
        QueryArg::Bool(value)
    }
}

impl From<Query> for QueryArg {
    fn from(query: Query) -> Self {
        QueryArg::Query(query)
    }
}

impl From<Vec<QueryArg>> for QueryArg {
    fn from(items: Vec<QueryArg>) -> Self {
        QueryArg::List(items)
    }
}

impl<T: Into<QueryArg>> From<Option<T>> for QueryArg {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => QueryArg::Null,
        }
    }
}

impl From<(&str, &str)> for QueryArg {
    fn from((first, second): (&str, &str)) -> Self {
        QueryArg::two_tuple(first, second)
    }
}

impl From<(&str, &str, &str)> for QueryArg {
    fn from((first, second, third): (&str, &str, &str)) -> Self {
        QueryArg::three_tuple(first, second, third)
    }
}

/// Insertion order of the map becomes the rendering order of the pairs.
impl From<IndexMap<String, QueryArg>> for QueryArg {
    fn from(map: IndexMap<String, QueryArg>) -> Self {
        QueryArg::PairList(map.into_iter().collect())
    }
}
