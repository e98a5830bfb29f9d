//! The template scanning engine.
//!
//! A single left-to-right pass over the template with one bit of lookahead
//! state: outside a directive, characters are copied verbatim; `%` starts a
//! directive, whose letter selects a handler. Each handler consumes exactly
//! one bound argument, and `%=x`/`%Lx` additionally read one extra template
//! byte (never an extra argument) to resolve.

use std::str::CharIndices;

use crate::arg::QueryArg;
use crate::error::Error;
use crate::escape::Escaper;

/// The four-byte tripwire sequence rejected before scanning begins.
const DANGEROUS: &str = ";'\"`";

pub(crate) fn render_template(
    text: &str,
    params: &[QueryArg],
    escaper: Option<&dyn Escaper>,
) -> Result<String, Error> {
    if let Some(offset) = text.find(DANGEROUS) {
        return Err(Error::DangerousSequence { offset });
    }

    let mut out = String::with_capacity(text.len());
    let mut consumed = 0;
    let mut after_percent = false;
    let mut chars = text.char_indices();

    while let Some((idx, c)) = chars.next() {
        if !after_percent {
            if c != '%' {
                out.push(c);
            } else {
                after_percent = true;
            }
            continue;
        }

        after_percent = false;

        if c == '%' {
            out.push('%');
            continue;
        }

        if consumed == params.len() {
            return Err(Error::parse(idx, "too few parameters for query"));
        }

        let param = &params[consumed];
        consumed += 1;

        match c {
            'd' | 's' | 'f' | 'u' => {
                append_value(&mut out, idx, c, param, escaper)?;
            }
            'm' => {
                if !(param.is_string()
                    || param.is_int()
                    || param.is_double()
                    || param.is_bool()
                    || param.is_null())
                {
                    return Err(Error::parse(idx, "%m expects int/float/string/bool"));
                }

                append_value(&mut out, idx, 'm', param, escaper)?;
            }
            'K' => {
                out.push_str("/*");
                append_comment(&mut out, param)?;
                out.push_str("*/");
            }
            'T' | 'C' => {
                append_identifier(&mut out, idx, c, param)?;
            }
            '=' => {
                let spec = advance(&mut chars, idx)?;
                if !matches!(spec, 'd' | 's' | 'f' | 'u' | 'm') {
                    return Err(Error::parse(idx, "expected %=d, %=f, %=s, %=u, or %=m"));
                }

                if param.is_null() {
                    out.push_str(" IS NULL");
                } else {
                    out.push_str(" = ");
                    append_value(&mut out, idx, spec, param, escaper)?;
                }
            }
            'V' => {
                append_row_list(&mut out, idx, param, escaper)?;
            }
            'L' => {
                let spec = advance(&mut chars, idx)?;
                match spec {
                    'O' | 'o' | 'A' | 'a' => {
                        let sep = if matches!(spec, 'O' | 'o') {
                            " OR "
                        } else {
                            " AND "
                        };
                        out.push('(');
                        append_value_clauses(&mut out, idx, sep, param, escaper)?;
                        out.push(')');
                    }
                    _ => {
                        let QueryArg::List(items) = param else {
                            return Err(Error::parse(idx, "expected array for %L formatter"));
                        };

                        for (i, item) in items.iter().enumerate() {
                            if i > 0 {
                                out.push_str(", ");
                            }

                            if spec == 'C' {
                                append_identifier(&mut out, idx, 'C', item)?;
                            } else {
                                append_value(&mut out, idx, spec, item, escaper)?;
                            }
                        }
                    }
                }
            }
            'U' => {
                append_value_clauses(&mut out, idx, ", ", param, escaper)?;
            }
            'W' => {
                append_value_clauses(&mut out, idx, " AND ", param, escaper)?;
            }
            'Q' => {
                if let QueryArg::Query(query) = param {
                    out.push_str(&query.render(escaper)?);
                } else {
                    out.push_str(&param.as_sql_string()?);
                }
            }
            _ => {
                return Err(Error::parse(idx, "unknown % code"));
            }
        }
    }

    if after_percent {
        return Err(Error::parse(
            text.len(),
            "string ended with unfinished % code",
        ));
    }

    if consumed != params.len() {
        return Err(Error::parse(0, "too many parameters specified for query"));
    }

    Ok(out)
}

/// Read the directive's continuation byte, failing if the template ends
/// first.
fn advance(chars: &mut CharIndices<'_>, offset: usize) -> Result<char, Error> {
    match chars.next() {
        Some((_, c)) => Ok(c),
        None => Err(Error::parse(offset, "unexpected end of string")),
    }
}

fn format_mismatch(offset: usize, spec: char, arg: &QueryArg) -> Error {
    Error::FormatMismatch {
        offset,
        spec,
        actual: arg.arg_type(),
    }
}

/// Emit one value, verifying the directive letter against the argument's
/// tag. The internal `v` specifier accepts any scalar; it is used for list,
/// row and pair-clause elements and is not part of the template grammar.
fn append_value(
    out: &mut String,
    offset: usize,
    spec: char,
    arg: &QueryArg,
    escaper: Option<&dyn Escaper>,
) -> Result<(), Error> {
    match arg {
        QueryArg::String(value) => {
            if !matches!(spec, 's' | 'v' | 'm') {
                return Err(format_mismatch(offset, spec, arg));
            }

            out.push('"');
            append_escaped(out, value, escaper);
            out.push('"');
        }
        QueryArg::Bool(value) => {
            if !matches!(spec, 'v' | 'm') {
                return Err(format_mismatch(offset, spec, arg));
            }

            out.push_str(if *value { "TRUE" } else { "FALSE" });
        }
        QueryArg::Int(value) => {
            if !matches!(spec, 'd' | 'v' | 'm' | 'u') {
                return Err(format_mismatch(offset, spec, arg));
            }

            out.push_str(&value.to_string());
        }
        QueryArg::Double(value) => {
            if !matches!(spec, 'f' | 'v' | 'm') {
                return Err(format_mismatch(offset, spec, arg));
            }

            out.push_str(&value.to_string());
        }
        QueryArg::Query(query) => {
            out.push_str(&query.render(escaper)?);
        }
        QueryArg::Null => {
            out.push_str("NULL");
        }
        _ => return Err(format_mismatch(offset, spec, arg)),
    }

    Ok(())
}

fn append_escaped(out: &mut String, value: &str, escaper: Option<&dyn Escaper>) {
    match escaper {
        Some(escaper) => out.push_str(&escaper.escape(value)),
        // Escape-less mode: tests and trusted input only.
        None => out.push_str(value),
    }
}

/// Emit the body of a `%K` comment, breaking up any `/*` and `*/` in the
/// text so it cannot terminate the surrounding comment.
fn append_comment(out: &mut String, arg: &QueryArg) -> Result<(), Error> {
    let text = arg.as_sql_string()?;
    out.push_str(&text.replace("/*", " / * ").replace("*/", " * / "));
    Ok(())
}

/// Quote an identifier: strings self-escape with doubled back-ticks, tuples
/// render as qualified (and optionally aliased) names. Identifiers never go
/// through the connection escaper.
fn append_identifier(
    out: &mut String,
    offset: usize,
    spec: char,
    arg: &QueryArg,
) -> Result<(), Error> {
    match arg {
        QueryArg::String(name) => {
            append_quoted_ident(out, name);
        }
        QueryArg::TwoTuple(table, column) => {
            append_quoted_ident(out, table);
            out.push('.');
            append_quoted_ident(out, column);
        }
        QueryArg::ThreeTuple(table, column, alias) => {
            append_quoted_ident(out, table);
            out.push('.');
            append_quoted_ident(out, column);
            out.push_str(" AS ");
            append_quoted_ident(out, alias);
        }
        _ => return Err(format_mismatch(offset, spec, arg)),
    }

    Ok(())
}

fn append_quoted_ident(out: &mut String, name: &str) {
    out.push('`');
    for c in name.chars() {
        // Toss in an extra ` if we see one.
        if c == '`' {
            out.push('`');
        }
        out.push(c);
    }
    out.push('`');
}

/// Expand `%V`: a list of equal-width rows, each parenthesized and
/// comma-joined.
fn append_row_list(
    out: &mut String,
    offset: usize,
    arg: &QueryArg,
    escaper: Option<&dyn Escaper>,
) -> Result<(), Error> {
    if arg.is_query() {
        return Err(Error::structural(offset, "%V doesn't allow subquery"));
    }

    let rows = arg.get_list()?;
    let mut row_len = 0;

    for (row_idx, row) in rows.iter().enumerate() {
        let cols = row.get_list()?;

        if row_idx > 0 {
            out.push_str(", ");
        }

        out.push('(');
        for (col_idx, col) in cols.iter().enumerate() {
            if col_idx > 0 {
                out.push_str(", ");
            }
            append_value(out, offset, 'v', col, escaper)?;
        }
        out.push(')');

        if row_idx == 0 {
            row_len = cols.len();
        } else if cols.len() != row_len {
            return Err(Error::structural(
                offset,
                "not all rows provided for %V formatter are the same size",
            ));
        }
    }

    Ok(())
}

/// Expand a pair list into `key = value` clauses joined by `sep`. A Null
/// value renders as `IS NULL` except in comma-joined (`%U`) position.
fn append_value_clauses(
    out: &mut String,
    offset: usize,
    sep: &str,
    arg: &QueryArg,
    escaper: Option<&dyn Escaper>,
) -> Result<(), Error> {
    let QueryArg::PairList(pairs) = arg else {
        return Err(Error::structural(
            offset,
            format!("pair list expected for %Lx but received {}", arg.arg_type()),
        ));
    };

    for (i, (key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }

        append_quoted_ident(out, key);

        if value.is_null() && !sep.starts_with(',') {
            out.push_str(" IS NULL");
        } else {
            out.push_str(" = ");
            append_value(out, offset, 'v', value, escaper)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::ArgType;
    use crate::query::Query;

    fn render(text: &str, params: &[QueryArg]) -> Result<String, Error> {
        render_template(text, params, None)
    }

    #[test]
    fn test_literal_template_unchanged() {
        assert_eq!(
            render("SELECT * FROM t", &[]).unwrap(),
            "SELECT * FROM t"
        );
    }

    #[test]
    fn test_percent_escape() {
        assert_eq!(render("100%%", &[]).unwrap(), "100%");
        assert_eq!(render("%%d", &[]).unwrap(), "%d");
        assert_eq!(
            render("a %% b %d", &[QueryArg::int(1)]).unwrap(),
            "a % b 1"
        );
    }

    #[test]
    fn test_scalar_directives() {
        assert_eq!(
            render("SELECT * FROM t WHERE id = %d", &[QueryArg::int(5)]).unwrap(),
            "SELECT * FROM t WHERE id = 5"
        );
        assert_eq!(
            render("%s", &[QueryArg::string("abc")]).unwrap(),
            "\"abc\""
        );
        assert_eq!(render("%f", &[QueryArg::double(1.5)]).unwrap(), "1.5");
        assert_eq!(render("%u", &[QueryArg::int(7)]).unwrap(), "7");
    }

    #[test]
    fn test_m_accepts_any_scalar() {
        assert_eq!(render("%m", &[QueryArg::int(1)]).unwrap(), "1");
        assert_eq!(render("%m", &[QueryArg::double(2.5)]).unwrap(), "2.5");
        assert_eq!(render("%m", &[QueryArg::string("x")]).unwrap(), "\"x\"");
        assert_eq!(render("%m", &[QueryArg::bool(true)]).unwrap(), "TRUE");
        assert_eq!(render("%m", &[QueryArg::null()]).unwrap(), "NULL");
    }

    #[test]
    fn test_m_rejects_non_scalars() {
        let err = render("%m", &[QueryArg::list([])]).unwrap_err();
        assert_eq!(err, Error::parse(1, "%m expects int/float/string/bool"));
    }

    #[test]
    fn test_directive_argument_mismatch() {
        let err = render("%d", &[QueryArg::string("x")]).unwrap_err();
        assert_eq!(
            err,
            Error::FormatMismatch {
                offset: 1,
                spec: 'd',
                actual: ArgType::String,
            }
        );

        let err = render("%s", &[QueryArg::bool(true)]).unwrap_err();
        assert_eq!(
            err,
            Error::FormatMismatch {
                offset: 1,
                spec: 's',
                actual: ArgType::Bool,
            }
        );
    }

    #[test]
    fn test_null_renders_for_any_value_directive() {
        assert_eq!(render("%d", &[QueryArg::null()]).unwrap(), "NULL");
        assert_eq!(render("%s", &[QueryArg::null()]).unwrap(), "NULL");
    }

    #[test]
    fn test_subquery_inlines_for_value_directive() {
        let sub = Query::new("SELECT id FROM u WHERE x = %d", [QueryArg::int(3)]);
        assert_eq!(
            render("%d", &[QueryArg::query(sub)]).unwrap(),
            "SELECT id FROM u WHERE x = 3"
        );
    }

    #[test]
    fn test_comment_directive_neutralizes_terminators() {
        assert_eq!(
            render("%K", &[QueryArg::string("a/*b*/c")]).unwrap(),
            "/*a / * b * / c*/"
        );
        assert_eq!(
            render("%K", &[QueryArg::string("note")]).unwrap(),
            "/*note*/"
        );
        assert_eq!(render("%K", &[QueryArg::int(7)]).unwrap(), "/*7*/");
    }

    #[test]
    fn test_comment_directive_rejects_non_scalars() {
        assert_eq!(
            render("%K", &[QueryArg::list([])]).unwrap_err(),
            Error::UnsupportedConversion {
                actual: ArgType::List,
            }
        );
    }

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(render("%T", &[QueryArg::string("tbl")]).unwrap(), "`tbl`");
        assert_eq!(
            render("%C", &[QueryArg::string("we`ird")]).unwrap(),
            "`we``ird`"
        );
        assert_eq!(
            render("%T", &[QueryArg::two_tuple("t", "c")]).unwrap(),
            "`t`.`c`"
        );
        assert_eq!(
            render("%T", &[QueryArg::three_tuple("t", "c", "a")]).unwrap(),
            "`t`.`c` AS `a`"
        );
    }

    #[test]
    fn test_identifier_rejects_values() {
        let err = render("%T", &[QueryArg::int(1)]).unwrap_err();
        assert_eq!(
            err,
            Error::FormatMismatch {
                offset: 1,
                spec: 'T',
                actual: ArgType::Int,
            }
        );
    }

    #[test]
    fn test_equals_directive() {
        assert_eq!(render("%=s", &[QueryArg::null()]).unwrap(), " IS NULL");
        assert_eq!(
            render("%=s", &[QueryArg::string("a")]).unwrap(),
            " = \"a\""
        );
        assert_eq!(render("%=d", &[QueryArg::int(2)]).unwrap(), " = 2");
    }

    #[test]
    fn test_equals_directive_bad_continuation() {
        assert_eq!(
            render("%=z", &[QueryArg::int(1)]).unwrap_err(),
            Error::parse(1, "expected %=d, %=f, %=s, %=u, or %=m")
        );
        assert_eq!(
            render("a%=", &[QueryArg::int(1)]).unwrap_err(),
            Error::parse(2, "unexpected end of string")
        );
    }

    #[test]
    fn test_row_list() {
        let rows = QueryArg::list([
            QueryArg::list([QueryArg::int(1), QueryArg::string("a")]),
            QueryArg::list([QueryArg::int(2), QueryArg::string("b")]),
        ]);
        assert_eq!(
            render("INSERT INTO t (x, y) VALUES %V", &[rows]).unwrap(),
            "INSERT INTO t (x, y) VALUES (1, \"a\"), (2, \"b\")"
        );
    }

    #[test]
    fn test_row_list_rejects_unequal_widths() {
        let rows = QueryArg::list([
            QueryArg::list([QueryArg::int(1), QueryArg::int(2)]),
            QueryArg::list([QueryArg::int(3)]),
        ]);
        assert_eq!(
            render("%V", &[rows]).unwrap_err(),
            Error::structural(1, "not all rows provided for %V formatter are the same size")
        );
    }

    #[test]
    fn test_row_list_rejects_subquery() {
        let sub = QueryArg::query(Query::new("SELECT 1", []));
        assert_eq!(
            render("%V", &[sub]).unwrap_err(),
            Error::structural(1, "%V doesn't allow subquery")
        );
    }

    #[test]
    fn test_row_list_requires_lists() {
        assert_eq!(
            render("%V", &[QueryArg::int(1)]).unwrap_err(),
            Error::TypeMismatch {
                expected: ArgType::List,
                actual: ArgType::Int,
            }
        );
    }

    #[test]
    fn test_list_directive_values() {
        let items = QueryArg::list([QueryArg::int(1), QueryArg::int(2), QueryArg::int(3)]);
        assert_eq!(
            render("id IN (%Ld)", &[items]).unwrap(),
            "id IN (1, 2, 3)"
        );

        let items = QueryArg::list([QueryArg::string("a"), QueryArg::string("b")]);
        assert_eq!(render("%Ls", &[items]).unwrap(), "\"a\", \"b\"");
    }

    #[test]
    fn test_list_directive_columns() {
        let cols = QueryArg::list([
            QueryArg::string("a"),
            QueryArg::two_tuple("t", "b"),
        ]);
        assert_eq!(render("SELECT %LC", &[cols]).unwrap(), "SELECT `a`, `t`.`b`");
    }

    #[test]
    fn test_list_directive_requires_list() {
        assert_eq!(
            render("%Ld", &[QueryArg::int(1)]).unwrap_err(),
            Error::parse(1, "expected array for %L formatter")
        );
    }

    #[test]
    fn test_pair_clause_directives() {
        let pairs = || {
            QueryArg::pair_list([
                ("a", QueryArg::int(1)),
                ("b", QueryArg::null()),
            ])
        };

        assert_eq!(
            render("%Lo", &[pairs()]).unwrap(),
            "(`a` = 1 OR `b` IS NULL)"
        );
        assert_eq!(
            render("%LA", &[pairs()]).unwrap(),
            "(`a` = 1 AND `b` IS NULL)"
        );
        assert_eq!(
            render("%W", &[pairs()]).unwrap(),
            "`a` = 1 AND `b` IS NULL"
        );
        // Comma-joined SET clauses keep `= NULL`.
        assert_eq!(render("%U", &[pairs()]).unwrap(), "`a` = 1, `b` = NULL");
    }

    #[test]
    fn test_pair_clause_requires_pair_list() {
        assert_eq!(
            render("%W", &[QueryArg::int(1)]).unwrap_err(),
            Error::structural(1, "pair list expected for %Lx but received int")
        );
    }

    #[test]
    fn test_subquery_directive() {
        let sub = Query::new("SELECT id FROM u WHERE name = %s", [QueryArg::string("bob")]);
        assert_eq!(
            render("DELETE FROM t WHERE id IN (%Q)", &[QueryArg::query(sub)]).unwrap(),
            "DELETE FROM t WHERE id IN (SELECT id FROM u WHERE name = \"bob\")"
        );
        // Non-query arguments inline their string conversion, unquoted.
        assert_eq!(render("%Q", &[QueryArg::string("raw")]).unwrap(), "raw");
        assert_eq!(render("%Q", &[QueryArg::int(4)]).unwrap(), "4");
    }

    #[test]
    fn test_unknown_directive() {
        assert_eq!(
            render("%z", &[QueryArg::int(1)]).unwrap_err(),
            Error::parse(1, "unknown % code")
        );
    }

    #[test]
    fn test_unfinished_directive() {
        assert_eq!(
            render("100%", &[]).unwrap_err(),
            Error::parse(4, "string ended with unfinished % code")
        );
    }

    #[test]
    fn test_too_few_parameters() {
        assert_eq!(
            render("%d", &[]).unwrap_err(),
            Error::parse(1, "too few parameters for query")
        );
    }

    #[test]
    fn test_too_many_parameters() {
        assert_eq!(
            render("", &[QueryArg::int(1)]).unwrap_err(),
            Error::parse(0, "too many parameters specified for query")
        );
    }

    #[test]
    fn test_dangerous_sequence_tripwire() {
        assert_eq!(
            render("SELECT 1 ;'\"` --", &[]).unwrap_err(),
            Error::DangerousSequence { offset: 9 }
        );
        // The characters are only dangerous in that exact adjacency.
        assert!(render("a; b", &[]).is_ok());
    }

    #[test]
    fn test_escaper_is_used_for_strings_only() {
        let escaper = |raw: &str| raw.replace('\'', "''").replace('"', "\\\"");
        let result = render_template(
            "%s = %T",
            &[QueryArg::string("it's"), QueryArg::string("col")],
            Some(&escaper),
        )
        .unwrap();
        assert_eq!(result, "\"it''s\" = `col`");
    }

    #[test]
    fn test_escaper_threads_through_subqueries() {
        let escaper = |raw: &str| raw.replace('\'', "''");
        let sub = Query::new("x = %s", [QueryArg::string("o'clock")]);
        let result = render_template("(%Q)", &[QueryArg::query(sub)], Some(&escaper)).unwrap();
        assert_eq!(result, "(x = \"o''clock\")");
    }
}
