//! # SQL Dialects
//!
//! Renders the statement rewrites the template needs: the row-count wrapper
//! and the offset/limit suffix. Only integers produced here are spliced into
//! SQL text, never caller strings.

use std::fmt;

/// Alias given to the counted subquery.
pub const COUNT_ALIAS: &str = "_count_alias";

/// SQL flavour used for paging clauses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// `LIMIT count OFFSET offset` (SQLite, PostgreSQL).
    #[default]
    Sqlite,
    /// `LIMIT offset, count` (MySQL, also accepted by SQLite).
    MySql,
    /// `OFFSET offset ROWS FETCH NEXT count ROWS ONLY` (SQL:2008).
    Ansi,
}

impl Dialect {
    /// Returns the clause (with a leading space) that selects `count` rows
    /// starting at the zero-based `offset`.
    pub fn limit_clause(self, offset: u64, count: u64) -> String {
        match self {
            Dialect::Sqlite => format!(" LIMIT {} OFFSET {}", count, offset),
            Dialect::MySql => format!(" LIMIT {}, {}", offset, count),
            Dialect::Ansi => format!(" OFFSET {} ROWS FETCH NEXT {} ROWS ONLY", offset, count),
        }
    }

    /// Appends the paging clause to `sql` on its own line.
    ///
    /// The line break keeps a trailing `-- comment` from swallowing the clause.
    pub fn paginate(self, sql: &str, offset: u64, count: u64) -> String {
        let mut out = String::from(trim_statement(sql));
        out.push('\n');
        out.push_str(self.limit_clause(offset, count).trim_start());
        out
    }

    /// Wraps `sql` as a subquery counting its rows.
    pub fn count_query(self, sql: &str) -> String {
        format!(
            "SELECT COUNT(1) FROM ({}\n) AS {}",
            trim_statement(sql),
            COUNT_ALIAS
        )
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Sqlite => "sqlite",
            Dialect::MySql => "mysql",
            Dialect::Ansi => "ansi",
        };
        f.write_str(name)
    }
}

/// Strips trailing whitespace and statement terminators.
///
/// A trailing `;` would otherwise end up inside the subquery parentheses or
/// before the paging clause.
pub fn trim_statement(sql: &str) -> &str {
    sql.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_clauses_per_dialect() {
        assert_eq!(Dialect::Sqlite.limit_clause(20, 10), " LIMIT 10 OFFSET 20");
        assert_eq!(Dialect::MySql.limit_clause(20, 10), " LIMIT 20, 10");
        assert_eq!(
            Dialect::Ansi.limit_clause(20, 10),
            " OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
    }

    #[test]
    fn count_query_wraps_subquery() {
        assert_eq!(
            Dialect::default().count_query("SELECT * FROM t WHERE a = ?; \n"),
            "SELECT COUNT(1) FROM (SELECT * FROM t WHERE a = ?\n) AS _count_alias"
        );
    }

    #[test]
    fn paginate_drops_terminator() {
        assert_eq!(
            Dialect::MySql.paginate("SELECT id FROM t ORDER BY id;", 0, 5),
            "SELECT id FROM t ORDER BY id\nLIMIT 0, 5"
        );
    }

    #[test]
    fn trailing_line_comment_stays_inside_its_line() {
        let sql = "SELECT id FROM t -- newest first";
        assert_eq!(
            Dialect::default().count_query(sql),
            "SELECT COUNT(1) FROM (SELECT id FROM t -- newest first\n) AS _count_alias"
        );
        assert_eq!(
            Dialect::Sqlite.paginate(sql, 10, 5),
            "SELECT id FROM t -- newest first\nLIMIT 5 OFFSET 10"
        );
    }
}
