//! Binding between `sqltpl_common::Value` and rusqlite's parameter and row types.

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, Params, ToSql};

use sqltpl_common::{Record, Value};

/// Borrowed parameter; binds without copying text or blobs.
pub(crate) struct SqlParam<'a>(pub(crate) &'a Value);

impl ToSql for SqlParam<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self.0 {
            Value::Null => ValueRef::Null,
            Value::Integer(value) => ValueRef::Integer(*value),
            Value::Real(value) => ValueRef::Real(*value),
            Value::Text(text) => ValueRef::Text(text.as_bytes()),
            Value::Blob(data) => ValueRef::Blob(data),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}

/// Positional parameters for one statement execution.
pub(crate) fn bind(params: &[Value]) -> impl Params + '_ {
    params_from_iter(params.iter().map(SqlParam))
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(value) => Value::Integer(value),
        ValueRef::Real(value) => Value::Real(value),
        // SQLite does not validate stored text; replace bad sequences.
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

/// Runs a query and collects up to `limit` rows as records.
pub(crate) fn read_records(
    conn: &Connection,
    sql: &str,
    params: &[Value],
    limit: Option<usize>,
) -> rusqlite::Result<Vec<Record>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let mut rows = stmt.query(bind(params))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Record::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            record.push(name.as_str(), to_value(row.get_ref(idx)?));
        }
        records.push(record);
        if limit.is_some_and(|max| records.len() >= max) {
            break;
        }
    }
    Ok(records)
}

/// Runs `SELECT COUNT(..)`-shaped SQL and returns its single value.
pub(crate) fn read_count(conn: &Connection, sql: &str, params: &[Value]) -> rusqlite::Result<u64> {
    let mut stmt = conn.prepare_cached(sql)?;
    let count: i64 = stmt.query_row(bind(params), |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_a_select() {
        let conn = Connection::open_in_memory().unwrap();
        let params = vec![
            Value::Integer(-3),
            Value::Real(0.25),
            Value::Text("héllo".to_string()),
            Value::Blob(vec![0, 255]),
            Value::Null,
        ];
        let records = read_records(&conn, "SELECT ?1 AS i, ?2 AS r, ?3 AS t, ?4 AS b, ?5 AS n", &params, None)
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].values(), params.as_slice());
        assert_eq!(records[0].columns(), &["i", "r", "t", "b", "n"]);
    }

    #[test]
    fn limit_stops_early() {
        let conn = Connection::open_in_memory().unwrap();
        let sql = "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 50) SELECT x FROM n";
        assert_eq!(read_records(&conn, sql, &[], Some(1)).unwrap().len(), 1);
        assert_eq!(read_records(&conn, sql, &[], None).unwrap().len(), 50);
    }

    #[test]
    fn count_reads_first_column() {
        let conn = Connection::open_in_memory().unwrap();
        let total = read_count(&conn, "SELECT COUNT(1) FROM (SELECT 1 UNION ALL SELECT 2) AS c", &[]).unwrap();
        assert_eq!(total, 2);
    }
}
