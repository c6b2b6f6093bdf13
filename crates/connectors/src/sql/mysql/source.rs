use crate::{
    error::SourceError,
    source::RowSource,
    sql::{
        mysql::{conn_str, value},
        query,
    },
};
use mysql_async::{Conn, prelude::Queryable};
use tokio::runtime::Handle;
use tracing::{debug, info, trace};

/// MySQL server error code for `ER_NO_SUCH_TABLE`.
const ER_NO_SUCH_TABLE: u16 = 1146;

/// Blocking [`RowSource`] over a single `mysql_async` connection.
///
/// Queries are driven on the given runtime handle, so the source must be used
/// from a thread that is not itself executing async tasks.
pub struct MySqlRowSource {
    conn: Conn,
    runtime: Handle,
}

impl MySqlRowSource {
    pub fn connect(conn_str: &str, runtime: Handle) -> Result<Self, SourceError> {
        let opts = conn_str::connection_opts(conn_str)?;
        info!(
            host = %opts.ip_or_hostname(),
            port = opts.tcp_port(),
            "Connecting to MySQL server"
        );

        let conn = runtime.block_on(Conn::new(opts))?;
        Ok(MySqlRowSource { conn, runtime })
    }

    pub fn disconnect(self) -> Result<(), SourceError> {
        self.runtime.block_on(self.conn.disconnect())?;
        Ok(())
    }
}

impl RowSource for MySqlRowSource {
    fn list_columns(&mut self, table: &str) -> Result<Vec<String>, SourceError> {
        let sql = query::describe(table);
        let conn = &mut self.conn;

        self.runtime.block_on(async move {
            let result = conn
                .query_iter(sql.as_str())
                .await
                .map_err(|e| query_error(&sql, Some(table), e))?;

            let columns: Vec<String> = result
                .columns_ref()
                .iter()
                .map(|column| column.name_str().into_owned())
                .collect();

            result
                .drop_result()
                .await
                .map_err(|e| query_error(&sql, Some(table), e))?;

            debug!(table, columns = columns.len(), "Described source table");
            Ok(columns)
        })
    }

    fn stream_rows(
        &mut self,
        sql: &str,
        on_row: &mut dyn FnMut(&[String]) -> bool,
    ) -> Result<(), SourceError> {
        trace!(query = sql, "Executing MySQL query");
        let conn = &mut self.conn;

        self.runtime.block_on(async move {
            let mut result = conn
                .query_iter(sql)
                .await
                .map_err(|e| query_error(sql, None, e))?;

            let mut values: Vec<String> = Vec::new();
            while let Some(row) = result.next().await.map_err(|e| query_error(sql, None, e))? {
                values.clear();
                values.extend((0..row.len()).map(|idx| {
                    row.as_ref(idx).map(value::to_text).unwrap_or_default()
                }));

                if !on_row(&values) {
                    debug!("Row consumer asked to stop, abandoning result set");
                    break;
                }
            }

            Ok(())
        })
    }
}

fn query_error(sql: &str, table: Option<&str>, err: mysql_async::Error) -> SourceError {
    if let (Some(table), mysql_async::Error::Server(server)) = (table, &err)
        && server.code == ER_NO_SUCH_TABLE
    {
        return SourceError::UnknownTable(table.to_string());
    }

    SourceError::Query {
        query: sql.to_string(),
        source: err,
    }
}
