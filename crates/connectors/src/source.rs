use crate::error::SourceError;

/// A relational source that can describe a table and stream a query's rows.
///
/// Rows are handed to the callback one at a time, in source order, as the
/// textual value of every column. Returning `false` from the callback makes
/// the source abandon the rest of the result set and return `Ok(())`.
pub trait RowSource {
    fn list_columns(&mut self, table: &str) -> Result<Vec<String>, SourceError>;

    fn stream_rows(
        &mut self,
        query: &str,
        on_row: &mut dyn FnMut(&[String]) -> bool,
    ) -> Result<(), SourceError>;
}
