/// Quotes a MySQL identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Full-table scan, optionally restricted by a raw predicate.
///
/// The filter is appended verbatim after `WHERE`; it is trusted operator input.
pub fn select_all(table: &str, filter: Option<&str>) -> String {
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(predicate) => format!("SELECT * FROM {} WHERE {predicate};", quote_identifier(table)),
        None => format!("SELECT * FROM {};", quote_identifier(table)),
    }
}

/// Zero-row probe used to read a table's column names.
pub fn describe(table: &str) -> String {
    format!("SELECT * FROM {} LIMIT 0;", quote_identifier(table))
}
