use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{DocumentKind, LoadError};
use crate::ir::sql_node::Query;
use crate::table::Table;

/// Suffix of table documents inside the table folder.
pub const TABLE_FILE_SUFFIX: &str = ".table.json";

fn read_document<T: DeserializeOwned>(path: &Path, kind: DocumentKind) -> Result<T, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        kind,
        source,
    })
}

/// Reads a query document.
pub fn load_query(path: &Path) -> Result<Query, LoadError> {
    let query: Query = read_document(path, DocumentKind::Query)?;
    info!("Loaded query from {:?} ({} tables)", path, query.from.len());
    Ok(query)
}

/// Path of the document for table `source` inside `folder`.
pub fn table_path(folder: &Path, source: &str) -> PathBuf {
    folder.join(format!("{}{}", source, TABLE_FILE_SUFFIX))
}

/// Reads the table document `<folder>/<source>.table.json`.
pub fn load_table(folder: &Path, source: &str) -> Result<Table, LoadError> {
    let path = table_path(folder, source);
    let table: Table = read_document(&path, DocumentKind::Table)?;
    debug!("Loaded table {:?}: {} columns, {} rows", source, table.width(), table.len());
    Ok(table)
}

/// Reads every table listed in the query's `from`, in order.
///
/// A table referenced twice under different aliases is read twice.
pub fn load_tables(folder: &Path, query: &Query) -> Result<Vec<Table>, LoadError> {
    query
        .from
        .iter()
        .map(|table_ref| load_table(folder, &table_ref.source))
        .collect()
}
