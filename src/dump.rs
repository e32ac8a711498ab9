//! Writes a query and its tables back out as canonical text.
//!
//! Layout: the query in pretty form followed by a newline, then every table
//! as a bracketed block with its header and each row on their own line,
//! indented by four spaces:
//!
//! ```text
//! [
//!     [["name","str"],["population","int"]],
//!     ["Chile",19000000]
//! ]
//! ```

use std::io::Write;

use tracing::debug;

use crate::error::DumpError;
use crate::ir::encoder::{EncodeOptions, TextStyle, encode};
use crate::ir::node::CanonicalText;
use crate::ir::sql_node::Query;
use crate::table::Table;

const ROW_INDENT: &str = "    ";

/// Writes the dump of `query` and `tables` to `writer`.
///
/// `options` controls the query block; table lines are always compact but
/// share its depth limit.
pub fn write_dump<W: Write>(
    writer: &mut W,
    query: &Query,
    tables: &[Table],
    options: &EncodeOptions,
) -> Result<(), DumpError> {
    let query_text = query.to_text_with(options)?;
    writer.write_all(query_text.as_bytes())?;
    writer.write_all(b"\n")?;

    let line_options = EncodeOptions {
        style: TextStyle::Compact,
        ..*options
    };
    for table in tables {
        write_table(writer, table, &line_options)?;
    }
    debug!("Dumped query and {} tables", tables.len());
    Ok(())
}

fn write_table<W: Write>(writer: &mut W, table: &Table, options: &EncodeOptions) -> Result<(), DumpError> {
    writer.write_all(b"[\n")?;
    writer.write_all(ROW_INDENT.as_bytes())?;
    writer.write_all(encode(&table.columns, options)?.as_bytes())?;
    for row in &table.rows {
        writer.write_all(b",\n")?;
        writer.write_all(ROW_INDENT.as_bytes())?;
        writer.write_all(encode(row, options)?.as_bytes())?;
    }
    writer.write_all(b"\n]\n")?;
    Ok(())
}
