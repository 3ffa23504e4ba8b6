//! JSON output of the wide table.

use insider_core::{Result, WideTable};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Write `table` as pretty-printed JSON.
pub fn write_json<W: Write>(table: &WideTable, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, table)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write `table` as pretty-printed JSON to `path`.
pub fn write_json_file(table: &WideTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    write_json(table, BufWriter::new(File::create(path)?))?;
    info!(path = %path.display(), rows = table.num_rows(), "wrote json");
    Ok(())
}
