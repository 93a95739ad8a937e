// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::TableModel;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Cannot open file '{}' for write!", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writes every row of `model` as one quoted line. Quotes inside a cell are
/// backslash-escaped and cells are separated by `", "`. No header row.
pub fn write_csv<W: Write>(model: &dyn TableModel, out: &mut W) -> io::Result<usize> {
    let columns = model.column_count();
    let rows = model.row_count();
    for row in 0..rows {
        let line = (0..columns)
            .map(|column| {
                let text = model
                    .cell_value(row, column)
                    .map(|value| value.display())
                    .unwrap_or_default();
                escape_field(&text)
            })
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(rows)
}

pub fn export_csv_file(model: &dyn TableModel, path: &Path) -> Result<usize, ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);
    let rows = write_csv(model, &mut out).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), rows, table = model.title(), "exported csv");
    Ok(rows)
}

pub fn escape_field(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\\\""))
}
