// Player pool loading from CSV.
//
// Reads a simple one-column player list (header `name`); extra columns are
// ignored so exports from league platforms can be fed in unmodified.

use serde::Deserialize;
use std::path::Path;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("player file {path} contains no players")]
    Empty { path: String },
}

/// One row of the players CSV.
#[derive(Debug, Deserialize)]
struct RawPlayerRow {
    name: String,
}

/// Load player display names from a CSV file. Blank names are skipped with
/// a warning; duplicate names are collapsed (the pool is a set).
pub fn load_players(path: &Path) -> Result<Vec<String>, PoolError> {
    let path_str = path.display().to_string();
    // Reader::from_path only fails opening the file.
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        let source = match e.into_kind() {
            csv::ErrorKind::Io(io) => io,
            other => std::io::Error::new(std::io::ErrorKind::Other, format!("{other:?}")),
        };
        PoolError::Io {
            path: path_str.clone(),
            source,
        }
    })?;

    let mut names: Vec<String> = Vec::new();
    for (i, record) in reader.deserialize::<RawPlayerRow>().enumerate() {
        let row = record.map_err(|e| PoolError::Csv {
            path: path_str.clone(),
            source: e,
        })?;
        let name = row.name.trim().to_string();
        if name.is_empty() {
            warn!("Skipping blank player name at row {}", i + 2);
            continue;
        }
        if !names.contains(&name) {
            names.push(name);
        }
    }

    if names.is_empty() {
        return Err(PoolError::Empty { path: path_str });
    }
    Ok(names)
}
