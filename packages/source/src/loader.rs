//! Delimited-text loading for the three raw sources.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use evision_config::{PipelineConfig, SourceFormat, SourcesConfig};

use crate::SourceError;
use crate::progress::ProgressCallback;

/// A loaded source file: trimmed headers and string rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Builds a table from already-split rows.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            path: path.into(),
            headers,
            rows,
        }
    }

    /// File the table was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Column names in file order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the named column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Field at `row`/`column`. Fields past the end of a short row are empty.
    #[must_use]
    pub fn value(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map_or("", String::as_str)
    }

    /// Field at `row` in the named column, or `None` if there is no such
    /// column.
    #[must_use]
    pub fn get(&self, row: usize, name: &str) -> Option<&str> {
        self.column_index(name).map(|column| self.value(row, column))
    }

    /// Checks that every named column exists.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingColumns`] listing every absent column.
    pub fn require_columns(&self, columns: &[&str]) -> Result<(), SourceError> {
        let missing: Vec<String> = columns
            .iter()
            .filter(|c| self.column_index(c).is_none())
            .map(|c| (*c).to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SourceError::MissingColumns {
                path: self.path.clone(),
                columns: missing,
            })
        }
    }
}

/// Locations of the three source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    /// Station registry.
    pub stations: PathBuf,
    /// Population table.
    pub population: PathBuf,
    /// Geometry table.
    pub geometry: PathBuf,
}

impl SourcePaths {
    /// Resolves the configured file names against the dataset directory.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        let sources = &config.sources;
        Self {
            stations: config.dataset_path(&sources.stations.format.file),
            population: config.dataset_path(&sources.population.format.file),
            geometry: config.dataset_path(&sources.geometry.format.file),
        }
    }

    /// All three paths in a fixed order.
    #[must_use]
    pub fn all(&self) -> [&Path; 3] {
        [&self.stations, &self.population, &self.geometry]
    }
}

/// The three loaded sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTables {
    /// Station registry rows.
    pub stations: RawTable,
    /// Population table rows.
    pub population: RawTable,
    /// Geometry table rows.
    pub geometry: RawTable,
}

/// Reads source files according to their configured layout.
pub struct SourceLoader<'a> {
    sources: &'a SourcesConfig,
}

impl<'a> SourceLoader<'a> {
    /// Creates a loader for the given source layouts.
    #[must_use]
    pub const fn new(sources: &'a SourcesConfig) -> Self {
        Self { sources }
    }

    /// Loads the station registry.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file cannot be read or decoded, or lacks
    /// a configured column.
    pub fn load_stations(&self, path: &Path) -> Result<RawTable, SourceError> {
        let config = &self.sources.stations;
        load_table(path, &config.format, &config.columns.required())
    }

    /// Loads the population table.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file cannot be read or decoded, or lacks
    /// a configured column.
    pub fn load_population(&self, path: &Path) -> Result<RawTable, SourceError> {
        let config = &self.sources.population;
        load_table(path, &config.format, &config.columns.required())
    }

    /// Loads the geometry table.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file cannot be read or decoded, or lacks
    /// a configured column.
    pub fn load_geometry(&self, path: &Path) -> Result<RawTable, SourceError> {
        let config = &self.sources.geometry;
        load_table(path, &config.format, &config.columns.required())
    }

    /// Loads all three sources, failing on the first unavailable one.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] from whichever file failed first.
    pub fn load_all(
        &self,
        paths: &SourcePaths,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<SourceTables, SourceError> {
        progress.set_message("Loading station registry".to_string());
        let stations = self.load_stations(&paths.stations)?;
        progress.inc(1);

        progress.set_message("Loading population table".to_string());
        let population = self.load_population(&paths.population)?;
        progress.inc(1);

        progress.set_message("Loading geometry table".to_string());
        let geometry = self.load_geometry(&paths.geometry)?;
        progress.inc(1);

        Ok(SourceTables {
            stations,
            population,
            geometry,
        })
    }
}

/// Reads one delimited file and checks its header for `required` columns.
///
/// # Errors
///
/// Returns [`SourceError`] if the file is missing, the encoding or
/// delimiter is unsupported, the text is not valid CSV, or a column is
/// missing.
pub fn load_table(
    path: &Path,
    format: &SourceFormat,
    required: &[&str],
) -> Result<RawTable, SourceError> {
    let bytes = std::fs::read(path).map_err(|source| SourceError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.display());

    let text = decode(&bytes, &format.encoding, path)?;
    let body = skip_lines(&text, format.skip_rows);

    let delimiter = u8::try_from(format.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(SourceError::UnsupportedDelimiter {
            delimiter: format.delimiter,
        })?;

    let csv_error = |source| SourceError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        rows.push(record.iter().map(|v| v.trim().to_owned()).collect());
    }

    let table = RawTable::new(path, headers, rows);
    table.require_columns(required)?;

    log::info!(
        "Loaded {} rows ({} columns) from {}",
        table.len(),
        table.headers().len(),
        path.display()
    );

    Ok(table)
}

fn decode(bytes: &[u8], label: &str, path: &Path) -> Result<String, SourceError> {
    let encoding =
        encoding_rs::Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
            SourceError::UnknownEncoding {
                label: label.to_string(),
            }
        })?;

    // A BOM overrides the configured label and is stripped.
    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::warn!(
            "{} contains byte sequences invalid in {}; replaced with U+FFFD",
            path.display(),
            actual.name()
        );
    }

    Ok(text.into_owned())
}

fn skip_lines(text: &str, count: usize) -> &str {
    let mut rest = text;
    for _ in 0..count {
        match rest.find('\n') {
            Some(i) => rest = &rest[i + 1..],
            None => return "",
        }
    }
    rest
}
