//! File layout and column names of the three raw sources.

use serde::{Deserialize, Serialize};

/// How a delimited text file is laid out on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFormat {
    /// File name, relative to the dataset directory.
    pub file: String,
    /// Field delimiter.
    pub delimiter: char,
    /// Text encoding label (`"utf-8"`, `"windows-1252"`, ...).
    pub encoding: String,
    /// Number of preamble lines before the header row.
    #[serde(default)]
    pub skip_rows: usize,
}

/// Station registry layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationSourceConfig {
    /// File layout.
    #[serde(flatten)]
    pub format: SourceFormat,
    /// Column names.
    pub columns: StationColumns,
}

/// Column names in the station registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationColumns {
    /// Optional station identifier column. Rows are numbered when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Administrative region (federal state) name.
    pub region: String,
    /// Latitude, possibly with a decimal comma.
    pub latitude: String,
    /// Longitude, possibly with a decimal comma.
    pub longitude: String,
    /// Rated power in kilowatts, possibly with a decimal comma.
    pub power_kw: String,
    /// Declared postal area code.
    pub area_code: String,
}

impl StationColumns {
    /// Columns that must be present in the header.
    #[must_use]
    pub fn required(&self) -> Vec<&str> {
        let mut columns = vec![
            self.region.as_str(),
            self.latitude.as_str(),
            self.longitude.as_str(),
            self.power_kw.as_str(),
            self.area_code.as_str(),
        ];
        if let Some(id) = &self.id {
            columns.push(id);
        }
        columns
    }
}

/// Population table layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationSourceConfig {
    /// File layout.
    #[serde(flatten)]
    pub format: SourceFormat,
    /// Column names.
    pub columns: PopulationColumns,
}

/// Column names in the population table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationColumns {
    /// Postal area code (often numeric-typed).
    pub area_code: String,
    /// Resident count.
    pub population: String,
    /// Optional reference latitude, carried through for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    /// Optional reference longitude, carried through for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
}

impl PopulationColumns {
    /// Columns that must be present in the header.
    #[must_use]
    pub fn required(&self) -> Vec<&str> {
        vec![self.area_code.as_str(), self.population.as_str()]
    }
}

/// Geometry table layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometrySourceConfig {
    /// File layout.
    #[serde(flatten)]
    pub format: SourceFormat,
    /// Column names.
    pub columns: GeometryColumns,
}

/// Column names in the geometry table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryColumns {
    /// Postal area code.
    pub area_code: String,
    /// Boundary as WKT or a `GeoJSON` geometry object.
    pub geometry: String,
}

impl GeometryColumns {
    /// Columns that must be present in the header.
    #[must_use]
    pub fn required(&self) -> Vec<&str> {
        vec![self.area_code.as_str(), self.geometry.as_str()]
    }
}

/// Layouts of all three sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Station registry.
    pub stations: StationSourceConfig,
    /// Population table.
    pub population: PopulationSourceConfig,
    /// Geometry table.
    pub geometry: GeometrySourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            stations: StationSourceConfig {
                format: SourceFormat {
                    file: "Ladesaeulenregister.csv".to_string(),
                    delimiter: ';',
                    encoding: "windows-1252".to_string(),
                    skip_rows: 10,
                },
                columns: StationColumns {
                    id: None,
                    region: "Bundesland".to_string(),
                    latitude: "Breitengrad".to_string(),
                    longitude: "Längengrad".to_string(),
                    power_kw: "Nennleistung Ladeeinrichtung [kW]".to_string(),
                    area_code: "Postleitzahl".to_string(),
                },
            },
            population: PopulationSourceConfig {
                format: SourceFormat {
                    file: "plz_einwohner.csv".to_string(),
                    delimiter: ',',
                    encoding: "utf-8".to_string(),
                    skip_rows: 0,
                },
                columns: PopulationColumns {
                    area_code: "plz".to_string(),
                    population: "einwohner".to_string(),
                    latitude: Some("lat".to_string()),
                    longitude: Some("lon".to_string()),
                },
            },
            geometry: GeometrySourceConfig {
                format: SourceFormat {
                    file: "geodata_berlin_plz.csv".to_string(),
                    delimiter: ';',
                    encoding: "utf-8".to_string(),
                    skip_rows: 0,
                },
                columns: GeometryColumns {
                    area_code: "PLZ".to_string(),
                    geometry: "geometry".to_string(),
                },
            },
        }
    }
}
