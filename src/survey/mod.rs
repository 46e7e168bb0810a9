//! Survey table loading.
//!
//! The survey table is a CSV export of linear referenced survey points. Only
//! the `River`, `Reach`, `RiverStation`, `MEAS` and `ELEV` columns are read;
//! any other column is ignored.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::DataSourceError;
use crate::model::{CrossSectionKey, Station, SurveyGroup, SurveyPoint};

pub const REQUIRED_COLUMNS: [&str; 5] = ["River", "Reach", "RiverStation", "MEAS", "ELEV"];

#[derive(Debug, Deserialize)]
struct SurveyRecord {
    #[serde(rename = "River")]
    river: String,
    #[serde(rename = "Reach")]
    reach: String,
    #[serde(rename = "RiverStation")]
    river_station: String,
    #[serde(rename = "MEAS")]
    measure: f64,
    #[serde(rename = "ELEV")]
    elevation: f64,
}

/// Survey points grouped by cross section.
///
/// Groups iterate in (river, reach, numeric station) order and the points of
/// each group are sorted by ascending measure. The table is never modified
/// once built.
#[derive(Debug, Clone, Default)]
pub struct SurveyTable {
    groups: BTreeMap<CrossSectionKey, SurveyGroup>,
}

impl SurveyTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads a survey table from a CSV file.
    pub fn from_path(path: &Path) -> Result<Self, DataSourceError> {
        info!("Reading survey data file: {:?}", path);
        let file = File::open(path).map_err(|source| DataSourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Loads a survey table from CSV text.
    ///
    /// Fails without a partial result if a required column is absent or any
    /// record cannot be read.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataSourceError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let missing: Vec<&'static str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .collect();
        if !missing.is_empty() {
            return Err(DataSourceError::MissingColumns { columns: missing });
        }

        let mut points = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let row: SurveyRecord = record.deserialize(Some(&headers)).map_err(|e| {
                DataSourceError::InvalidRecord {
                    line,
                    message: e.to_string(),
                }
            })?;

            let station = Station::parse(&row.river_station).ok_or_else(|| {
                DataSourceError::InvalidRecord {
                    line,
                    message: format!("RiverStation '{}' is not a number", row.river_station),
                }
            })?;
            if !row.measure.is_finite() || !row.elevation.is_finite() {
                return Err(DataSourceError::InvalidRecord {
                    line,
                    message: "MEAS and ELEV must be finite numbers".to_string(),
                });
            }

            points.push((
                CrossSectionKey::new(row.river, row.reach, station),
                SurveyPoint::new(row.measure, row.elevation),
            ));
        }

        let table: SurveyTable = points.into_iter().collect();
        info!(
            "Loaded {} survey points in {} cross sections",
            table.point_count(),
            table.len()
        );
        Ok(table)
    }

    /// Number of cross sections.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of survey points over all cross sections.
    pub fn point_count(&self) -> usize {
        self.groups.values().map(SurveyGroup::len).sum()
    }

    pub fn get(&self, key: &CrossSectionKey) -> Option<&SurveyGroup> {
        self.groups.get(key)
    }

    pub fn groups(&self) -> impl Iterator<Item = &SurveyGroup> {
        self.groups.values()
    }

    /// Groups belonging to one river and reach, in station order.
    pub fn reach_groups<'a>(
        &'a self,
        waterway: &'a str,
        reach: &'a str,
    ) -> impl Iterator<Item = &'a SurveyGroup> + 'a {
        self.groups
            .values()
            .filter(move |g| g.key.waterway == waterway && g.key.reach == reach)
    }
}

impl FromIterator<(CrossSectionKey, SurveyPoint)> for SurveyTable {
    fn from_iter<I: IntoIterator<Item = (CrossSectionKey, SurveyPoint)>>(iter: I) -> Self {
        let mut groups: BTreeMap<CrossSectionKey, SurveyGroup> = BTreeMap::new();
        for (key, point) in iter {
            groups
                .entry(key)
                .or_insert_with_key(|key| SurveyGroup {
                    key: key.clone(),
                    points: Vec::new(),
                })
                .points
                .push(point);
        }

        // Stable, so equal measures keep their input order.
        for group in groups.values_mut() {
            group.points.sort_by(|a, b| a.measure.total_cmp(&b.measure));
            debug!("{}: {} survey points", group.key, group.len());
        }

        Self { groups }
    }
}
