use crate::geometry::line_kind::{CrossSectionHeader, ReachHeader};
use crate::model::Station;

pub const WATERWAY_WIDTH: usize = 16;
pub const STATION_WIDTH: usize = 8;

/// How survey keys are compared with the fields of a geometry line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// The key is formatted into the file's fixed-width layout and must
    /// prefix the extracted field. A reach name that starts another reach's
    /// name, or a station label that starts a longer label, also matches.
    ///
    /// Only the station field right after `=` is looked at. A later comma
    /// field of the line, such as a reach length that happens to read like
    /// the station, never matches.
    #[default]
    Legacy,
    /// Trimmed river and reach must equal the key, and the station field
    /// must parse to the key's station value.
    Exact,
}

impl MatchPolicy {
    pub fn reach_matches(self, header: &ReachHeader<'_>, waterway: &str, reach: &str) -> bool {
        match self {
            MatchPolicy::Legacy => header
                .fields
                .starts_with(&format!("{:<width$},{}", waterway, reach, width = WATERWAY_WIDTH)),
            MatchPolicy::Exact => header.waterway == waterway && header.reach == reach,
        }
    }

    pub fn station_matches(self, header: &CrossSectionHeader<'_>, station: &Station) -> bool {
        match self {
            MatchPolicy::Legacy => header.station_field.is_some_and(|field| {
                field.starts_with(&format!("{:<width$}", station.label, width = STATION_WIDTH))
            }),
            MatchPolicy::Exact => header
                .station
                .and_then(|field| field.parse::<f64>().ok())
                .is_some_and(|value| value == station.value),
        }
    }
}
