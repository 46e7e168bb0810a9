use std::cmp::Ordering;
use std::fmt;

/// A river station as written in the survey table.
///
/// Stations are compared by value, so `100` and `100.0` name the same cross
/// section. The label keeps the text of the first record seen and is what
/// [`MatchPolicy::Legacy`](crate::geometry::MatchPolicy::Legacy) looks for in
/// a geometry file.
#[derive(Debug, Clone)]
pub struct Station {
    pub value: f64,
    pub label: String,
}

impl Station {
    /// Parses a station label, keeping the label text as given.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        let value = label.parse::<f64>().ok().filter(|v| v.is_finite())?;
        Some(Self {
            value,
            label: label.to_string(),
        })
    }
}

impl PartialEq for Station {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Station {}

impl Ord for Station {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.total_cmp(&other.value)
    }
}

impl PartialOrd for Station {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// River, reach and river station of one cross section.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CrossSectionKey {
    pub waterway: String,
    pub reach: String,
    pub station: Station,
}

impl CrossSectionKey {
    pub fn new(waterway: impl Into<String>, reach: impl Into<String>, station: Station) -> Self {
        Self {
            waterway: waterway.into(),
            reach: reach.into(),
            station,
        }
    }
}

impl fmt::Display for CrossSectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.waterway, self.reach, self.station)
    }
}

/// One surveyed station/elevation pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurveyPoint {
    /// Lateral offset within the cross section.
    pub measure: f64,
    pub elevation: f64,
}

impl SurveyPoint {
    pub fn new(measure: f64, elevation: f64) -> Self {
        Self { measure, elevation }
    }
}

/// All survey points of one cross section, in ascending measure order.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyGroup {
    pub key: CrossSectionKey,
    pub points: Vec<SurveyPoint>,
}

impl SurveyGroup {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of pairs the rewritten table holds: the survey points plus the
    /// two anchors kept from the original table.
    pub fn table_len(&self) -> usize {
        self.points.len() + 2
    }
}
