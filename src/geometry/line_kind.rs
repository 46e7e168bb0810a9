//! Field extraction for the geometry file lines the rewriter cares about.

pub const REACH_MARKER: &str = "River Reach=";
pub const CROSS_SECTION_MARKER: &str = "Type RM";
pub const TABLE_HEADER_MARKER: &str = "#Sta/Elev=";
pub const TABLE_TERMINATOR_MARKER: &str = "#Mann=";

/// `River Reach=<river, 16 chars>,<reach>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReachHeader<'a> {
    /// Everything after the marker, untrimmed.
    pub fields: &'a str,
    pub waterway: &'a str,
    pub reach: &'a str,
}

impl<'a> ReachHeader<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let (_, fields) = line.split_once(REACH_MARKER)?;
        let (waterway, reach) = fields.split_once(',').unwrap_or((fields, ""));
        Some(Self {
            fields,
            waterway: waterway.trim(),
            reach: reach.trim(),
        })
    }
}

/// `Type RM Length L Ch R = <type> ,<station, 8 chars>,<lengths...>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossSectionHeader<'a> {
    /// Text following the comma that opens the station field, untrimmed.
    pub station_field: Option<&'a str>,
    pub station: Option<&'a str>,
}

impl<'a> CrossSectionHeader<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let (_, after_marker) = line.split_once(CROSS_SECTION_MARKER)?;
        let station_field = after_marker
            .split_once('=')
            .and_then(|(_, values)| values.split_once(','))
            .map(|(_, rest)| rest);
        let station = station_field
            .and_then(|rest| rest.split(',').next())
            .map(str::trim);
        Some(Self {
            station_field,
            station,
        })
    }
}

/// `#Sta/Elev= <count>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHeader<'a> {
    /// Text before the marker, normally empty.
    pub prefix: &'a str,
    pub count: Option<usize>,
}

impl<'a> TableHeader<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let (prefix, count) = line.split_once(TABLE_HEADER_MARKER)?;
        Some(Self {
            prefix,
            count: count.trim().parse().ok(),
        })
    }

    /// Header line announcing `count` pairs.
    pub fn render(&self, count: usize) -> String {
        format!("{}{} {}", self.prefix, TABLE_HEADER_MARKER, count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Reach(ReachHeader<'a>),
    CrossSection(CrossSectionHeader<'a>),
    TableHeader(TableHeader<'a>),
    TableTerminator,
    Other,
}

pub fn is_table_terminator(line: &str) -> bool {
    line.contains(TABLE_TERMINATOR_MARKER)
}

/// Classifies a line by the marker it contains.
pub fn classify(line: &str) -> LineKind<'_> {
    if is_table_terminator(line) {
        LineKind::TableTerminator
    } else if let Some(header) = TableHeader::parse(line) {
        LineKind::TableHeader(header)
    } else if let Some(header) = ReachHeader::parse(line) {
        LineKind::Reach(header)
    } else if let Some(header) = CrossSectionHeader::parse(line) {
        LineKind::CrossSection(header)
    } else {
        LineKind::Other
    }
}
