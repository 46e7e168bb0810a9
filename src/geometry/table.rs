use crate::error::FormatError;
use crate::geometry::fixed_width::{encode_pair, pack_pairs};
use crate::model::SurveyGroup;

/// Replacement point table for one cross section.
///
/// Holds the first pair of the original table verbatim, then the survey
/// points of the group in stored order. The last original pair is only
/// known once the end of the old table is reached and is supplied to
/// [`PointTableRecord::finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointTableRecord {
    pairs: Vec<String>,
}

impl PointTableRecord {
    pub fn open(leading_anchor: &str, group: &SurveyGroup) -> Result<Self, FormatError> {
        let mut pairs = Vec::with_capacity(group.table_len());
        pairs.push(leading_anchor.to_string());
        for point in &group.points {
            pairs.push(encode_pair(point.measure, point.elevation)?);
        }
        Ok(Self { pairs })
    }

    #[cfg(test)]
    fn pairs(&self) -> &[String] {
        &self.pairs
    }

    /// Appends the trailing anchor and packs the table into body lines.
    pub fn finish(mut self, trailing_anchor: &str) -> Vec<String> {
        self.pairs.push(trailing_anchor.to_string());
        pack_pairs(&self.pairs)
    }
}
