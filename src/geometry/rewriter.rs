//! Survey substitution for geometry files.
//!
//! The rewriter walks the document once, line by line. A `River Reach=` line
//! selects a river and reach from the survey table, a `Type RM` line inside it
//! selects a cross section, and the `#Sta/Elev=` table of that cross section
//! is replaced up to the `#Mann=` line that follows it. The first and last
//! pairs of the old table are kept around the survey points so the section
//! stays tied to the terrain at its ends.

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::config::RewriteConfig;
use crate::error::{AnchorEnd, FormatError};
use crate::geometry::document::{DocumentLine, GeometryDocument};
use crate::geometry::fixed_width::{leading_pair, split_pairs, trailing_pair};
use crate::geometry::line_kind::{
    classify, is_table_terminator, CrossSectionHeader, LineKind, ReachHeader,
};
use crate::geometry::table::PointTableRecord;
use crate::model::{CrossSectionKey, SurveyGroup};
use crate::survey::SurveyTable;

/// What a rewrite did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewriteReport {
    /// Cross sections whose table was replaced, in document order.
    pub replaced: Vec<CrossSectionKey>,
    /// Survey cross sections that were never found in the document.
    pub unused: Vec<CrossSectionKey>,
    pub lines_read: usize,
    pub lines_written: usize,
}

#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub document: GeometryDocument,
    pub report: RewriteReport,
}

enum State<'a> {
    Idle,
    ReachMatched {
        waterway: &'a str,
        reach: &'a str,
    },
    StationMatched {
        waterway: &'a str,
        reach: &'a str,
        group: &'a SurveyGroup,
    },
    EmittingTable {
        waterway: &'a str,
        reach: &'a str,
        group: &'a SurveyGroup,
        record: PointTableRecord,
        header_line: usize,
        declared_count: Option<usize>,
        original_pairs: usize,
    },
}

pub struct Rewriter<'a> {
    survey: &'a SurveyTable,
    config: &'a RewriteConfig,
}

impl<'a> Rewriter<'a> {
    pub fn new(survey: &'a SurveyTable, config: &'a RewriteConfig) -> Self {
        Self { survey, config }
    }

    /// Produces a new document with every matched point table replaced.
    ///
    /// Nothing is returned on error; the caller never sees a partially
    /// rewritten document.
    pub fn rewrite(&self, document: &GeometryDocument) -> Result<RewriteOutcome, FormatError> {
        let lines = &document.lines;
        let mut out: Vec<DocumentLine> = Vec::with_capacity(lines.len());
        let mut replaced = Vec::new();
        let mut state = State::Idle;

        for (idx, line) in lines.iter().enumerate() {
            let current = std::mem::replace(&mut state, State::Idle);
            state = match current {
                State::EmittingTable {
                    waterway,
                    reach,
                    group,
                    record,
                    header_line,
                    declared_count,
                    original_pairs,
                } => match classify(&line.text) {
                    LineKind::Other => State::EmittingTable {
                        waterway,
                        reach,
                        group,
                        record,
                        header_line,
                        declared_count,
                        original_pairs: original_pairs + split_pairs(&line.text).len(),
                    },
                    // Another record starts before #Mann= closed this table.
                    LineKind::Reach(_) | LineKind::CrossSection(_) | LineKind::TableHeader(_) => {
                        return Err(FormatError::UnterminatedTable {
                            header_line: header_line + 1,
                        });
                    }
                    LineKind::TableTerminator => {
                        // The body is at least one line long, so the line
                        // before the terminator belongs to it.
                        let last_body = &lines[idx - 1];
                        let trailing =
                            trailing_pair(&last_body.text).ok_or(FormatError::AnchorTooShort {
                                line: idx,
                                end: AnchorEnd::Trailing,
                            })?;

                        if declared_count.is_some_and(|n| n != original_pairs) {
                            warn!(
                                "{}: #Sta/Elev= at line {} declares {:?} points but the table holds {}",
                                group.key,
                                header_line + 1,
                                declared_count,
                                original_pairs
                            );
                        }

                        for body in record.finish(trailing) {
                            out.push(DocumentLine::new(body, last_body.ending));
                        }
                        out.push(line.clone());
                        replaced.push(group.key.clone());
                        debug!("Replaced point table of {}", group.key);

                        State::ReachMatched { waterway, reach }
                    }
                },
                other => self.step(other, idx, line, lines, &mut out)?,
            };
        }

        if let State::EmittingTable { header_line, .. } = state {
            return Err(FormatError::UnterminatedTable {
                header_line: header_line + 1,
            });
        }

        let replaced_keys: BTreeSet<&CrossSectionKey> = replaced.iter().collect();
        let unused: Vec<CrossSectionKey> = self
            .survey
            .groups()
            .filter(|g| !replaced_keys.contains(&g.key))
            .map(|g| g.key.clone())
            .collect();
        for key in &unused {
            info!("No cross section found for survey data: {}", key);
        }

        let report = RewriteReport {
            replaced,
            unused,
            lines_read: lines.len(),
            lines_written: out.len(),
        };
        Ok(RewriteOutcome {
            document: GeometryDocument {
                lines: out,
                encoding: document.encoding,
            },
            report,
        })
    }

    /// Handles one line outside a point table.
    fn step(
        &self,
        state: State<'a>,
        idx: usize,
        line: &DocumentLine,
        lines: &[DocumentLine],
        out: &mut Vec<DocumentLine>,
    ) -> Result<State<'a>, FormatError> {
        let next = match (classify(&line.text), state) {
            (LineKind::Reach(header), _) => {
                out.push(self.copy(idx, line));
                match self.find_reach(&header) {
                    Some((waterway, reach)) => {
                        debug!("Found River Reach match: {} {}", waterway, reach);
                        State::ReachMatched { waterway, reach }
                    }
                    None => State::Idle,
                }
            }

            (
                LineKind::CrossSection(header),
                State::ReachMatched { waterway, reach }
                | State::StationMatched { waterway, reach, .. },
            ) => {
                out.push(self.copy(idx, line));
                match self.find_station(waterway, reach, &header) {
                    Some(group) => {
                        info!("Found River Station match: {}", group.key);
                        State::StationMatched {
                            waterway,
                            reach,
                            group,
                        }
                    }
                    None => State::ReachMatched { waterway, reach },
                }
            }

            (
                LineKind::TableHeader(header),
                State::StationMatched {
                    waterway,
                    reach,
                    group,
                },
            ) => {
                let first_body = match lines.get(idx + 1) {
                    None => {
                        return Err(FormatError::UnterminatedTable {
                            header_line: idx + 1,
                        })
                    }
                    Some(next) if is_table_terminator(&next.text) => {
                        return Err(FormatError::MissingTableBody { line: idx + 1 })
                    }
                    Some(next) => next,
                };
                let leading =
                    leading_pair(&first_body.text).ok_or(FormatError::AnchorTooShort {
                        line: idx + 2,
                        end: AnchorEnd::Leading,
                    })?;

                let record = PointTableRecord::open(leading, group)?;
                out.push(DocumentLine::new(
                    header.render(group.table_len()),
                    line.ending,
                ));

                State::EmittingTable {
                    waterway,
                    reach,
                    group,
                    record,
                    header_line: idx,
                    declared_count: header.count,
                    original_pairs: 0,
                }
            }

            (LineKind::TableTerminator, State::StationMatched { .. }) => {
                return Err(FormatError::TerminatorWithoutTable { line: idx + 1 });
            }

            (_, state) => {
                out.push(self.copy(idx, line));
                state
            }
        };
        Ok(next)
    }

    fn copy(&self, idx: usize, line: &DocumentLine) -> DocumentLine {
        if idx == 0 {
            DocumentLine::new(
                format!("{}{}", line.text, self.config.title_suffix),
                line.ending,
            )
        } else {
            line.clone()
        }
    }

    /// First survey river/reach, in table order, announced by `header`.
    fn find_reach(&self, header: &ReachHeader<'_>) -> Option<(&'a str, &'a str)> {
        let survey: &'a SurveyTable = self.survey;
        let policy = self.config.match_policy;
        survey
            .groups()
            .find(|g| policy.reach_matches(header, &g.key.waterway, &g.key.reach))
            .map(|g| (g.key.waterway.as_str(), g.key.reach.as_str()))
    }

    /// First non-empty group of the reach whose station `header` names.
    fn find_station(
        &self,
        waterway: &'a str,
        reach: &'a str,
        header: &CrossSectionHeader<'_>,
    ) -> Option<&'a SurveyGroup> {
        let survey: &'a SurveyTable = self.survey;
        let policy = self.config.match_policy;
        survey
            .reach_groups(waterway, reach)
            .find(|g| !g.is_empty() && policy.station_matches(header, &g.key.station))
    }
}

/// Rewrites `document` against `survey` with the given settings.
pub fn rewrite(
    document: &GeometryDocument,
    survey: &SurveyTable,
    config: &RewriteConfig,
) -> Result<RewriteOutcome, FormatError> {
    Rewriter::new(survey, config).rewrite(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::fixed_width::decode_pair;
    use crate::model::{Station, SurveyPoint};

    const GEOMETRY: &str = "\
Geom Title=Test Geometry
Program Version=5.07
River Reach=MainStem        ,UpperReach      
Reach XY= 1 
   1000.00   2000.00
Rch Text X Y=1000,2000

Type RM Length L Ch R = 1 ,12345.0 ,100,100,100
Node Last Edited Time=May/24/2021 10:00:00
#Sta/Elev= 3 
   0.000 100.000   5.000  98.000  10.000  95.000
#Mann= 3 , 0 , 0 
       0     .06       0       5    .035       0      10     .06       0
Bank Sta=5,10

Type RM Length L Ch R = 1 ,12000   ,100,100,100
#Sta/Elev= 2 
   0.000  50.000  20.000  55.000
#Mann= 2 , 0 , 0 
       0     .06       0      20     .06       0
";

    fn key(waterway: &str, reach: &str, station: &str) -> CrossSectionKey {
        CrossSectionKey::new(waterway, reach, Station::parse(station).unwrap())
    }

    fn survey(points: &[(&str, &str, &str, f64, f64)]) -> SurveyTable {
        points
            .iter()
            .map(|&(w, r, s, m, e)| (key(w, r, s), SurveyPoint::new(m, e)))
            .collect()
    }

    fn run(text: &str, table: &SurveyTable) -> Result<RewriteOutcome, FormatError> {
        rewrite(
            &GeometryDocument::from_text(text),
            table,
            &RewriteConfig::default(),
        )
    }

    #[test]
    fn test_replaces_matched_table() {
        let table = survey(&[
            ("MainStem", "UpperReach", "12345.0", 4.0, 98.7),
            ("MainStem", "UpperReach", "12345.0", 1.0, 99.5),
        ]);
        let outcome = run(GEOMETRY, &table).unwrap();

        let expected = GEOMETRY
            .replacen("Geom Title=Test Geometry", "Geom Title=Test Geometry_WithSurvey", 1)
            .replacen(
                "#Sta/Elev= 3 \n   0.000 100.000   5.000  98.000  10.000  95.000\n",
                "#Sta/Elev= 4\n   0.000 100.000   1.000  99.500   4.000  98.700  10.000  95.000\n",
                1,
            );
        assert_eq!(outcome.document.to_text(), expected);
        assert_eq!(
            outcome.report.replaced,
            vec![key("MainStem", "UpperReach", "12345.0")]
        );
        assert!(outcome.report.unused.is_empty());
        assert_eq!(outcome.report.lines_read, outcome.report.lines_written);
    }

    #[test]
    fn test_empty_survey_only_changes_title() {
        let outcome = run(GEOMETRY, &SurveyTable::empty()).unwrap();
        let expected = GEOMETRY.replacen(
            "Geom Title=Test Geometry\n",
            "Geom Title=Test Geometry_WithSurvey\n",
            1,
        );
        assert_eq!(outcome.document.to_text(), expected);
        assert!(outcome.report.replaced.is_empty());
    }

    #[test]
    fn test_sections_after_a_replaced_one_still_match() {
        let table = survey(&[
            ("MainStem", "UpperReach", "12345.0", 2.0, 97.0),
            ("MainStem", "UpperReach", "12000", 10.0, 52.0),
        ]);
        let outcome = run(GEOMETRY, &table).unwrap();
        let text = outcome.document.to_text();

        assert!(text.contains("#Sta/Elev= 3\n   0.000 100.000   2.000  97.000  10.000  95.000\n"));
        assert!(text.contains("#Sta/Elev= 3\n   0.000  50.000  10.000  52.000  20.000  55.000\n"));
        assert_eq!(outcome.report.replaced.len(), 2);
    }

    #[test]
    fn test_multi_line_table_keeps_first_and_last_pairs() {
        let geometry = "\
Geom Title=Wrap
River Reach=MainStem        ,UpperReach      
Type RM Length L Ch R = 1 ,500     ,10,10,10
#Sta/Elev= 7 
   0.000 100.000   1.000  99.000   2.000  98.000   3.000  97.000   4.000  96.000
   5.000  95.000  60.500  94.250
#Mann= 3 , 0 , 0 
";
        let points: Vec<_> = (1..=6)
            .rev()
            .map(|i| ("MainStem", "UpperReach", "500", i as f64 * 10.0, 90.0 + i as f64))
            .collect();
        let table = survey(&points);
        let outcome = run(geometry, &table).unwrap();
        let lines: Vec<&str> = outcome
            .document
            .lines
            .iter()
            .map(|l| l.text.as_str())
            .collect();

        assert_eq!(lines[3], "#Sta/Elev= 8");
        assert_eq!(lines[4].len(), 80);
        assert_eq!(lines[5].len(), 48);
        assert_eq!(lines[6], "#Mann= 3 , 0 , 0 ");

        let pairs: Vec<(f64, f64)> = lines[4..6]
            .iter()
            .flat_map(|l| crate::geometry::fixed_width::split_pairs(l))
            .map(|p| decode_pair(p).unwrap())
            .collect();
        assert_eq!(pairs.len(), 8);
        assert_eq!(pairs[0], (0.0, 100.0));
        assert_eq!(pairs[7], (60.5, 94.25));
        let interior: Vec<f64> = pairs[1..7].iter().map(|p| p.0).collect();
        assert_eq!(interior, vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
    }

    #[test]
    fn test_other_reach_with_same_station_untouched() {
        let geometry = "\
Geom Title=Reaches
River Reach=MainStem        ,LowerReach      
Type RM Length L Ch R = 1 ,12345.0 ,100,100,100
#Sta/Elev= 2 
   0.000 100.000  10.000  95.000
#Mann= 2 , 0 , 0 
";
        let table = survey(&[("MainStem", "UpperReach", "12345.0", 1.0, 99.5)]);
        let outcome = run(geometry, &table).unwrap();

        assert_eq!(
            outcome.document.to_text(),
            geometry.replacen("Reaches", "Reaches_WithSurvey", 1)
        );
        assert_eq!(
            outcome.report.unused,
            vec![key("MainStem", "UpperReach", "12345.0")]
        );
    }

    #[test]
    fn test_unmatched_reach_line_resets_reach() {
        let geometry = "\
Geom Title=Reset
River Reach=MainStem        ,UpperReach      
River Reach=Tributary       ,UpperReach      
Type RM Length L Ch R = 1 ,12345.0 ,100,100,100
#Sta/Elev= 2 
   0.000 100.000  10.000  95.000
#Mann= 2 , 0 , 0 
";
        let table = survey(&[("MainStem", "UpperReach", "12345.0", 1.0, 99.5)]);
        let outcome = run(geometry, &table).unwrap();
        assert!(outcome.report.replaced.is_empty());
    }

    #[test]
    fn test_crlf_document_keeps_line_endings() {
        let geometry = GEOMETRY.replace('\n', "\r\n");
        let table = survey(&[("MainStem", "UpperReach", "12345.0", 1.0, 99.5)]);
        let outcome = run(&geometry, &table).unwrap();
        let text = outcome.document.to_text();

        assert!(text.starts_with("Geom Title=Test Geometry_WithSurvey\r\n"));
        assert!(text.contains("#Sta/Elev= 3\r\n   0.000 100.000   1.000  99.500  10.000  95.000\r\n#Mann="));
        assert!(!text.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn test_short_anchor_lines_are_errors() {
        let table = survey(&[("MainStem", "UpperReach", "12345.0", 1.0, 99.5)]);

        let short_first = GEOMETRY.replacen(
            "   0.000 100.000   5.000  98.000  10.000  95.000",
            "   0.000",
            1,
        );
        assert_eq!(
            run(&short_first, &table).unwrap_err(),
            FormatError::AnchorTooShort {
                line: 11,
                end: AnchorEnd::Leading
            }
        );

        let short_last = GEOMETRY.replacen(
            "   0.000 100.000   5.000  98.000  10.000  95.000",
            "   0.000 100.000   5.000  98.000   5.000  98.000   5.000  98.000   5.000  98.000\n  10.0",
            1,
        );
        assert_eq!(
            run(&short_last, &table).unwrap_err(),
            FormatError::AnchorTooShort {
                line: 12,
                end: AnchorEnd::Trailing
            }
        );
    }

    #[test]
    fn test_unbalanced_tables_are_errors() {
        let table = survey(&[("MainStem", "UpperReach", "12345.0", 1.0, 99.5)]);

        let unterminated = "\
Geom Title=Open
River Reach=MainStem        ,UpperReach      
Type RM Length L Ch R = 1 ,12345.0 ,100,100,100
#Sta/Elev= 2 
   0.000 100.000  10.000  95.000
";
        assert_eq!(
            run(unterminated, &table).unwrap_err(),
            FormatError::UnterminatedTable { header_line: 4 }
        );

        let no_table = "\
Geom Title=NoTable
River Reach=MainStem        ,UpperReach      
Type RM Length L Ch R = 1 ,12345.0 ,100,100,100
#Mann= 2 , 0 , 0 
";
        assert_eq!(
            run(no_table, &table).unwrap_err(),
            FormatError::TerminatorWithoutTable { line: 4 }
        );

        let empty_body = "\
Geom Title=Empty
River Reach=MainStem        ,UpperReach      
Type RM Length L Ch R = 1 ,12345.0 ,100,100,100
#Sta/Elev= 0 
#Mann= 2 , 0 , 0 
";
        assert_eq!(
            run(empty_body, &table).unwrap_err(),
            FormatError::MissingTableBody { line: 4 }
        );
    }

    #[test]
    fn test_next_record_inside_open_table_is_error() {
        let table = survey(&[("MainStem", "UpperReach", "12345.0", 1.0, 99.5)]);

        // #Mann= of the matched section is missing, the 12000 section follows
        let missing_mann = GEOMETRY.replacen("#Mann= 3 , 0 , 0 \n", "", 1);
        assert_eq!(
            run(&missing_mann, &table).unwrap_err(),
            FormatError::UnterminatedTable { header_line: 10 }
        );

        let next_header = GEOMETRY.replacen("#Mann= 3 , 0 , 0 \n", "#Sta/Elev= 2 \n", 1);
        assert_eq!(
            run(&next_header, &table).unwrap_err(),
            FormatError::UnterminatedTable { header_line: 10 }
        );

        let next_reach = GEOMETRY.replacen(
            "#Mann= 3 , 0 , 0 \n",
            "River Reach=MainStem        ,LowerReach      \n",
            1,
        );
        assert_eq!(
            run(&next_reach, &table).unwrap_err(),
            FormatError::UnterminatedTable { header_line: 10 }
        );
    }

    #[test]
    fn test_exact_policy_ignores_reach_prefix() {
        let geometry = GEOMETRY.replace("UpperReach      ", "UpperReach2     ");
        let table = survey(&[("MainStem", "UpperReach", "12345.0", 1.0, 99.5)]);
        let document = GeometryDocument::from_text(&geometry);

        let legacy = rewrite(&document, &table, &RewriteConfig::default()).unwrap();
        assert_eq!(legacy.report.replaced.len(), 1);

        let config = RewriteConfig::default().with_match_policy(crate::geometry::MatchPolicy::Exact);
        let exact = rewrite(&document, &table, &config).unwrap();
        assert!(exact.report.replaced.is_empty());
    }
}
