pub mod document;
pub mod fixed_width;
pub mod line_kind;
pub mod matching;
pub mod rewriter;
pub mod table;

pub use document::{DocumentLine, GeometryDocument, LineEnding, TextEncoding};
pub use matching::MatchPolicy;
pub use rewriter::{rewrite, RewriteOutcome, RewriteReport, Rewriter};
pub use table::PointTableRecord;
