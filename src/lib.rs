pub mod config;
pub mod error;
pub mod geometry;
pub mod model;
pub mod pipeline;
pub mod survey;
pub mod writer;

pub use config::RewriteConfig;
pub use error::{DataSourceError, Error, FormatError, Result};
pub use geometry::{rewrite, GeometryDocument, MatchPolicy, RewriteOutcome, RewriteReport};
pub use model::{CrossSectionKey, Station, SurveyGroup, SurveyPoint};
pub use pipeline::{rewrite_directory, rewrite_file, FileOutcome};
pub use survey::SurveyTable;
pub use writer::GeometryWriter;
