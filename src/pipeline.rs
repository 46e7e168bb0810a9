//! File level entry points: one geometry file, or every geometry file in a
//! directory.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::RewriteConfig;
use crate::error::{Error, Result};
use crate::geometry::{rewrite, GeometryDocument, RewriteReport};
use crate::survey::SurveyTable;
use crate::writer::GeometryWriter;

/// Rewrites `input` against `survey` and writes the result to `output`.
///
/// The output file is only created when the whole document was rewritten.
pub fn rewrite_file(
    input: &Path,
    survey: &SurveyTable,
    output: &Path,
    config: &RewriteConfig,
) -> Result<RewriteReport> {
    info!("Reading HEC-RAS geometry file: {:?}", input);
    let document = GeometryDocument::read(input)?;
    let outcome = rewrite(&document, survey, config)?;

    GeometryWriter::new().write(&outcome.document, output)?;
    info!(
        "New geometry file with survey is: {:?} ({} cross sections replaced)",
        output,
        outcome.report.replaced.len()
    );
    Ok(outcome.report)
}

/// Result of rewriting one file of a directory.
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: Result<RewriteReport>,
}

/// Rewrites every geometry file directly inside `dir` in parallel.
///
/// Outputs keep their file name and are written to `output_dir`, which must
/// not be `dir` itself. A failing file does not stop the others; every
/// outcome is returned.
pub fn rewrite_directory(
    dir: &Path,
    survey: &SurveyTable,
    output_dir: &Path,
    config: &RewriteConfig,
) -> Result<Vec<FileOutcome>> {
    if same_directory(dir, output_dir) {
        return Err(Error::OutputOverwritesInput {
            path: output_dir.to_path_buf(),
        });
    }

    let inputs = collect_geometry_files(dir, config)?;
    info!("Found {} geometry files", inputs.len());

    fs::create_dir_all(output_dir).map_err(|source| Error::Output {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let outcomes: Vec<FileOutcome> = inputs
        .into_par_iter()
        .map(|input| {
            let output = match input.file_name() {
                Some(name) => output_dir.join(name),
                None => output_dir.to_path_buf(),
            };
            let result = rewrite_file(&input, survey, &output, config);
            if let Err(e) = &result {
                error!("{}: {}", input.display(), e);
            }
            FileOutcome {
                input,
                output,
                result,
            }
        })
        .collect();

    Ok(outcomes)
}

/// Whether both paths resolve to the same directory. A path that does not
/// exist yet cannot be an existing input directory.
fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// HEC-RAS geometry files are `.g01` to `.g99`.
pub fn is_geometry_extension(extension: &str, config: &RewriteConfig) -> bool {
    let bytes = extension.as_bytes();
    bytes.len() == 3
        && bytes[0].eq_ignore_ascii_case(&b'g')
        && bytes[1..].iter().all(u8::is_ascii_digit)
        && !extension.eq_ignore_ascii_case(&config.output_extension)
}

fn collect_geometry_files(dir: &Path, config: &RewriteConfig) -> Result<Vec<PathBuf>> {
    let input_error = |source: std::io::Error| Error::Input {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(input_error)? {
        let path = entry.map_err(input_error)?.path();
        if !path.is_file() {
            continue;
        }
        let is_geometry = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| is_geometry_extension(ext, config));
        if is_geometry {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
