//! Output artifacts: the scored table as CSV and any decoded plot images.
//!
//! The two kinds of artifact are written independently; a failure on one
//! does not stop the other from being attempted.

use crate::error::{Error, Result};
use crate::scoring::{EncodedPlot, OutputTable, ScoringResponse};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use uuid::Uuid;

/// Outcome of writing one response
#[derive(Debug)]
pub struct WrittenArtifacts {
    pub table: Result<PathBuf>,
    pub images: Vec<Result<PathBuf>>,
}

impl WrittenArtifacts {
    pub fn table_path(&self) -> Option<&Path> {
        self.table.as_ref().ok().map(PathBuf::as_path)
    }

    pub fn image_paths(&self) -> Vec<&Path> {
        self.images
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(PathBuf::as_path)
            .collect()
    }

    pub fn errors(&self) -> Vec<&Error> {
        std::iter::once(&self.table)
            .chain(self.images.iter())
            .filter_map(|r| r.as_ref().err())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.errors().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ResultWriter {
    /// Directory for generated file names
    directory: PathBuf,
}

impl Default for ResultWriter {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

impl ResultWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.directory = directory.into();
        self
    }

    /// Write the table to `output` (or a generated `<uuid>.csv`) and each
    /// plot next to it as `<stem>-<n>.<ext>`.
    pub fn write(&self, response: &ScoringResponse, output: Option<&Path>) -> WrittenArtifacts {
        let table_path = match output {
            Some(path) => path.to_path_buf(),
            None => self.generated_table_path(),
        };

        let table = write_file(&table_path, render_table(&response.table).as_bytes())
            .map(|()| table_path.clone());
        match &table {
            Ok(path) => info!(path = %path.display(), rows = response.table.rows.len(), "Result table written"),
            Err(e) => error!(error = %e, "Failed to write result table"),
        }

        let images = response
            .plots
            .iter()
            .enumerate()
            .map(|(index, plot)| {
                let written = write_plot(&table_path, index, plot);
                match &written {
                    Ok(path) => info!(path = %path.display(), "Plot image written"),
                    Err(e) => error!(index, error = %e, "Failed to write plot image"),
                }
                written
            })
            .collect();

        WrittenArtifacts { table, images }
    }

    fn generated_table_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.csv", Uuid::new_v4().simple()))
    }
}

/// Header line then one line per row, cells verbatim and comma-joined
pub fn render_table(table: &OutputTable) -> String {
    std::iter::once(&table.column_names)
        .chain(&table.rows)
        .map(|row| format!("{}\n", row.join(",")))
        .collect()
}

fn write_plot(table_path: &Path, index: usize, plot: &EncodedPlot) -> Result<PathBuf> {
    let bytes = plot.decode()?;
    let path = image_path(table_path, index, image_extension(&bytes));
    write_file(&path, &bytes)?;
    Ok(path)
}

/// `<dir>/<stem>-<index>.<ext>` next to the table file
pub fn image_path(table_path: &Path, index: usize, extension: &str) -> PathBuf {
    let stem = table_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plot".to_string());
    table_path.with_file_name(format!("{stem}-{index}.{extension}"))
}

/// Pick an extension from the image magic bytes
pub fn image_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpg"
    } else if bytes.starts_with(b"GIF8") {
        "gif"
    } else {
        "png"
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    write_with(path, |file| file.write_all(bytes))
}

/// Create `path` and fill it. On failure a file this call created is
/// removed; a file that already existed is left in place.
fn write_with<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut fs::File) -> io::Result<()>,
{
    let existed = path.exists();
    fs::File::create(path)
        .and_then(|mut file| fill(&mut file))
        .map_err(|source| {
            if !existed {
                let _ = fs::remove_file(path);
            }
            Error::Write {
                path: path.to_path_buf(),
                source,
            }
        })
}
