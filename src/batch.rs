//! Directory-level processing: one outline JSON per input PDF.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::OutlineConfig;
use crate::error::{Error, Result};
use crate::model::{JsonFormat, Outline};
use crate::outline::Outliner;
use crate::schema;

/// A document that was written successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTiming {
    pub input: PathBuf,
    pub output: PathBuf,
    pub elapsed: Duration,
}

/// A document that could not be processed.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFailure {
    pub input: PathBuf,
    pub message: String,
    /// I/O or PDF read failure, as opposed to an outline that failed validation
    pub unreadable: bool,
}

impl DocumentFailure {
    /// Record the error that stopped `input`.
    pub fn new(input: PathBuf, err: &Error) -> Self {
        Self {
            input,
            message: err.to_string(),
            unreadable: err.is_extraction_failure(),
        }
    }
}

/// Outcome of one document, as passed to progress callbacks.
#[derive(Debug, Clone, Copy)]
pub enum DocumentOutcome<'a> {
    Written(&'a DocumentTiming),
    Failed(&'a DocumentFailure),
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub succeeded: Vec<DocumentTiming>,
    pub failed: Vec<DocumentFailure>,
}

impl BatchReport {
    /// Number of documents attempted.
    pub fn processed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Mean wall time over successful documents.
    pub fn average(&self) -> Option<Duration> {
        if self.succeeded.is_empty() {
            return None;
        }
        let total: Duration = self.succeeded.iter().map(|t| t.elapsed).sum();
        Some(total / self.succeeded.len() as u32)
    }
}

/// Runs the outliner over every PDF in a directory.
pub struct BatchRunner {
    outliner: Outliner,
}

impl BatchRunner {
    /// Create a runner; the config is validated once here.
    pub fn new(config: OutlineConfig) -> Result<Self> {
        Ok(Self {
            outliner: Outliner::new(config)?,
        })
    }

    /// The `*.pdf` files of a directory, sorted by name.
    pub fn list_inputs<P: AsRef<Path>>(input_dir: P) -> Result<Vec<PathBuf>> {
        let mut pdfs: Vec<PathBuf> = fs::read_dir(input_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "pdf"))
            .collect();
        pdfs.sort();
        Ok(pdfs)
    }

    /// Process every PDF in `input_dir`, writing JSON into `output_dir`.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(&self, input_dir: P, output_dir: Q) -> Result<BatchReport> {
        self.run_with_progress(input_dir, output_dir, |_| {})
    }

    /// Like [`run`](Self::run), reporting each document as it finishes.
    ///
    /// Per-document failures are collected in the report. Only a missing
    /// input directory or an unwritable output directory fails the run.
    pub fn run_with_progress<P, Q, F>(&self, input_dir: P, output_dir: Q, mut progress: F) -> Result<BatchReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        F: FnMut(DocumentOutcome<'_>),
    {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;

        let pdfs = Self::list_inputs(input_dir.as_ref())?;
        if pdfs.is_empty() {
            log::warn!("No PDFs found in {}", input_dir.as_ref().display());
            return Ok(BatchReport::default());
        }

        let mut report = BatchReport::default();
        for pdf in pdfs {
            let name = file_name(&pdf);
            let start = Instant::now();
            match self.process_one(&pdf, output_dir) {
                Ok(output) => {
                    let timing = DocumentTiming {
                        input: pdf,
                        output,
                        elapsed: start.elapsed(),
                    };
                    log::info!("✓ {} ({:.2}s)", name, timing.elapsed.as_secs_f64());
                    progress(DocumentOutcome::Written(&timing));
                    report.succeeded.push(timing);
                }
                Err(e) => {
                    let failure = DocumentFailure::new(pdf, &e);
                    if failure.unreadable {
                        log::error!("✗ {}: {}", name, e);
                    } else {
                        log::error!("✗ {}: outline rejected: {}", name, e);
                    }
                    progress(DocumentOutcome::Failed(&failure));
                    report.failed.push(failure);
                }
            }
        }

        if let Some(avg) = report.average() {
            log::info!(
                "Processed {} PDFs, avg {:.2}s",
                report.succeeded.len(),
                avg.as_secs_f64()
            );
        }
        Ok(report)
    }

    fn process_one(&self, pdf: &Path, output_dir: &Path) -> Result<PathBuf> {
        let outline = self.outliner.extract_file(pdf)?;
        let output = output_dir.join(output_name(pdf));
        write_outline(&outline, &output)?;
        Ok(output)
    }
}

/// Validate an outline and write it as pretty JSON.
pub fn write_outline(outline: &Outline, path: &Path) -> Result<()> {
    schema::validate(outline)?;
    fs::write(path, outline.to_json(JsonFormat::Pretty)?)?;
    Ok(())
}

fn output_name(pdf: &Path) -> String {
    let stem = pdf.file_stem().unwrap_or_default().to_string_lossy();
    format!("{}.json", stem)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_inputs_sorted_pdfs_only() {
        let dir = TempDir::new().unwrap();
        for name in ["b.pdf", "a.pdf", "notes.txt", "c.PDFX"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let names: Vec<_> = BatchRunner::list_inputs(dir.path())
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();
        assert_eq!(names, ["a.pdf", "b.pdf"]);
    }

    #[test]
    fn test_empty_directory_is_not_an_error() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let runner = BatchRunner::new(OutlineConfig::default()).unwrap();

        let report = runner.run(input.path(), output.path().join("out")).unwrap();
        assert_eq!(report.processed(), 0);
        assert_eq!(report.average(), None);
        assert!(output.path().join("out").is_dir());
    }

    #[test]
    fn test_bad_file_fails_in_isolation() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        fs::write(input.path().join("broken.pdf"), b"this is not a pdf").unwrap();
        fs::write(input.path().join("empty.pdf"), b"").unwrap();

        let runner = BatchRunner::new(OutlineConfig::default()).unwrap();
        let mut seen = 0;
        let report = runner
            .run_with_progress(input.path(), output.path(), |outcome| {
                assert!(matches!(outcome, DocumentOutcome::Failed(_)));
                seen += 1;
            })
            .unwrap();

        assert_eq!(seen, 2);
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed.iter().all(|f| f.unreadable));
        assert!(report.succeeded.is_empty());
        assert!(!output.path().join("broken.json").exists());
    }

    #[test]
    fn test_missing_input_directory_fails() {
        let output = TempDir::new().unwrap();
        let runner = BatchRunner::new(OutlineConfig::default()).unwrap();
        assert!(runner.run("/nonexistent/pdf/input", output.path()).is_err());
    }

    #[test]
    fn test_write_outline_pretty_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        write_outline(&Outline::empty(), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n  \"title\": \"\",\n  \"outline\": []\n}");
    }

    #[test]
    fn test_failure_kind() {
        let unreadable = DocumentFailure::new(PathBuf::from("a.pdf"), &Error::UnknownFormat);
        assert!(unreadable.unreadable);

        let rejected = DocumentFailure::new(
            PathBuf::from("b.pdf"),
            &Error::schema("$.outline[0].level", "expected one of H1, H2, H3"),
        );
        assert!(!rejected.unreadable);
        assert!(rejected.message.contains("$.outline[0].level"));
    }

    #[test]
    fn test_report_average() {
        let timing = |ms| DocumentTiming {
            input: PathBuf::from("a.pdf"),
            output: PathBuf::from("a.json"),
            elapsed: Duration::from_millis(ms),
        };
        let report = BatchReport {
            succeeded: vec![timing(100), timing(300)],
            failed: vec![DocumentFailure::new(
                PathBuf::from("b.pdf"),
                &Error::TextExtract("bad".to_string()),
            )],
        };
        assert_eq!(report.processed(), 3);
        assert_eq!(report.average(), Some(Duration::from_millis(200)));
    }
}
