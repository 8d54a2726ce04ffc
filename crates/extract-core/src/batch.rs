//! Multi-document batch runs
//!
//! Each document gets its own CSV sink and context. A failure while opening
//! or rendering a document stops that document only; the batch moves on and
//! the summary records where it stopped.

use crate::assembler::PageContext;
use crate::config::{ContextScope, OutputConfig};
use crate::error::{PipelineError, Result};
use crate::gate::PageGate;
use crate::pipeline::DiaryPipeline;
use crate::sink::CsvSink;
use diary_region_detection::RegionDetector;
use diary_text_recognition::TextRecognizer;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{error, info, warn};

/// Inclusive, 1-based page range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub first: u32,
    pub last: u32,
}

impl PageRange {
    pub fn new(first: u32, last: u32) -> Result<Self> {
        if first == 0 || last < first {
            return Err(PipelineError::InvalidPageRange(format!("{first}-{last}")));
        }
        Ok(Self { first, last })
    }

    /// Check the range against a document's page count
    pub fn check(&self, page_count: u32) -> Result<()> {
        if self.last > page_count {
            return Err(PipelineError::PageRange {
                first: self.first,
                last: self.last,
                count: page_count,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        (self.first..=self.last).contains(&page)
    }
}

impl FromStr for PageRange {
    type Err = PipelineError;

    /// Accepts `N` or `FIRST-LAST`
    fn from_str(s: &str) -> Result<Self> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| PipelineError::InvalidPageRange(s.to_string()))
        };
        match s.split_once('-') {
            Some((first, last)) => Self::new(parse(first)?, parse(last)?),
            None => {
                let page = parse(s)?;
                Self::new(page, page)
            }
        }
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// Rasterization collaborator: renders document pages in order.
///
/// `visit` receives the 1-based page number and bitmap. An error from
/// `visit` stops rendering and is returned unchanged.
pub trait PageSource {
    fn render_pages(
        &mut self,
        path: &Path,
        range: Option<PageRange>,
        visit: &mut dyn FnMut(u32, RgbImage) -> Result<()>,
    ) -> Result<()>;
}

/// Outcome of one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub csv_path: PathBuf,
    pub pages_processed: u32,
    pub pages_rejected: u32,
    pub records_written: usize,
    /// Set when the document stopped before its last page
    pub error: Option<String>,
}

impl DocumentReport {
    #[must_use]
    pub fn stopped_early(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub documents: Vec<DocumentReport>,
}

impl BatchSummary {
    #[must_use]
    pub fn pages_processed(&self) -> u32 {
        self.documents.iter().map(|d| d.pages_processed).sum()
    }

    #[must_use]
    pub fn pages_rejected(&self) -> u32 {
        self.documents.iter().map(|d| d.pages_rejected).sum()
    }

    #[must_use]
    pub fn records_written(&self) -> usize {
        self.documents.iter().map(|d| d.records_written).sum()
    }

    pub fn stopped_early(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| d.stopped_early())
    }
}

/// Expand inputs into a list of PDF files.
///
/// Files are kept as given; directories contribute their `.pdf` files
/// sorted by name.
pub fn collect_pdf_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && is_pdf(path))
                .collect();
            found.sort();
            info!("Found {} PDF files in {}", found.len(), input.display());
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Runs documents through a page pipeline, one CSV per document
pub struct BatchRunner<D, R, G, P> {
    pipeline: DiaryPipeline<D, R, G>,
    source: P,
    output: OutputConfig,
    context_scope: ContextScope,
    range: Option<PageRange>,
}

impl<D, R, G, P> BatchRunner<D, R, G, P>
where
    D: RegionDetector,
    R: TextRecognizer,
    G: PageGate,
    P: PageSource,
{
    pub fn new(
        pipeline: DiaryPipeline<D, R, G>,
        source: P,
        output: OutputConfig,
        context_scope: ContextScope,
    ) -> Self {
        let pipeline = pipeline.with_annotation(output.annotate);
        Self {
            pipeline,
            source,
            output,
            context_scope,
            range: None,
        }
    }

    /// Restrict every document to a page range
    #[must_use]
    pub fn with_page_range(mut self, range: Option<PageRange>) -> Self {
        self.range = range;
        self
    }

    /// Process every document in order
    pub fn run(&mut self, documents: &[PathBuf]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for (index, path) in documents.iter().enumerate() {
            info!(
                "Processing document {}/{}: {}",
                index + 1,
                documents.len(),
                path.display()
            );
            summary.documents.push(self.run_document(path));
        }

        info!(
            "Batch complete: {} documents, {} pages, {} records, {} stopped early",
            summary.documents.len(),
            summary.pages_processed(),
            summary.records_written(),
            summary.stopped_early().count()
        );
        summary
    }

    /// Process one document; failures end up in the report
    pub fn run_document(&mut self, path: &Path) -> DocumentReport {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let diary_id = format!("{stem}.pdf");

        let mut report = DocumentReport {
            path: path.to_path_buf(),
            csv_path: self.output.output_dir.join(format!("{stem}.csv")),
            ..DocumentReport::default()
        };

        if let Err(e) = self.render_document(path, &stem, &diary_id, &mut report) {
            error!("Stopped {} early: {}", path.display(), e);
            report.error = Some(e.to_string());
        }
        report
    }

    fn render_document(
        &mut self,
        path: &Path,
        stem: &str,
        diary_id: &str,
        report: &mut DocumentReport,
    ) -> Result<()> {
        let mut sink = CsvSink::open(&report.csv_path, self.output.write_mode)?;
        let annotation_dir = self.output.output_dir.join(format!("{stem}_processed"));
        if self.output.annotate {
            fs::create_dir_all(&annotation_dir)?;
        }

        let Self {
            pipeline,
            source,
            context_scope,
            range,
            ..
        } = self;
        let mut context = PageContext::default();

        source.render_pages(path, *range, &mut |page_number, page| {
            if *context_scope == ContextScope::Page {
                context.clear();
            }

            let extraction = pipeline.process_page(&page, diary_id, &mut context, &mut sink)?;
            if !extraction.accepted {
                warn!("Page {} of {} is not a diary page", page_number, diary_id);
                report.pages_rejected += 1;
                return Ok(());
            }

            report.pages_processed += 1;
            report.records_written += extraction.records.len();
            info!(
                "Processed {} - page {} ({} records)",
                diary_id,
                page_number,
                extraction.records.len()
            );

            if let Some(annotated) = extraction.annotated {
                annotated.save(annotation_dir.join(format!("page_{page_number}.png")))?;
            }
            Ok(())
        })
    }
}
