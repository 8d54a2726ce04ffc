//! Single-page extraction: detect, reconcile, recognize, assemble, persist

use crate::annotate::annotate_page;
use crate::assembler::{assemble_page, DiaryRecord, PageContext};
use crate::error::Result;
use crate::fields::{extract_fields, FieldPayload};
use crate::gate::PageGate;
use crate::reconcile::{reconcile_page, ReconciledBox};
use crate::sink::RecordSink;
use diary_region_detection::RegionDetector;
use diary_text_recognition::TextRecognizer;
use image::RgbImage;
use tracing::{debug, info};

/// Everything produced for one page
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    /// False when the page gate rejected the page
    pub accepted: bool,
    /// Reconciled regions in top-to-bottom order
    pub regions: Vec<ReconciledBox>,
    /// Extracted text, parallel to `regions`
    pub payloads: Vec<FieldPayload>,
    /// Records with non-empty activity, top-to-bottom
    pub records: Vec<DiaryRecord>,
    /// Debug overlay, when annotation is enabled
    pub annotated: Option<RgbImage>,
}

impl PageExtraction {
    fn rejected() -> Self {
        Self::default()
    }
}

/// Page pipeline owning its detector, recognizer and gate
pub struct DiaryPipeline<D, R, G> {
    detector: D,
    recognizer: R,
    gate: G,
    annotate: bool,
}

impl<D, R, G> DiaryPipeline<D, R, G>
where
    D: RegionDetector,
    R: TextRecognizer,
    G: PageGate,
{
    pub fn new(detector: D, recognizer: R, gate: G) -> Self {
        Self {
            detector,
            recognizer,
            gate,
            annotate: false,
        }
    }

    /// Render a debug overlay for every accepted page
    #[must_use]
    pub fn with_annotation(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Extract the records of one page without persisting them.
    ///
    /// `context` carries date and location into and out of the page.
    pub fn extract_page(
        &mut self,
        page: &RgbImage,
        diary_id: &str,
        context: &mut PageContext,
    ) -> Result<PageExtraction> {
        if !self.gate.is_diary_page(page)? {
            debug!("Page rejected by gate");
            return Ok(PageExtraction::rejected());
        }

        let (width, height) = page.dimensions();
        let detections = self.detector.detect(page)?;
        let regions = reconcile_page(&detections, width, height);

        let payloads: Vec<FieldPayload> = regions
            .iter()
            .map(|region| extract_fields(&mut self.recognizer, region, page))
            .collect();

        let records = assemble_page(diary_id, &payloads, context);
        info!(
            "Page: {} regions, {} records for {}",
            regions.len(),
            records.len(),
            diary_id
        );

        let annotated = self
            .annotate
            .then(|| annotate_page(page, &regions, &payloads));

        Ok(PageExtraction {
            accepted: true,
            regions,
            payloads,
            records,
            annotated,
        })
    }

    /// Extract one page and hand its batch to `sink` in a single call.
    ///
    /// Returns once the rows are persisted. Rejected pages touch nothing.
    pub fn process_page<S: RecordSink + ?Sized>(
        &mut self,
        page: &RgbImage,
        diary_id: &str,
        context: &mut PageContext,
        sink: &mut S,
    ) -> Result<PageExtraction> {
        let extraction = self.extract_page(page, diary_id, context)?;
        if extraction.accepted {
            sink.write_page(&extraction.records)?;
        }
        Ok(extraction)
    }
}
