//! PDF page rasterization with pdfium

use anyhow::Context as _;
use diary_extract_core::{PageRange, PageSource, PipelineError, Result};
use image::RgbImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Default rendering resolution for diary scans
pub const DEFAULT_DPI: f32 = 200.0;

/// Renders PDF pages to RGB bitmaps, one page at a time
pub struct PdfiumPageSource {
    pdfium: Pdfium,
    dpi: f32,
}

impl PdfiumPageSource {
    /// Bind pdfium from the working directory, falling back to the system library
    pub fn new(dpi: f32) -> anyhow::Result<Self> {
        let pdfium = Pdfium::new(
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .context("Failed to bind pdfium library")?,
        );
        Ok(Self { pdfium, dpi })
    }
}

fn render_page(page: &PdfPage, dpi: f32) -> std::result::Result<RgbImage, PdfiumError> {
    // PDF points are 72 per inch
    let scale = dpi / 72.0;
    let pixel_width = (page.width().value * scale) as i32;
    let pixel_height = (page.height().value * scale) as i32;

    let bitmap = page.render_with_config(
        &PdfRenderConfig::new()
            .set_target_width(pixel_width)
            .set_target_height(pixel_height)
            .render_form_data(true),
    )?;
    Ok(bitmap.as_image().to_rgb8())
}

impl PageSource for PdfiumPageSource {
    fn render_pages(
        &mut self,
        path: &Path,
        range: Option<PageRange>,
        visit: &mut dyn FnMut(u32, RgbImage) -> Result<()>,
    ) -> Result<()> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| PipelineError::DocumentOpen {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let pages = document.pages();
        let page_count = pages.len() as u32;
        let range = match range {
            Some(range) => {
                range.check(page_count)?;
                range
            }
            None if page_count == 0 => return Ok(()),
            None => PageRange::new(1, page_count)?,
        };
        debug!("Rendering pages {} of {} ({} total)", range, path.display(), page_count);

        for number in range.first..=range.last {
            let render_error = |e: PdfiumError| PipelineError::PageRender {
                page: number,
                reason: e.to_string(),
            };
            let page = pages.get((number - 1) as PdfPageIndex).map_err(render_error)?;
            let image = render_page(&page, self.dpi).map_err(render_error)?;
            debug!("Rendered page {} at {}x{}", number, image.width(), image.height());
            visit(number, image)?;
        }
        Ok(())
    }
}
