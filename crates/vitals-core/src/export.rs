//! Report export to PDF
//!
//! Supports:
//! - Capturing the visible report page as a raster image through `ViewCapture`
//! - Fitting each image to the page width (A4 by default) keeping its aspect ratio
//! - Writing a minimal PDF 1.4 document, one image per page (FlateDecode)

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::info;

use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::models::{NormalizedReport, PlannedGoal};
use crate::simulation::SimulationSnapshot;
use crate::wizard::WizardPage;

/// Shown when an export fails; the report is left as it was
pub const EXPORT_FAILURE_MESSAGE: &str = "PDF generation failed. Please try again.";

const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// 8-bit RGB raster, rows top to bottom
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Export(format!(
                "Captured image is empty ({}x{})",
                width, height
            )));
        }
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(Error::Export(format!(
                "Captured image has {} bytes, expected {} for {}x{} RGB",
                pixels.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Everything rendered on one report page
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub page: WizardPage,
    pub report: &'a NormalizedReport,
    /// Simulator state, when the page shows the simulator
    pub simulation: Option<SimulationSnapshot>,
    pub goals: Vec<PlannedGoal>,
}

impl<'a> PageView<'a> {
    /// A page drawn from the report alone, with no simulator or goals
    pub fn report_only(page: WizardPage, report: &'a NormalizedReport) -> Self {
        Self {
            page,
            report,
            simulation: None,
            goals: Vec::new(),
        }
    }
}

/// Renders a report page to pixels
#[async_trait]
pub trait ViewCapture: Send + Sync {
    async fn capture(&self, view: &PageView<'_>) -> Result<RasterImage>;
}

/// One image placed on a page of the given size
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPage {
    pub image: RasterImage,
    pub width_mm: f64,
    pub height_mm: f64,
}

impl DocumentPage {
    /// Fit `image` to `width_mm`, scaling the height by the same factor
    pub fn fit_width(image: RasterImage, width_mm: f64) -> Self {
        let height_mm = f64::from(image.height) * width_mm / f64::from(image.width);
        Self {
            image,
            width_mm,
            height_mm,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub pages: Vec<DocumentPage>,
}

impl Document {
    pub fn new(title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            created_at,
            pages: Vec::new(),
        }
    }

    /// Serialize as PDF 1.4
    pub fn to_pdf(&self) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(Error::Export("Document has no pages".into()));
        }

        let mut pdf = PdfWriter::default();
        pdf.out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        // 1: catalog, 2: page tree, 3: info, then page/content/image per page
        let page_ids: Vec<usize> = (0..self.pages.len()).map(|i| 4 + i * 3).collect();

        pdf.object(1, b"<< /Type /Catalog /Pages 2 0 R >>")?;

        let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
        pdf.object(
            2,
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                self.pages.len()
            )
            .as_bytes(),
        )?;

        pdf.object(
            3,
            format!(
                "<< /Title ({}) /Producer (vitals) /CreationDate (D:{}Z) >>",
                escape_pdf_text(&self.title),
                self.created_at.format("%Y%m%d%H%M%S")
            )
            .as_bytes(),
        )?;

        for (page, &page_id) in self.pages.iter().zip(&page_ids) {
            let contents_id = page_id + 1;
            let image_id = page_id + 2;
            let width_pt = page.width_mm * POINTS_PER_MM;
            let height_pt = page.height_mm * POINTS_PER_MM;

            pdf.object(
                page_id,
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                     /Resources << /XObject << /Im0 {} 0 R >> >> /Contents {} 0 R >>",
                    width_pt, height_pt, image_id, contents_id
                )
                .as_bytes(),
            )?;

            let contents = format!("q {:.2} 0 0 {:.2} 0 0 cm /Im0 Do Q", width_pt, height_pt);
            pdf.stream(contents_id, "", contents.as_bytes())?;

            let compressed = deflate(page.image.pixels())?;
            pdf.stream(
                image_id,
                &format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode ",
                    page.image.width(),
                    page.image.height()
                ),
                &compressed,
            )?;
        }

        pdf.finish(3)
    }

    /// Write the PDF into `dir` as `filename`
    pub fn save(&self, dir: &Path, filename: &str) -> Result<PathBuf> {
        let bytes = self.to_pdf()?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(filename);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Accumulates PDF objects and their byte offsets for the xref table
#[derive(Default)]
struct PdfWriter {
    out: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl PdfWriter {
    fn object(&mut self, id: usize, body: &[u8]) -> Result<()> {
        self.offsets.push((id, self.out.len()));
        write!(self.out, "{} 0 obj\n", id)?;
        self.out.extend_from_slice(body);
        self.out.extend_from_slice(b"\nendobj\n");
        Ok(())
    }

    fn stream(&mut self, id: usize, dict_entries: &str, data: &[u8]) -> Result<()> {
        self.offsets.push((id, self.out.len()));
        write!(
            self.out,
            "{} 0 obj\n<< {}/Length {} >>\nstream\n",
            id,
            dict_entries,
            data.len()
        )?;
        self.out.extend_from_slice(data);
        self.out.extend_from_slice(b"\nendstream\nendobj\n");
        Ok(())
    }

    fn finish(mut self, info_id: usize) -> Result<Vec<u8>> {
        self.offsets.sort_unstable();
        let size = self.offsets.len() + 1;
        let xref_offset = self.out.len();

        write!(self.out, "xref\n0 {}\n0000000000 65535 f \n", size)?;
        for (_, offset) in &self.offsets {
            write!(self.out, "{:010} 00000 n \n", offset)?;
        }
        write!(
            self.out,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, info_id, xref_offset
        )?;
        Ok(self.out)
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn escape_pdf_text(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .flat_map(|c| match c {
            '(' | ')' | '\\' => vec!['\\', c],
            _ => vec![c],
        })
        .collect()
}

/// Captures report pages and assembles them into a document
#[derive(Debug, Clone)]
pub struct ExportPipeline {
    page_width_mm: f64,
    filename: String,
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self::from_config(&crate::config::Config::default().export)
    }
}

impl ExportPipeline {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            page_width_mm: config.page_width_mm,
            filename: config.filename.clone(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Capture the page being shown and place it on a single document page
    pub async fn export_current_view(
        &self,
        capture: &dyn ViewCapture,
        view: &PageView<'_>,
    ) -> Result<Document> {
        self.export_views(capture, std::slice::from_ref(view)).await
    }

    /// Capture several report-only pages in order, one document page each
    pub async fn export_pages(
        &self,
        capture: &dyn ViewCapture,
        pages: &[WizardPage],
        report: &NormalizedReport,
    ) -> Result<Document> {
        let views: Vec<PageView<'_>> = pages
            .iter()
            .map(|&page| PageView::report_only(page, report))
            .collect();
        self.export_views(capture, &views).await
    }

    /// Capture each view in order, one document page each
    pub async fn export_views(
        &self,
        capture: &dyn ViewCapture,
        views: &[PageView<'_>],
    ) -> Result<Document> {
        let mut document = Document::new("Financial Health Report", Utc::now());
        for view in views {
            let image = capture.capture(view).await.map_err(|e| match e {
                Error::Export(_) => e,
                other => Error::Export(format!("Capture of {} page failed: {}", view.page, other)),
            })?;
            document
                .pages
                .push(DocumentPage::fit_width(image, self.page_width_mm));
        }
        Ok(document)
    }

    /// Export report-only pages and write the document to `dir`
    pub async fn export_to(
        &self,
        capture: &dyn ViewCapture,
        pages: &[WizardPage],
        report: &NormalizedReport,
        dir: &Path,
    ) -> Result<PathBuf> {
        let document = self.export_pages(capture, pages, report).await?;
        self.write(&document, dir)
    }

    /// Export views and write the document to `dir`
    pub async fn export_views_to(
        &self,
        capture: &dyn ViewCapture,
        views: &[PageView<'_>],
        dir: &Path,
    ) -> Result<PathBuf> {
        let document = self.export_views(capture, views).await?;
        self.write(&document, dir)
    }

    fn write(&self, document: &Document, dir: &Path) -> Result<PathBuf> {
        let path = document.save(dir, &self.filename)?;
        info!(path = %path.display(), pages = document.pages.len(), "Report exported");
        Ok(path)
    }
}
