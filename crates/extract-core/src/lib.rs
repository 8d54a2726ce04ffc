//! Diary page extraction pipeline
//!
//! Turns rendered diary pages into CSV records:
//!
//! 1. detect `page`, `date`, `location` and `row` regions ([`diary_region_detection`])
//! 2. reconcile raw boxes into page pixels, borrowing row extents for narrow rows ([`reconcile`])
//! 3. recognize the text of each region; rows are split into time/phone and activity ([`fields`])
//! 4. parse times and phone flags out of the time column ([`temporal`])
//! 5. stitch rows with the current date and location ([`assembler`]) and persist one batch per page ([`sink`])
//!
//! [`DiaryPipeline`] runs one page; [`BatchRunner`] runs whole documents from
//! any [`PageSource`].

pub mod annotate;
pub mod assembler;
pub mod batch;
pub mod config;
pub mod error;
pub mod fields;
pub mod gate;
pub mod pipeline;
pub mod reconcile;
pub mod sink;
pub mod temporal;

pub use assembler::{assemble_page, DiaryRecord, PageContext};
pub use batch::{collect_pdf_inputs, BatchRunner, BatchSummary, DocumentReport, PageRange, PageSource};
pub use config::{ContextScope, GateConfig, OutputConfig, PipelineConfig};
pub use error::{PipelineError, Result};
pub use fields::{extract_fields, FieldPayload, RegionText};
pub use gate::{AcceptAllPages, PageGate, RegionPageGate};
pub use pipeline::{DiaryPipeline, PageExtraction};
pub use reconcile::{reconcile_page, ReconciledBox, RowState};
pub use sink::{CsvSink, RecordSink, WriteMode, CSV_HEADER};
pub use temporal::{parse_time, TemporalFields};
