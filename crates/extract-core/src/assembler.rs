//! Stitching page context and row fields into diary records

use crate::fields::FieldPayload;
use crate::temporal::parse_time;
use serde::{Deserialize, Serialize};

/// One output row of the diary CSV
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryRecord {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "FromTime")]
    pub from_time: String,
    #[serde(rename = "ToTime")]
    pub to_time: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Activity")]
    pub activity: String,
}

impl DiaryRecord {
    /// Records without activity text are never persisted
    #[must_use]
    pub fn has_activity(&self) -> bool {
        !self.activity.is_empty()
    }
}

/// Date and location most recently read, applied to following rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub date: String,
    pub location: String,
}

impl PageContext {
    pub fn clear(&mut self) {
        self.date.clear();
        self.location.clear();
    }
}

/// Build the record batch of one page from payloads in top-to-bottom order.
///
/// `date` and `location` payloads overwrite `context` (last write wins) and
/// produce no record. Rows with empty activity are dropped.
pub fn assemble_page<'a, I>(filename: &str, payloads: I, context: &mut PageContext) -> Vec<DiaryRecord>
where
    I: IntoIterator<Item = &'a FieldPayload>,
{
    let mut records = Vec::new();

    for payload in payloads {
        match payload {
            FieldPayload::Date(text) => context.date = text.text.clone(),
            FieldPayload::Location(text) => context.location = text.text.clone(),
            FieldPayload::Row {
                time_phone,
                activity,
            } => {
                let times = parse_time(&time_phone.text);
                records.push(DiaryRecord {
                    filename: filename.to_string(),
                    location: context.location.clone(),
                    date: context.date.clone(),
                    from_time: times.from_time,
                    to_time: times.to_time,
                    phone: times.phone,
                    activity: activity.text.clone(),
                });
            }
            FieldPayload::Empty => {}
        }
    }

    records.retain(DiaryRecord::has_activity);
    records
}
