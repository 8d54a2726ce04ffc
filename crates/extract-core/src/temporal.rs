//! Time and phone-marker parsing for the left column of a diary row

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `H:MM` or `HH:MM`, an optional second time, then an optional `R`/`P` marker
static TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}:\d{2})\s*(\d{1,2}:\d{2})?\s*([RP])?").expect("Invalid time pattern regex")
});

/// Fields read from the time/phone text of a row; missing parts are empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalFields {
    pub from_time: String,
    pub to_time: String,
    pub phone: String,
}

/// Parse the leftmost time expression in `text`.
///
/// A miss is not an error: every field is left empty.
#[must_use]
pub fn parse_time(text: &str) -> TemporalFields {
    let Some(captures) = TIME_PATTERN.captures(text) else {
        return TemporalFields::default();
    };

    let group = |index: usize| {
        captures
            .get(index)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    };

    TemporalFields {
        from_time: group(1),
        to_time: group(2),
        phone: group(3),
    }
}
