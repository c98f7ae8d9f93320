//! Popup content for a single alert.

use chrono::{DateTime, Utc};
use serde::Serialize;

use alerts_common::Alert;

/// Shown when a time is missing.
pub const MISSING_TIME: &str = "-";

const SECTION_HEADERS: [&str; 5] = ["WHAT", "WHERE", "WHEN", "IMPACTS", "ADDITIONAL DETAILS"];

/// One titled block of the description. Untitled when the text had no
/// recognised headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupSection {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupContent {
    pub alert_id: String,
    pub title: String,
    pub severity: String,
    /// CSS badge class from the severity.
    pub severity_class: String,
    pub area: String,
    pub sent: String,
    pub effective: String,
    pub ends: String,
    pub sections: Vec<PopupSection>,
    pub instruction: Option<String>,
    pub web: Option<String>,
    pub office: Option<String>,
}

impl PopupContent {
    pub fn for_alert(alert: &Alert) -> Self {
        let title = if alert.event.is_empty() {
            "Alert".to_string()
        } else {
            alert.event.clone()
        };
        let instruction = alert.instruction.trim();

        Self {
            alert_id: alert.id.clone(),
            title,
            severity: alert.severity.as_str().to_string(),
            severity_class: alert.severity.badge_class().to_string(),
            area: alert.area_desc.clone(),
            sent: format_time(alert.sent),
            effective: format_time(alert.starts()),
            ends: format_time(alert.finishes()),
            sections: split_sections(&alert.description),
            instruction: non_empty(instruction),
            web: non_empty(alert.web.trim()),
            office: non_empty(alert.sender_name.trim()),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Short UTC timestamp, e.g. `4/1/2026 2:05 PM UTC`.
pub fn format_time(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(t) => t.format("%-m/%-d/%Y %-I:%M %p UTC").to_string(),
        None => MISSING_TIME.to_string(),
    }
}

/// Title of a `* WHAT...` style header line, if `line` is one.
fn header_title(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('*')?.trim_start();
    let upper = rest.to_ascii_uppercase();
    let known = SECTION_HEADERS.iter().any(|h| {
        upper.starts_with(h)
            && !upper[h.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    known.then(|| rest.trim())
}

/// Split an NWS description on its `* WHAT`, `* WHERE`, `* WHEN`,
/// `* IMPACTS` and `* ADDITIONAL DETAILS` headers.
///
/// Text before the first header becomes an untitled section. A description
/// without headers comes back as one untitled section.
pub fn split_sections(text: &str) -> Vec<PopupSection> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut sections: Vec<PopupSection> = Vec::new();
    let mut current: Option<PopupSection> = None;

    for line in text.lines() {
        if let Some(title) = header_title(line) {
            sections.extend(current.take());
            current = Some(PopupSection {
                title: title.to_string(),
                body: String::new(),
            });
            continue;
        }

        let section = current.get_or_insert_with(|| PopupSection {
            title: String::new(),
            body: String::new(),
        });
        if !section.body.is_empty() {
            section.body.push('\n');
        }
        section.body.push_str(line);
    }
    sections.extend(current);

    if sections.len() == 1 && sections[0].title.is_empty() {
        return vec![PopupSection {
            title: String::new(),
            body: text.to_string(),
        }];
    }

    sections
        .into_iter()
        .map(|s| PopupSection {
            title: s.title,
            body: s.body.trim().to_string(),
        })
        .filter(|s| !s.title.is_empty() || !s.body.is_empty())
        .collect()
}
