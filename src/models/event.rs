use chrono::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "inscriptionLimit", default)]
    pub inscription_limit: Option<u32>,
    #[serde(rename = "inscriptionValue", default)]
    pub inscription_value: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Event {
    pub fn formatted_start_date(&self) -> String {
        match &self.start_date {
            Some(date) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
                    dt.format("%b %d, %Y").to_string()
                } else {
                    // Fall back to raw date string, truncate if too long
                    date.chars().take(10).collect()
                }
            }
            None => "TBD".to_string(),
        }
    }
}

/// Payload for event create/update calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDraft {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "inscriptionLimit")]
    pub inscription_limit: Option<u32>,
    #[serde(rename = "inscriptionValue")]
    pub inscription_value: Option<f64>,
}

/// One row of the per-event analysis listing: inscriptions aggregated
/// by participant type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAnalysisRow {
    #[serde(rename = "typeDescription")]
    pub type_description: String,
    #[serde(default)]
    pub participants: u32,
    #[serde(rename = "totalValue", default)]
    pub total_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_start_date() {
        let event = Event {
            id: 1,
            name: "Acampamento".to_string(),
            description: None,
            start_date: Some("2026-09-12T09:00:00+00:00".to_string()),
            end_date: None,
            location: None,
            inscription_limit: None,
            inscription_value: None,
            status: None,
        };
        assert_eq!(event.formatted_start_date(), "Sep 12, 2026");
    }

    #[test]
    fn test_formatted_start_date_missing() {
        let event = Event {
            id: 1,
            name: "Encontro".to_string(),
            description: None,
            start_date: None,
            end_date: None,
            location: None,
            inscription_limit: None,
            inscription_value: None,
            status: None,
        };
        assert_eq!(event.formatted_start_date(), "TBD");
    }
}
