use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InscriptionStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl InscriptionStatus {
    /// Wire value for the `?status=` query parameter.
    pub fn as_query_param(&self) -> &'static str {
        match self {
            InscriptionStatus::Pending => "PENDING",
            InscriptionStatus::Confirmed => "CONFIRMED",
            InscriptionStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for InscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InscriptionStatus::Pending => write!(f, "Pending"),
            InscriptionStatus::Confirmed => write!(f, "Confirmed"),
            InscriptionStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inscription {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "eventId", default)]
    pub event_id: i64,
    pub responsible: Option<String>,
    pub status: InscriptionStatus,
    #[serde(rename = "isGroup", default)]
    pub is_group: bool,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

/// One row of the per-inscription analytics listing (registered
/// participants with their pricing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InscriptionAnalyticsRow {
    pub name: String,
    #[serde(rename = "birthDate")]
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    #[serde(rename = "typeDescription")]
    pub type_description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        let json = r#"{"id":7,"eventId":3,"responsible":"Maria Souza","status":"CONFIRMED","isGroup":true,"createdAt":"2026-07-01T12:00:00Z"}"#;
        let inscription: Inscription =
            serde_json::from_str(json).expect("Failed to parse inscription JSON");
        assert_eq!(inscription.status, InscriptionStatus::Confirmed);
        assert!(inscription.is_group);
        assert_eq!(inscription.status.as_query_param(), "CONFIRMED");
        assert_eq!(inscription.status.to_string(), "Confirmed");
    }
}
