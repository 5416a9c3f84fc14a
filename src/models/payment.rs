use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

impl PaymentStatus {
    /// Wire value for the `?status=` query parameter.
    pub fn as_query_param(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Approved => "APPROVED",
            PaymentStatus::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Approved => write!(f, "Approved"),
            PaymentStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "inscriptionId", default)]
    pub inscription_id: i64,
    pub payer: Option<String>,
    #[serde(default)]
    pub value: f64,
    pub status: PaymentStatus,
    #[serde(rename = "receiptUrl")]
    pub receipt_url: Option<String>,
}
