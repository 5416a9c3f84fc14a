use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "eventId", default)]
    pub event_id: i64,
    #[serde(rename = "buyerName")]
    pub buyer_name: Option<String>,
    #[serde(default)]
    pub value: f64,
    #[serde(rename = "soldAt")]
    pub sold_at: Option<String>,
}

/// Payload for a point-of-sale ticket sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSale {
    #[serde(rename = "eventId")]
    pub event_id: i64,
    #[serde(rename = "buyerName")]
    pub buyer_name: String,
    #[serde(default = "TicketSale::default_quantity")]
    pub quantity: u32,
}

impl TicketSale {
    fn default_quantity() -> u32 {
        1
    }
}
