use serde::{Deserialize, Serialize};

/// One participant row of a validated spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupItem {
    pub name: String,
    #[serde(rename = "birthDate")]
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    #[serde(rename = "typeDescription")]
    pub type_description: String,
    #[serde(default)]
    pub value: f64,
}

/// Server-priced draft returned by the upload endpoint, held locally
/// until confirmed, cancelled, or expired. The server keeps the
/// authoritative copy under the opaque `cache_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupInscriptionDraft {
    #[serde(rename = "cacheKey")]
    pub cache_key: String,
    #[serde(default)]
    pub total: f64,
    #[serde(rename = "unitValue", default)]
    pub unit_value: f64,
    #[serde(default)]
    pub items: Vec<GroupItem>,
}

/// Display grouping of draft items by participant type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeGroup {
    pub description: String,
    pub participants: usize,
    pub subtotal: f64,
}

impl GroupInscriptionDraft {
    /// Items grouped by type for the review table, preserving first-seen
    /// order.
    pub fn grouped_by_type(&self) -> Vec<TypeGroup> {
        let mut groups: Vec<TypeGroup> = Vec::new();
        for item in &self.items {
            match groups
                .iter_mut()
                .find(|g| g.description == item.type_description)
            {
                Some(group) => {
                    group.participants += 1;
                    group.subtotal += item.value;
                }
                None => groups.push(TypeGroup {
                    description: item.type_description.clone(),
                    participants: 1,
                    subtotal: item.value,
                }),
            }
        }
        groups
    }

    /// Whether the per-item values add up to the server-supplied total.
    /// Display-level consistency check, tolerant of float rounding.
    pub fn totals_consistent(&self) -> bool {
        let sum: f64 = self.items.iter().map(|i| i.value).sum();
        (sum - self.total).abs() < 0.005
    }

    pub fn participant_count(&self) -> usize {
        self.items.len()
    }
}

/// Result of a successful confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupConfirmation {
    #[serde(rename = "inscriptionId")]
    pub inscription_id: i64,
    #[serde(rename = "paymentEnabled", default)]
    pub payment_enabled: bool,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(type_description: &str, value: f64) -> GroupItem {
        GroupItem {
            name: "Participante".to_string(),
            birth_date: None,
            gender: None,
            type_description: type_description.to_string(),
            value,
        }
    }

    #[test]
    fn test_grouped_by_type() {
        let draft = GroupInscriptionDraft {
            cache_key: "X".to_string(),
            total: 200.0,
            unit_value: 50.0,
            items: vec![item("Normal", 50.0), item("Normal", 50.0), item("VIP", 100.0)],
        };

        let groups = draft.grouped_by_type();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].description, "Normal");
        assert_eq!(groups[0].participants, 2);
        assert_eq!(groups[0].subtotal, 100.0);
        assert_eq!(groups[1].description, "VIP");
        assert_eq!(groups[1].participants, 1);
        assert_eq!(groups[1].subtotal, 100.0);
    }

    #[test]
    fn test_totals_consistent() {
        let mut draft = GroupInscriptionDraft {
            cache_key: "X".to_string(),
            total: 150.0,
            unit_value: 50.0,
            items: vec![item("Normal", 50.0), item("VIP", 100.0)],
        };
        assert!(draft.totals_consistent());

        draft.total = 175.0;
        assert!(!draft.totals_consistent());
    }

    #[test]
    fn test_parse_upload_response() {
        let json = r#"{
            "cacheKey": "a1b2c3",
            "total": 100,
            "unitValue": 50,
            "items": [
                {"name": "Ana Lima", "birthDate": "2010-04-02", "gender": "F", "typeDescription": "Normal", "value": 50},
                {"name": "Bruno Costa", "birthDate": "2011-11-19", "gender": "M", "typeDescription": "Normal", "value": 50}
            ]
        }"#;
        let draft: GroupInscriptionDraft =
            serde_json::from_str(json).expect("Failed to parse draft JSON");
        assert_eq!(draft.cache_key, "a1b2c3");
        assert_eq!(draft.participant_count(), 2);
        assert!(draft.totals_consistent());
    }
}
