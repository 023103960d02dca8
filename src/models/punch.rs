use super::label::{Direction, Label};
use super::raw::RawFields;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// One device event before persistence.
///
/// `employee_code` and `timestamp` are optional because a vendor record
/// may lack either; such punches are left out of normalization and
/// rejected by the gate.
#[derive(Debug, Clone, Serialize)]
pub struct Punch {
    pub employee_code: Option<String>,
    pub timestamp: Option<NaiveDateTime>, // naive local, whole seconds
    pub transaction_id: Option<String>,
    pub device_identifier: String,
    pub raw: RawFields,
    pub label: Label,
}

impl Punch {
    pub fn new(
        employee_code: Option<String>,
        timestamp: Option<NaiveDateTime>,
        device_identifier: impl Into<String>,
        raw: RawFields,
    ) -> Self {
        Self {
            employee_code,
            timestamp,
            transaction_id: None,
            device_identifier: device_identifier.into(),
            raw,
            label: Label::Unresolved,
        }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = label;
        self
    }

    pub fn with_transaction_id(mut self, id: Option<String>) -> Self {
        self.transaction_id = id;
        self
    }

    /// Grouping key: (employee code, calendar day).
    pub fn day_key(&self) -> Option<(String, NaiveDate)> {
        match (&self.employee_code, self.timestamp) {
            (Some(code), Some(ts)) if !code.is_empty() => Some((code.clone(), ts.date())),
            _ => None,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        self.label.direction()
    }

    /// True once the normalizer has written the label.
    pub fn sequence_adjusted(&self) -> bool {
        matches!(self.label, Label::Sequenced(_))
    }

    /// Device identifier as stored: the base identifier plus the
    /// transaction id, capped at 140 characters.
    pub fn unique_device_id(&self) -> String {
        let id = match &self.transaction_id {
            Some(tx) if !self.device_identifier.is_empty() => {
                format!("{} (ZKTeco-{})", self.device_identifier, tx)
            }
            Some(tx) => format!("ZKTeco-{}", tx),
            None if !self.device_identifier.is_empty() => self.device_identifier.clone(),
            None => "ZKTeco Device".to_string(),
        };

        if id.chars().count() > 140 {
            let mut cut: String = id.chars().take(135).collect();
            cut.push_str("...");
            cut
        } else {
            id
        }
    }
}
