use serde::{Deserialize, Serialize};

/// Host-side employee record. `name` is the internal identity; the other
/// codes are what a device may report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub name: String,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub employee_number: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub attendance_device_id: Option<String>,
}

impl Employee {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            employee_name: None,
            employee_number: None,
            user_id: None,
            attendance_device_id: None,
        }
    }
}
