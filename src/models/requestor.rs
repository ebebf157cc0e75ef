use serde::{Deserialize, Serialize};

/// Person requesting a loan, as resolved by the national ID lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestorInfo {
    pub id: i64,
    #[serde(default)]
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Role or category of the requestor (student, staff, ...)
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl RequestorInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
