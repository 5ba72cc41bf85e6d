// Raw Lighthouse result (LHR) subset: category scores and audit entries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    /// [0, 1]; Lighthouse reports `null` when the category errored.
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    #[serde(default)]
    pub display_value: Option<String>,
    #[serde(default)]
    pub numeric_value: Option<f64>,
}

/// Category keys use Lighthouse ids (`best-practices`, not `bestPractices`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAuditResult {
    #[serde(default)]
    pub categories: HashMap<String, CategoryResult>,
    #[serde(default)]
    pub audits: HashMap<String, AuditEntry>,
}
