//! Boundary rows for vendors and their submitted documents.
//!
//! The upload/CRUD surface around these lives outside this crate; the
//! pipeline only reads them and writes back status, expiry and risk level.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{DocumentStatus, RiskLevel};

/// A vendor-submitted compliance document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub vendor_id: Uuid,
    /// Path to the uploaded file; absent until an upload is attached.
    pub file_path: Option<String>,
    pub status: DocumentStatus,
    /// Copied from extracted metadata once a validation completes.
    pub expiry_date: Option<NaiveDate>,
}

impl Document {
    pub fn new(vendor_id: Uuid, file_path: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vendor_id,
            file_path: file_path.map(str::to_string),
            status: DocumentStatus::Pending,
            expiry_date: None,
        }
    }
}

/// A vendor being scored. The risk level mirror is maintained by the risk
/// calculator for fast filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: Uuid,
    pub name: String,
    pub industry: String,
    pub risk_level: RiskLevel,
}

impl Vendor {
    pub fn new(name: &str, industry: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            industry: industry.to_string(),
            risk_level: RiskLevel::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_is_pending_without_expiry() {
        let doc = Document::new(Uuid::new_v4(), Some("/uploads/cert.png"));
        assert_eq!(doc.status, DocumentStatus::Pending);
        assert!(doc.expiry_date.is_none());
        assert_eq!(doc.file_path.as_deref(), Some("/uploads/cert.png"));
    }

    #[test]
    fn new_vendor_starts_with_unknown_risk() {
        let vendor = Vendor::new("Acme Foundry", "Manufacturing");
        assert_eq!(vendor.risk_level, RiskLevel::Unknown);
        assert_eq!(vendor.industry, "Manufacturing");
    }
}
