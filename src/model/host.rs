use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

pub const APPROVAL_PENDING: &str = "pending";
pub const APPROVAL_APPROVED: &str = "approved";
pub const APPROVAL_REJECTED: &str = "rejected";

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub institution_name: String,
    pub institution_address: Option<String>,
    pub nic_number: String,
    pub nic_photo: String,
    pub approval_status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterHostRequest {
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub institution_name: String,
    pub institution_address: Option<String>,
    pub nic_number: String,
    /// Object-storage reference to the uploaded NIC photo; the upload
    /// itself happens elsewhere.
    pub nic_photo: String,
}

impl RegisterHostRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut missing = Vec::new();
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.institution_name.trim().is_empty() {
            missing.push("institutionName");
        }
        if self.nic_number.trim().is_empty() {
            missing.push("nicNumber");
        }
        if self.nic_photo.trim().is_empty() {
            missing.push("nicPhoto");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateHostStatusRequest {
    pub status: String,
}

impl UpdateHostStatusRequest {
    pub fn validated_status(&self) -> Result<&str, AppError> {
        match self.status.as_str() {
            APPROVAL_PENDING | APPROVAL_APPROVED | APPROVAL_REJECTED => Ok(&self.status),
            other => Err(AppError::Validation(format!(
                "Unknown approval status: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterHostRequest {
        RegisterHostRequest {
            email: "host@example.com".to_string(),
            name: "Ride Owner".to_string(),
            phone_number: None,
            institution_name: "Unawatuna Rides".to_string(),
            institution_address: None,
            nic_number: "991234567V".to_string(),
            nic_photo: "uploads/nic_991234567V.jpg".to_string(),
        }
    }

    #[test]
    fn complete_registration_validates() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn missing_nic_photo_is_rejected() {
        let mut req = request();
        req.nic_photo = String::new();
        assert!(matches!(
            req.validate(),
            Err(AppError::Validation(ref m)) if m.contains("nicPhoto")
        ));
    }

    #[test]
    fn only_known_approval_statuses_are_accepted() {
        assert!(UpdateHostStatusRequest { status: "approved".into() }
            .validated_status()
            .is_ok());
        assert!(UpdateHostStatusRequest { status: "Approved".into() }
            .validated_status()
            .is_err());
    }
}
