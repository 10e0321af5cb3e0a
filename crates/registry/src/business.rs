use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bizdir_core::{BusinessId, DomainError, DomainResult, UserId};

/// Moderation status of a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl BusinessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessStatus::Pending => "pending",
            BusinessStatus::Approved => "approved",
            BusinessStatus::Rejected => "rejected",
        }
    }
}

impl core::fmt::Display for BusinessStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for BusinessStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(DomainError::validation(format!("unknown business status '{other}'"))),
        }
    }
}

/// A business listing.
///
/// `rejection_reason` is `Some` exactly when `status` is `Rejected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Business {
    pub id: BusinessId,
    /// Weak reference: becomes `None` when the owner is deleted.
    pub owner_id: Option<UserId>,
    pub name: String,
    pub description: Option<String>,
    pub status: BusinessStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Business {
    /// Apply an administrative status change.
    ///
    /// Every target state is reachable from every state; re-approving is a
    /// no-op and re-rejecting replaces the reason.
    pub fn apply(&mut self, change: &StatusChange) {
        self.status = change.status();
        self.rejection_reason = change.reason().map(str::to_string);
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == Some(user)
    }
}

/// A listing together with its owner's display name (admin view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessWithOwner {
    #[serde(flatten)]
    pub business: Business,
    pub owner_name: Option<String>,
}

/// Validated input for a new listing. Always starts out `Pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBusiness {
    pub owner_id: Option<UserId>,
    pub name: String,
    pub description: Option<String>,
}

impl NewBusiness {
    pub fn new(owner_id: Option<UserId>, name: &str, description: Option<&str>) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("business name is required"));
        }
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok(Self {
            owner_id,
            name: name.to_string(),
            description,
        })
    }

    pub fn into_business(self, now: DateTime<Utc>) -> Business {
        Business {
            id: BusinessId::new(),
            owner_id: self.owner_id,
            name: self.name,
            description: self.description,
            status: BusinessStatus::Pending,
            rejection_reason: None,
            created_at: now,
        }
    }
}

/// An administrative moderation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    Approve,
    Reject { reason: String },
}

impl StatusChange {
    /// Build a rejection; the reason is trimmed and must not be blank.
    pub fn reject(reason: Option<&str>) -> DomainResult<Self> {
        match reason.map(str::trim) {
            Some(reason) if !reason.is_empty() => Ok(Self::Reject {
                reason: reason.to_string(),
            }),
            _ => Err(DomainError::validation("rejection reason is required")),
        }
    }

    pub fn status(&self) -> BusinessStatus {
        match self {
            StatusChange::Approve => BusinessStatus::Approved,
            StatusChange::Reject { .. } => BusinessStatus::Rejected,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            StatusChange::Approve => None,
            StatusChange::Reject { reason } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Business {
        NewBusiness::new(Some(UserId::new()), "Corner Bakery", Some("bread"))
            .unwrap()
            .into_business(Utc::now())
    }

    #[test]
    fn new_business_starts_pending() {
        let b = pending();
        assert_eq!(b.status, BusinessStatus::Pending);
        assert_eq!(b.rejection_reason, None);
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(matches!(
            NewBusiness::new(None, "   ", None),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn blank_description_becomes_none() {
        let nb = NewBusiness::new(None, " Shop ", Some("  ")).unwrap();
        assert_eq!(nb.name, "Shop");
        assert_eq!(nb.description, None);
    }

    #[test]
    fn reject_requires_reason() {
        assert!(StatusChange::reject(None).is_err());
        assert!(StatusChange::reject(Some("  ")).is_err());
        assert_eq!(
            StatusChange::reject(Some("  spam ")).unwrap(),
            StatusChange::Reject { reason: "spam".into() }
        );
    }

    #[test]
    fn approve_after_reject_clears_reason() {
        let mut b = pending();
        b.apply(&StatusChange::reject(Some("duplicate")).unwrap());
        assert_eq!(b.status, BusinessStatus::Rejected);
        assert_eq!(b.rejection_reason.as_deref(), Some("duplicate"));

        b.apply(&StatusChange::Approve);
        assert_eq!(b.status, BusinessStatus::Approved);
        assert_eq!(b.rejection_reason, None);

        let before = b.clone();
        b.apply(&StatusChange::Approve);
        assert_eq!(b, before);
    }

    #[test]
    fn admin_view_flattens_business_fields() {
        let b = pending();
        let json = serde_json::to_value(BusinessWithOwner {
            business: b.clone(),
            owner_name: Some("Ada".into()),
        })
        .unwrap();
        assert_eq!(json["name"], "Corner Bakery");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["owner_name"], "Ada");
        assert_eq!(json["id"], b.id.to_string());
    }

    #[test]
    fn status_parses_from_storage_form() {
        for status in [BusinessStatus::Pending, BusinessStatus::Approved, BusinessStatus::Rejected] {
            assert_eq!(status.as_str().parse::<BusinessStatus>().unwrap(), status);
        }
        assert!("archived".parse::<BusinessStatus>().is_err());
    }
}
