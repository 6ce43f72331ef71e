use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle states, seeded into `ers_reimbursement_statuses`.
/// Pending is the only non-terminal state.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum ReimbStatus {
    Pending,
    Approved,
    Denied,
}

impl ReimbStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReimbStatus::Pending => "Pending",
            ReimbStatus::Approved => "Approved",
            ReimbStatus::Denied => "Denied",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ReimbStatus::Pending)
    }
}

/// Expense categories, seeded into `ers_reimbursement_types`.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum ReimbType {
    Lodging,
    Travel,
    Food,
    Other,
}

impl ReimbType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReimbType::Lodging => "Lodging",
            ReimbType::Travel => "Travel",
            ReimbType::Food => "Food",
            ReimbType::Other => "Other",
        }
    }
}

/// Denormalized reimbursement as read from `full_reimbursements_info`:
/// status and type carry their lookup names, not surrogate ids.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "amount": 42.5,
        "submitted": "2026-01-01T00:00:00Z",
        "resolved": null,
        "description": "Train ticket to client site",
        "author_id": 3,
        "resolver_id": null,
        "status": "Pending",
        "type": "Travel"
    })
)]
pub struct Reimbursement {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = 42.5)]
    pub amount: f64,

    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub submitted: DateTime<Utc>,

    /// Set exactly once, together with `resolver_id`, when a manager
    /// approves or denies the request.
    #[schema(example = json!(null), format = "date-time", value_type = Option<String>)]
    pub resolved: Option<DateTime<Utc>>,

    #[schema(example = "Train ticket to client site")]
    pub description: String,

    #[schema(example = 3)]
    pub author_id: i64,

    #[schema(example = json!(null))]
    pub resolver_id: Option<i64>,

    #[schema(example = "Pending")]
    pub status: String,

    #[serde(rename = "type")]
    #[schema(example = "Travel")]
    pub reimb_type: String,
}

/// Insert payload. Status is not accepted here: every new reimbursement
/// starts Pending with no resolver.
#[derive(Debug)]
pub struct NewReimbursement {
    pub amount: f64,
    pub description: String,
    pub reimb_type: ReimbType,
    pub author_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names_parse() {
        assert_eq!("Pending".parse::<ReimbStatus>().unwrap(), ReimbStatus::Pending);
        assert_eq!("Denied".parse::<ReimbStatus>().unwrap(), ReimbStatus::Denied);
        assert!("Rejected".parse::<ReimbStatus>().is_err());
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!ReimbStatus::Pending.is_terminal());
        assert!(ReimbStatus::Approved.is_terminal());
        assert!(ReimbStatus::Denied.is_terminal());
    }

    #[test]
    fn type_names_parse() {
        assert_eq!("Lodging".parse::<ReimbType>().unwrap(), ReimbType::Lodging);
        assert!("Entertainment".parse::<ReimbType>().is_err());
    }

    #[test]
    fn reimb_type_serializes_as_type() {
        let reimb = Reimbursement {
            id: 1,
            amount: 42.5,
            submitted: Utc::now(),
            resolved: None,
            description: "Train ticket".into(),
            author_id: 3,
            resolver_id: None,
            status: "Pending".into(),
            reimb_type: "Travel".into(),
        };

        let json = serde_json::to_value(&reimb).unwrap();
        assert_eq!(json["type"], "Travel");
        assert!(json.get("reimb_type").is_none());
        assert!(json["resolved"].is_null());
    }
}
