//! Request types for the attendance payroll API.
//!
//! This module defines the JSON request bodies and query strings accepted
//! by the handlers.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Assignment, AssignmentStatus, PayTemplate, PayrollField, ShiftWindow};

/// Request body for `POST /assignments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRequest {
    /// Identifier chosen by the scheduling service; generated when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// The assigned worker.
    pub worker_id: String,
    /// The job the worker is assigned to.
    pub job_id: String,
    /// Rates used for every day of the assignment.
    pub pay_template: PayTemplate,
    /// The scheduled shift.
    pub shift: ShiftWindow,
    /// Defaults to active.
    #[serde(default)]
    pub status: Option<AssignmentStatus>,
}

impl From<AssignmentRequest> for Assignment {
    fn from(req: AssignmentRequest) -> Self {
        Assignment {
            id: req.id.unwrap_or_else(Uuid::new_v4),
            worker_id: req.worker_id,
            job_id: req.job_id,
            pay_template: req.pay_template,
            shift: req.shift,
            status: req.status.unwrap_or(AssignmentStatus::Active),
        }
    }
}

/// Query string for `GET /assignments/:id/attendance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRangeQuery {
    /// First day, inclusive.
    pub from: NaiveDate,
    /// Last day, inclusive.
    pub to: NaiveDate,
}

/// Request body for `POST /attendance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializeRequest {
    /// The owning assignment.
    pub assignment_id: Uuid,
    /// The scheduled day.
    pub date: NaiveDate,
}

/// Request body for check-in and check-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampRequest {
    /// When it happened (site local time).
    pub at: NaiveDateTime,
}

/// Request body for `POST /attendance/:id/proof`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofRequest {
    /// Opaque reference from the proof capture service.
    pub proof_ref: String,
    /// Metadata captured with the proof.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Request body for reviewer transitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemarkRequest {
    /// Reviewer remark. Mandatory when rejecting.
    #[serde(default)]
    pub remark: Option<String>,
}

/// Request body for `POST /attendance/:id/edits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEditRequest {
    /// The field to change.
    pub field: PayrollField,
    /// Its new value.
    pub value: Decimal,
}

/// Request body for `POST /payrolls/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The assignment to aggregate.
    pub assignment_id: Uuid,
    /// The worker paid on the assignment.
    pub worker_id: String,
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assignment_request_defaults() {
        let req: AssignmentRequest = serde_json::from_value(json!({
            "worker_id": "wrk_001",
            "job_id": "site_7",
            "pay_template": { "daily_wage": "700" },
            "shift": { "start": "09:00:00", "end": "17:00:00" }
        }))
        .unwrap();
        let assignment: Assignment = req.into();
        assert_eq!(assignment.status, AssignmentStatus::Active);
        assert_eq!(assignment.pay_template.daily_wage, Decimal::new(700, 0));
    }

    #[test]
    fn test_stage_edit_request_uses_snake_case_fields() {
        let req: StageEditRequest = serde_json::from_value(json!({
            "field": "overtime_pay",
            "value": "100.50"
        }))
        .unwrap();
        assert_eq!(req.field, PayrollField::OvertimePay);
        assert_eq!(req.value, Decimal::new(10050, 2));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result: Result<StageEditRequest, _> = serde_json::from_value(json!({
            "field": "net_payable",
            "value": "1"
        }));
        assert!(result.is_err());
    }
}
