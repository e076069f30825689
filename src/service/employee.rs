use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::report::{Page, clamp_limit};
use crate::error::{AppError, AppResult};
use crate::model::employee::{Employee, EmployeePatch, NewEmployee};
use crate::store::{EmployeeFilter, Range, RecordStore};

use super::require_employee;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EmployeeSubmission {
    /// Auth-provider user id (UUID)
    #[schema(example = "5b1f6a34-0c1e-4c43-9d7e-0c3f3a1d2b11")]
    pub user_id: Option<String>,
    #[schema(example = "John")]
    pub first_name: Option<String>,
    #[schema(example = "Doe")]
    pub last_name: Option<String>,
    #[schema(example = "john.doe@company.com", format = "email")]
    pub email: Option<String>,
    #[schema(example = "Engineer")]
    pub position: Option<String>,
    #[schema(example = "R&D")]
    pub department: Option<String>,
    #[schema(example = 52000.0)]
    pub salary: Option<f64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_user_id(user_id: &str) -> AppResult<()> {
    Uuid::parse_str(user_id)
        .map(|_| ())
        .map_err(|_| AppError::Validation(format!("user_id '{user_id}' is not a valid UUID")))
}

#[instrument(skip(store, submission), fields(email = ?submission.email))]
pub async fn create(
    store: &dyn RecordStore,
    submission: EmployeeSubmission,
) -> AppResult<Employee> {
    let email = non_blank(submission.email).ok_or_else(|| AppError::missing_field("email"))?;
    let user_id = non_blank(submission.user_id);
    if let Some(id) = &user_id {
        check_user_id(id)?;
    }
    if let Some(salary) = submission.salary {
        if salary < 0.0 {
            return Err(AppError::Validation("salary cannot be negative".to_string()));
        }
    }

    let employee = store
        .insert_employee(NewEmployee {
            user_id,
            first_name: non_blank(submission.first_name).unwrap_or_default(),
            last_name: non_blank(submission.last_name).unwrap_or_default(),
            email,
            position: non_blank(submission.position),
            department: non_blank(submission.department),
            salary: submission.salary,
        })
        .await?;

    info!(employee_id = employee.id, "Employee created");
    Ok(employee)
}

pub async fn get(store: &dyn RecordStore, id: u64) -> AppResult<Employee> {
    require_employee(store, id).await
}

pub async fn by_email(store: &dyn RecordStore, email: &str) -> AppResult<Employee> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::missing_field("email"));
    }
    store
        .find_employee_by_email(email)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))
}

pub async fn list(
    store: &dyn RecordStore,
    filter: &EmployeeFilter,
    offset: u64,
    limit: u64,
) -> AppResult<Page<Employee>> {
    let limit = clamp_limit(limit);
    let total = store.count_employees(filter).await?;
    let rows = store
        .find_employees(filter, Some(Range { offset, limit }))
        .await?;

    Ok(Page::from_parts(rows, total, offset, limit))
}

#[instrument(skip(store, patch))]
pub async fn update(store: &dyn RecordStore, id: u64, patch: EmployeePatch) -> AppResult<Employee> {
    if patch.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }
    if patch.salary.is_some_and(|s| s < 0.0) {
        return Err(AppError::Validation("salary cannot be negative".to_string()));
    }

    let updated = store
        .update_employee(id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {id} not found")))?;

    info!(employee_id = id, "Employee updated");
    Ok(updated)
}

/// Soft delete: the row stays, flagged `INACTIVE`.
#[instrument(skip(store))]
pub async fn deactivate(store: &dyn RecordStore, id: u64) -> AppResult<Employee> {
    let employee = store
        .update_employee(id, EmployeePatch::deactivate())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {id} not found")))?;

    info!(employee_id = id, "Employee deactivated");
    Ok(employee)
}
