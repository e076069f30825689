//! Request workflows: read rows from the record store, run them through the
//! pure components in `core`, then write back with conditional updates.

use crate::error::{AppError, AppResult};
use crate::model::employee::Employee;
use crate::store::RecordStore;

pub mod attendance;
pub mod employee;
pub mod leave;

pub(crate) async fn require_employee(store: &dyn RecordStore, id: u64) -> AppResult<Employee> {
    store
        .find_employee(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {id} not found")))
}

pub(crate) async fn require_active_employee(
    store: &dyn RecordStore,
    id: u64,
) -> AppResult<Employee> {
    let employee = require_employee(store, id).await?;
    if !employee.is_active() {
        return Err(AppError::Conflict(format!("Employee {id} is inactive")));
    }
    Ok(employee)
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::model::employee::{Employee, NewEmployee};
    use crate::store::{MemoryStore, RecordStore};

    pub(crate) async fn hire(store: &MemoryStore, email: &str) -> Employee {
        store
            .insert_employee(NewEmployee {
                user_id: None,
                first_name: "Grace".into(),
                last_name: "Hopper".into(),
                email: email.into(),
                position: Some("Engineer".into()),
                department: Some("R&D".into()),
                salary: Some(50_000.0),
            })
            .await
            .unwrap()
    }
}
