use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "user_id": "5b1f6a34-0c1e-4c43-9d7e-0c3f3a1d2b11",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "position": "Engineer",
        "department": "R&D",
        "salary": 52000.0,
        "status": "ACTIVE"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    /// Identity of the linked auth-provider user
    #[schema(nullable = true)]
    pub user_id: Option<String>,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "Engineer", nullable = true)]
    pub position: Option<String>,

    #[schema(example = "R&D", nullable = true)]
    pub department: Option<String>,

    #[schema(example = 52000.0, nullable = true)]
    pub salary: Option<f64>,

    pub status: EmployeeStatus,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }
}

/// Row to insert; the store assigns `id` and starts it `ACTIVE`.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub user_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: Option<String>,
    pub department: Option<String>,
    pub salary: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EmployeePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub salary: Option<f64>,
    pub status: Option<EmployeeStatus>,
}

impl EmployeePatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.position.is_none()
            && self.department.is_none()
            && self.salary.is_none()
            && self.status.is_none()
    }

    pub fn deactivate() -> Self {
        Self {
            status: Some(EmployeeStatus::Inactive),
            ..Self::default()
        }
    }

    pub fn apply(&self, employee: &mut Employee) {
        if let Some(v) = &self.first_name {
            employee.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            employee.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            employee.email = v.clone();
        }
        if let Some(v) = &self.position {
            employee.position = Some(v.clone());
        }
        if let Some(v) = &self.department {
            employee.department = Some(v.clone());
        }
        if let Some(v) = self.salary {
            employee.salary = Some(v);
        }
        if let Some(v) = self.status {
            employee.status = v;
        }
    }
}
