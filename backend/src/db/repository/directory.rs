//! Employee directory mirror.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Employee, EmployeeId};

/// Directory search parameters. `text` and `employee_id` are OR-ed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeSearch {
    /// Case-insensitive substring of the name or department.
    pub text: Option<String>,
    pub employee_id: Option<EmployeeId>,
    pub limit: usize,
}

impl EmployeeSearch {
    pub fn matches(&self, employee: &Employee) -> bool {
        if self.text.is_none() && self.employee_id.is_none() {
            return true;
        }
        let by_id = self
            .employee_id
            .as_ref()
            .is_some_and(|id| &employee.employee_id == id);
        let by_text = self.text.as_ref().is_some_and(|text| {
            let needle = text.to_lowercase();
            employee.name.to_lowercase().contains(&needle)
                || employee
                    .department
                    .as_ref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        });
        by_id || by_text
    }
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Insert or replace directory entries keyed by employee id.
    async fn upsert_employees(&self, employees: &[Employee]) -> RepositoryResult<usize>;

    async fn get_employee(&self, employee_id: &EmployeeId) -> RepositoryResult<Option<Employee>>;

    /// Fetch the entries for `ids`; unknown ids are skipped.
    async fn find_employees(&self, ids: &[EmployeeId]) -> RepositoryResult<Vec<Employee>>;

    /// Search ordered by name.
    async fn search_employees(&self, search: &EmployeeSearch) -> RepositoryResult<Vec<Employee>>;
}
