//! Employee directory records.
//!
//! Employees come from an external master directory. Upstream systems disagree
//! on the id decoration (`EMP-00123`, `00123`, ` 00123 `), so every id is
//! reduced to its digits by [`EmployeeId::parse`] before it is stored or
//! compared. Leading zeros are part of the id: `00123` and `123` differ.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Canonical employee identifier: a non-empty run of ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmployeeId(String);

impl EmployeeId {
    /// Normalize a raw upstream id by stripping every non-digit character.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(format!("Invalid employee id '{}': no digits", raw.trim()));
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for EmployeeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EmployeeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        let raw = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        };
        EmployeeId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Directory entry mirrored from the master employee source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: EmployeeId,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Directory row as delivered by an upstream feed, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRecord {
    #[serde(alias = "emp_id", alias = "employeeId")]
    pub employee_id: serde_json::Value,
    #[serde(alias = "employee_name", alias = "full_name")]
    pub name: String,
    #[serde(default, alias = "dept")]
    pub department: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl EmployeeRecord {
    /// Normalize the record into a directory entry.
    pub fn normalize(&self) -> Result<Employee, String> {
        let raw_id = match &self.employee_id {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            other => return Err(format!("Invalid employee id: {}", other)),
        };
        let employee_id = EmployeeId::parse(&raw_id)?;
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(format!("Employee {} has no name", employee_id));
        }
        let department = self
            .department
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok(Employee {
            employee_id,
            name,
            department,
            active: self.active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_strips_non_digits() {
        assert_eq!(EmployeeId::parse("EMP-00123").unwrap().as_str(), "00123");
        assert_eq!(EmployeeId::parse(" 00123 ").unwrap(), EmployeeId::parse("EMP-00123").unwrap());
        assert_ne!(EmployeeId::parse("00123").unwrap(), EmployeeId::parse("123").unwrap());
        assert!(EmployeeId::parse("ADMIN").is_err());
        assert!(EmployeeId::parse("").is_err());
    }

    #[test]
    fn test_deserialize_accepts_numbers_and_strings() {
        let a: EmployeeId = serde_json::from_value(json!(1001)).unwrap();
        let b: EmployeeId = serde_json::from_value(json!("ID-1001")).unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_value(&a).unwrap(), json!("1001"));
        assert!(serde_json::from_value::<EmployeeId>(json!("none")).is_err());
    }

    #[test]
    fn test_record_normalize() {
        let record: EmployeeRecord = serde_json::from_value(json!({
            "emp_id": "E-42",
            "employee_name": "  Siti Rahma ",
            "dept": "  ",
        }))
        .unwrap();
        let employee = record.normalize().unwrap();
        assert_eq!(employee.employee_id.as_str(), "42");
        assert_eq!(employee.name, "Siti Rahma");
        assert_eq!(employee.department, None);
        assert!(employee.active);
    }

    #[test]
    fn test_record_normalize_rejects_missing_name() {
        let record = EmployeeRecord {
            employee_id: json!(7),
            name: " ".to_string(),
            department: None,
            active: true,
        };
        assert!(record.normalize().is_err());
    }
}
