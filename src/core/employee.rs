use serde::{Deserialize, Serialize};

pub type EmployeeId = i32;

/// The single resource managed by the service.
///
/// `id` is optional on input: a create without one gets a key assigned by the
/// store, while an update stores the body exactly as given, so a record can
/// carry an embedded id that differs from (or is missing next to) its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default)]
    pub id: Option<EmployeeId>,
    pub name: String,
    pub company: String,
}

impl Employee {
    pub fn new(id: EmployeeId, name: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            company: company.into(),
        }
    }

    pub fn unkeyed(name: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            company: company.into(),
        }
    }
}
