use crate::core::{Employee, EmployeeId, Result, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Keyed rows plus the identifier sequence shared by both store variants.
///
/// The key a row is stored under is authoritative; the row's own `id` field is
/// kept as written and never normalized against it. `next_id` is `None` once
/// a key at `EmployeeId::MAX` has been written; from then on only explicit
/// keys can be stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeTable {
    rows: HashMap<EmployeeId, Employee>,
    next_id: Option<EmployeeId>,
}

impl Default for EmployeeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EmployeeTable {
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
            next_id: Some(1),
        }
    }

    /// Resolves the key a create would use: the embedded id, or the next
    /// value of the sequence. Fails instead of handing out a key that may
    /// already be taken.
    pub fn key_for_create(&self, employee: &Employee) -> Result<EmployeeId> {
        match employee.id {
            Some(id) => Ok(id),
            None => self.next_id.ok_or(StoreError::KeysExhausted),
        }
    }

    /// Stores `employee` under `key`, replacing any previous row.
    pub fn put(&mut self, key: EmployeeId, employee: Employee) {
        if let Some(next) = self.next_id
            && key >= next
        {
            self.next_id = key.checked_add(1);
        }
        self.rows.insert(key, employee);
    }

    pub fn get(&self, key: EmployeeId) -> Option<&Employee> {
        self.rows.get(&key)
    }

    pub fn all(&self) -> Vec<Employee> {
        self.rows.values().cloned().collect()
    }

    pub fn remove(&mut self, key: EmployeeId) -> Option<Employee> {
        self.rows.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn next_id(&self) -> Option<EmployeeId> {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_starts_at_one_and_skips_explicit_keys() {
        let mut table = EmployeeTable::new();
        let unkeyed = Employee::unkeyed("Ada", "Analytical");
        assert_eq!(table.key_for_create(&unkeyed).unwrap(), 1);

        table.put(10, Employee::new(10, "Grace", "Navy"));
        assert_eq!(table.key_for_create(&unkeyed).unwrap(), 11);

        table.put(3, Employee::new(3, "Linus", "OSDL"));
        assert_eq!(table.next_id(), Some(11));
    }

    #[test]
    fn removed_keys_are_not_reused() {
        let mut table = EmployeeTable::new();
        table.put(1, Employee::new(1, "John", "Meliora"));
        assert!(table.remove(1).is_some());
        assert!(table.remove(1).is_none());
        assert!(table.is_empty());
        assert_eq!(
            table
                .key_for_create(&Employee::unkeyed("Jane", "Meliora"))
                .unwrap(),
            2
        );
    }

    #[test]
    fn put_overwrites_without_merging() {
        let mut table = EmployeeTable::new();
        table.put(7, Employee::new(7, "Old", "Before"));
        table.put(7, Employee::new(5, "X", "Y"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(7), Some(&Employee::new(5, "X", "Y")));
    }

    #[test]
    fn max_key_exhausts_sequence_instead_of_reusing_it() {
        let mut table = EmployeeTable::new();
        table.put(EmployeeId::MAX, Employee::new(EmployeeId::MAX, "Keep", "Me"));
        assert_eq!(table.next_id(), None);

        let err = table
            .key_for_create(&Employee::unkeyed("New", "Hire"))
            .unwrap_err();
        assert!(matches!(err, StoreError::KeysExhausted));
        assert_eq!(
            table.key_for_create(&Employee::new(3, "Explicit", "Key")).unwrap(),
            3
        );
        assert_eq!(
            table.get(EmployeeId::MAX),
            Some(&Employee::new(EmployeeId::MAX, "Keep", "Me"))
        );
    }
}
