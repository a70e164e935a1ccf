//! Bot-owner gate and the in-memory blacklist.

use super::Denial;
use dashmap::DashSet;
use std::collections::HashSet;

/// Static set of bot owners from configuration.
#[derive(Debug, Clone, Default)]
pub struct OwnerGate {
    owners: HashSet<i64>,
}

impl OwnerGate {
    pub fn new(owners: impl IntoIterator<Item = i64>) -> Self {
        Self {
            owners: owners.into_iter().collect(),
        }
    }

    pub fn is_owner(&self, user_id: i64) -> bool {
        self.owners.contains(&user_id)
    }

    pub fn check(&self, user_id: i64) -> Result<(), Denial> {
        if self.is_owner(user_id) {
            Ok(())
        } else {
            Err(Denial::NotOwner)
        }
    }
}

/// Users barred from `/search`. Volatile: starts empty on every run.
#[derive(Debug, Default)]
pub struct Blacklist {
    users: DashSet<i64>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the user was not already listed.
    pub fn add(&self, user_id: i64) -> bool {
        self.users.insert(user_id)
    }

    /// Returns true if the user was listed.
    pub fn remove(&self, user_id: i64) -> bool {
        self.users.remove(&user_id).is_some()
    }

    pub fn contains(&self, user_id: i64) -> bool {
        self.users.contains(&user_id)
    }

    /// Listed ids in ascending order.
    pub fn list(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.users.iter().map(|id| *id).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_gate() {
        let gate = OwnerGate::new([10, 20]);
        assert!(gate.is_owner(10));
        assert!(!gate.is_owner(30));
        assert_eq!(gate.check(30), Err(Denial::NotOwner));
        assert!(OwnerGate::default().check(10).is_err());
    }

    #[test]
    fn test_blacklist_add_remove_list() {
        let list = Blacklist::new();
        assert!(list.list().is_empty());
        assert!(list.add(30));
        assert!(list.add(-4));
        assert!(!list.add(30));
        assert_eq!(list.list(), vec![-4, 30]);
        assert!(list.contains(30));
        assert!(list.remove(30));
        assert!(!list.remove(30));
        assert!(!list.contains(30));
    }
}
