//! Station staff and the roster that owns them.

use std::collections::HashMap;

/// Index of an attendant inside a [`Roster`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct AttendantId(pub(crate) usize);

/// Staff member credited with the money taken at their pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendant {
    name: String,
    earnings: u64,
}

impl Attendant {
    /// New attendant with no earnings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            earnings: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Money collected so far.
    pub fn earnings(&self) -> u64 {
        self.earnings
    }

    /// Add `amount` to the collected money. Earnings never decrease.
    pub fn credit(&mut self, amount: u64) {
        self.earnings = self.earnings.saturating_add(amount);
    }
}

/// Owns every [`Attendant`] of a station, keyed by name, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<Attendant>,
    index: HashMap<String, AttendantId>,
}

impl Roster {
    /// Return the id for `name`, creating a fresh attendant on first sight.
    pub fn get_or_insert(&mut self, name: &str) -> AttendantId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = AttendantId(self.entries.len());
        self.index.insert(name.to_string(), id);
        self.entries.push(Attendant::new(name));
        id
    }

    pub fn id_of(&self, name: &str) -> Option<AttendantId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, id: AttendantId) -> Option<&Attendant> {
        self.entries.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: AttendantId) -> Option<&mut Attendant> {
        self.entries.get_mut(id.0)
    }

    pub fn by_name(&self, name: &str) -> Option<&Attendant> {
        self.id_of(name).and_then(|id| self.get(id))
    }

    /// Attendants in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &Attendant> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_attendant_starts_without_money() {
        let mut alice = Attendant::new("Alice");
        assert_eq!(alice.earnings(), 0);
        alice.credit(30_000);
        alice.credit(1_500);
        assert_eq!(alice.earnings(), 31_500);
        assert_eq!(alice.name(), "Alice");
    }

    #[test]
    fn roster_reuses_existing_names() {
        let mut roster = Roster::default();
        let alice = roster.get_or_insert("Alice");
        let bob = roster.get_or_insert("Bob");
        assert_eq!(roster.get_or_insert("Alice"), alice);
        assert_ne!(alice, bob);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.by_name("Bob").map(Attendant::name), Some("Bob"));
        assert!(roster.by_name("Charly").is_none());
    }
}
