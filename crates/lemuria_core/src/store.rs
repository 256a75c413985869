//! crates/lemuria_core/src/store.rs
//!
//! An ordered, in-memory entity collection keyed by id. Insertion order is the
//! read order and is never disturbed by removals or in-place updates.
//!
//! Profiles add one rule on top of the generic store: exactly one profile is
//! primary once the collection is non-empty, and that profile can't be removed.

use crate::domain::{ChatMessage, ProfileRecord};
use crate::ports::{CoreError, CoreResult};
use crate::validation::ValidProfile;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Entity Traits
//=========================================================================================

/// Something a store can hold.
pub trait Entity: Clone {
    /// Human-readable kind, used in error reports.
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    fn assign_id(&mut self, id: Uuid);

    /// Protected entities are refused by `remove`.
    fn is_protected(&self) -> bool {
        false
    }

    /// Runs right before insertion. `first` is true when the store is empty.
    fn on_append(&mut self, _first: bool) {}
}

/// Entities with boolean fields that can be flipped in place.
pub trait Toggle: Entity {
    type Field: Copy;

    fn toggle(&mut self, field: Self::Field);
}

impl Entity for ProfileRecord {
    const KIND: &'static str = "profile";

    fn id(&self) -> Uuid {
        self.id
    }

    fn assign_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn is_protected(&self) -> bool {
        self.is_primary
    }

    fn on_append(&mut self, first: bool) {
        // First-is-primary; later appends never arrive as a second primary.
        self.is_primary = first;
    }
}

impl Entity for ChatMessage {
    const KIND: &'static str = "message";

    fn id(&self) -> Uuid {
        self.id
    }

    fn assign_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

/// The toggleable fields of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageFlag {
    Expanded,
}

impl Toggle for ChatMessage {
    type Field = MessageFlag;

    fn toggle(&mut self, field: MessageFlag) {
        match field {
            MessageFlag::Expanded => self.is_expanded = !self.is_expanded,
        }
    }
}

//=========================================================================================
// The Store
//=========================================================================================

#[derive(Debug, Clone)]
pub struct EntityListStore<E: Entity> {
    items: IndexMap<Uuid, E>,
}

pub type ProfileStore = EntityListStore<ProfileRecord>;
pub type ChatStore = EntityListStore<ChatMessage>;

impl<E: Entity> Default for EntityListStore<E> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }
}

impl<E: Entity> EntityListStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&E> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.items.contains_key(&id)
    }

    /// Entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.items.values()
    }

    /// An owned snapshot of the collection, in insertion order.
    pub fn list(&self) -> Vec<E> {
        self.items.values().cloned().collect()
    }

    /// Inserts at the end and returns the stored entity.
    ///
    /// A nil id, or one already taken by another entity, is replaced with a fresh one.
    pub fn append(&mut self, mut entity: E) -> &E {
        let mut id = entity.id();
        if id.is_nil() || self.items.contains_key(&id) {
            id = Uuid::new_v4();
            entity.assign_id(id);
        }
        entity.on_append(self.items.is_empty());
        let (index, _) = self.items.insert_full(id, entity);
        &self.items[index]
    }

    /// Removes an entity, refusing protected ones. Order of the rest is preserved.
    pub fn remove(&mut self, id: Uuid) -> CoreResult<E> {
        let entity = self.items.get(&id).ok_or(CoreError::NotFound { kind: E::KIND, id })?;
        if entity.is_protected() {
            return Err(CoreError::ProtectedEntity { kind: E::KIND, id });
        }
        self.items
            .shift_remove(&id)
            .ok_or(CoreError::NotFound { kind: E::KIND, id })
    }
}

impl<E: Toggle> EntityListStore<E> {
    /// Flips `field` on the entity. Returns false (and does nothing) if the id is gone.
    pub fn toggle_field(&mut self, id: Uuid, field: E::Field) -> bool {
        match self.items.get_mut(&id) {
            Some(entity) => {
                entity.toggle(field);
                true
            }
            None => false,
        }
    }
}

impl EntityListStore<ProfileRecord> {
    /// The profile flagged as the user's own.
    pub fn primary(&self) -> Option<&ProfileRecord> {
        self.items.values().find(|p| p.is_primary)
    }

    /// Makes `id` the only primary profile.
    pub fn designate_primary(&mut self, id: Uuid) -> CoreResult<()> {
        if !self.items.contains_key(&id) {
            return Err(CoreError::NotFound {
                kind: ProfileRecord::KIND,
                id,
            });
        }
        for profile in self.items.values_mut() {
            profile.is_primary = profile.id == id;
        }
        Ok(())
    }

    /// Replaces the editable fields of an existing profile with a validated draft.
    /// Identity, primary flag, system and creation time are kept.
    pub fn apply_edit(&mut self, id: Uuid, edit: ValidProfile) -> CoreResult<&ProfileRecord> {
        let profile = self.items.get_mut(&id).ok_or(CoreError::NotFound {
            kind: ProfileRecord::KIND,
            id,
        })?;
        profile.name = edit.name;
        profile.gender = edit.gender;
        profile.date_of_birth = edit.date_of_birth;
        profile.time_of_birth = edit.time_of_birth;
        profile.place_of_birth = edit.place_of_birth;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AstrologySystem, Gender};
    use chrono::{TimeZone, Utc};

    fn profile(name: &str) -> ProfileRecord {
        ValidProfile {
            name: name.to_string(),
            gender: Gender::Other,
            date_of_birth: "1990-01-01".to_string(),
            time_of_birth: "10:00".to_string(),
            place_of_birth: "Oslo".to_string(),
        }
        .into_record(AstrologySystem::Western, Utc::now())
    }

    fn names(store: &ProfileStore) -> Vec<String> {
        store.iter().map(|p| p.name.clone()).collect()
    }

    fn primaries(store: &ProfileStore) -> usize {
        store.iter().filter(|p| p.is_primary).count()
    }

    #[test]
    fn first_profile_becomes_primary() {
        let mut store = ProfileStore::new();
        let alice = store.append(profile("Alice")).clone();
        assert!(alice.is_primary);
        assert!(!alice.id.is_nil());
        assert_eq!(store.list(), vec![alice]);
    }

    #[test]
    fn later_profiles_are_never_primary() {
        let mut store = ProfileStore::new();
        store.append(profile("Alice"));
        let mut sneaky = profile("Bob");
        sneaky.is_primary = true;
        let bob = store.append(sneaky);
        assert!(!bob.is_primary);

        for name in ["Carol", "Dan", "Eve"] {
            store.append(profile(name));
        }
        assert_eq!(primaries(&store), 1);
        assert_eq!(store.primary().unwrap().name, "Alice");
    }

    #[test]
    fn removing_primary_is_refused_without_mutation() {
        let mut store = ProfileStore::new();
        let alice_id = store.append(profile("Alice")).id;
        store.append(profile("Bob"));
        let before = store.list();

        let err = store.remove(alice_id).unwrap_err();
        assert_eq!(
            err,
            CoreError::ProtectedEntity {
                kind: "profile",
                id: alice_id
            }
        );
        assert_eq!(store.list(), before);
        assert_eq!(names(&store), ["Alice", "Bob"]);
    }

    #[test]
    fn removing_secondary_keeps_order() {
        let mut store = ProfileStore::new();
        store.append(profile("Alice"));
        let bob_id = store.append(profile("Bob")).id;
        store.append(profile("Carol"));

        let removed = store.remove(bob_id).unwrap();
        assert_eq!(removed.name, "Bob");
        assert_eq!(names(&store), ["Alice", "Carol"]);
        assert!(matches!(
            store.remove(bob_id),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn designate_primary_moves_the_flag() {
        let mut store = ProfileStore::new();
        let alice_id = store.append(profile("Alice")).id;
        let bob_id = store.append(profile("Bob")).id;

        store.designate_primary(bob_id).unwrap();
        assert_eq!(primaries(&store), 1);
        assert_eq!(store.primary().unwrap().id, bob_id);

        // The old primary is now an ordinary, removable profile.
        store.remove(alice_id).unwrap();
        assert!(store.remove(bob_id).is_err());
    }

    #[test]
    fn designate_unknown_id_is_not_found_and_harmless() {
        let mut store = ProfileStore::new();
        let alice_id = store.append(profile("Alice")).id;
        let missing = Uuid::new_v4();
        assert_eq!(
            store.designate_primary(missing),
            Err(CoreError::NotFound {
                kind: "profile",
                id: missing
            })
        );
        assert_eq!(store.primary().unwrap().id, alice_id);
    }

    #[test]
    fn append_replaces_colliding_ids() {
        let mut store = ProfileStore::new();
        let first = store.append(profile("Alice")).clone();
        let mut copy = profile("Bob");
        copy.id = first.id;
        let second_id = store.append(copy).id;
        assert_ne!(second_id, first.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn apply_edit_keeps_identity() {
        let mut store = ProfileStore::new();
        let alice = store.append(profile("Alice")).clone();
        let edit = ValidProfile {
            name: "Alicia".to_string(),
            gender: Gender::Female,
            date_of_birth: "1991-02-03".to_string(),
            time_of_birth: "08:15".to_string(),
            place_of_birth: "Bergen".to_string(),
        };
        let edited = store.apply_edit(alice.id, edit).unwrap();
        assert_eq!(edited.name, "Alicia");
        assert_eq!(edited.id, alice.id);
        assert!(edited.is_primary);
        assert_eq!(edited.created_at, alice.created_at);
    }

    #[test]
    fn messages_keep_insertion_order_with_equal_timestamps() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut store = ChatStore::new();
        store.append(ChatMessage::new("question", true, at));
        store.append(ChatMessage::new("answer", false, at));

        let log = store.list();
        assert!(log[0].is_from_user);
        assert!(!log[1].is_from_user);
        assert_eq!(log[1].content, "answer");
    }

    #[test]
    fn toggle_flips_and_ignores_missing_ids() {
        let mut store = ChatStore::new();
        let id = store.append(ChatMessage::new("hi", false, Utc::now())).id;

        assert!(store.toggle_field(id, MessageFlag::Expanded));
        assert!(store.get(id).unwrap().is_expanded);
        assert!(store.toggle_field(id, MessageFlag::Expanded));
        assert!(!store.get(id).unwrap().is_expanded);

        store.remove(id).unwrap();
        assert!(!store.toggle_field(id, MessageFlag::Expanded));
        assert!(store.is_empty());
    }
}
