//! Canonical path resolution.
//!
//! Places nest through their location history, so `Erathia` located in
//! `Enroth` resolves to `Lokacja/Enroth/Erathia`. Every other kind resolves
//! to the flat `Kind/Name`.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::entity::{Entity, EntityId, EntityKind};
use crate::time::{all_active, last_active};

/// Resolves canonical paths over one snapshot of entities.
///
/// Results are memoized in a caller-owned map keyed by entity id, so one map
/// can be shared across every lookup of a pass.
#[derive(Debug)]
pub struct CanonicalPaths<'a> {
    entities: &'a [Entity],
    positions: HashMap<EntityId, usize>,
    places: HashMap<String, usize>,
    as_of: Option<NaiveDate>,
}

impl<'a> CanonicalPaths<'a> {
    /// Indexes `entities` for lookups at `as_of`.
    #[must_use]
    pub fn new(entities: &'a [Entity], as_of: Option<NaiveDate>) -> Self {
        let mut positions = HashMap::with_capacity(entities.len());
        let mut places = HashMap::new();
        for (idx, entity) in entities.iter().enumerate() {
            positions.insert(entity.id, idx);
            if entity.kind == EntityKind::Place {
                places.entry(entity.name.to_lowercase()).or_insert(idx);
            }
        }
        Self {
            entities,
            positions,
            places,
            as_of,
        }
    }

    /// The place a place is located in: its current location, or, with no
    /// location history at all, its first active door target.
    fn parent_of(&self, entity: &'a Entity) -> Option<&'a str> {
        if entity.location_history.is_empty() {
            return all_active(&entity.door_history, self.as_of)
                .first()
                .map(|door| door.text.as_str());
        }
        last_active(&entity.location_history, self.as_of).map(|loc| loc.text.as_str())
    }

    /// Resolves the canonical path of `id`, or None for an unknown id.
    pub fn resolve_cn(&self, id: EntityId, memo: &mut HashMap<EntityId, String>) -> Option<String> {
        if let Some(path) = memo.get(&id) {
            return Some(path.clone());
        }
        let start = *self.positions.get(&id)?;
        let entity = &self.entities[start];

        if entity.kind != EntityKind::Place {
            let path = format!("{}/{}", entity.kind.label(), entity.name);
            memo.insert(id, path.clone());
            return Some(path);
        }

        // Walk upward; `chain` holds the start followed by its ancestors.
        let mut chain = vec![start];
        let mut visited = HashSet::from([start]);
        let mut prefix: Option<String> = None;
        let mut current = start;

        while let Some(parent_name) = self.parent_of(&self.entities[current]) {
            let Some(&parent) = self.places.get(&parent_name.to_lowercase()) else {
                prefix = Some(format!("{}/{parent_name}", EntityKind::Place.label()));
                break;
            };
            if !visited.insert(parent) {
                tracing::warn!(
                    entity = %entity.name,
                    revisited = %self.entities[parent].name,
                    "cycle in location chain, using flat canonical path"
                );
                // Not memoized: a later walk through this node must reach the
                // cycle itself and fall back too.
                return Some(format!("{}/{}", EntityKind::Place.label(), entity.name));
            }
            if let Some(known) = memo.get(&self.entities[parent].id) {
                prefix = Some(known.clone());
                break;
            }
            chain.push(parent);
            current = parent;
        }

        let mut path = prefix.unwrap_or_else(|| EntityKind::Place.label().to_string());
        for &idx in chain.iter().rev() {
            let node = &self.entities[idx];
            path.push('/');
            path.push_str(&node.name);
            memo.insert(node.id, path.clone());
        }
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::HistoryKind;
    use crate::time::TemporalValue;

    fn place(name: &str, parent: Option<&str>) -> Entity {
        let entity = Entity::new(name, EntityKind::Place);
        match parent {
            Some(p) => entity.with_history(HistoryKind::Location, TemporalValue::plain(p)),
            None => entity,
        }
    }

    fn resolve(entities: &[Entity], name: &str) -> String {
        let paths = CanonicalPaths::new(entities, None);
        let mut memo = HashMap::new();
        let id = entities.iter().find(|e| e.name == name).unwrap().id;
        paths.resolve_cn(id, &mut memo).unwrap()
    }

    #[test]
    fn test_nested_places() {
        let entities = vec![
            place("Enroth", None),
            place("Erathia", Some("Enroth")),
            place("Steadwick", Some("Erathia")),
        ];
        assert_eq!(resolve(&entities, "Steadwick"), "Lokacja/Enroth/Erathia/Steadwick");
        assert_eq!(resolve(&entities, "Enroth"), "Lokacja/Enroth");
    }

    #[test]
    fn test_non_place_is_flat() {
        let entities = vec![Entity::new("Kupiec Orrin", EntityKind::Person)
            .with_history(HistoryKind::Location, TemporalValue::plain("Steadwick"))];
        assert_eq!(resolve(&entities, "Kupiec Orrin"), "Postać/Kupiec Orrin");
    }

    #[test]
    fn test_unknown_parent_becomes_segment() {
        let entities = vec![place("Karczma", Some("Nighon"))];
        assert_eq!(resolve(&entities, "Karczma"), "Lokacja/Nighon/Karczma");
    }

    #[test]
    fn test_cycle_falls_back_to_flat_path() {
        let entities = vec![place("A", Some("B")), place("B", Some("A"))];
        assert_eq!(resolve(&entities, "A"), "Lokacja/A");
        assert_eq!(resolve(&entities, "B"), "Lokacja/B");
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let entities = vec![place("Pętla", Some("Pętla"))];
        assert_eq!(resolve(&entities, "Pętla"), "Lokacja/Pętla");
    }

    #[test]
    fn test_entity_below_cycle_falls_back() {
        let entities = vec![
            place("A", Some("B")),
            place("B", Some("A")),
            place("C", Some("A")),
        ];
        assert_eq!(resolve(&entities, "C"), "Lokacja/C");
    }

    #[test]
    fn test_cycle_fallbacks_are_not_memoized() {
        let entities = vec![
            place("A", Some("B")),
            place("B", Some("A")),
            place("C", Some("A")),
        ];
        let paths = CanonicalPaths::new(&entities, None);
        let mut memo = HashMap::new();
        assert_eq!(paths.resolve_cn(entities[0].id, &mut memo).unwrap(), "Lokacja/A");
        assert!(memo.is_empty());
        assert_eq!(paths.resolve_cn(entities[2].id, &mut memo).unwrap(), "Lokacja/C");
    }

    #[test]
    fn test_door_used_when_no_location() {
        let entities = vec![
            place("Enroth", None),
            Entity::new("Portal", EntityKind::Place)
                .with_history(HistoryKind::Door, TemporalValue::parse("Deyja", None, Some("2020")))
                .with_history(HistoryKind::Door, TemporalValue::plain("Enroth")),
        ];
        let paths = CanonicalPaths::new(&entities, NaiveDate::from_ymd_opt(2024, 1, 1));
        let mut memo = HashMap::new();
        assert_eq!(
            paths.resolve_cn(entities[1].id, &mut memo).unwrap(),
            "Lokacja/Enroth/Portal"
        );
    }

    #[test]
    fn test_memo_is_filled_for_ancestors() {
        let entities = vec![
            place("Enroth", None),
            place("Erathia", Some("Enroth")),
            place("Steadwick", Some("Erathia")),
        ];
        let paths = CanonicalPaths::new(&entities, None);
        let mut memo = HashMap::new();
        paths.resolve_cn(entities[2].id, &mut memo);
        assert_eq!(memo.get(&entities[1].id).unwrap(), "Lokacja/Enroth/Erathia");
        assert_eq!(memo.len(), 3);
    }

    #[test]
    fn test_parent_follows_as_of() {
        let entities = vec![
            place("Enroth", None),
            place("Antagarich", None),
            Entity::new("Erathia", EntityKind::Place)
                .with_history(HistoryKind::Location, TemporalValue::parse("Enroth", None, Some("2023")))
                .with_history(HistoryKind::Location, TemporalValue::parse("Antagarich", Some("2024"), None)),
        ];
        let early = CanonicalPaths::new(&entities, NaiveDate::from_ymd_opt(2022, 5, 1));
        let mut memo = HashMap::new();
        assert_eq!(early.resolve_cn(entities[2].id, &mut memo).unwrap(), "Lokacja/Enroth/Erathia");

        let latest = CanonicalPaths::new(&entities, None);
        let mut memo = HashMap::new();
        assert_eq!(latest.resolve_cn(entities[2].id, &mut memo).unwrap(), "Lokacja/Antagarich/Erathia");
    }

    #[test]
    fn test_unknown_id() {
        let entities = vec![place("Enroth", None)];
        let paths = CanonicalPaths::new(&entities, None);
        assert!(paths.resolve_cn(EntityId::nil(), &mut HashMap::new()).is_none());
    }
}
