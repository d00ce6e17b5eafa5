//! In-memory entity store.
//!
//! The store holds one merged snapshot of every entity. Records are keyed by
//! `(kind, name)`; records sharing a key are folded into one entity whose
//! histories are the order-preserving union of every contributor.

use std::collections::HashMap;
use std::thread;

use chrono::NaiveDate;
use crossbeam_channel::bounded;

use crate::entity::{Entity, EntityId, EntityKind};
use crate::error::{KronikaError, KronikaResult, SourceError};
use crate::store::canonical::CanonicalPaths;
use crate::store::source::EntitySource;

/// Merged, in-memory entity snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityStore {
    entities: Vec<Entity>,
    by_id: HashMap<EntityId, usize>,
}

impl EntityStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a finalized store from already decoded entities.
    #[must_use]
    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        let mut store = Self::new();
        for entity in entities {
            store.insert(entity);
        }
        store.finalize(None);
        store
    }

    /// Parses and merges sources one after another.
    ///
    /// # Errors
    ///
    /// Returns a `SourceError` if any source payload cannot be decoded at all.
    pub fn from_sources(sources: &[EntitySource]) -> KronikaResult<Self> {
        let parsed = sources
            .iter()
            .map(EntitySource::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::merge_parsed(sources, parsed))
    }

    /// Parses sources on up to `workers` threads, then merges.
    ///
    /// The result is identical to [`EntityStore::from_sources`]: merge order
    /// follows primacy, never completion order.
    ///
    /// # Errors
    ///
    /// Returns a `SourceError` if any source payload cannot be decoded at all.
    pub fn from_sources_parallel(sources: &[EntitySource], workers: usize) -> KronikaResult<Self> {
        let workers = workers.max(1).min(sources.len().max(1));
        let (job_tx, job_rx) = bounded::<usize>(sources.len().max(1));
        let (out_tx, out_rx) = bounded::<(usize, Result<Vec<Entity>, SourceError>)>(sources.len().max(1));

        for idx in 0..sources.len() {
            job_tx
                .send(idx)
                .map_err(|_| KronikaError::internal("source job queue closed early"))?;
        }
        drop(job_tx);

        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let out_tx = out_tx.clone();
                scope.spawn(move || {
                    while let Ok(idx) = job_rx.recv() {
                        let _ = out_tx.send((idx, sources[idx].parse()));
                    }
                });
            }
        });
        drop(out_tx);

        let mut slots: Vec<Option<Vec<Entity>>> = vec![None; sources.len()];
        for (idx, result) in out_rx.iter() {
            slots[idx] = Some(result?);
        }

        let parsed = slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.ok_or_else(|| {
                    KronikaError::internal(format!("source '{}' produced no result", sources[idx].name))
                })
            })
            .collect::<KronikaResult<Vec<_>>>()?;
        Ok(Self::merge_parsed(sources, parsed))
    }

    fn merge_parsed(sources: &[EntitySource], parsed: Vec<Vec<Entity>>) -> Self {
        let mut ordered: Vec<(i32, usize, Vec<Entity>)> = parsed
            .into_iter()
            .enumerate()
            .map(|(idx, entities)| (sources[idx].primacy, idx, entities))
            .collect();
        ordered.sort_by_key(|(primacy, idx, _)| (*primacy, *idx));

        let mut store = Self::new();
        for (_, idx, entities) in ordered {
            tracing::debug!(source = %sources[idx].name, records = entities.len(), "merging source");
            for entity in entities {
                store.insert(entity);
            }
        }
        store.finalize(None);
        store
    }

    /// Inserts an entity, folding it into an existing record with the same key.
    ///
    /// Derived fields are not recomputed; call [`EntityStore::finalize`].
    pub fn insert(&mut self, mut entity: Entity) {
        entity.rekey();
        match self.by_id.get(&entity.id) {
            Some(&idx) => self.entities[idx].absorb(entity),
            None => {
                self.by_id.insert(entity.id, self.entities.len());
                self.entities.push(entity);
            }
        }
    }

    /// Sorts every history and recomputes every derived field.
    pub fn finalize(&mut self, as_of: Option<NaiveDate>) {
        for entity in &mut self.entities {
            entity.sort_histories();
            entity.refresh_derived(as_of);
        }
        self.refresh_canonical_paths(as_of);
    }

    /// Recomputes the canonical path of every entity.
    pub fn refresh_canonical_paths(&mut self, as_of: Option<NaiveDate>) {
        let paths: Vec<Option<String>> = {
            let resolver = CanonicalPaths::new(&self.entities, as_of);
            let mut memo = HashMap::with_capacity(self.entities.len());
            self.entities
                .iter()
                .map(|e| resolver.resolve_cn(e.id, &mut memo))
                .collect()
        };
        for (entity, path) in self.entities.iter_mut().zip(paths) {
            entity.canonical_path = path;
        }
    }

    /// Looks an entity up by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.by_id.get(&id).map(|&idx| &self.entities[idx])
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.by_id.get(&id).map(|&idx| &mut self.entities[idx])
    }

    /// Looks an entity up by its `(kind, name)` key.
    #[must_use]
    pub fn get_by_key(&self, kind: EntityKind, name: &str) -> Option<&Entity> {
        self.get(EntityId::for_key(kind, name))
    }

    /// Finds entities by name, ignoring case (aliases are not consulted).
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Vec<&Entity> {
        let needle = name.trim().to_lowercase();
        self.entities
            .iter()
            .filter(|e| e.name.to_lowercase() == needle)
            .collect()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Every entity in insertion order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Consumes the store.
    #[must_use]
    pub fn into_entities(self) -> Vec<Entity> {
        self.entities
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
