//! Applies dated change directives to an entity store.
//!
//! Directives are applied in session-date order. Each one names its target
//! in free text; the target is matched by exact entity name first and then
//! through the resolver. A directive whose target cannot be resolved is
//! logged and skipped, never fatal.

mod directive;

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::entity::{Entity, EntityId, HistoryKind};
use crate::index::Owner;
use crate::player::Player;
use crate::resolver::Resolver;
use crate::space::IdentitySpace;
use crate::store::EntityStore;
use crate::time::{last_active, TemporalValue};

pub use directive::{ChangeDirective, TagChange};

static QUANTITY_DELTA: OnceLock<Regex> = OnceLock::new();

fn quantity_delta() -> &'static Regex {
    QUANTITY_DELTA.get_or_init(|| Regex::new(r"^([+-])\s*(\d+)$").expect("valid delta regex"))
}

/// Knobs for [`merge_state`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Reference date for derived fields; `None` means "latest".
    pub as_of: Option<NaiveDate>,
    /// Resolver settings used for targets that are not exact names.
    pub resolver: ResolverConfig,
}

/// A directive that was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDirective {
    /// The target text as written.
    pub target: String,
    /// Session date of the directive.
    pub date: NaiveDate,
}

/// What a merge did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Number of directives applied.
    pub applied: usize,
    /// Entities changed, in the order they were first touched.
    pub touched: Vec<EntityId>,
    /// Directives whose target did not resolve, in application order.
    pub skipped: Vec<SkippedDirective>,
}

/// The updated store and the report of a merge.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The store with every directive applied.
    pub store: EntityStore,
    /// What was applied and what was skipped.
    pub report: MergeReport,
}

/// Applies `directives` to `store` and returns the updated store.
///
/// Values without explicit validity are auto-dated from the directive's
/// session date. Known tags go to the typed histories and quantity accepts
/// `+N`/`-N` deltas; unknown tags go to the overrides. Afterwards every
/// entity's histories are re-sorted and its derived fields and canonical
/// path recomputed at `options.as_of`, so the whole store shares one
/// reference date.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use kronika::merge::{merge_state, ChangeDirective, MergeOptions, TagChange};
/// use kronika::{Entity, EntityKind, EntityStore};
///
/// let store = EntityStore::from_entities([Entity::new("Kupiec Orrin", EntityKind::Person)]);
/// let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
/// let directive = ChangeDirective::new("Kupiec Orrin", date)
///     .with_change(TagChange::new("lokacja", "Steadwick"));
///
/// let outcome = merge_state(store, &[], &[directive], &MergeOptions::default());
/// let orrin = &outcome.store.entities()[0];
/// assert_eq!(orrin.current_location.as_deref(), Some("Steadwick"));
/// ```
#[must_use]
pub fn merge_state(
    mut store: EntityStore,
    players: &[Player],
    directives: &[ChangeDirective],
    options: &MergeOptions,
) -> MergeOutcome {
    let space = IdentitySpace::build(&store, players, options.resolver.clone());
    let resolver = space.resolver();

    let mut ordered: Vec<&ChangeDirective> = directives.iter().collect();
    ordered.sort_by_key(|d| d.date);

    let mut report = MergeReport::default();
    let mut touched = HashSet::new();
    for directive in ordered {
        let Some(id) = resolve_target(&store, &resolver, &directive.target) else {
            warn!(target_name = %directive.target, date = %directive.date, "unresolved directive target, skipping");
            report.skipped.push(SkippedDirective {
                target: directive.target.clone(),
                date: directive.date,
            });
            continue;
        };
        let Some(entity) = store.get_mut(id) else {
            continue;
        };
        apply_directive(entity, directive);
        debug!(entity = %entity.name, date = %directive.date, changes = directive.changes.len(), "directive applied");
        report.applied += 1;
        if touched.insert(id) {
            report.touched.push(id);
        }
    }

    store.finalize(options.as_of);

    MergeOutcome { store, report }
}

/// Finds the entity a directive refers to.
fn resolve_target(store: &EntityStore, resolver: &Resolver<'_>, target: &str) -> Option<EntityId> {
    if let [only] = store.find_by_name(target).as_slice() {
        return Some(only.id);
    }
    match resolver.resolve(target, None)? {
        Owner::Entity { id, .. } => Some(id),
        Owner::Player { name } | Owner::Character { name, .. } => roster_entity(store, &name),
    }
}

/// The entity sharing a roster name, preferring player-linked kinds.
fn roster_entity(store: &EntityStore, name: &str) -> Option<EntityId> {
    let candidates = store.find_by_name(name);
    candidates
        .iter()
        .find(|e| e.kind.is_player_linked())
        .or_else(|| match candidates.as_slice() {
            [only] => Some(only),
            _ => None,
        })
        .map(|e| e.id)
}

fn apply_directive(entity: &mut Entity, directive: &ChangeDirective) {
    for change in &directive.changes {
        let value = change.stamped(directive.date);
        match HistoryKind::from_tag(&change.tag) {
            Some(HistoryKind::Quantity) => {
                let value = apply_quantity_delta(entity, value, directive.date);
                entity.push_history(HistoryKind::Quantity, value);
            }
            Some(kind) => entity.push_history(kind, value),
            None => entity.push_override(change.tag.trim(), value),
        }
    }
}

/// Rewrites a `+N`/`-N` value as an absolute quantity.
///
/// The base is the quantity active on the session date; an unparseable base
/// counts as zero.
fn apply_quantity_delta(entity: &Entity, mut value: TemporalValue, date: NaiveDate) -> TemporalValue {
    let Some(caps) = quantity_delta().captures(value.text.trim()) else {
        return value;
    };
    let Ok(amount) = caps[2].parse::<i64>() else {
        warn!(entity = %entity.name, delta = %value.text, "quantity delta out of range, keeping as text");
        return value;
    };
    let current = last_active(&entity.quantity_history, Some(date)).map(|v| v.text.trim());
    let base = match current.map(str::parse::<i64>) {
        None => 0,
        Some(Ok(n)) => n,
        Some(Err(_)) => {
            warn!(entity = %entity.name, current = current.unwrap_or_default(), "current quantity is not a number, using 0");
            0
        }
    };
    let total = if &caps[1] == "-" {
        base.saturating_sub(amount)
    } else {
        base.saturating_add(amount)
    };
    value.text = total.to_string();
    value
}
