//! Entity types and identity.
//!
//! An entity is addressed by its `(kind, name)` pair. Everything else about
//! it is a history of [`TemporalValue`]s, so narrative records can move an
//! entity between places, groups and owners without losing the past.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::{last_active, sort_by_valid_from, TemporalValue};

/// Namespace for deriving entity ids from their addressing key.
const ENTITY_NAMESPACE: Uuid = Uuid::from_u128(0x6b72_6f6e_696b_6140_8e1d_0c4f_5a7b_3e21);

/// Stable entity identifier derived from `(kind, name)`.
///
/// The same key always yields the same id, across sources and runs.
///
/// # Examples
///
/// ```
/// use kronika::{EntityId, EntityKind};
///
/// let a = EntityId::for_key(EntityKind::Place, "Erathia");
/// let b = EntityId::for_key(EntityKind::Place, "Erathia");
/// assert_eq!(a, b);
/// assert_ne!(a, EntityId::for_key(EntityKind::Person, "Erathia"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Derives the id for an addressing key.
    #[must_use]
    pub fn for_key(kind: EntityKind, name: &str) -> Self {
        let key = format!("{}/{name}", kind.label());
        Self(Uuid::new_v5(&ENTITY_NAMESPACE, key.as_bytes()))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns true if this is a nil (all zeros) UUID.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Creates a nil entity ID (placeholder before an entity is keyed).
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed set of entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityKind {
    /// A non-player character.
    Person,
    /// A guild, faction or other group.
    Organization,
    /// A place; places nest through their location history.
    Place,
    /// An object, currency denomination or other item.
    Item,
    /// A player's own record in the entity store.
    Player,
    /// A character played by one of the players.
    PlayerCharacter,
}

impl EntityKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Person,
        Self::Organization,
        Self::Place,
        Self::Item,
        Self::Player,
        Self::PlayerCharacter,
    ];

    /// Label used as the first segment of canonical paths.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Person => "Postać",
            Self::Organization => "Organizacja",
            Self::Place => "Lokacja",
            Self::Item => "Przedmiot",
            Self::Player => "Gracz",
            Self::PlayerCharacter => "PostaćGracza",
        }
    }

    /// Returns true for the two kinds that mirror the player roster.
    #[must_use]
    pub const fn is_player_linked(self) -> bool {
        matches!(self, Self::Player | Self::PlayerCharacter)
    }
}

impl TryFrom<String> for EntityKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect();
        if normalized.is_empty() {
            return Err("entity kind cannot be empty".to_string());
        }

        Ok(match normalized.as_str() {
            "postać" | "postac" | "person" | "npc" => Self::Person,
            "organizacja" | "organization" | "frakcja" => Self::Organization,
            "lokacja" | "place" | "location" | "miejsce" => Self::Place,
            "przedmiot" | "item" => Self::Item,
            "gracz" | "player" => Self::Player,
            "postaćgracza" | "postacgracza" | "playercharacter" | "pc" => Self::PlayerCharacter,
            _ => {
                return Err(format!(
                    "unknown entity kind: {}. Use one of: postać, organizacja, lokacja, przedmiot, gracz, postać gracza",
                    value.trim()
                ))
            }
        })
    }
}

impl From<EntityKind> for String {
    fn from(value: EntityKind) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Names of the typed histories an entity carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryKind {
    /// Alternative names (`aliasy`).
    Alias,
    /// Where the entity is (`lokacja`).
    Location,
    /// Groups it belongs to (`grupa`).
    Group,
    /// Who owns it (`wlasciciel`).
    Owner,
    /// Condition or state (`status`).
    Status,
    /// Places a door or passage leads to (`drzwi`).
    Door,
    /// Free-form subtype labels (`typ`).
    Type,
    /// Counted amount (`ilosc`).
    Quantity,
}

impl HistoryKind {
    /// Every typed history.
    pub const ALL: [Self; 8] = [
        Self::Alias,
        Self::Location,
        Self::Group,
        Self::Owner,
        Self::Status,
        Self::Door,
        Self::Type,
        Self::Quantity,
    ];

    /// Maps a change-directive tag onto a typed history.
    ///
    /// Aliases are not reachable through tags; unknown tags return `None`
    /// and end up in the entity's free-form overrides.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "lokacja" | "location" => Some(Self::Location),
            "grupa" | "group" => Some(Self::Group),
            "właściciel" | "wlasciciel" | "owner" => Some(Self::Owner),
            "status" => Some(Self::Status),
            "drzwi" | "door" => Some(Self::Door),
            "typ" | "type" => Some(Self::Type),
            "ilość" | "ilosc" | "quantity" => Some(Self::Quantity),
            _ => None,
        }
    }
}

/// An entity with its attribute histories.
///
/// # Examples
///
/// ```
/// use kronika::{Entity, EntityKind, HistoryKind, TemporalValue};
///
/// let mut orrin = Entity::new("Kupiec Orrin", EntityKind::Person);
/// orrin.push_history(HistoryKind::Location, TemporalValue::plain("Harmondale"));
/// orrin.refresh_derived(None);
/// assert_eq!(orrin.current_location.as_deref(), Some("Harmondale"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Derived from `(kind, name)`; re-keyed whenever the store ingests the entity.
    #[serde(default)]
    pub id: EntityId,

    /// Canonical name; together with `kind` it addresses the entity.
    pub name: String,

    /// Entity kind.
    #[serde(rename = "type")]
    pub kind: EntityKind,

    /// Aliases with their validity.
    #[serde(default)]
    pub alias_history: Vec<TemporalValue>,
    /// Locations over time.
    #[serde(default)]
    pub location_history: Vec<TemporalValue>,
    /// Group memberships over time.
    #[serde(default)]
    pub group_history: Vec<TemporalValue>,
    /// Owners over time.
    #[serde(default)]
    pub owner_history: Vec<TemporalValue>,
    /// Statuses over time.
    #[serde(default)]
    pub status_history: Vec<TemporalValue>,
    /// Door targets over time.
    #[serde(default)]
    pub door_history: Vec<TemporalValue>,
    /// Subtype labels over time.
    #[serde(default)]
    pub type_history: Vec<TemporalValue>,
    /// Quantities over time, as text.
    #[serde(default)]
    pub quantity_history: Vec<TemporalValue>,

    /// Untimed category labels, e.g. denomination names.
    #[serde(default)]
    pub generic_names: Vec<String>,

    /// Free-form tags that have no typed history.
    #[serde(default)]
    pub overrides: BTreeMap<String, Vec<TemporalValue>>,

    /// Hierarchical path such as `Lokacja/Enroth/Erathia`; derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_path: Option<String>,
    /// Location active at the reference date; derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_location: Option<String>,
    /// Status active at the reference date; derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status: Option<String>,
}

impl Entity {
    /// Creates an entity with empty histories.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        let name = name.into();
        Self {
            id: EntityId::for_key(kind, &name),
            name,
            kind,
            alias_history: Vec::new(),
            location_history: Vec::new(),
            group_history: Vec::new(),
            owner_history: Vec::new(),
            status_history: Vec::new(),
            door_history: Vec::new(),
            type_history: Vec::new(),
            quantity_history: Vec::new(),
            generic_names: Vec::new(),
            overrides: BTreeMap::new(),
            canonical_path: None,
            current_location: None,
            current_status: None,
        }
    }

    /// Builder: adds an unbounded alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.push_history(HistoryKind::Alias, TemporalValue::plain(alias));
        self
    }

    /// Builder: appends a value to a typed history.
    #[must_use]
    pub fn with_history(mut self, kind: HistoryKind, value: TemporalValue) -> Self {
        self.push_history(kind, value);
        self
    }

    /// Builder: adds a generic name.
    #[must_use]
    pub fn with_generic_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.generic_names.contains(&name) {
            self.generic_names.push(name);
        }
        self
    }

    /// Recomputes the id from the addressing key.
    pub fn rekey(&mut self) {
        self.id = EntityId::for_key(self.kind, &self.name);
    }

    /// The history of `kind`.
    #[must_use]
    pub fn history(&self, kind: HistoryKind) -> &[TemporalValue] {
        match kind {
            HistoryKind::Alias => &self.alias_history,
            HistoryKind::Location => &self.location_history,
            HistoryKind::Group => &self.group_history,
            HistoryKind::Owner => &self.owner_history,
            HistoryKind::Status => &self.status_history,
            HistoryKind::Door => &self.door_history,
            HistoryKind::Type => &self.type_history,
            HistoryKind::Quantity => &self.quantity_history,
        }
    }

    /// Mutable access to the history of `kind`.
    pub fn history_mut(&mut self, kind: HistoryKind) -> &mut Vec<TemporalValue> {
        match kind {
            HistoryKind::Alias => &mut self.alias_history,
            HistoryKind::Location => &mut self.location_history,
            HistoryKind::Group => &mut self.group_history,
            HistoryKind::Owner => &mut self.owner_history,
            HistoryKind::Status => &mut self.status_history,
            HistoryKind::Door => &mut self.door_history,
            HistoryKind::Type => &mut self.type_history,
            HistoryKind::Quantity => &mut self.quantity_history,
        }
    }

    /// Appends a value to a typed history.
    pub fn push_history(&mut self, kind: HistoryKind, value: TemporalValue) {
        self.history_mut(kind).push(value);
    }

    /// Appends a value under a free-form override tag.
    pub fn push_override(&mut self, tag: impl Into<String>, value: TemporalValue) {
        self.overrides.entry(tag.into()).or_default().push(value);
    }

    /// Returns the value of a typed history active as of `as_of`.
    #[must_use]
    pub fn current(&self, kind: HistoryKind, as_of: Option<NaiveDate>) -> Option<&str> {
        last_active(self.history(kind), as_of).map(|v| v.text.as_str())
    }

    /// Iterates over every alias ever recorded, expired ones included.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.alias_history.iter().map(|v| v.text.as_str())
    }

    /// Folds another record of the same entity into this one.
    ///
    /// Histories, generic names and overrides are unioned in order; entries
    /// already present (same text and bounds) are not duplicated. Derived
    /// fields are cleared and must be recomputed.
    pub fn absorb(&mut self, other: Self) {
        for kind in HistoryKind::ALL {
            union_into(self.history_mut(kind), other.history(kind));
        }
        for name in other.generic_names {
            if !self.generic_names.contains(&name) {
                self.generic_names.push(name);
            }
        }
        for (tag, values) in other.overrides {
            union_into(self.overrides.entry(tag).or_default(), &values);
        }
        self.canonical_path = None;
        self.current_location = None;
        self.current_status = None;
    }

    /// Sorts every history by `valid_from`, unbounded starts first.
    pub fn sort_histories(&mut self) {
        for kind in HistoryKind::ALL {
            sort_by_valid_from(self.history_mut(kind));
        }
        for values in self.overrides.values_mut() {
            sort_by_valid_from(values);
        }
    }

    /// Recomputes current location and status from the histories.
    ///
    /// The canonical path depends on other entities and is recomputed by the
    /// store.
    pub fn refresh_derived(&mut self, as_of: Option<NaiveDate>) {
        self.current_location = self.current(HistoryKind::Location, as_of).map(str::to_string);
        self.current_status = self.current(HistoryKind::Status, as_of).map(str::to_string);
    }
}

fn union_into(target: &mut Vec<TemporalValue>, incoming: &[TemporalValue]) {
    for value in incoming {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_entity_id_is_stable() {
        let a = EntityId::for_key(EntityKind::Person, "Xeron Demonlord");
        let b = EntityId::for_key(EntityKind::Person, "Xeron Demonlord");
        assert_eq!(a, b);
        assert!(!a.is_nil());
        assert_ne!(a, EntityId::for_key(EntityKind::Person, "xeron demonlord"));
    }

    #[test]
    fn test_entity_kind_parse_polish_and_english() {
        assert_eq!("Lokacja".parse::<EntityKind>().unwrap(), EntityKind::Place);
        assert_eq!("location".parse::<EntityKind>().unwrap(), EntityKind::Place);
        assert_eq!("Postać".parse::<EntityKind>().unwrap(), EntityKind::Person);
        assert_eq!("postac".parse::<EntityKind>().unwrap(), EntityKind::Person);
        assert_eq!(
            "Postać gracza".parse::<EntityKind>().unwrap(),
            EntityKind::PlayerCharacter
        );
        assert_eq!("player_character".parse::<EntityKind>().unwrap(), EntityKind::PlayerCharacter);
        assert!("smok".parse::<EntityKind>().is_err());
        assert!("  ".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_entity_kind_serde_uses_label() {
        let json = serde_json::to_string(&EntityKind::Place).unwrap();
        assert_eq!(json, "\"Lokacja\"");
        let back: EntityKind = serde_json::from_str("\"organization\"").unwrap();
        assert_eq!(back, EntityKind::Organization);
    }

    #[test]
    fn test_player_linked_kinds() {
        let linked: Vec<_> = EntityKind::ALL
            .into_iter()
            .filter(|k| k.is_player_linked())
            .collect();
        assert_eq!(linked, vec![EntityKind::Player, EntityKind::PlayerCharacter]);
    }

    #[test]
    fn test_history_kind_from_tag() {
        assert_eq!(HistoryKind::from_tag("lokacja"), Some(HistoryKind::Location));
        assert_eq!(HistoryKind::from_tag("Właściciel"), Some(HistoryKind::Owner));
        assert_eq!(HistoryKind::from_tag("ilosc"), Some(HistoryKind::Quantity));
        assert_eq!(HistoryKind::from_tag("alias"), None);
        assert_eq!(HistoryKind::from_tag("reputacja"), None);
    }

    #[test]
    fn test_absorb_unions_histories() {
        let mut a = Entity::new("Xeron", EntityKind::Person)
            .with_alias("Xrom")
            .with_history(HistoryKind::Location, TemporalValue::parse("Enroth", Some("2023"), None));
        let b = Entity::new("Xeron", EntityKind::Person)
            .with_alias("Xrom")
            .with_alias("Demonlord")
            .with_history(HistoryKind::Location, TemporalValue::parse("Erathia", Some("2024"), None))
            .with_generic_name("Władca");

        a.absorb(b);

        let aliases: Vec<_> = a.aliases().collect();
        assert_eq!(aliases, vec!["Xrom", "Demonlord"]);
        assert_eq!(a.location_history.len(), 2);
        assert_eq!(a.generic_names, vec!["Władca".to_string()]);
    }

    #[test]
    fn test_absorb_merges_overrides() {
        let mut a = Entity::new("Miecz", EntityKind::Item);
        a.push_override("waga", TemporalValue::plain("3"));
        let mut b = Entity::new("Miecz", EntityKind::Item);
        b.push_override("waga", TemporalValue::plain("3"));
        b.push_override("kolor", TemporalValue::plain("srebrny"));

        a.absorb(b);
        assert_eq!(a.overrides["waga"].len(), 1);
        assert_eq!(a.overrides["kolor"][0].text, "srebrny");
    }

    #[test]
    fn test_refresh_derived_uses_latest_active() {
        let mut orrin = Entity::new("Kupiec Orrin", EntityKind::Person)
            .with_history(HistoryKind::Location, TemporalValue::parse("Harmondale", Some("2024-01"), None))
            .with_history(HistoryKind::Status, TemporalValue::plain("żywy"));
        orrin.refresh_derived(Some(date(2024, 6, 1)));
        assert_eq!(orrin.current_location.as_deref(), Some("Harmondale"));
        assert_eq!(orrin.current_status.as_deref(), Some("żywy"));

        orrin.refresh_derived(Some(date(2023, 6, 1)));
        assert_eq!(orrin.current_location, None);
    }

    #[test]
    fn test_sort_histories() {
        let mut e = Entity::new("Erathia", EntityKind::Place)
            .with_history(HistoryKind::Location, TemporalValue::parse("B", Some("2025"), None))
            .with_history(HistoryKind::Location, TemporalValue::parse("A", Some("2024"), None));
        e.sort_histories();
        assert_eq!(e.location_history[0].text, "A");
    }

    #[test]
    fn test_entity_serialization_round_trip() {
        let entity = Entity::new("Erathia", EntityKind::Place)
            .with_alias("Królestwo Erathii")
            .with_history(HistoryKind::Location, TemporalValue::plain("Enroth"));
        let json = serde_json::to_string(&entity).unwrap();
        assert!(json.contains("\"type\":\"Lokacja\""));
        let back: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entity);
    }
}
