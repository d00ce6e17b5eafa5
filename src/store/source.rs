//! Entity sources and their raw record shape.
//!
//! A source is one override layer (a campaign file, a GM's notes, an import)
//! with a declared primacy. Records inside a source are decoded one by one so
//! a single malformed record is logged and skipped instead of failing the
//! whole source.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityKind, HistoryKind};
use crate::error::{SourceError, ValidationError};
use crate::time::TemporalValue;

/// A raw attribute value: bare text or text with textual validity bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Bare text, valid at every date.
    Text(String),
    /// Text with optional `from`/`to` bounds.
    Dated {
        /// The text.
        value: String,
        /// First valid date, `YYYY[-MM[-DD]]`.
        #[serde(default, alias = "od")]
        from: Option<String>,
        /// Last valid date, `YYYY[-MM[-DD]]`.
        #[serde(default, alias = "do")]
        to: Option<String>,
    },
}

impl RawValue {
    /// Converts into a temporal value; malformed bounds yield plain text.
    #[must_use]
    pub fn into_temporal(self) -> TemporalValue {
        match self {
            Self::Text(text) => TemporalValue::plain(text),
            Self::Dated { value, from, to } => {
                TemporalValue::parse(value, from.as_deref(), to.as_deref())
            }
        }
    }
}

/// Persisted shape of an entity record as delivered by the parsing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Canonical name.
    #[serde(alias = "nazwa")]
    pub name: String,

    /// Type label, parsed into an entity kind.
    #[serde(rename = "type", alias = "typ_encji")]
    pub kind: String,

    /// Alias values.
    #[serde(default, alias = "aliasy")]
    pub aliases: Vec<RawValue>,
    /// Location values.
    #[serde(default, alias = "lokacja")]
    pub location: Vec<RawValue>,
    /// Group values.
    #[serde(default, alias = "grupa")]
    pub group: Vec<RawValue>,
    /// Owner values.
    #[serde(default, alias = "wlasciciel")]
    pub owner: Vec<RawValue>,
    /// Status values.
    #[serde(default)]
    pub status: Vec<RawValue>,
    /// Door target values.
    #[serde(default, alias = "drzwi")]
    pub door: Vec<RawValue>,
    /// Subtype values.
    #[serde(default, alias = "typ")]
    pub types: Vec<RawValue>,
    /// Quantity values.
    #[serde(default, alias = "ilosc")]
    pub quantity: Vec<RawValue>,

    /// Untimed category labels.
    #[serde(default, alias = "nazwy_ogolne")]
    pub generic_names: Vec<String>,

    /// Tags without a typed history.
    #[serde(default)]
    pub overrides: BTreeMap<String, Vec<RawValue>>,
}

impl EntityRecord {
    /// Converts the raw record into an entity.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyEntityName` for a blank name and
    /// `ValidationError::UnknownEntityKind` for an unrecognised kind.
    pub fn into_entity(self) -> Result<Entity, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyEntityName);
        }
        let kind: EntityKind = self
            .kind
            .parse()
            .map_err(|_| ValidationError::UnknownEntityKind { value: self.kind.clone() })?;

        let mut entity = Entity::new(name, kind);
        let typed = [
            (HistoryKind::Alias, self.aliases),
            (HistoryKind::Location, self.location),
            (HistoryKind::Group, self.group),
            (HistoryKind::Owner, self.owner),
            (HistoryKind::Status, self.status),
            (HistoryKind::Door, self.door),
            (HistoryKind::Type, self.types),
            (HistoryKind::Quantity, self.quantity),
        ];
        for (history, values) in typed {
            for value in values {
                entity.push_history(history, value.into_temporal());
            }
        }
        for generic in self.generic_names {
            entity = entity.with_generic_name(generic);
        }
        for (tag, values) in self.overrides {
            for value in values {
                entity.push_override(tag.clone(), value.into_temporal());
            }
        }
        Ok(entity)
    }
}

/// Contents of a source before parsing.
#[derive(Debug, Clone)]
pub enum SourcePayload {
    /// A JSON array of [`EntityRecord`]s.
    Json(String),
    /// Entities already decoded by the caller.
    Entities(Vec<Entity>),
}

/// One entity source with its primacy.
///
/// Sources are applied in ascending primacy; among equal primacies, in the
/// order they were declared. Later-applied sources win wherever the history
/// tie-break ("last recorded wins") decides.
#[derive(Debug, Clone)]
pub struct EntitySource {
    /// Source name used in diagnostics.
    pub name: String,
    /// Merge precedence; higher values are applied later.
    pub primacy: i32,
    /// The records.
    pub payload: SourcePayload,
}

impl EntitySource {
    /// A source backed by a JSON array of records.
    #[must_use]
    pub fn json(name: impl Into<String>, primacy: i32, json: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primacy,
            payload: SourcePayload::Json(json.into()),
        }
    }

    /// A source of already decoded entities.
    #[must_use]
    pub fn entities(name: impl Into<String>, primacy: i32, entities: Vec<Entity>) -> Self {
        Self {
            name: name.into(),
            primacy,
            payload: SourcePayload::Entities(entities),
        }
    }

    /// Reads a JSON source from disk.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Io` if the file cannot be read.
    pub fn from_path(name: impl Into<String>, primacy: i32, path: &Path) -> Result<Self, SourceError> {
        let json = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::json(name, primacy, json))
    }

    /// Decodes the source into entities.
    ///
    /// Individual records that fail to decode are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Decode` if a JSON payload is not an array.
    pub fn parse(&self) -> Result<Vec<Entity>, SourceError> {
        let raw: Vec<serde_json::Value> = match &self.payload {
            SourcePayload::Entities(entities) => {
                return Ok(entities
                    .iter()
                    .cloned()
                    .map(|mut e| {
                        e.rekey();
                        e
                    })
                    .collect());
            }
            SourcePayload::Json(json) => {
                serde_json::from_str(json).map_err(|e| SourceError::Decode {
                    source_name: self.name.clone(),
                    message: e.to_string(),
                })?
            }
        };

        let mut out = Vec::with_capacity(raw.len());
        for (position, value) in raw.into_iter().enumerate() {
            let record: EntityRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(err) => {
                    tracing::warn!(source = %self.name, position, error = %err, "skipping undecodable entity record");
                    continue;
                }
            };
            match record.into_entity() {
                Ok(entity) => out.push(entity),
                Err(err) => {
                    tracing::warn!(source = %self.name, position, error = %err, "skipping invalid entity record");
                }
            }
        }
        Ok(out)
    }
}
