//! In-memory component database.
//!
//! Records carry unit values as text (`"1.0 g/ml"`, `"58.44 g/mol"`). Units are
//! parsed when a record is added so dimension errors surface early, and each
//! record is assigned a uuid v4 identifier when it does not bring one.

use mb_core::quantity::parse_quantity;
use mb_core::units::{Density, MolarMass};
use serde::{Deserialize, Serialize};

use crate::component::Component;
use crate::error::{MixError, MixResult};

/// Serializable description of one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub molar_mass: Option<String>,
}

impl ComponentRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uid: None,
            density: None,
            formula: None,
            molar_mass: None,
        }
    }

    pub fn density(mut self, text: impl Into<String>) -> Self {
        self.density = Some(text.into());
        self
    }

    pub fn formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn molar_mass(mut self, text: impl Into<String>) -> Self {
        self.molar_mass = Some(text.into());
        self
    }
}

#[derive(Debug, Clone)]
struct Entry {
    record: ComponentRecord,
    density: Option<Density>,
    molar_mass: Option<MolarMass>,
}

impl Entry {
    fn parse(record: ComponentRecord) -> MixResult<Self> {
        let density = record
            .density
            .as_deref()
            .map(|text| parse_quantity(text)?.as_density())
            .transpose()?;
        let molar_mass = record
            .molar_mass
            .as_deref()
            .map(|text| parse_quantity(text)?.as_molar_mass())
            .transpose()?;
        Ok(Self {
            record,
            density,
            molar_mass,
        })
    }

    fn uid(&self) -> Option<&str> {
        self.record.uid.as_deref()
    }
}

/// Component lookup passed explicitly to mixtures and specs.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    entries: Vec<Entry>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = ComponentRecord>) -> MixResult<Self> {
        let mut registry = Self::new();
        for record in records {
            registry.add(record)?;
        }
        Ok(registry)
    }

    /// Parse a YAML list of records.
    pub fn from_yaml_str(text: &str) -> MixResult<Self> {
        let records: Vec<ComponentRecord> =
            serde_yaml::from_str(text).map_err(|e| MixError::Serialization(e.to_string()))?;
        Self::from_records(records)
    }

    /// Parse a JSON list of records.
    pub fn from_json_str(text: &str) -> MixResult<Self> {
        let records: Vec<ComponentRecord> =
            serde_json::from_str(text).map_err(|e| MixError::Serialization(e.to_string()))?;
        Self::from_records(records)
    }

    pub fn to_json_string(&self) -> MixResult<String> {
        let records: Vec<&ComponentRecord> = self.list().collect();
        serde_json::to_string_pretty(&records).map_err(|e| MixError::Serialization(e.to_string()))
    }

    /// Validate and store a record, returning its uid.
    pub fn add(&mut self, mut record: ComponentRecord) -> MixResult<String> {
        if self.contains(&record.name) {
            return Err(MixError::DuplicateComponent { name: record.name });
        }
        let uid = record
            .uid
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .clone();
        let entry = Entry::parse(record)?;
        tracing::debug!(component = %entry.record.name, uid = %uid, "registered component");
        self.entries.push(entry);
        Ok(uid)
    }

    /// Replace a record matched by uid, or by name when the record has no uid.
    pub fn update(&mut self, record: ComponentRecord) -> MixResult<String> {
        let idx = match record.uid.as_deref() {
            Some(uid) => self.entries.iter().position(|e| e.uid() == Some(uid)),
            None => self.position(&record.name),
        }
        .ok_or_else(|| MixError::UnknownComponent {
            name: record.name.clone(),
        })?;

        if let Some(other) = self.position(&record.name) {
            if other != idx {
                return Err(MixError::DuplicateComponent { name: record.name });
            }
        }

        let mut entry = Entry::parse(record)?;
        if entry.record.uid.is_none() {
            entry.record.uid = self.entries[idx].record.uid.clone();
        }
        let uid = entry.uid().unwrap_or_default().to_string();
        self.entries[idx] = entry;
        Ok(uid)
    }

    pub fn remove_by_name(&mut self, name: &str) -> MixResult<ComponentRecord> {
        let idx = self.position(name).ok_or_else(|| MixError::UnknownComponent {
            name: name.to_string(),
        })?;
        Ok(self.entries.remove(idx).record)
    }

    pub fn remove_by_uid(&mut self, uid: &str) -> MixResult<ComponentRecord> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.uid() == Some(uid))
            .ok_or_else(|| MixError::UnknownComponent {
                name: uid.to_string(),
            })?;
        Ok(self.entries.remove(idx).record)
    }

    pub fn get(&self, name: &str) -> Option<&ComponentRecord> {
        self.entry(name).map(|e| &e.record)
    }

    pub fn get_by_uid(&self, uid: &str) -> Option<&ComponentRecord> {
        self.entries
            .iter()
            .find(|e| e.uid() == Some(uid))
            .map(|e| &e.record)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn list(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Zero-state component for `name`.
    pub fn instantiate(&self, name: &str, solute: bool) -> MixResult<Component> {
        let entry = self.entry(name).ok_or_else(|| MixError::UnknownComponent {
            name: name.to_string(),
        })?;

        let mut component = Component::new(name, entry.density, solute);
        component.set_formula(entry.record.formula.clone());
        component.set_molar_mass(entry.molar_mass);
        if let Some(uid) = entry.uid() {
            component = component.with_uid(uid);
        }
        Ok(component)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.record.name == name)
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.record.name == name)
    }
}
