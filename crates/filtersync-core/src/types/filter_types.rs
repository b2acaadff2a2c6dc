//! Filter dimensions and the canonical filter value

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// A recognized filter dimension.
///
/// The set is closed so that validation is total: anything that does not
/// name one of these keys is rejected when a filter set is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Sources,
    Languages,
    Locations,
    Categories,
    Labels,
    Journalists,
    SourceGroups,
    SourceLocations,
    Companies,
    People,
    Topics,
    NoDuplicates,
}

/// Shape of the value a dimension accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    /// A set of selected string values
    Set,
    /// An on/off switch
    Flag,
}

impl Dimension {
    pub const ALL: [Dimension; 12] = [
        Dimension::Sources,
        Dimension::Languages,
        Dimension::Locations,
        Dimension::Categories,
        Dimension::Labels,
        Dimension::Journalists,
        Dimension::SourceGroups,
        Dimension::SourceLocations,
        Dimension::Companies,
        Dimension::People,
        Dimension::Topics,
        Dimension::NoDuplicates,
    ];

    pub fn kind(&self) -> DimensionKind {
        match self {
            Dimension::NoDuplicates => DimensionKind::Flag,
            _ => DimensionKind::Set,
        }
    }

    /// Wire name of the dimension
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Sources => "sources",
            Dimension::Languages => "languages",
            Dimension::Locations => "locations",
            Dimension::Categories => "categories",
            Dimension::Labels => "labels",
            Dimension::Journalists => "journalists",
            Dimension::SourceGroups => "sourceGroups",
            Dimension::SourceLocations => "sourceLocations",
            Dimension::Companies => "companies",
            Dimension::People => "people",
            Dimension::Topics => "topics",
            Dimension::NoDuplicates => "noDuplicates",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Dimension::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| Error::InvalidFilter(format!("unknown dimension `{}`", s)))
    }
}

/// Value held by one dimension of a [`FilterSet`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimensionValue {
    Flag(bool),
    Values(BTreeSet<String>),
}

impl DimensionValue {
    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Values(values.into_iter().map(Into::into).collect())
    }

    pub fn kind(&self) -> DimensionKind {
        match self {
            DimensionValue::Flag(_) => DimensionKind::Flag,
            DimensionValue::Values(_) => DimensionKind::Set,
        }
    }

    /// Empty sets and disabled flags carry no constraint
    pub fn is_unconstrained(&self) -> bool {
        match self {
            DimensionValue::Flag(enabled) => !enabled,
            DimensionValue::Values(values) => values.is_empty(),
        }
    }

    /// Number of selected values this dimension contributes to badge counts
    pub fn selected_count(&self) -> usize {
        match self {
            DimensionValue::Flag(true) => 1,
            DimensionValue::Flag(false) => 0,
            DimensionValue::Values(values) => values.len(),
        }
    }
}

/// The multi-dimensional filter value driving search results.
///
/// Absent dimensions mean "no constraint". Unconstrained values (empty sets,
/// disabled flags) are never stored, so two filter sets compare equal iff
/// they constrain the same dimensions to the same value sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<Dimension, DimensionValue>",
    into = "BTreeMap<Dimension, DimensionValue>"
)]
pub struct FilterSet {
    dimensions: BTreeMap<Dimension, DimensionValue>,
}

impl From<BTreeMap<Dimension, DimensionValue>> for FilterSet {
    fn from(mut dimensions: BTreeMap<Dimension, DimensionValue>) -> Self {
        dimensions.retain(|_, value| !value.is_unconstrained());
        Self { dimensions }
    }
}

impl From<FilterSet> for BTreeMap<Dimension, DimensionValue> {
    fn from(set: FilterSet) -> Self {
        set.dimensions
    }
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a filter set from its JSON object form.
    ///
    /// Unknown dimension keys and wrongly shaped values are rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let set: FilterSet =
            serde_json::from_str(json).map_err(|e| Error::InvalidFilter(e.to_string()))?;
        set.validate()?;
        Ok(set)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Builder-style helper that sets a set-valued dimension
    pub fn with_values<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let value = DimensionValue::values(values);
        if value.is_unconstrained() {
            self.dimensions.remove(&dimension);
        } else {
            self.dimensions.insert(dimension, value);
        }
        self
    }

    /// Builder-style helper that sets a flag dimension
    pub fn with_flag(mut self, dimension: Dimension, enabled: bool) -> Self {
        if enabled {
            self.dimensions.insert(dimension, DimensionValue::Flag(true));
        } else {
            self.dimensions.remove(&dimension);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Number of constrained dimensions
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn get(&self, dimension: Dimension) -> Option<&DimensionValue> {
        self.dimensions.get(&dimension)
    }

    /// Selected values of a set-valued dimension
    pub fn values(&self, dimension: Dimension) -> Option<&BTreeSet<String>> {
        match self.dimensions.get(&dimension) {
            Some(DimensionValue::Values(values)) => Some(values),
            _ => None,
        }
    }

    pub fn flag(&self, dimension: Dimension) -> bool {
        matches!(self.dimensions.get(&dimension), Some(DimensionValue::Flag(true)))
    }

    pub fn contains_value(&self, dimension: Dimension, value: &str) -> bool {
        self.values(dimension)
            .map(|values| values.contains(value))
            .unwrap_or(false)
    }

    /// Constrained dimensions in a stable order
    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.dimensions.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &DimensionValue)> {
        self.dimensions.iter().map(|(d, v)| (*d, v))
    }

    /// Replace the value of a dimension. Unconstrained values remove it.
    pub fn set(&mut self, dimension: Dimension, value: DimensionValue) -> Result<()> {
        check_kind(dimension, &value)?;
        if value.is_unconstrained() {
            self.dimensions.remove(&dimension);
        } else {
            self.dimensions.insert(dimension, value);
        }
        Ok(())
    }

    pub fn remove(&mut self, dimension: Dimension) -> Option<DimensionValue> {
        self.dimensions.remove(&dimension)
    }

    /// Add one value to a set-valued dimension. Returns whether it was new.
    pub fn add_value(&mut self, dimension: Dimension, value: impl Into<String>) -> Result<bool> {
        require_set(dimension)?;
        let entry = self
            .dimensions
            .entry(dimension)
            .or_insert_with(|| DimensionValue::Values(BTreeSet::new()));
        match entry {
            DimensionValue::Values(values) => Ok(values.insert(value.into())),
            DimensionValue::Flag(_) => Err(kind_mismatch(dimension)),
        }
    }

    /// Remove one value from a set-valued dimension. Returns whether it was present.
    pub fn remove_value(&mut self, dimension: Dimension, value: &str) -> Result<bool> {
        require_set(dimension)?;
        let removed = match self.dimensions.get_mut(&dimension) {
            Some(DimensionValue::Values(values)) => values.remove(value),
            _ => false,
        };
        if self
            .dimensions
            .get(&dimension)
            .is_some_and(DimensionValue::is_unconstrained)
        {
            self.dimensions.remove(&dimension);
        }
        Ok(removed)
    }

    /// Shape validation applied before any commit
    pub fn validate(&self) -> Result<()> {
        for (dimension, value) in &self.dimensions {
            check_kind(*dimension, value)?;
            if let DimensionValue::Values(values) = value {
                if values.iter().any(|v| v.trim().is_empty()) {
                    return Err(Error::InvalidFilter(format!(
                        "dimension `{}` contains a blank value",
                        dimension
                    )));
                }
            }
        }
        Ok(())
    }
}

fn check_kind(dimension: Dimension, value: &DimensionValue) -> Result<()> {
    if dimension.kind() == value.kind() {
        Ok(())
    } else {
        Err(kind_mismatch(dimension))
    }
}

fn require_set(dimension: Dimension) -> Result<()> {
    match dimension.kind() {
        DimensionKind::Set => Ok(()),
        DimensionKind::Flag => Err(kind_mismatch(dimension)),
    }
}

fn kind_mismatch(dimension: Dimension) -> Error {
    let expected = match dimension.kind() {
        DimensionKind::Set => "a list of values",
        DimensionKind::Flag => "a boolean",
    };
    Error::InvalidFilter(format!("dimension `{}` expects {}", dimension, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_equality_ignores_order() {
        let a = FilterSet::new().with_values(Dimension::Sources, ["b.com", "a.com"]);
        let b = FilterSet::new().with_values(Dimension::Sources, ["a.com", "b.com", "a.com"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_values_are_absent() {
        let mut set = FilterSet::new().with_values(Dimension::Sources, Vec::<String>::new());
        assert!(set.is_empty());

        set.set(Dimension::NoDuplicates, DimensionValue::Flag(false)).unwrap();
        assert!(set.is_empty());
        assert_eq!(set, FilterSet::new());
    }

    #[test]
    fn test_remove_last_value_drops_dimension() {
        let mut set = FilterSet::new().with_values(Dimension::Languages, ["en"]);
        assert!(set.remove_value(Dimension::Languages, "en").unwrap());
        assert!(set.get(Dimension::Languages).is_none());
        assert!(!set.remove_value(Dimension::Languages, "en").unwrap());
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let mut set = FilterSet::new();
        let err = set
            .set(Dimension::Sources, DimensionValue::Flag(true))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));
        assert!(set.add_value(Dimension::NoDuplicates, "x").is_err());
    }

    #[test]
    fn test_json_round_trip_uses_wire_names() {
        let set = FilterSet::new()
            .with_values(Dimension::SourceGroups, ["tech"])
            .with_flag(Dimension::NoDuplicates, true);
        let json = set.to_json().unwrap();
        assert_eq!(json, r#"{"sourceGroups":["tech"],"noDuplicates":true}"#);
        assert_eq!(FilterSet::from_json(&json).unwrap(), set);
    }

    #[test]
    fn test_from_json_rejects_unknown_dimension() {
        let err = FilterSet::from_json(r#"{"colors":["red"]}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));
    }

    #[test]
    fn test_from_json_rejects_wrong_shape() {
        let err = FilterSet::from_json(r#"{"sources":true}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));

        let err = FilterSet::from_json(r#"{"noDuplicates":["a"]}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));
    }

    #[test]
    fn test_validate_rejects_blank_values() {
        let set = FilterSet::new().with_values(Dimension::Labels, ["  "]);
        assert!(set.validate().is_err());
    }

    #[test]
    fn test_dimension_from_str() {
        assert_eq!("sourceLocations".parse::<Dimension>().unwrap(), Dimension::SourceLocations);
        assert!("source_locations".parse::<Dimension>().is_err());
    }
}
