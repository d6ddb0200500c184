// SPDX-License-Identifier: GPL-3.0-only

//! Sparse option dictionary

use super::enums::MediaType;
use super::keys::OptionKey;
use super::records::MediaFileFormat;
use super::value::{EnumValue, OptionValue, RecordValue};
use crate::errors::{ThetaError, ThetaResult};
use std::collections::BTreeMap;

/// Mapping of option keys to values, at most one entry per key
///
/// A key missing from the set was not requested or not reported. A key
/// present with [`OptionValue::Null`] was explicitly null. Sets are never
/// mutated in place; every operation returns a new set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    entries: BTreeMap<OptionKey, OptionValue>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-conforming entries (used by the decoder)
    pub(crate) fn from_entries(entries: BTreeMap<OptionKey, OptionValue>) -> Self {
        Self { entries }
    }

    /// Build from key/value pairs, checking every value against its key
    pub fn from_pairs<I, V>(pairs: I) -> ThetaResult<Self>
    where
        I: IntoIterator<Item = (OptionKey, V)>,
        V: Into<OptionValue>,
    {
        pairs
            .into_iter()
            .try_fold(Self::new(), |set, (key, value)| set.with(key, value))
    }

    /// Set `key`, replacing any previous entry
    ///
    /// Fails with [`ThetaError::InvalidOption`] when the value does not fit
    /// the key's wire shape.
    pub fn with(mut self, key: OptionKey, value: impl Into<OptionValue>) -> ThetaResult<Self> {
        let shape = key.shape();
        let value = value
            .into()
            .conform(shape)
            .ok_or_else(|| ThetaError::InvalidOption {
                key: key.wire_name(),
                expected: shape.to_string(),
            })?;
        self.entries.insert(key, value);
        Ok(self)
    }

    /// Set `key` to an explicit null
    pub fn with_null(mut self, key: OptionKey) -> Self {
        self.entries.insert(key, OptionValue::Null);
        self
    }

    pub fn without(mut self, key: OptionKey) -> Self {
        self.entries.remove(&key);
        self
    }

    /// Entries of `self` overridden by those of `overrides`
    pub fn merge(&self, overrides: &OptionSet) -> OptionSet {
        let mut entries = self.entries.clone();
        entries.extend(
            overrides
                .entries
                .iter()
                .map(|(key, value)| (*key, value.clone())),
        );
        OptionSet { entries }
    }

    /// Only the entries whose key satisfies `keep`
    pub fn filter(&self, mut keep: impl FnMut(OptionKey) -> bool) -> OptionSet {
        OptionSet {
            entries: self
                .entries
                .iter()
                .filter(|(key, _)| keep(**key))
                .map(|(key, value)| (*key, value.clone()))
                .collect(),
        }
    }

    pub fn get(&self, key: OptionKey) -> Option<&OptionValue> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: OptionKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Present and explicitly null
    pub fn is_null(&self, key: OptionKey) -> bool {
        matches!(self.entries.get(&key), Some(OptionValue::Null))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = OptionKey> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionKey, &OptionValue)> + '_ {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    pub fn int(&self, key: OptionKey) -> Option<i64> {
        self.get(key).and_then(OptionValue::as_int)
    }

    pub fn float(&self, key: OptionKey) -> Option<f64> {
        self.get(key).and_then(OptionValue::as_float)
    }

    pub fn text(&self, key: OptionKey) -> Option<&str> {
        self.get(key).and_then(OptionValue::as_text)
    }

    pub fn enum_value(&self, key: OptionKey) -> Option<EnumValue> {
        self.get(key).and_then(OptionValue::as_enum)
    }

    pub fn file_format(&self) -> Option<&MediaFileFormat> {
        match self.get(OptionKey::FileFormat) {
            Some(OptionValue::Record(RecordValue::FileFormat(format))) => Some(format),
            _ => None,
        }
    }

    /// Media type of the `fileFormat` entry, if one is set
    pub fn media_type(&self) -> Option<MediaType> {
        self.file_format()
            .and_then(|format| format.media_type.present().copied())
    }
}

impl<'a> IntoIterator for &'a OptionSet {
    type Item = (&'a OptionKey, &'a OptionValue);
    type IntoIter = std::collections::btree_map::Iter<'a, OptionKey, OptionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
