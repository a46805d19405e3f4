use std::collections::BTreeMap;

use crate::source::SourceMap;
use crate::types::RawValue;

/// A merged raw value and the index of the layer that supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub value: RawValue,
    pub layer: usize,
}

/// Merge layers left to right. For each flat name the last layer that has a
/// value wins; layers are sparse, so a missing key never erases an earlier one.
pub fn merge<'a>(layers: impl IntoIterator<Item = &'a SourceMap>) -> BTreeMap<String, Merged> {
    let mut merged = BTreeMap::new();
    for (layer, map) in layers.into_iter().enumerate() {
        for (key, value) in map.iter() {
            merged.insert(
                key.to_string(),
                Merged {
                    value: value.clone(),
                    layer,
                },
            );
        }
    }
    merged
}
