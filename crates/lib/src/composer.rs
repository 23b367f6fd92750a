//! Composers: strategies for reading and writing slots of a composite value.
//!
//! Group nodes never hard-code the shape of their value. Each group is built
//! with a [`Composer`] that knows how to create, patch, delete and extract a
//! single keyed slot. Two composers are provided:
//!
//! - [`RecordComposer`] - keyed records (`Value::Record`)
//! - [`SequenceComposer`] - indexed sequences (`Value::Sequence`)

use std::{collections::BTreeMap, fmt::Debug};

use tracing::trace;

use crate::{FieldKey, Value};

/// Strategy for building and editing a composite value one slot at a time.
///
/// Implementations are stateless and hold no knowledge of nodes. Writing
/// into a composite of a shape the composer does not understand is a no-op.
pub trait Composer: Send + Sync + Debug {
    /// The identity composite (empty record, empty sequence, ...).
    fn default(&self) -> Value;

    /// Builds a composite from scratch out of `(key, value)` entries.
    fn assemble(&self, entries: Vec<(FieldKey, Value)>) -> Value;

    /// Writes one slot in place.
    fn patch(&self, composite: &mut Value, key: &FieldKey, value: Value);

    /// Removes one slot in place.
    fn delete(&self, composite: &mut Value, key: &FieldKey);

    /// Reads one slot. Absent slots yield `None`.
    fn extract(&self, composite: &Value, key: &FieldKey) -> Option<Value>;
}

/// Composer for keyed records.
///
/// Keys are used by name; index keys are used as their decimal string.
/// [`delete`](Composer::delete) removes the entry entirely.
///
/// ```
/// # use formtree::{Composer, FieldKey, RecordComposer, Value};
/// let composer = RecordComposer;
/// let mut record = composer.default();
/// composer.patch(&mut record, &FieldKey::from("name"), Value::from("Carl"));
/// assert_eq!(composer.extract(&record, &"name".into()), Some(Value::from("Carl")));
///
/// composer.delete(&mut record, &"name".into());
/// assert_eq!(composer.extract(&record, &"name".into()), None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordComposer;

impl Composer for RecordComposer {
    fn default(&self) -> Value {
        Value::record()
    }

    fn assemble(&self, entries: Vec<(FieldKey, Value)>) -> Value {
        Value::Record(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn patch(&self, composite: &mut Value, key: &FieldKey, value: Value) {
        match composite.as_record_mut() {
            Some(entries) => {
                entries.insert(key.to_string(), value);
            }
            None => trace!(
                key = %key,
                found = composite.type_name(),
                "record composer ignored patch on non-record value"
            ),
        }
    }

    fn delete(&self, composite: &mut Value, key: &FieldKey) {
        if let Some(entries) = composite.as_record_mut() {
            entries.remove(&key.to_string());
        }
    }

    fn extract(&self, composite: &Value, key: &FieldKey) -> Option<Value> {
        composite.as_record()?.get(&key.to_string()).cloned()
    }
}

/// Composer for indexed sequences.
///
/// Patching past the end pads the sequence with `Null` holes. Deleting a slot
/// leaves a hole instead of shifting the following indices, so the paths of
/// the remaining nodes stay valid. Holes read back as missing.
///
/// ```
/// # use formtree::{Composer, FieldKey, SequenceComposer, Value};
/// let composer = SequenceComposer;
/// let mut items = composer.assemble(vec![
///     (FieldKey::Index(0), Value::from("a")),
///     (FieldKey::Index(1), Value::from("b")),
/// ]);
///
/// composer.delete(&mut items, &FieldKey::Index(0));
/// assert_eq!(composer.extract(&items, &FieldKey::Index(0)), None);
/// assert_eq!(composer.extract(&items, &FieldKey::Index(1)), Some(Value::from("b")));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceComposer;

/// Largest number of slots a single sequence patch may append.
///
/// A patch further past the end than this is ignored.
pub const MAX_SEQUENCE_PADDING: usize = 1 << 16;

impl Composer for SequenceComposer {
    fn default(&self) -> Value {
        Value::sequence()
    }

    fn assemble(&self, entries: Vec<(FieldKey, Value)>) -> Value {
        let mut items = self.default();
        for (key, value) in entries {
            self.patch(&mut items, &key, value);
        }
        items
    }

    fn patch(&self, composite: &mut Value, key: &FieldKey, value: Value) {
        let Some(index) = key.as_index() else {
            trace!(key = %key, "sequence composer ignored non-index key");
            return;
        };
        match composite.as_sequence_mut() {
            Some(items) => {
                if index >= items.len() {
                    let Some(len) = index
                        .checked_add(1)
                        .filter(|len| len - items.len() <= MAX_SEQUENCE_PADDING)
                    else {
                        trace!(
                            key = %key,
                            len = items.len(),
                            "sequence composer ignored out-of-range index"
                        );
                        return;
                    };
                    items.resize(len, Value::Null);
                }
                items[index] = value;
            }
            None => trace!(
                key = %key,
                found = composite.type_name(),
                "sequence composer ignored patch on non-sequence value"
            ),
        }
    }

    fn delete(&self, composite: &mut Value, key: &FieldKey) {
        let (Some(index), Some(items)) = (key.as_index(), composite.as_sequence_mut()) else {
            return;
        };
        if let Some(slot) = items.get_mut(index) {
            *slot = Value::Null;
        }
    }

    fn extract(&self, composite: &Value, key: &FieldKey) -> Option<Value> {
        let index = key.as_index()?;
        composite
            .as_sequence()?
            .get(index)
            .filter(|item| !item.is_null())
            .cloned()
    }
}
