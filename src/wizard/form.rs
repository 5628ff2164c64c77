//! Form state container.
//!
//! Holds the current value of every field across all steps. Paths are dot-separated, with
//! numeric segments addressing list entries (`socialProfiles.0.handle`). Writes are never
//! validated here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error returned when a path cannot be written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormPathError {
    #[error("empty field path")]
    Empty,
    #[error("'{0}' does not address a writable field")]
    Invalid(String),
    #[error("list index {index} out of range in '{path}'")]
    OutOfRange { path: String, index: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState(Map<String, Value>);

impl FormState {
    /// Build a form from a JSON object. Anything else yields an empty form.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Current value at `path`, if any.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                Value::Object(map) => map.get(segment)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write `value` at `path`, creating intermediate objects as needed.
    ///
    /// List entries must already exist; use [`FormState::append`] to grow a list.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), FormPathError> {
        if path.split('.').any(str::is_empty) {
            return Err(FormPathError::Empty);
        }

        match path.split_once('.') {
            None => {
                self.0.insert(path.to_string(), value);
                Ok(())
            }
            Some((head, rest)) => {
                let slot = self
                    .0
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                write_at(slot, rest, value, path)
            }
        }
    }

    /// Append an entry to a repeated list, creating the list if needed. Returns the new length.
    pub fn append(&mut self, list: &str, entry: Value) -> usize {
        match self.0.get_mut(list) {
            Some(Value::Array(items)) => {
                items.push(entry);
                items.len()
            }
            _ => {
                self.0.insert(list.to_string(), Value::Array(vec![entry]));
                1
            }
        }
    }

    /// Remove entry `index` from a repeated list.
    ///
    /// A list never shrinks below one entry: the call is refused (returns `false`) when only
    /// one entry remains or the index is out of range.
    pub fn remove(&mut self, list: &str, index: usize) -> bool {
        match self.0.get_mut(list) {
            Some(Value::Array(items)) if items.len() > 1 && index < items.len() => {
                items.remove(index);
                true
            }
            _ => false,
        }
    }

    /// Number of entries in a repeated list.
    pub fn list_len(&self, list: &str) -> usize {
        self.0
            .get(list)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }
}

fn write_at(target: &mut Value, rest: &str, value: Value, path: &str) -> Result<(), FormPathError> {
    let (segment, tail) = match rest.split_once('.') {
        Some((segment, tail)) => (segment, Some(tail)),
        None => (rest, None),
    };

    let child = match target {
        Value::Object(map) => {
            if tail.is_none() {
                map.insert(segment.to_string(), value);
                return Ok(());
            }
            map.entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()))
        }
        Value::Array(items) => {
            let index = parse_index(segment, path)?;
            items
                .get_mut(index)
                .ok_or_else(|| out_of_range(path, index))?
        }
        _ => return Err(FormPathError::Invalid(path.to_string())),
    };

    match tail {
        None => {
            *child = value;
            Ok(())
        }
        Some(tail) => write_at(child, tail, value, path),
    }
}

fn parse_index(segment: &str, path: &str) -> Result<usize, FormPathError> {
    segment
        .parse::<usize>()
        .map_err(|_| FormPathError::Invalid(path.to_string()))
}

fn out_of_range(path: &str, index: usize) -> FormPathError {
    FormPathError::OutOfRange {
        path: path.to_string(),
        index,
    }
}
