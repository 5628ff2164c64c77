//! Declarative field validation.
//!
//! Each wizard step owns a static table of `(field path, rule)` pairs. Validation is a
//! pure function of that table and the current form values; it never touches storage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::ValidateEmail;

use crate::wizard::FormState;

/// Maximum length of a social profile handle or URL.
pub const MAX_HANDLE_LEN: usize = 500;

/// A single validation rule for one field.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Non-empty after trimming, with bounded length.
    RequiredText {
        min: usize,
        max: usize,
        message: &'static str,
    },
    /// May be absent or empty; bounded length when present.
    OptionalText { max: usize },
    /// Standard email syntax.
    Email { max: usize },
    /// Exactly one value from a fixed set.
    Choice {
        allowed: &'static [&'static str],
        message: &'static str,
    },
    /// Absent, or one value from a fixed set.
    OptionalChoice { allowed: &'static [&'static str] },
    /// A list of distinct values from a fixed set.
    MultiChoice {
        allowed: &'static [&'static str],
        min: usize,
        message: &'static str,
    },
    /// A yes/no answer. Accepts a boolean or the strings "yes" / "no".
    YesNo { message: &'static str },
    /// Repeated `{ platform, handle, followers }` entries; at least one required.
    SocialProfiles { platforms: &'static [&'static str] },
    /// Must be literally `true`.
    AcceptTrue { message: &'static str },
}

/// A rule bound to a field path.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub path: &'static str,
    pub rule: Rule,
}

/// Per-field error messages keyed by field path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn insert(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.insert(path.into(), message.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Drop every error whose path belongs to one of `fields`.
    pub fn clear_fields(&mut self, fields: &[FieldRule]) {
        self.0.retain(|path, _| {
            !fields
                .iter()
                .any(|f| path == f.path || path.starts_with(&format!("{}.", f.path)))
        });
    }

    pub fn extend(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }
}

/// Validate the fields of one step against the current form values.
pub fn validate_step(rules: &[FieldRule], form: &FormState) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    for field in rules {
        check_field(field.path, &field.rule, form.get(field.path), &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_field(path: &str, rule: &Rule, value: Option<&Value>, errors: &mut FieldErrors) {
    match *rule {
        Rule::RequiredText { min, max, message } => {
            let text = as_trimmed(value);
            if text.is_empty() || text.chars().count() < min {
                errors.insert(path, message);
            } else if text.chars().count() > max {
                errors.insert(path, too_long(max));
            }
        }
        Rule::OptionalText { max } => {
            if as_trimmed(value).chars().count() > max {
                errors.insert(path, too_long(max));
            }
        }
        Rule::Email { max } => {
            let text = as_trimmed(value);
            if !text.validate_email() {
                errors.insert(path, "Invalid email address");
            } else if text.chars().count() > max {
                errors.insert(path, too_long(max));
            }
        }
        Rule::Choice { allowed, message } => match value.and_then(Value::as_str) {
            Some(choice) if allowed.contains(&choice) => {}
            _ => errors.insert(path, message),
        },
        Rule::OptionalChoice { allowed } => match value {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if s.is_empty() || allowed.contains(&s.as_str()) => {}
            Some(_) => errors.insert(path, "Select one of the listed options"),
        },
        Rule::MultiChoice {
            allowed,
            min,
            message,
        } => {
            let items = value.and_then(Value::as_array);
            let chosen: Vec<&str> = items
                .map(|a| a.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            let all_strings = items.map_or(true, |a| a.len() == chosen.len());
            if chosen.len() < min {
                errors.insert(path, message);
            } else if !all_strings || chosen.iter().any(|c| !allowed.contains(c)) {
                errors.insert(path, "Select only from the listed options");
            } else if chosen
                .iter()
                .enumerate()
                .any(|(i, c)| chosen[..i].contains(c))
            {
                errors.insert(path, "Select each option only once");
            }
        }
        Rule::YesNo { message } => {
            if as_yes_no(value).is_none() {
                errors.insert(path, message);
            }
        }
        Rule::SocialProfiles { platforms } => check_profiles(path, platforms, value, errors),
        Rule::AcceptTrue { message } => {
            if value != Some(&Value::Bool(true)) {
                errors.insert(path, message);
            }
        }
    }
}

fn check_profiles(
    path: &str,
    platforms: &[&str],
    value: Option<&Value>,
    errors: &mut FieldErrors,
) {
    let entries = match value.and_then(Value::as_array) {
        Some(entries) if !entries.is_empty() => entries,
        _ => {
            errors.insert(path, "Add at least one social profile");
            return;
        }
    };

    for (index, entry) in entries.iter().enumerate() {
        let platform = entry.get("platform").and_then(Value::as_str);
        if !platform.is_some_and(|p| platforms.contains(&p)) {
            errors.insert(format!("{path}.{index}.platform"), "Select a platform");
        }

        let handle = as_trimmed(entry.get("handle"));
        if handle.is_empty() {
            errors.insert(format!("{path}.{index}.handle"), "Handle or URL is required");
        } else if handle.chars().count() > MAX_HANDLE_LEN {
            errors.insert(format!("{path}.{index}.handle"), too_long(MAX_HANDLE_LEN));
        }

        match as_follower_count(entry.get("followers")) {
            Some(n) if n >= 0.0 => {}
            Some(_) => errors.insert(format!("{path}.{index}.followers"), "Must be 0 or more"),
            None => errors.insert(format!("{path}.{index}.followers"), "Must be a number"),
        }
    }
}

/// Convert a validated value into the shape that gets persisted.
///
/// Text is trimmed, yes/no answers become booleans, follower counts become integers and
/// empty optional values become `null`.
pub fn normalize(rule: &Rule, value: Option<&Value>) -> Value {
    match *rule {
        Rule::RequiredText { .. } | Rule::Email { .. } => Value::String(as_trimmed(value).into()),
        Rule::OptionalText { .. } | Rule::OptionalChoice { .. } => match as_trimmed(value) {
            "" => Value::Null,
            text => Value::String(text.into()),
        },
        Rule::YesNo { .. } => as_yes_no(value).map_or(Value::Null, Value::Bool),
        Rule::SocialProfiles { .. } => {
            let entries: Vec<Value> = value
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .map(|entry| {
                            serde_json::json!({
                                "platform": entry.get("platform").cloned().unwrap_or(Value::Null),
                                "handle": as_trimmed(entry.get("handle")),
                                "followers": as_follower_count(entry.get("followers"))
                                    .map(|n| n as i64)
                                    .unwrap_or(0),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            Value::Array(entries)
        }
        Rule::Choice { .. } | Rule::MultiChoice { .. } | Rule::AcceptTrue { .. } => {
            value.cloned().unwrap_or(Value::Null)
        }
    }
}

fn as_trimmed(value: Option<&Value>) -> &str {
    value.and_then(Value::as_str).map(str::trim).unwrap_or("")
}

fn as_yes_no(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s == "yes" => Some(true),
        Value::String(s) if s == "no" => Some(false),
        _ => None,
    }
}

/// Follower counts are typed into a free-form input, so numeric strings are accepted and
/// a blank input counts as zero.
fn as_follower_count(value: Option<&Value>) -> Option<f64> {
    match value {
        None | Some(Value::Null) => Some(0.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => Some(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        Some(_) => None,
    }
}

fn too_long(max: usize) -> String {
    format!("Must be at most {max} characters")
}
