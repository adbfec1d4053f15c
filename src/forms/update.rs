//! Field updates for form state.
//!
//! Every section of a wizard mutates form state through one entry point,
//! [`apply`], with a [`FieldUpdate`] addressed by one of three path shapes:
//!
//! - `siteName` - a top-level key
//! - `oemContractor.name` - one level of nesting
//! - `additionalDrawings[2]` - one element of a top-level array
//!
//! Paths are parsed once into [`FieldPath`]; any other shape is rejected up
//! front. Updates never mutate the input form: `apply` returns a new value and
//! the caller replaces its state with it. A value whose type does not fit the
//! addressed field is rejected and the previous state stays in place.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldPath {
    TopLevel(String),
    Nested { parent: String, child: String },
    Index { name: String, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    InvalidPath(String),
    UnknownField(String),
    NotAnObject(String),
    NotAnArray(String),
    IndexOutOfRange { name: String, index: usize, len: usize },
    TypeMismatch { path: String, reason: String },
    UnknownSection(String),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::InvalidPath(p) => write!(f, "Invalid field path '{p}'"),
            FieldError::UnknownField(p) => write!(f, "Unknown field '{p}'"),
            FieldError::NotAnObject(p) => write!(f, "Field '{p}' is not a group of fields"),
            FieldError::NotAnArray(p) => write!(f, "Field '{p}' is not a list"),
            FieldError::IndexOutOfRange { name, index, len } => {
                write!(f, "Index {index} is out of range for '{name}' ({len} items)")
            }
            FieldError::TypeMismatch { path, reason } => {
                write!(f, "Value does not fit field '{path}': {reason}")
            }
            FieldError::UnknownSection(s) => write!(f, "Unknown section '{s}'"),
        }
    }
}

impl std::error::Error for FieldError {}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let invalid = || FieldError::InvalidPath(raw.to_string());

        if let Some((parent, child)) = raw.split_once('.') {
            if is_ident(parent) && is_ident(child) {
                return Ok(FieldPath::Nested {
                    parent: parent.to_string(),
                    child: child.to_string(),
                });
            }
            return Err(invalid());
        }

        if let Some(open) = raw.find('[') {
            let name = &raw[..open];
            let digits = raw[open + 1..].strip_suffix(']').ok_or_else(invalid)?;
            if !is_ident(name) || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            let index = digits.parse::<usize>().map_err(|_| invalid())?;
            return Ok(FieldPath::Index { name: name.to_string(), index });
        }

        if is_ident(raw) {
            Ok(FieldPath::TopLevel(raw.to_string()))
        } else {
            Err(invalid())
        }
    }

    pub fn top(key: &str) -> Self {
        FieldPath::TopLevel(key.to_string())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::TopLevel(key) => write!(f, "{key}"),
            FieldPath::Nested { parent, child } => write!(f, "{parent}.{child}"),
            FieldPath::Index { name, index } => write!(f, "{name}[{index}]"),
        }
    }
}

impl TryFrom<String> for FieldPath {
    type Error = FieldError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        FieldPath::parse(&raw)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

/// One `set field` command: write `value` at `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub path: FieldPath,
    pub value: Value,
}

impl FieldUpdate {
    pub fn new(path: FieldPath, value: impl Into<Value>) -> Self {
        Self { path, value: value.into() }
    }

    /// Replace a whole top-level field with a serializable value, typically
    /// a recomputed array of records.
    pub fn replace<T: Serialize>(key: &str, value: &T) -> Result<Self, FieldError> {
        let value = serde_json::to_value(value).map_err(|e| FieldError::TypeMismatch {
            path: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { path: FieldPath::top(key), value })
    }
}

fn to_document<F: Serialize>(form: &F) -> Result<Value, FieldError> {
    serde_json::to_value(form).map_err(|e| FieldError::TypeMismatch {
        path: String::new(),
        reason: e.to_string(),
    })
}

fn slot_mut<'a>(root: &'a mut Map<String, Value>, path: &FieldPath) -> Result<&'a mut Value, FieldError> {
    match path {
        FieldPath::TopLevel(key) => root
            .get_mut(key)
            .ok_or_else(|| FieldError::UnknownField(key.clone())),
        FieldPath::Nested { parent, child } => {
            let group = root
                .get_mut(parent)
                .ok_or_else(|| FieldError::UnknownField(parent.clone()))?
                .as_object_mut()
                .ok_or_else(|| FieldError::NotAnObject(parent.clone()))?;
            group
                .get_mut(child)
                .ok_or_else(|| FieldError::UnknownField(path.to_string()))
        }
        FieldPath::Index { name, index } => {
            let items = root
                .get_mut(name)
                .ok_or_else(|| FieldError::UnknownField(name.clone()))?
                .as_array_mut()
                .ok_or_else(|| FieldError::NotAnArray(name.clone()))?;
            let len = items.len();
            items.get_mut(*index).ok_or(FieldError::IndexOutOfRange {
                name: name.clone(),
                index: *index,
                len,
            })
        }
    }
}

/// Apply `update` to `form`, returning the updated form.
pub fn apply<F>(form: &F, update: &FieldUpdate) -> Result<F, FieldError>
where
    F: Serialize + DeserializeOwned,
{
    let mut doc = to_document(form)?;
    let root = doc
        .as_object_mut()
        .ok_or_else(|| FieldError::NotAnObject("form".to_string()))?;

    *slot_mut(root, &update.path)? = update.value.clone();

    serde_json::from_value(doc).map_err(|e| FieldError::TypeMismatch {
        path: update.path.to_string(),
        reason: e.to_string(),
    })
}

/// Read the value currently stored at `path`.
pub fn read<F: Serialize>(form: &F, path: &FieldPath) -> Result<Value, FieldError> {
    let mut doc = to_document(form)?;
    let root = doc
        .as_object_mut()
        .ok_or_else(|| FieldError::NotAnObject("form".to_string()))?;
    Ok(slot_mut(root, path)?.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_shapes() {
        assert_eq!(FieldPath::parse("siteName").unwrap(), FieldPath::top("siteName"));
        assert_eq!(
            FieldPath::parse("oemContractor.name").unwrap(),
            FieldPath::Nested { parent: "oemContractor".into(), child: "name".into() }
        );
        assert_eq!(
            FieldPath::parse("additionalDrawings[2]").unwrap(),
            FieldPath::Index { name: "additionalDrawings".into(), index: 2 }
        );
    }

    #[test]
    fn rejects_mixed_and_malformed_paths() {
        for raw in ["", "a.b.c", "a.b[1]", "a[1].b", "a[]", "a[-1]", "a[+1]", "a[1", ".a", "a.", "site name"] {
            assert!(FieldPath::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn display_round_trips() {
        for raw in ["siteName", "oemContractor.name", "additionalDrawings[12]"] {
            assert_eq!(FieldPath::parse(raw).unwrap().to_string(), raw);
        }
    }
}
