//! # Keyword Set
//!
//! An immutable, identity-bearing bundle of program options.
//!
//! `values` are normalized once, at construction, and the normalized form
//! replaces the raw input. Deduplication identity is `hash_index`, never
//! `id`. The entity is open: unknown document fields are carried in
//! `extras` and written back out by [`KeywordSet::json_dict`].

use crate::domain::hashing::hash_index;
use crate::domain::normalizer::{normalize_map, NormalizeOptions};
use qcf_types::{KeywordSetId, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const ENTITY: &str = "KeywordSet";

/// Document fields owned by the entity itself; never stored as extras.
const RESERVED_FIELDS: &[&str] = &[
    "id",
    "hash_index",
    "values",
    "lowercase",
    "exact_floats",
    "comments",
    "build_index",
];

/// Program options with a stable content identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct KeywordSet {
    id: Option<KeywordSetId>,
    hash_index: String,
    values: Map<String, Value>,
    lowercase: bool,
    exact_floats: bool,
    comments: Option<String>,
    #[serde(flatten)]
    extras: Map<String, Value>,
}

impl KeywordSet {
    /// Build a keyword set with default flags and a computed hash index.
    pub fn new(values: Map<String, Value>) -> Self {
        KeywordSetBuilder::new(values).build()
    }

    pub fn builder(values: Map<String, Value>) -> KeywordSetBuilder {
        KeywordSetBuilder::new(values)
    }

    /// Parse a keyword-set document.
    ///
    /// Recognised fields are type checked; `build_index` is a control flag
    /// that forces the hash to be recomputed even when `hash_index` is
    /// given. Every other field is preserved as an extra.
    pub fn from_document(document: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut doc) = document else {
            return Err(ValidationError::WrongType {
                field: ENTITY.to_string(),
                expected: "a mapping",
            });
        };

        let values = match doc.remove("values") {
            Some(Value::Object(values)) => values,
            Some(_) => {
                return Err(ValidationError::WrongType {
                    field: "values".to_string(),
                    expected: "a mapping",
                })
            }
            None => {
                return Err(ValidationError::MissingField {
                    entity: ENTITY,
                    field: "values".to_string(),
                })
            }
        };

        let mut builder = KeywordSetBuilder::new(values);

        if let Some(id) = take_optional(&mut doc, "id") {
            let id: KeywordSetId =
                serde_json::from_value(id).map_err(|e| ValidationError::malformed(ENTITY, e))?;
            builder = builder.id(id);
        }
        if let Some(hash) = take_optional(&mut doc, "hash_index") {
            builder = builder.hash_index(expect_string("hash_index", hash)?);
        }
        if let Some(flag) = take_optional(&mut doc, "build_index") {
            builder = builder.build_index(expect_bool("build_index", flag)?);
        }
        if let Some(flag) = take_optional(&mut doc, "lowercase") {
            builder = builder.lowercase(expect_bool("lowercase", flag)?);
        }
        if let Some(flag) = take_optional(&mut doc, "exact_floats") {
            builder = builder.exact_floats(expect_bool("exact_floats", flag)?);
        }
        if let Some(comments) = take_optional(&mut doc, "comments") {
            builder = builder.comments(expect_string("comments", comments)?);
        }

        for (key, value) in doc {
            builder = builder.extra(key, value);
        }

        Ok(builder.build())
    }

    pub fn id(&self) -> Option<&KeywordSetId> {
        self.id.as_ref()
    }

    pub fn hash_index(&self) -> &str {
        &self.hash_index
    }

    /// Normalized option values.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn lowercase(&self) -> bool {
        self.lowercase
    }

    pub fn exact_floats(&self) -> bool {
        self.exact_floats
    }

    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref()
    }

    /// Fields outside the declared schema.
    pub fn extras(&self) -> &Map<String, Value> {
        &self.extras
    }

    /// Recompute the hash index from the stored values.
    pub fn get_hash_index(&self) -> String {
        hash_index(&Value::Object(self.values.clone()))
    }

    /// A copy carrying a store-assigned id. Everything else is kept.
    pub fn with_id(&self, id: KeywordSetId) -> Self {
        Self {
            id: Some(id),
            ..self.clone()
        }
    }

    /// Start a new keyword set from this one. The hash is kept unless the
    /// builder is told to rebuild it, the values are replaced or a
    /// normalization flag changes.
    pub fn to_builder(&self) -> KeywordSetBuilder {
        KeywordSetBuilder {
            id: self.id.clone(),
            hash_index: Some(self.hash_index.clone()),
            carried_flags: Some((self.lowercase, self.exact_floats)),
            build_index: false,
            values: self.values.clone(),
            lowercase: self.lowercase,
            exact_floats: self.exact_floats,
            comments: self.comments.clone(),
            extras: self.extras.clone(),
        }
    }

    /// JSON document form, extras included.
    pub fn json_dict(&self) -> Value {
        let mut doc = self.extras.clone();
        doc.insert(
            "id".to_string(),
            self.id
                .as_ref()
                .map(|id| match id {
                    KeywordSetId::Object(oid) => Value::String(oid.to_string()),
                    KeywordSetId::Local(n) => Value::from(*n),
                })
                .unwrap_or(Value::Null),
        );
        doc.insert("hash_index".to_string(), Value::String(self.hash_index.clone()));
        doc.insert("values".to_string(), Value::Object(self.values.clone()));
        doc.insert("lowercase".to_string(), Value::Bool(self.lowercase));
        doc.insert("exact_floats".to_string(), Value::Bool(self.exact_floats));
        doc.insert(
            "comments".to_string(),
            self.comments.clone().map(Value::String).unwrap_or(Value::Null),
        );
        Value::Object(doc)
    }
}

impl TryFrom<Value> for KeywordSet {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_document(value)
    }
}

/// Construct-then-freeze builder for [`KeywordSet`].
#[derive(Debug, Clone)]
pub struct KeywordSetBuilder {
    id: Option<KeywordSetId>,
    hash_index: Option<String>,
    /// Flags the carried-over hash was computed under.
    carried_flags: Option<(bool, bool)>,
    build_index: bool,
    values: Map<String, Value>,
    lowercase: bool,
    exact_floats: bool,
    comments: Option<String>,
    extras: Map<String, Value>,
}

impl KeywordSetBuilder {
    pub fn new(values: Map<String, Value>) -> Self {
        Self {
            id: None,
            hash_index: None,
            carried_flags: None,
            build_index: false,
            values,
            lowercase: true,
            exact_floats: false,
            comments: None,
            extras: Map::new(),
        }
    }

    pub fn id(mut self, id: KeywordSetId) -> Self {
        self.id = Some(id);
        self
    }

    /// Trust this hash index instead of computing one.
    pub fn hash_index(mut self, hash_index: impl Into<String>) -> Self {
        self.hash_index = Some(hash_index.into());
        self.carried_flags = None;
        self
    }

    /// Recompute the hash index even if one was supplied.
    pub fn build_index(mut self, rebuild: bool) -> Self {
        self.build_index = rebuild;
        self
    }

    /// Replace the values. A carried-over hash index is dropped.
    pub fn values(mut self, values: Map<String, Value>) -> Self {
        self.values = values;
        self.hash_index = None;
        self.carried_flags = None;
        self
    }

    pub fn lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn exact_floats(mut self, exact_floats: bool) -> Self {
        self.exact_floats = exact_floats;
        self
    }

    pub fn comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    /// Attach a field outside the declared schema. Names of declared fields
    /// are ignored.
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    /// Normalize the values, settle the hash index and freeze.
    pub fn build(self) -> KeywordSet {
        let options = NormalizeOptions::from_flags(self.lowercase, self.exact_floats);
        let values = normalize_map(&self.values, &options);

        let flags_changed = self
            .carried_flags
            .is_some_and(|carried| carried != (self.lowercase, self.exact_floats));
        let hash_index = match (self.hash_index, self.build_index || flags_changed) {
            (Some(supplied), false) => supplied,
            _ => hash_index(&Value::Object(values.clone())),
        };

        let mut extras = self.extras;
        extras.retain(|key, _| !RESERVED_FIELDS.contains(&key.as_str()));

        KeywordSet {
            id: self.id,
            hash_index,
            values,
            lowercase: self.lowercase,
            exact_floats: self.exact_floats,
            comments: self.comments,
            extras,
        }
    }
}

/// Remove `key`, treating an explicit `null` the same as absence.
fn take_optional(doc: &mut Map<String, Value>, key: &str) -> Option<Value> {
    doc.remove(key).filter(|v| !v.is_null())
}

fn expect_string(field: &str, value: Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(ValidationError::WrongType {
            field: field.to_string(),
            expected: "a string",
        }),
    }
}

fn expect_bool(field: &str, value: Value) -> Result<bool, ValidationError> {
    value.as_bool().ok_or_else(|| ValidationError::WrongType {
        field: field.to_string(),
        expected: "a boolean",
    })
}
