//! Schema capability and payload decoding.
//!
//! A schema type is any serde type that also describes itself through
//! utoipa. The utoipa description doubles as the validation rule set: it is
//! rendered to a JSON Schema document, compiled once per type, and every
//! incoming payload is checked against it before serde sees it.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, ValidationError, Validator};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Map, Value};
use utoipa::{PartialSchema, ToSchema};

use crate::error::{FrestError, FrestResult};
use crate::validation::{loc_from_pointer, ErrorKind, ErrorRecord, LocItem, ValidationErrors};

/// A structured type that can be validated from, and serialized to, a JSON
/// mapping.
///
/// Implemented for every `Serialize + DeserializeOwned + ToSchema` type;
/// derive those three and the type is ready for `Valid<T>` and `Reply`.
pub trait Schema: Serialize + DeserializeOwned + ToSchema + Send + 'static {}

impl<T> Schema for T where T: Serialize + DeserializeOwned + ToSchema + Send + 'static {}

/// Capability of being rendered to a plain key/value mapping.
///
/// This is the single check the reply normalizer performs; it is object
/// safe so replies can carry heterogeneous schema instances.
pub trait IntoMapping: Send {
    /// Name of the schema this value belongs to.
    fn schema_name(&self) -> Cow<'static, str>;

    /// Serialize to a JSON object.
    fn to_mapping(&self) -> FrestResult<Map<String, Value>>;
}

impl<T: Schema> IntoMapping for T {
    fn schema_name(&self) -> Cow<'static, str> {
        T::name()
    }

    fn to_mapping(&self) -> FrestResult<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(FrestError::NotAMapping(T::name().into_owned())),
        }
    }
}

/// Render the JSON Schema document for `T`.
///
/// Nested schemas referenced as `#/components/schemas/<Name>` are embedded
/// under a `components` key of the root so the references resolve inside
/// the same document.
pub fn schema_document<T: Schema>() -> FrestResult<Value> {
    let mut document = serde_json::to_value(<T as PartialSchema>::schema())?;

    let mut dependencies = Vec::new();
    T::schemas(&mut dependencies);

    if !dependencies.is_empty() {
        let mut components = Map::new();
        for (name, schema) in dependencies {
            components.insert(name, serde_json::to_value(schema)?);
        }
        if let Value::Object(root) = &mut document {
            root.insert("components".to_string(), json!({ "schemas": components }));
        }
    }

    Ok(document)
}

/// Field names declared by `T`'s schema, in declaration order.
pub fn declared_fields<T: Schema>() -> FrestResult<Vec<String>> {
    let document = schema_document::<T>()?;
    Ok(document
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default())
}

/// A compiled validator together with the document it was built from.
struct Compiled {
    validator: Validator,
    document: Value,
}

type ValidatorCache = RwLock<HashMap<TypeId, Arc<Compiled>>>;

static VALIDATORS: OnceLock<ValidatorCache> = OnceLock::new();

fn compile(document: &Value) -> Result<Validator, String> {
    let mut opts = jsonschema::options();
    opts.with_draft(Draft::Draft202012);
    opts.build(document).map_err(|e| e.to_string())
}

/// Compiled validator for `T`, built on first use and cached afterwards.
fn validator_for<T: Schema>() -> FrestResult<Arc<Compiled>> {
    let cache = VALIDATORS.get_or_init(Default::default);
    let key = TypeId::of::<T>();

    if let Some(compiled) = cache.read().ok().and_then(|map| map.get(&key).cloned()) {
        return Ok(compiled);
    }

    let name = T::name();
    let document = schema_document::<T>()?;
    let validator = compile(&document).map_err(|e| FrestError::Schema {
        name: name.to_string(),
        reason: e,
    })?;
    let compiled = Arc::new(Compiled {
        validator,
        document,
    });

    tracing::debug!(schema = %name, "Compiled request schema");

    // A poisoned lock only costs a recompile on the next request.
    if let Ok(mut map) = cache.write() {
        map.insert(key, Arc::clone(&compiled));
    }

    Ok(compiled)
}

/// Decode a raw JSON payload into `T`.
///
/// A payload that is not JSON fails with a single `json_invalid` record.
pub fn decode<T: Schema>(payload: &[u8]) -> FrestResult<T> {
    let value: Value = serde_json::from_slice(payload).map_err(|e| {
        FrestError::Validation(ValidationErrors::from(vec![ErrorRecord::json_invalid(
            format!("Invalid JSON: {}", e),
        )]))
    })?;

    decode_value(value)
}

/// Decode an untyped JSON value into `T`, reporting every violation.
pub fn decode_value<T: Schema>(value: Value) -> FrestResult<T> {
    let compiled = validator_for::<T>()?;

    let records: Vec<ErrorRecord> = compiled
        .validator
        .iter_errors(&value)
        .flat_map(|error| records_from(&error, &value, &compiled.document))
        .collect();

    if !records.is_empty() {
        return Err(ValidationErrors::from(records).into());
    }

    // Rules the schema cannot express (integer width, deny_unknown_fields)
    // are still enforced by serde; keep the path it failed at.
    serde_path_to_error::deserialize(value).map_err(|e| {
        let loc = loc_from_serde_path(e.path());
        ValidationErrors::from(vec![ErrorRecord::new(
            loc,
            e.into_inner().to_string(),
            ErrorKind::ValueError,
        )])
        .into()
    })
}

fn loc_from_serde_path(path: &serde_path_to_error::Path) -> Vec<LocItem> {
    use serde_path_to_error::Segment;

    path.iter()
        .filter_map(|segment| match segment {
            Segment::Seq { index } => Some(LocItem::Index(*index)),
            Segment::Map { key } => Some(LocItem::Key(key.clone())),
            Segment::Enum { variant } => Some(LocItem::Key(variant.clone())),
            Segment::Unknown => None,
        })
        .collect()
}

/// Translate one validator error into error records.
fn records_from(error: &ValidationError<'_>, instance: &Value, document: &Value) -> Vec<ErrorRecord> {
    let loc = loc_from_pointer(&error.instance_path.to_string(), instance);

    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            let mut loc = loc;
            loc.push(LocItem::Key(name));
            vec![ErrorRecord::new(loc, "Field required", ErrorKind::Missing)]
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .iter()
            .map(|name| {
                let mut loc = loc.clone();
                loc.push(LocItem::Key(name.clone()));
                ErrorRecord::new(
                    loc,
                    "Extra inputs are not permitted",
                    ErrorKind::ExtraForbidden,
                )
            })
            .collect(),
        ValidationErrorKind::Type { .. } => {
            vec![ErrorRecord::new(loc, error.to_string(), ErrorKind::TypeError)]
        }
        ValidationErrorKind::OneOfNotValid { .. } | ValidationErrorKind::AnyOf { .. } => {
            branch_records(error, instance, document, &loc).unwrap_or_else(|| {
                vec![ErrorRecord::new(loc, error.to_string(), ErrorKind::ValueError)]
            })
        }
        _ => vec![ErrorRecord::new(loc, error.to_string(), ErrorKind::ValueError)],
    }
}

/// Errors of the only non-null branch of a `oneOf`/`anyOf`, as produced for
/// optional nested schemas. `None` when there is no single branch to blame.
fn branch_records(
    error: &ValidationError<'_>,
    instance: &Value,
    document: &Value,
    loc: &[LocItem],
) -> Option<Vec<ErrorRecord>> {
    let target = instance.pointer(&error.instance_path.to_string())?;
    if target.is_null() {
        return None;
    }

    let branches = document
        .pointer(&error.schema_path.to_string())?
        .as_array()?;
    let mut candidates = branches
        .iter()
        .filter(|branch| branch.get("type").and_then(Value::as_str) != Some("null"));
    let branch = candidates.next()?;
    if candidates.next().is_some() {
        return None;
    }

    let mut branch_document = branch.clone();
    if let (Value::Object(root), Some(components)) = (&mut branch_document, document.get("components")) {
        root.insert("components".to_string(), components.clone());
    }
    let validator = compile(&branch_document).ok()?;

    let records: Vec<ErrorRecord> = validator
        .iter_errors(target)
        .flat_map(|inner| records_from(&inner, target, &branch_document))
        .map(|mut record| {
            let mut full = loc.to_vec();
            full.append(&mut record.loc);
            record.loc = full;
            record
        })
        .collect();

    (!records.is_empty()).then_some(records)
}
