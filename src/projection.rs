//! Field projection shortcuts.
//!
//! ```rust,ignore
//! async fn show_person() -> FrestResult<Reply> {
//!     let person = Person { name: "xx".into(), age: 12 };
//!     // age is a secret
//!     Ok(exclude(&person, ["age"])?.into())
//! }
//! ```

use serde_json::{Map, Value};

use crate::error::{FrestError, FrestResult};
use crate::schema::{declared_fields, IntoMapping, Schema};

/// Mapping of `model` restricted to `fields`, in declaration order.
pub fn include<T, I, S>(model: &T, fields: I) -> FrestResult<Map<String, Value>>
where
    T: Schema,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (mapping, selected) = project(model, fields)?;
    Ok(mapping
        .into_iter()
        .filter(|(key, _)| selected.iter().any(|f| f == key))
        .collect())
}

/// Mapping of `model` without `fields`.
pub fn exclude<T, I, S>(model: &T, fields: I) -> FrestResult<Map<String, Value>>
where
    T: Schema,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (mapping, selected) = project(model, fields)?;
    Ok(mapping
        .into_iter()
        .filter(|(key, _)| !selected.iter().any(|f| f == key))
        .collect())
}

/// Serialize `model` and check every requested field is declared on `T`.
fn project<T, I, S>(model: &T, fields: I) -> FrestResult<(Map<String, Value>, Vec<String>)>
where
    T: Schema,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mapping = model.to_mapping()?;
    let declared = declared_fields::<T>()?;

    let selected = fields
        .into_iter()
        .map(|f| f.as_ref().to_string())
        .collect::<Vec<_>>();

    if let Some(unknown) = selected
        .iter()
        .find(|f| !declared.contains(f) && !mapping.contains_key(f.as_str()))
    {
        return Err(FrestError::UnknownField {
            schema: T::name().into_owned(),
            field: unknown.clone(),
        });
    }

    Ok((mapping, selected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    struct Person {
        name: String,
        age: i32,
        height: f64,
    }

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    struct Dog {
        name: String,
        age: i32,
        weight: f64,
    }

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    struct Profile {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        nickname: Option<String>,
    }

    #[test]
    fn test_include() {
        let person = Person {
            name: "xx".to_string(),
            age: 12,
            height: 50.1,
        };
        let map = include(&person, ["name", "height"]).unwrap();
        assert_eq!(Value::Object(map), json!({"name": "xx", "height": 50.1}));
    }

    #[test]
    fn test_exclude() {
        let dog = Dog {
            name: "puppy".to_string(),
            age: 12,
            weight: 12.44,
        };
        let map = exclude(&dog, ["age"]).unwrap();
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, ["name", "weight"]);
        assert_eq!(Value::Object(map), json!({"name": "puppy", "weight": 12.44}));
    }

    #[test]
    fn test_unknown_field_fails() {
        let dog = Dog {
            name: "puppy".to_string(),
            age: 12,
            weight: 12.44,
        };
        let err = include(&dog, vec!["color".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            FrestError::UnknownField { ref schema, ref field } if schema == "Dog" && field == "color"
        ));
        assert!(exclude(&dog, ["color"]).is_err());
    }

    #[test]
    fn test_declared_but_unset_field_is_known() {
        let profile = Profile {
            name: "ann".to_string(),
            nickname: None,
        };
        let map = include(&profile, ["nickname"]).unwrap();
        assert!(map.is_empty());
    }
}
