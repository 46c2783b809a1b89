use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::attributes::Visibility;

/// Immutable per-call option bag handed to write, copy, move and
/// create-directory calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    options: HashMap<String, Value>,
}

impl Config {
    pub const OPTION_VISIBILITY: &'static str = "visibility";
    pub const OPTION_DIRECTORY_VISIBILITY: &'static str = "directory_visibility";

    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; returns a new bag with `key` set.
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.options.insert(key.into(), value);
        self
    }

    pub fn with_visibility(self, visibility: Visibility) -> Self {
        self.with(Self::OPTION_VISIBILITY, visibility)
    }

    pub fn with_directory_visibility(self, visibility: Visibility) -> Self {
        self.with(Self::OPTION_DIRECTORY_VISIBILITY, visibility)
    }

    /// Typed lookup. A value that does not deserialize into `T` reads as
    /// absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.options
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn visibility(&self) -> Option<Visibility> {
        self.get(Self::OPTION_VISIBILITY)
    }

    pub fn directory_visibility(&self) -> Option<Visibility> {
        self.get(Self::OPTION_DIRECTORY_VISIBILITY)
    }

    /// New bag where `overrides` win on key collisions.
    pub fn extend<I, K>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut options = self.options.clone();
        options.extend(overrides.into_iter().map(|(k, v)| (k.into(), v)));
        Self { options }
    }

    /// New bag where the existing values win on key collisions.
    pub fn with_defaults<I, K>(&self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut options: HashMap<String, Value> = defaults
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        options.extend(self.options.clone());
        Self { options }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Config {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            options: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exposes_passed_options() {
        let config = Config::new().with("option", "value");
        assert_eq!(config.get::<String>("option").as_deref(), Some("value"));
    }

    #[test]
    fn returns_a_default_value() {
        let config = Config::new();
        assert_eq!(config.get::<String>("option"), None);
        assert_eq!(config.get_or("option", "default".to_string()), "default");
    }

    #[test]
    fn extending_overrides_existing_options() {
        let config = Config::from_iter([("option", json!("value")), ("first", json!(1))]);

        let extended = config.extend([("option", json!("overwritten")), ("second", json!(2))]);

        assert_eq!(extended.get::<String>("option").as_deref(), Some("overwritten"));
        assert_eq!(extended.get::<i64>("first"), Some(1));
        assert_eq!(extended.get::<i64>("second"), Some(2));
        assert_eq!(config.get::<String>("option").as_deref(), Some("value"));
        assert!(!config.contains("second"));
    }

    #[test]
    fn defaults_never_override_existing_options() {
        let config = Config::new().with("option", "set");

        let with_defaults =
            config.with_defaults([("option", json!("default")), ("other", json!("default"))]);

        assert_eq!(with_defaults.get::<String>("option").as_deref(), Some("set"));
        assert_eq!(with_defaults.get::<String>("other").as_deref(), Some("default"));
    }

    #[test]
    fn visibility_options_round_trip_through_values() {
        let config = Config::new()
            .with_visibility(Visibility::Private)
            .with_directory_visibility(Visibility::Public);

        assert_eq!(config.visibility(), Some(Visibility::Private));
        assert_eq!(config.directory_visibility(), Some(Visibility::Public));
        assert_eq!(config.raw("visibility"), Some(&json!("private")));
    }

    #[test]
    fn mistyped_values_read_as_absent() {
        let config = Config::new().with(Config::OPTION_VISIBILITY, 42);
        assert_eq!(config.visibility(), None);
    }
}
