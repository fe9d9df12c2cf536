use std::collections::HashMap;

use crate::error::{ConfigurationError, Result};

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Floating-point value.
    Float(f64),
    /// Integer value.
    Int(i64),
    /// Text, typically a material name.
    Text(String),
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

/// Key-value lookup the component stages read their parameters from.
///
/// Keys are component-scoped, e.g. `"wallThick"`. The `component` argument
/// only labels errors.
pub trait ParamSource {
    /// Raw value under `key`, if present.
    fn value(&self, key: &str) -> Option<&ParamValue>;

    /// Material number registered for a material name.
    fn material_id(&self, name: &str) -> Option<i32>;

    /// Reads a required floating-point parameter.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is missing, not numeric,
    /// NaN or infinite.
    fn get_f64(&self, component: &str, key: &str) -> Result<f64> {
        let value = match self.value(key) {
            Some(ParamValue::Float(v)) => *v,
            #[allow(clippy::cast_precision_loss)]
            Some(ParamValue::Int(v)) => *v as f64,
            Some(ParamValue::Text(_)) => return Err(wrong_type(component, key, "a number")),
            None => return Err(missing(component, key)),
        };
        if !value.is_finite() {
            return Err(ConfigurationError::OutOfRange {
                component: component.to_owned(),
                key: key.to_owned(),
                value,
                reason: "must be finite",
            }
            .into());
        }
        Ok(value)
    }

    /// Reads an optional floating-point parameter, falling back to `default`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is present but not numeric.
    fn get_f64_or(&self, component: &str, key: &str, default: f64) -> Result<f64> {
        if self.value(key).is_none() {
            return Ok(default);
        }
        self.get_f64(component, key)
    }

    /// Reads a required strictly positive floating-point parameter.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is missing, not numeric,
    /// or not greater than zero.
    fn get_positive(&self, component: &str, key: &str) -> Result<f64> {
        let value = self.get_f64(component, key)?;
        if value <= 0.0 {
            return Err(ConfigurationError::OutOfRange {
                component: component.to_owned(),
                key: key.to_owned(),
                value,
                reason: "must be positive",
            }
            .into());
        }
        Ok(value)
    }

    /// Reads a required non-negative integer parameter. Whole-number floats
    /// are accepted.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is missing, fractional or negative.
    fn get_usize(&self, component: &str, key: &str) -> Result<usize> {
        let raw = match self.value(key) {
            Some(ParamValue::Int(v)) => *v,
            #[allow(clippy::cast_possible_truncation)]
            Some(ParamValue::Float(v)) if v.fract() == 0.0 => *v as i64,
            Some(_) => return Err(wrong_type(component, key, "an integer")),
            None => return Err(missing(component, key)),
        };
        usize::try_from(raw).map_err(|_| {
            #[allow(clippy::cast_precision_loss)]
            let value = raw as f64;
            ConfigurationError::OutOfRange {
                component: component.to_owned(),
                key: key.to_owned(),
                value,
                reason: "must not be negative",
            }
            .into()
        })
    }

    /// Reads a required material name and resolves it to a material number.
    /// `"Void"` always resolves to 0.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is missing, not text, or
    /// names an unknown material.
    fn get_material(&self, component: &str, key: &str) -> Result<i32> {
        let name = match self.value(key) {
            Some(ParamValue::Text(name)) => name,
            Some(_) => return Err(wrong_type(component, key, "a material name")),
            None => return Err(missing(component, key)),
        };
        if name == "Void" {
            return Ok(crate::registry::VOID);
        }
        self.material_id(name).ok_or_else(|| {
            ConfigurationError::UnknownMaterial {
                component: component.to_owned(),
                key: key.to_owned(),
                material: name.clone(),
            }
            .into()
        })
    }
}

fn missing(component: &str, key: &str) -> crate::error::CellforgeError {
    ConfigurationError::MissingKey {
        component: component.to_owned(),
        key: key.to_owned(),
    }
    .into()
}

fn wrong_type(component: &str, key: &str, expected: &'static str) -> crate::error::CellforgeError {
    ConfigurationError::WrongType {
        component: component.to_owned(),
        key: key.to_owned(),
        expected,
    }
    .into()
}

/// In-memory parameter table with a material name registry.
#[derive(Debug, Clone, Default)]
pub struct ParamTable {
    values: HashMap<String, ParamValue>,
    materials: HashMap<String, i32>,
}

impl ParamTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or replaces) a parameter.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder form of [`ParamTable::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Registers a material name under a material number.
    pub fn add_material(&mut self, name: impl Into<String>, id: i32) {
        self.materials.insert(name.into(), id);
    }

    /// Removes a parameter, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.values.remove(key)
    }
}

impl ParamSource for ParamTable {
    fn value(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    fn material_id(&self, name: &str) -> Option<i32> {
        self.materials.get(name).copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CellforgeError;

    fn table() -> ParamTable {
        let mut t = ParamTable::new()
            .with("wallThick", 12.5)
            .with("wallNLayer", 3_i64)
            .with("wallHalf", 2.0)
            .with("wallMat", "Concrete")
            .with("wallNeg", -1.0);
        t.add_material("Concrete", 49);
        t
    }

    #[test]
    fn typed_getters() {
        let t = table();
        assert!((t.get_f64("wall", "wallThick").unwrap() - 12.5).abs() < 1e-12);
        assert_eq!(t.get_usize("wall", "wallNLayer").unwrap(), 3);
        assert_eq!(t.get_usize("wall", "wallHalf").unwrap(), 2);
        assert_eq!(t.get_material("wall", "wallMat").unwrap(), 49);
        assert!((t.get_f64_or("wall", "wallXStep", 0.0).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn missing_key_names_component_and_key() {
        let err = table().get_f64("wall", "wallHeight").unwrap_err();
        assert_eq!(
            err.to_string(),
            "wall: required parameter `wallHeight` is missing"
        );
    }

    #[test]
    fn range_and_type_checks() {
        let t = table();
        assert!(matches!(
            t.get_positive("wall", "wallNeg"),
            Err(CellforgeError::Configuration(ConfigurationError::OutOfRange { .. }))
        ));
        assert!(matches!(
            t.get_usize("wall", "wallThick"),
            Err(CellforgeError::Configuration(ConfigurationError::WrongType { .. }))
        ));
        assert!(matches!(
            t.get_f64("wall", "wallMat"),
            Err(CellforgeError::Configuration(ConfigurationError::WrongType { .. }))
        ));
    }

    #[test]
    fn non_finite_values_rejected() {
        let t = ParamTable::new()
            .with("wallThick", f64::NAN)
            .with("wallWidth", f64::INFINITY)
            .with("wallXStep", f64::NEG_INFINITY);
        for key in ["wallThick", "wallWidth"] {
            assert!(matches!(
                t.get_positive("wall", key),
                Err(CellforgeError::Configuration(ConfigurationError::OutOfRange { .. }))
            ));
        }
        assert!(t.get_f64_or("wall", "wallXStep", 0.0).is_err());
        assert!(t.get_f64("wall", "wallThick").is_err());
    }

    #[test]
    fn unknown_material() {
        let mut t = table();
        t.set("wallMat", "Unobtainium");
        assert!(matches!(
            t.get_material("wall", "wallMat"),
            Err(CellforgeError::Configuration(ConfigurationError::UnknownMaterial { .. }))
        ));
        t.set("wallMat", "Void");
        assert_eq!(t.get_material("wall", "wallMat").unwrap(), 0);
    }
}
