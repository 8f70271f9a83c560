//! Value nodes: simple scalars and fixed composites of them.

mod complex;
mod simple;

use serde_json::{Number, Value};

use crate::error::ValidationError;

/// A scalar with an optional default. Reading an unset value yields the
/// default.
#[derive(Debug, Clone, PartialEq)]
pub struct Simple<T> {
    pub(crate) value: Option<T>,
    pub(crate) default: Option<T>,
}

impl<T> Default for Simple<T> {
    fn default() -> Self {
        Self {
            value: None,
            default: None,
        }
    }
}

impl<T: PartialEq> Simple<T> {
    pub fn new(default: Option<T>) -> Self {
        Self {
            value: None,
            default,
        }
    }

    /// The assigned value, falling back to the default.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref().or(self.default.as_ref())
    }

    /// The assigned value only.
    pub fn explicit(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn default_value(&self) -> Option<&T> {
        self.default.as_ref()
    }

    pub fn is_undefined(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_default(&self) -> bool {
        match &self.value {
            None => true,
            Some(v) => self.default.as_ref() == Some(v),
        }
    }
}

/// Parameters of a number child declared in a builder.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumberSpec {
    pub default: Option<f64>,
    /// Inclusive lower bound.
    pub min: Option<f64>,
    /// Inclusive upper bound.
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberState {
    pub simple: Simple<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberState {
    pub fn from_spec(spec: NumberSpec) -> Self {
        Self {
            simple: Simple::new(spec.default),
            min: spec.min,
            max: spec.max,
        }
    }

    /// Reject NaN and values outside `[min, max]`.
    pub fn check(&self, value: f64) -> Result<(), ValidationError> {
        let min = self.min.unwrap_or(f64::NEG_INFINITY);
        let max = self.max.unwrap_or(f64::INFINITY);
        if value.is_nan() || value < min || value > max {
            return Err(ValidationError::OutOfRange { value, min, max });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringState {
    pub simple: Simple<String>,
    /// Accepted values. Empty accepts anything.
    pub valid_values: Vec<String>,
}

impl StringState {
    pub fn check(&self, value: &str) -> Result<(), ValidationError> {
        if self.valid_values.is_empty() || self.valid_values.iter().any(|v| v == value) {
            return Ok(());
        }
        Err(ValidationError::InvalidValue {
            value: value.to_string(),
            valid: self.valid_values.clone(),
        })
    }
}

/// JSON number for `value`, written as an integer when it is one.
pub(crate) fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Value::Number(Number::from(value as i64));
    }
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}
