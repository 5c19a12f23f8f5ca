//! Layout validation.
//!
//! Errors are keyed by layout element index so a host can point at the
//! offending element.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::layout::{LayoutParameter, Rect, WindowHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorType {
    /// The capture source window is unknown.
    TargetWindow,
    /// Clipping or bound geometry is unusable.
    Area,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub kind: ValidationErrorType,
    pub message: String,
}

impl ValidationError {
    fn area(message: impl Into<String>) -> Self {
        Self { kind: ValidationErrorType::Area, message: message.into() }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validation errors by element index. At most one error per element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<usize, ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Record an error; the first error for an index wins.
    pub fn add(&mut self, index: usize, error: ValidationError) {
        self.errors.entry(index).or_insert(error);
    }

    pub fn get(&self, index: usize) -> Option<&ValidationError> {
        self.errors.get(&index)
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &ValidationError)> {
        self.errors.iter().map(|(i, e)| (*i, e))
    }
}

/// Geometry checks against an output of `output_width`×`output_height`.
pub fn validate_layout(parameters: &[LayoutParameter], output_width: u32, output_height: u32) -> ValidationErrors {
    validate_layout_with(parameters, output_width, output_height, |_| true)
}

/// Geometry checks plus a target-window check supplied by the caller.
pub fn validate_layout_with<F>(
    parameters: &[LayoutParameter],
    output_width: u32,
    output_height: u32,
    is_window_valid: F,
) -> ValidationErrors
where
    F: Fn(WindowHandle) -> bool,
{
    let output = Rect::from_size(output_width, output_height);
    let mut errors = ValidationErrors::new();

    for (index, parameter) in parameters.iter().enumerate() {
        if !is_window_valid(parameter.window) {
            errors.add(
                index,
                ValidationError {
                    kind: ValidationErrorType::TargetWindow,
                    message: format!("window {} is not available", parameter.window),
                },
            );
            continue;
        }
        if parameter.clipping.is_empty() {
            errors.add(index, ValidationError::area(format!("clipping {} is empty", parameter.clipping)));
            continue;
        }
        if parameter.bound.is_empty() {
            errors.add(index, ValidationError::area(format!("bound {} is empty", parameter.bound)));
            continue;
        }
        if !parameter.bound.intersects(&output) {
            errors.add(
                index,
                ValidationError::area(format!("bound {} lies outside the {} output", parameter.bound, output)),
            );
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(bound: Rect) -> LayoutParameter {
        LayoutParameter::new(WindowHandle(7), Rect::from_size(100, 100), bound)
    }

    #[test]
    fn valid_layout_has_no_errors() {
        let params = [element(Rect::from_size(320, 240)), element(Rect::new(320, 0, 320, 240))];
        let errors = validate_layout(&params, 640, 480);
        assert!(errors.is_ok());
    }

    #[test]
    fn reports_area_errors_by_index() {
        let mut empty_clip = element(Rect::from_size(320, 240));
        empty_clip.clipping = Rect::from_size(0, 10);
        let params = [
            element(Rect::from_size(320, 240)),
            empty_clip,
            element(Rect::new(700, 0, 10, 10)),
        ];
        let errors = validate_layout(&params, 640, 480);
        assert_eq!(errors.len(), 2);
        assert!(errors.get(0).is_none());
        assert_eq!(errors.get(1).map(|e| e.kind), Some(ValidationErrorType::Area));
        assert_eq!(errors.get(2).map(|e| e.kind), Some(ValidationErrorType::Area));
    }

    #[test]
    fn reports_target_window_errors() {
        let params = [element(Rect::from_size(320, 240))];
        let errors = validate_layout_with(&params, 640, 480, |w| w != WindowHandle(7));
        assert_eq!(errors.get(0).map(|e| e.kind), Some(ValidationErrorType::TargetWindow));
    }

    #[test]
    fn first_error_per_index_wins() {
        let mut errors = ValidationErrors::new();
        errors.add(0, ValidationError::area("first"));
        errors.add(0, ValidationError::area("second"));
        assert_eq!(errors.get(0).map(|e| e.message.as_str()), Some("first"));
        errors.clear();
        assert!(errors.is_ok());
    }
}
