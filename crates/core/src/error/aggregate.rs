//! Ordered multi-error container for multi-child and multi-resource operations.

use super::stream::{Result, StreamError};
use thiserror::Error;

/// An ordered list of failures.
///
/// Order is the order in which errors were pushed: child declaration order
/// for combinators, close order for pipelines. Pushing an aggregate (bare or
/// carried inside an `io::Error`) splices its members in place, so the list
/// never nests.
#[derive(Error, Debug, Default)]
#[error("{}", describe(.errors))]
pub struct AggregateError {
    errors: Vec<StreamError>,
}

impl AggregateError {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Append an error, flattening nested aggregates
    pub fn push(&mut self, err: impl Into<StreamError>) {
        match err.into() {
            StreamError::Aggregate(nested) => self.errors.extend(nested.errors),
            other => self.errors.push(other),
        }
    }

    /// Append the error of `result`, if any
    pub fn record<T>(&mut self, result: std::result::Result<T, impl Into<StreamError>>) {
        if let Err(err) = result {
            self.push(err);
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StreamError> {
        self.errors.iter()
    }

    pub fn errors(&self) -> &[StreamError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<StreamError> {
        self.errors
    }

    /// `Ok(())` when nothing was recorded, otherwise the aggregate
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(StreamError::Aggregate(self))
        }
    }

    /// Put `cause` in front of the recorded unwind failures.
    /// Returns `cause` unchanged when nothing else was recorded.
    pub fn with_cause(self, cause: StreamError) -> StreamError {
        if self.errors.is_empty() {
            return cause;
        }
        let mut errors = AggregateError::new();
        errors.push(cause);
        errors.errors.extend(self.errors);
        StreamError::Aggregate(errors)
    }
}

/// One error is shown alone, several as "N errors: a; b"
fn describe(errors: &[StreamError]) -> String {
    match errors {
        [] => "no errors".to_string(),
        [single] => single.to_string(),
        many => {
            let joined: Vec<String> = many.iter().map(ToString::to_string).collect();
            format!("{} errors: {}", many.len(), joined.join("; "))
        }
    }
}

impl FromIterator<StreamError> for AggregateError {
    fn from_iter<I: IntoIterator<Item = StreamError>>(iter: I) -> Self {
        let mut errors = AggregateError::new();
        for err in iter {
            errors.push(err);
        }
        errors
    }
}

impl<'a> IntoIterator for &'a AggregateError {
    type Item = &'a StreamError;
    type IntoIter = std::slice::Iter<'a, StreamError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
