//! Combining the errors a scenario collects from its concurrent tasks.
//!
//! A scenario runs a producer and an analyzer side by side and usually ends
//! by cancelling both, so each task contributes a result. Cooperative exits
//! are already `Ok` at this point; what is left is folded into one error.

use crate::error::{CoreError, CoreResult};

/// Folds task results into one: `Ok` when none failed, the sole error when
/// one failed, otherwise a `ScenarioFailed` naming all of them.
pub fn filter_errors<I>(results: I) -> CoreResult<()>
where
    I: IntoIterator<Item = CoreResult<()>>,
{
    let mut errors = ScenarioErrors::default();
    for result in results {
        errors.record(result);
    }
    errors.into_result()
}

/// Accumulates failures from the steps of a scenario.
#[derive(Debug, Default)]
pub struct ScenarioErrors {
    errors: Vec<CoreError>,
}

impl ScenarioErrors {
    pub fn push(&mut self, error: CoreError) {
        log::debug!("Scenario error recorded: {}", error);
        self.errors.push(error);
    }

    /// Keeps the error of a failed step and passes a success through.
    pub fn record<T>(&mut self, result: CoreResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(e);
                None
            }
        }
    }

    /// Records `message` as a failure unless `condition` holds.
    pub fn check(&mut self, condition: bool, message: impl FnOnce() -> String) {
        if !condition {
            self.push(CoreError::ScenarioFailed(message()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn into_result(mut self) -> CoreResult<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => {
                let first = self.errors.remove(0);
                let rest = self
                    .errors
                    .iter()
                    .enumerate()
                    .map(|(i, e)| format!("err #{}: {}", i + 1, e))
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(CoreError::ScenarioFailed(format!("{first} (with {rest})")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_ok_is_ok() {
        assert!(filter_errors([Ok(()), Ok(())]).is_ok());
        assert!(filter_errors(Vec::new()).is_ok());
    }

    #[test]
    fn test_single_error_is_returned_as_is() {
        let err = filter_errors([Ok(()), Err(CoreError::Config("bad".into()))]).unwrap_err();
        assert!(matches!(err, CoreError::Config(ref m) if m == "bad"));
    }

    #[test]
    fn test_multiple_errors_are_combined() {
        let err = filter_errors([
            Err(CoreError::ScenarioFailed("no streams".into())),
            Err(CoreError::PartialReport("empty".into())),
        ])
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("no streams"));
        assert!(msg.contains("err #1: Probe report unusable: empty"));
    }

    #[test]
    fn test_check_and_record() {
        let mut errors = ScenarioErrors::default();
        assert_eq!(errors.record(Ok::<_, CoreError>(3)), Some(3));
        errors.check(true, || unreachable!());
        errors.check(1 + 1 == 3, || "math".to_string());
        assert_eq!(errors.len(), 1);
        assert!(!errors.is_empty());
        assert!(errors.into_result().is_err());
    }
}
