use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("Invalid input: {field} ({reason})")]
    InvalidInput { field: &'static str, reason: String },
}

impl ProjectionError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            ProjectionError::InvalidInput { field, .. } => field,
        }
    }
}

pub type ProjectionResult<T> = Result<T, ProjectionError>;

pub(crate) fn ensure_finite(field: &'static str, value: f64) -> ProjectionResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ProjectionError::invalid(field, "must be a finite number"))
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> ProjectionResult<()> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(ProjectionError::invalid(field, "must be >= 0"));
    }
    Ok(())
}

pub(crate) fn ensure_rate_percent(field: &'static str, value: f64) -> ProjectionResult<()> {
    ensure_finite(field, value)?;
    if value <= -100.0 {
        return Err(ProjectionError::invalid(field, "must be > -100"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_message_names_field_and_reason() {
        let err = ProjectionError::invalid("months", "must be >= 0");
        assert_eq!(err.to_string(), "Invalid input: months (must be >= 0)");
        assert_eq!(err.field(), "months");
    }

    #[test]
    fn rate_guard_rejects_total_loss_and_nan() {
        assert!(ensure_rate_percent("rate", -99.9).is_ok());
        assert!(ensure_rate_percent("rate", -100.0).is_err());
        assert!(ensure_rate_percent("rate", f64::NAN).is_err());
        assert!(ensure_non_negative("amount", f64::INFINITY).is_err());
        assert!(ensure_non_negative("amount", -0.01).is_err());
    }
}
