use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{flag} must be a finite number")]
    NotFinite { flag: &'static str },

    #[error("{flag} must be >= 0")]
    Negative { flag: &'static str },

    #[error("{flag} is longer than {max_months} months")]
    HorizonTooLong { flag: &'static str, max_months: u32 },

    #[error("Invalid API JSON payload: {0}")]
    Payload(String),

    #[error("Invalid query string: {0}")]
    Query(String),
}

impl InputError {
    pub(crate) fn check_amount(flag: &'static str, value: f64) -> Result<f64, InputError> {
        if !value.is_finite() {
            return Err(InputError::NotFinite { flag });
        }
        if value < 0.0 {
            return Err(InputError::Negative { flag });
        }
        Ok(value)
    }
}
