use chatline_protocol::MessageType;
use jsonschema::Validator;
use serde_json::Value;

use crate::error::{Result, SchemaError};

/// Reported errors beyond the first.
const EXTRA_ERRORS: usize = 3;

pub(crate) fn validate_payload(kind: &MessageType, payload: &Value, validator: &Validator) -> Result<()> {
    let mut errors = validator.iter_errors(payload);
    let Some(first) = errors.next() else {
        return Ok(());
    };

    let message = std::iter::once(first)
        .chain(errors.take(EXTRA_ERRORS))
        .map(|err| err.to_string())
        .collect::<Vec<_>>()
        .join("; ");

    Err(SchemaError::ValidationFailed {
        kind: kind.clone(),
        message,
    })
}
