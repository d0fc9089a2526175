use validator::{Validate, ValidationErrors};

use crate::error::Result;

/// Request fields in the order their errors are reported.
const FIELD_ORDER: [&str; 3] = ["selected_classes", "num_questions", "difficulty"];

pub fn validate<T: Validate>(val: &T) -> Result<()> {
    val.validate()?;
    Ok(())
}

/// The user-facing message of the first failing field.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(name, _)| {
        let rank = FIELD_ORDER
            .iter()
            .position(|f| *f == &**name)
            .unwrap_or(FIELD_ORDER.len());
        (rank, name.to_string())
    });

    fields
        .first()
        .and_then(|(name, errs)| {
            errs.first().map(|e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("Invalid {}: {}", name, e.code),
            })
        })
        .unwrap_or_else(|| errors.to_string())
}
