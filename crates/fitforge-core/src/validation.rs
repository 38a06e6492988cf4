//! Flattening of `validator` errors into a single client-facing message.

use validator::ValidationErrors;

/// Render field errors as `"field: message"` pairs joined by `"; "`, sorted
/// by field name so the output is stable.
pub fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| "is invalid".to_string());
            (field.to_string(), message)
        })
        .collect();
    fields.sort();

    fields
        .into_iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}
