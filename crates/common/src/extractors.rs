//! Custom axum extractors for CodeJam

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::Error;

/// JSON body extractor that runs `validator` rules after deserializing.
///
/// Malformed JSON, a wrong shape and failed validation rules all reject
/// with `Error::Validation` (400).
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| Error::Validation(e.body_text()))?;
        value.validate().map_err(describe)?;
        Ok(ValidatedJson(value))
    }
}

/// Flatten validation errors into one line listing the offending fields.
fn describe(errors: ValidationErrors) -> Error {
    let field_errors = errors.field_errors();
    let mut fields: Vec<&str> = field_errors.keys().map(|k| k.as_ref()).collect();
    fields.sort_unstable();
    Error::Validation(format!("Invalid fields: {}", fields.join(", ")))
}
