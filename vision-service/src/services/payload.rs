//! Request body to image bytes.
//!
//! A body is either a JSON envelope `{"image": "<base64>"}` or, when it does
//! not parse as JSON, the raw bytes themselves. Raw bodies are re-encoded to
//! base64 so both paths share one decoder. Raw garbage is accepted here and
//! only rejected later by the model.

use base64::{
    alphabet,
    engine::{general_purpose::STANDARD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    /// The envelope parsed but `image` is absent or falsy.
    #[error("Missing 'image' field in request")]
    MissingImage,

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("'image' field must be a base64 string")]
    InvalidImageField,

    #[error("invalid base64 image data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("invalid base64 image data: incorrect padding")]
    IncorrectPadding,

    #[error("invalid base64 image data: {0} data characters is 1 more than a multiple of 4")]
    ExcessDataBits(usize),
}

/// Decodes the data characters collected by `decode_image`; padding has
/// already been consumed there and unused trailing bits are ignored.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// Pick the base64 image text out of a request body.
pub fn resolve_payload(body: &[u8]) -> Result<String, PayloadError> {
    let data: Value = match serde_json::from_slice(body) {
        Ok(data) => data,
        Err(_) => return Ok(STANDARD.encode(body)),
    };

    let Value::Object(fields) = data else {
        return Err(PayloadError::NotAnObject);
    };

    match fields.get("image") {
        None => Err(PayloadError::MissingImage),
        Some(value) if is_falsy(value) => Err(PayloadError::MissingImage),
        Some(Value::String(image)) => Ok(image.clone()),
        Some(_) => Err(PayloadError::InvalidImageField),
    }
}

/// Decode base64 text the way a non-strict decoder does.
///
/// Characters outside the standard alphabet (line breaks, spaces) are
/// skipped. `=` before the third character of a group is ignored. Decoding
/// stops at the first group completed by padding, so anything after it is
/// dropped. A trailing group left unpadded is rejected.
pub fn decode_image(payload: &str) -> Result<Vec<u8>, PayloadError> {
    let mut data = String::with_capacity(payload.len());
    let mut quad_pos = 0usize;
    let mut pads = 0usize;
    let mut finished = false;

    for c in payload.chars() {
        if c == '=' {
            if quad_pos >= 2 {
                pads += 1;
                if quad_pos + pads >= 4 {
                    finished = true;
                    break;
                }
            }
            continue;
        }
        if !(c.is_ascii_alphanumeric() || matches!(c, '+' | '/')) {
            continue;
        }
        data.push(c);
        quad_pos = (quad_pos + 1) % 4;
        pads = 0;
    }

    if !finished {
        match quad_pos {
            0 => {}
            1 => return Err(PayloadError::ExcessDataBits(data.len())),
            _ => return Err(PayloadError::IncorrectPadding),
        }
    }

    Ok(LENIENT.decode(data)?)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}
