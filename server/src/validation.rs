use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ApiError;

/// Longest voice name accepted in `?model=`.
const MAX_MODEL_LENGTH: usize = 64;

static HAN_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{Han}+$").unwrap());

/// Validate the `text` query parameter.
///
/// Text must be present, made only of Han characters, and at most
/// `max_chars` characters long (counted as Unicode scalar values).
pub fn validate_tts_text(text: Option<&str>, max_chars: usize) -> Result<&str, ApiError> {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return Err(ApiError::MissingInput),
    };

    if text.chars().count() > max_chars || !HAN_ONLY.is_match(text) {
        return Err(ApiError::InvalidInput(format!(
            "Invalid text: must be all Chinese characters with a max length of {}",
            max_chars
        )));
    }

    Ok(text)
}

/// Validate the optional `model` override. An empty value means "use the default voice".
pub fn validate_model(model: Option<&str>) -> Result<Option<&str>, ApiError> {
    let model = match model {
        Some(m) if !m.is_empty() => m,
        _ => return Ok(None),
    };

    if model.len() > MAX_MODEL_LENGTH || !model.chars().all(is_voice_name_char) {
        return Err(ApiError::InvalidInput(format!(
            "Invalid model: {}. Expected a voice name such as cmn-CN-Chirp3-HD-Achernar",
            model
        )));
    }

    Ok(Some(model))
}

fn is_voice_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}
