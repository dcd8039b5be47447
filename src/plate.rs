use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Sentinel the vision model is instructed to return when no plate is legible.
pub const NOT_FOUND: &str = "NOT_FOUND";

// Legacy 'ABC1234' and Mercosul 'ABC1D23' formats.
static LEGACY: Lazy<Regex> = Lazy::new(|| Regex::new("^[A-Z]{3}[0-9]{4}$").unwrap());
static MERCOSUL: Lazy<Regex> = Lazy::new(|| Regex::new("^[A-Z]{3}[0-9][A-Z][0-9]{2}$").unwrap());

/// A validated Brazilian license plate, uppercase, in one of the two
/// supported formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Plate(String);

impl Plate {
    /// Validates raw model output. Trims and uppercases, then rejects the
    /// NOT_FOUND sentinel, anything shorter than 7 characters and anything
    /// matching neither plate format. Every consumer that needs a plate goes
    /// through here; there is no second validation path.
    pub fn from_model_response(raw: &str) -> Option<Plate> {
        let text = raw.trim().to_ascii_uppercase();
        if text == NOT_FOUND || text.len() < 7 {
            return None;
        }
        if LEGACY.is_match(&text) || MERCOSUL.is_match(&text) {
            return Some(Plate(text));
        }
        None
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_both_plate_formats() {
        assert_eq!(
            Plate::from_model_response("ABC1234").map(|p| p.as_str().to_string()),
            Some("ABC1234".to_string())
        );
        assert_eq!(
            Plate::from_model_response("ABC1D23").map(|p| p.as_str().to_string()),
            Some("ABC1D23".to_string())
        );
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(
            Plate::from_model_response(" abc1234 \n").map(|p| p.as_str().to_string()),
            Some("ABC1234".to_string())
        );
    }

    #[test]
    fn rejects_sentinel() {
        assert_eq!(Plate::from_model_response("NOT_FOUND"), None);
        assert_eq!(Plate::from_model_response("  not_found  "), None);
    }

    #[test]
    fn rejects_short_strings() {
        assert_eq!(Plate::from_model_response("AB123"), None);
        assert_eq!(Plate::from_model_response(""), None);
    }

    #[test]
    fn rejects_malformed_plates() {
        // Four leading letters.
        assert_eq!(Plate::from_model_response("ABCD123"), None);
        // Mercosul letter in the wrong slot.
        assert_eq!(Plate::from_model_response("AB1C234"), None);
        // Model answered with prose instead of the bare plate.
        assert_eq!(Plate::from_model_response("THE PLATE IS ABC1234"), None);
        // Right length, all digits.
        assert_eq!(Plate::from_model_response("1234567"), None);
    }
}
