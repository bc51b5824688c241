//! Custom garde rules shared by the request payloads.

use chrono::Datelike;

/// Rejects empty or whitespace-only strings.
pub fn not_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("must not be empty"));
    }
    Ok(())
}

/// Like [`not_blank`], for optional fields that are only checked when sent.
pub fn optional_not_blank(value: &Option<String>, ctx: &()) -> garde::Result {
    match value {
        Some(value) => not_blank(value, ctx),
        None => Ok(()),
    }
}

/// Accepts 7 to 15 digits with an optional leading `+` and common separators.
pub fn optional_phone(value: &Option<String>, _ctx: &()) -> garde::Result {
    let Some(value) = value else {
        return Ok(());
    };

    let body = value.trim().strip_prefix('+').unwrap_or(value.trim());
    let digits = body.chars().filter(char::is_ascii_digit).count();
    let shaped = body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.'));

    if !shaped || !(7..=15).contains(&digits) {
        return Err(garde::Error::new("not a valid phone number"));
    }
    Ok(())
}

/// Vehicle model years from 1900 up to next year.
pub fn vehicle_year(value: &i32, _ctx: &()) -> garde::Result {
    let max = chrono::Utc::now().year() + 1;
    if !(1900..=max).contains(value) {
        return Err(garde::Error::new(format!("must be between 1900 and {}", max)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_fail() {
        assert!(not_blank("  ", &()).is_err());
        assert!(not_blank("Lisbon", &()).is_ok());
        assert!(optional_not_blank(&None, &()).is_ok());
        assert!(optional_not_blank(&Some(String::new()), &()).is_err());
    }

    #[test]
    fn phone_numbers() {
        assert!(optional_phone(&Some("+351 912-345-678".to_string()), &()).is_ok());
        assert!(optional_phone(&Some("(555) 010.9999".to_string()), &()).is_ok());
        assert!(optional_phone(&Some("12345".to_string()), &()).is_err());
        assert!(optional_phone(&Some("call me".to_string()), &()).is_err());
        assert!(optional_phone(&None, &()).is_ok());
    }

    #[test]
    fn vehicle_years() {
        assert!(vehicle_year(&2015, &()).is_ok());
        assert!(vehicle_year(&1899, &()).is_err());
        assert!(vehicle_year(&(chrono::Utc::now().year() + 2), &()).is_err());
    }
}
