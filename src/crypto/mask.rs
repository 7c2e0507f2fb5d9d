//! Display masking for sensitive fields.
//!
//! Pure transforms from cleartext to partially-obscured strings. Masked
//! values are derived on every read and never stored. All functions count
//! characters, not bytes, since names and identity numbers may contain CJK
//! characters.

/// Masks an identity number for display.
///
/// An 18-character number (the standard national format) keeps the first 6
/// and last 4 characters with a fixed run of 8 asterisks between them. Other
/// lengths above 6 keep the first and last 3. Inputs shorter than 10
/// characters are returned unchanged.
pub fn mask_id_number(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();

    if len < 10 {
        return value.to_string();
    }

    if len == 18 {
        let prefix: String = chars[..6].iter().collect();
        let suffix: String = chars[14..].iter().collect();
        return format!("{}********{}", prefix, suffix);
    }

    if len > 6 {
        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[len - 3..].iter().collect();
        return format!("{}{}{}", prefix, "*".repeat(len - 6), suffix);
    }

    value.to_string()
}

/// Masks a phone number for display.
///
/// An 11-digit number keeps the first 3 and last 4 digits. Other lengths of
/// at least 7 keep the first 3 and last 4 with a fixed `****` gap. Shorter
/// inputs are returned unchanged.
pub fn mask_phone(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();

    if len < 7 {
        return value.to_string();
    }

    let prefix: String = chars[..3].iter().collect();
    let suffix: String = chars[len - 4..].iter().collect();
    format!("{}****{}", prefix, suffix)
}

/// Masks a personal name: first character kept, one `*` per remaining
/// character. Single-character names become `*`.
pub fn mask_name(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();

    match chars.len() {
        0 => String::new(),
        1 => "*".to_string(),
        len => format!("{}{}", chars[0], "*".repeat(len - 1)),
    }
}

/// Hides a value entirely.
pub fn hide(_value: &str) -> String {
    "***".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_standard_18_char_id_number() {
        assert_eq!(
            mask_id_number("420106199001017710"),
            "420106********7710"
        );
    }

    #[test]
    fn masks_nonstandard_id_number_lengths() {
        // 12 chars: first 3 + six asterisks + last 3.
        assert_eq!(mask_id_number("123456789012"), "123******012");
        // 10 chars: first 3 + four asterisks + last 3.
        assert_eq!(mask_id_number("1234567890"), "123****890");
    }

    #[test]
    fn short_id_numbers_pass_through() {
        assert_eq!(mask_id_number("123456789"), "123456789");
        assert_eq!(mask_id_number(""), "");
    }

    #[test]
    fn masks_11_digit_phone() {
        assert_eq!(mask_phone("13812345678"), "138****5678");
    }

    #[test]
    fn masks_other_phone_lengths_with_fixed_gap() {
        assert_eq!(mask_phone("1234567"), "123****4567");
        assert_eq!(mask_phone("123456"), "123456");
    }

    #[test]
    fn masks_names_by_character() {
        assert_eq!(mask_name("张三"), "张*");
        assert_eq!(mask_name("李"), "*");
        assert_eq!(mask_name("欧阳修"), "欧**");
        assert_eq!(mask_name(""), "");
    }

    #[test]
    fn hide_is_constant() {
        assert_eq!(hide("anything"), "***");
        assert_eq!(hide(""), "***");
    }
}
