/// Normalize a person's name to title case.
/// Trims and collapses whitespace; every word gets a leading capital.
pub fn title_case_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a responsible name is acceptable: non-empty, letters and spaces only.
pub fn is_valid_responsible(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_alphabetic() || c.is_whitespace())
}

/// Format a phone number for display
/// Handles various input formats and normalizes to (XX) XXXXX-XXXX
pub fn format_phone(phone: &str) -> String {
    // Extract just the digits
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        11 => format!("({}) {}-{}", &digits[0..2], &digits[2..7], &digits[7..11]),
        10 => format!("({}) {}-{}", &digits[0..2], &digits[2..6], &digits[6..10]),
        _ => phone.to_string(), // Return original if can't format
    }
}

/// Whether a string matches the phone mask: (XX) XXXXX-XXXX or (XX) XXXX-XXXX.
pub fn is_masked_phone(phone: &str) -> bool {
    fn digits(part: &str, len: usize) -> bool {
        part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
    }

    let Some(rest) = phone.strip_prefix('(') else {
        return false;
    };
    let Some((area, rest)) = rest.split_once(") ") else {
        return false;
    };
    let Some((prefix, suffix)) = rest.split_once('-') else {
        return false;
    };
    digits(area, 2) && (digits(prefix, 4) || digits(prefix, 5)) && digits(suffix, 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case_name() {
        assert_eq!(title_case_name("  joão   da silva  "), "João Da Silva");
        assert_eq!(title_case_name("MARIA SOUZA"), "Maria Souza");
        assert_eq!(title_case_name("ana"), "Ana");
        assert_eq!(title_case_name(""), "");
    }

    #[test]
    fn test_is_valid_responsible() {
        assert!(is_valid_responsible("João da Silva"));
        assert!(!is_valid_responsible("   "));
        assert!(!is_valid_responsible("João 2"));
        assert!(!is_valid_responsible("a@b"));
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("11999998888"), "(11) 99999-8888");
        assert_eq!(format_phone("1133334444"), "(11) 3333-4444");
        assert_eq!(format_phone("(11) 99999-8888"), "(11) 99999-8888");
        assert_eq!(format_phone("123"), "123"); // Too short, return as-is
    }

    #[test]
    fn test_is_masked_phone() {
        assert!(is_masked_phone("(11) 99999-8888"));
        assert!(is_masked_phone("(11) 3333-4444"));
        assert!(!is_masked_phone("11999998888"));
        assert!(!is_masked_phone("(11) 99999-888"));
        assert!(!is_masked_phone("(1a) 99999-8888"));
        assert!(!is_masked_phone(""));
    }
}
