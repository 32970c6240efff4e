/// Cross-file join key for a student: trimmed, whitespace runs collapsed to a
/// single space, lowercased. Returns "" for blank input.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Title-cases a normalized key for display. A letter is uppercased when the
/// previous character is not a letter, so "o'brien" becomes "O'Brien".
/// Original capitalization is not recoverable.
pub fn display_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut prev_alpha = false;
    for ch in key.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_case_and_whitespace() {
        assert_eq!(normalize("  Asha \t  RAO "), "asha rao");
        assert_eq!(normalize("asha   rao"), "asha rao");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["  Asha \n Rao", "RAVI", "x  y  z ", "", "Ölaf  Øst"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "raw={raw:?}");
        }
    }

    #[test]
    fn display_name_title_cases_words() {
        assert_eq!(display_name("asha rao"), "Asha Rao");
        assert_eq!(display_name("o'brien"), "O'Brien");
        assert_eq!(display_name("student 12"), "Student 12");
        assert_eq!(display_name("mary-jane"), "Mary-Jane");
    }
}
