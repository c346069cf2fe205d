//! Audit answer handling.
//!
//! Answers are recorded as the *compliant* response to a question, so the
//! stored non-compliance flag is the negation of the answer.

/// The only answer text that counts as compliant.
pub const COMPLIANT_ANSWER: &str = "Yes";

/// Derive the non-compliance flag from a recorded answer.
///
/// Only the exact trimmed value `Yes` is compliant; anything else, including
/// an empty cell, is non-compliant.
pub fn non_compliant_for(answer: &str) -> bool {
    answer.trim() != COMPLIANT_ANSWER
}

/// Render a flag the way the template and legacy schema store it.
pub fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// Whether an answer cell holds one of the two accepted answers.
pub fn is_yes_no(answer: &str) -> bool {
    matches!(answer.trim(), "Yes" | "No")
}

/// Whether the secondary question applies for a raw trigger cell.
///
/// The first condition is subsumed by the second for every non-blank cell;
/// both are kept so the rule reads like the questionnaire instructions.
pub fn secondary_applies(raw_trigger: &str) -> bool {
    raw_trigger.replace('"', "").to_lowercase() == "yes" || !raw_trigger.trim().is_empty()
}

/// Normalize a trigger cell: strip embedded double quotes, trim, lower-case,
/// then capitalize the first character.
pub fn clean_trigger_response(raw_trigger: &str) -> String {
    let lowered = raw_trigger.replace('"', "").trim().to_lowercase();
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_compliant_for() {
        assert!(!non_compliant_for("Yes"));
        assert!(!non_compliant_for("  Yes\t"));
        assert!(non_compliant_for("No"));
        assert!(non_compliant_for("yes"));
        assert!(non_compliant_for(""));
    }

    #[test]
    fn test_secondary_applies() {
        assert!(secondary_applies("\"Yes\""));
        assert!(secondary_applies("No"));
        assert!(!secondary_applies(""));
        assert!(!secondary_applies("   "));
    }

    #[test]
    fn test_clean_trigger_response() {
        assert_eq!(clean_trigger_response("\"Yes\""), "Yes");
        assert_eq!(clean_trigger_response("  \"nO\" "), "No");
        assert_eq!(clean_trigger_response("YES"), "Yes");
        assert_eq!(clean_trigger_response("\"\""), "");
    }
}
