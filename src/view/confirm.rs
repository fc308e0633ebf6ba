//! Typed confirmation gating destructive actions.

/// The delete control is enabled only once the user has retyped the target's
/// display name exactly (case-sensitive, surrounding whitespace ignored).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    expected: String,
    typed: String,
}

impl DeleteConfirmation {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            typed: String::new(),
        }
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn set_typed(&mut self, text: impl Into<String>) {
        self.typed = text.into();
    }

    pub fn is_confirmed(&self) -> bool {
        let expected = self.expected.trim();
        !expected.is_empty() && self.typed.trim() == expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_enables() {
        let mut confirmation = DeleteConfirmation::new("Noura Al-Harbi");
        assert!(!confirmation.is_confirmed());

        confirmation.set_typed("Noura Al-Harbi");
        assert!(confirmation.is_confirmed());

        confirmation.set_typed("  Noura Al-Harbi \n");
        assert!(confirmation.is_confirmed());
    }

    #[test]
    fn test_near_misses_stay_disabled() {
        let mut confirmation = DeleteConfirmation::new("Noura Al-Harbi");
        for typed in ["noura al-harbi", "Noura", "Noura  Al-Harbi", "Noura Al-Harbi."] {
            confirmation.set_typed(typed);
            assert!(!confirmation.is_confirmed(), "{typed:?} must not confirm");
        }
    }

    #[test]
    fn test_expected_is_trimmed_too() {
        let mut confirmation = DeleteConfirmation::new(" INV-2024-001 ");
        confirmation.set_typed("INV-2024-001");
        assert!(confirmation.is_confirmed());
    }

    #[test]
    fn test_blank_name_never_confirms() {
        let mut confirmation = DeleteConfirmation::new("   ");
        confirmation.set_typed("");
        assert!(!confirmation.is_confirmed());
    }
}
