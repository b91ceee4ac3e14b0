use std::fmt;

pub const CODE_LENGTH: usize = 6;

/// The code as typed by the user, normalized on every keystroke.
///
/// Only ASCII alphanumerics survive, lowercased, capped at six characters.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EnteredCode(String);

impl EnteredCode {
    pub fn from_input(input: &str) -> Self {
        Self(
            input
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|c| c.to_ascii_lowercase())
                .take(CODE_LENGTH)
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.0.len() == CODE_LENGTH
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

// Codes are secrets; keep them out of Debug output and logs.
impl fmt::Debug for EnteredCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnteredCode(len={})", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_input() {
        let code = EnteredCode::from_input(" Ab-1 2c ");
        assert_eq!(code.as_str(), "ab12c");
        assert!(!code.is_complete());
    }

    #[test]
    fn test_truncates_to_six() {
        let code = EnteredCode::from_input("1234567890");
        assert_eq!(code.as_str(), "123456");
        assert!(code.is_complete());
    }

    #[test]
    fn test_drops_non_ascii() {
        let code = EnteredCode::from_input("१२३abc");
        assert_eq!(code.as_str(), "abc");
    }

    #[test]
    fn test_debug_hides_value() {
        let code = EnteredCode::from_input("123456");
        assert_eq!(format!("{code:?}"), "EnteredCode(len=6)");
    }

    #[test]
    fn test_clear() {
        let mut code = EnteredCode::from_input("123456");
        code.clear();
        assert!(code.is_empty());
        assert_eq!(code.len(), 0);
    }
}
