//! Knobs that change how two policies are judged equivalent

/// How statement `Sid` values are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SidMatching {
    /// A missing `Sid` and `"Sid": ""` compare equal; other values compare literally
    #[default]
    AbsentEqualsEmpty,
    /// Missing and empty are different values
    Strict,
    /// `Sid` never affects equivalence
    Ignore,
}

impl SidMatching {
    /// Whether two statement ids are considered the same under this mode
    #[must_use]
    pub fn matches(self, left: Option<&str>, right: Option<&str>) -> bool {
        match self {
            Self::AbsentEqualsEmpty => left.unwrap_or("") == right.unwrap_or(""),
            Self::Strict => left == right,
            Self::Ignore => true,
        }
    }
}

/// Options for parsing and comparing policies
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct EquivalenceOptions {
    /// Statement id comparison mode
    pub sid: SidMatching,
    /// Rewrite `arn:<partition>:iam::<account>:root` AWS principals to the bare account id
    pub normalize_account_principals: bool,
}

impl Default for EquivalenceOptions {
    fn default() -> Self {
        Self {
            sid: SidMatching::default(),
            normalize_account_principals: true,
        }
    }
}

impl EquivalenceOptions {
    #[must_use]
    pub fn with_sid_matching(mut self, sid: SidMatching) -> Self {
        self.sid = sid;
        self
    }

    #[must_use]
    pub fn with_account_normalization(mut self, enabled: bool) -> Self {
        self.normalize_account_principals = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SidMatching::AbsentEqualsEmpty, None, Some(""), true)]
    #[case(SidMatching::AbsentEqualsEmpty, Some("A"), Some("A"), true)]
    #[case(SidMatching::AbsentEqualsEmpty, Some("A"), None, false)]
    #[case(SidMatching::Strict, None, Some(""), false)]
    #[case(SidMatching::Strict, None, None, true)]
    #[case(SidMatching::Ignore, Some("A"), Some("B"), true)]
    fn test_sid_matching(
        #[case] mode: SidMatching,
        #[case] left: Option<&str>,
        #[case] right: Option<&str>,
        #[case] expected: bool,
    ) {
        assert_eq!(mode.matches(left, right), expected);
        assert_eq!(mode.matches(right, left), expected);
    }

    #[test]
    fn test_default_options() {
        let options = EquivalenceOptions::default();
        assert_eq!(options.sid, SidMatching::AbsentEqualsEmpty);
        assert!(options.normalize_account_principals);
    }

    #[test]
    fn test_builder_methods() {
        let options = EquivalenceOptions::default()
            .with_sid_matching(SidMatching::Strict)
            .with_account_normalization(false);
        assert_eq!(options.sid, SidMatching::Strict);
        assert!(!options.normalize_account_principals);
    }
}
