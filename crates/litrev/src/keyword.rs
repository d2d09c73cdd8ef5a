//! Boolean keyword expressions evaluated over record text fields.

/// A keyword filter. `Any` matches everything, a literal is a
/// case-insensitive substring test over any field, and `AllOf`/`AnyOf`
/// combine sub-expressions with short-circuit semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordExpr {
    Any,
    Literal { text: String, negated: bool },
    AllOf(Vec<KeywordExpr>),
    AnyOf(Vec<KeywordExpr>),
}

impl KeywordExpr {
    /// Build a literal; a leading `~` marks the keyword as "must NOT match".
    pub fn literal(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match raw.strip_prefix('~') {
            Some(rest) => Self::Literal {
                text: rest.to_string(),
                negated: true,
            },
            None => Self::Literal {
                text: raw,
                negated: false,
            },
        }
    }

    /// Conjunction of raw literals (each may carry the `~` marker).
    pub fn all_of<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AllOf(words.into_iter().map(Self::literal).collect())
    }

    /// Disjunction of raw literals.
    pub fn any_of<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyOf(words.into_iter().map(Self::literal).collect())
    }

    pub fn matches(&self, fields: &[&str]) -> bool {
        match self {
            Self::Any => true,
            Self::AllOf(items) => items.iter().all(|expr| expr.matches(fields)),
            Self::AnyOf(items) => items.iter().any(|expr| expr.matches(fields)),
            Self::Literal { text, negated } => {
                let needle = text.to_lowercase();
                let hit = fields
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle));
                hit != *negated
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_matches_everything() {
        assert!(KeywordExpr::Any.matches(&[]));
        assert!(KeywordExpr::Any.matches(&["whatever"]));
    }

    #[test]
    fn literal_is_case_insensitive_substring() {
        let expr = KeywordExpr::literal("Deep");
        assert!(expr.matches(&["a deep learning survey"]));
        assert!(!expr.matches(&["shallow methods"]));
    }

    #[test]
    fn tilde_negates() {
        let expr = KeywordExpr::literal("~survey");
        assert!(!expr.matches(&["deep learning survey"]));
        assert!(expr.matches(&["deep learning methods"]));
    }

    #[test]
    fn conjunction_vs_disjunction() {
        let fields = ["deep learning survey"];
        let all = KeywordExpr::all_of(["deep", "~survey"]);
        let any = KeywordExpr::any_of(["deep", "~survey"]);
        assert!(!all.matches(&fields));
        assert!(any.matches(&fields));
    }

    #[test]
    fn nested_expressions_short_circuit() {
        // (bandit OR causal) AND NOT survey
        let expr = KeywordExpr::AllOf(vec![
            KeywordExpr::any_of(["bandit", "causal"]),
            KeywordExpr::literal("~survey"),
        ]);
        assert!(expr.matches(&["causal inference under interference"]));
        assert!(!expr.matches(&["a survey of bandit algorithms"]));
        assert!(!expr.matches(&["graph neural networks"]));
    }
}
