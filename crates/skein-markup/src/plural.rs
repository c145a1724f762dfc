//! CLDR plural category selection for the `plural` and `ordinal` format
//! functions.

use fixed_decimal::FixedDecimal;
use icu_locid::Locale;
use icu_plurals::{PluralCategory, PluralRules};

use crate::error::{MarkupError, StringTableError};

/// Which rule family a format function selects with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PluralKind {
    Cardinal,
    Ordinal,
}

/// Cardinal and ordinal plural rules for one locale, built once per
/// string table.
pub(crate) struct PluralRuleSet {
    cardinal: PluralRules,
    ordinal: PluralRules,
}

impl PluralRuleSet {
    pub(crate) fn new(locale: &Locale) -> Result<Self, StringTableError> {
        let cardinal = PluralRules::try_new_cardinal(&locale.clone().into())
            .map_err(|_| StringTableError::PluralRules(locale.to_string()))?;
        let ordinal = PluralRules::try_new_ordinal(&locale.clone().into())
            .map_err(|_| StringTableError::PluralRules(locale.to_string()))?;
        Ok(PluralRuleSet { cardinal, ordinal })
    }

    /// Maps a rendered input string to a branch key. The input is parsed
    /// as a decimal so that trailing zeroes keep their plural
    /// significance ("1.0" is not "1" in English).
    pub(crate) fn branch_key(
        &self,
        kind: PluralKind,
        input: &str,
    ) -> Result<&'static str, MarkupError> {
        let decimal: FixedDecimal = input
            .trim()
            .parse()
            .map_err(|_| MarkupError::FormatInputNotNumber(input.to_string()))?;
        let rules = match kind {
            PluralKind::Cardinal => &self.cardinal,
            PluralKind::Ordinal => &self.ordinal,
        };
        Ok(match rules.category_for(&decimal) {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(tag: &str) -> PluralRuleSet {
        let locale: Locale = tag.parse().expect("locale");
        PluralRuleSet::new(&locale).expect("rules")
    }

    #[test]
    fn test_english_cardinal() {
        let en = rules("en");
        assert_eq!(en.branch_key(PluralKind::Cardinal, "1").unwrap(), "one");
        assert_eq!(en.branch_key(PluralKind::Cardinal, "3").unwrap(), "other");
        assert_eq!(en.branch_key(PluralKind::Cardinal, "0").unwrap(), "other");
        // Trailing zeroes matter to CLDR.
        assert_eq!(en.branch_key(PluralKind::Cardinal, "1.0").unwrap(), "other");
    }

    #[test]
    fn test_english_ordinal() {
        let en = rules("en");
        assert_eq!(en.branch_key(PluralKind::Ordinal, "1").unwrap(), "one");
        assert_eq!(en.branch_key(PluralKind::Ordinal, "2").unwrap(), "two");
        assert_eq!(en.branch_key(PluralKind::Ordinal, "3").unwrap(), "few");
        assert_eq!(en.branch_key(PluralKind::Ordinal, "4").unwrap(), "other");
        assert_eq!(en.branch_key(PluralKind::Ordinal, "11").unwrap(), "other");
        assert_eq!(en.branch_key(PluralKind::Ordinal, "21").unwrap(), "one");
    }

    #[test]
    fn test_polish_cardinal_few_many() {
        let pl = rules("pl");
        assert_eq!(pl.branch_key(PluralKind::Cardinal, "2").unwrap(), "few");
        assert_eq!(pl.branch_key(PluralKind::Cardinal, "5").unwrap(), "many");
    }

    #[test]
    fn test_non_numeric_input() {
        let en = rules("en");
        assert!(matches!(
            en.branch_key(PluralKind::Cardinal, "banana"),
            Err(MarkupError::FormatInputNotNumber(_))
        ));
    }
}
