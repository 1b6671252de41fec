use crate::quiz::error::ClassifyError;
use crate::quiz::{Quiz, RiskLevel, RiskTier};

/// Sums committed score values. The order of `values` does not matter.
pub fn score<I>(values: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    values.into_iter().sum()
}

/// Finds the tier whose inclusive range holds `total`, checking low before medium before high.
pub fn classify(quiz: &Quiz, total: i64) -> Result<RiskTier, ClassifyError> {
    quiz.risk_levels
        .iter()
        .find(|(_, level)| level.contains(total))
        .map(|(tier, _)| tier)
        .ok_or_else(|| ClassifyError {
            quiz_id: quiz.id.clone(),
            score: total,
            ranges: quiz.risk_levels.ranges(),
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assessment<'a> {
    pub tier: RiskTier,
    pub level: &'a RiskLevel,
}

pub fn assess(quiz: &Quiz, total: i64) -> Result<Assessment<'_>, ClassifyError> {
    let tier = classify(quiz, total)?;
    Ok(Assessment {
        tier,
        level: quiz.risk_level(tier),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::fixtures::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_answers_score_zero() {
        assert_eq!(score(Vec::new()), 0);
    }

    #[test]
    fn test_classify_boundaries() {
        let quiz = small_quiz();
        assert_eq!(classify(&quiz, 0), Ok(RiskTier::Low));
        assert_eq!(classify(&quiz, 2), Ok(RiskTier::Low));
        assert_eq!(classify(&quiz, 3), Ok(RiskTier::Medium));
        assert_eq!(classify(&quiz, 4), Ok(RiskTier::Medium));
        assert_eq!(classify(&quiz, 5), Ok(RiskTier::High));
        assert_eq!(classify(&quiz, 6), Ok(RiskTier::High));
    }

    #[test]
    fn test_out_of_range_is_not_silently_low() {
        let quiz = small_quiz();
        let err = classify(&quiz, 7).unwrap_err();
        assert_eq!(err.score, 7);
        assert_eq!(err.ranges, [(0, 2), (3, 4), (5, 6)]);
        assert!(classify(&quiz, -1).is_err());
    }

    #[test]
    fn test_assess_carries_message() {
        let quiz = small_quiz();
        let assessment = assess(&quiz, 4).unwrap();
        assert_eq!(assessment.tier, RiskTier::Medium);
        assert_eq!(assessment.level.message, "Medium");
    }

    proptest! {
        #[test]
        fn sum_is_order_independent(
            (values, shuffled) in prop::collection::vec(-50i64..50, 0..20)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            prop_assert_eq!(score(values), score(shuffled));
        }

        #[test]
        fn every_achievable_score_has_exactly_one_tier(total in 0i64..=6) {
            let quiz = small_quiz();
            let matching = quiz.risk_levels.iter().filter(|(_, l)| l.contains(total)).count();
            prop_assert_eq!(matching, 1);
            prop_assert!(classify(&quiz, total).is_ok());
        }
    }
}
