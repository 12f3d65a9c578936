//! Fundtrace Metrics - Pure compliance and trust aggregation
//!
//! Everything in this crate is a pure function over primitives. The
//! registry and engine call these to recompute cached projections
//! (`compliance_rate`, `average_fraud_score`, ...) after every append;
//! none of the outputs is ever the sole source of truth for a number -
//! all of them re-derive from the event lists.

use fundtrace_core::{Amount, TrustScore, UnitScore};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A category is compliant while its spending stays inside the pledged
/// envelope.
pub fn category_compliance(spent: &Amount, budget: &Amount) -> bool {
    spent <= budget
}

/// Percentage of budget consumed. Zero-budget categories report 0
/// rather than dividing by zero.
pub fn utilization_rate(spent: &Amount, budget: &Amount) -> Decimal {
    if budget.is_zero() {
        Decimal::ZERO
    } else {
        spent.value() / budget.value() * Decimal::ONE_HUNDRED
    }
}

/// Percentage of withdrawals whose category was compliant at the time
/// of that withdrawal. Defined as 100 when there are no withdrawals.
pub fn compliance_rate<I>(flags: I) -> Decimal
where
    I: IntoIterator<Item = bool>,
{
    let mut total = 0u64;
    let mut compliant = 0u64;
    for flag in flags {
        total += 1;
        if flag {
            compliant += 1;
        }
    }
    if total == 0 {
        Decimal::ONE_HUNDRED
    } else {
        Decimal::from(compliant) / Decimal::from(total) * Decimal::ONE_HUNDRED
    }
}

/// Arithmetic mean of trust scores; `neutral` when the list is empty.
pub fn average_trust_score<I>(scores: I, neutral: TrustScore) -> TrustScore
where
    I: IntoIterator<Item = TrustScore>,
{
    let mut sum = Decimal::ZERO;
    let mut count = 0u64;
    for score in scores {
        sum += score.value();
        count += 1;
    }
    if count == 0 {
        neutral
    } else {
        TrustScore::new(sum / Decimal::from(count))
    }
}

/// Arithmetic mean of unit-scale scores; `neutral` when the list is
/// empty.
pub fn average_unit_score<I>(scores: I, neutral: UnitScore) -> UnitScore
where
    I: IntoIterator<Item = UnitScore>,
{
    let mut sum = Decimal::ZERO;
    let mut count = 0u64;
    for score in scores {
        sum += score.value();
        count += 1;
    }
    if count == 0 {
        neutral
    } else {
        UnitScore::new(sum / Decimal::from(count))
    }
}

/// Signed difference between a campaign's target and the sum of its
/// category budgets.
///
/// Positive means the categories under-allocate the target, negative
/// means they over-allocate. Campaign creation deliberately permits
/// both; this is the data callers use to detect it.
pub fn allocation_delta<'a, I>(target: &Amount, budgets: I) -> Decimal
where
    I: IntoIterator<Item = &'a Amount>,
{
    let allocated: Decimal = budgets.into_iter().map(|b| b.value()).sum();
    target.value() - allocated
}

/// Compliance snapshot for a single category, in the shape the
/// compliance query returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub is_compliant: bool,
    pub allocated_amount: Amount,
    pub spent_amount: Amount,
    pub remaining_amount: Amount,
    pub utilization_rate: Decimal,
}

impl ComplianceSummary {
    /// Build a summary from a category's budget and spent figures.
    pub fn from_figures(budget: Amount, spent: Amount) -> Self {
        Self {
            is_compliant: category_compliance(&spent, &budget),
            allocated_amount: budget,
            spent_amount: spent,
            remaining_amount: budget.saturating_sub(&spent),
            utilization_rate: utilization_rate(&spent, &budget),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amount(v: Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    #[test]
    fn test_category_compliance() {
        assert!(category_compliance(
            &amount(dec!(1000)),
            &amount(dec!(1000))
        ));
        assert!(!category_compliance(
            &amount(dec!(1001)),
            &amount(dec!(1000))
        ));
    }

    #[test]
    fn test_utilization_rate() {
        assert_eq!(
            utilization_rate(&amount(dec!(250)), &amount(dec!(1000))),
            dec!(25)
        );
    }

    #[test]
    fn test_utilization_rate_zero_budget() {
        assert_eq!(
            utilization_rate(&amount(dec!(10)), &Amount::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_compliance_rate_empty_is_100() {
        assert_eq!(compliance_rate(std::iter::empty()), dec!(100));
    }

    #[test]
    fn test_compliance_rate_seven_of_ten() {
        let flags = vec![
            true, true, true, true, true, true, true, false, false, false,
        ];
        assert_eq!(compliance_rate(flags), dec!(70));
    }

    #[test]
    fn test_average_trust_score() {
        let scores = vec![
            TrustScore::new(dec!(90)),
            TrustScore::new(dec!(100)),
            TrustScore::new(dec!(80)),
        ];
        assert_eq!(
            average_trust_score(scores, TrustScore::NEUTRAL).value(),
            dec!(90)
        );
    }

    #[test]
    fn test_average_trust_score_empty_is_neutral() {
        let avg = average_trust_score(std::iter::empty(), TrustScore::NEUTRAL);
        assert_eq!(avg, TrustScore::NEUTRAL);
    }

    #[test]
    fn test_average_unit_score_empty_is_neutral() {
        let avg = average_unit_score(std::iter::empty(), UnitScore::ONE);
        assert_eq!(avg, UnitScore::ONE);
    }

    #[test]
    fn test_allocation_delta_under_allocated() {
        let budgets = [amount(dec!(400)), amount(dec!(350))];
        assert_eq!(
            allocation_delta(&amount(dec!(1000)), budgets.iter()),
            dec!(250)
        );
    }

    #[test]
    fn test_allocation_delta_over_allocated() {
        let budgets = [amount(dec!(700)), amount(dec!(600))];
        assert_eq!(
            allocation_delta(&amount(dec!(1000)), budgets.iter()),
            dec!(-300)
        );
    }

    #[test]
    fn test_compliance_summary() {
        let summary = ComplianceSummary::from_figures(amount(dec!(1000)), amount(dec!(400)));
        assert!(summary.is_compliant);
        assert_eq!(summary.remaining_amount.value(), dec!(600));
        assert_eq!(summary.utilization_rate, dec!(40));
    }

    #[test]
    fn test_compliance_summary_overspent() {
        let summary = ComplianceSummary::from_figures(amount(dec!(1000)), amount(dec!(1200)));
        assert!(!summary.is_compliant);
        assert_eq!(summary.remaining_amount, Amount::ZERO);
        assert_eq!(summary.utilization_rate, dec!(120));
    }
}
