//! Expense splitting engine.
//!
//! Pure functions that turn "total + participants + mode" into
//! per-participant amounts. Both modes use the same reconciliation rule:
//! floor every share to a whole centavo, then hand out the leftover cents
//! one at a time in participant order, so the shares always sum to the
//! total exactly and identical input produces identical output.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;

/// Percentages must sum to 100% within this many basis points.
const PERCENT_TOLERANCE_BP: i64 = 1;

/// Someone taking part in an expense.
///
/// System users have an account and settle through in-app shares.
/// External participants have no account; they settle through a one-time
/// payment-confirmation link and are identified by name only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Participant {
    User { id: u64 },
    External { name: String },
}

impl Participant {
    pub fn user(id: u64) -> Self {
        Participant::User { id }
    }

    pub fn external(name: impl Into<String>) -> Self {
        Participant::External { name: name.into() }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Participant::External { .. })
    }
}

/// One participant's computed portion of a split.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareAmount {
    pub participant: Participant,
    pub amount: Money,
}

/// Local validation failures. None of these reach the network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    #[error("at least one participant is required")]
    NoParticipants,

    #[error("the amount to split must be positive")]
    InvalidAmount,

    #[error("percentages sum to {sum:.2}%, expected 100%")]
    PercentagesDoNotSum { sum: f64 },
}

/// Split `total` evenly across `participants`.
///
/// Every share is `total / n` floored to a centavo; the remaining cents go
/// to the first participants in list order, so no two shares differ by
/// more than one centavo.
pub fn split_equal(
    total: Money,
    participants: &[Participant],
) -> Result<Vec<ShareAmount>, SplitError> {
    if participants.is_empty() {
        return Err(SplitError::NoParticipants);
    }
    if !total.is_positive() {
        return Err(SplitError::InvalidAmount);
    }

    let n = participants.len() as i64;
    let base = total.cents() / n;
    let mut cents: Vec<i64> = vec![base; participants.len()];
    distribute_remainder(&mut cents, total.cents());

    Ok(collect(participants.iter().cloned(), cents))
}

/// Split `total` by explicit percentages.
///
/// Percentages are validated to sum to 100% within ±0.01 percentage
/// points before anything is computed. Each share is
/// `floor(total × percent / 100)` in centavos, reconciled with the same
/// in-order leftover rule as the equal split.
pub fn split_percentage(
    total: Money,
    participants: &[(Participant, f64)],
) -> Result<Vec<ShareAmount>, SplitError> {
    if participants.is_empty() {
        return Err(SplitError::NoParticipants);
    }
    if !total.is_positive() {
        return Err(SplitError::InvalidAmount);
    }

    // Work in basis points so the tolerance check is integer arithmetic.
    let mut basis_points = Vec::with_capacity(participants.len());
    for (_, percent) in participants {
        if !percent.is_finite() || *percent < 0.0 {
            return Err(SplitError::PercentagesDoNotSum {
                sum: participants.iter().map(|(_, p)| p).sum(),
            });
        }
        basis_points.push((percent * 100.0).round() as i64);
    }

    let sum_bp: i64 = basis_points.iter().sum();
    if (sum_bp - 10_000).abs() > PERCENT_TOLERANCE_BP {
        return Err(SplitError::PercentagesDoNotSum {
            sum: sum_bp as f64 / 100.0,
        });
    }

    let total_cents = total.cents() as i128;
    let mut cents: Vec<i64> = basis_points
        .iter()
        .map(|bp| (total_cents * *bp as i128 / 10_000) as i64)
        .collect();
    distribute_remainder(&mut cents, total.cents());

    Ok(collect(
        participants.iter().map(|(p, _)| p.clone()),
        cents,
    ))
}

/// Adjust floored shares so they sum to `total_cents` exactly.
///
/// Leftover cents are added one at a time in list order; if rounding
/// overshot (possible only at the edge of the percentage tolerance),
/// cents are removed the same way, never taking a share below zero.
fn distribute_remainder(cents: &mut [i64], total_cents: i64) {
    let mut remainder = total_cents - cents.iter().sum::<i64>();
    let n = cents.len();

    let mut i = 0;
    while remainder > 0 {
        cents[i % n] += 1;
        remainder -= 1;
        i += 1;
    }
    while remainder < 0 {
        if cents[i % n] > 0 {
            cents[i % n] -= 1;
            remainder += 1;
        }
        i += 1;
    }
}

fn collect(participants: impl Iterator<Item = Participant>, cents: Vec<i64>) -> Vec<ShareAmount> {
    participants
        .zip(cents)
        .map(|(participant, c)| ShareAmount {
            participant,
            amount: Money::from_cents(c),
        })
        .collect()
}
