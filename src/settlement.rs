//! Settlement and balance aggregation.
//!
//! Pure functions over wire entities: net balances per counterparty,
//! outstanding amounts, and advisory due-date classification. Nothing here
//! talks to the network; the authoritative status of any entity is always
//! whatever the server last said. Overdue detection in particular is a
//! client hint that must be confirmed against fresh server state
//! (see `flows::Ledger::overdue_expenses`).

use chrono::NaiveDate;

use crate::model::{Debt, Expense, ExpenseStatus, Share, User};
use crate::money::Money;

/// A due date within this many days counts as "due soon".
pub const DUE_SOON_DAYS: i64 = 7;

/// Net position of one user across a set of debts (unpaid only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceSummary {
    /// Sum the user owes others.
    pub total_owed: Money,
    /// Sum others owe the user.
    pub total_receivable: Money,
    /// `total_receivable - total_owed`.
    pub net: Money,
}

/// Compute the user's aggregate position over `debts`.
///
/// Paid debts and debts not involving the user are ignored.
pub fn balance_for(user_id: u64, debts: &[Debt]) -> BalanceSummary {
    let mut owed = Money::ZERO;
    let mut receivable = Money::ZERO;

    for debt in debts.iter().filter(|d| !d.paid) {
        if debt.debtor.id == user_id {
            owed += debt.amount;
        } else if debt.creditor.id == user_id {
            receivable += debt.amount;
        }
    }

    BalanceSummary {
        total_owed: owed,
        total_receivable: receivable,
        net: receivable - owed,
    }
}

/// Net position against a single counterparty.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterpartyBalance {
    pub counterparty: User,
    /// What the user owes this counterparty.
    pub owed_to_them: Money,
    /// What this counterparty owes the user.
    pub owed_by_them: Money,
    pub net: Money,
}

/// Group the user's unpaid debts by counterparty, in ascending id order.
pub fn balances_by_counterparty(user_id: u64, debts: &[Debt]) -> Vec<CounterpartyBalance> {
    let mut balances: Vec<CounterpartyBalance> = Vec::new();

    for debt in debts.iter().filter(|d| !d.paid) {
        let (counterparty, owed_to_them, owed_by_them) = if debt.debtor.id == user_id {
            (&debt.creditor, debt.amount, Money::ZERO)
        } else if debt.creditor.id == user_id {
            (&debt.debtor, Money::ZERO, debt.amount)
        } else {
            continue;
        };

        match balances
            .iter_mut()
            .find(|b| b.counterparty.id == counterparty.id)
        {
            Some(entry) => {
                entry.owed_to_them += owed_to_them;
                entry.owed_by_them += owed_by_them;
            }
            None => balances.push(CounterpartyBalance {
                counterparty: counterparty.clone(),
                owed_to_them,
                owed_by_them,
                net: Money::ZERO,
            }),
        }
    }

    for entry in &mut balances {
        entry.net = entry.owed_by_them - entry.owed_to_them;
    }
    balances.sort_by_key(|b| b.counterparty.id);
    balances
}

/// Advisory classification of an obligation by its due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    Paid,
    Pending,
    /// Due within [`DUE_SOON_DAYS`] days (including today).
    DueSoon {
        days_left: i64,
    },
    Overdue,
}

/// Classify by calendar date.
///
/// `today` is the caller's local calendar date. The comparison is pure
/// date arithmetic: an obligation due today is never overdue, regardless
/// of the client's UTC offset.
pub fn due_status(due_date: Option<NaiveDate>, paid: bool, today: NaiveDate) -> DueStatus {
    if paid {
        return DueStatus::Paid;
    }
    let due = match due_date {
        Some(date) => date,
        None => return DueStatus::Pending,
    };

    let days_left = (due - today).num_days();
    if days_left < 0 {
        DueStatus::Overdue
    } else if days_left <= DUE_SOON_DAYS {
        DueStatus::DueSoon { days_left }
    } else {
        DueStatus::Pending
    }
}

/// Expenses whose due date has passed but whose status does not say so yet.
///
/// Advisory only: the caller decides whether to request the server-side
/// transition for each hit.
pub fn detect_overdue<'a>(expenses: &'a [Expense], today: NaiveDate) -> Vec<&'a Expense> {
    expenses
        .iter()
        .filter(|e| {
            !matches!(e.status, ExpenseStatus::Paid | ExpenseStatus::Overdue)
                && e.due_date < today
        })
        .collect()
}

/// Amount of an expense still unpaid across its shares.
pub fn outstanding(shares: &[Share]) -> Money {
    shares
        .iter()
        .filter(|s| !s.paid)
        .map(|s| s.amount)
        .sum()
}

/// Aggregate counts and totals by expense status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpenseStats {
    pub pending: u64,
    pub paid: u64,
    pub overdue: u64,
    pub partially_paid: u64,
    pub pending_total: Money,
    pub paid_total: Money,
    pub overdue_total: Money,
}

pub fn expense_stats(expenses: &[Expense]) -> ExpenseStats {
    let mut stats = ExpenseStats::default();
    for expense in expenses {
        match expense.status {
            ExpenseStatus::Pending => {
                stats.pending += 1;
                stats.pending_total += expense.amount;
            }
            ExpenseStatus::Paid => {
                stats.paid += 1;
                stats.paid_total += expense.amount;
            }
            ExpenseStatus::Overdue => {
                stats.overdue += 1;
                stats.overdue_total += expense.amount;
            }
            ExpenseStatus::PartiallyPaid => {
                stats.partially_paid += 1;
                stats.pending_total += expense.amount;
            }
        }
    }
    stats
}

/// Aggregate view of a user's debts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebtStats {
    pub total: u64,
    pub open: u64,
    pub paid: u64,
    pub overdue: u64,
    pub balance: BalanceSummary,
    pub largest: Money,
    pub average: Money,
}

pub fn debt_stats(user_id: u64, debts: &[Debt], today: NaiveDate) -> DebtStats {
    let mine: Vec<&Debt> = debts
        .iter()
        .filter(|d| d.debtor.id == user_id || d.creditor.id == user_id)
        .collect();

    let overdue = mine
        .iter()
        .filter(|d| matches!(due_status(d.due_date, d.paid, today), DueStatus::Overdue))
        .count() as u64;

    let total_amount: Money = mine.iter().map(|d| d.amount).sum();
    let largest = mine.iter().map(|d| d.amount).max().unwrap_or(Money::ZERO);
    let average = if mine.is_empty() {
        Money::ZERO
    } else {
        Money::from_cents(total_amount.cents() / mine.len() as i64)
    };

    DebtStats {
        total: mine.len() as u64,
        open: mine.iter().filter(|d| !d.paid).count() as u64,
        paid: mine.iter().filter(|d| d.paid).count() as u64,
        overdue,
        balance: balance_for(user_id, debts),
        largest,
        average,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn user(id: u64, name: &str) -> User {
        User {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            pix_key: format!("{}@pix", name.to_lowercase()),
        }
    }

    fn debt(id: u64, debtor: User, creditor: User, cents: i64, paid: bool) -> Debt {
        Debt {
            id,
            description: format!("debt {}", id),
            amount: Money::from_cents(cents),
            debtor,
            creditor,
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
            due_date: None,
            paid,
            paid_at: None,
            payment_method: None,
        }
    }

    #[test]
    fn balance_nets_unpaid_debts_only() {
        let ana = user(1, "Ana");
        let bia = user(2, "Bia");
        let debts = vec![
            debt(1, ana.clone(), bia.clone(), 5000, false),
            debt(2, bia.clone(), ana.clone(), 2000, false),
            debt(3, ana.clone(), bia.clone(), 9999, true), // paid, ignored
        ];

        let summary = balance_for(1, &debts);
        assert_eq!(summary.total_owed, Money::from_cents(5000));
        assert_eq!(summary.total_receivable, Money::from_cents(2000));
        assert_eq!(summary.net, Money::from_cents(-3000));
    }

    #[test]
    fn balances_group_by_counterparty() {
        let ana = user(1, "Ana");
        let bia = user(2, "Bia");
        let caio = user(3, "Caio");
        let debts = vec![
            debt(1, ana.clone(), bia.clone(), 1000, false),
            debt(2, ana.clone(), bia.clone(), 500, false),
            debt(3, caio.clone(), ana.clone(), 700, false),
        ];

        let balances = balances_by_counterparty(1, &debts);
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].counterparty.id, 2);
        assert_eq!(balances[0].owed_to_them, Money::from_cents(1500));
        assert_eq!(balances[0].net, Money::from_cents(-1500));
        assert_eq!(balances[1].counterparty.id, 3);
        assert_eq!(balances[1].owed_by_them, Money::from_cents(700));
    }

    #[test]
    fn due_today_is_never_overdue() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        assert_eq!(
            due_status(Some(today), false, today),
            DueStatus::DueSoon { days_left: 0 }
        );
    }

    #[test]
    fn due_yesterday_is_always_overdue() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        assert_eq!(due_status(Some(yesterday), false, today), DueStatus::Overdue);
    }

    #[test]
    fn paid_trumps_the_calendar() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let long_ago = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(due_status(Some(long_ago), true, today), DueStatus::Paid);
    }

    #[test]
    fn detect_overdue_skips_paid_and_already_flagged() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let past = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let make = |id, status| Expense {
            id,
            description: format!("expense {}", id),
            amount: Money::from_cents(1000),
            due_date: past,
            creator: user(1, "Ana"),
            status,
            created_at: Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap(),
            external_participants: vec![],
        };

        let expenses = vec![
            make(1, ExpenseStatus::Pending),
            make(2, ExpenseStatus::Paid),
            make(3, ExpenseStatus::Overdue),
            make(4, ExpenseStatus::PartiallyPaid),
        ];
        let hits = detect_overdue(&expenses, today);
        let ids: Vec<u64> = hits.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn outstanding_sums_unpaid_shares() {
        let shares = vec![
            Share {
                id: 1,
                expense_id: 7,
                user: user(1, "Ana"),
                amount: Money::from_cents(3334),
                paid: true,
                paid_at: None,
                payment_method: Some("PIX".to_string()),
            },
            Share {
                id: 2,
                expense_id: 7,
                user: user(2, "Bia"),
                amount: Money::from_cents(3333),
                paid: false,
                paid_at: None,
                payment_method: None,
            },
            Share {
                id: 3,
                expense_id: 7,
                user: user(3, "Caio"),
                amount: Money::from_cents(3333),
                paid: false,
                paid_at: None,
                payment_method: None,
            },
        ];
        assert_eq!(outstanding(&shares), Money::from_cents(6666));
    }

    #[test]
    fn debt_stats_cover_counts_and_extremes() {
        let ana = user(1, "Ana");
        let bia = user(2, "Bia");
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let mut overdue_debt = debt(1, ana.clone(), bia.clone(), 4000, false);
        overdue_debt.due_date = Some(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        let debts = vec![
            overdue_debt,
            debt(2, bia.clone(), ana.clone(), 1000, false),
            debt(3, ana.clone(), bia.clone(), 2500, true),
        ];

        let stats = debt_stats(1, &debts, today);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.open, 2);
        assert_eq!(stats.paid, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.largest, Money::from_cents(4000));
        assert_eq!(stats.average, Money::from_cents(2500));
    }
}
