//! High-level operations tying the API, cache and session together.
//!
//! [`Ledger`] is what an application embeds. Reads go through the query
//! cache; mutations hit the API and invalidate the entity classes they
//! touched, so the next read refetches. Multi-step mutations report
//! partial completion through [`ApiError::Partial`] instead of pretending
//! the whole operation rolled back.
//!
//! The ledger is generic over the API traits so flows can be exercised
//! against in-memory fakes.

use chrono::NaiveDate;
use futures::future::try_join_all;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{
    AuthApi, DebtApi, ExpenseApi, FriendshipApi, GroupApi, InvitationApi, NotificationApi,
    PaymentLinkApi,
};
use crate::cache::{EntityClass, QueryCache, QueryKey};
use crate::error::{ApiError, CompletedStep};
use crate::model::{
    Credentials, Debt, DebtFilter, DebtPatch, Expense, ExpenseFilter, ExpensePatch, ExpenseStatus,
    ExternalPayment, Friendship, Group, Invitation, MembershipChange, NewDebt, NewExpense,
    NewGroup, NewInvitation, NewPaymentLink, NewShare, Notification, PaymentLinkCreated,
    PaymentRequest, PercentShare, Registration, Share, User, UserBalance,
};
use crate::money::Money;
use crate::session::{Session, SharedSessionStore};
use crate::settlement;
use crate::split::{self, Participant, ShareAmount, SplitError};

/// Payment method recorded when settling debts wholesale.
const SETTLEMENT_METHOD: &str = "QUITACAO";

/// How an expense should be divided among participants.
#[derive(Debug, Clone)]
pub enum SplitPlan {
    /// Everyone pays the same, up to the one-cent remainder rule.
    Equal(Vec<Participant>),
    /// Explicit percentages, validated to sum to 100%.
    Percentage(Vec<(Participant, f64)>),
}

impl SplitPlan {
    /// Compute the per-participant amounts locally.
    ///
    /// This is both the pre-flight validation and the preview an
    /// application shows before anything is sent to the server.
    pub fn preview(&self, total: Money) -> Result<Vec<ShareAmount>, SplitError> {
        match self {
            SplitPlan::Equal(participants) => split::split_equal(total, participants),
            SplitPlan::Percentage(entries) => split::split_percentage(total, entries),
        }
    }

    fn has_external(&self) -> bool {
        match self {
            SplitPlan::Equal(participants) => participants.iter().any(Participant::is_external),
            SplitPlan::Percentage(entries) => entries.iter().any(|(p, _)| p.is_external()),
        }
    }
}

/// Input for creating a split expense.
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    pub description: String,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub group_id: Option<u64>,
}

/// Result of creating and splitting an expense.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub expense: Expense,
    pub shares: Vec<Share>,
    /// One link per external participant, in plan order.
    pub payment_links: Vec<PaymentLinkCreated>,
}

/// Result of confirming an external payment link.
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    /// The confirmation landed and the expense was updated.
    Confirmed {
        payment: ExternalPayment,
        expense: Expense,
    },
    /// The link had already been confirmed, possibly by a racing request.
    AlreadyPaid(ExternalPayment),
}

/// Result of settling every open debt against one counterparty.
#[derive(Debug, Clone)]
pub struct SettlementReceipt {
    pub settled: Vec<Debt>,
    pub total: Money,
}

/// Application-facing facade over the API client, cache and session.
pub struct Ledger<A> {
    api: A,
    cache: Arc<QueryCache>,
    session: SharedSessionStore,
}

impl<A> Ledger<A> {
    pub fn new(api: A, cache: Arc<QueryCache>, session: SharedSessionStore) -> Self {
        Self {
            api,
            cache,
            session,
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn session(&self) -> &SharedSessionStore {
        &self.session
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.session.user().await.ok_or(ApiError::Unauthorized)
    }

    // --- auth -----------------------------------------------------------

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<User, ApiError>
    where
        A: AuthApi,
    {
        let auth = self.api.sign_in(credentials).await?;
        // Never serve one account's data to another.
        self.cache.clear();
        self.session
            .set(Session {
                token: auth.token,
                user: auth.user.clone(),
            })
            .await;
        tracing::info!(user_id = auth.user.id, "signed in");
        Ok(auth.user)
    }

    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError>
    where
        A: AuthApi,
    {
        let auth = self.api.register(registration).await?;
        self.cache.clear();
        self.session
            .set(Session {
                token: auth.token,
                user: auth.user.clone(),
            })
            .await;
        tracing::info!(user_id = auth.user.id, "registered");
        Ok(auth.user)
    }

    pub async fn sign_out(&self) {
        self.session.clear().await;
        self.cache.clear();
        tracing::info!("signed out");
    }

    // --- expenses and shares --------------------------------------------

    pub async fn expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, ApiError>
    where
        A: ExpenseApi,
    {
        let key = QueryKey::filtered(EntityClass::Expenses, vec![filter.cache_params()]);
        self.cache
            .get_or_fetch(&key, || self.api.list_expenses(filter))
            .await
    }

    pub async fn expense(&self, id: u64) -> Result<Expense, ApiError>
    where
        A: ExpenseApi,
    {
        let key = QueryKey::detail(EntityClass::Expenses, id);
        self.cache
            .get_or_fetch(&key, || self.api.get_expense(id))
            .await
    }

    pub async fn shares(&self, expense_id: u64) -> Result<Vec<Share>, ApiError>
    where
        A: ExpenseApi,
    {
        let key = QueryKey::detail(EntityClass::Shares, expense_id);
        self.cache
            .get_or_fetch(&key, || self.api.list_shares(expense_id))
            .await
    }

    /// Create an expense and divide it according to `plan`.
    ///
    /// The plan is validated locally first; an invalid plan costs no
    /// network round trip. When every participant is a system user the
    /// server computes the shares; when external participants are present
    /// the locally reconciled amounts are used, shares are created for the
    /// users and one payment link is minted per external participant.
    ///
    /// If anything fails after the expense itself was created the error is
    /// wrapped in [`ApiError::Partial`] with
    /// [`CompletedStep::ExpenseCreated`].
    pub async fn create_expense_split(
        &self,
        draft: ExpenseDraft,
        plan: &SplitPlan,
    ) -> Result<SplitOutcome, ApiError>
    where
        A: ExpenseApi + PaymentLinkApi,
    {
        let user = self.current_user().await?;
        let preview = plan.preview(draft.amount)?;

        let expense = self
            .api
            .create_expense(&NewExpense {
                description: draft.description.clone(),
                amount: draft.amount,
                due_date: draft.due_date,
                creator_id: user.id,
                group_id: draft.group_id,
            })
            .await?;

        let result = self
            .populate_split(&expense, plan, &preview, &user)
            .await;

        match result {
            Ok((shares, payment_links)) => {
                self.cache.invalidate(&[
                    EntityClass::Expenses,
                    EntityClass::Shares,
                    EntityClass::Statistics,
                ]);
                Ok(SplitOutcome {
                    expense,
                    shares,
                    payment_links,
                })
            }
            Err(e) => {
                // The expense exists on the server; make sure lists show it.
                self.cache.invalidate(&[EntityClass::Expenses]);
                Err(ApiError::after(CompletedStep::ExpenseCreated, e))
            }
        }
    }

    async fn populate_split(
        &self,
        expense: &Expense,
        plan: &SplitPlan,
        preview: &[ShareAmount],
        creator: &User,
    ) -> Result<(Vec<Share>, Vec<PaymentLinkCreated>), ApiError>
    where
        A: ExpenseApi + PaymentLinkApi,
    {
        if !plan.has_external() {
            let shares = match plan {
                SplitPlan::Equal(participants) => {
                    let user_ids: Vec<u64> = participants
                        .iter()
                        .filter_map(|p| match p {
                            Participant::User { id } => Some(*id),
                            Participant::External { .. } => None,
                        })
                        .collect();
                    self.api.split_equal_remote(expense.id, &user_ids).await?
                }
                SplitPlan::Percentage(entries) => {
                    let shares: Vec<PercentShare> = entries
                        .iter()
                        .filter_map(|(p, percent)| match p {
                            Participant::User { id } => Some(PercentShare {
                                user_id: *id,
                                percent: *percent,
                            }),
                            Participant::External { .. } => None,
                        })
                        .collect();
                    self.api.split_percentage_remote(expense.id, &shares).await?
                }
            };
            return Ok((shares, Vec::new()));
        }

        // Mixed split: the locally reconciled amounts are authoritative.
        let mut shares = Vec::new();
        let mut payment_links = Vec::new();
        for entry in preview {
            match &entry.participant {
                Participant::User { id } => {
                    let share = self
                        .api
                        .create_share(&NewShare {
                            expense_id: expense.id,
                            user_id: *id,
                            amount: entry.amount,
                        })
                        .await?;
                    shares.push(share);
                }
                Participant::External { name } => {
                    let link = self
                        .api
                        .create_payment_link(&NewPaymentLink {
                            participant_name: name.clone(),
                            amount: entry.amount,
                            expense_description: expense.description.clone(),
                            expense_id: expense.id,
                            created_by_id: creator.id,
                            created_by: creator.name.clone(),
                            due_date: expense.due_date,
                        })
                        .await?;
                    payment_links.push(link);
                }
            }
        }
        Ok((shares, payment_links))
    }

    pub async fn mark_share_paid(
        &self,
        share_id: u64,
        payment: &PaymentRequest,
    ) -> Result<Share, ApiError>
    where
        A: ExpenseApi,
    {
        let share = self.api.mark_share_paid(share_id, payment).await?;
        self.cache.invalidate(&[
            EntityClass::Shares,
            EntityClass::Expenses,
            EntityClass::Statistics,
        ]);
        Ok(share)
    }

    pub async fn reopen_share(&self, share_id: u64) -> Result<Share, ApiError>
    where
        A: ExpenseApi,
    {
        let share = self.api.reopen_share(share_id).await?;
        self.cache.invalidate(&[
            EntityClass::Shares,
            EntityClass::Expenses,
            EntityClass::Statistics,
        ]);
        Ok(share)
    }

    pub async fn mark_expense_paid(&self, expense_id: u64) -> Result<Expense, ApiError>
    where
        A: ExpenseApi,
    {
        let expense = self.api.mark_expense_paid(expense_id).await?;
        self.cache.invalidate(&[
            EntityClass::Expenses,
            EntityClass::Shares,
            EntityClass::Statistics,
        ]);
        Ok(expense)
    }

    /// Reopen a paid expense. Only its creator may do this; the check is
    /// local so other users get a clear error without a round trip.
    pub async fn reopen_expense(&self, expense_id: u64) -> Result<Expense, ApiError>
    where
        A: ExpenseApi,
    {
        let user = self.current_user().await?;
        let expense = self.api.get_expense(expense_id).await?;
        if expense.creator.id != user.id {
            return Err(ApiError::Validation(
                "only the expense creator can reopen it".to_string(),
            ));
        }

        let reopened = self.api.reopen_expense(expense_id).await?;
        self.cache.invalidate(&[
            EntityClass::Expenses,
            EntityClass::Shares,
            EntityClass::Statistics,
        ]);
        Ok(reopened)
    }

    pub async fn update_expense(
        &self,
        expense_id: u64,
        patch: &ExpensePatch,
    ) -> Result<Expense, ApiError>
    where
        A: ExpenseApi,
    {
        let expense = self.api.update_expense(expense_id, patch).await?;
        self.cache
            .invalidate(&[EntityClass::Expenses, EntityClass::Statistics]);
        Ok(expense)
    }

    pub async fn delete_expense(&self, expense_id: u64) -> Result<(), ApiError>
    where
        A: ExpenseApi,
    {
        self.api.delete_expense(expense_id).await?;
        self.cache.invalidate(&[
            EntityClass::Expenses,
            EntityClass::Shares,
            EntityClass::Statistics,
        ]);
        Ok(())
    }

    /// Which unpaid expenses are past due as of `today`, re-checked
    /// against the server so a stale list cannot flag a freshly paid one.
    pub async fn overdue_expenses(&self, today: NaiveDate) -> Result<Vec<Expense>, ApiError>
    where
        A: ExpenseApi,
    {
        let filter = ExpenseFilter {
            paid: Some(false),
            ..Default::default()
        };
        let expenses = self.api.list_expenses(&filter).await?;
        let candidates: Vec<u64> = settlement::detect_overdue(&expenses, today)
            .into_iter()
            .map(|e| e.id)
            .collect();

        let fresh = try_join_all(candidates.iter().map(|id| self.api.get_expense(*id))).await?;
        Ok(fresh
            .into_iter()
            .filter(|e| e.status != ExpenseStatus::Paid && e.due_date < today)
            .collect())
    }

    /// Confirm the overdue transition server-side for every expense
    /// [`overdue_expenses`](Self::overdue_expenses) reports.
    pub async fn confirm_overdue(&self, today: NaiveDate) -> Result<Vec<Expense>, ApiError>
    where
        A: ExpenseApi,
    {
        let candidates = self.overdue_expenses(today).await?;
        let updated = try_join_all(
            candidates
                .iter()
                .map(|e| self.api.set_expense_status(e.id, ExpenseStatus::Overdue)),
        )
        .await?;

        if !updated.is_empty() {
            self.cache.invalidate(&[
                EntityClass::Expenses,
                EntityClass::Statistics,
                EntityClass::Notifications,
            ]);
        }
        Ok(updated)
    }

    // --- external payments ----------------------------------------------

    /// Confirm an external payment link and fold the payment into its
    /// expense.
    ///
    /// A link that is already paid, including one lost to a racing
    /// confirmation, comes back as [`ConfirmOutcome::AlreadyPaid`] rather
    /// than an error. If the confirmation lands but the expense update
    /// fails, the error carries [`CompletedStep::PaymentConfirmed`].
    pub async fn confirm_external_payment(
        &self,
        link_id: Uuid,
        payment: &PaymentRequest,
    ) -> Result<ConfirmOutcome, ApiError>
    where
        A: ExpenseApi + PaymentLinkApi,
    {
        let info = self.api.get_payment_link(link_id).await?;
        if info.paid {
            return Ok(ConfirmOutcome::AlreadyPaid(info));
        }

        let confirmed = match self.api.confirm_payment_link(link_id, payment).await {
            Ok(c) => c,
            Err(ApiError::Remote {
                status: 400 | 409, ..
            }) => {
                // Someone else confirmed between our read and our write.
                let info = self.api.get_payment_link(link_id).await?;
                return Ok(ConfirmOutcome::AlreadyPaid(info));
            }
            Err(e) => return Err(e),
        };

        match self
            .apply_external_payment(confirmed.expense_id, confirmed.amount)
            .await
        {
            Ok(expense) => {
                self.cache.invalidate(&[
                    EntityClass::Expenses,
                    EntityClass::Shares,
                    EntityClass::Statistics,
                    EntityClass::Notifications,
                ]);
                Ok(ConfirmOutcome::Confirmed {
                    payment: confirmed,
                    expense,
                })
            }
            Err(e) => {
                self.cache.invalidate(&[EntityClass::Expenses]);
                Err(ApiError::after(CompletedStep::PaymentConfirmed, e))
            }
        }
    }

    /// Reduce an expense by an externally paid amount.
    ///
    /// The residual never goes below zero. The amount update is always
    /// followed by a status transition: `Paid` when the residual hits
    /// zero, `PartiallyPaid` otherwise. The two steps are not atomic; if
    /// the transition fails the error carries
    /// [`CompletedStep::AmountReduced`] so the caller knows the amount
    /// already committed.
    pub async fn apply_external_payment(
        &self,
        expense_id: u64,
        paid: Money,
    ) -> Result<Expense, ApiError>
    where
        A: ExpenseApi,
    {
        let expense = self.api.get_expense(expense_id).await?;
        if expense.status == ExpenseStatus::Paid {
            return Ok(expense);
        }

        let residual = expense.amount.saturating_sub_to_zero(paid);
        self.api
            .update_expense(expense_id, &ExpensePatch::amount(residual))
            .await?;

        let transition = if residual.is_zero() {
            self.api.mark_expense_paid(expense_id).await
        } else {
            self.api
                .set_expense_status(expense_id, ExpenseStatus::PartiallyPaid)
                .await
        };
        transition.map_err(|e| ApiError::after(CompletedStep::AmountReduced, e))
    }

    pub async fn payment_links(&self, expense_id: u64) -> Result<Vec<ExternalPayment>, ApiError>
    where
        A: PaymentLinkApi,
    {
        self.api.list_payment_links(expense_id).await
    }

    // --- debts ----------------------------------------------------------

    pub async fn debts(&self, filter: &DebtFilter) -> Result<Vec<Debt>, ApiError>
    where
        A: DebtApi,
    {
        let key = QueryKey::filtered(EntityClass::Debts, vec![filter.cache_params()]);
        self.cache
            .get_or_fetch(&key, || self.api.list_debts(filter))
            .await
    }

    pub async fn create_debt(&self, debt: &NewDebt) -> Result<Debt, ApiError>
    where
        A: DebtApi,
    {
        let created = self.api.create_debt(debt).await?;
        self.cache.invalidate(&[
            EntityClass::Debts,
            EntityClass::Statistics,
            EntityClass::Notifications,
        ]);
        Ok(created)
    }

    pub async fn update_debt(&self, debt_id: u64, patch: &DebtPatch) -> Result<Debt, ApiError>
    where
        A: DebtApi,
    {
        let debt = self.api.update_debt(debt_id, patch).await?;
        self.cache
            .invalidate(&[EntityClass::Debts, EntityClass::Statistics]);
        Ok(debt)
    }

    pub async fn delete_debt(&self, debt_id: u64) -> Result<(), ApiError>
    where
        A: DebtApi,
    {
        self.api.delete_debt(debt_id).await?;
        self.cache
            .invalidate(&[EntityClass::Debts, EntityClass::Statistics]);
        Ok(())
    }

    pub async fn mark_debt_paid(
        &self,
        debt_id: u64,
        payment: &PaymentRequest,
    ) -> Result<Debt, ApiError>
    where
        A: DebtApi,
    {
        let debt = self.api.mark_debt_paid(debt_id, payment).await?;
        self.cache.invalidate(&[
            EntityClass::Debts,
            EntityClass::Statistics,
            EntityClass::Notifications,
        ]);
        Ok(debt)
    }

    pub async fn reopen_debt(&self, debt_id: u64) -> Result<Debt, ApiError>
    where
        A: DebtApi,
    {
        let debt = self.api.reopen_debt(debt_id).await?;
        self.cache
            .invalidate(&[EntityClass::Debts, EntityClass::Statistics]);
        Ok(debt)
    }

    pub async fn balance(&self) -> Result<UserBalance, ApiError>
    where
        A: DebtApi,
    {
        let user = self.current_user().await?;
        let key = QueryKey::detail(EntityClass::Statistics, user.id);
        self.cache
            .get_or_fetch(&key, || self.api.balance(user.id))
            .await
    }

    /// Settle every open debt the current user owes `counterparty_id`.
    pub async fn settle_debts_with(
        &self,
        counterparty_id: u64,
    ) -> Result<SettlementReceipt, ApiError>
    where
        A: DebtApi,
    {
        let user = self.current_user().await?;
        let open = self
            .api
            .list_debts(&DebtFilter { paid: Some(false) })
            .await?;

        let mine: Vec<u64> = open
            .iter()
            .filter(|d| d.debtor.id == user.id && d.creditor.id == counterparty_id)
            .map(|d| d.id)
            .collect();

        let payment = PaymentRequest::new(SETTLEMENT_METHOD);
        let settled = try_join_all(
            mine.iter()
                .map(|id| self.api.mark_debt_paid(*id, &payment)),
        )
        .await?;

        self.cache.invalidate(&[
            EntityClass::Debts,
            EntityClass::Statistics,
            EntityClass::Notifications,
        ]);

        let total = settled.iter().map(|d| d.amount).sum();
        Ok(SettlementReceipt { settled, total })
    }

    // --- notifications --------------------------------------------------

    pub async fn notifications(&self) -> Result<Vec<Notification>, ApiError>
    where
        A: NotificationApi,
    {
        let key = QueryKey::list(EntityClass::Notifications);
        self.cache
            .get_or_fetch(&key, || self.api.list_notifications())
            .await
    }

    pub async fn mark_notification_read(&self, id: u64) -> Result<(), ApiError>
    where
        A: NotificationApi,
    {
        self.api.mark_notification_read(id).await?;
        self.cache.invalidate(&[EntityClass::Notifications]);
        Ok(())
    }

    pub async fn mark_all_notifications_read(&self) -> Result<(), ApiError>
    where
        A: NotificationApi,
    {
        self.api.mark_all_notifications_read().await?;
        self.cache.invalidate(&[EntityClass::Notifications]);
        Ok(())
    }

    // --- friendships, groups, invitations -------------------------------

    pub async fn friendships(&self) -> Result<Vec<Friendship>, ApiError>
    where
        A: FriendshipApi,
    {
        let key = QueryKey::list(EntityClass::Friendships);
        self.cache
            .get_or_fetch(&key, || self.api.list_friendships())
            .await
    }

    pub async fn request_friendship(&self, addressee_id: u64) -> Result<Friendship, ApiError>
    where
        A: FriendshipApi,
    {
        let friendship = self.api.request_friendship(addressee_id).await?;
        self.cache
            .invalidate(&[EntityClass::Friendships, EntityClass::Notifications]);
        Ok(friendship)
    }

    pub async fn accept_friendship(&self, id: u64) -> Result<Friendship, ApiError>
    where
        A: FriendshipApi,
    {
        let friendship = self.api.accept_friendship(id).await?;
        self.cache
            .invalidate(&[EntityClass::Friendships, EntityClass::Notifications]);
        Ok(friendship)
    }

    pub async fn reject_friendship(&self, id: u64) -> Result<Friendship, ApiError>
    where
        A: FriendshipApi,
    {
        let friendship = self.api.reject_friendship(id).await?;
        self.cache
            .invalidate(&[EntityClass::Friendships, EntityClass::Notifications]);
        Ok(friendship)
    }

    pub async fn remove_friendship(&self, id: u64) -> Result<(), ApiError>
    where
        A: FriendshipApi,
    {
        self.api.remove_friendship(id).await?;
        self.cache.invalidate(&[EntityClass::Friendships]);
        Ok(())
    }

    pub async fn groups(&self) -> Result<Vec<Group>, ApiError>
    where
        A: GroupApi,
    {
        let key = QueryKey::list(EntityClass::Groups);
        self.cache
            .get_or_fetch(&key, || self.api.list_groups())
            .await
    }

    pub async fn group(&self, id: u64) -> Result<Group, ApiError>
    where
        A: GroupApi,
    {
        let key = QueryKey::detail(EntityClass::Groups, id);
        self.cache
            .get_or_fetch(&key, || self.api.get_group(id))
            .await
    }

    pub async fn create_group(&self, group: &NewGroup) -> Result<Group, ApiError>
    where
        A: GroupApi,
    {
        let created = self.api.create_group(group).await?;
        self.cache.invalidate(&[EntityClass::Groups]);
        Ok(created)
    }

    pub async fn change_group_members(
        &self,
        id: u64,
        change: &MembershipChange,
    ) -> Result<Group, ApiError>
    where
        A: GroupApi,
    {
        let group = self.api.change_members(id, change).await?;
        self.cache
            .invalidate(&[EntityClass::Groups, EntityClass::Notifications]);
        Ok(group)
    }

    pub async fn invitations(&self, expense_id: u64) -> Result<Vec<Invitation>, ApiError>
    where
        A: InvitationApi,
    {
        let key = QueryKey::detail(EntityClass::Invitations, expense_id);
        self.cache
            .get_or_fetch(&key, || self.api.list_invitations(expense_id))
            .await
    }

    pub async fn create_invitation(
        &self,
        expense_id: u64,
        invitation: &NewInvitation,
    ) -> Result<Invitation, ApiError>
    where
        A: InvitationApi,
    {
        let created = self.api.create_invitation(expense_id, invitation).await?;
        self.cache
            .invalidate(&[EntityClass::Invitations, EntityClass::Notifications]);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::config::CacheWindows;
    use crate::model::AuthResponse;
    use crate::session::SessionStore;

    fn user(id: u64, name: &str) -> User {
        User {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            pix_key: format!("{}@pix", name.to_lowercase()),
        }
    }

    fn expense(id: u64, amount: i64, creator: User) -> Expense {
        Expense {
            id,
            description: "Churrasco".to_string(),
            amount: Money::from_cents(amount),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 10).unwrap(),
            creator,
            status: ExpenseStatus::Pending,
            created_at: Utc::now(),
            external_participants: Vec::new(),
        }
    }

    #[derive(Default)]
    struct FakeState {
        expenses: HashMap<u64, Expense>,
        shares: Vec<Share>,
        links: HashMap<Uuid, ExternalPayment>,
        debts: HashMap<u64, Debt>,
        next_id: u64,
        list_expense_calls: u64,
        fail_payment_links: bool,
        fail_mark_paid: bool,
        fail_status_change: bool,
    }

    #[derive(Clone, Default)]
    struct FakeApi {
        state: Arc<Mutex<FakeState>>,
    }

    impl FakeApi {
        fn insert_expense(&self, expense: Expense) {
            self.state.lock().unwrap().expenses.insert(expense.id, expense);
        }

        fn insert_link(&self, link: ExternalPayment) {
            self.state.lock().unwrap().links.insert(link.id, link);
        }

        fn insert_debt(&self, debt: Debt) {
            self.state.lock().unwrap().debts.insert(debt.id, debt);
        }
    }

    #[async_trait]
    impl ExpenseApi for FakeApi {
        async fn list_expenses(&self, _filter: &ExpenseFilter) -> Result<Vec<Expense>, ApiError> {
            let mut state = self.state.lock().unwrap();
            state.list_expense_calls += 1;
            let mut all: Vec<Expense> = state.expenses.values().cloned().collect();
            all.sort_by_key(|e| e.id);
            Ok(all)
        }

        async fn get_expense(&self, id: u64) -> Result<Expense, ApiError> {
            self.state
                .lock()
                .unwrap()
                .expenses
                .get(&id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(format!("expense {}", id)))
        }

        async fn create_expense(&self, new: &NewExpense) -> Result<Expense, ApiError> {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let expense = Expense {
                id: state.next_id,
                description: new.description.clone(),
                amount: new.amount,
                due_date: new.due_date,
                creator: user(new.creator_id, "Ana"),
                status: ExpenseStatus::Pending,
                created_at: Utc::now(),
                external_participants: Vec::new(),
            };
            state.expenses.insert(expense.id, expense.clone());
            Ok(expense)
        }

        async fn update_expense(&self, id: u64, patch: &ExpensePatch) -> Result<Expense, ApiError> {
            let mut state = self.state.lock().unwrap();
            let expense = state
                .expenses
                .get_mut(&id)
                .ok_or_else(|| ApiError::NotFound(format!("expense {}", id)))?;
            // Updates exactly what was patched; status is its own endpoint.
            if let Some(amount) = patch.amount {
                expense.amount = amount;
            }
            if let Some(desc) = &patch.description {
                expense.description = desc.clone();
            }
            Ok(expense.clone())
        }

        async fn delete_expense(&self, id: u64) -> Result<(), ApiError> {
            self.state.lock().unwrap().expenses.remove(&id);
            Ok(())
        }

        async fn mark_expense_paid(&self, id: u64) -> Result<Expense, ApiError> {
            let mut state = self.state.lock().unwrap();
            if state.fail_mark_paid {
                return Err(ApiError::Server {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            let expense = state
                .expenses
                .get_mut(&id)
                .ok_or_else(|| ApiError::NotFound(format!("expense {}", id)))?;
            expense.status = ExpenseStatus::Paid;
            Ok(expense.clone())
        }

        async fn reopen_expense(&self, id: u64) -> Result<Expense, ApiError> {
            let mut state = self.state.lock().unwrap();
            let expense = state
                .expenses
                .get_mut(&id)
                .ok_or_else(|| ApiError::NotFound(format!("expense {}", id)))?;
            expense.status = ExpenseStatus::Pending;
            Ok(expense.clone())
        }

        async fn set_expense_status(
            &self,
            id: u64,
            status: ExpenseStatus,
        ) -> Result<Expense, ApiError> {
            let mut state = self.state.lock().unwrap();
            if state.fail_status_change {
                return Err(ApiError::Server {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            let expense = state
                .expenses
                .get_mut(&id)
                .ok_or_else(|| ApiError::NotFound(format!("expense {}", id)))?;
            expense.status = status;
            Ok(expense.clone())
        }

        async fn list_shares(&self, expense_id: u64) -> Result<Vec<Share>, ApiError> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .shares
                .iter()
                .filter(|s| s.expense_id == expense_id)
                .cloned()
                .collect())
        }

        async fn create_share(&self, new: &NewShare) -> Result<Share, ApiError> {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let share = Share {
                id: state.next_id,
                expense_id: new.expense_id,
                user: user(new.user_id, "Membro"),
                amount: new.amount,
                paid: false,
                paid_at: None,
                payment_method: None,
            };
            state.shares.push(share.clone());
            Ok(share)
        }

        async fn split_equal_remote(
            &self,
            expense_id: u64,
            user_ids: &[u64],
        ) -> Result<Vec<Share>, ApiError> {
            let total = self.get_expense(expense_id).await?.amount;
            let participants: Vec<Participant> =
                user_ids.iter().map(|id| Participant::user(*id)).collect();
            let amounts = split::split_equal(total, &participants)?;

            let mut state = self.state.lock().unwrap();
            let mut shares = Vec::new();
            for entry in amounts {
                let Participant::User { id } = entry.participant else {
                    continue;
                };
                state.next_id += 1;
                let share = Share {
                    id: state.next_id,
                    expense_id,
                    user: user(id, "Membro"),
                    amount: entry.amount,
                    paid: false,
                    paid_at: None,
                    payment_method: None,
                };
                state.shares.push(share.clone());
                shares.push(share);
            }
            Ok(shares)
        }

        async fn split_percentage_remote(
            &self,
            expense_id: u64,
            entries: &[PercentShare],
        ) -> Result<Vec<Share>, ApiError> {
            let total = self.get_expense(expense_id).await?.amount;
            let weighted: Vec<(Participant, f64)> = entries
                .iter()
                .map(|e| (Participant::user(e.user_id), e.percent))
                .collect();
            let amounts = split::split_percentage(total, &weighted)?;

            let mut state = self.state.lock().unwrap();
            let mut shares = Vec::new();
            for entry in amounts {
                let Participant::User { id } = entry.participant else {
                    continue;
                };
                state.next_id += 1;
                let share = Share {
                    id: state.next_id,
                    expense_id,
                    user: user(id, "Membro"),
                    amount: entry.amount,
                    paid: false,
                    paid_at: None,
                    payment_method: None,
                };
                state.shares.push(share.clone());
                shares.push(share);
            }
            Ok(shares)
        }

        async fn mark_share_paid(
            &self,
            share_id: u64,
            payment: &PaymentRequest,
        ) -> Result<Share, ApiError> {
            let mut state = self.state.lock().unwrap();
            let share = state
                .shares
                .iter_mut()
                .find(|s| s.id == share_id)
                .ok_or_else(|| ApiError::NotFound(format!("share {}", share_id)))?;
            share.paid = true;
            share.paid_at = Some(Utc::now());
            share.payment_method = Some(payment.method.clone());
            Ok(share.clone())
        }

        async fn reopen_share(&self, share_id: u64) -> Result<Share, ApiError> {
            let mut state = self.state.lock().unwrap();
            let share = state
                .shares
                .iter_mut()
                .find(|s| s.id == share_id)
                .ok_or_else(|| ApiError::NotFound(format!("share {}", share_id)))?;
            share.paid = false;
            share.paid_at = None;
            Ok(share.clone())
        }
    }

    #[async_trait]
    impl PaymentLinkApi for FakeApi {
        async fn create_payment_link(
            &self,
            new: &NewPaymentLink,
        ) -> Result<PaymentLinkCreated, ApiError> {
            let mut state = self.state.lock().unwrap();
            if state.fail_payment_links {
                return Err(ApiError::Server {
                    status: 500,
                    message: "link service down".to_string(),
                });
            }
            let id = Uuid::new_v4();
            state.links.insert(
                id,
                ExternalPayment {
                    id,
                    participant_name: new.participant_name.clone(),
                    amount: new.amount,
                    expense_description: new.expense_description.clone(),
                    created_by: new.created_by.clone(),
                    created_at: Utc::now(),
                    due_date: new.due_date,
                    paid: false,
                    paid_at: None,
                    payment_method: None,
                    note: None,
                    expense_id: new.expense_id,
                },
            );
            Ok(PaymentLinkCreated {
                link_id: id,
                url: format!("https://racha.example/pagar/{}", id),
            })
        }

        async fn list_payment_links(
            &self,
            expense_id: u64,
        ) -> Result<Vec<ExternalPayment>, ApiError> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .links
                .values()
                .filter(|l| l.expense_id == expense_id)
                .cloned()
                .collect())
        }

        async fn get_payment_link(&self, link_id: Uuid) -> Result<ExternalPayment, ApiError> {
            self.state
                .lock()
                .unwrap()
                .links
                .get(&link_id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(format!("link {}", link_id)))
        }

        async fn confirm_payment_link(
            &self,
            link_id: Uuid,
            payment: &PaymentRequest,
        ) -> Result<ExternalPayment, ApiError> {
            let mut state = self.state.lock().unwrap();
            let link = state
                .links
                .get_mut(&link_id)
                .ok_or_else(|| ApiError::NotFound(format!("link {}", link_id)))?;
            if link.paid {
                return Err(ApiError::Remote {
                    status: 400,
                    code: None,
                    message: "Pagamento já confirmado".to_string(),
                });
            }
            link.paid = true;
            link.paid_at = Some(Utc::now());
            link.payment_method = Some(payment.method.clone());
            Ok(link.clone())
        }
    }

    #[async_trait]
    impl DebtApi for FakeApi {
        async fn list_debts(&self, filter: &DebtFilter) -> Result<Vec<Debt>, ApiError> {
            let state = self.state.lock().unwrap();
            let mut debts: Vec<Debt> = state
                .debts
                .values()
                .filter(|d| filter.paid.map_or(true, |p| d.paid == p))
                .cloned()
                .collect();
            debts.sort_by_key(|d| d.id);
            Ok(debts)
        }

        async fn create_debt(&self, _debt: &NewDebt) -> Result<Debt, ApiError> {
            unimplemented!("not used in these tests")
        }

        async fn update_debt(&self, _id: u64, _patch: &DebtPatch) -> Result<Debt, ApiError> {
            unimplemented!("not used in these tests")
        }

        async fn delete_debt(&self, id: u64) -> Result<(), ApiError> {
            self.state.lock().unwrap().debts.remove(&id);
            Ok(())
        }

        async fn mark_debt_paid(
            &self,
            id: u64,
            payment: &PaymentRequest,
        ) -> Result<Debt, ApiError> {
            let mut state = self.state.lock().unwrap();
            let debt = state
                .debts
                .get_mut(&id)
                .ok_or_else(|| ApiError::NotFound(format!("debt {}", id)))?;
            debt.paid = true;
            debt.paid_at = Some(Utc::now());
            debt.payment_method = Some(payment.method.clone());
            Ok(debt.clone())
        }

        async fn reopen_debt(&self, id: u64) -> Result<Debt, ApiError> {
            let mut state = self.state.lock().unwrap();
            let debt = state
                .debts
                .get_mut(&id)
                .ok_or_else(|| ApiError::NotFound(format!("debt {}", id)))?;
            debt.paid = false;
            debt.paid_at = None;
            Ok(debt.clone())
        }

        async fn balance(&self, _user_id: u64) -> Result<UserBalance, ApiError> {
            unimplemented!("not used in these tests")
        }
    }

    #[async_trait]
    impl AuthApi for FakeApi {
        async fn sign_in(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
            if credentials.password == "correta" {
                Ok(AuthResponse {
                    token: "tok-1".to_string(),
                    user: user(1, "Ana"),
                })
            } else {
                Err(ApiError::Unauthorized)
            }
        }

        async fn register(&self, _registration: &Registration) -> Result<AuthResponse, ApiError> {
            unimplemented!("not used in these tests")
        }
    }

    fn ledger_with(api: FakeApi) -> (Ledger<FakeApi>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let session = Arc::new(SessionStore::load(&dir.path().to_path_buf()));
        let cache = Arc::new(QueryCache::new(CacheWindows::default()));
        (Ledger::new(api, cache, session), dir)
    }

    async fn signed_in_ledger(api: FakeApi) -> (Ledger<FakeApi>, tempfile::TempDir) {
        let (ledger, dir) = ledger_with(api);
        ledger
            .session
            .set(Session {
                token: "tok-1".to_string(),
                user: user(1, "Ana"),
            })
            .await;
        (ledger, dir)
    }

    fn draft(cents: i64) -> ExpenseDraft {
        ExpenseDraft {
            description: "Churrasco".to_string(),
            amount: Money::from_cents(cents),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 10).unwrap(),
            group_id: None,
        }
    }

    #[tokio::test]
    async fn split_with_externals_creates_shares_and_links() {
        let api = FakeApi::default();
        let state = api.state.clone();
        let (ledger, _dir) = signed_in_ledger(api).await;

        let plan = SplitPlan::Equal(vec![
            Participant::user(1),
            Participant::user(2),
            Participant::external("Maria"),
        ]);
        let outcome = ledger
            .create_expense_split(draft(10_000), &plan)
            .await
            .unwrap();

        assert_eq!(outcome.shares.len(), 2);
        assert_eq!(outcome.payment_links.len(), 1);

        // Reconciled amounts: 33.34 + 33.33 + 33.33.
        assert_eq!(outcome.shares[0].amount, Money::from_cents(3334));
        assert_eq!(outcome.shares[1].amount, Money::from_cents(3333));
        let state = state.lock().unwrap();
        let link = state.links.values().next().unwrap();
        assert_eq!(link.amount, Money::from_cents(3333));
        assert_eq!(link.participant_name, "Maria");
    }

    #[tokio::test]
    async fn all_user_split_uses_the_server() {
        let api = FakeApi::default();
        let (ledger, _dir) = signed_in_ledger(api).await;

        let plan = SplitPlan::Percentage(vec![
            (Participant::user(1), 70.0),
            (Participant::user(2), 30.0),
        ]);
        let outcome = ledger
            .create_expense_split(draft(1001), &plan)
            .await
            .unwrap();

        assert_eq!(outcome.shares[0].amount, Money::from_cents(701));
        assert_eq!(outcome.shares[1].amount, Money::from_cents(300));
        assert!(outcome.payment_links.is_empty());
    }

    #[tokio::test]
    async fn invalid_plan_fails_before_any_request() {
        let api = FakeApi::default();
        let state = api.state.clone();
        let (ledger, _dir) = signed_in_ledger(api).await;

        let plan = SplitPlan::Percentage(vec![
            (Participant::user(1), 60.0),
            (Participant::user(2), 30.0),
        ]);
        let err = ledger
            .create_expense_split(draft(10_000), &plan)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert!(state.lock().unwrap().expenses.is_empty());
    }

    #[tokio::test]
    async fn link_failure_reports_partial_completion() {
        let api = FakeApi::default();
        api.state.lock().unwrap().fail_payment_links = true;
        let state = api.state.clone();
        let (ledger, _dir) = signed_in_ledger(api).await;

        let plan = SplitPlan::Equal(vec![
            Participant::user(1),
            Participant::external("Maria"),
        ]);
        let err = ledger
            .create_expense_split(draft(5000), &plan)
            .await
            .unwrap_err();

        match err {
            ApiError::Partial { completed, .. } => {
                assert_eq!(completed, CompletedStep::ExpenseCreated);
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
        // The expense itself is on the server.
        assert_eq!(state.lock().unwrap().expenses.len(), 1);
    }

    #[tokio::test]
    async fn confirming_a_paid_link_is_not_an_error() {
        let api = FakeApi::default();
        let ana = user(1, "Ana");
        api.insert_expense(expense(10, 6000, ana.clone()));
        let link_id = Uuid::new_v4();
        api.insert_link(ExternalPayment {
            id: link_id,
            participant_name: "Maria".to_string(),
            amount: Money::from_cents(3000),
            expense_description: "Churrasco".to_string(),
            created_by: "Ana".to_string(),
            created_at: Utc::now(),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 10).unwrap(),
            paid: true,
            paid_at: Some(Utc::now()),
            payment_method: Some("PIX".to_string()),
            note: None,
            expense_id: 10,
        });
        let (ledger, _dir) = signed_in_ledger(api).await;

        let outcome = ledger
            .confirm_external_payment(link_id, &PaymentRequest::new("PIX"))
            .await
            .unwrap();
        assert!(matches!(outcome, ConfirmOutcome::AlreadyPaid(_)));
    }

    #[tokio::test]
    async fn full_payment_marks_the_expense_paid() {
        let api = FakeApi::default();
        let ana = user(1, "Ana");
        api.insert_expense(expense(10, 3000, ana));
        let link_id = Uuid::new_v4();
        api.insert_link(ExternalPayment {
            id: link_id,
            participant_name: "Maria".to_string(),
            amount: Money::from_cents(3000),
            expense_description: "Churrasco".to_string(),
            created_by: "Ana".to_string(),
            created_at: Utc::now(),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 10).unwrap(),
            paid: false,
            paid_at: None,
            payment_method: None,
            note: None,
            expense_id: 10,
        });
        let (ledger, _dir) = signed_in_ledger(api).await;

        let outcome = ledger
            .confirm_external_payment(link_id, &PaymentRequest::new("PIX"))
            .await
            .unwrap();

        match outcome {
            ConfirmOutcome::Confirmed { expense, .. } => {
                assert_eq!(expense.status, ExpenseStatus::Paid);
            }
            other => panic!("expected confirmation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn partial_payment_reduces_the_residual_and_marks_partially_paid() {
        let api = FakeApi::default();
        let ana = user(1, "Ana");
        api.insert_expense(expense(10, 9000, ana));
        let (ledger, _dir) = signed_in_ledger(api).await;

        let updated = ledger
            .apply_external_payment(10, Money::from_cents(3000))
            .await
            .unwrap();
        assert_eq!(updated.amount, Money::from_cents(6000));
        assert_eq!(updated.status, ExpenseStatus::PartiallyPaid);

        // A second payment covering the residual settles the expense.
        let settled = ledger
            .apply_external_payment(10, Money::from_cents(6000))
            .await
            .unwrap();
        assert_eq!(settled.amount, Money::ZERO);
        assert_eq!(settled.status, ExpenseStatus::Paid);
    }

    #[tokio::test]
    async fn overpayment_clamps_at_zero_and_pays() {
        let api = FakeApi::default();
        let ana = user(1, "Ana");
        api.insert_expense(expense(10, 9000, ana));
        let (ledger, _dir) = signed_in_ledger(api).await;

        let updated = ledger
            .apply_external_payment(10, Money::from_cents(12_000))
            .await
            .unwrap();
        assert_eq!(updated.status, ExpenseStatus::Paid);
        assert_eq!(updated.amount, Money::ZERO);
    }

    #[tokio::test]
    async fn failed_partial_transition_reports_amount_reduced() {
        let api = FakeApi::default();
        let ana = user(1, "Ana");
        api.insert_expense(expense(10, 9000, ana));
        api.state.lock().unwrap().fail_status_change = true;
        let state = api.state.clone();
        let (ledger, _dir) = signed_in_ledger(api).await;

        let err = ledger
            .apply_external_payment(10, Money::from_cents(3000))
            .await
            .unwrap_err();
        match err {
            ApiError::Partial { completed, .. } => {
                assert_eq!(completed, CompletedStep::AmountReduced);
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
        // The amount update already committed server-side.
        assert_eq!(
            state.lock().unwrap().expenses[&10].amount,
            Money::from_cents(6000)
        );
    }

    #[tokio::test]
    async fn failed_status_update_reports_amount_reduced() {
        let api = FakeApi::default();
        let ana = user(1, "Ana");
        api.insert_expense(expense(10, 3000, ana));
        api.state.lock().unwrap().fail_mark_paid = true;
        let (ledger, _dir) = signed_in_ledger(api).await;

        let err = ledger
            .apply_external_payment(10, Money::from_cents(3000))
            .await
            .unwrap_err();
        match err {
            ApiError::Partial { completed, .. } => {
                assert_eq!(completed, CompletedStep::AmountReduced);
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn reopening_someone_elses_expense_is_rejected_locally() {
        let api = FakeApi::default();
        let bruno = user(2, "Bruno");
        api.insert_expense(expense(10, 3000, bruno));
        let (ledger, _dir) = signed_in_ledger(api).await;

        let err = ledger.reopen_expense(10).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn cached_lists_refetch_after_invalidation() {
        let api = FakeApi::default();
        let ana = user(1, "Ana");
        api.insert_expense(expense(10, 3000, ana));
        let state = api.state.clone();
        let (ledger, _dir) = signed_in_ledger(api).await;
        let filter = ExpenseFilter::default();

        ledger.expenses(&filter).await.unwrap();
        ledger.expenses(&filter).await.unwrap();
        assert_eq!(state.lock().unwrap().list_expense_calls, 1);

        ledger.delete_expense(10).await.unwrap();

        let after = ledger.expenses(&filter).await.unwrap();
        assert!(after.is_empty());
        assert_eq!(state.lock().unwrap().list_expense_calls, 2);
    }

    #[tokio::test]
    async fn settle_debts_with_pays_only_that_counterparty() {
        let api = FakeApi::default();
        let ana = user(1, "Ana");
        let bruno = user(2, "Bruno");
        let clara = user(3, "Clara");
        let debt = |id, debtor: &User, creditor: &User, cents| Debt {
            id,
            description: format!("divida {}", id),
            amount: Money::from_cents(cents),
            debtor: debtor.clone(),
            creditor: creditor.clone(),
            created_at: Utc::now(),
            due_date: None,
            paid: false,
            paid_at: None,
            payment_method: None,
        };
        api.insert_debt(debt(1, &ana, &bruno, 1000));
        api.insert_debt(debt(2, &ana, &bruno, 2500));
        api.insert_debt(debt(3, &ana, &clara, 4000));
        api.insert_debt(debt(4, &bruno, &ana, 9000));
        let state = api.state.clone();
        let (ledger, _dir) = signed_in_ledger(api).await;

        let receipt = ledger.settle_debts_with(2).await.unwrap();
        assert_eq!(receipt.settled.len(), 2);
        assert_eq!(receipt.total, Money::from_cents(3500));

        let state = state.lock().unwrap();
        assert!(state.debts[&1].paid);
        assert!(state.debts[&2].paid);
        assert_eq!(state.debts[&1].payment_method.as_deref(), Some("QUITACAO"));
        assert!(!state.debts[&3].paid);
        assert!(!state.debts[&4].paid);
    }

    #[tokio::test]
    async fn overdue_detection_uses_fresh_server_state() {
        let api = FakeApi::default();
        let ana = user(1, "Ana");
        let mut due_yesterday = expense(10, 3000, ana.clone());
        due_yesterday.due_date = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        let mut due_today = expense(11, 3000, ana);
        due_today.due_date = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        api.insert_expense(due_yesterday);
        api.insert_expense(due_today);
        let (ledger, _dir) = signed_in_ledger(api).await;

        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let overdue = ledger.overdue_expenses(today).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, 10);
    }

    #[tokio::test]
    async fn confirm_overdue_transitions_past_due_expenses() {
        let api = FakeApi::default();
        let ana = user(1, "Ana");
        let mut past_due = expense(10, 3000, ana.clone());
        past_due.due_date = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();
        api.insert_expense(past_due);
        api.insert_expense(expense(11, 3000, ana));
        let state = api.state.clone();
        let (ledger, _dir) = signed_in_ledger(api).await;

        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let updated = ledger.confirm_overdue(today).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].status, ExpenseStatus::Overdue);

        let state = state.lock().unwrap();
        assert_eq!(state.expenses[&10].status, ExpenseStatus::Overdue);
        assert_eq!(state.expenses[&11].status, ExpenseStatus::Pending);
    }

    #[tokio::test]
    async fn sign_in_stores_the_session_and_sign_out_clears_it() {
        let api = FakeApi::default();
        let (ledger, _dir) = ledger_with(api);

        let credentials = Credentials {
            email: "ana@example.com".to_string(),
            password: "correta".to_string(),
        };
        let signed_in = ledger.sign_in(&credentials).await.unwrap();
        assert_eq!(signed_in.id, 1);
        assert!(ledger.session().current().await.is_some());

        ledger.sign_out().await;
        assert!(ledger.session().current().await.is_none());
    }

    #[tokio::test]
    async fn bad_credentials_do_not_create_a_session() {
        let api = FakeApi::default();
        let (ledger, _dir) = ledger_with(api);

        let credentials = Credentials {
            email: "ana@example.com".to_string(),
            password: "errada".to_string(),
        };
        assert!(matches!(
            ledger.sign_in(&credentials).await,
            Err(ApiError::Unauthorized)
        ));
        assert!(ledger.session().current().await.is_none());
    }
}
