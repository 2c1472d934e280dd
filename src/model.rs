//! Wire data model for the RachaConta HTTP API.
//!
//! Field names follow the server's Portuguese JSON contract via serde
//! renames; Rust-side names are English. Due dates travel as plain
//! `YYYY-MM-DD` calendar dates (`chrono::NaiveDate`), never as timestamps,
//! which keeps overdue comparisons immune to timezone shifting.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "chavePix")]
    pub pix_key: String,
}

/// Lifecycle status of an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseStatus {
    #[serde(rename = "PENDENTE")]
    Pending,
    #[serde(rename = "PAGA")]
    Paid,
    #[serde(rename = "VENCIDA")]
    Overdue,
    #[serde(rename = "PARCIALMENTE_PAGA")]
    PartiallyPaid,
}

/// A shared monetary obligation ("conta") with a due date and owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: u64,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "valor")]
    pub amount: Money,
    #[serde(rename = "vencimento")]
    pub due_date: NaiveDate,
    #[serde(rename = "criador")]
    pub creator: User,
    pub status: ExpenseStatus,
    #[serde(rename = "dataCriacao")]
    pub created_at: DateTime<Utc>,
    /// Named external participants attached to the expense. A first-class
    /// relation; never derived from the description text.
    #[serde(rename = "participantesExternos", default)]
    pub external_participants: Vec<String>,
}

/// Request body for creating an expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "valor")]
    pub amount: Money,
    #[serde(rename = "vencimento")]
    pub due_date: NaiveDate,
    #[serde(rename = "criadorId")]
    pub creator_id: u64,
    #[serde(rename = "grupoId", default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u64>,
}

/// Partial update for an expense. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpensePatch {
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "valor", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(rename = "vencimento", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl ExpensePatch {
    pub fn amount(amount: Money) -> Self {
        ExpensePatch {
            amount: Some(amount),
            ..Default::default()
        }
    }
}

/// Server-side list filter for expenses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    pub paid: Option<bool>,
    pub due_from: Option<NaiveDate>,
    pub due_until: Option<NaiveDate>,
}

impl ExpenseFilter {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(paid) = self.paid {
            params.push(("paga", paid.to_string()));
        }
        if let Some(from) = self.due_from {
            params.push(("vencimentoInicial", from.to_string()));
        }
        if let Some(until) = self.due_until {
            params.push(("vencimentoFinal", until.to_string()));
        }
        params
    }

    /// Stable string form used as the cache key parameter.
    pub fn cache_params(&self) -> String {
        self.query()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// One system user's portion of an expense ("divisão").
///
/// Shares exist only for system users; external participants are tracked
/// as [`ExternalPayment`] records instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub id: u64,
    #[serde(rename = "contaId")]
    pub expense_id: u64,
    #[serde(rename = "usuario")]
    pub user: User,
    #[serde(rename = "valor")]
    pub amount: Money,
    #[serde(rename = "pago")]
    pub paid: bool,
    #[serde(rename = "dataPagamento", default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(rename = "formaPagamento", default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

/// Request body for creating a single share with an explicit amount.
#[derive(Debug, Clone, Serialize)]
pub struct NewShare {
    #[serde(rename = "contaId")]
    pub expense_id: u64,
    #[serde(rename = "usuarioId")]
    pub user_id: u64,
    #[serde(rename = "valor")]
    pub amount: Money,
}

/// One entry of a percentage-split request.
#[derive(Debug, Clone, Serialize)]
pub struct PercentShare {
    #[serde(rename = "usuarioId")]
    pub user_id: u64,
    #[serde(rename = "percentual")]
    pub percent: f64,
}

/// Payment details recorded when settling a share, debt or link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(rename = "formaPagamento")]
    pub method: String,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PaymentRequest {
    pub fn new(method: impl Into<String>) -> Self {
        PaymentRequest {
            method: method.into(),
            note: None,
        }
    }
}

/// A directed peer-to-peer obligation ("dívida"). Debtor and creditor are
/// always distinct system users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub id: u64,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "valor")]
    pub amount: Money,
    #[serde(rename = "usuarioDevedor")]
    pub debtor: User,
    #[serde(rename = "usuarioCredor")]
    pub creditor: User,
    #[serde(rename = "dataCriacao")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "dataVencimento", default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "paga")]
    pub paid: bool,
    #[serde(rename = "dataPagamento", default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(rename = "formaPagamento", default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

/// Request body for creating a debt.
#[derive(Debug, Clone, Serialize)]
pub struct NewDebt {
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "valor")]
    pub amount: Money,
    #[serde(rename = "usuarioDevedorId")]
    pub debtor_id: u64,
    #[serde(rename = "usuarioCredorId")]
    pub creditor_id: u64,
    #[serde(rename = "dataVencimento", default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// Partial update for a debt. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DebtPatch {
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "valor", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(rename = "dataVencimento", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebtFilter {
    pub paid: Option<bool>,
}

impl DebtFilter {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        self.paid
            .map(|paid| vec![("paga", paid.to_string())])
            .unwrap_or_default()
    }

    pub fn cache_params(&self) -> String {
        self.query()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// The server's net-balance view for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBalance {
    #[serde(rename = "usuarioId")]
    pub user_id: u64,
    #[serde(rename = "totalDevendo")]
    pub total_owed: Money,
    #[serde(rename = "totalRecebendo")]
    pub total_receivable: Money,
    #[serde(rename = "saldoLiquido")]
    pub net: Money,
}

/// Friendship lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FriendshipStatus {
    #[serde(rename = "PENDENTE")]
    Pending,
    #[serde(rename = "ACEITA")]
    Accepted,
    #[serde(rename = "REJEITADA")]
    Rejected,
    #[serde(rename = "BLOQUEADA")]
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friendship {
    pub id: u64,
    #[serde(rename = "solicitante")]
    pub requester: User,
    #[serde(rename = "convidado")]
    pub addressee: User,
    pub status: FriendshipStatus,
    #[serde(rename = "dataSolicitacao")]
    pub requested_at: DateTime<Utc>,
    #[serde(rename = "dataResposta", default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

/// A group of users sharing expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "criador")]
    pub creator: User,
    #[serde(rename = "membros")]
    pub members: Vec<User>,
    #[serde(rename = "dataCriacao")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "ativo")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGroup {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "membrosIniciais")]
    pub initial_members: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MembershipAction {
    #[serde(rename = "ADICIONAR")]
    Add,
    #[serde(rename = "REMOVER")]
    Remove,
}

#[derive(Debug, Clone, Serialize)]
pub struct MembershipChange {
    #[serde(rename = "usuarioIds")]
    pub user_ids: Vec<u64>,
    #[serde(rename = "acao")]
    pub action: MembershipAction,
}

/// Invitation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvitationStatus {
    #[serde(rename = "PENDENTE")]
    Pending,
    #[serde(rename = "ACEITO")]
    Accepted,
    #[serde(rename = "REJEITADO")]
    Rejected,
    #[serde(rename = "EXPIRADO")]
    Expired,
}

/// An email invitation to join a split on an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: u64,
    pub token: String,
    #[serde(rename = "emailConvidado")]
    pub invitee_email: String,
    #[serde(rename = "nomeConvidado")]
    pub invitee_name: String,
    #[serde(rename = "valorSugerido", default, skip_serializing_if = "Option::is_none")]
    pub suggested_amount: Option<Money>,
    #[serde(rename = "mensagem", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: InvitationStatus,
    #[serde(rename = "dataConvite")]
    pub invited_at: DateTime<Utc>,
    #[serde(rename = "dataExpiracao")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "contaId")]
    pub expense_id: u64,
    #[serde(rename = "contaDescricao")]
    pub expense_description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewInvitation {
    #[serde(rename = "emailConvidado")]
    pub invitee_email: String,
    #[serde(rename = "nomeConvidado")]
    pub invitee_name: String,
    #[serde(rename = "valorSugerido", skip_serializing_if = "Option::is_none")]
    pub suggested_amount: Option<Money>,
    #[serde(rename = "mensagem", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "diasValidadeConvite", skip_serializing_if = "Option::is_none")]
    pub valid_days: Option<u32>,
}

/// Notification categories pushed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "CONTA_VENCENDO")]
    ExpenseDueSoon,
    #[serde(rename = "CONTA_VENCIDA")]
    ExpenseOverdue,
    #[serde(rename = "DIVIDA_PENDENTE")]
    DebtPending,
    #[serde(rename = "DIVISAO_PENDENTE")]
    SharePending,
    #[serde(rename = "PAGAMENTO_RECEBIDO")]
    PaymentReceived,
    #[serde(rename = "CONVITE_RECEBIDO")]
    InvitationReceived,
    #[serde(rename = "CONTA_CRIADA")]
    ExpenseCreated,
    #[serde(rename = "LEMBRETE_PAGAMENTO")]
    PaymentReminder,
    #[serde(rename = "SISTEMA")]
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NotificationPriority {
    #[serde(rename = "BAIXA")]
    Low,
    #[serde(rename = "MEDIA")]
    Medium,
    #[serde(rename = "ALTA")]
    High,
    #[serde(rename = "URGENTE")]
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "mensagem")]
    pub message: String,
    #[serde(rename = "tipo")]
    pub kind: NotificationKind,
    #[serde(rename = "prioridade")]
    pub priority: NotificationPriority,
    #[serde(rename = "dataCriacao")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "lida")]
    pub read: bool,
    #[serde(rename = "dataLeitura", default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(rename = "referenciaId", default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<u64>,
}

/// Unread counter, polled on an interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    #[serde(rename = "naoLidas")]
    pub unread: u64,
    #[serde(rename = "temNovas")]
    pub has_new: bool,
}

/// Record behind a one-time external payment-confirmation link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalPayment {
    pub id: Uuid,
    #[serde(rename = "nomeParticipante")]
    pub participant_name: String,
    #[serde(rename = "valor")]
    pub amount: Money,
    #[serde(rename = "descricaoDespesa")]
    pub expense_description: String,
    #[serde(rename = "criadoPor")]
    pub created_by: String,
    #[serde(rename = "dataCriacao")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "dataVencimento")]
    pub due_date: NaiveDate,
    #[serde(rename = "pago")]
    pub paid: bool,
    #[serde(rename = "dataPagamento", default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(rename = "formaPagamento", default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(rename = "contaId")]
    pub expense_id: u64,
}

/// Request body for minting an external payment link.
#[derive(Debug, Clone, Serialize)]
pub struct NewPaymentLink {
    #[serde(rename = "nomeParticipante")]
    pub participant_name: String,
    #[serde(rename = "valor")]
    pub amount: Money,
    #[serde(rename = "descricaoDespesa")]
    pub expense_description: String,
    #[serde(rename = "contaId")]
    pub expense_id: u64,
    #[serde(rename = "criadoPorId")]
    pub created_by_id: u64,
    #[serde(rename = "criadoPor")]
    pub created_by: String,
    #[serde(rename = "dataVencimento")]
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLinkCreated {
    #[serde(rename = "linkId")]
    pub link_id: Uuid,
    pub url: String,
}

/// Login credentials.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
}

/// Registration payload.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
    #[serde(rename = "chavePix")]
    pub pix_key: String,
}

/// Successful authentication response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "usuario")]
    pub user: User,
}

/// Error body returned by the server on 4xx/5xx.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
}
