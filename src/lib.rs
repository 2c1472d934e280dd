//! # RachaConta Client
//!
//! Client SDK for the RachaConta shared-expense service: who paid, who
//! owes whom, and how a bill gets divided.
//!
//! This library provides:
//! - A pure splitting engine with deterministic cent reconciliation
//! - Balance and due-date aggregation over expenses, shares and debts
//! - A typed HTTP client with silent token refresh on 401
//! - A freshness-window query cache invalidated per entity class
//! - High-level flows (create-and-split, external payment confirmation,
//!   debt settlement) with partial-failure reporting
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────────────────────────┐
//!        │             Ledger               │
//!        │   (flows: split, settle, read)   │
//!        └───────┬──────────┬───────────────┘
//!                │          │
//!                ▼          ▼
//!        ┌────────────┐  ┌────────────┐
//!        │ QueryCache │  │ ApiClient  │──► RachaConta server
//!        └────────────┘  └─────┬──────┘
//!                              │
//!                        ┌─────▼──────┐
//!                        │ Session    │
//!                        │ Store      │
//!                        └────────────┘
//! ```
//!
//! ## Modules
//! - `money`, `split`, `settlement`: pure domain logic, no I/O
//! - `api`: endpoint traits and the reqwest-backed client
//! - `cache`, `session`: remote-state cache and persisted session
//! - `flows`: the application-facing facade
//! - `poll`: background unread-notification polling

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod flows;
pub mod model;
pub mod money;
pub mod poll;
pub mod session;
pub mod settlement;
pub mod split;

pub use api::ApiClient;
pub use cache::{EntityClass, QueryCache, QueryKey};
pub use config::{CacheWindows, Config};
pub use error::{ApiError, CompletedStep};
pub use flows::{ConfirmOutcome, ExpenseDraft, Ledger, SplitOutcome, SplitPlan};
pub use money::Money;
pub use session::{Session, SessionStore};
pub use split::{Participant, ShareAmount};
