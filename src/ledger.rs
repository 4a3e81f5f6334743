//! In-memory ledger for the active session.
//!
//! The ledger owns the ordered transaction sequence, keeps derived views
//! current as it changes, and coordinates with a [`TransactionStore`]. Store
//! failures never escape as errors: they are logged and reported as a
//! [`Notice`] while the ledger keeps its previous contents.
use crate::core::aggregation::{BalanceOrder, BalancePoint, LedgerSummary, Totals};
use crate::core::error::LedgerError;
use crate::core::session::Session;
use crate::core::store::TransactionStore;
use crate::core::transaction::Transaction;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Lifecycle of the most recent fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Loaded,
    Failed(LedgerError),
}

/// Whether an entry is known to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncState {
    Synced,
    /// Appended locally, remote write not yet acknowledged.
    Pending,
    /// The remote write failed; the entry exists only locally.
    Unsynced(LedgerError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub transaction: Transaction,
    pub sync: SyncState,
    handle: EntryHandle,
}

impl LedgerEntry {
    pub fn handle(&self) -> EntryHandle {
        self.handle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-facing outcome of a ledger operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        let notice = Self {
            level: NoticeLevel::Success,
            message: message.into(),
        };
        info!("{}", notice.message);
        notice
    }

    pub fn error(message: impl Into<String>, cause: &LedgerError) -> Self {
        let notice = Self {
            level: NoticeLevel::Error,
            message: message.into(),
        };
        error!(error = %cause, "{}", notice.message);
        notice
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Identifies one fetch issued by [`LedgerState::begin_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Identifies one entry for as long as it stays in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHandle(u64);

pub struct LedgerState {
    entries: Vec<LedgerEntry>,
    summary: LedgerSummary,
    status: FetchStatus,
    latest_fetch: u64,
    next_entry: u64,
    balance_order: BalanceOrder,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new(BalanceOrder::default())
    }
}

impl LedgerState {
    pub fn new(balance_order: BalanceOrder) -> Self {
        Self {
            entries: Vec::new(),
            summary: LedgerSummary::new(),
            status: FetchStatus::Idle,
            latest_fetch: 0,
            next_entry: 0,
            balance_order,
        }
    }

    /// Replaces the whole ledger. Loaded transactions count as synced.
    pub fn load(&mut self, transactions: Vec<Transaction>) {
        self.summary = LedgerSummary::from_transactions(&transactions);
        let mut entries = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            let handle = self.issue_handle();
            entries.push(LedgerEntry {
                transaction,
                sync: SyncState::Synced,
                handle,
            });
        }
        self.entries = entries;
        debug!("Ledger loaded with {} transactions", self.entries.len());
    }

    /// Marks a fetch as in flight. Only the most recently issued ticket is
    /// honoured by [`finish_fetch`](Self::finish_fetch).
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.latest_fetch += 1;
        self.status = FetchStatus::Loading;
        FetchTicket(self.latest_fetch)
    }

    /// Applies the outcome of a fetch.
    ///
    /// Returns `None` when a newer fetch has been issued since `ticket`; the
    /// stale result is dropped and the ledger is left untouched.
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Transaction>, LedgerError>,
    ) -> Option<Notice> {
        if ticket.0 != self.latest_fetch {
            debug!(
                "Discarding stale fetch {} (latest is {})",
                ticket.0, self.latest_fetch
            );
            return None;
        }

        Some(match result {
            Ok(transactions) => {
                self.load(transactions);
                self.status = FetchStatus::Loaded;
                Notice::success("Transactions Fetched!")
            }
            Err(e) => {
                let notice = Notice::error("Error fetching transactions.", &e);
                self.status = FetchStatus::Failed(e);
                notice
            }
        })
    }

    /// Fetches the session user's transactions and replaces the ledger.
    ///
    /// Returns `None` when the result was superseded by a newer fetch.
    pub async fn fetch(
        &mut self,
        store: &dyn TransactionStore,
        session: &Session,
    ) -> Option<Notice> {
        let user = match session.user() {
            Ok(user) => user,
            Err(e) => return Some(Notice::error("User is not authenticated", &e)),
        };

        let ticket = self.begin_fetch();
        let result = store.fetch_all(user).await;
        self.finish_fetch(ticket, result)
    }

    fn issue_handle(&mut self) -> EntryHandle {
        self.next_entry += 1;
        EntryHandle(self.next_entry)
    }

    fn position(&self, handle: EntryHandle) -> Option<usize> {
        self.entries.iter().rposition(|e| e.handle == handle)
    }

    /// Appends `transaction` without waiting for the store.
    pub fn add_local(&mut self, transaction: Transaction) -> EntryHandle {
        let handle = self.issue_handle();
        self.summary.apply(&transaction);
        self.entries.push(LedgerEntry {
            transaction,
            sync: SyncState::Pending,
            handle,
        });
        handle
    }

    /// Applies the store's answer to a pending entry.
    ///
    /// A rejected identity removes the entry again; any other failure leaves
    /// it in place marked unsynced.
    fn settle(
        &mut self,
        handle: EntryHandle,
        result: Result<String, LedgerError>,
    ) -> Result<(), LedgerError> {
        let Some(index) = self.position(handle) else {
            return Err(LedgerError::WriteError(format!(
                "no ledger entry for handle {}",
                handle.0
            )));
        };

        match result {
            Ok(id) => {
                debug!("Document written with ID: {}", id);
                let entry = &mut self.entries[index];
                entry.transaction = entry.transaction.clone().with_id(id);
                entry.sync = SyncState::Synced;
                Ok(())
            }
            Err(LedgerError::Authentication) => {
                self.entries.remove(index);
                self.summary = LedgerSummary::from_transactions(
                    self.entries.iter().map(|e| &e.transaction),
                );
                Err(LedgerError::Authentication)
            }
            Err(e) => {
                self.entries[index].sync = SyncState::Unsynced(e.clone());
                Err(e)
            }
        }
    }

    /// Records the store's answer for an optimistically appended entry.
    pub fn confirm(&mut self, handle: EntryHandle, result: Result<String, LedgerError>) -> Notice {
        match self.settle(handle, result) {
            Ok(()) => Notice::success("Transaction Added!"),
            Err(e) => Notice::error("Couldn't add transaction", &e),
        }
    }

    /// Appends `transaction` locally, then persists it.
    ///
    /// An unauthenticated session aborts before the ledger is touched.
    pub async fn add(
        &mut self,
        store: &dyn TransactionStore,
        session: &Session,
        transaction: Transaction,
    ) -> Notice {
        let user = match session.user() {
            Ok(user) => user,
            Err(e) => return Notice::error("User is not authenticated", &e),
        };

        let handle = self.add_local(transaction.clone());
        let result = store.append(user, &transaction).await;
        self.confirm(handle, result)
    }

    /// Appends several transactions in order, reporting a single notice.
    ///
    /// The batch stops at the first rejected identity; the remaining
    /// transactions are not added.
    pub async fn add_many(
        &mut self,
        store: &dyn TransactionStore,
        session: &Session,
        transactions: Vec<Transaction>,
    ) -> Notice {
        let user = match session.user() {
            Ok(user) => user,
            Err(e) => return Notice::error("User is not authenticated", &e),
        };

        let total = transactions.len();
        let mut added = 0;
        let mut last_error = None;
        for transaction in transactions {
            let handle = self.add_local(transaction.clone());
            let result = store.append(user, &transaction).await;
            match self.settle(handle, result) {
                Ok(()) => added += 1,
                Err(e) => {
                    warn!(error = %e, "Couldn't add transaction");
                    let stop = matches!(e, LedgerError::Authentication);
                    last_error = Some(e);
                    if stop {
                        break;
                    }
                }
            }
        }

        match last_error {
            None => Notice::success(format!("{total} transactions added")),
            Some(e) => Notice::error(
                format!("Couldn't add {} of {total} transactions", total - added),
                &e,
            ),
        }
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.entries.iter().map(|e| e.transaction.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unsynced_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.sync, SyncState::Unsynced(_)))
            .count()
    }

    pub fn totals(&self) -> Totals {
        self.summary.totals()
    }

    pub fn balance_series(&self) -> Vec<BalancePoint> {
        self.summary.balance_series(self.balance_order)
    }

    pub fn spending_by_category(&self) -> &HashMap<String, Decimal> {
        self.summary.spending_by_category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregation::{compute_balance_series, compute_totals};
    use crate::core::session::UserId;
    use crate::providers::remote_store::RemoteStore;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn scenario() -> Vec<Transaction> {
        vec![
            Transaction::income(date("2024-01-05"), dec("1000"), "salary", "Jan pay").unwrap(),
            Transaction::expense(date("2024-01-10"), dec("200"), "food", "groceries").unwrap(),
            Transaction::expense(date("2024-02-01"), dec("50"), "food", "snacks").unwrap(),
        ]
    }

    fn train() -> Transaction {
        Transaction::expense(date("2024-02-03"), dec("25"), "travel", "train").unwrap()
    }

    fn session() -> Session {
        Session::authenticated("alice").unwrap()
    }

    // Store whose reads and writes can be switched to fail
    #[derive(Default)]
    struct FlakyStore {
        fail_fetch: AtomicBool,
        fail_append: AtomicBool,
        fetched: Mutex<Vec<Transaction>>,
        appended: Mutex<Vec<Transaction>>,
    }

    #[async_trait]
    impl TransactionStore for FlakyStore {
        async fn fetch_all(&self, _user: &UserId) -> Result<Vec<Transaction>, LedgerError> {
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(LedgerError::StoreUnavailable("offline".to_string()));
            }
            Ok(self.fetched.lock().unwrap().clone())
        }

        async fn append(
            &self,
            _user: &UserId,
            transaction: &Transaction,
        ) -> Result<String, LedgerError> {
            if self.fail_append.load(Ordering::SeqCst) {
                return Err(LedgerError::WriteError("rejected".to_string()));
            }
            let mut appended = self.appended.lock().unwrap();
            appended.push(transaction.clone());
            Ok(format!("doc-{}", appended.len()))
        }
    }

    async fn rejecting_remote(status: u16) -> (MockServer, RemoteStore) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/alice/transactions"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;
        let store = RemoteStore::new(&mock_server.uri(), Some("expired".to_string()));
        (mock_server, store)
    }

    #[test]
    fn test_load_replaces_ledger() {
        let mut ledger = LedgerState::default();
        ledger.load(scenario());
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.totals().net, dec("750"));

        let only = vec![Transaction::income(date("2024-03-01"), dec("5"), "misc", "found").unwrap()];
        ledger.load(only.clone());
        assert_eq!(ledger.transactions(), only);
        assert_eq!(ledger.totals(), compute_totals(&only));
        assert_eq!(ledger.balance_series(), compute_balance_series(&only));
    }

    #[test]
    fn test_add_local_updates_views_immediately() {
        let mut ledger = LedgerState::default();
        ledger.load(scenario());

        let handle = ledger.add_local(train());

        assert_eq!(ledger.totals().expense, dec("275"));
        assert_eq!(ledger.totals().net, dec("725"));
        assert_eq!(ledger.spending_by_category()["travel"], dec("25"));
        assert_eq!(ledger.entries()[3].handle(), handle);
        assert_eq!(ledger.entries()[3].sync, SyncState::Pending);
        assert_eq!(ledger.balance_series()[1].balance, dec("-75"));
    }

    #[tokio::test]
    async fn test_fetch_success_and_lifecycle() {
        let store = FlakyStore::default();
        *store.fetched.lock().unwrap() = scenario();
        let mut ledger = LedgerState::default();
        assert_eq!(ledger.status(), &FetchStatus::Idle);

        let notice = ledger.fetch(&store, &session()).await.unwrap();

        assert!(!notice.is_error());
        assert_eq!(ledger.status(), &FetchStatus::Loaded);
        assert_eq!(ledger.transactions(), scenario());
        assert_eq!(ledger.totals().income, dec("1000"));
    }

    #[tokio::test]
    async fn test_fetch_empty_yields_zero_views() {
        let store = MemoryStore::new();
        let mut ledger = LedgerState::default();

        let notice = ledger.fetch(&store, &session()).await.unwrap();

        assert!(!notice.is_error());
        assert_eq!(ledger.totals(), Totals::default());
        assert!(ledger.balance_series().is_empty());
        assert!(ledger.spending_by_category().is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_ledger() {
        let store = FlakyStore::default();
        store.fail_fetch.store(true, Ordering::SeqCst);
        let mut ledger = LedgerState::default();
        ledger.load(scenario());

        let notice = ledger.fetch(&store, &session()).await.unwrap();

        assert!(notice.is_error());
        assert_eq!(notice.message, "Error fetching transactions.");
        assert!(matches!(
            ledger.status(),
            FetchStatus::Failed(LedgerError::StoreUnavailable(_))
        ));
        assert_eq!(ledger.transactions(), scenario());
    }

    #[tokio::test]
    async fn test_unauthenticated_operations_have_no_effect() {
        let store = FlakyStore::default();
        let mut ledger = LedgerState::default();
        ledger.load(scenario());
        let anonymous = Session::anonymous();

        let notice = ledger.fetch(&store, &anonymous).await.unwrap();
        assert!(notice.is_error());
        assert_eq!(ledger.status(), &FetchStatus::Idle);

        let notice = ledger.add(&store, &anonymous, train()).await;
        assert!(notice.is_error());
        assert_eq!(ledger.len(), 3);
        assert!(store.appended.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut ledger = LedgerState::default();
        let first = ledger.begin_fetch();
        let second = ledger.begin_fetch();
        assert!(ledger.is_loading());

        let newer = scenario();
        assert!(ledger.finish_fetch(second, Ok(newer.clone())).is_some());
        assert_eq!(ledger.status(), &FetchStatus::Loaded);

        let older = vec![Transaction::income(date("2020-01-01"), dec("1"), "x", "old").unwrap()];
        assert!(ledger.finish_fetch(first, Ok(older)).is_none());
        assert_eq!(ledger.transactions(), newer);
        assert_eq!(ledger.status(), &FetchStatus::Loaded);
    }

    #[test]
    fn test_stale_failed_fetch_reports_nothing() {
        let mut ledger = LedgerState::default();
        let first = ledger.begin_fetch();
        let _second = ledger.begin_fetch();

        let outcome = ledger.finish_fetch(
            first,
            Err(LedgerError::StoreUnavailable("offline".to_string())),
        );

        assert_eq!(outcome, None);
        assert!(ledger.is_loading());
    }

    #[tokio::test]
    async fn test_add_persists_and_records_id() {
        let store = FlakyStore::default();
        let mut ledger = LedgerState::default();

        let t = Transaction::income(date("2024-01-05"), dec("1000"), "salary", "Jan pay").unwrap();
        let notice = ledger.add(&store, &session(), t).await;

        assert_eq!(notice.message, "Transaction Added!");
        assert_eq!(ledger.entries()[0].sync, SyncState::Synced);
        assert_eq!(ledger.entries()[0].transaction.id(), Some("doc-1"));
        assert_eq!(store.appended.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_add_keeps_entry_unsynced() {
        let store = FlakyStore::default();
        store.fail_append.store(true, Ordering::SeqCst);
        let mut ledger = LedgerState::default();

        let t = Transaction::expense(date("2024-01-10"), dec("200"), "food", "groceries").unwrap();
        let notice = ledger.add(&store, &session(), t).await;

        assert!(notice.is_error());
        assert_eq!(notice.message, "Couldn't add transaction");
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.totals().expense, dec("200"));
        assert_eq!(ledger.unsynced_count(), 1);
        assert!(matches!(
            ledger.entries()[0].sync,
            SyncState::Unsynced(LedgerError::WriteError(_))
        ));
    }

    #[tokio::test]
    async fn test_rejected_identity_removes_optimistic_entry() {
        let (_server, store) = rejecting_remote(401).await;
        let mut ledger = LedgerState::default();
        ledger.load(scenario());
        let before = ledger.totals();

        let notice = ledger.add(&store, &session(), train()).await;

        assert!(notice.is_error());
        assert_eq!(ledger.transactions(), scenario());
        assert_eq!(ledger.totals(), before);
        assert_eq!(ledger.balance_series(), compute_balance_series(&scenario()));
        assert!(!ledger.spending_by_category().contains_key("travel"));
        assert_eq!(ledger.unsynced_count(), 0);
    }

    #[test]
    fn test_confirm_after_earlier_removal_targets_right_entry() {
        let mut ledger = LedgerState::default();
        let first = ledger.add_local(train());
        let second = ledger.add_local(scenario().remove(0));

        ledger.confirm(first, Err(LedgerError::Authentication));
        let notice = ledger.confirm(second, Ok("doc-9".to_string()));

        assert!(!notice.is_error());
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.entries()[0].transaction.id(), Some("doc-9"));
        assert_eq!(ledger.entries()[0].transaction.name(), "Jan pay");
    }

    #[tokio::test]
    async fn test_add_many_appends_in_order() {
        let store = MemoryStore::new();
        let mut ledger = LedgerState::default();

        let notice = ledger.add_many(&store, &session(), scenario()).await;
        assert_eq!(notice.message, "3 transactions added");

        let user = UserId::new("alice").unwrap();
        let remote: Vec<String> = store
            .fetch_all(&user)
            .await
            .unwrap()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(remote, vec!["Jan pay", "groceries", "snacks"]);
        assert!(ledger.entries().iter().all(|e| e.sync == SyncState::Synced));
    }

    #[tokio::test]
    async fn test_add_many_reports_failures() {
        let store = FlakyStore::default();
        store.fail_append.store(true, Ordering::SeqCst);
        let mut ledger = LedgerState::default();

        let notice = ledger.add_many(&store, &session(), scenario()).await;

        assert!(notice.is_error());
        assert_eq!(notice.message, "Couldn't add 3 of 3 transactions");
        assert_eq!(ledger.len(), 3);
    }

    #[tokio::test]
    async fn test_add_many_counts_only_its_own_failures() {
        let store = FlakyStore::default();
        store.fail_append.store(true, Ordering::SeqCst);
        let mut ledger = LedgerState::default();
        for t in scenario() {
            ledger.add(&store, &session(), t).await;
        }
        assert_eq!(ledger.unsynced_count(), 3);

        let notice = ledger.add_many(&store, &session(), vec![train()]).await;

        assert_eq!(notice.message, "Couldn't add 1 of 1 transactions");
        assert_eq!(ledger.unsynced_count(), 4);
    }

    #[tokio::test]
    async fn test_add_many_stops_on_rejected_identity() {
        let (server, store) = rejecting_remote(403).await;
        let mut ledger = LedgerState::default();

        let notice = ledger.add_many(&store, &session(), scenario()).await;

        assert_eq!(notice.message, "Couldn't add 3 of 3 transactions");
        assert!(ledger.is_empty());
        assert_eq!(ledger.totals(), Totals::default());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[test]
    fn test_chronological_balance_order() {
        let mut ledger = LedgerState::new(BalanceOrder::Chronological);
        ledger.load(vec![
            Transaction::expense(date("2024-02-01"), dec("50"), "food", "snacks").unwrap(),
            Transaction::income(date("2024-01-05"), dec("1000"), "salary", "Jan pay").unwrap(),
        ]);

        let months: Vec<String> = ledger.balance_series().into_iter().map(|p| p.month).collect();
        assert_eq!(months, vec!["Jan 2024", "Feb 2024"]);
    }
}
