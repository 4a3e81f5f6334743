use super::util::with_retry;
use crate::core::config::RemoteStoreConfig;
use crate::core::error::{LedgerError, LedgerResult};
use crate::core::session::UserId;
use crate::core::store::TransactionStore;
use crate::core::transaction::{Transaction, TransactionRecord};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, error, instrument};

const RETRY_DELAY_MS: u64 = 500;

#[derive(Debug, Deserialize)]
struct AppendResponse {
    id: String,
}

/// Per-user document collection served over HTTP.
///
/// `GET {base_url}/users/{user}/transactions` lists the collection as a JSON
/// array of documents; `POST` to the same path stores one document and
/// answers with its new id.
pub struct RemoteStore {
    base_url: String,
    token: Option<String>,
    retries: usize,
    client: Client,
}

impl RemoteStore {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.to_string(),
            token,
            retries: 0,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &RemoteStoreConfig) -> Self {
        Self::new(&config.base_url, config.token.clone()).with_retries(config.retries)
    }

    /// Number of extra attempts for fetches that fail in transport.
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    fn collection_url(&self, user: &UserId) -> Result<Url, String> {
        let mut url = Url::parse(&self.base_url).map_err(|e| format!("bad base url: {e}"))?;
        url.path_segments_mut()
            .map_err(|_| format!("base url cannot hold a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(["users", user.as_str(), "transactions"]);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn check_status(
        response: &Response,
        failure: fn(String) -> LedgerError,
    ) -> LedgerResult<()> {
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(LedgerError::Authentication),
            status if !status.is_success() => Err(failure(format!(
                "{} responded with {}",
                response.url(),
                status
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl TransactionStore for RemoteStore {
    #[instrument(name = "RemoteFetchAll", skip(self), fields(user = %user))]
    async fn fetch_all(&self, user: &UserId) -> LedgerResult<Vec<Transaction>> {
        let url = self
            .collection_url(user)
            .map_err(LedgerError::StoreUnavailable)?;
        debug!("Requesting transactions from {}", url);

        let response = with_retry(
            || self.authorized(self.client.get(url.clone())).send(),
            self.retries,
            RETRY_DELAY_MS,
        )
        .await
        .map_err(|e| LedgerError::StoreUnavailable(e.to_string()))?;
        Self::check_status(&response, LedgerError::StoreUnavailable)?;

        let response_text = response
            .text()
            .await
            .map_err(|e| LedgerError::StoreUnavailable(e.to_string()))?;

        match serde_json::from_str::<Vec<Transaction>>(&response_text) {
            Ok(transactions) => {
                debug!("Fetched {} transactions", transactions.len());
                Ok(transactions)
            }
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse transactions response"
                );
                Err(LedgerError::StoreUnavailable(format!(
                    "malformed documents: {e}"
                )))
            }
        }
    }

    #[instrument(name = "RemoteAppend", skip(self, transaction), fields(user = %user))]
    async fn append(&self, user: &UserId, transaction: &Transaction) -> LedgerResult<String> {
        let url = self.collection_url(user).map_err(LedgerError::WriteError)?;
        let mut document = TransactionRecord::from(transaction);
        document.id = None;

        let response = self
            .authorized(self.client.post(url))
            .json(&document)
            .send()
            .await
            .map_err(|e| LedgerError::WriteError(e.to_string()))?;
        Self::check_status(&response, LedgerError::WriteError)?;

        let created: AppendResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::WriteError(format!("unexpected response: {e}")))?;
        debug!("Document written with id {}", created.id);
        Ok(created.id)
    }
}
