// ── Console abstraction ──
//
// Session lifecycle and data access for the admin console. Owns the API
// client, the DataStore, and the login state; every front end goes
// through this facade.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use secrecy::SecretString;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vouchly_api::AdminClient;
use vouchly_api::admin::{MarkUsedRequest, NewVoucher, VoucherQuery, VoucherRef};

use crate::command::{Command, CommandResult, ImportReport};
use crate::config::{ConsoleConfig, UploadEncoding, transport_for};
use crate::csv_import;
use crate::error::CoreError;
use crate::model::{Sale, Voucher, VoucherStats};
use crate::session::{SessionState, StoredSession, TokenStore};
use crate::store::DataStore;
use crate::stream::VoucherFilter;

// ── Console ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable. A 401 from any call clears the stored token and
/// moves the session to [`SessionState::Expired`] exactly once, however
/// many requests fail concurrently.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    config: ConsoleConfig,
    client: AdminClient,
    store: Arc<DataStore>,
    tokens: Arc<dyn TokenStore>,
    session: watch::Sender<SessionState>,
    filter: watch::Sender<VoucherFilter>,
    in_flight: DashSet<String>,
    cancel: CancellationToken,
}

/// Removes an in-flight key when the command finishes, however it ends.
struct InFlightGuard<'a> {
    set: &'a DashSet<String>,
    key: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

impl Console {
    /// Build a console from configuration. Does not contact the backend.
    pub fn new(config: ConsoleConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, CoreError> {
        let transport = transport_for(&config.tls, config.timeout);
        let client = AdminClient::new(config.url.clone(), config.layout, &transport)?;
        Ok(Self::with_client(config, client, tokens))
    }

    /// Build a console around an existing client.
    pub fn with_client(
        config: ConsoleConfig,
        client: AdminClient,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let (session, _) = watch::channel(SessionState::LoggedOut);
        let (filter, _) = watch::channel(VoucherFilter::default());
        Self {
            inner: Arc::new(ConsoleInner {
                config,
                client,
                store: Arc::new(DataStore::new()),
                tokens,
                session,
                filter,
                in_flight: DashSet::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Session lifecycle ────────────────────────────────────────

    /// Subscribe to login state changes.
    pub fn session_state(&self) -> watch::Receiver<SessionState> {
        self.inner.session.subscribe()
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.session.borrow().is_logged_in()
    }

    /// Resume a remembered session. Returns `true` if one was found.
    pub fn restore(&self) -> Result<bool, CoreError> {
        let Some(stored) = self.inner.tokens.load()? else {
            return Ok(false);
        };
        match stored.token {
            Some(token) => self.inner.client.set_token(token),
            None => self.inner.client.clear_token(),
        }
        self.inner.session.send_replace(SessionState::LoggedIn {
            remember: stored.remember,
        });
        debug!("restored remembered session");
        Ok(true)
    }

    /// Exchange the password for a token.
    ///
    /// With `remember` the token is persisted for later runs; otherwise it
    /// lives only in this process and any previously stored token is
    /// removed.
    pub async fn login(
        &self,
        username: Option<&str>,
        password: &SecretString,
        remember: bool,
    ) -> Result<(), CoreError> {
        let grant = self.inner.client.login(username, password).await?;

        let persisted = if remember {
            self.inner.tokens.save(&StoredSession {
                token: grant.token,
                remember,
            })
        } else {
            self.inner.tokens.clear()
        };
        if let Err(e) = persisted {
            warn!(error = %e, "could not update stored session");
        }

        self.inner
            .session
            .send_replace(SessionState::LoggedIn { remember });
        info!(remember, "logged in");
        Ok(())
    }

    /// Drop the token everywhere and forget cached data.
    pub fn logout(&self) {
        self.inner.client.logout();
        if let Err(e) = self.inner.tokens.clear() {
            warn!(error = %e, "could not clear stored session");
        }
        self.inner.store.clear();
        self.inner.session.send_replace(SessionState::LoggedOut);
        info!("logged out");
    }

    /// Transition to `Expired` if currently logged in. Returns `true` for
    /// the single caller that performed the transition.
    fn expire_session(&self) -> bool {
        let expired = self.inner.session.send_if_modified(|state| {
            if state.is_logged_in() {
                *state = SessionState::Expired;
                true
            } else {
                false
            }
        });
        if expired {
            warn!("backend rejected the session token; logging out");
            self.inner.client.clear_token();
            if let Err(e) = self.inner.tokens.clear() {
                warn!(error = %e, "could not clear stored session");
            }
            self.inner.store.clear();
        }
        expired
    }

    /// Convert an API result, forcing logout on 401.
    fn guard<T>(&self, result: Result<T, vouchly_api::Error>) -> Result<T, CoreError> {
        result.map_err(|e| {
            if e.is_unauthorized() {
                self.expire_session();
                CoreError::SessionExpired
            } else {
                CoreError::from(e)
            }
        })
    }

    fn ensure_logged_in(&self) -> Result<(), CoreError> {
        match *self.inner.session.borrow() {
            SessionState::LoggedIn { .. } => Ok(()),
            SessionState::Expired => Err(CoreError::SessionExpired),
            SessionState::LoggedOut => Err(CoreError::NotLoggedIn),
        }
    }

    // ── Filter ───────────────────────────────────────────────────

    pub fn filter(&self) -> VoucherFilter {
        self.inner.filter.borrow().clone()
    }

    pub fn set_filter(&self, filter: VoucherFilter) {
        self.inner.filter.send_replace(filter);
    }

    pub fn subscribe_filter(&self) -> watch::Receiver<VoucherFilter> {
        self.inner.filter.subscribe()
    }

    /// The stored list with the current filter applied.
    pub fn filtered_vouchers(&self) -> Vec<Arc<Voucher>> {
        self.filter().apply(&self.inner.store.vouchers_snapshot())
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Fetch the voucher list and apply `filter` locally.
    ///
    /// The store keeps the whole fetched list; the return value is the
    /// filtered view. The filter becomes the console's current filter.
    pub async fn load_vouchers(
        &self,
        filter: &VoucherFilter,
    ) -> Result<Vec<Arc<Voucher>>, CoreError> {
        self.ensure_logged_in()?;
        self.set_filter(filter.clone());

        let query = VoucherQuery {
            status: filter.status.as_query(),
            search: Some(filter.search()),
        };
        let raw = self.guard(
            self.inner
                .client
                .list_vouchers(self.inner.config.listing, query)
                .await,
        )?;
        self.inner
            .store
            .replace_vouchers(raw.into_iter().map(Voucher::from).collect());

        Ok(filter.apply(&self.inner.store.vouchers_snapshot()))
    }

    pub async fn load_stats(&self) -> Result<VoucherStats, CoreError> {
        self.ensure_logged_in()?;
        let counts = self.guard(self.inner.client.stats().await)?;
        let stats = VoucherStats::from(counts);
        self.inner.store.set_stats(stats);
        Ok(stats)
    }

    pub async fn load_sales(&self) -> Result<Arc<Vec<Arc<Sale>>>, CoreError> {
        self.ensure_logged_in()?;
        let raw = self.guard(self.inner.client.list_sales().await)?;
        self.inner
            .store
            .replace_sales(raw.into_iter().map(Sale::from).collect());
        Ok(self.inner.store.sales_snapshot())
    }

    /// Reload vouchers (with the current filter), stats and sales together.
    /// Each part lands in the store independently; the first error is
    /// returned.
    pub async fn full_refresh(&self) -> Result<(), CoreError> {
        let filter = self.filter();
        let (vouchers, stats, sales) =
            tokio::join!(self.load_vouchers(&filter), self.load_stats(), self.load_sales());
        vouchers?;
        stats?;
        sales?;
        Ok(())
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Run a write operation.
    ///
    /// A second command with the same in-flight key is rejected while the
    /// first is pending. On success the list and stats are re-fetched as
    /// the command requires; refresh failures are logged, not returned.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        self.ensure_logged_in()?;

        let key = cmd.in_flight_key();
        if !self.inner.in_flight.insert(key.clone()) {
            return Err(CoreError::AlreadyInFlight { action: key });
        }
        let _guard = InFlightGuard {
            set: &self.inner.in_flight,
            key,
        };

        let reload_list = cmd.reloads_list();
        let reload_stats = cmd.reloads_stats();
        let result = self.route(cmd).await?;

        if reload_list {
            let filter = self.filter();
            if let Err(e) = self.load_vouchers(&filter).await {
                warn!(error = %e, "voucher reload after command failed");
            }
        }
        if reload_stats {
            if let Err(e) = self.load_stats().await {
                warn!(error = %e, "stats reload after command failed");
            }
        }
        Ok(result)
    }

    /// Parse CSV text and upload the usable rows in one request.
    pub async fn import_csv(
        &self,
        text: &str,
        file_name: &str,
    ) -> Result<CommandResult, CoreError> {
        let batch = csv_import::import_csv(text, &self.inner.config.default_voucher_type);
        debug!(rows = batch.rows.len(), skipped = batch.skipped, "csv parsed");
        self.execute(Command::ImportVouchers {
            batch,
            file_name: file_name.to_owned(),
        })
        .await
    }

    async fn route(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        let client = &self.inner.client;

        match cmd {
            Command::AddVoucher { serial, pin, kind } => {
                let (serial, pin) = (serial.trim().to_owned(), pin.trim().to_owned());
                if serial.is_empty() || pin.is_empty() {
                    return Err(CoreError::ValidationFailed {
                        message: "Serial and pin required".into(),
                    });
                }
                let kind = kind
                    .map(|k| k.trim().to_uppercase())
                    .filter(|k| !k.is_empty());
                let ack = self.guard(client.add_voucher(&NewVoucher { serial, pin, kind }).await)?;
                Ok(CommandResult::Ok {
                    message: ack.message,
                })
            }
            Command::ImportVouchers { batch, file_name } => {
                if batch.rows.is_empty() {
                    return Err(CoreError::ValidationFailed {
                        message: "No valid rows found (each row needs a serial and a pin)".into(),
                    });
                }
                let ack = match self.inner.config.upload {
                    UploadEncoding::Json => client.upload_vouchers(&batch.rows).await,
                    UploadEncoding::Multipart => {
                        client.upload_vouchers_multipart(&file_name, &batch.rows).await
                    }
                };
                let ack = self.guard(ack)?;
                Ok(CommandResult::Imported(ImportReport {
                    attempted: batch.rows.len(),
                    skipped: batch.skipped,
                    inserted: ack.inserted,
                    message: ack.message,
                }))
            }
            Command::MarkUsed { id, buyer } => {
                self.mark_used(VoucherRef::Id(id.to_raw()), buyer).await
            }
            Command::MarkUsedBySerial { serial, buyer } => {
                self.mark_used(VoucherRef::Serial(serial.trim().to_owned()), buyer)
                    .await
            }
            Command::DeleteVoucher { id } => {
                let ack = self.guard(client.delete_voucher(&id.to_raw()).await)?;
                self.inner.store.remove_voucher(&id.to_string());
                Ok(CommandResult::Ok {
                    message: ack.message,
                })
            }
            Command::ResendVoucher { id } => {
                let ack = self.guard(client.resend_voucher(&id.to_raw()).await)?;
                Ok(CommandResult::Ok {
                    message: ack.message,
                })
            }
        }
    }

    async fn mark_used(
        &self,
        target: VoucherRef,
        buyer: Option<String>,
    ) -> Result<CommandResult, CoreError> {
        let request = MarkUsedRequest {
            target,
            buyer: buyer
                .map(|b| b.trim().to_owned())
                .filter(|b| !b.is_empty()),
        };
        let ack = self.guard(self.inner.client.mark_used(&request).await)?;
        Ok(CommandResult::Ok {
            message: ack.message,
        })
    }

    // ── Background refresh ───────────────────────────────────────

    /// Spawn the periodic refresh task if an interval is configured.
    pub fn spawn_refresh(&self) -> Option<JoinHandle<()>> {
        let secs = self.inner.config.refresh_interval_secs;
        if secs == 0 {
            return None;
        }
        let console = self.clone();
        let cancel = self.inner.cancel.child_token();
        Some(tokio::spawn(refresh_task(
            console,
            Duration::from_secs(secs),
            cancel,
        )))
    }

    /// Stop background tasks.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }
}

async fn refresh_task(console: Console, every: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if !console.is_logged_in() {
                    continue;
                }
                if let Err(e) = console.full_refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}
