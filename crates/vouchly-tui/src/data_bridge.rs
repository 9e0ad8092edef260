//! Forwards [`Console`] store and session changes into the action loop.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use vouchly_core::Console;

use crate::action::Action;

/// Push the current snapshots, then forward every change until cancelled
/// or the store goes away.
pub async fn run_data_bridge(
    console: Console,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let store = console.store().clone();
    let mut vouchers = store.subscribe_vouchers();
    let mut sales = store.subscribe_sales();
    let mut stats = store.subscribe_stats();
    let mut session = console.session_state();
    let mut filter = console.subscribe_filter();

    let _ = action_tx.send(Action::SessionChanged(*session.borrow_and_update()));
    let _ = action_tx.send(Action::FilterChanged(filter.borrow_and_update().clone()));
    let _ = action_tx.send(Action::VouchersUpdated(vouchers.current().clone()));
    let _ = action_tx.send(Action::SalesUpdated(sales.current().clone()));
    if let Some(s) = *stats.borrow_and_update() {
        let _ = action_tx.send(Action::StatsUpdated(s));
    }

    loop {
        let action = tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = session.changed() => Action::SessionChanged(*session.borrow_and_update()),
            Some(v) = vouchers.changed() => Action::VouchersUpdated(v),
            Some(s) = sales.changed() => Action::SalesUpdated(s),
            Ok(()) = stats.changed() => {
                let Some(s) = *stats.borrow_and_update() else {
                    continue;
                };
                Action::StatsUpdated(s)
            }
            Ok(()) = filter.changed() => Action::FilterChanged(filter.borrow_and_update().clone()),
            else => break,
        };
        if action_tx.send(action).is_err() {
            break;
        }
    }

    debug!("data bridge shut down");
}
