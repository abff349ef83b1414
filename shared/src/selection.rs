//! Tile pick → occupancy query → confirm/cancel → occupy.
//!
//! [`SelectionFlow`] holds the synchronous state. The ledger round trips are
//! plain async functions ([`query`], [`occupy`]) whose results are fed back
//! through [`SelectionFlow::resolve_query`] and [`SelectionFlow::complete_occupy`].
//! The host decides where the state lives and how the futures are spawned.

use thiserror::Error;

use crate::geometry::TileCoord;
use crate::ledger::{AccountId, Ledger, LedgerError};

pub const PROMPT_TEXT: &str = "Do you want to occupy this tile?";
pub const SUCCESS_TEXT: &str = "Tile occupied successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Occupancy {
    #[default]
    Unknown,
    Occupied,
    Vacant,
}

impl Occupancy {
    pub fn label(self) -> &'static str {
        match self {
            Occupancy::Unknown => "Unknown",
            Occupancy::Occupied => "Occupied",
            Occupancy::Vacant => "Unoccupied",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSelection {
    pub tile: TileCoord,
    pub occupied: Occupancy,
}

impl TileSelection {
    pub fn coordinates_text(&self) -> String {
        format!(
            "Tile Coordinates: Row {}, Col {}",
            self.tile.row, self.tile.col
        )
    }

    pub fn status_text(&self) -> String {
        format!("Tile Status: {}", self.occupied.label())
    }
}

/// Identifies one pick so a late query or occupy result can be recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickTicket {
    pub tile: TileCoord,
    pub generation: u64,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SelectionError {
    #[error("No accounts found. Please connect your wallet.")]
    NoAccountAvailable,
    #[error("Could not read tile status.")]
    LedgerQueryFailure(#[source] LedgerError),
    #[error("Failed to occupy tile. Please try again.")]
    LedgerMutationFailure(#[source] LedgerError),
    #[error("no tile is awaiting confirmation")]
    NothingSelected,
    #[error("an occupy request is already in flight")]
    Busy,
}

/// Last user-facing outcome, shown as a status line.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Occupied(TileCoord),
    Failed(SelectionError),
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Notice::Occupied(_) => SUCCESS_TEXT.to_string(),
            Notice::Failed(err) => err.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Failed(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionFlow {
    generation: u64,
    pending: Option<PickTicket>,
    /// Ticket of the pick behind `selection`; outlives the query.
    current: Option<PickTicket>,
    selection: Option<TileSelection>,
    prompt_open: bool,
    /// Occupy in flight for the current selection.
    confirming: Option<PickTicket>,
    notice: Option<Notice>,
}

impl SelectionFlow {
    pub fn selection(&self) -> Option<&TileSelection> {
        self.selection.as_ref()
    }

    pub fn prompt_open(&self) -> bool {
        self.prompt_open
    }

    pub fn is_querying(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_confirming(&self) -> bool {
        self.confirming.is_some()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Start a new pick. Any query still in flight for an earlier pick becomes stale.
    pub fn begin_pick(&mut self, tile: TileCoord) -> PickTicket {
        self.generation += 1;
        let ticket = PickTicket {
            tile,
            generation: self.generation,
        };
        self.pending = Some(ticket);
        self.current = Some(ticket);
        self.confirming = None;
        self.selection = Some(TileSelection {
            tile,
            occupied: Occupancy::Unknown,
        });
        self.prompt_open = false;
        self.notice = None;
        tracing::debug!(row = tile.row, col = tile.col, generation = ticket.generation, "tile picked");
        ticket
    }

    /// Apply a query result. Returns `false` if the result was stale and ignored.
    pub fn resolve_query(&mut self, ticket: PickTicket, result: Result<bool, LedgerError>) -> bool {
        if self.pending != Some(ticket) {
            tracing::debug!(generation = ticket.generation, "discarding stale occupancy result");
            return false;
        }
        self.pending = None;

        let occupied = match result {
            Ok(true) => Occupancy::Occupied,
            Ok(false) => Occupancy::Vacant,
            Err(err) => {
                tracing::warn!(error = %err, "occupancy query failed");
                self.notice = Some(Notice::Failed(SelectionError::LedgerQueryFailure(err)));
                Occupancy::Unknown
            }
        };
        self.selection = Some(TileSelection {
            tile: ticket.tile,
            occupied,
        });
        self.prompt_open = occupied == Occupancy::Vacant;
        true
    }

    /// Take the current pick for an occupy request.
    pub fn begin_confirm(&mut self) -> Result<PickTicket, SelectionError> {
        if self.confirming.is_some() {
            return Err(SelectionError::Busy);
        }
        let ticket = match self.current {
            Some(ticket) if self.prompt_open && self.selection.is_some() => ticket,
            _ => return Err(SelectionError::NothingSelected),
        };
        self.confirming = Some(ticket);
        self.notice = None;
        Ok(ticket)
    }

    /// Record the outcome of an occupy request started by [`begin_confirm`](Self::begin_confirm).
    ///
    /// An outcome for a pick that has since been replaced or cancelled is only
    /// logged. Returns `false` in that case.
    pub fn complete_occupy(&mut self, ticket: PickTicket, result: Result<AccountId, SelectionError>) -> bool {
        let tile = ticket.tile;
        match &result {
            Ok(account) => tracing::info!(row = tile.row, col = tile.col, %account, "tile occupied"),
            Err(err) => tracing::warn!(error = %err, row = tile.row, col = tile.col, "occupy failed"),
        }
        if self.confirming != Some(ticket) {
            tracing::debug!(generation = ticket.generation, "occupy outcome for a replaced selection");
            return false;
        }
        self.confirming = None;
        match result {
            Ok(_) => {
                if let Some(sel) = self.selection.as_mut() {
                    sel.occupied = Occupancy::Occupied;
                }
                self.prompt_open = false;
                self.notice = Some(Notice::Occupied(tile));
            }
            Err(err) => self.notice = Some(Notice::Failed(err)),
        }
        true
    }

    /// Drop the selection without touching the ledger.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.current = None;
        self.confirming = None;
        self.selection = None;
        self.prompt_open = false;
        self.notice = None;
    }
}

/// Run the occupancy query for a pick.
pub async fn query(ledger: &dyn Ledger, ticket: PickTicket) -> Result<bool, LedgerError> {
    ledger.query_occupancy(ticket.tile).await
}

/// Resolve the active account, then submit the mutation from it.
///
/// With no account available nothing is submitted.
pub async fn occupy(ledger: &dyn Ledger, tile: TileCoord) -> Result<AccountId, SelectionError> {
    let accounts = ledger
        .list_accounts()
        .await
        .map_err(SelectionError::LedgerMutationFailure)?;
    let account = accounts
        .into_iter()
        .next()
        .ok_or(SelectionError::NoAccountAvailable)?;
    ledger
        .occupy_tile(tile, &account)
        .await
        .map_err(SelectionError::LedgerMutationFailure)?;
    Ok(account)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use futures::channel::oneshot;
    use futures::executor::block_on;

    use super::*;

    /// Ledger whose query results are released by the test through oneshot senders.
    #[derive(Default)]
    struct FakeLedger {
        waiting: RefCell<HashMap<TileCoord, oneshot::Receiver<Result<bool, LedgerError>>>>,
        accounts: Vec<AccountId>,
        occupy_result: Option<LedgerError>,
        occupy_calls: RefCell<Vec<(TileCoord, AccountId)>>,
    }

    impl FakeLedger {
        fn with_account() -> Self {
            Self {
                accounts: vec![AccountId("0xabc".into())],
                ..Self::default()
            }
        }

        fn expect_query(&self, tile: TileCoord) -> oneshot::Sender<Result<bool, LedgerError>> {
            let (tx, rx) = oneshot::channel();
            self.waiting.borrow_mut().insert(tile, rx);
            tx
        }
    }

    #[async_trait(?Send)]
    impl Ledger for FakeLedger {
        async fn query_occupancy(&self, tile: TileCoord) -> Result<bool, LedgerError> {
            let rx = self.waiting.borrow_mut().remove(&tile);
            match rx {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(LedgerError::Transport("dropped".into()))),
                None => Ok(false),
            }
        }

        async fn occupy_tile(&self, tile: TileCoord, account: &AccountId) -> Result<(), LedgerError> {
            self.occupy_calls.borrow_mut().push((tile, account.clone()));
            match &self.occupy_result {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        async fn list_accounts(&self) -> Result<Vec<AccountId>, LedgerError> {
            Ok(self.accounts.clone())
        }
    }

    fn pick_vacant(flow: &mut SelectionFlow, ledger: &FakeLedger, tile: TileCoord) {
        let ticket = flow.begin_pick(tile);
        let result = block_on(query(ledger, ticket));
        assert!(flow.resolve_query(ticket, result));
    }

    #[test]
    fn vacant_tile_opens_prompt_and_cancel_skips_ledger() {
        let ledger = FakeLedger::with_account();
        let mut flow = SelectionFlow::default();
        let tile = TileCoord::new(4, 9);
        pick_vacant(&mut flow, &ledger, tile);

        assert!(flow.prompt_open());
        assert_eq!(flow.selection().unwrap().occupied, Occupancy::Vacant);
        assert_eq!(flow.selection().unwrap().status_text(), "Tile Status: Unoccupied");

        flow.cancel();
        assert!(flow.selection().is_none());
        assert!(!flow.prompt_open());
        assert!(ledger.occupy_calls.borrow().is_empty());
    }

    #[test]
    fn occupied_tile_shows_status_without_prompt() {
        let ledger = FakeLedger::with_account();
        let tile = TileCoord::new(1, 1);
        let tx = ledger.expect_query(tile);
        let mut flow = SelectionFlow::default();
        let ticket = flow.begin_pick(tile);
        tx.send(Ok(true)).unwrap();
        let result = block_on(query(&ledger, ticket));
        flow.resolve_query(ticket, result);
        assert!(!flow.prompt_open());
        assert_eq!(flow.selection().unwrap().occupied, Occupancy::Occupied);
    }

    #[test]
    fn late_result_for_older_pick_is_discarded() {
        let ledger = FakeLedger::with_account();
        let first = TileCoord::new(10, 10);
        let second = TileCoord::new(11, 12);
        let tx_first = ledger.expect_query(first);
        let tx_second = ledger.expect_query(second);

        let mut flow = SelectionFlow::default();
        let ticket_first = flow.begin_pick(first);
        let fut_first = query(&ledger, ticket_first);
        let ticket_second = flow.begin_pick(second);
        let fut_second = query(&ledger, ticket_second);

        tx_second.send(Ok(false)).unwrap();
        let second_result = block_on(fut_second);
        assert!(flow.resolve_query(ticket_second, second_result));

        tx_first.send(Ok(true)).unwrap();
        let first_result = block_on(fut_first);
        assert!(!flow.resolve_query(ticket_first, first_result));

        let sel = flow.selection().unwrap();
        assert_eq!(sel.tile, second);
        assert_eq!(sel.occupied, Occupancy::Vacant);
        assert!(flow.prompt_open());
    }

    #[test]
    fn repick_of_same_tile_still_invalidates_older_query() {
        let mut flow = SelectionFlow::default();
        let tile = TileCoord::new(3, 3);
        let old = flow.begin_pick(tile);
        let new = flow.begin_pick(tile);
        assert!(!flow.resolve_query(old, Ok(true)));
        assert!(flow.resolve_query(new, Ok(false)));
        assert!(flow.prompt_open());
    }

    #[test]
    fn query_failure_reports_unknown_and_no_prompt() {
        let ledger = FakeLedger::with_account();
        let tile = TileCoord::new(2, 2);
        let tx = ledger.expect_query(tile);
        let mut flow = SelectionFlow::default();
        let ticket = flow.begin_pick(tile);
        tx.send(Err(LedgerError::Transport("offline".into()))).unwrap();
        let result = block_on(query(&ledger, ticket));
        flow.resolve_query(ticket, result);

        assert!(!flow.prompt_open());
        assert_eq!(flow.selection().unwrap().occupied, Occupancy::Unknown);
        assert!(flow.notice().unwrap().is_error());
        assert!(!flow.is_querying());
    }

    #[test]
    fn confirm_occupies_from_first_account() {
        let ledger = FakeLedger::with_account();
        let tile = TileCoord::new(20, 20);
        let mut flow = SelectionFlow::default();
        pick_vacant(&mut flow, &ledger, tile);

        let target = flow.begin_confirm().unwrap();
        assert_eq!(flow.begin_confirm(), Err(SelectionError::Busy));
        let result = block_on(occupy(&ledger, target.tile));
        assert!(flow.complete_occupy(target, result));

        assert_eq!(
            ledger.occupy_calls.borrow().as_slice(),
            &[(tile, AccountId("0xabc".into()))]
        );
        assert!(!flow.prompt_open());
        assert!(!flow.is_confirming());
        assert_eq!(flow.selection().unwrap().occupied, Occupancy::Occupied);
        assert_eq!(flow.notice().unwrap().text(), SUCCESS_TEXT);
    }

    #[test]
    fn no_account_aborts_before_mutation() {
        let ledger = FakeLedger::default();
        let tile = TileCoord::new(5, 6);
        let mut flow = SelectionFlow::default();
        pick_vacant(&mut flow, &ledger, tile);

        let target = flow.begin_confirm().unwrap();
        let result = block_on(occupy(&ledger, target.tile));
        assert_eq!(result, Err(SelectionError::NoAccountAvailable));
        assert!(flow.complete_occupy(target, result));

        assert!(ledger.occupy_calls.borrow().is_empty());
        assert_eq!(
            flow.notice().unwrap().text(),
            "No accounts found. Please connect your wallet."
        );
    }

    #[test]
    fn mutation_failure_keeps_selection_for_retry() {
        let ledger = FakeLedger {
            occupy_result: Some(LedgerError::Reverted("0x01".into())),
            ..FakeLedger::with_account()
        };
        let tile = TileCoord::new(7, 8);
        let mut flow = SelectionFlow::default();
        pick_vacant(&mut flow, &ledger, tile);

        let target = flow.begin_confirm().unwrap();
        let result = block_on(occupy(&ledger, target.tile));
        assert!(flow.complete_occupy(target, result));

        assert!(flow.prompt_open());
        assert_eq!(flow.selection().unwrap().occupied, Occupancy::Vacant);
        assert_eq!(
            flow.notice().unwrap().text(),
            "Failed to occupy tile. Please try again."
        );
        assert_eq!(flow.begin_confirm().map(|t| t.tile), Ok(tile));
    }

    #[test]
    fn occupy_outcome_for_replaced_pick_leaves_new_selection_alone() {
        let ledger = FakeLedger::with_account();
        let first = TileCoord::new(4, 4);
        let second = TileCoord::new(9, 9);
        let mut flow = SelectionFlow::default();
        pick_vacant(&mut flow, &ledger, first);
        let first_confirm = flow.begin_confirm().unwrap();

        pick_vacant(&mut flow, &ledger, second);
        assert!(!flow.is_confirming());
        let second_confirm = flow.begin_confirm().unwrap();
        assert_eq!(second_confirm.tile, second);

        let failed = Err(SelectionError::LedgerMutationFailure(LedgerError::Reverted("0x01".into())));
        assert!(!flow.complete_occupy(first_confirm, failed));
        assert!(!flow.complete_occupy(first_confirm, Ok(AccountId("0xabc".into()))));

        assert_eq!(flow.selection().unwrap().tile, second);
        assert_eq!(flow.selection().unwrap().occupied, Occupancy::Vacant);
        assert!(flow.prompt_open());
        assert!(flow.notice().is_none());
        assert!(flow.is_confirming());

        assert!(flow.complete_occupy(second_confirm, Ok(AccountId("0xabc".into()))));
        assert_eq!(flow.selection().unwrap().occupied, Occupancy::Occupied);
        assert_eq!(flow.notice().unwrap().text(), SUCCESS_TEXT);
    }

    #[test]
    fn occupy_outcome_after_cancel_is_only_logged() {
        let ledger = FakeLedger::with_account();
        let mut flow = SelectionFlow::default();
        pick_vacant(&mut flow, &ledger, TileCoord::new(1, 2));
        let target = flow.begin_confirm().unwrap();
        flow.cancel();
        assert!(!flow.complete_occupy(target, Ok(AccountId("0xabc".into()))));
        assert!(flow.selection().is_none());
        assert!(flow.notice().is_none());
    }

    #[test]
    fn confirm_without_prompt_is_rejected() {
        let mut flow = SelectionFlow::default();
        assert_eq!(flow.begin_confirm(), Err(SelectionError::NothingSelected));
        flow.begin_pick(TileCoord::new(0, 0));
        assert_eq!(flow.begin_confirm(), Err(SelectionError::NothingSelected));
    }

    #[test]
    fn coordinates_text_names_row_then_col() {
        let sel = TileSelection {
            tile: TileCoord::new(3, 14),
            occupied: Occupancy::Unknown,
        };
        assert_eq!(sel.coordinates_text(), "Tile Coordinates: Row 3, Col 14");
    }
}
