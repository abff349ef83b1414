//! Contract for the remote ledger that owns tile occupancy.
//!
//! The engine only ever hands the ledger a [`TileCoord`]. Whatever order the
//! concrete backend wants its coordinates in is that backend's business, and
//! it must spell that out with an [`ArgumentOrder`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::TileCoord;

/// Opaque account identifier as the ledger reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire order of the two coordinate arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentOrder {
    #[default]
    ColRow,
    RowCol,
}

impl ArgumentOrder {
    /// The tile's coordinates in wire order.
    pub fn arrange(self, tile: TileCoord) -> (u32, u32) {
        match self {
            ArgumentOrder::ColRow => (tile.col, tile.row),
            ArgumentOrder::RowCol => (tile.row, tile.col),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("could not decode ledger response: {0}")]
    Decode(String),
    #[error("transaction {0} reverted")]
    Reverted(String),
    #[error("transaction {0} was not confirmed in time")]
    Timeout(String),
}

/// Remote occupancy ledger. Futures are `?Send`: everything runs on the UI thread.
#[async_trait(?Send)]
pub trait Ledger {
    async fn query_occupancy(&self, tile: TileCoord) -> Result<bool, LedgerError>;

    async fn occupy_tile(&self, tile: TileCoord, account: &AccountId) -> Result<(), LedgerError>;

    async fn list_accounts(&self) -> Result<Vec<AccountId>, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_order_is_explicit() {
        let tile = TileCoord::new(7, 12);
        assert_eq!(ArgumentOrder::ColRow.arrange(tile), (12, 7));
        assert_eq!(ArgumentOrder::RowCol.arrange(tile), (7, 12));
    }

    #[test]
    fn errors_render_for_status_line() {
        let err = LedgerError::Rpc {
            code: -32000,
            message: "execution reverted".into(),
        };
        assert_eq!(err.to_string(), "rpc error -32000: execution reverted");
    }
}
