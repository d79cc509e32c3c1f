//! Engine modules: the ledger core, the risk limit policy, and the
//! violation engine.

pub mod ledger;
pub mod risk;
pub mod violations;

pub use ledger::{BetPatch, LedgerEngine, NewBet};
