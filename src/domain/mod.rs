mod ledger;
mod money;
mod snapshot;
mod transaction;

pub use ledger::*;
pub use money::*;
pub use snapshot::*;
pub use transaction::*;
