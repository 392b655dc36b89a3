// Application layer: the account use cases and the store capabilities
// they are written against.

mod account;
pub mod error;
mod stores;

pub use account::*;
pub use error::*;
pub use stores::*;
