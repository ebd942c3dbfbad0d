//! scrooge-core: canonical transaction records, date keys, destinations and
//! routing rules shared by the parser and the sheets engine.

pub mod classify;
pub mod config;
pub mod destination;
pub mod record;
pub mod time;

pub use classify::{ClassificationRule, Flow, TOPUP};
pub use config::SheetsConfig;
pub use destination::{Destination, Direction};
pub use record::{
    BankKind, CanonicalRecord, RevolutTransaction, Row, UnicreditTransaction, UnknownBankKind,
};
