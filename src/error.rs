//! Crate-level error type

use crate::ledger::LedgerError;
use crate::notify::DispatchError;
use crate::registry::RegistryError;
use crate::schedule::ScheduleError;

/// Any error surfaced by the coordinator
#[derive(Debug)]
pub enum Error {
    Schedule(ScheduleError),
    Ledger(LedgerError),
    Registry(RegistryError),
    Dispatch(DispatchError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Schedule(e) => write!(f, "Schedule error: {}", e),
            Error::Ledger(e) => write!(f, "Ledger error: {}", e),
            Error::Registry(e) => write!(f, "Registry error: {}", e),
            Error::Dispatch(e) => write!(f, "Dispatch error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Schedule(e) => Some(e),
            Error::Ledger(e) => Some(e),
            Error::Registry(e) => Some(e),
            Error::Dispatch(e) => Some(e),
        }
    }
}

impl From<ScheduleError> for Error {
    fn from(e: ScheduleError) -> Self {
        Error::Schedule(e)
    }
}

impl From<LedgerError> for Error {
    fn from(e: LedgerError) -> Self {
        Error::Ledger(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

impl From<DispatchError> for Error {
    fn from(e: DispatchError) -> Self {
        Error::Dispatch(e)
    }
}
