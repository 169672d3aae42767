use thiserror::Error;

/// Why a feed/play command was refused. None of these change pet state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum CommandError {
    #[error("not a number: {0:?}")]
    NotANumber(String),
    #[error("amount {0} outside 0..=10")]
    OutOfRange(i64),
    #[error("no session is running")]
    NoSession,
    #[error("pet is no longer alive")]
    PetDead,
}
