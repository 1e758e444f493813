use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IceError {
    #[error("IceError: \"NominationBeforeSuccess\" pair {0} has never succeeded")]
    NominationBeforeSuccess(String),
    #[error("IceError: \"PoisonedEntry\" checklist entry lock poisoned")]
    PoisonedEntry,
}
