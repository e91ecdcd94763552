/// Errors that can occur while consuming bytes from a source.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SourceError {
    /// Tried to consume more bytes than the most recent peek returned.
    #[error("cannot advance {requested} bytes past a claim of {claimed} bytes")]
    AdvanceBeyondClaim { requested: usize, claimed: usize },
}

pub type Result<T> = std::result::Result<T, SourceError>;
