use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid {kind}: {value:?}")]
    InvalidValue { kind: &'static str, value: String },
}

impl Error {
    pub(crate) fn invalid(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue { kind, value: value.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
