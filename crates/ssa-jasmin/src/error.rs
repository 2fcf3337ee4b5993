#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A construct the backend deliberately does not lower (indirect calls,
    /// function pointers, unknown intrinsics, unhandled opcodes or types).
    #[error("Unsupported construct: {0}")]
    UnsupportedConstruct(String),

    /// A store whose destination is not a local slot. Verified IR never
    /// produces one.
    #[error("Invalid store target: {0}")]
    InvalidStoreTarget(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// A failure inside one function, tagged with the function's name by the
    /// module driver.
    #[error("in function `{name}`: {source}")]
    Function {
        name: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Strip the per-function wrapper, if any.
    #[must_use]
    pub fn root(&self) -> &Error {
        match self {
            Error::Function { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
