use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}: {1}")]
    Context(String, Box<Error>),

    #[error("Either \"{0}\" does not exist or is private")]
    NotFound(String),

    #[error("Malformed markup: {0}")]
    MalformedMarkup(String),

    #[error("No element matches selector `{0}`")]
    MissingElement(String),

    #[error("Element <{element}> has no `{attribute}` attribute")]
    MissingAttribute { element: String, attribute: String },

    #[error("Invalid selector `{0}`")]
    Selector(String),

    #[error("Invalid engagement count: {0:?}")]
    InvalidCount(String),

    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Url parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("An unexpected error occurred: {0}")]
    Other(String),
}

impl Error {
    /// True for the target-missing condition, looking through any context wrappers.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Context(_, inner) => inner.is_not_found(),
            _ => false,
        }
    }
}

pub trait Context<T, E> {
    fn context(self, context: &'static str) -> Result<T>;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, context: &'static str) -> Result<T> {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e.into())))
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
