use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot reach ticker endpoint: {0}")]
    Network(reqwest::Error),

    #[error("Api returned an error payload: {0}")]
    Api(serde_json::Value),

    #[error("Cannot parse message <{1}>: {0}")]
    Decode(serde_json::Error, String),

    #[error("Cannot build request url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Cannot encode query: {0}")]
    Query(#[from] serde_qs::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e)
    }
}
