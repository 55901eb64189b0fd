#[derive(thiserror::Error, Debug)]
pub enum OctoError {
    #[error("OCTOPUS_API_KEY is not set")]
    MissingApiKey,
    #[error("the API key is not a valid header value")]
    InvalidApiKey,
    #[error("unknown timezone `{0}`")]
    UnknownTimezone(String),
    #[error("--page-size must be at least 1")]
    ZeroPageSize,
    #[error("--jobs must be at least 1")]
    ZeroJobs,
}
