use thiserror::Error;

#[derive(Debug, Error)]
pub enum DimmerError {
    #[error("Failed to create dim surface: {0}")]
    SurfaceCreation(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Invalid scenario: {0}")]
    Scenario(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type DimmerResult<T> = Result<T, DimmerError>;

impl From<&str> for DimmerError {
    fn from(value: &str) -> Self {
        DimmerError::Config(value.to_owned())
    }
}

impl From<String> for DimmerError {
    fn from(value: String) -> Self {
        DimmerError::Config(value)
    }
}
