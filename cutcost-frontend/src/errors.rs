use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("终端输出失败: {0}")]
    Terminal(#[from] std::io::Error),
    #[error("{0}")]
    Rejected(String),
}
