use thiserror::Error;

/// 核心操作的错误分类
#[derive(Debug, Error)]
pub enum ReconError {
    /// 输入结构不符合预期，未做任何处理
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 点操作引用的分区或单号不存在
    #[error("not found: {0}")]
    NotFound(String),

    /// 底层存储读写失败
    #[error("store error: {0}")]
    Store(String),
}

impl ReconError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

impl From<std::io::Error> for ReconError {
    fn from(e: std::io::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<csv::Error> for ReconError {
    fn from(e: csv::Error) -> Self {
        Self::Store(e.to_string())
    }
}

pub type ReconResult<T> = Result<T, ReconError>;
