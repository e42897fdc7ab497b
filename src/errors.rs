use std::fmt;

#[derive(Debug, Clone)]
pub enum PanstatsError {
    StorageOperation(String),
    Serialization(String),
}

impl PanstatsError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            PanstatsError::StorageOperation(_) => "E001",
            PanstatsError::Serialization(_) => "E002",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            PanstatsError::StorageOperation(_) => "Storage Operation Error",
            PanstatsError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            PanstatsError::StorageOperation(msg) => msg,
            PanstatsError::Serialization(msg) => msg,
        }
    }
}

impl fmt::Display for PanstatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for PanstatsError {}

// 便捷的构造函数
impl PanstatsError {
    pub fn storage_operation<T: Into<String>>(msg: T) -> Self {
        PanstatsError::StorageOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        PanstatsError::Serialization(msg.into())
    }
}

impl From<serde_json::Error> for PanstatsError {
    fn from(err: serde_json::Error) -> Self {
        PanstatsError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PanstatsError>;
