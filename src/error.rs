//! 统一错误类型模块
//!
//! 提供 otpkit 库中所有操作的错误类型定义。
//!
//! 验证码不匹配不属于错误：`verify` 系列方法以 `Ok(false)` 表示。

use std::fmt;

/// otpkit 库的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// otpkit 库的错误类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// 配置错误（位数越界、时间步长无效）
    Config(ConfigError),

    /// 密钥无法按 Base32 解码
    InvalidSecret(String),

    /// 输入无效（负计数器、计数器溢出、非法字符集等）
    InvalidInput(String),

    /// otpauth:// URI 相关错误
    Uri(UriError),

    /// 加密相关错误
    Crypto(CryptoError),
}

impl Error {
    /// 创建一个输入无效错误
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// 创建一个密钥无效错误
    pub fn invalid_secret(msg: impl Into<String>) -> Self {
        Error::InvalidSecret(msg.into())
    }
}

/// 配置相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 位数必须在 1 到 9 之间
    DigitsOutOfRange(i64),
    /// 时间步长必须为正的秒数
    InvalidInterval(i64),
}

/// URI 相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    /// URI 格式错误或 scheme 不是 otpauth
    InvalidUri(String),
    /// 不支持的 OTP 类型（host 既不是 totp 也不是 hotp）
    UnsupportedType(String),
    /// 缺少 secret 参数
    MissingSecret,
    /// 数字参数无法解析
    InvalidNumber { key: String, value: String },
}

/// 加密相关错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// 随机数生成失败
    RngFailed(String),
    /// 密钥无效
    InvalidKey(String),
}

// ============================================================================
// Display 实现
// ============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Config error: {}", e),
            Error::InvalidSecret(msg) => write!(f, "Invalid secret: {}", msg),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::Uri(e) => write!(f, "URI error: {}", e),
            Error::Crypto(e) => write!(f, "Crypto error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DigitsOutOfRange(digits) => {
                write!(f, "digits must be between 1 and 9, got {}", digits)
            }
            ConfigError::InvalidInterval(interval) => {
                write!(f, "interval must be a positive number of seconds, got {}", interval)
            }
        }
    }
}

impl fmt::Display for UriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriError::InvalidUri(msg) => write!(f, "invalid uri: {}", msg),
            UriError::UnsupportedType(otp_type) => {
                write!(f, "not a supported otp type: {}", otp_type)
            }
            UriError::MissingSecret => write!(f, "no secret found in uri"),
            UriError::InvalidNumber { key, value } => {
                write!(f, "parameter '{}' is not a number: {}", key, value)
            }
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::RngFailed(msg) => write!(f, "random number generation failed: {}", msg),
            CryptoError::InvalidKey(msg) => write!(f, "invalid key: {}", msg),
        }
    }
}

// ============================================================================
// std::error::Error 实现
// ============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Uri(e) => Some(e),
            Error::Crypto(e) => Some(e),
            Error::InvalidSecret(_) | Error::InvalidInput(_) => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for UriError {}
impl std::error::Error for CryptoError {}

// ============================================================================
// From 实现 - 方便错误转换
// ============================================================================

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<UriError> for Error {
    fn from(err: UriError) -> Self {
        Error::Uri(err)
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        Error::Crypto(err)
    }
}
