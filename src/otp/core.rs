//! OTP 核心：共享配置与验证码派生
//!
//! HOTP 与 TOTP 共用同一条派生路径（RFC 4226 §5.3）：
//!
//! 1. 密钥按 Base32 解码（转大写，补 `=` 到 8 的倍数）
//! 2. 计数器编码为 8 字节大端序
//! 3. 以所选哈希算法计算 HMAC
//! 4. 动态截断得到 31 位整数
//! 5. 对 `10^digits` 取模并左补零
//!
//! ## 示例
//!
//! ```rust
//! use otpkit::otp::core::{derive_code, HashAlgorithm, Secret};
//!
//! let secret = Secret::from_bytes(b"12345678901234567890");
//! let code = derive_code(&secret, 0, 6, HashAlgorithm::SHA1).unwrap();
//! assert_eq!(code, "755224");
//! ```

use std::fmt;

use base32::{Alphabet, decode as base32_decode, encode as base32_encode};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::error::{ConfigError, CryptoError, Error, Result};

/// 默认验证码位数
pub const DEFAULT_DIGITS: u32 = 6;

/// 默认账户名称
pub const DEFAULT_NAME: &str = "Secret";

/// 默认哈希算法
pub const DEFAULT_ALGORITHM: HashAlgorithm = HashAlgorithm::SHA1;

/// 允许的最大位数（`10^9` 仍小于 31 位截断值的上限）
pub const MAX_DIGITS: u32 = 9;

/// OTP 哈希算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HashAlgorithm {
    /// SHA-1（默认，最广泛支持）
    #[default]
    SHA1,
    /// SHA-256
    SHA256,
    /// SHA-512
    SHA512,
}

impl HashAlgorithm {
    /// 获取算法名称（用于 otpauth URI）
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::SHA1 => "SHA1",
            HashAlgorithm::SHA256 => "SHA256",
            HashAlgorithm::SHA512 => "SHA512",
        }
    }

    /// 从 URI 中的 `algorithm` 参数值解析
    ///
    /// 只接受大写的 `SHA1`、`SHA256`、`SHA512`，其他值返回 `None`。
    pub fn from_uri_value(value: &str) -> Option<Self> {
        match value {
            "SHA1" => Some(HashAlgorithm::SHA1),
            "SHA256" => Some(HashAlgorithm::SHA256),
            "SHA512" => Some(HashAlgorithm::SHA512),
            _ => None,
        }
    }

    /// HMAC 输出长度（字节）
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::SHA1 => 20,
            HashAlgorithm::SHA256 => 32,
            HashAlgorithm::SHA512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base32 编码的共享密钥
///
/// 保存调用方提供的原始字符串，在派生验证码时才解码，
/// 因此无效密钥会在 `at`/`verify` 时以 `InvalidSecret` 失败。
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Secret(String);

impl Secret {
    /// 包装一个 Base32 字符串（不做校验）
    pub fn new(base32: impl Into<String>) -> Self {
        Self(base32.into())
    }

    /// 从原始字节创建（无填充 Base32 编码）
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self(base32_encode(
            Alphabet::Rfc4648 { padding: false },
            bytes.as_ref(),
        ))
    }

    /// 调用方提供的 Base32 字符串
    pub fn as_base32(&self) -> &str {
        &self.0
    }

    /// 解码为原始密钥字节
    ///
    /// 只对 ASCII 字母不区分大小写；长度不是 8 的倍数时自动补 `=`。
    pub fn decode(&self) -> Result<Vec<u8>> {
        let mut normalized = self.0.to_ascii_uppercase();
        let missing = normalized.len() % 8;
        if missing != 0 {
            normalized.push_str(&"=".repeat(8 - missing));
        }

        let unpadded = normalized.trim_end_matches('=');
        // 有效的 Base32 数据长度对 8 取余只能是 0、2、4、5、7
        if unpadded.contains('=') || matches!(unpadded.len() % 8, 1 | 3 | 6) {
            log::debug!("secret of {} chars is not valid base32", self.0.len());
            return Err(Error::invalid_secret("illegal base32 data"));
        }

        base32_decode(Alphabet::Rfc4648 { padding: true }, &normalized).ok_or_else(|| {
            log::debug!("secret of {} chars is not valid base32", self.0.len());
            Error::invalid_secret("illegal base32 data")
        })
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// OTP 配置（HOTP 与 TOTP 共用）
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OtpConfig {
    /// 共享密钥
    pub secret: Secret,

    /// 验证码位数，1 到 9，默认 6 位
    pub digits: u32,

    /// 账户名称，默认 "Secret"
    pub name: String,

    /// 签发者名称（显示在认证器应用中）
    pub issuer: Option<String>,

    /// 哈希算法
    pub algorithm: HashAlgorithm,
}

impl OtpConfig {
    /// 使用默认参数创建配置
    pub fn new(secret: impl Into<Secret>) -> Self {
        Self {
            secret: secret.into(),
            digits: DEFAULT_DIGITS,
            name: DEFAULT_NAME.to_string(),
            issuer: None,
            algorithm: DEFAULT_ALGORITHM,
        }
    }

    /// 设置验证码位数
    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    /// 设置账户名称，空字符串保留默认名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.is_empty() {
            DEFAULT_NAME.to_string()
        } else {
            name
        };
        self
    }

    /// 设置签发者，空字符串表示无签发者
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();
        self.issuer = (!issuer.is_empty()).then_some(issuer);
        self
    }

    /// 设置哈希算法
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        check_digits(self.digits)
    }

    /// 使用本配置派生指定计数器的验证码
    pub fn derive(&self, counter: i64) -> Result<String> {
        derive_code(&self.secret, counter, self.digits, self.algorithm)
    }

    pub(crate) fn validated(mut self) -> Result<Self> {
        self.validate()?;
        if self.name.is_empty() {
            self.name = DEFAULT_NAME.to_string();
        }
        if self.issuer.as_deref() == Some("") {
            self.issuer = None;
        }
        Ok(self)
    }
}

/// 派生验证码
///
/// 所有 HOTP/TOTP 验证码都经由此函数生成。
///
/// # Errors
///
/// - `counter` 为负数时返回 `InvalidInput`
/// - 密钥无法解码时返回 `InvalidSecret`
/// - `digits` 不在 1..=9 时返回 `Config`
pub fn derive_code(
    secret: &Secret,
    counter: i64,
    digits: u32,
    algorithm: HashAlgorithm,
) -> Result<String> {
    check_digits(digits)?;

    let counter = u64::try_from(counter)
        .map_err(|_| Error::invalid_input("input must be a non-negative integer"))?;

    let key = secret.decode()?;
    let hash = compute_hmac(&key, &counter.to_be_bytes(), algorithm)?;
    let binary = dynamic_truncate(&hash)
        .ok_or_else(|| Error::Crypto(CryptoError::InvalidKey("hmac digest too short".into())))?;

    // 取模得到指定位数的码
    let code = binary % 10u32.pow(digits);

    // 左填充零
    Ok(format!("{:0width$}", code, width = digits as usize))
}

/// RFC 4226 动态截断
///
/// 以最后一个字节的低 4 位作为偏移，取 4 字节并屏蔽最高位，得到 31 位整数。
/// 偏移处不足 4 字节时返回 `None`。
pub(crate) fn dynamic_truncate(hash: &[u8]) -> Option<u32> {
    let offset = (hash.last()? & 0x0f) as usize;
    let window = hash.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([
        window[0] & 0x7f,
        window[1],
        window[2],
        window[3],
    ]))
}

fn compute_hmac(key: &[u8], message: &[u8], algorithm: HashAlgorithm) -> Result<Vec<u8>> {
    match algorithm {
        HashAlgorithm::SHA1 => mac_bytes::<Hmac<Sha1>>(key, message),
        HashAlgorithm::SHA256 => mac_bytes::<Hmac<Sha256>>(key, message),
        HashAlgorithm::SHA512 => mac_bytes::<Hmac<Sha512>>(key, message),
    }
}

fn mac_bytes<M: Mac + hmac::digest::KeyInit>(key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let mut mac = <M as Mac>::new_from_slice(key)
        .map_err(|e| Error::Crypto(CryptoError::InvalidKey(e.to_string())))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn check_digits(digits: u32) -> Result<()> {
    if digits == 0 || digits > MAX_DIGITS {
        return Err(ConfigError::DigitsOutOfRange(i64::from(digits)).into());
    }
    Ok(())
}
