//! otpauth:// URI 编解码
//!
//! 格式：
//!
//! ```text
//! otpauth://{totp|hotp}/{[issuer:]name}?issuer=..&counter=..&algorithm=..&digits=..&period=..&secret=..
//! ```
//!
//! 生成时省略等于默认值的参数（`algorithm=SHA1`、`digits=6`、`period=30`），
//! 解析时缺省的参数回落到同样的默认值。

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{ConfigError, Error, Result, UriError};
use crate::otp::OtpGenerator;
use crate::otp::core::{DEFAULT_DIGITS, HashAlgorithm, OtpConfig};
use crate::otp::hotp::Hotp;
use crate::otp::totp::{DEFAULT_INTERVAL, Totp};

/// URI scheme
pub const SCHEME: &str = "otpauth";

/// OTP 类型（URI 的 host 部分）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OtpKind {
    /// 基于计数器
    Hotp,
    /// 基于时间
    Totp,
}

impl OtpKind {
    /// URI 中使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpKind::Hotp => "hotp",
            OtpKind::Totp => "totp",
        }
    }
}

impl fmt::Display for OtpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// 生成
// ============================================================================

/// 生成 URI 所需的全部参数
///
/// 设置了 `counter` 即为 HOTP，否则为 TOTP。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriParams {
    /// Base32 密钥
    pub secret: String,
    /// 账户名称
    pub name: String,
    /// 签发者（空字符串表示无）
    pub issuer: String,
    /// 哈希算法
    pub algorithm: HashAlgorithm,
    /// 验证码位数
    pub digits: u32,
    /// TOTP 时间步长
    pub period: Option<u64>,
    /// HOTP 初始计数
    pub counter: Option<i64>,
    /// 认证器应用显示的图标地址
    pub image: Option<String>,
}

impl UriParams {
    /// 使用默认参数创建
    pub fn new(secret: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            name: name.into(),
            issuer: String::new(),
            algorithm: HashAlgorithm::default(),
            digits: DEFAULT_DIGITS,
            period: None,
            counter: None,
            image: None,
        }
    }

    /// 设置签发者
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// 设置哈希算法
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// 设置验证码位数
    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    /// 设置 TOTP 时间步长
    pub fn with_period(mut self, period: u64) -> Self {
        self.period = Some(period);
        self
    }

    /// 设置 HOTP 初始计数
    pub fn with_counter(mut self, counter: i64) -> Self {
        self.counter = Some(counter);
        self
    }

    /// 设置图标地址
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// OTP 类型
    pub fn kind(&self) -> OtpKind {
        if self.counter.is_some() {
            OtpKind::Hotp
        } else {
            OtpKind::Totp
        }
    }

    /// 生成 otpauth:// URI
    pub fn build(&self) -> String {
        let mut label = urlencoding::encode(&self.name).into_owned();
        let mut query: Vec<(&str, String)> = Vec::new();

        if !self.issuer.is_empty() {
            let issuer = urlencoding::encode(&self.issuer);
            label = format!("{}:{}", issuer, label);
            query.push(("issuer", issuer.into_owned()));
        } else if label == "." || label == ".." {
            // 单独的 "." 或 ".." 会被当作路径段移除，加空签发者前缀保留
            label = format!(":{}", label);
        }

        if let Some(counter) = self.counter {
            query.push(("counter", counter.to_string()));
        }

        if self.algorithm != HashAlgorithm::SHA1 {
            query.push(("algorithm", self.algorithm.as_str().to_string()));
        }

        if self.digits != DEFAULT_DIGITS {
            query.push(("digits", self.digits.to_string()));
        }

        if let Some(period) = self.period.filter(|&p| p != DEFAULT_INTERVAL) {
            query.push(("period", period.to_string()));
        }

        query.push(("secret", urlencoding::encode(&self.secret).into_owned()));

        if let Some(ref image) = self.image {
            query.push(("image", urlencoding::encode(image).into_owned()));
        }

        let query = query
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}://{}/{}?{}", SCHEME, self.kind(), label, query)
    }
}

/// 生成 otpauth:// URI
///
/// 提供 `counter` 时生成 HOTP URI，否则生成 TOTP URI。
pub fn build_uri(
    secret: &str,
    name: &str,
    issuer: &str,
    algorithm: HashAlgorithm,
    digits: u32,
    period: Option<u64>,
    counter: Option<i64>,
) -> String {
    UriParams {
        secret: secret.to_string(),
        name: name.to_string(),
        issuer: issuer.to_string(),
        algorithm,
        digits,
        period,
        counter,
        image: None,
    }
    .build()
}

// ============================================================================
// 解析
// ============================================================================

/// 解析结果：HOTP 或 TOTP
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Otp {
    /// 基于计数器
    Hotp(Hotp),
    /// 基于时间
    Totp(Totp),
}

impl Otp {
    /// OTP 类型
    pub fn kind(&self) -> OtpKind {
        match self {
            Otp::Hotp(_) => OtpKind::Hotp,
            Otp::Totp(_) => OtpKind::Totp,
        }
    }

    /// 共享配置
    pub fn config(&self) -> &OtpConfig {
        match self {
            Otp::Hotp(hotp) => hotp.config(),
            Otp::Totp(totp) => totp.config(),
        }
    }

    /// 取出 HOTP
    pub fn into_hotp(self) -> Option<Hotp> {
        match self {
            Otp::Hotp(hotp) => Some(hotp),
            Otp::Totp(_) => None,
        }
    }

    /// 取出 TOTP
    pub fn into_totp(self) -> Option<Totp> {
        match self {
            Otp::Totp(totp) => Some(totp),
            Otp::Hotp(_) => None,
        }
    }
}

impl OtpGenerator for Otp {
    fn at(&self, position: i64) -> Result<String> {
        match self {
            Otp::Hotp(hotp) => hotp.at(position),
            Otp::Totp(totp) => totp.at(position),
        }
    }

    fn verify(&self, candidate: &str, position: i64) -> Result<bool> {
        match self {
            Otp::Hotp(hotp) => hotp.verify(candidate, position),
            Otp::Totp(totp) => totp.verify(candidate, position),
        }
    }

    fn provisioning_uri(&self, name: &str, issuer: &str) -> String {
        match self {
            Otp::Hotp(hotp) => hotp.provisioning_uri(name, issuer),
            Otp::Totp(totp) => totp.provisioning_uri(name, issuer),
        }
    }
}

impl FromStr for Otp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_uri(s)
    }
}

/// 解析 otpauth:// URI
///
/// 路径按第一个 `:` 拆分为 `issuer:name`；路径中没有签发者时使用 `issuer` 参数。
/// 无法识别的 `algorithm` 值会被忽略，保留默认的 SHA1。
///
/// # Errors
///
/// - scheme 不是 `otpauth` 或 URI 格式错误：`Uri(InvalidUri)`
/// - host 不是 `totp`/`hotp`：`Uri(UnsupportedType)`
/// - 缺少 `secret`：`Uri(MissingSecret)`
/// - `digits`/`period`/`counter` 不是整数：`Uri(InvalidNumber)`
/// - 位数或时间步长越界：`Config`
pub fn parse_uri(uri: &str) -> Result<Otp> {
    let url = Url::parse(uri).map_err(|e| UriError::InvalidUri(e.to_string()))?;

    if url.scheme() != SCHEME {
        return Err(UriError::InvalidUri(format!(
            "expected scheme '{}', got '{}'",
            SCHEME,
            url.scheme()
        ))
        .into());
    }

    let kind = match url.host_str() {
        Some("totp") => OtpKind::Totp,
        Some("hotp") => OtpKind::Hotp,
        other => return Err(UriError::UnsupportedType(other.unwrap_or_default().to_string()).into()),
    };

    // 先按原始路径中的第一个 ':' 拆分，再分别解码，编码后的 %3A 不参与拆分
    let path = url.path();
    let path = path.strip_prefix('/').unwrap_or(path);
    let (path_issuer, name) = match path.split_once(':') {
        Some((issuer, name)) => (Some(decode_label(issuer)?), decode_label(name)?),
        None => (None, decode_label(path)?),
    };

    // 重复的参数以第一次出现为准
    let mut params: HashMap<String, String> = HashMap::new();
    for (key, value) in url.query_pairs() {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }

    for key in params.keys() {
        if !matches!(
            key.as_str(),
            "secret" | "issuer" | "algorithm" | "digits" | "period" | "counter" | "image"
        ) {
            log::debug!("ignoring unknown otpauth parameter '{}'", key);
        }
    }

    let secret = params
        .get("secret")
        .filter(|s| !s.is_empty())
        .ok_or(UriError::MissingSecret)?;

    let digits = match parse_number(&params, "digits")? {
        Some(n) => u32::try_from(n).map_err(|_| ConfigError::DigitsOutOfRange(n))?,
        None => DEFAULT_DIGITS,
    };

    let period = match parse_number(&params, "period")? {
        Some(n) => u64::try_from(n).map_err(|_| ConfigError::InvalidInterval(n))?,
        None => DEFAULT_INTERVAL,
    };

    let counter = parse_number(&params, "counter")?.unwrap_or(0);

    let mut algorithm = HashAlgorithm::default();
    if let Some(value) = params.get("algorithm").filter(|v| !v.is_empty()) {
        match HashAlgorithm::from_uri_value(value) {
            Some(parsed) => algorithm = parsed,
            None => log::debug!("ignoring unrecognized otpauth algorithm '{}'", value),
        }
    }

    let issuer = path_issuer
        .filter(|issuer| !issuer.is_empty())
        .or_else(|| params.get("issuer").cloned())
        .unwrap_or_default();

    let config = OtpConfig::new(secret.as_str())
        .with_digits(digits)
        .with_name(name)
        .with_issuer(issuer)
        .with_algorithm(algorithm);

    match kind {
        OtpKind::Totp => Ok(Otp::Totp(Totp::new(config, period)?)),
        OtpKind::Hotp => Ok(Otp::Hotp(Hotp::new(config, counter)?)),
    }
}

fn decode_label(part: &str) -> Result<String> {
    urlencoding::decode(part)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| UriError::InvalidUri(format!("label is not valid utf-8: {}", e)).into())
}

/// 解析整数参数，缺省或空值返回 `None`
fn parse_number(params: &HashMap<String, String>, key: &str) -> Result<Option<i64>> {
    match params.get(key).filter(|v| !v.is_empty()) {
        Some(value) => value.parse::<i64>().map(Some).map_err(|_| {
            UriError::InvalidNumber {
                key: key.to_string(),
                value: value.clone(),
            }
            .into()
        }),
        None => Ok(None),
    }
}
