//! 一次性密码 (OTP) 模块
//!
//! ## 支持的类型
//!
//! - **HOTP**: 基于计数器的一次性密码 (RFC 4226)
//! - **TOTP**: 基于时间的一次性密码 (RFC 6238，Google Authenticator 兼容)
//! - **otpauth:// URI**: 认证器应用扫码使用的配置 URI
//!
//! ## TOTP 示例
//!
//! ```rust
//! use otpkit::otp::totp::Totp;
//! use otpkit::random::random_secret_base32;
//!
//! // 为用户生成密钥
//! let secret = random_secret_base32().unwrap();
//! let totp = Totp::with_defaults(secret.as_str());
//!
//! // 生成二维码 URI
//! let uri = totp.provisioning_uri("alice@example.com", "MyApp");
//! assert!(uri.starts_with("otpauth://totp/MyApp:alice%40example.com?"));
//!
//! // 验证用户输入的验证码
//! let code = totp.at(1_700_000_000).unwrap();
//! assert!(totp.verify(&code, 1_700_000_000).unwrap());
//! ```
//!
//! ## 解析 URI 示例
//!
//! ```rust
//! use otpkit::otp::{OtpGenerator, uri::parse_uri};
//!
//! let otp = parse_uri("otpauth://hotp/ACME:alice?secret=GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ&counter=0").unwrap();
//! assert_eq!(otp.at(1).unwrap(), "287082");
//! ```

pub mod core;
pub mod hotp;
pub mod totp;
pub mod uri;

pub use self::core::{HashAlgorithm, OtpConfig, Secret, derive_code};
pub use hotp::{Hotp, HotpVerifyResult};
pub use totp::{Clock, SystemClock, Totp, TotpVerifyResult};
pub use uri::{Otp, OtpKind, UriParams, build_uri, parse_uri};

use crate::error::Result;

/// HOTP 与 TOTP 的共同能力
///
/// `position` 对 HOTP 是计数器，对 TOTP 是 Unix 时间戳（秒）。
pub trait OtpGenerator {
    /// 生成指定位置的验证码
    fn at(&self, position: i64) -> Result<String>;

    /// 验证指定位置的验证码
    fn verify(&self, candidate: &str, position: i64) -> Result<bool>;

    /// 生成 otpauth:// URI
    fn provisioning_uri(&self, name: &str, issuer: &str) -> String;
}
