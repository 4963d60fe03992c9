//! # otpkit
//!
//! 一次性密码 (OTP) 生成与验证库。
//!
//! ## 功能特性
//!
//! - **HOTP**: 基于计数器的一次性密码 (RFC 4226)
//! - **TOTP**: 基于时间的一次性密码 (RFC 6238)
//! - **多种哈希算法**: SHA1（默认）、SHA256、SHA512
//! - **常量时间验证**: NFKC 规范化后的常量时间比较
//! - **otpauth:// URI**: 生成与解析认证器应用使用的配置 URI
//! - **安全随机密钥**: 无取模偏差的随机 Base32/十六进制密钥
//!
//! 密钥存储、速率限制与重放检测由调用方负责。
//!
//! ## Features
//!
//! - `serde` - 为配置类型派生 `Serialize`/`Deserialize`
//!
//! ## HOTP 示例
//!
//! ```rust
//! use otpkit::{Hotp, OtpConfig};
//!
//! let hotp = Hotp::new(OtpConfig::new("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ"), 0).unwrap();
//!
//! assert_eq!(hotp.at(0).unwrap(), "755224");
//! assert!(hotp.verify("287082", 1).unwrap());
//! ```
//!
//! ## TOTP 示例
//!
//! ```rust
//! use otpkit::{HashAlgorithm, OtpConfig, Totp, random_secret_base32};
//!
//! // 为用户生成密钥
//! let secret = random_secret_base32().unwrap();
//!
//! let config = OtpConfig::new(secret.as_str())
//!     .with_algorithm(HashAlgorithm::SHA256)
//!     .with_issuer("MyApp");
//! let totp = Totp::new(config, 30).unwrap();
//!
//! // 生成二维码 URI
//! let uri = totp.provisioning_uri("alice@example.com", "MyApp");
//! assert!(uri.contains("algorithm=SHA256"));
//!
//! // 允许前后各 1 个时间步的时钟偏差
//! let now = 1_700_000_000;
//! let code = totp.at(now - 30).unwrap();
//! assert!(totp.verify_with_skew(&code, now, 1).unwrap().valid);
//! ```
//!
//! ## URI 解析示例
//!
//! ```rust
//! use otpkit::{Otp, OtpGenerator, parse_uri};
//!
//! let otp = parse_uri("otpauth://totp/ACME:alice?secret=JBSWY3DPEHPK3PXP&digits=8").unwrap();
//! assert!(matches!(otp, Otp::Totp(_)));
//! assert_eq!(otp.config().digits, 8);
//!
//! let code = otp.at(1_700_000_000).unwrap();
//! assert!(otp.verify(&code, 1_700_000_000).unwrap());
//! ```

pub mod error;
pub mod otp;
pub mod random;

pub use error::{Error, Result};

// ============================================================================
// OTP 相关导出
// ============================================================================

pub use otp::core::{HashAlgorithm, OtpConfig, Secret, derive_code};
pub use otp::hotp::{Hotp, HotpVerifyResult};
pub use otp::totp::{Clock, SystemClock, Totp, TotpVerifyResult};
pub use otp::uri::{Otp, OtpKind, UriParams, build_uri, parse_uri};
pub use otp::OtpGenerator;

// ============================================================================
// 随机数生成函数导出
// ============================================================================

pub use random::{
    constant_time_compare, constant_time_compare_str, generate_random_bytes, random_secret_base32,
    random_secret_hex, random_string,
};
