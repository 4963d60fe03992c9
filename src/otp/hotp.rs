//! HOTP (基于计数器的一次性密码) 实现模块
//!
//! ## 特性
//!
//! - 符合 RFC 4226 标准
//! - 支持 1 到 9 位验证码
//! - 支持计数器初始偏移和向前同步窗口
//!
//! ## 示例
//!
//! ```rust
//! use otpkit::otp::hotp::Hotp;
//!
//! // RFC 4226 附录 D 的测试密钥
//! let hotp = Hotp::with_defaults("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ");
//!
//! let code = hotp.at(1).unwrap();
//! assert_eq!(code, "287082");
//!
//! assert!(hotp.verify(&code, 1).unwrap());
//! assert!(!hotp.verify(&code, 2).unwrap());
//! ```

use crate::error::{Error, Result};
use crate::otp::OtpGenerator;
use crate::otp::core::{OtpConfig, Secret};
use crate::otp::uri::UriParams;
use crate::random::constant_time_compare_str;

/// HOTP 验证结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotpVerifyResult {
    /// 是否验证成功
    pub valid: bool,

    /// 匹配时的计数器值（如果验证成功）
    pub matched_counter: Option<i64>,

    /// 建议的下一个计数器值
    pub next_counter: i64,
}

/// HOTP 生成器
///
/// 构造后不可变，可以在线程间共享。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotp {
    config: OtpConfig,
    initial_count: i64,
}

impl Hotp {
    /// 创建新的 HOTP 生成器
    ///
    /// `initial_count` 会加到每次查询的计数器上。
    ///
    /// # Errors
    ///
    /// 位数不在 1..=9 时返回 `Config` 错误。
    pub fn new(config: OtpConfig, initial_count: i64) -> Result<Self> {
        Ok(Self {
            config: config.validated()?,
            initial_count,
        })
    }

    /// 使用默认配置创建（6 位、SHA1、初始计数 0）
    pub fn with_defaults(secret: impl Into<Secret>) -> Self {
        Self {
            config: OtpConfig::new(secret),
            initial_count: 0,
        }
    }

    /// 生成指定计数器的验证码
    pub fn at(&self, counter: i64) -> Result<String> {
        let effective = self
            .initial_count
            .checked_add(counter)
            .ok_or_else(|| Error::invalid_input("counter overflow"))?;
        self.config.derive(effective)
    }

    /// 验证指定计数器的验证码
    ///
    /// 不匹配时返回 `Ok(false)`；派生失败时返回错误。
    pub fn verify(&self, candidate: &str, counter: i64) -> Result<bool> {
        let expected = self.at(counter)?;
        Ok(constant_time_compare_str(&expected, candidate))
    }

    /// 在向前同步窗口内验证验证码
    ///
    /// 依次检查 `counter..=counter + look_ahead`，命中后返回匹配的计数器和
    /// 建议的下一个计数器，调用方据此更新自己保存的计数器。
    pub fn verify_with_result(
        &self,
        candidate: &str,
        counter: i64,
        look_ahead: u32,
    ) -> Result<HotpVerifyResult> {
        for offset in 0..=i64::from(look_ahead) {
            let check_counter = counter
                .checked_add(offset)
                .ok_or_else(|| Error::invalid_input("counter overflow"))?;

            if self.verify(candidate, check_counter)? {
                return Ok(HotpVerifyResult {
                    valid: true,
                    matched_counter: Some(check_counter),
                    next_counter: check_counter.saturating_add(1),
                });
            }
        }

        Ok(HotpVerifyResult {
            valid: false,
            matched_counter: None,
            next_counter: counter,
        })
    }

    /// 生成 otpauth://hotp/ URI
    ///
    /// 初始计数写入 `counter` 参数。
    pub fn provisioning_uri(&self, name: &str, issuer: &str) -> String {
        self.uri_params(name, issuer).build()
    }

    /// 生成带 `image` 参数的 otpauth://hotp/ URI
    pub fn provisioning_uri_with_image(&self, name: &str, issuer: &str, image: &str) -> String {
        self.uri_params(name, issuer).with_image(image).build()
    }

    /// 获取配置
    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// 获取初始计数
    pub fn initial_count(&self) -> i64 {
        self.initial_count
    }

    fn uri_params(&self, name: &str, issuer: &str) -> UriParams {
        UriParams::new(self.config.secret.as_base32(), name)
            .with_issuer(issuer)
            .with_algorithm(self.config.algorithm)
            .with_digits(self.config.digits)
            .with_counter(self.initial_count)
    }
}

impl OtpGenerator for Hotp {
    fn at(&self, position: i64) -> Result<String> {
        Hotp::at(self, position)
    }

    fn verify(&self, candidate: &str, position: i64) -> Result<bool> {
        Hotp::verify(self, candidate, position)
    }

    fn provisioning_uri(&self, name: &str, issuer: &str) -> String {
        Hotp::provisioning_uri(self, name, issuer)
    }
}
