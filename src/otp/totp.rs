//! TOTP (基于时间的一次性密码) 实现模块
//!
//! 兼容 Google Authenticator、Authy 等应用。
//!
//! ## 特性
//!
//! - 符合 RFC 6238 标准
//! - 支持自定义时间步长和位数
//! - 时间戳由调用方传入，只有 `now`/`verify_now` 读取系统时钟
//! - 秒级窗口与时间步级偏差两种容错验证
//!
//! ## 示例
//!
//! ```rust
//! use otpkit::otp::core::OtpConfig;
//! use otpkit::otp::totp::Totp;
//!
//! let totp = Totp::new(OtpConfig::new("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ").with_digits(8), 30).unwrap();
//!
//! // RFC 6238 附录 B
//! assert_eq!(totp.at(59).unwrap(), "94287082");
//! assert!(totp.verify("94287082", 59).unwrap());
//! ```

use chrono::{DateTime, Utc};

use crate::error::{ConfigError, Error, Result};
use crate::otp::OtpGenerator;
use crate::otp::core::{OtpConfig, Secret};
use crate::otp::uri::UriParams;
use crate::random::constant_time_compare_str;

/// 默认时间步长（秒）
pub const DEFAULT_INTERVAL: u64 = 30;

/// 时间源
///
/// 只在 `now_with`/`verify_now_with` 中使用，测试中可以替换为固定时间。
pub trait Clock {
    /// 当前 Unix 时间戳（秒）
    fn unix_timestamp(&self) -> i64;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// TOTP 验证结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpVerifyResult {
    /// 是否验证成功
    pub valid: bool,

    /// 匹配的时间步偏移量（0 表示当前步，负数表示过去，正数表示未来）
    pub time_step_offset: i64,
}

/// TOTP 生成器
///
/// 构造后不可变，可以在线程间共享。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Totp {
    config: OtpConfig,
    interval: u64,
}

impl Totp {
    /// 创建新的 TOTP 生成器
    ///
    /// # Errors
    ///
    /// - 位数不在 1..=9 时返回 `Config(DigitsOutOfRange)`
    /// - `interval` 为 0 时返回 `Config(InvalidInterval)`
    pub fn new(config: OtpConfig, interval: u64) -> Result<Self> {
        if interval == 0 {
            return Err(ConfigError::InvalidInterval(0).into());
        }

        Ok(Self {
            config: config.validated()?,
            interval,
        })
    }

    /// 使用默认配置创建（6 位、SHA1、30 秒）
    pub fn with_defaults(secret: impl Into<Secret>) -> Self {
        Self {
            config: OtpConfig::new(secret),
            interval: DEFAULT_INTERVAL,
        }
    }

    /// 时间戳对应的时间步（向下取整）
    pub fn time_step(&self, timestamp: i64) -> i64 {
        // 结果的绝对值不超过 |timestamp|
        i128::from(timestamp).div_euclid(i128::from(self.interval)) as i64
    }

    /// 生成指定时间戳的验证码
    pub fn at(&self, timestamp: i64) -> Result<String> {
        self.config.derive(self.time_step(timestamp))
    }

    /// 生成指定时间的验证码
    pub fn at_datetime(&self, time: &DateTime<Utc>) -> Result<String> {
        self.at(time.timestamp())
    }

    /// 生成当前的验证码
    pub fn now(&self) -> Result<String> {
        self.now_with(&SystemClock)
    }

    /// 使用指定时间源生成当前的验证码
    pub fn now_with(&self, clock: &impl Clock) -> Result<String> {
        self.at(clock.unix_timestamp())
    }

    /// 验证指定时间戳的验证码
    ///
    /// 不匹配时返回 `Ok(false)`；派生失败时返回错误。
    pub fn verify(&self, candidate: &str, timestamp: i64) -> Result<bool> {
        let expected = self.at(timestamp)?;
        Ok(constant_time_compare_str(&expected, candidate))
    }

    /// 验证指定时间的验证码
    pub fn verify_datetime(&self, candidate: &str, time: &DateTime<Utc>) -> Result<bool> {
        self.verify(candidate, time.timestamp())
    }

    /// 验证当前的验证码
    pub fn verify_now(&self, candidate: &str) -> Result<bool> {
        self.verify_now_with(&SystemClock, candidate)
    }

    /// 使用指定时间源验证当前的验证码
    pub fn verify_now_with(&self, clock: &impl Clock, candidate: &str) -> Result<bool> {
        self.verify(candidate, clock.unix_timestamp())
    }

    /// 在时间戳前后 `window` 秒内验证
    ///
    /// 按 `timestamp - window` 到 `timestamp + window` 的顺序逐秒检查，
    /// 首次匹配即返回 `true`；任何一步派生失败都会立即返回该错误。
    pub fn verify_with_window(&self, candidate: &str, timestamp: i64, window: u32) -> Result<bool> {
        let window = i64::from(window);
        for i in -window..=window {
            let at = timestamp
                .checked_add(i)
                .ok_or_else(|| Error::invalid_input("timestamp overflow"))?;

            if self.verify(candidate, at)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// 在前后 `steps` 个时间步内验证，并返回匹配的偏移量
    ///
    /// 容忍 `steps * interval` 秒的时钟偏差。
    pub fn verify_with_skew(
        &self,
        candidate: &str,
        timestamp: i64,
        steps: u32,
    ) -> Result<TotpVerifyResult> {
        let current = self.time_step(timestamp);

        for offset in -i64::from(steps)..=i64::from(steps) {
            let step = current
                .checked_add(offset)
                .ok_or_else(|| Error::invalid_input("time step overflow"))?;
            let expected = self.config.derive(step)?;

            if constant_time_compare_str(&expected, candidate) {
                return Ok(TotpVerifyResult {
                    valid: true,
                    time_step_offset: offset,
                });
            }
        }

        Ok(TotpVerifyResult {
            valid: false,
            time_step_offset: 0,
        })
    }

    /// 指定时间戳下当前验证码的剩余有效时间（秒）
    pub fn time_remaining(&self, timestamp: i64) -> u64 {
        let elapsed = i128::from(timestamp).rem_euclid(i128::from(self.interval)) as u64;
        self.interval - elapsed
    }

    /// 生成 otpauth://totp/ URI
    ///
    /// 时间步长写入 `period` 参数（默认 30 秒时省略）。
    pub fn provisioning_uri(&self, name: &str, issuer: &str) -> String {
        UriParams::new(self.config.secret.as_base32(), name)
            .with_issuer(issuer)
            .with_algorithm(self.config.algorithm)
            .with_digits(self.config.digits)
            .with_period(self.interval)
            .build()
    }

    /// 获取配置
    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// 获取时间步长（秒）
    pub fn interval(&self) -> u64 {
        self.interval
    }
}

impl OtpGenerator for Totp {
    fn at(&self, position: i64) -> Result<String> {
        Totp::at(self, position)
    }

    fn verify(&self, candidate: &str, position: i64) -> Result<bool> {
        Totp::verify(self, candidate, position)
    }

    fn provisioning_uri(&self, name: &str, issuer: &str) -> String {
        Totp::provisioning_uri(self, name, issuer)
    }
}
