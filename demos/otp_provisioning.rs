//! OTP 绑定示例
//!
//! 展示如何使用 otpkit 为用户绑定 TOTP/HOTP 认证器并验证验证码。
//!
//! 运行: cargo run --example otp_provisioning

use otpkit::{HashAlgorithm, Hotp, OtpConfig, Totp, parse_uri, random_secret_base32};

/// 用户的 OTP 配置
struct UserOtpConfig {
    user_id: String,
    totp_secret: Option<String>,
    hotp_secret: Option<String>,
    hotp_counter: i64,
}

impl UserOtpConfig {
    fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            totp_secret: None,
            hotp_secret: None,
            hotp_counter: 0,
        }
    }
}

/// OTP 服务
struct OtpService {
    issuer: String,
}

impl OtpService {
    fn new(issuer: &str) -> Self {
        Self {
            issuer: issuer.to_string(),
        }
    }

    /// 启用 TOTP，返回供二维码使用的 URI
    fn enable_totp(&self, config: &mut UserOtpConfig) -> Result<String, String> {
        let secret = random_secret_base32().map_err(|e| format!("密钥生成失败: {}", e))?;
        let totp = Totp::new(
            OtpConfig::new(secret.as_str()).with_algorithm(HashAlgorithm::SHA256),
            30,
        )
        .map_err(|e| format!("配置无效: {}", e))?;

        config.totp_secret = Some(secret);
        Ok(totp.provisioning_uri(&config.user_id, &self.issuer))
    }

    /// 验证 TOTP，允许前后各 1 个时间步
    fn verify_totp(&self, config: &UserOtpConfig, code: &str, now: i64) -> Result<bool, String> {
        let secret = config.totp_secret.as_deref().ok_or("TOTP 未启用")?;
        let totp = Totp::new(
            OtpConfig::new(secret).with_algorithm(HashAlgorithm::SHA256),
            30,
        )
        .map_err(|e| format!("配置无效: {}", e))?;

        let result = totp
            .verify_with_skew(code, now, 1)
            .map_err(|e| format!("验证失败: {}", e))?;
        Ok(result.valid)
    }

    /// 启用 HOTP
    fn enable_hotp(&self, config: &mut UserOtpConfig) -> Result<String, String> {
        let secret = random_secret_base32().map_err(|e| format!("密钥生成失败: {}", e))?;
        let hotp = Hotp::with_defaults(secret.as_str());

        config.hotp_secret = Some(secret);
        config.hotp_counter = 0;
        Ok(hotp.provisioning_uri(&config.user_id, &self.issuer))
    }

    /// 验证 HOTP 并推进计数器
    fn verify_hotp(&self, config: &mut UserOtpConfig, code: &str) -> Result<bool, String> {
        let secret = config.hotp_secret.as_deref().ok_or("HOTP 未启用")?;
        let hotp = Hotp::with_defaults(secret);

        let result = hotp
            .verify_with_result(code, config.hotp_counter, 5)
            .map_err(|e| format!("验证失败: {}", e))?;
        if result.valid {
            config.hotp_counter = result.next_counter;
        }
        Ok(result.valid)
    }
}

fn main() -> Result<(), String> {
    println!("=== otpkit 绑定示例 ===\n");

    let service = OtpService::new("otpkit Demo");
    let mut user = UserOtpConfig::new("alice@example.com");

    // ------------------------------------------------------------------
    println!("1. 启用 TOTP");
    let uri = service.enable_totp(&mut user)?;
    println!("   二维码 URI: {}", uri);

    // 认证器扫码后生成验证码
    let app = parse_uri(&uri)
        .map_err(|e| format!("URI 解析失败: {}", e))?
        .into_totp()
        .ok_or("不是 TOTP URI")?;
    let now = 1_700_000_000;
    let code = app.at(now - 30).map_err(|e| e.to_string())?;
    println!("   认证器验证码（30 秒前）: {}", code);
    println!("   验证结果: {}", service.verify_totp(&user, &code, now)?);
    println!("   错误验证码: {}", service.verify_totp(&user, "000000", now)?);
    println!("   剩余时间: {} 秒\n", app.time_remaining(now));

    // ------------------------------------------------------------------
    println!("2. 启用 HOTP");
    let uri = service.enable_hotp(&mut user)?;
    println!("   二维码 URI: {}", uri);

    let app = parse_uri(&uri)
        .map_err(|e| format!("URI 解析失败: {}", e))?
        .into_hotp()
        .ok_or("不是 HOTP URI")?;

    // 用户在设备上多按了两次
    let code = app.at(2).map_err(|e| e.to_string())?;
    println!("   认证器验证码（计数器 2）: {}", code);
    println!("   验证结果: {}", service.verify_hotp(&mut user, &code)?);
    println!("   新计数器: {}", user.hotp_counter);
    println!("   重放验证: {}", service.verify_hotp(&mut user, &code)?);

    println!("\n=== 示例结束 ===");
    Ok(())
}
