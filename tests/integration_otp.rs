//! 集成测试：HOTP/TOTP
//!
//! 测试验证码生成、验证与随机密钥流程。

use otpkit::error::{ConfigError, Error};
use otpkit::{
    Clock, HashAlgorithm, Hotp, OtpConfig, OtpGenerator, Secret, Totp, random_secret_base32,
    random_secret_hex,
};

const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

/// 测试 HOTP 基本流程
#[test]
fn test_hotp_basic_flow() {
    // 1. 为用户生成密钥
    let secret = random_secret_base32().expect("Secret generation should succeed");
    let hotp = Hotp::new(OtpConfig::new(secret.as_str()), 0).expect("Config should be valid");

    // 2. 使用计数器 0 生成码
    let code_0 = hotp.at(0).expect("Code generation should succeed");
    assert_eq!(code_0.len(), 6, "HOTP code should be 6 digits");
    assert!(
        code_0.chars().all(|c| c.is_ascii_digit()),
        "HOTP code should only contain digits"
    );

    // 3. 验证计数器 0 的码
    assert!(
        hotp.verify(&code_0, 0).expect("Verification should work"),
        "Code for counter 0 should be valid"
    );

    // 4. 用错误的计数器验证应该失败（除非两个码恰好相同）
    let code_1 = hotp.at(1).unwrap();
    if code_0 != code_1 {
        assert!(
            !hotp.verify(&code_0, 1).unwrap(),
            "Code should fail with wrong counter"
        );
    }
}

/// 测试 HOTP 计数器同步
#[test]
fn test_hotp_counter_resync() {
    let hotp = Hotp::with_defaults(RFC_SECRET);
    let mut stored_counter = 0;

    // 用户在设备上多按了几次，实际使用的是计数器 4
    let code = hotp.at(4).unwrap();

    let result = hotp
        .verify_with_result(&code, stored_counter, 10)
        .expect("Verification should work");
    assert!(result.valid);
    assert_eq!(result.matched_counter, Some(4));

    stored_counter = result.next_counter;
    assert_eq!(stored_counter, 5);

    // 同一个码不能在新计数器下再次通过
    let replay = hotp.verify_with_result(&code, stored_counter, 4).unwrap();
    assert!(!replay.valid);
}

/// 测试 TOTP 基本流程（固定时间戳）
#[test]
fn test_totp_basic_flow() {
    let secret = random_secret_base32().unwrap();
    let totp = Totp::new(OtpConfig::new(secret.as_str()).with_digits(8), 30).unwrap();

    let timestamp = 1_700_000_000;
    let code = totp.at(timestamp).unwrap();
    assert_eq!(code.len(), 8);

    // 同一时间步内都有效
    let step_start = totp.time_step(timestamp) * 30;
    for t in step_start..step_start + 30 {
        assert!(totp.verify(&code, t).unwrap(), "Code should be valid at {}", t);
    }
}

/// 测试 TOTP 秒级窗口
#[test]
fn test_totp_window_verification() {
    let totp = Totp::with_defaults(RFC_SECRET);

    // 时间步边界：89 属于第 2 步，90 属于第 3 步
    let code = totp.at(89).unwrap();

    assert!(totp.verify_with_window(&code, 90, 1).unwrap());
    assert!(totp.verify_with_window(&code, 95, 6).unwrap());
    assert!(!totp.verify_with_window(&code, 95, 5).unwrap());
}

/// 测试 TOTP 时间步级偏差
#[test]
fn test_totp_skew_verification() {
    let totp = Totp::with_defaults(RFC_SECRET);
    let now = 1_700_000_000;

    let past = totp.at(now - 60).unwrap();
    let future = totp.at(now + 30).unwrap();

    let result = totp.verify_with_skew(&past, now, 2).unwrap();
    assert!(result.valid);
    assert_eq!(result.time_step_offset, -2);

    let result = totp.verify_with_skew(&future, now, 1).unwrap();
    assert!(result.valid);
    assert_eq!(result.time_step_offset, 1);

    assert!(!totp.verify_with_skew(&past, now, 1).unwrap().valid);
}

/// 测试注入时钟
#[test]
fn test_totp_injected_clock() {
    struct Frozen;

    impl Clock for Frozen {
        fn unix_timestamp(&self) -> i64 {
            1111111109
        }
    }

    let totp = Totp::new(OtpConfig::new(RFC_SECRET).with_digits(8), 30).unwrap();
    assert_eq!(totp.now_with(&Frozen).unwrap(), "07081804");
    assert!(totp.verify_now_with(&Frozen, "07081804").unwrap());
}

/// 测试全角数字在 NFKC 规范化后可以通过验证
#[test]
fn test_verify_normalizes_candidate() {
    let hotp = Hotp::with_defaults(RFC_SECRET);
    assert!(hotp.verify("７５５２２４", 0).unwrap());

    let totp = Totp::with_defaults(RFC_SECRET);
    let code = totp.at(1_700_000_000).unwrap();
    let wide: String = code
        .chars()
        .map(|c| char::from_u32(c as u32 - '0' as u32 + '０' as u32).unwrap())
        .collect();
    assert!(totp.verify(&wide, 1_700_000_000).unwrap());
}

/// 测试位数越界
#[test]
fn test_digits_validation() {
    for digits in [0, 10] {
        let hotp = Hotp::new(OtpConfig::new(RFC_SECRET).with_digits(digits), 0);
        let totp = Totp::new(OtpConfig::new(RFC_SECRET).with_digits(digits), 30);

        assert!(matches!(
            hotp,
            Err(Error::Config(ConfigError::DigitsOutOfRange(_)))
        ));
        assert!(matches!(
            totp,
            Err(Error::Config(ConfigError::DigitsOutOfRange(_)))
        ));
    }

    for digits in 1..=9 {
        let hotp = Hotp::new(OtpConfig::new(RFC_SECRET).with_digits(digits), 0).unwrap();
        assert_eq!(hotp.at(0).unwrap().len(), digits as usize);
    }
}

/// 测试无效密钥在派生时报错
#[test]
fn test_invalid_secret() {
    let totp = Totp::with_defaults("1111");
    assert!(matches!(totp.at(0), Err(Error::InvalidSecret(_))));
    assert!(matches!(
        totp.verify_with_window("123456", 100, 2),
        Err(Error::InvalidSecret(_))
    ));
}

/// 测试不同哈希算法
#[test]
fn test_algorithms() {
    let secret = Secret::from_bytes(b"12345678901234567890");
    let mut codes = Vec::new();

    for algorithm in [
        HashAlgorithm::SHA1,
        HashAlgorithm::SHA256,
        HashAlgorithm::SHA512,
    ] {
        let hotp = Hotp::new(OtpConfig::new(secret.clone()).with_algorithm(algorithm), 0).unwrap();
        let code = hotp.at(0).unwrap();
        assert!(hotp.verify(&code, 0).unwrap(), "Failed for {:?}", algorithm);
        codes.push(code);
    }

    // RFC 4226 SHA1 计数器 0
    assert_eq!(codes[0], "755224");
}

/// 测试通过共同接口使用 HOTP 与 TOTP
#[test]
fn test_generator_trait_objects() {
    let generators: Vec<Box<dyn OtpGenerator>> = vec![
        Box::new(Hotp::with_defaults(RFC_SECRET)),
        Box::new(Totp::with_defaults(RFC_SECRET)),
    ];

    for generator in &generators {
        let code = generator.at(59).unwrap();
        assert!(generator.verify(&code, 59).unwrap());
        assert!(generator.provisioning_uri("alice", "ACME").starts_with("otpauth://"));
    }
}

/// 测试随机密钥
#[test]
fn test_random_secrets() {
    let base32 = random_secret_base32().unwrap();
    assert_eq!(base32.len(), 32);
    assert!(
        base32
            .chars()
            .all(|c| "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567".contains(c))
    );

    // 随机 Base32 密钥可以直接用于生成验证码
    let decoded = Secret::new(base32.as_str()).decode().unwrap();
    assert_eq!(decoded.len(), 20);

    let hex = random_secret_hex().unwrap();
    assert_eq!(hex.len(), 40);
    assert!(hex.chars().all(|c| "ABCDEF0123456789".contains(c)));

    assert_ne!(random_secret_base32().unwrap(), base32);
}

/// 测试实例可以在线程间共享
#[test]
fn test_shared_across_threads() {
    use std::sync::Arc;
    use std::thread;

    let totp = Arc::new(Totp::with_defaults(RFC_SECRET));
    let expected = totp.at(1_700_000_000).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let totp = Arc::clone(&totp);
            thread::spawn(move || totp.at(1_700_000_000).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
