//! 集成测试：属性测试（HOTP/TOTP 与 URI）

use otpkit::{
    HashAlgorithm, Hotp, OtpConfig, Secret, Totp, build_uri, parse_uri, random_secret_base32,
    random_string,
};
use proptest::prelude::*;

fn algorithm_strategy() -> impl Strategy<Value = HashAlgorithm> {
    prop_oneof![
        Just(HashAlgorithm::SHA1),
        Just(HashAlgorithm::SHA256),
        Just(HashAlgorithm::SHA512),
    ]
}

fn secret_strategy() -> impl Strategy<Value = Secret> {
    proptest::collection::vec(any::<u8>(), 1..64).prop_map(Secret::from_bytes)
}

proptest! {
    /// 相同输入总是生成相同的验证码
    #[test]
    fn hotp_is_deterministic(
        secret in secret_strategy(),
        counter in 0i64..i64::MAX / 2,
        algorithm in algorithm_strategy(),
    ) {
        let hotp = Hotp::new(OtpConfig::new(secret).with_algorithm(algorithm), 0).unwrap();
        prop_assert_eq!(hotp.at(counter).unwrap(), hotp.at(counter).unwrap());
    }

    /// 验证码长度等于位数且只包含数字
    #[test]
    fn code_length_matches_digits(
        secret in secret_strategy(),
        timestamp in 0i64..4_000_000_000,
        digits in 1u32..=9,
        algorithm in algorithm_strategy(),
    ) {
        let config = OtpConfig::new(secret)
            .with_digits(digits)
            .with_algorithm(algorithm);
        let code = Totp::new(config, 30).unwrap().at(timestamp).unwrap();
        prop_assert_eq!(code.len(), digits as usize);
        prop_assert!(code.bytes().all(|b| b.is_ascii_digit()));
    }

    /// 生成的验证码总能通过验证
    #[test]
    fn generated_codes_verify(
        secret in secret_strategy(),
        counter in 0i64..1_000_000,
        timestamp in 0i64..4_000_000_000,
    ) {
        let hotp = Hotp::with_defaults(secret.clone());
        prop_assert!(hotp.verify(&hotp.at(counter).unwrap(), counter).unwrap());

        let totp = Totp::with_defaults(secret);
        prop_assert!(totp.verify(&totp.at(timestamp).unwrap(), timestamp).unwrap());
    }

    /// 秒级窗口验证等价于窗口内任一秒的验证码匹配
    #[test]
    fn window_matches_any_second(
        secret in secret_strategy(),
        timestamp in 1_000i64..4_000_000_000,
        candidate_offset in -90i64..=90,
        window in 0u32..60,
    ) {
        let totp = Totp::with_defaults(secret);
        let candidate = totp.at(timestamp + candidate_offset).unwrap();

        let expected = (-i64::from(window)..=i64::from(window))
            .any(|offset| totp.at(timestamp + offset).unwrap() == candidate);
        prop_assert_eq!(
            totp.verify_with_window(&candidate, timestamp, window).unwrap(),
            expected
        );
    }

    /// URI 生成后再解析，配置保持不变
    #[test]
    fn uri_round_trip(
        secret in secret_strategy(),
        name in "[a-zA-Z0-9 @._:-]{1,20}",
        issuer in "[a-zA-Z0-9 .&]{0,12}",
        digits in 1u32..=9,
        period in 1u64..300,
        algorithm in algorithm_strategy(),
    ) {
        let uri = build_uri(
            secret.as_base32(),
            &name,
            &issuer,
            algorithm,
            digits,
            Some(period),
            None,
        );
        let totp = parse_uri(&uri).unwrap().into_totp().unwrap();

        prop_assert_eq!(totp.config().secret.as_base32(), secret.as_base32());
        prop_assert_eq!(&totp.config().name, &name);
        prop_assert_eq!(totp.config().issuer.clone().unwrap_or_default(), issuer);
        prop_assert_eq!(totp.config().digits, digits);
        prop_assert_eq!(totp.config().algorithm, algorithm);
        prop_assert_eq!(totp.interval(), period);
    }

    /// HOTP URI 保留计数器
    #[test]
    fn hotp_uri_keeps_counter(secret in secret_strategy(), counter in 0i64..i64::MAX) {
        let uri = build_uri(secret.as_base32(), "alice", "", HashAlgorithm::SHA1, 6, None, Some(counter));
        let hotp = parse_uri(&uri).unwrap().into_hotp().unwrap();
        prop_assert_eq!(hotp.initial_count(), counter);
    }

    /// 随机字符串只使用给定字符集
    #[test]
    fn random_string_uses_alphabet(length in 0usize..200, alphabet in "[a-z0-9]{1,36}") {
        let mut chars: Vec<char> = alphabet.chars().collect();
        chars.sort_unstable();
        chars.dedup();
        let alphabet: String = chars.into_iter().collect();

        let value = random_string(length, &alphabet).unwrap();
        prop_assert_eq!(value.chars().count(), length);
        prop_assert!(value.chars().all(|c| alphabet.contains(c)));
    }
}

#[test]
fn random_secret_is_usable() {
    for _ in 0..32 {
        let secret = random_secret_base32().unwrap();
        let totp = Totp::with_defaults(secret.as_str());
        assert_eq!(totp.at(0).unwrap().len(), 6);
    }
}
