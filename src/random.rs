//! 安全随机数生成模块
//!
//! 提供密码学安全的随机字节与随机字符串生成，用于生成 OTP 共享密钥，
//! 以及防时序攻击的常量时间比较。

use rand::{TryRngCore, rngs::OsRng};
use subtle::ConstantTimeEq;
use unicode_normalization::UnicodeNormalization;

use crate::error::{CryptoError, Error, Result};

/// RFC 4648 Base32 字符集
pub const BASE32_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// 十六进制字符集
pub const HEX_ALPHABET: &str = "ABCDEF0123456789";

/// 单批随机字节的最小长度
const MIN_BATCH_LEN: usize = 16;

/// 单批随机字节的最大长度
const MAX_BATCH_LEN: usize = 2048;

/// 生成指定长度的随机字节数组
///
/// 使用操作系统提供的密码学安全随机数生成器 (CSPRNG)，
/// 失败时直接返回错误，不会退回到弱随机源。
///
/// # Example
///
/// ```rust
/// use otpkit::random::generate_random_bytes;
///
/// let bytes = generate_random_bytes(32).unwrap();
/// assert_eq!(bytes.len(), 32);
/// ```
pub fn generate_random_bytes(length: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; length];
    fill_random(&mut bytes)?;
    Ok(bytes)
}

/// 从字符集中均匀地抽取 `length` 个字符
///
/// 为避免取模偏差，大于 `255 - (256 % n)` 的随机字节会被丢弃并重新抽取，
/// 因此字符集中每个字符被选中的概率严格相等。随机字节按批读取，
/// 批大小按剩余需求估算，并限制在 16 到 2048 字节之间。
///
/// # Errors
///
/// - 字符集为空、超过 256 个字符或包含重复字符时返回 `InvalidInput`
/// - 系统随机源失败时返回 `Crypto(RngFailed)`
///
/// # Example
///
/// ```rust
/// use otpkit::random::random_string;
///
/// let pin = random_string(8, "0123456789").unwrap();
/// assert_eq!(pin.len(), 8);
/// assert!(pin.chars().all(|c| c.is_ascii_digit()));
/// ```
pub fn random_string(length: usize, alphabet: &str) -> Result<String> {
    let chars = checked_alphabet(alphabet)?;
    if length == 0 {
        return Ok(String::new());
    }

    let n = chars.len();
    let max_usable = 255 - (256 % n);

    let mut buf = vec![0u8; batch_len(length, max_usable)];
    let mut out = String::with_capacity(length);
    let mut picked = 0;

    loop {
        fill_random(&mut buf)?;

        picked += pick_chars(&buf, &chars, max_usable, &mut out, length - picked);
        if picked == length {
            return Ok(out);
        }

        let next = batch_len(length - picked, max_usable);
        log::trace!(
            "random batch exhausted with {} chars outstanding, refilling {} bytes",
            length - picked,
            next
        );
        buf.resize(next, 0);
    }
}

/// 生成 32 个字符的 Base32 随机密钥
///
/// # Example
///
/// ```rust
/// use otpkit::random::random_secret_base32;
///
/// let secret = random_secret_base32().unwrap();
/// assert_eq!(secret.len(), 32);
/// ```
pub fn random_secret_base32() -> Result<String> {
    random_string(32, BASE32_ALPHABET)
}

/// 生成 40 个字符的十六进制随机密钥（大写）
pub fn random_secret_hex() -> Result<String> {
    random_string(40, HEX_ALPHABET)
}

// ============================================================================
// 常量时间比较
// ============================================================================

/// 常量时间比较两个字节切片
///
/// 用于防止时序攻击
///
/// # Example
///
/// ```rust
/// use otpkit::random::constant_time_compare;
///
/// assert!(constant_time_compare(b"287082", b"287082"));
/// assert!(!constant_time_compare(b"287082", b"287083"));
/// ```
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// 常量时间比较两个字符串
///
/// 比较前先对两侧做 Unicode NFKC 规范化，
/// 因此全角数字 `"２８７０８２"` 与 `"287082"` 视为相等。
///
/// # Example
///
/// ```rust
/// use otpkit::random::constant_time_compare_str;
///
/// assert!(constant_time_compare_str("２８７０８２", "287082"));
/// ```
pub fn constant_time_compare_str(a: &str, b: &str) -> bool {
    let a: String = a.nfkc().collect();
    let b: String = b.nfkc().collect();
    constant_time_compare(a.as_bytes(), b.as_bytes())
}

// ============================================================================
// 辅助函数
// ============================================================================

fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| Error::Crypto(CryptoError::RngFailed(e.to_string())))
}

/// 从随机字节中挑选最多 `need` 个字符追加到 `out`，返回实际挑选的数量
///
/// 大于 `max_usable` 的字节被丢弃。
fn pick_chars(
    buf: &[u8],
    chars: &[char],
    max_usable: usize,
    out: &mut String,
    need: usize,
) -> usize {
    let mut picked = 0;
    for &byte in buf {
        if picked == need {
            break;
        }
        let value = byte as usize;
        if value > max_usable {
            continue;
        }
        out.push(chars[value % chars.len()]);
        picked += 1;
    }
    picked
}

/// 估算产出 `need` 个字符所需的随机字节数
fn batch_len(need: usize, max_usable: usize) -> usize {
    let estimated = (need * 255).div_ceil(max_usable);
    estimated.clamp(MIN_BATCH_LEN, MAX_BATCH_LEN)
}

fn checked_alphabet(alphabet: &str) -> Result<Vec<char>> {
    let chars: Vec<char> = alphabet.chars().collect();

    if chars.is_empty() || chars.len() > 256 {
        return Err(Error::invalid_input(format!(
            "alphabet must contain between 1 and 256 characters, got {}",
            chars.len()
        )));
    }

    for (i, c) in chars.iter().enumerate() {
        if chars[..i].contains(c) {
            return Err(Error::invalid_input(format!(
                "alphabet contains duplicate character {:?}",
                c
            )));
        }
    }

    Ok(chars)
}
