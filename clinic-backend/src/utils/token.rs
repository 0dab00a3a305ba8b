// src/utils/token.rs

//! OTP コードとリフレッシュトークンのハッシュ化

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// 指定桁数の数字コードを生成（先頭ゼロを含む）
pub fn generate_numeric_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// HMAC-SHA256(secret, code) の16進表現
pub fn hash_otp_code(secret: &str, code: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(code.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// 保存済みハッシュとの定数時間比較
pub fn verify_otp_code(secret: &str, code: &str, expected_hex: &str) -> bool {
    let Ok(expected) = hex::decode(expected_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(code.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// リフレッシュトークンは SHA-256 の16進で保存する
pub fn hash_refresh_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
