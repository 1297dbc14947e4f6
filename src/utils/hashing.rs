// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sha2::{Digest, Sha256};

/// 计算输入文本的SHA-256十六进制摘要
///
/// 用于任务去重和响应缓存的键生成
pub fn input_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_hash_is_stable() {
        let a = input_hash("hello world");
        let b = input_hash("hello world");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_input_hash_differs_for_different_inputs() {
        assert_ne!(input_hash("hello"), input_hash("world"));
    }

    #[test]
    fn test_input_hash_known_vector() {
        // sha256("abc")
        assert_eq!(
            input_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
