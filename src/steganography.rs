//! # LSB 位编解码
//!
//! 每个逻辑 bit 占用一个完整的载体字节，只替换其最低有效位。
//! 载体窗口中的第 `i` 个字节保存数值的第 `i` 位 (低位在前)。

use crate::constants::{BYTE_CARRIER_LEN, LENGTH_CARRIER_LEN};

/// 将 `value` 的低 `carrier.len()` 位依次写入各载体字节的最低位。
fn spread(mut value: u32, carrier: &mut [u8]) {
    for byte in carrier.iter_mut() {
        *byte = (*byte & 0xFE) | (value & 1) as u8;
        value >>= 1;
    }
}

/// 从各载体字节的最低位重新拼出数值。
fn gather(carrier: &[u8]) -> u32 {
    carrier
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &byte)| acc | (u32::from(byte & 1) << i))
}

/// 把一个字节隐藏到 8 个载体字节中。
pub fn byte_to_carrier(value: u8, carrier: &mut [u8; BYTE_CARRIER_LEN]) {
    spread(u32::from(value), carrier);
}

/// 从 8 个载体字节中恢复一个字节。
pub fn carrier_to_byte(carrier: &[u8; BYTE_CARRIER_LEN]) -> u8 {
    gather(carrier) as u8
}

/// 把一个 `u32` 隐藏到 32 个载体字节中。
pub fn int_to_carrier(value: u32, carrier: &mut [u8; LENGTH_CARRIER_LEN]) {
    spread(value, carrier);
}

/// 从 32 个载体字节中恢复一个 `u32`。
pub fn carrier_to_int(carrier: &[u8; LENGTH_CARRIER_LEN]) -> u32 {
    gather(carrier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_bits_are_placed_lsb_first() {
        let mut carrier = [0u8; BYTE_CARRIER_LEN];
        byte_to_carrier(0b1000_0101, &mut carrier);
        assert_eq!(carrier, [1, 0, 1, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn only_the_lowest_bit_changes() {
        let mut carrier = [0xFF, 0xFE, 0x80, 0x7F, 0x00, 0x01, 0xAA, 0x55];
        let original = carrier;
        byte_to_carrier(0x00, &mut carrier);
        for (new, old) in carrier.iter().zip(original.iter()) {
            assert_eq!(new & 0xFE, old & 0xFE);
            assert_eq!(new & 1, 0);
        }
    }

    #[test]
    fn byte_survives_any_carrier_content() {
        let carrier_patterns = [
            [0x00; 8],
            [0xFF; 8],
            [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0],
        ];
        for pattern in carrier_patterns {
            for value in [0x00, 0x41, 0x7F, 0x80, 0xFF] {
                let mut carrier = pattern;
                byte_to_carrier(value, &mut carrier);
                assert_eq!(carrier_to_byte(&carrier), value);
            }
        }
    }

    #[test]
    fn int_bit_31_lands_in_last_carrier_byte() {
        let mut carrier = [0xAAu8; LENGTH_CARRIER_LEN];
        int_to_carrier(0x8000_0001, &mut carrier);
        assert_eq!(carrier[0] & 1, 1);
        assert!(carrier[1..31].iter().all(|b| b & 1 == 0));
        assert_eq!(carrier[31] & 1, 1);
        assert_eq!(carrier_to_int(&carrier), 0x8000_0001);
    }

    #[test]
    fn int_extremes_decode_back() {
        for value in [0, 1, 4, 0xDEAD_BEEF, u32::MAX] {
            let mut carrier = [0x5Au8; LENGTH_CARRIER_LEN];
            int_to_carrier(value, &mut carrier);
            assert_eq!(carrier_to_int(&carrier), value);
        }
    }
}
