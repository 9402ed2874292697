// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! CRC-16/CCITT-FALSE, the checksum carried by tag `63` of every payload.

/// Generator polynomial (x^16 + x^12 + x^5 + 1).
pub const CRC_POLYNOMIAL: u16 = 0x1021;
/// Initial register value.
pub const CRC_INITIAL: u16 = 0xFFFF;

/// Computes the CRC-16/CCITT-FALSE register over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(CRC_INITIAL, |register, &byte| {
        let mut register = register ^ ((byte as u16) << 8);
        for _ in 0..8 {
            register = if register & 0x8000 != 0 {
                (register << 1) ^ CRC_POLYNOMIAL
            } else {
                register << 1
            };
        }
        register
    })
}

/// Returns the checksum of `data` as 4 uppercase hex digits.
pub fn checksum(data: &str) -> String {
    format!("{:04X}", crc16(data.as_bytes()))
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case::empty_input("", "FFFF")]
    #[case::check_string("123456789", "29B1")]
    #[case::single_byte("A", "B915")]
    #[case::generated_payload(
        "00020101021229320016A0000006770101120108ORD-100158044111530376454071500.375A02TH5908MERCHANT6007BANGKOK6304",
        "85E4"
    )]
    fn known_answers(#[case] data: &str, #[case] expected: &str) {
        assert_eq!(checksum(data), expected);
    }

    #[test]
    fn empty_input_keeps_initial_register() {
        assert_eq!(crc16(&[]), CRC_INITIAL);
    }
}
