//! Helper predicates for script runtimes.
//!
//! Script runtime implementations expose these to scripts alongside the
//! `data` binding, so validation scripts can call national-ID checksum
//! validators, email format checks and date parsing without reimplementing
//! them.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Validates a Brazilian CPF (11 digits with two check digits).
/// Punctuation is ignored; repeated-digit sequences are rejected.
pub fn is_valid_cpf(input: &str) -> bool {
    let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 11 {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let check = |count: usize| -> u32 {
        let weight_start = count as u32 + 1;
        let sum: u32 = digits[..count]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (weight_start - i as u32))
            .sum();
        let rem = (sum * 10) % 11;
        if rem == 10 {
            0
        } else {
            rem
        }
    };

    check(9) == digits[9] && check(10) == digits[10]
}

/// Validates a Brazilian CNPJ (14 digits with two check digits).
pub fn is_valid_cnpj(input: &str) -> bool {
    let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 14 {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let check = |weights: &[u32]| -> u32 {
        let sum: u32 = digits
            .iter()
            .zip(weights.iter())
            .map(|(d, w)| d * w)
            .sum();
        let rem = sum % 11;
        if rem < 2 {
            0
        } else {
            11 - rem
        }
    };

    let first = check(&[5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]);
    let second = check(&[6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]);

    first == digits[12] && second == digits[13]
}

/// Checks basic email shape: local part, `@`, domain with a dot.
pub fn is_valid_email(input: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$").unwrap()
    });
    re.is_match(input)
}

/// Parses a date in ISO (`2026-08-28`) or Brazilian (`28/08/2026`) form.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(input, "%d/%m/%Y"))
        .ok()
}
