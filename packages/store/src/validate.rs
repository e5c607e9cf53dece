//! Input normalization helpers for client records.
//!
//! CPF and telefone are stored digits-only; masks ("123.456.789-01",
//! "(11) 98765-4321") are stripped before length validation.

/// Number of digits in a CPF.
pub const CPF_DIGITS: usize = 11;

/// Strip every non-digit character.
pub fn digits(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// A CPF is valid when it has exactly 11 digits after stripping.
pub fn is_valid_cpf(digits_only: &str) -> bool {
    digits_only.len() == CPF_DIGITS && digits_only.chars().all(|c| c.is_ascii_digit())
}

/// A telefone is valid when it has 10 or 11 digits after stripping.
pub fn is_valid_telefone(digits_only: &str) -> bool {
    (10..=11).contains(&digits_only.len()) && digits_only.chars().all(|c| c.is_ascii_digit())
}

/// Trim free text; empty optional fields become `None`.
pub fn clean_optional(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
