//! # CPF Normalization
//!
//! Pure helpers for Brazilian individual taxpayer numbers (CPF). Every function
//! here is total: malformed input yields `false` or an unformatted passthrough
//! string, never an error, because it runs over every row of user supplied
//! spreadsheets.

/// Number of digits in a CPF, check digits included.
pub(crate) const CPF_LENGTH: usize = 11;

/// Result of running the whole normalization pipeline on one value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Normalized {
    /// Cleaned and zero padded digit string
    pub(crate) digits: String,
    /// Display form (`ddd.ddd.ddd-dd`) or the digits unchanged when not 11 long
    pub(crate) formatted: String,
    /// Check digit verdict over `digits`
    pub(crate) is_valid: bool,
}

/// Strips every character that is not an ASCII decimal digit.
///
/// # Arguments
/// * `input` - Free-form text, e.g. `"529.982.247-25"` or `" 52998224725 "`
///
/// # Returns
/// The digits in their original order; may be empty, shorter or longer than 11
pub(crate) fn clean(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Left-pads a digit string with `'0'` up to 11 characters.
///
/// Spreadsheet applications store CPFs as numbers and drop their leading zeros;
/// padding restores them. Input already 11 characters or longer is returned as is.
pub(crate) fn pad_to_11(digits: &str) -> String {
    format!("{digits:0>width$}", width = CPF_LENGTH)
}

/// Validates both CPF check digits.
///
/// Expects exactly 11 ASCII digits. Anything else is reported as invalid
/// rather than rejected, as are the repeated-digit sequences (`00000000000`,
/// `11111111111`, ...) that satisfy the arithmetic but are never issued.
pub(crate) fn is_valid_check_digits(digits: &str) -> bool {
    let bytes = digits.as_bytes();
    if bytes.len() != CPF_LENGTH || !bytes.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let values: Vec<u32> = bytes.iter().map(|byte| (byte - b'0') as u32).collect();
    if values.iter().all(|value| *value == values[0]) {
        return false;
    }
    check_digit(&values[..9]) == values[9] && check_digit(&values[..10]) == values[10]
}

/// Computes the check digit following `digits`.
///
/// Weights run from `len + 1` down to 2: 10..=2 for the first check digit
/// (nine leading digits) and 11..=2 for the second (ten leading digits).
fn check_digit(digits: &[u32]) -> u32 {
    let weight = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(index, digit)| digit * (weight - index as u32))
        .sum();
    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        11 - remainder
    }
}

/// Formats an 11 digit string as `ddd.ddd.ddd-dd`.
///
/// Strings of any other length pass through unchanged.
pub(crate) fn format(digits: &str) -> String {
    if digits.len() != CPF_LENGTH || !digits.is_ascii() {
        return digits.to_owned();
    }
    format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11]
    )
}

/// Runs `clean`, `pad_to_11`, `is_valid_check_digits` and `format` in order.
pub(crate) fn normalize(input: &str) -> Normalized {
    let digits = pad_to_11(&clean(input));
    let is_valid = is_valid_check_digits(&digits);
    let formatted = format(&digits);
    Normalized {
        digits,
        formatted,
        is_valid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn check_digits_accept_reference_cpf() {
        assert!(is_valid_check_digits("52998224725"));
        assert!(is_valid_check_digits("11144477735"));
        assert!(is_valid_check_digits("12345678909"));
    }

    #[test]
    fn check_digits_reject_repeated_sequences() {
        for digit in '0'..='9' {
            let digits: String = std::iter::repeat(digit).take(11).collect();
            assert!(!is_valid_check_digits(&digits), "{digits} should be invalid");
        }
    }

    #[test]
    fn check_digits_reject_tampered_digits() {
        assert!(!is_valid_check_digits("52998224724"));
        assert!(!is_valid_check_digits("52998224715"));
        assert!(!is_valid_check_digits("62998224725"));
    }

    #[test]
    fn check_digits_handle_remainder_below_two() {
        // weighted sum 11 leaves remainder 0, so the first check digit is 0
        assert!(is_valid_check_digits("00000003107"));
        assert!(!is_valid_check_digits("00000003117"));
        assert!(is_valid_check_digits("00000000191"));
    }

    #[test]
    fn check_digits_reject_malformed_input() {
        assert!(!is_valid_check_digits(""));
        assert!(!is_valid_check_digits("5299822472"));
        assert!(!is_valid_check_digits("529982247250"));
        assert!(!is_valid_check_digits("529.982.247"));
        assert!(!is_valid_check_digits("5299822472٥"));
    }

    #[test]
    fn clean_strips_punctuation_and_letters() {
        assert_eq!(clean("529.982.247-25"), "52998224725");
        assert_eq!(clean(" CPF: 529 982 247/25 "), "52998224725");
        assert_eq!(clean(""), "");
        assert_eq!(clean("abc"), "");
        assert_eq!(clean("1.23e10"), "12310");
    }

    #[test]
    fn pad_restores_leading_zeros() {
        assert_eq!(pad_to_11(&clean("123456789")), "00123456789");
        assert_eq!(pad_to_11(""), "00000000000");
        assert_eq!(pad_to_11("52998224725"), "52998224725");
        assert_eq!(pad_to_11("5299822472599"), "5299822472599");
    }

    #[test]
    fn format_groups_eleven_digits() {
        assert_eq!(format("52998224725"), "529.982.247-25");
        assert_eq!(format("00000000000"), "000.000.000-00");
    }

    #[test]
    fn format_passes_other_lengths_through() {
        assert_eq!(format("123"), "123");
        assert_eq!(format(""), "");
        assert_eq!(format("529982247251"), "529982247251");
    }

    #[test]
    fn normalize_validates_padded_digits() {
        let normalized = normalize("191");
        assert_eq!(normalized.digits, "00000000191");
        assert_eq!(normalized.formatted, "000.000.001-91");
        assert!(normalized.is_valid);

        let normalized = normalize("529.982.247-250");
        assert_eq!(normalized.digits, "529982247250");
        assert_eq!(normalized.formatted, "529982247250");
        assert!(!normalized.is_valid);
    }

    proptest! {
        #[test]
        fn pad_is_idempotent(input in "[0-9]{0,14}") {
            let once = pad_to_11(&input);
            prop_assert_eq!(pad_to_11(&once), once.clone());
            prop_assert!(once.len() >= CPF_LENGTH);
        }

        #[test]
        fn format_round_trips_through_clean(digits in "[0-9]{11}") {
            prop_assert_eq!(clean(&format(&digits)), digits);
        }

        #[test]
        fn clean_output_is_digits_only(input in ".*") {
            prop_assert!(clean(&input).bytes().all(|byte| byte.is_ascii_digit()));
        }

        #[test]
        fn generated_check_digits_validate(base in "[0-9]{9}") {
            let mut values: Vec<u32> = base.bytes().map(|byte| (byte - b'0') as u32).collect();
            values.push(check_digit(&values));
            values.push(check_digit(&values));
            let digits: String = values.iter().map(|value| char::from(b'0' + *value as u8)).collect();
            let repeated = digits.bytes().all(|byte| byte == digits.as_bytes()[0]);
            prop_assert_eq!(is_valid_check_digits(&digits), !repeated);
        }
    }
}
