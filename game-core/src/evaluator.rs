use game_types::{GUESS_MAX, GUESS_MIN, GameError, Verdict};
use std::cmp::Ordering;

/// Compare a guess with the target.
///
/// The caller is expected to have validated `guess` with [`parse_guess`] or
/// [`validate_guess`]; out-of-range values are never clamped here.
pub fn evaluate(guess: u8, target: u8) -> Verdict {
    match guess.cmp(&target) {
        Ordering::Less => Verdict::Up,
        Ordering::Greater => Verdict::Down,
        Ordering::Equal => Verdict::Correct,
    }
}

pub fn validate_guess(value: i64) -> Result<u8, GameError> {
    u8::try_from(value)
        .ok()
        .filter(|guess| (GUESS_MIN..=GUESS_MAX).contains(guess))
        .ok_or_else(|| GameError::InvalidGuess {
            input: value.to_string(),
        })
}

/// Parse raw player input into a guess in `GUESS_MIN..=GUESS_MAX`.
pub fn parse_guess(raw: &str) -> Result<u8, GameError> {
    let trimmed = raw.trim();
    let value: i64 = trimmed.parse().map_err(|_| GameError::InvalidGuess {
        input: trimmed.to_string(),
    })?;
    validate_guess(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_all_pairs() {
        for target in GUESS_MIN..=GUESS_MAX {
            for guess in GUESS_MIN..=GUESS_MAX {
                let verdict = evaluate(guess, target);
                assert_eq!(verdict == Verdict::Correct, guess == target);
                assert_eq!(verdict == Verdict::Up, guess < target);
                assert_eq!(verdict == Verdict::Down, guess > target);
            }
        }
    }

    #[test]
    fn test_parse_guess_accepts_bounds_and_whitespace() {
        assert_eq!(parse_guess("1"), Ok(1));
        assert_eq!(parse_guess("100"), Ok(100));
        assert_eq!(parse_guess("  42 "), Ok(42));
    }

    #[test]
    fn test_parse_guess_rejects_out_of_range() {
        assert!(matches!(parse_guess("0"), Err(GameError::InvalidGuess { .. })));
        assert!(matches!(parse_guess("101"), Err(GameError::InvalidGuess { .. })));
        assert!(matches!(parse_guess("-5"), Err(GameError::InvalidGuess { .. })));
        assert!(matches!(
            parse_guess("99999999999999999999"),
            Err(GameError::InvalidGuess { .. })
        ));
    }

    #[test]
    fn test_parse_guess_rejects_non_numeric() {
        assert_eq!(
            parse_guess("abc"),
            Err(GameError::InvalidGuess {
                input: "abc".to_string()
            })
        );
        assert!(parse_guess("").is_err());
        assert!(parse_guess("4.5").is_err());
    }
}
