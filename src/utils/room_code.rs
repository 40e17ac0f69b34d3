use rand::Rng;

/// Alphabet for generated room codes. Ambiguous glyphs (0/O, 1/I/L) are
/// excluded so codes survive being read aloud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 6;

/// Generate a random room code. Collision checking against live rooms is the
/// caller's job.
#[must_use]
pub fn generate_room_code() -> String {
    let mut rng = rand::thread_rng();
    let mut code = String::with_capacity(CODE_LEN);
    for _ in 0..CODE_LEN {
        let idx = rng.gen_range(0..CODE_ALPHABET.len());
        code.push(char::from(CODE_ALPHABET[idx]));
    }
    code
}

/// Whether `code` has the shape of a generated room code. Case-insensitive.
#[must_use]
pub fn is_valid_room_code(code: &str) -> bool {
    code.len() == CODE_LEN
        && code
            .bytes()
            .all(|b| CODE_ALPHABET.contains(&b.to_ascii_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_validate() {
        for _ in 0..64 {
            let code = generate_room_code();
            assert_eq!(code.len(), 6, "bad length for {code}");
            assert!(is_valid_room_code(&code));
        }
    }

    #[test]
    fn ambiguous_glyphs_never_appear() {
        let mut seen = String::new();
        for _ in 0..256 {
            seen.push_str(&generate_room_code());
        }
        for banned in ['0', 'O', '1', 'I', 'L'] {
            assert!(!seen.contains(banned), "{banned} appeared in a code");
        }
    }

    #[test]
    fn validation_rejects_wrong_shapes() {
        assert!(is_valid_room_code("mnpq23"));
        assert!(!is_valid_room_code(""));
        assert!(!is_valid_room_code("AB 234"));
        assert!(!is_valid_room_code("ABCDEFG"));
        assert!(!is_valid_room_code("ABC10D"));
    }
}
