/// Repair UTF-8 text that was decoded as Latin-1.
///
/// Facebook exports escape every UTF-8 byte as its own code point
/// (`"cafÃ©"` for "café"). When all chars fit in a byte they are
/// reassembled and decoded as UTF-8; otherwise, or if that fails, the input
/// is returned untouched.
pub fn fix_latin1(input: &str) -> String {
    let bytes: Option<Vec<u8>> = input
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect();

    bytes
        .and_then(|b| String::from_utf8(b).ok())
        .unwrap_or_else(|| input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repairs_mojibake() {
        assert_eq!(fix_latin1("caf\u{00c3}\u{00a9}"), "café");
        assert_eq!(fix_latin1("\u{00f0}\u{009f}\u{0098}\u{0080}"), "😀");
    }

    #[test]
    fn test_leaves_clean_text_alone() {
        assert_eq!(fix_latin1("plain ascii"), "plain ascii");
        assert_eq!(fix_latin1("already café ✓"), "already café ✓");
        assert_eq!(fix_latin1(""), "");
    }

    #[test]
    fn test_invalid_utf8_bytes_are_kept() {
        // a lone Latin-1 'é' is not valid UTF-8 on its own
        assert_eq!(fix_latin1("caf\u{00e9}"), "café");
    }
}
