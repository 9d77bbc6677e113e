//! Helpers for golden-style text comparisons.
//!
//! Decoded files are rendered with [`TextRenderer`] and compared line by
//! line against expected text written inline in the test.

use xlog_core::{decode_bytes, DecodeSummary, DecoderConfig, TextRenderer, XlogResult};

/// Renders `data` as text.
pub fn render_text(data: &[u8], config: &DecoderConfig) -> XlogResult<String> {
    render_with(data, config, true).map(|(text, _)| text)
}

/// Renders `data` as text without frame preambles.
///
/// Output is then independent of how the records were framed.
pub fn render_records(data: &[u8], config: &DecoderConfig) -> XlogResult<String> {
    render_with(data, config, false).map(|(text, _)| text)
}

/// Renders `data` and also returns the decode summary.
pub fn render_with(
    data: &[u8],
    config: &DecoderConfig,
    show_frames: bool,
) -> XlogResult<(String, DecodeSummary)> {
    let mut renderer = TextRenderer::new(Vec::new()).show_frames(show_frames);
    let summary = decode_bytes(data, config, &mut renderer)?;
    let text = String::from_utf8_lossy(&renderer.into_inner()).into_owned();
    Ok((text, summary))
}

/// Asserts that `actual` matches `expected`, reporting the first differing
/// line.
pub fn assert_text_eq(name: &str, expected: &str, actual: &str) {
    if expected == actual {
        return;
    }
    let first_diff = expected
        .lines()
        .zip(actual.lines())
        .position(|(e, a)| e != a)
        .unwrap_or_else(|| expected.lines().count().min(actual.lines().count()));
    panic!(
        "Golden text '{}' differs at line {}:\n\
         --- Expected ---\n{}\n\
         --- Actual ---\n{}",
        name,
        first_diff + 1,
        expected,
        actual
    );
}

/// Hex encodes bytes for failure messages.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hex decodes a string, ignoring whitespace.
pub fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = s.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err("Hex string has odd length".into());
    }
    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).map_err(|e| e.to_string())?;
            u8::from_str_radix(text, 16).map_err(|e| format!("Invalid hex '{text}': {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_helpers() {
        assert_eq!(hex_encode(&[0xd5, 0xba, 0x0b, 0xab]), "d5ba0bab");
        assert_eq!(hex_decode("d5 ba 0b ab").unwrap(), [0xd5, 0xba, 0x0b, 0xab]);
        assert!(hex_decode("abc").is_err());
        assert!(hex_decode("zz").is_err());
    }

    #[test]
    fn equal_text_passes() {
        assert_text_eq("same", "a\nb\n", "a\nb\n");
    }

    #[test]
    #[should_panic(expected = "differs at line 2")]
    fn differing_text_reports_line() {
        assert_text_eq("diff", "a\nb\n", "a\nc\n");
    }
}
