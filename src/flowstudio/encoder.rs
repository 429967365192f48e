//! # Diagram Render Tokens
//!
//! PlantUML-compatible render servers take the diagram source inside the URL:
//!
//! ```text
//! https://<server>/svg/<token>
//! ```
//!
//! The token is built in three steps:
//!
//! 1. The text is taken as UTF-8 bytes.
//! 2. The bytes are compressed with raw DEFLATE (no zlib or gzip header) at the
//!    best compression level.
//! 3. The compressed bytes are written in a base64 variant with its own
//!    alphabet, `0-9A-Za-z-_`, three bytes at a time. A short final group is
//!    padded with zero bytes, so the token length is always a multiple of 4 and
//!    there is never any `=` padding.
//!
//! [`encode`] never fails. If compression fails, the token falls back to the
//! URL-safe base64 of the raw text, which the caller can still put in a URL.
//!
//! [`decode`] reverses the process so a diagram can be reopened from a pasted
//! render URL.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Output alphabet, indexed by 6-bit value.
pub const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

/// Public PlantUML server.
pub const DEFAULT_SERVER: &str = "https://www.plantuml.com/plantuml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagramFormat {
    #[default]
    Svg,
    Png,
    Txt,
}

impl DiagramFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramFormat::Svg => "svg",
            DiagramFormat::Png => "png",
            DiagramFormat::Txt => "txt",
        }
    }
}

impl fmt::Display for DiagramFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagramFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "svg" => Ok(DiagramFormat::Svg),
            "png" => Ok(DiagramFormat::Png),
            "txt" | "ascii" => Ok(DiagramFormat::Txt),
            other => Err(format!("Unknown diagram format: {}", other)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token length {0} is not a multiple of 4")]
    InvalidLength(usize),

    #[error("invalid character '{ch}' at position {position}")]
    InvalidCharacter { ch: char, position: usize },

    #[error("token does not inflate: {0}")]
    Inflate(String),

    #[error("decoded diagram is not valid UTF-8")]
    Utf8,
}

/// Encode diagram text into a render token.
pub fn encode(text: &str) -> String {
    encode_with(text, deflate)
}

/// Encode with a caller-supplied compressor.
///
/// A compressor error switches to the plain base64 fallback token.
pub fn encode_with<F>(text: &str, compress: F) -> String
where
    F: FnOnce(&[u8]) -> io::Result<Vec<u8>>,
{
    match compress(text.as_bytes()) {
        Ok(compressed) => encode_bytes(&compressed),
        Err(e) => {
            warn!(error = %e, "diagram compression failed, using uncompressed token");
            fallback_token(text)
        }
    }
}

/// Build the full image URL for a diagram.
pub fn render_url(server: &str, text: &str, format: DiagramFormat) -> String {
    token_url(server, &encode(text), format)
}

pub fn token_url(server: &str, token: &str, format: DiagramFormat) -> String {
    format!("{}/{}/{}", server.trim_end_matches('/'), format, token)
}

/// Raw DEFLATE at the best compression level.
pub fn deflate(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(bytes.len() / 2 + 16), Compression::best());
    encoder.write_all(bytes)?;
    encoder.finish()
}

pub fn inflate(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Write bytes in the render alphabet, zero-padding the last group of 3.
pub fn encode_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let b1 = chunk[0];
        let b2 = chunk.get(1).copied().unwrap_or(0);
        let b3 = chunk.get(2).copied().unwrap_or(0);

        let sextets = [
            b1 >> 2,
            ((b1 & 0x3) << 4) | (b2 >> 4),
            ((b2 & 0xF) << 2) | (b3 >> 6),
            b3 & 0x3F,
        ];
        for value in sextets {
            out.push(ALPHABET[value as usize] as char);
        }
    }
    out
}

/// Reverse [`encode_bytes`]. Padding bytes of the last group are kept.
pub fn decode_bytes(token: &str) -> Result<Vec<u8>, DecodeError> {
    if let Some((position, ch)) = token.char_indices().find(|(_, c)| sextet(*c).is_none()) {
        return Err(DecodeError::InvalidCharacter { ch, position });
    }
    if token.len() % 4 != 0 {
        return Err(DecodeError::InvalidLength(token.len()));
    }

    let mut out = Vec::with_capacity(token.len() / 4 * 3);
    let chars: Vec<u8> = token.chars().filter_map(sextet).collect();
    for group in chars.chunks(4) {
        out.push((group[0] << 2) | (group[1] >> 4));
        out.push((group[1] << 4) | (group[2] >> 2));
        out.push((group[2] << 6) | group[3]);
    }
    Ok(out)
}

/// Recover the diagram text from a render token.
pub fn decode(token: &str) -> Result<String, DecodeError> {
    let compressed = decode_bytes(token)?;
    let raw = inflate(&compressed).map_err(|e| DecodeError::Inflate(e.to_string()))?;
    String::from_utf8(raw).map_err(|_| DecodeError::Utf8)
}

fn sextet(c: char) -> Option<u8> {
    let value = match c {
        '0'..='9' => c as u8 - b'0',
        'A'..='Z' => c as u8 - b'A' + 10,
        'a'..='z' => c as u8 - b'a' + 36,
        '-' => 62,
        '_' => 63,
        _ => return None,
    };
    Some(value)
}

fn fallback_token(text: &str) -> String {
    URL_SAFE.encode(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "@startuml\nAlice -> Bob\n@enduml";

    fn in_alphabet(token: &str) -> bool {
        token.bytes().all(|b| ALPHABET.contains(&b))
    }

    #[test]
    fn test_alphabet_is_64_distinct_chars() {
        let mut seen = ALPHABET.to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 64);
    }

    #[test]
    fn test_encode_bytes_known_groups() {
        assert_eq!(encode_bytes(b"Man"), "JM5k");
        assert_eq!(encode_bytes(&[0, 0, 0]), "0000");
        assert_eq!(encode_bytes(&[0xFF, 0xFF, 0xFF]), "____");
        // single trailing byte is padded with two zero bytes
        assert_eq!(encode_bytes(&[0xFF]), "_m00");
        assert_eq!(encode_bytes(&[]), "");
    }

    #[test]
    fn test_output_alphabet_and_length() {
        let inputs = [
            "",
            "a",
            "ab",
            "abc",
            SAMPLE,
            "@startuml\n用户 -> 前端: 输入账号密码\n@enduml",
            "emoji 🚀 and tabs\t\t",
        ];
        for input in inputs {
            let token = encode(input);
            assert!(in_alphabet(&token), "bad char in token for {:?}", input);
            assert_eq!(token.len() % 4, 0, "length for {:?}", input);
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        assert_eq!(encode(SAMPLE), encode(SAMPLE));
    }

    #[test]
    fn test_deflate_roundtrip_multibyte() {
        let text = "@startuml\nactor 用户\n用户 -> 系统: 登录\n@enduml";
        let compressed = deflate(text.as_bytes()).unwrap();
        assert_eq!(inflate(&compressed).unwrap(), text.as_bytes());
    }

    #[test]
    fn test_sample_token_roundtrips() {
        let token = encode(SAMPLE);
        assert!(!token.is_empty());
        assert_eq!(token.len() % 4, 0);
        assert!(in_alphabet(&token));

        let bytes = decode_bytes(&token).unwrap();
        assert_eq!(inflate(&bytes).unwrap(), SAMPLE.as_bytes());
        assert_eq!(decode(&token).unwrap(), SAMPLE);
    }

    #[test]
    fn test_decode_bytes_keeps_padding() {
        assert_eq!(decode_bytes("JM5k").unwrap(), b"Man");
        assert_eq!(decode_bytes("_m00").unwrap(), vec![0xFF, 0, 0]);
    }

    #[test]
    fn test_failed_compression_uses_fallback() {
        let token = encode_with(SAMPLE, |_| Err(io::Error::other("out of memory")));
        assert!(!token.is_empty());
        assert_eq!(token, URL_SAFE.encode(SAMPLE));
        assert!(!token.contains('+') && !token.contains('/'));
        assert_eq!(token.len() % 4, 0);
    }

    #[test]
    fn test_decode_rejects_bad_tokens() {
        assert_eq!(decode_bytes("abc"), Err(DecodeError::InvalidLength(3)));
        assert_eq!(
            decode_bytes("ab+d"),
            Err(DecodeError::InvalidCharacter { ch: '+', position: 2 })
        );
        // 0x07 opens a final block with the reserved block type
        assert_eq!(encode_bytes(&[0x07, 0, 0]), "1m00");
        assert!(matches!(decode("1m00"), Err(DecodeError::Inflate(_))));
    }

    #[test]
    fn test_render_url() {
        let url = render_url("https://render.example/plantuml/", SAMPLE, DiagramFormat::Svg);
        let token = encode(SAMPLE);
        assert_eq!(url, format!("https://render.example/plantuml/svg/{}", token));

        let png = token_url(DEFAULT_SERVER, "0000", DiagramFormat::Png);
        assert_eq!(png, "https://www.plantuml.com/plantuml/png/0000");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("SVG".parse::<DiagramFormat>().unwrap(), DiagramFormat::Svg);
        assert_eq!("ascii".parse::<DiagramFormat>().unwrap(), DiagramFormat::Txt);
        assert!("gif".parse::<DiagramFormat>().is_err());
    }
}
