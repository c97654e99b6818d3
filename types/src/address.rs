//! Account addresses and their abbreviated display form.

/// A 20-byte account address (`0x`-prefixed, EIP-55 checksummed on display).
pub use alloy_primitives::Address;

/// Number of leading characters kept by [`abbreviate`], including the `0x` prefix.
const HEAD: usize = 6;
/// Number of trailing characters kept by [`abbreviate`].
const TAIL: usize = 4;

/// Abbreviate an address string to `0x1234...abcd`.
///
/// Empty input yields an empty string. Strings too short to lose anything by
/// abbreviation are returned unchanged.
pub fn abbreviate(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() <= HEAD + TAIL {
        return raw.to_string();
    }
    let head: String = chars[..HEAD].iter().collect();
    let tail: String = chars[chars.len() - TAIL..].iter().collect();
    format!("{head}...{tail}")
}
