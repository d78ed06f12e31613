use std::path::Path;

use anyhow::{Context, Result};

/// Wallet addresses from list-file contents, in file order. Blank lines and
/// `#` comments are ignored; surrounding whitespace is trimmed.
pub fn parse_wallets(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn load_wallets(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read wallet list {}", path.display()))?;
    Ok(parse_wallets(&contents))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn skips_blanks_and_comments() {
        let contents = "# team wallets\n0xaaa\n\n   \n  0xbbb  \n#0xccc\n0xddd";
        assert_eq!(parse_wallets(contents), ["0xaaa", "0xbbb", "0xddd"]);
    }

    #[test]
    fn keeps_duplicates_and_order() {
        assert_eq!(parse_wallets("b\na\nb\n"), ["b", "a", "b"]);
    }

    #[test]
    fn crlf_lines() {
        assert_eq!(parse_wallets("0x1\r\n0x2\r\n"), ["0x1", "0x2"]);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0xabc\n# skip\n0xdef").unwrap();
        assert_eq!(load_wallets(file.path()).unwrap(), ["0xabc", "0xdef"]);
    }

    #[test]
    fn missing_file_is_error() {
        let err = load_wallets(Path::new("/nonexistent/wallets.txt")).unwrap_err();
        assert!(err.to_string().contains("failed to read wallet list"));
    }
}
