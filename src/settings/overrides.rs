use std::str::FromStr;

use crate::error::ProxyError;

/// Characters that separate entries of a `ProxyOverride` string.
///
/// Windows itself writes `;`. Some tools also used `,`, so both are
/// recognised unless configured otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideSeparators(Vec<char>);

impl Default for OverrideSeparators {
    fn default() -> Self {
        Self(vec![';', ','])
    }
}

impl OverrideSeparators {
    pub fn semicolon_only() -> Self {
        Self(vec![';'])
    }

    pub fn chars(&self) -> &[char] {
        &self.0
    }

    /// Split, trim and drop blank entries.
    pub fn split(&self, raw: &str) -> Vec<String> {
        raw.split(self.0.as_slice())
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl FromStr for OverrideSeparators {
    type Err = ProxyError;

    /// Every character of `s` becomes a separator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars: Vec<char> = Vec::new();
        for c in s.chars() {
            if c.is_whitespace() {
                return Err(ProxyError::invalid("override separators cannot be whitespace"));
            }
            if !chars.contains(&c) {
                chars.push(c);
            }
        }
        if chars.is_empty() {
            return Err(ProxyError::invalid("at least one override separator is required"));
        }
        Ok(Self(chars))
    }
}

pub fn join<I, S>(entries: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|entry| entry.as_ref().to_string())
        .collect::<Vec<String>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_accepts_both_separators() {
        let entries = OverrideSeparators::default().split("localhost; *.corp ,10.*;;<local>");
        assert_eq!(entries, vec!["localhost", "*.corp", "10.*", "<local>"]);
    }

    #[test]
    fn semicolon_only_keeps_commas() {
        let entries = OverrideSeparators::semicolon_only().split("a,b;c");
        assert_eq!(entries, vec!["a,b", "c"]);
    }

    #[test]
    fn empty_string_has_no_entries() {
        assert!(OverrideSeparators::default().split("").is_empty());
        assert!(OverrideSeparators::default().split(" ; , ").is_empty());
    }

    #[test]
    fn parse_from_characters() {
        let separators: OverrideSeparators = ";|;".parse().unwrap();
        assert_eq!(separators.chars(), &[';', '|']);
        assert!("".parse::<OverrideSeparators>().is_err());
        assert!("; ".parse::<OverrideSeparators>().is_err());
    }

    #[test]
    fn join_keeps_entries_verbatim() {
        assert_eq!(join([" a ", "", "b"]), " a ;;b");
        assert_eq!(join(Vec::<String>::new()), "");
    }
}
