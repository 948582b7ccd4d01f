use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AddressError;

/// Bare address of a room (`localpart@domain`) or of a service (`domain`).
///
/// Fields are public so records can be assembled by hand; [`Address::parse`]
/// is the validating constructor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    pub localpart: Option<String>,
    pub domain: String,
}

const ESCAPES: [(&str, char); 10] = [
    ("20", ' '),
    ("22", '"'),
    ("26", '&'),
    ("27", '\''),
    ("2f", '/'),
    ("3a", ':'),
    ("3c", '<'),
    ("3e", '>'),
    ("40", '@'),
    ("5c", '\\'),
];

impl Address {
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        let bare = s.split_once('/').map_or(s, |(bare, _)| bare);
        match bare.split_once('@') {
            Some((localpart, domain)) => {
                if domain.is_empty() {
                    return Err(AddressError::EmptyDomain(s.to_string()));
                }
                if localpart.is_empty() {
                    return Err(AddressError::EmptyLocalpart(s.to_string()));
                }
                Ok(Address {
                    localpart: Some(localpart.to_string()),
                    domain: domain.to_string(),
                })
            }
            None if bare.is_empty() => Err(AddressError::EmptyDomain(s.to_string())),
            None => Ok(Address {
                localpart: None,
                domain: bare.to_string(),
            }),
        }
    }

    pub fn is_room(&self) -> bool {
        self.localpart.is_some()
    }

    /// Localpart with XEP-0106 escapes decoded, as a human would read it.
    pub fn unescaped_localpart(&self) -> Option<String> {
        self.localpart.as_deref().map(unescape_localpart)
    }
}

/// Decodes the XEP-0106 `\xx` escapes. Unknown sequences are kept verbatim.
pub fn unescape_localpart(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let decoded = tail
            .get(..2)
            .and_then(|code| ESCAPES.iter().find(|(hex, _)| *hex == code));
        match decoded {
            Some((_, ch)) => {
                out.push(*ch);
                rest = &tail[2..];
            }
            None => {
                out.push('\\');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.localpart {
            Some(localpart) => write!(f, "{}@{}", localpart, self.domain),
            None => f.write_str(&self.domain),
        }
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}
