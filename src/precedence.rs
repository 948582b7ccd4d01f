//! Fallback chains for the display name and description.
//!
//! Each listing layout used to encode these rules on its own and they drifted
//! apart. They live here as data so every layout resolves a room the same way.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::room::{non_empty, PublicInfo};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecedenceRevision {
    /// Name hidden when it repeats the localpart; description falls back to subject.
    Legacy,
    /// Name always wins; description falls back to name, then subject.
    #[default]
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionSource {
    Description,
    Name,
    Subject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precedence {
    pub suppress_name_matching_localpart: bool,
    pub description_chain: Vec<DescriptionSource>,
}

impl Precedence {
    pub fn for_revision(revision: PrecedenceRevision) -> Self {
        match revision {
            PrecedenceRevision::Legacy => Precedence {
                suppress_name_matching_localpart: true,
                description_chain: vec![DescriptionSource::Description, DescriptionSource::Subject],
            },
            PrecedenceRevision::Current => Precedence {
                suppress_name_matching_localpart: false,
                description_chain: vec![
                    DescriptionSource::Description,
                    DescriptionSource::Name,
                    DescriptionSource::Subject,
                ],
            },
        }
    }

    pub fn resolve_name(&self, address: &Address, info: &PublicInfo) -> String {
        let localpart = address.localpart.as_deref();
        let name = non_empty(info.name.as_ref()).filter(|name| {
            !(self.suppress_name_matching_localpart && Some(*name) == localpart)
        });

        if let Some(name) = name {
            return name.to_string();
        }
        match address.unescaped_localpart() {
            Some(localpart) if !localpart.is_empty() => localpart,
            _ => address.to_string(),
        }
    }

    /// First non-empty source in the chain, unless it just repeats the localpart.
    pub fn resolve_description(&self, address: &Address, info: &PublicInfo) -> Option<String> {
        let resolved = self.description_chain.iter().find_map(|source| {
            let value = match source {
                DescriptionSource::Description => &info.description,
                DescriptionSource::Name => &info.name,
                DescriptionSource::Subject => &info.subject,
            };
            non_empty(value.as_ref())
        })?;

        let repeats_localpart = address.localpart.as_deref() == Some(resolved)
            || address.unescaped_localpart().as_deref() == Some(resolved);
        if repeats_localpart {
            None
        } else {
            Some(resolved.to_string())
        }
    }
}

impl Default for Precedence {
    fn default() -> Self {
        Precedence::for_revision(PrecedenceRevision::default())
    }
}
