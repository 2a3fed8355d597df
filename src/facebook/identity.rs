use crate::denest::{stringify, Flattener};
use crate::facebook::source::ExportSource;
use crate::facebook::tables::{items, load};
use crate::redact::Denylist;
use crate::text::fix_latin1;
use crate::types::ExtractConfig;
use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, error};

const PROFILE_FILE: &str = "profile_information.json";

/// The account holder's own identifying strings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identity {
    pub username: Option<String>,
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
}

impl Identity {
    /// Read name, emails and phone numbers from the profile file.
    /// Each piece that cannot be found is left empty.
    pub fn from_source(source: &dyn ExportSource) -> Self {
        let Some(d) = source.read_json(PROFILE_FILE) else {
            debug!(file = PROFILE_FILE, "no profile file, identity unknown");
            return Identity::default();
        };
        let Some(profile) = d.get("profile_v2") else {
            error!(file = PROFILE_FILE, "profile file has no profile_v2");
            return Identity::default();
        };

        let username = profile
            .get("name")
            .and_then(|n| n.get("full_name"))
            .and_then(Value::as_str)
            .map(fix_latin1)
            .filter(|name| !name.is_empty());

        let emails = profile
            .get("emails")
            .and_then(|e| e.get("emails"))
            .and_then(Value::as_array)
            .map(|list| list.iter().map(stringify).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let phone_numbers = profile
            .get("phone_numbers")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|entry| entry.get("phone_number"))
                    .map(stringify)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Identity {
            username,
            emails,
            phone_numbers,
        }
    }

    /// Emails and phone numbers; the username is handled separately
    pub fn contact_details(&self) -> Denylist {
        self.emails.iter().chain(self.phone_numbers.iter()).cloned().collect()
    }
}

/// Deduplicated, sorted names of the groups the account joined
pub fn groups_to_list(source: &dyn ExportSource, config: &ExtractConfig) -> Vec<String> {
    match collect_groups(source, config) {
        Ok(groups) => groups.into_iter().collect(),
        Err(e) => {
            error!("could not list groups: {:#}", e);
            Vec::new()
        }
    }
}

fn collect_groups(source: &dyn ExportSource, config: &ExtractConfig) -> Result<BTreeSet<String>> {
    let flattener = Flattener::new(config);
    let d = load(source, "your_group_membership_activity.json")?;
    let mut groups = BTreeSet::new();
    for item in items(&d, "groups_joined_v2")? {
        let name = fix_latin1(&flattener.flatten(item).find_item("name"));
        if !name.is_empty() {
            groups.insert(name);
        }
    }
    Ok(groups)
}
