//! Build executor resolution
//!
//! Maps the causes of a build to the person who ran it, together with the
//! mobile number used to @mention them. Lookup misses never fail the build;
//! they only leave a diagnostic in the build log.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::warn;

use crate::events::{BuildLog, TriggerCause};
use crate::registry::FormValidation;

/// The person a build notification is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunUser {
    pub name: String,
    pub mobile: Option<String>,
}

/// Per-user WXWork settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WXWorkUserProperty {
    #[serde(default)]
    pub mobile: Option<String>,
}

fn mobile_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^1\d{10}$").expect("mobile pattern is valid"))
}

impl WXWorkUserProperty {
    pub fn new(mobile: impl Into<String>) -> Self {
        Self {
            mobile: Some(mobile.into()),
        }
    }

    /// Blank is allowed; otherwise an 11-digit mainland mobile number
    pub fn check_mobile(mobile: &str) -> FormValidation {
        let mobile = mobile.trim();
        if mobile.is_empty() || mobile_pattern().is_match(mobile) {
            FormValidation::ok()
        } else {
            FormValidation::error("Mobile must be an 11-digit number starting with 1")
        }
    }

    /// Mobile number, if set and non-blank
    pub fn mobile(&self) -> Option<&str> {
        self.mobile
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// A user known to the build runtime
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    /// Absolute URL of the user's page
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub property: Option<WXWorkUserProperty>,
}

/// Read-only view of the runtime's users
pub trait UserDirectory: Send + Sync {
    fn get_by_id(&self, id: &str) -> Option<UserProfile>;
}

/// User directory backed by a map, loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: HashMap<String, UserProfile>,
}

impl InMemoryUserDirectory {
    pub fn new(users: impl IntoIterator<Item = UserProfile>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn get_by_id(&self, id: &str) -> Option<UserProfile> {
        self.users.get(id).cloned()
    }
}

/// Resolve who ran the build
pub fn resolve_executor(
    causes: &[TriggerCause],
    directory: &dyn UserDirectory,
    log: &dyn BuildLog,
) -> RunUser {
    let user = causes
        .iter()
        .find_map(|c| c.user_id.as_deref())
        .and_then(|id| directory.get_by_id(id));

    let Some(user) = user else {
        let message = "could not resolve the build executor, falling back to build causes";
        warn!("{}", message);
        log.error(message);
        let name = causes
            .iter()
            .map(|c| c.short_description.as_str())
            .collect::<String>();
        return RunUser { name, mobile: None };
    };

    let mobile = user
        .property
        .as_ref()
        .and_then(|p| p.mobile())
        .map(str::to_string);

    if mobile.is_none() {
        let page = user.url.trim().trim_end_matches('/');
        let message = if page.is_empty() {
            format!("user {} has no mobile number configured", user.display_name)
        } else {
            format!(
                "user {} has no mobile number configured, add one at {}/configure",
                user.display_name, page
            )
        };
        warn!(user = %user.id, "{}", message);
        log.error(&message);
    }

    RunUser {
        name: user.display_name,
        mobile,
    }
}
