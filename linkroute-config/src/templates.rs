//! Built-in group templates shipped with the product.
//!
//! Each template has a stable id so the synchronizer can find the persisted
//! group that was created from it across upgrades. Adding a pattern here
//! propagates it to existing installs on the next startup; patterns users
//! deleted stay deleted.

use uuid::{Uuid, uuid};

use crate::browser::BrowserProfile;
use crate::group::UrlGroup;

/// Canonical definition of a built-in group
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltInTemplate {
    /// Stable id shared by every install
    pub id: Uuid,
    /// Name used when the group is first created
    pub name: &'static str,
    /// Description used when the group is first created
    pub description: &'static str,
    /// Canonical, already-normalized patterns
    pub patterns: Vec<String>,
    /// Profile assigned when the group is first created (usually unset)
    pub default_profile: Option<BrowserProfile>,
}

impl BuiltInTemplate {
    /// Define a template from already-normalized pattern literals
    pub fn new(id: Uuid, name: &'static str, description: &'static str, patterns: &[&str]) -> Self {
        Self {
            id,
            name,
            description,
            patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
            default_profile: None,
        }
    }

    /// Build a fresh built-in group from this template
    pub fn instantiate(&self) -> UrlGroup {
        let mut group = UrlGroup::with_id(self.id, self.name)
            .description(self.description)
            .url_patterns(self.patterns.iter().cloned());
        if let Some(profile) = &self.default_profile {
            group = group.profiles(vec![profile.clone()]);
        }
        group.is_built_in = true;
        group.template_snapshot = self.patterns.clone();
        group
    }
}

pub const GOOGLE_WORKSPACE_ID: Uuid = uuid!("8d4c1f52-3b0e-4c6a-9a51-6f0d2b1e7c01");
pub const MICROSOFT_365_ID: Uuid = uuid!("8d4c1f52-3b0e-4c6a-9a51-6f0d2b1e7c02");
pub const DEVELOPER_TOOLS_ID: Uuid = uuid!("8d4c1f52-3b0e-4c6a-9a51-6f0d2b1e7c03");
pub const SOCIAL_MEDIA_ID: Uuid = uuid!("8d4c1f52-3b0e-4c6a-9a51-6f0d2b1e7c04");

/// The canonical built-in templates for this release
pub fn builtin_templates() -> Vec<BuiltInTemplate> {
    vec![
        BuiltInTemplate::new(
            GOOGLE_WORKSPACE_ID,
            "Google Workspace",
            "Gmail, Drive, Docs, Calendar and Meet",
            &[
                "mail.google.com",
                "drive.google.com",
                "docs.google.com",
                "calendar.google.com",
                "meet.google.com",
            ],
        ),
        BuiltInTemplate::new(
            MICROSOFT_365_ID,
            "Microsoft 365",
            "Outlook, Teams, SharePoint and OneDrive",
            &[
                "outlook.office.com",
                "outlook.office365.com",
                "teams.microsoft.com",
                "*.sharepoint.com",
                "onedrive.live.com",
                "office.com",
            ],
        ),
        BuiltInTemplate::new(
            DEVELOPER_TOOLS_ID,
            "Developer Tools",
            "Code hosting, CI and package registries",
            &[
                "github.com",
                "gitlab.com",
                "bitbucket.org",
                "stackoverflow.com",
                "crates.io",
                "docs.rs",
            ],
        ),
        BuiltInTemplate::new(
            SOCIAL_MEDIA_ID,
            "Social Media",
            "Social networks and messaging",
            &[
                "facebook.com",
                "instagram.com",
                "x.com",
                "twitter.com",
                "linkedin.com",
                "reddit.com",
            ],
        ),
    ]
}

/// Look up a template by its stable id
pub fn find_template(id: &Uuid) -> Option<BuiltInTemplate> {
    builtin_templates().into_iter().find(|t| t.id == *id)
}
