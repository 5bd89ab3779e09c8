use std::fmt;

use tracing::{debug, warn};

use crate::config::GroupDirectory;
use crate::remote::{DirectoryService, RemoteError};

const VARIATION_SELECTOR: char = '\u{FE0F}';

/// Relationship category, shown as an icon and mirrored as a remote group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Heart,
    Building,
    Green,
    UnderConstruction,
    Yellow,
    White,
    Red,
    Maintenance,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Heart,
        Category::Building,
        Category::Green,
        Category::UnderConstruction,
        Category::Yellow,
        Category::White,
        Category::Red,
        Category::Maintenance,
    ];

    pub fn icon(self) -> &'static str {
        match self {
            Category::Heart => "♥️",
            Category::Building => "🏗️",
            Category::Green => "🟢",
            Category::UnderConstruction => "🚧",
            Category::Yellow => "🟡",
            Category::White => "⚪",
            Category::Red => "🔴",
            Category::Maintenance => "🛠️",
        }
    }

    /// Name of the remote group holding records of this category.
    pub fn group_name(self) -> &'static str {
        match self {
            Category::Heart => "01♥️",
            Category::Building => "02🏗",
            Category::Green => "03🟢",
            Category::UnderConstruction => "04🚧",
            Category::Yellow => "05🟡",
            Category::White => "06⚪️",
            Category::Red => "07🔴",
            Category::Maintenance => "99🛠",
        }
    }

    /// Category for an icon. A trailing emoji variation selector is ignored;
    /// unknown icons map to `None`.
    pub fn from_icon(icon: &str) -> Option<Self> {
        let wanted = icon.trim().trim_end_matches(VARIATION_SELECTOR);
        if wanted.is_empty() {
            return None;
        }
        Category::ALL
            .into_iter()
            .find(|c| c.icon().trim_end_matches(VARIATION_SELECTOR) == wanted)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.icon())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupError {
    /// The category's group has no configured remote id.
    Unresolved(String),
    Remote(RemoteError),
}

impl fmt::Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupError::Unresolved(name) => write!(f, "no remote group configured for {}", name),
            GroupError::Remote(err) => write!(f, "group membership update failed: {}", err),
        }
    }
}

impl std::error::Error for GroupError {}

impl From<RemoteError> for GroupError {
    fn from(err: RemoteError) -> Self {
        GroupError::Remote(err)
    }
}

/// Keeps a record in exactly one managed category group.
pub struct GroupClassifier {
    groups: GroupDirectory,
}

impl GroupClassifier {
    pub fn new(groups: GroupDirectory) -> Self {
        Self { groups }
    }

    /// Move `remote_id` into the group for `icon`.
    ///
    /// Unknown icons are a no-op (`Ok(None)`). Removals from other managed
    /// groups in `memberships` are independent and their failures are only
    /// logged; failing to add to the target group is an error.
    pub fn classify<D: DirectoryService + ?Sized>(
        &self,
        directory: &D,
        remote_id: &str,
        icon: &str,
        memberships: &[String],
    ) -> Result<Option<Category>, GroupError> {
        let Some(category) = Category::from_icon(icon) else {
            debug!(remote_id, icon, "icon has no group");
            return Ok(None);
        };
        let target = self
            .groups
            .resolve(category.group_name())
            .ok_or_else(|| GroupError::Unresolved(category.group_name().to_string()))?;

        for other in Category::ALL.into_iter().filter(|c| *c != category) {
            let Some(group_id) = self.groups.resolve(other.group_name()) else {
                continue;
            };
            if group_id == target || !memberships.iter().any(|m| m == group_id) {
                continue;
            }
            if let Err(err) = directory.remove_member(remote_id, group_id) {
                warn!(remote_id, group_id, error = %err, "failed to leave category group");
            }
        }

        if !memberships.iter().any(|m| m == target) {
            directory.add_member(remote_id, target)?;
        }
        Ok(Some(category))
    }
}
