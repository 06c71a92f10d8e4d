//! Environment descriptors and categorization flags

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::registry::RegistryEntry;

/// Set of independent categorization tags, persisted as an integer bitfield
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentFlags(u32);

impl EnvironmentFlags {
    /// No tags: a plain directory-backed environment
    pub const NONE: Self = Self(0);
    /// Runs on this machine
    pub const LOCAL: Self = Self(1);
    /// Directory tree produced by Ansible provisioning
    pub const ANSIBLE: Self = Self(1 << 1);
    /// Lifecycle managed by this tool
    pub const MANAGED: Self = Self(1 << 2);
    /// Externally managed through an operations console
    pub const OPS_TOOLS: Self = Self(1 << 3);
    /// Live component directory served over HTTP by Microfab
    pub const MICROFAB: Self = Self(1 << 4);

    const KNOWN_BITS: u32 = Self::LOCAL.0
        | Self::ANSIBLE.0
        | Self::MANAGED.0
        | Self::OPS_TOOLS.0
        | Self::MICROFAB.0;

    const NAMED: [(Self, &'static str); 5] = [
        (Self::LOCAL, "local"),
        (Self::ANSIBLE, "ansible"),
        (Self::MANAGED, "managed"),
        (Self::OPS_TOOLS, "ops-tools"),
        (Self::MICROFAB, "microfab"),
    ];

    /// Raw bit representation
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Whether every tag in `other` is set
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any tag in `other` is set
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether no tag is set
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether bits outside the known tags are set, as written by deprecated environment types
    #[must_use]
    pub const fn has_unknown_tags(self) -> bool {
        self.0 & !Self::KNOWN_BITS != 0
    }

    /// Names of the set tags
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for EnvironmentFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EnvironmentFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for EnvironmentFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnvironmentFlags({})", self.names().join(" | "))
    }
}

impl FromStr for EnvironmentFlags {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::NAMED
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s))
            .map(|(flag, _)| *flag)
            .ok_or_else(|| {
                format!(
                    "unknown environment tag \"{s}\" (expected one of: local, ansible, managed, ops-tools, microfab)"
                )
            })
    }
}

/// A registered environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentEntry {
    pub name: String,
    /// Directory holding nodes, wallets and gateways; defaults to the registry directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_directory: Option<PathBuf>,
    /// Component directory base URL for Microfab environments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub environment_type: EnvironmentFlags,
    #[serde(default)]
    pub managed_runtime: bool,
}

impl EnvironmentEntry {
    /// Create an entry with the given tags
    #[must_use]
    pub fn new(name: impl Into<String>, environment_type: EnvironmentFlags) -> Self {
        Self {
            name: name.into(),
            environment_directory: None,
            url: None,
            environment_type,
            managed_runtime: false,
        }
    }

    /// Set an explicit environment directory
    #[must_use]
    pub fn with_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.environment_directory = Some(dir.into());
        self
    }

    /// Set the component directory URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Directory owned by this environment
    ///
    /// `environments_root` is the environment registry directory used when no
    /// explicit directory is configured.
    #[must_use]
    pub fn directory(&self, environments_root: &Path) -> PathBuf {
        self.environment_directory
            .clone()
            .unwrap_or_else(|| environments_root.join(&self.name))
    }

    /// Whether this environment derives wallets and gateways from its backing store
    #[must_use]
    pub const fn derives_entries(&self) -> bool {
        self.environment_type
            .intersects(EnvironmentFlags::from_bits(
                EnvironmentFlags::ANSIBLE.bits() | EnvironmentFlags::MICROFAB.bits(),
            ))
    }
}

impl RegistryEntry for EnvironmentEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine_and_intersect() {
        let flags = EnvironmentFlags::LOCAL | EnvironmentFlags::MICROFAB;
        assert!(flags.contains(EnvironmentFlags::LOCAL));
        assert!(flags.intersects(EnvironmentFlags::MICROFAB | EnvironmentFlags::ANSIBLE));
        assert!(!flags.intersects(EnvironmentFlags::ANSIBLE));
        assert!(!EnvironmentFlags::NONE.intersects(flags));
        assert_eq!(flags.names(), vec!["local", "microfab"]);
    }

    #[test]
    fn unknown_tag_bits_are_detected() {
        let all = EnvironmentFlags::LOCAL
            | EnvironmentFlags::ANSIBLE
            | EnvironmentFlags::MANAGED
            | EnvironmentFlags::OPS_TOOLS
            | EnvironmentFlags::MICROFAB;
        assert!(!all.has_unknown_tags());
        assert!(!EnvironmentFlags::NONE.has_unknown_tags());
        assert!(EnvironmentFlags::from_bits(1 << 5).has_unknown_tags());
        assert!((EnvironmentFlags::LOCAL | EnvironmentFlags::from_bits(1 << 6)).has_unknown_tags());
    }

    #[test]
    fn flags_parse_from_names() {
        assert_eq!("ops-tools".parse::<EnvironmentFlags>(), Ok(EnvironmentFlags::OPS_TOOLS));
        assert_eq!("Local".parse::<EnvironmentFlags>(), Ok(EnvironmentFlags::LOCAL));
        assert!("cloud".parse::<EnvironmentFlags>().is_err());
    }

    #[test]
    fn entry_serializes_type_as_integer() {
        let entry = EnvironmentEntry::new("local", EnvironmentFlags::LOCAL | EnvironmentFlags::MICROFAB)
            .with_url("http://console.127-0-0-1.nip.io:8080");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["environmentType"], 17);
        assert_eq!(json["managedRuntime"], false);
        assert!(json.get("environmentDirectory").is_none());

        let back: EnvironmentEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn directory_defaults_under_registry_root() {
        let entry = EnvironmentEntry::new("myFabric", EnvironmentFlags::NONE);
        assert_eq!(
            entry.directory(Path::new("/data/environments")),
            PathBuf::from("/data/environments/myFabric")
        );
        let entry = entry.with_directory("/elsewhere");
        assert_eq!(entry.directory(Path::new("/data/environments")), PathBuf::from("/elsewhere"));
    }

    #[test]
    fn derives_entries_for_ansible_and_microfab() {
        assert!(EnvironmentEntry::new("a", EnvironmentFlags::ANSIBLE).derives_entries());
        assert!(EnvironmentEntry::new("m", EnvironmentFlags::MICROFAB).derives_entries());
        assert!(!EnvironmentEntry::new("d", EnvironmentFlags::NONE).derives_entries());
        assert!(!EnvironmentEntry::new("o", EnvironmentFlags::OPS_TOOLS).derives_entries());
    }
}
