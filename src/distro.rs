//! Distribution identity and the family → package-manager table.

use std::fmt;
use std::time::Duration;

use crate::command::CommandSpec;
use crate::error::SetupError;

/// `{id, version}` as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistroIdentity {
    pub id: String,
    pub version: String,
}

impl DistroIdentity {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }

    /// Leading numeric component of the version, `0` when there is none.
    pub fn major_version(&self) -> u32 {
        self.version
            .split(|c: char| !c.is_ascii_digit())
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    pub fn family(&self) -> DistroFamily {
        DistroFamily::from_id(&self.id)
    }
}

impl fmt::Display for DistroIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            f.write_str(&self.id)
        } else {
            write!(f, "{} {}", self.id, self.version)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistroFamily {
    Debian,
    RedHat,
    Alpine,
    Arch,
    Unsupported,
}

const FAMILY_IDS: &[(DistroFamily, &[&str])] = &[
    (
        DistroFamily::Debian,
        &["ubuntu", "debian", "linuxmint", "pop", "raspbian"],
    ),
    (
        DistroFamily::RedHat,
        &["centos", "rhel", "fedora", "rocky", "almalinux"],
    ),
    (DistroFamily::Alpine, &["alpine"]),
    (DistroFamily::Arch, &["arch", "manjaro"]),
];

/// The one enterprise id that switches to dnf from major version 8.
const DNF_SWITCH_ID: &str = "centos";
const DNF_SWITCH_MAJOR: u32 = 8;

impl DistroFamily {
    pub fn from_id(id: &str) -> Self {
        FAMILY_IDS
            .iter()
            .find(|(_, ids)| ids.contains(&id))
            .map(|(family, _)| *family)
            .unwrap_or(DistroFamily::Unsupported)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistroFamily::Debian => "debian",
            DistroFamily::RedHat => "redhat",
            DistroFamily::Alpine => "alpine",
            DistroFamily::Arch => "arch",
            DistroFamily::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, DistroFamily::Unsupported)
    }

    /// Commands that install `package`, run in order.
    pub fn install_commands(
        &self,
        identity: &DistroIdentity,
        package: &str,
        timeout: Duration,
    ) -> Result<Vec<CommandSpec>, SetupError> {
        let commands = match self {
            DistroFamily::Debian => vec![
                CommandSpec::new("apt-get", ["update"], timeout),
                CommandSpec::new("apt-get", ["install", "-y", package], timeout),
            ],
            DistroFamily::RedHat => {
                let manager = if identity.id == DNF_SWITCH_ID
                    && identity.major_version() >= DNF_SWITCH_MAJOR
                {
                    "dnf"
                } else {
                    "yum"
                };
                vec![CommandSpec::new(manager, ["install", "-y", package], timeout)]
            }
            DistroFamily::Alpine => vec![CommandSpec::new(
                "apk",
                ["add", "--no-cache", package],
                timeout,
            )],
            DistroFamily::Arch => vec![CommandSpec::new(
                "pacman",
                ["-Sy", "--noconfirm", package],
                timeout,
            )],
            DistroFamily::Unsupported => {
                return Err(SetupError::UnsupportedDistribution {
                    id: identity.id.clone(),
                    version: identity.version.clone(),
                });
            }
        };
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_secs(1);

    fn lines(id: &str, version: &str, package: &str) -> Vec<String> {
        let identity = DistroIdentity::new(id, version);
        identity
            .family()
            .install_commands(&identity, package, T)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn known_ids_map_to_families() {
        assert_eq!(DistroFamily::from_id("ubuntu"), DistroFamily::Debian);
        assert_eq!(DistroFamily::from_id("debian"), DistroFamily::Debian);
        assert_eq!(DistroFamily::from_id("rocky"), DistroFamily::RedHat);
        assert_eq!(DistroFamily::from_id("fedora"), DistroFamily::RedHat);
        assert_eq!(DistroFamily::from_id("alpine"), DistroFamily::Alpine);
        assert_eq!(DistroFamily::from_id("manjaro"), DistroFamily::Arch);
        assert_eq!(DistroFamily::from_id("gentoo"), DistroFamily::Unsupported);
        assert_eq!(DistroFamily::from_id("Ubuntu"), DistroFamily::Unsupported);
    }

    #[test]
    fn debian_refreshes_index_before_install() {
        assert_eq!(
            lines("ubuntu", "22.04", "rsync"),
            ["apt-get update", "apt-get install -y rsync"]
        );
    }

    #[test]
    fn centos_switches_to_dnf_at_eight() {
        assert_eq!(lines("centos", "7.9.2009", "rsync"), ["yum install -y rsync"]);
        assert_eq!(lines("centos", "8", "rsync"), ["dnf install -y rsync"]);
        assert_eq!(lines("centos", "9", "xinetd"), ["dnf install -y xinetd"]);
    }

    #[test]
    fn other_redhat_ids_use_yum() {
        assert_eq!(lines("rocky", "9.2", "rsync"), ["yum install -y rsync"]);
        assert_eq!(lines("fedora", "39", "rsync"), ["yum install -y rsync"]);
    }

    #[test]
    fn alpine_and_arch_commands() {
        assert_eq!(lines("alpine", "3.18", "rsync"), ["apk add --no-cache rsync"]);
        assert_eq!(lines("arch", "", "rsync"), ["pacman -Sy --noconfirm rsync"]);
    }

    #[test]
    fn unsupported_identity_is_an_error() {
        let identity = DistroIdentity::new("plan9", "4");
        let err = identity
            .family()
            .install_commands(&identity, "rsync", T)
            .unwrap_err();
        assert!(matches!(err, SetupError::UnsupportedDistribution { .. }));
    }

    #[test]
    fn major_version_parsing() {
        assert_eq!(DistroIdentity::new("centos", "8.5.2111").major_version(), 8);
        assert_eq!(DistroIdentity::new("centos", "10").major_version(), 10);
        assert_eq!(DistroIdentity::new("centos", "").major_version(), 0);
        assert_eq!(DistroIdentity::new("centos", "stream").major_version(), 0);
    }
}
