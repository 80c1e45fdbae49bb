//! Reconciles GitHub team permissions and third-party app installations
//! against a declarative access configuration.
//!
//! One team (the "main" team) administers every repository in scope. A JSON
//! config declares which other teams get which permission on which repos, and
//! which app installations (Dependabot, Slack) each repo belongs to. A run
//! diffs that desired state against the live API, applies the corrective
//! mutations, and reports every deviation it will not auto-correct.

pub mod api;
pub mod config;
pub mod dependabot;
pub mod github;
pub mod reconcile;
pub mod report;

use std::fmt;

/// GitHub's coarse repository permission tiers.
///
/// `write` and `read` are accepted as config aliases for `push` and `pull`;
/// they name the same tier. Only equality is ever compared.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Admin,
    #[serde(alias = "write")]
    Push,
    #[serde(alias = "read")]
    Pull,
}

impl Permission {
    /// Maps a permission label as returned by the GitHub API onto the
    /// supported tiers. `maintain` and `triage` fold into the nearest coarse
    /// tier so teams holding them still show up in the diff.
    pub fn from_api_label(label: &str) -> Option<Permission> {
        match label {
            "admin" => Some(Permission::Admin),
            "push" | "write" | "maintain" => Some(Permission::Push),
            "pull" | "read" | "triage" => Some(Permission::Pull),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Admin => "admin",
            Permission::Push => "push",
            Permission::Pull => "pull",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Permission;

    #[test]
    fn config_labels_accept_aliases() {
        let parse = |s: &str| serde_json::from_str::<Permission>(s).unwrap();
        assert_eq!(parse("\"admin\""), Permission::Admin);
        assert_eq!(parse("\"push\""), Permission::Push);
        assert_eq!(parse("\"write\""), Permission::Push);
        assert_eq!(parse("\"pull\""), Permission::Pull);
        assert_eq!(parse("\"read\""), Permission::Pull);
        assert!(serde_json::from_str::<Permission>("\"owner\"").is_err());
    }

    #[test]
    fn api_labels_fold_into_coarse_tiers() {
        assert_eq!(Permission::from_api_label("admin"), Some(Permission::Admin));
        assert_eq!(Permission::from_api_label("maintain"), Some(Permission::Push));
        assert_eq!(Permission::from_api_label("triage"), Some(Permission::Pull));
        assert_eq!(Permission::from_api_label("nonsense"), None);
    }
}
