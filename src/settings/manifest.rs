//! Package metadata shown by the about commands.

/// Name, version, and links for the running package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestInfo {
    pub name: String,
    pub version: String,
    pub website: String,
    pub license: String,
    pub release_notes: String,
}

impl ManifestInfo {
    /// Metadata of this crate, taken from Cargo at build time.
    pub fn from_package() -> Self {
        let name = env!("CARGO_PKG_NAME").to_string();
        let version = env!("CARGO_PKG_VERSION").to_string();
        Self {
            license: format!(
                "{} is distributed under the terms of {}.",
                name,
                env!("CARGO_PKG_LICENSE")
            ),
            release_notes: format!("{} {}\n\n{}", name, version, env!("CARGO_PKG_DESCRIPTION")),
            website: env!("CARGO_PKG_REPOSITORY").to_string(),
            name,
            version,
        }
    }

    pub fn license_title(&self) -> String {
        format!("{} License", self.name)
    }

    pub fn release_notes_title(&self) -> String {
        format!("{} Release Notes", self.name)
    }
}

impl Default for ManifestInfo {
    fn default() -> Self {
        Self::from_package()
    }
}
