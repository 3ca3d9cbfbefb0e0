/// A single managed Terraform Cloud workspace
///
/// `name` is the fully-qualified remote name (`<base>-<suffix>`), `workspace`
/// the short logical key used for addressing and input matching. `id` stays
/// `None` until the remote lookup confirms the workspace exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub name: String,
    pub workspace: String,
    pub id: Option<String>,
}

impl Workspace {
    pub fn new(name: impl Into<String>, workspace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workspace: workspace.into(),
            id: None,
        }
    }

    /// Build the workspace set from the base name and logical suffixes.
    ///
    /// An empty suffix list yields a single workspace whose logical key is
    /// the base name itself.
    pub fn build_all(base: &str, suffixes: &[String]) -> Vec<Workspace> {
        if suffixes.is_empty() {
            return vec![Workspace::new(base, base)];
        }

        suffixes
            .iter()
            .map(|suffix| Workspace::new(format!("{}-{}", base, suffix), suffix.clone()))
            .collect()
    }
}
