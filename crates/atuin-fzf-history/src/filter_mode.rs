use std::str::FromStr;

use strum::{Display, EnumIter, EnumString};

/// Which slice of history a search covers.
///
/// The variants cycle in declaration order when the user presses the filter
/// key in fzf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum FilterMode {
    /// Everything, with the current session's entries preferred.
    #[default]
    All,
    /// Commands run in exactly the current directory.
    Directory,
    /// Commands run in the current directory or anywhere below it.
    Subtree,
    /// Commands run in the current git workspace.
    Workspace,
}

impl FilterMode {
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Directory,
            Self::Directory => Self::Subtree,
            Self::Subtree => Self::Workspace,
            Self::Workspace => Self::All,
        }
    }

    /// Mode following the one called `name`; unknown names restart at `All`.
    pub fn next_from_name(name: &str) -> Self {
        Self::from_str(name).map(Self::next).unwrap_or_default()
    }

    /// Parse a mode name, treating anything unrecognised as `All`.
    pub fn from_name_lossy(name: &str) -> Self {
        Self::from_str(name).unwrap_or_default()
    }
}
