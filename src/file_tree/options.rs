/// Filters applied while building a tree and while applying live changes.
///
/// Every watch carries a copy of the options it was installed with, so a
/// directory created later is filtered the same way as its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Keep entries whose name starts with a dot.
    pub include_hidden: bool,
    /// Keep subdirectories (and expand them) instead of only the files.
    pub include_directories: bool,
    /// Watch descendant directories, not only the top-level ones.
    pub recursive: bool,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a full recursive scan: subdirectories included and watched.
    pub fn recursive_scan() -> Self {
        Self::new().include_directories(true).recursive(true)
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn include_directories(mut self, include: bool) -> Self {
        self.include_directories = include;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_chaining() {
        let options = LoadOptions::new();
        assert!(!options.include_hidden);
        assert!(!options.include_directories);
        assert!(!options.recursive);

        let options = LoadOptions::recursive_scan().include_hidden(true);
        assert!(options.include_hidden);
        assert!(options.include_directories);
        assert!(options.recursive);
    }
}
