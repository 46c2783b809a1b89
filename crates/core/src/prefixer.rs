const SEPARATORS: [char; 2] = ['/', '\\'];

/// Translates virtual paths into a backend's rooted native paths and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixer {
    prefix: String,
    separator: char,
}

impl Default for PathPrefixer {
    fn default() -> Self {
        Self::new("", '/')
    }
}

impl PathPrefixer {
    pub fn new(prefix: &str, separator: char) -> Self {
        let mut root = prefix.trim_end_matches(SEPARATORS).to_string();
        // A bare separator is an absolute root, not an empty prefix.
        if !root.is_empty() || prefix == separator.to_string() {
            root.push(separator);
        }
        Self {
            prefix: root,
            separator,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn prefix_path(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path.trim_start_matches(SEPARATORS))
    }

    /// Removes exactly the prefix length. Only meaningful for paths produced
    /// by this prefixer; anything shorter strips to the empty path.
    pub fn strip_prefix(&self, path: &str) -> String {
        path.get(self.prefix.len()..).unwrap_or_default().to_string()
    }

    pub fn strip_directory_prefix(&self, path: &str) -> String {
        self.strip_prefix(path)
            .trim_end_matches(SEPARATORS)
            .to_string()
    }

    /// Like [`prefix_path`](Self::prefix_path) but always ends with the
    /// separator, unless the whole result is empty.
    pub fn prefix_directory_path(&self, path: &str) -> String {
        let mut prefixed = self.prefix_path(path.trim_end_matches(SEPARATORS));
        if !prefixed.is_empty() && !prefixed.ends_with(self.separator) {
            prefixed.push(self.separator);
        }
        prefixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixing_with_a_prefix() {
        let prefixer = PathPrefixer::new("prefix", '/');
        assert_eq!(prefixer.prefix_path("some/path.txt"), "prefix/some/path.txt");
    }

    #[test]
    fn stripping_with_a_prefix() {
        let prefixer = PathPrefixer::new("prefix", '/');
        assert_eq!(prefixer.strip_prefix("prefix/some/path.txt"), "some/path.txt");
    }

    #[test]
    fn absolute_roots_are_supported() {
        let unix = PathPrefixer::new("/", '/');
        assert_eq!(unix.prefix_path("path.txt"), "/path.txt");

        let windows = PathPrefixer::new("\\", '\\');
        assert_eq!(windows.prefix_path("path.txt"), "\\path.txt");
    }

    #[test]
    fn stripping_is_reversible() {
        let prefixer = PathPrefixer::new("prefix", '/');
        let stripped = prefixer.strip_prefix("prefix/some/path.txt");
        let prefixed = prefixer.prefix_path("some/path.txt");

        assert_eq!(prefixer.prefix_path(&stripped), "prefix/some/path.txt");
        assert_eq!(prefixer.strip_prefix(&prefixed), "some/path.txt");
    }

    #[test]
    fn round_trip_holds_for_unrooted_paths() {
        for root in ["", "/", "root", "/var/data/", "bucket-prefix/nested"] {
            let prefixer = PathPrefixer::new(root, '/');
            for path in ["a.txt", "some dir/file name.txt", "x/y/z", "some[0]/file{1}.txt"] {
                assert_eq!(prefixer.strip_prefix(&prefixer.prefix_path(path)), path);
            }
        }
    }

    #[test]
    fn prefixing_without_a_prefix() {
        let prefixer = PathPrefixer::new("", '/');
        assert_eq!(prefixer.prefix_path("path/to/prefix.txt"), "path/to/prefix.txt");
        assert_eq!(prefixer.prefix_path("/path/to/prefix.txt"), "path/to/prefix.txt");
    }

    #[test]
    fn prefixing_for_a_directory() {
        let prefixer = PathPrefixer::new("/prefix", '/');
        assert_eq!(prefixer.prefix_directory_path("something"), "/prefix/something/");
        assert_eq!(prefixer.prefix_directory_path(""), "/prefix/");
    }

    #[test]
    fn prefixing_for_a_directory_without_a_prefix() {
        let prefixer = PathPrefixer::new("", '/');
        assert_eq!(prefixer.prefix_directory_path("something"), "something/");
        assert_eq!(prefixer.prefix_directory_path("something/"), "something/");
        assert_eq!(prefixer.prefix_directory_path(""), "");
    }

    #[test]
    fn stripping_a_directory_prefix() {
        let prefixer = PathPrefixer::new("/something/", '/');
        assert_eq!(prefixer.strip_directory_prefix("/something/this/"), "this");
        assert_eq!(prefixer.strip_directory_prefix("/something/and-this\\"), "and-this");
    }
}
