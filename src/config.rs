//! Options controlling how tags are loaded, saved and deleted.

use crate::id3::frames::Frame;
use crate::id3::header::Version;

/// The ID3v2 minor version a tag is translated to or written as.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum V2Minor {
    V3,
    #[default]
    V4,
}

impl V2Minor {
    pub fn version(self) -> Version {
        match self {
            V2Minor::V3 => Version::V23,
            V2Minor::V4 => Version::V24,
        }
    }
}

/// What to do with a trailing ID3v1 tag when saving.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum V1Mode {
    /// Strip any ID3v1 tag.
    Remove = 0,
    /// Rewrite an existing ID3v1 tag, but never add one.
    #[default]
    Update = 1,
    /// Write an ID3v1 tag whether or not one exists.
    Always = 2,
}

/// How a frame is inserted when the tag already holds one with the same
/// hash key.
#[derive(Copy, Clone, Debug, Default)]
pub enum DuplicatePolicy {
    /// The new frame replaces the old one.
    #[default]
    Replace,
    /// The first frame seen wins.
    KeepExisting,
    /// Combine `(existing, new)` into the frame that is kept.
    Merge(fn(Frame, Frame) -> Frame),
}

/// Options to control how a tag is loaded
#[derive(Copy, Clone, Debug)]
#[non_exhaustive]
pub struct LoadOptions {
    pub(crate) translate: bool,
    pub(crate) v2_version: V2Minor,
    pub(crate) pedantic: bool,
    pub(crate) duplicates: DuplicatePolicy,
}

impl LoadOptions {
    /// Creates a new `LoadOptions`, alias for `Default` implementation
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mutagen_id3::config::{LoadOptions, V2Minor};
    ///
    /// let options = LoadOptions::new().v2_version(V2Minor::V3).pedantic(false);
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            translate: true,
            v2_version: V2Minor::V4,
            pedantic: true,
            duplicates: DuplicatePolicy::Replace,
        }
    }

    /// Whether to migrate the loaded frames to [`LoadOptions::v2_version`]
    ///
    /// A tag that is going to be saved should be translated, either here or
    /// later through `update_to_v23` / `update_to_v24`.
    pub fn translate(mut self, translate: bool) -> Self {
        self.translate = translate;
        self
    }

    /// The version loaded frames are translated to
    pub fn v2_version(mut self, v2_version: V2Minor) -> Self {
        self.v2_version = v2_version;
        self
    }

    /// Reject headers with reserved flags or sizes that are not synchsafe,
    /// and frames that cannot be de-unsynchronised or decompressed
    pub fn pedantic(mut self, pedantic: bool) -> Self {
        self.pedantic = pedantic;
        self
    }

    /// How frames sharing a hash key are combined while loading
    pub fn duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }
}

impl Default for LoadOptions {
    /// ```rust,ignore
    /// LoadOptions {
    ///     translate: true,
    ///     v2_version: V2Minor::V4,
    ///     pedantic: true,
    ///     duplicates: DuplicatePolicy::Replace,
    /// }
    /// ```
    fn default() -> Self {
        Self::new()
    }
}

/// Options to control how a tag is written
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct SaveOptions {
    pub(crate) v1: V1Mode,
    pub(crate) v2_version: V2Minor,
    pub(crate) v23_sep: Option<&'static str>,
    pub(crate) pedantic: bool,
}

impl SaveOptions {
    /// Default separator for multi-valued text in v2.3 tags
    pub const DEFAULT_V23_SEPARATOR: &'static str = "/";

    /// Creates a new `SaveOptions`, alias for `Default` implementation
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mutagen_id3::config::{SaveOptions, V1Mode, V2Minor};
    ///
    /// // Write a v2.3 tag, keeping the null separator between values.
    /// let options = SaveOptions::new()
    ///     .v2_version(V2Minor::V3)
    ///     .v23_separator(None)
    ///     .v1(V1Mode::Remove);
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            v1: V1Mode::Update,
            v2_version: V2Minor::V4,
            v23_sep: Some(Self::DEFAULT_V23_SEPARATOR),
            pedantic: true,
        }
    }

    pub fn v1(mut self, v1: V1Mode) -> Self {
        self.v1 = v1;
        self
    }

    pub fn v2_version(mut self, v2_version: V2Minor) -> Self {
        self.v2_version = v2_version;
        self
    }

    /// Separator joining multiple text values in a v2.3 tag
    ///
    /// `None` keeps the values null separated, as v2.4 does.
    pub fn v23_separator(mut self, sep: Option<&'static str>) -> Self {
        self.v23_sep = sep;
        self
    }

    /// Skip text frames with no text
    pub fn pedantic(mut self, pedantic: bool) -> Self {
        self.pedantic = pedantic;
        self
    }
}

impl Default for SaveOptions {
    /// ```rust,ignore
    /// SaveOptions {
    ///     v1: V1Mode::Update,
    ///     v2_version: V2Minor::V4,
    ///     v23_sep: Some("/"),
    ///     pedantic: true,
    /// }
    /// ```
    fn default() -> Self {
        Self::new()
    }
}

/// Which tags to strip from a file
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct DeleteOptions {
    pub(crate) delete_v1: bool,
    pub(crate) delete_v2: bool,
}

impl DeleteOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delete_v1: true,
            delete_v2: true,
        }
    }

    pub fn delete_v1(mut self, delete_v1: bool) -> Self {
        self.delete_v1 = delete_v1;
        self
    }

    pub fn delete_v2(mut self, delete_v2: bool) -> Self {
        self.delete_v2 = delete_v2;
        self
    }
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn defaults() {
        let load = LoadOptions::default();
        assert!(load.translate);
        assert!(load.pedantic);
        assert_eq!(load.v2_version, V2Minor::V4);
        assert!(matches!(load.duplicates, DuplicatePolicy::Replace));

        let save = SaveOptions::default();
        assert_eq!(save.v1, V1Mode::Update);
        assert_eq!(save.v23_sep, Some("/"));
        assert_eq!(save.v2_version.version(), Version::V24);

        assert_eq!(DeleteOptions::default(), DeleteOptions::new().delete_v1(true));
    }

    #[test_log::test]
    fn setters_chain() {
        let save = SaveOptions::new()
            .v1(V1Mode::Always)
            .v2_version(V2Minor::V3)
            .v23_separator(None)
            .pedantic(false);
        assert_eq!(save.v1 as u8, 2);
        assert_eq!(save.v2_version.version(), Version::V23);
        assert_eq!(save.v23_sep, None);
        assert!(!save.pedantic);

        let delete = DeleteOptions::new().delete_v2(false);
        assert!(delete.delete_v1);
        assert!(!delete.delete_v2);
    }
}
