use std::fmt;

/// Dataset partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }
}

/// Payload type within a split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Images,
    Labels,
}

impl Kind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Labels => "labels",
        }
    }

    /// Inverse of [`as_str`](Self::as_str).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "images" => Some(Self::Images),
            "labels" => Some(Self::Labels),
            _ => None,
        }
    }
}

/// Cache key: `(split, kind)`, rendered as `{split}_{kind}`.
///
/// There is no version or content hash in the key. A changed upstream
/// file under the same name is served stale until the store is cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DatasetKey {
    pub split: Split,
    pub kind: Kind,
}

impl DatasetKey {
    #[must_use]
    pub fn new(split: Split, kind: Kind) -> Self {
        Self { split, kind }
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.split.as_str(), self.kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_join_split_and_kind() {
        assert_eq!(DatasetKey::new(Split::Train, Kind::Images).to_string(), "train_images");
        assert_eq!(DatasetKey::new(Split::Test, Kind::Labels).to_string(), "test_labels");
    }

    #[test]
    fn kind_names_roundtrip() {
        for kind in [Kind::Images, Kind::Labels] {
            assert_eq!(Kind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(Kind::from_name("pixels"), None);
    }
}
