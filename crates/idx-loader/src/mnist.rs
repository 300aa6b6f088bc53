use idx_decoder::ImageRecords;

/// Images and labels of one split, index-aligned: `labels[i]` is the
/// class of `images.get(i)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitData {
    pub images: ImageRecords,
    pub labels: Vec<u8>,
}

impl SplitData {
    /// A split that was not loaded.
    #[must_use]
    pub fn empty(rows: u32, cols: u32) -> Self {
        Self {
            images: ImageRecords::empty(rows, cols),
            labels: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// `(pixels, label)` for each record, in file order.
    pub fn pairs(&self) -> impl Iterator<Item = (&[u8], u8)> {
        self.images.iter().zip(self.labels.iter().copied())
    }
}

/// The combined dataset handed to consumers.
///
/// Only `train` is loaded. `test` is always an empty placeholder with
/// the train image shape; nothing in the viewer reads it yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mnist {
    pub train: SplitData,
    pub test: SplitData,
}
