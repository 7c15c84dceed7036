use crate::backend::Element;
use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;
use burn_dataset::network::downloader::download_file_as_bytes;
use burn_dataset::{
    Dataset, InMemDataset,
    transform::{Mapper, MapperDataset},
};
use flate2::read::GzDecoder;
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};
use std::fs::{File, create_dir_all};
use std::io::Read;
use std::path::{Path, PathBuf};

// CVDF mirror of http://yann.lecun.com/exdb/mnist/
const URL: &str = "https://storage.googleapis.com/cvdf-datasets/mnist/";
pub const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
pub const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

pub const WIDTH: usize = 28;
pub const HEIGHT: usize = 28;
pub const NUM_CLASSES: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?}: bad magic number {found}, expected {expected}")]
    Magic {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("{path:?}: file is truncated ({got} bytes, expected {expected})")]
    Truncated {
        path: PathBuf,
        expected: usize,
        got: usize,
    },

    #[error("{path:?}: images are {rows}x{cols}, expected {HEIGHT}x{WIDTH}")]
    ImageSize {
        path: PathBuf,
        rows: usize,
        cols: usize,
    },

    #[error("{path:?}: label {label} is not a digit")]
    Label { path: PathBuf, label: u8 },

    #[error("found {images} images but {labels} labels")]
    CountMismatch { images: usize, labels: usize },

    #[error("the {split:?} split is empty")]
    EmptySplit { split: MnistSplit },

    #[error("validation size {validation_size} exceeds the {available} training items")]
    ValidationSize {
        validation_size: usize,
        available: usize,
    },
}

impl DatasetError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Which part of MNIST to load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MnistSplit {
    /// Training files minus the leading validation items.
    Train,
    /// The first `validation_size` items of the training files.
    Validation,
    /// The 10,000 test items.
    Test,
}

impl MnistSplit {
    fn files(&self) -> (&'static str, &'static str) {
        match self {
            Self::Train | Self::Validation => (TRAIN_IMAGES, TRAIN_LABELS),
            Self::Test => (TEST_IMAGES, TEST_LABELS),
        }
    }
}

/// MNIST item.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MnistItem {
    /// Image as a flat array of floats.
    /// Each value is a brightness, in between 0.0 and 1.0.
    ///
    /// # Shape
    /// [WIDTH * HEIGHT]
    pub image: Vec<Element>,

    /// Label of the image.
    /// Each value is in between 0 and 9.
    pub label: u8,
}

#[derive(Deserialize, Debug, Clone)]
struct MnistItemRaw {
    pub image_bytes: Vec<u8>,
    pub label: u8,
}

struct BytesToImage;

impl Mapper<MnistItemRaw, MnistItem> for BytesToImage {
    /// Scales the raw brightness bytes into [0, 1].
    fn map(&self, item: &MnistItemRaw) -> MnistItem {
        debug_assert_eq!(item.image_bytes.len(), WIDTH * HEIGHT);

        let image: Vec<Element> = item
            .image_bytes
            .iter()
            .map(|brightness| {
                let element: Element = (*brightness).as_();
                element / 255.0
            })
            .collect();

        MnistItem {
            image,
            label: item.label,
        }
    }
}

type MappedDataset = MapperDataset<InMemDataset<MnistItemRaw>, BytesToImage, MnistItemRaw>;

/// The MNIST dataset consists of 70,000 28x28 grayscale images of handwritten digits.
/// There are 60,000 training images and 10,000 test images.
///
/// The IDX files are read from a local directory, raw or gzipped. Missing files are
/// downloaded from the [CVDF mirror](https://github.com/cvdfoundation/mnist).
pub struct MnistDataset {
    dataset: MappedDataset,
}

impl Dataset<MnistItem> for MnistDataset {
    fn get(&self, index: usize) -> Option<MnistItem> {
        self.dataset.get(index)
    }

    fn len(&self) -> usize {
        self.dataset.len()
    }
}

impl MnistDataset {
    pub fn train(dir: &Path, validation_size: usize) -> Result<Self, DatasetError> {
        Self::new(dir, MnistSplit::Train, validation_size)
    }

    pub fn validation(dir: &Path, validation_size: usize) -> Result<Self, DatasetError> {
        Self::new(dir, MnistSplit::Validation, validation_size)
    }

    pub fn test(dir: &Path) -> Result<Self, DatasetError> {
        Self::new(dir, MnistSplit::Test, 0)
    }

    pub fn new(dir: &Path, split: MnistSplit, validation_size: usize) -> Result<Self, DatasetError> {
        let (images_name, labels_name) = split.files();
        let images_path = Self::download_file(images_name, dir)?;
        let labels_path = Self::download_file(labels_name, dir)?;

        // MNIST is tiny so we can load it in-memory
        // Train images (u8): 28 * 28 * 60000 = 47.04Mb
        // Test images (u8): 28 * 28 * 10000 = 7.84Mb
        let images = parse_images(&read_idx(&images_path)?, &images_path)?;
        let labels = parse_labels(&read_idx(&labels_path)?, &labels_path)?;
        if images.len() != labels.len() {
            return Err(DatasetError::CountMismatch {
                images: images.len(),
                labels: labels.len(),
            });
        }

        let range = match split {
            MnistSplit::Test => 0..images.len(),
            MnistSplit::Train | MnistSplit::Validation if validation_size > images.len() => {
                return Err(DatasetError::ValidationSize {
                    validation_size,
                    available: images.len(),
                });
            }
            MnistSplit::Train => validation_size..images.len(),
            MnistSplit::Validation => 0..validation_size,
        };

        let items: Vec<_> = images
            .into_iter()
            .zip(labels)
            .take(range.end)
            .skip(range.start)
            .map(|(image_bytes, label)| MnistItemRaw { image_bytes, label })
            .collect();
        tracing::debug!(?split, items = items.len(), "loaded MNIST split");

        Ok(Self::from_raw(items))
    }

    fn from_raw(items: Vec<MnistItemRaw>) -> Self {
        let dataset = InMemDataset::new(items);
        let dataset = MapperDataset::new(dataset, BytesToImage);
        Self { dataset }
    }

    /// Returns the path of `name` (or `name.gz`) inside `dest_dir`, downloading the gzip
    /// file when neither exists.
    fn download_file(name: &str, dest_dir: &Path) -> Result<PathBuf, DatasetError> {
        if let Some(path) = locate(name, dest_dir) {
            return Ok(path);
        }

        create_dir_all(dest_dir).map_err(|e| DatasetError::io(dest_dir, e))?;
        let file_name = dest_dir.join(format!("{name}.gz"));
        tracing::info!("Downloading {name} into {dest_dir:?}");
        let bytes = download_file_as_bytes(&format!("{URL}{name}.gz"), name);
        std::fs::write(&file_name, bytes).map_err(|e| DatasetError::io(&file_name, e))?;

        Ok(file_name)
    }
}

fn locate(name: &str, dir: &Path) -> Option<PathBuf> {
    let raw = dir.join(name);
    if raw.is_file() {
        return Some(raw);
    }
    let gz = dir.join(format!("{name}.gz"));
    gz.is_file().then_some(gz)
}

/// Reads a whole IDX file, decompressing it when its name ends in `.gz`.
pub fn read_idx(path: &Path) -> Result<Vec<u8>, DatasetError> {
    let mut file = File::open(path).map_err(|e| DatasetError::io(path, e))?;
    let mut bytes = Vec::new();
    let gzipped = path.extension().is_some_and(|ext| ext == "gz");
    let read = if gzipped {
        GzDecoder::new(file).read_to_end(&mut bytes)
    } else {
        file.read_to_end(&mut bytes)
    };
    read.map_err(|e| DatasetError::io(path, e))?;
    Ok(bytes)
}

fn read_u32(bytes: &[u8], offset: usize, path: &Path) -> Result<u32, DatasetError> {
    bytes
        .get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| DatasetError::Truncated {
            path: path.to_path_buf(),
            expected: offset + 4,
            got: bytes.len(),
        })
}

/// Parses an IDX3 image file: a 16-byte big-endian header (magic, count, rows, cols)
/// followed by one byte per pixel.
pub fn parse_images(bytes: &[u8], path: &Path) -> Result<Vec<Vec<u8>>, DatasetError> {
    let magic = read_u32(bytes, 0, path)?;
    if magic != IMAGES_MAGIC {
        return Err(DatasetError::Magic {
            path: path.to_path_buf(),
            found: magic,
            expected: IMAGES_MAGIC,
        });
    }
    let size = read_u32(bytes, 4, path)? as usize;
    let rows = read_u32(bytes, 8, path)? as usize;
    let cols = read_u32(bytes, 12, path)? as usize;
    if rows != HEIGHT || cols != WIDTH {
        return Err(DatasetError::ImageSize {
            path: path.to_path_buf(),
            rows,
            cols,
        });
    }

    let expected = 16 + size * WIDTH * HEIGHT;
    if bytes.len() < expected {
        return Err(DatasetError::Truncated {
            path: path.to_path_buf(),
            expected,
            got: bytes.len(),
        });
    }

    Ok(bytes[16..expected]
        .chunks(WIDTH * HEIGHT)
        .map(|chunk| chunk.to_vec())
        .collect())
}

/// Parses an IDX1 label file: an 8-byte big-endian header (magic, count) followed by
/// one byte per label.
pub fn parse_labels(bytes: &[u8], path: &Path) -> Result<Vec<u8>, DatasetError> {
    let magic = read_u32(bytes, 0, path)?;
    if magic != LABELS_MAGIC {
        return Err(DatasetError::Magic {
            path: path.to_path_buf(),
            found: magic,
            expected: LABELS_MAGIC,
        });
    }
    let size = read_u32(bytes, 4, path)? as usize;

    let expected = 8 + size;
    if bytes.len() < expected {
        return Err(DatasetError::Truncated {
            path: path.to_path_buf(),
            expected,
            got: bytes.len(),
        });
    }

    let labels = bytes[8..expected].to_vec();
    if let Some(&label) = labels.iter().find(|&&label| label as usize >= NUM_CLASSES) {
        return Err(DatasetError::Label {
            path: path.to_path_buf(),
            label,
        });
    }
    Ok(labels)
}

#[derive(Clone, Default)]
pub struct MnistBatcher {}

#[derive(Clone, Debug)]
pub struct MnistBatch<B: Backend> {
    /// Flattened images with brightness in [0, 1].
    ///
    /// # Shape
    /// [batch_size, WIDTH * HEIGHT]
    pub images: Tensor<B, 2>,
    /// One-hot labels.
    ///
    /// # Shape
    /// [batch_size, NUM_CLASSES]
    pub labels: Tensor<B, 2>,
}

impl<B: Backend> MnistBatch<B> {
    pub fn len(&self) -> usize {
        let [batch_size, _] = self.images.dims();
        batch_size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<B: Backend> Batcher<B, MnistItem, MnistBatch<B>> for MnistBatcher {
    fn batch(&self, items: Vec<MnistItem>, device: &B::Device) -> MnistBatch<B> {
        let batch_size = items.len();
        let mut images: Vec<Element> = Vec::with_capacity(batch_size * WIDTH * HEIGHT);
        let mut labels: Vec<Element> = vec![0.0; batch_size * NUM_CLASSES];
        for (i, item) in items.into_iter().enumerate() {
            assert_eq!(item.image.len(), WIDTH * HEIGHT);
            images.extend_from_slice(&item.image);
            labels[i * NUM_CLASSES + item.label as usize] = 1.0;
        }

        let images = TensorData::new(images, [batch_size, WIDTH * HEIGHT]).convert::<B::FloatElem>();
        let labels = TensorData::new(labels, [batch_size, NUM_CLASSES]).convert::<B::FloatElem>();

        MnistBatch {
            images: Tensor::from_data(images, device),
            labels: Tensor::from_data(labels, device),
        }
    }
}
