#![allow(dead_code)]

use flate2::{Compression, write::GzEncoder};
use mnist_deepnn::mnist::dataset::{
    HEIGHT, MnistItem, TEST_IMAGES, TEST_LABELS, TRAIN_IMAGES, TRAIN_LABELS, WIDTH,
};
use std::io::Write;
use std::path::Path;

/// Label of the `i`-th synthetic item.
pub fn label_of(i: usize) -> u8 {
    (i % 10) as u8
}

/// Synthetic digit: two bright rows whose position encodes the label.
pub fn image_bytes(label: u8) -> Vec<u8> {
    let mut image = vec![0u8; WIDTH * HEIGHT];
    let row = 2 + 2 * label as usize;
    for r in row..row + 2 {
        for c in 4..WIDTH - 4 {
            image[r * WIDTH + c] = 255;
        }
    }
    image
}

pub fn item(i: usize) -> MnistItem {
    let label = label_of(i);
    MnistItem {
        image: image_bytes(label).iter().map(|&b| b as f32 / 255.0).collect(),
        label,
    }
}

pub fn images_idx(labels: &[u8]) -> Vec<u8> {
    let mut bytes = vec![];
    bytes.extend_from_slice(&2051u32.to_be_bytes());
    bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&(HEIGHT as u32).to_be_bytes());
    bytes.extend_from_slice(&(WIDTH as u32).to_be_bytes());
    for &label in labels {
        bytes.extend_from_slice(&image_bytes(label));
    }
    bytes
}

pub fn labels_idx(labels: &[u8]) -> Vec<u8> {
    let mut bytes = vec![];
    bytes.extend_from_slice(&2049u32.to_be_bytes());
    bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    bytes.extend_from_slice(labels);
    bytes
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8], gzip: bool) {
    if gzip {
        let file = std::fs::File::create(dir.join(format!("{name}.gz"))).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap();
    } else {
        std::fs::write(dir.join(name), bytes).unwrap();
    }
}

/// Writes all four MNIST files with `n_train` and `n_test` synthetic items.
pub fn write_mnist(dir: &Path, n_train: usize, n_test: usize, gzip: bool) {
    let train: Vec<u8> = (0..n_train).map(label_of).collect();
    let test: Vec<u8> = (0..n_test).map(label_of).collect();
    write_file(dir, TRAIN_IMAGES, &images_idx(&train), gzip);
    write_file(dir, TRAIN_LABELS, &labels_idx(&train), gzip);
    write_file(dir, TEST_IMAGES, &images_idx(&test), gzip);
    write_file(dir, TEST_LABELS, &labels_idx(&test), gzip);
}

pub fn max_abs_diff(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}
