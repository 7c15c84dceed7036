//! Compute backend chosen through cargo features.
//!
//! `ndarray` is on by default. Enabling another backend feature takes over without
//! `--no-default-features`; when several are enabled the first of `cuda`, `wgpu`,
//! `tch-gpu`, `tch-cpu` and `ndarray` is used.

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

pub type Element = f32;

/// Backend-specific default device.
pub trait MainDevice: Backend {
    fn main_device() -> <Self as Backend>::Device {
        Default::default()
    }
}

#[cfg(feature = "cuda")]
mod selected {
    use super::*;

    pub const BACKEND_NAME: &str = "cuda";
    pub type MainBackend = burn::backend::Cuda<Element, i32>;
    impl MainDevice for MainBackend {}
}

#[cfg(all(feature = "wgpu", not(feature = "cuda")))]
mod selected {
    use super::*;

    pub const BACKEND_NAME: &str = "wgpu";
    pub type MainBackend = burn::backend::wgpu::Wgpu<Element, i32>;
    impl MainDevice for MainBackend {}
}

#[cfg(all(feature = "tch-gpu", not(any(feature = "cuda", feature = "wgpu"))))]
mod selected {
    use super::*;
    use burn::backend::libtorch::LibTorchDevice;

    pub const BACKEND_NAME: &str = "tch-gpu";
    pub type MainBackend = burn::backend::libtorch::LibTorch<Element, i32>;
    impl MainDevice for MainBackend {
        fn main_device() -> LibTorchDevice {
            if cfg!(target_os = "macos") {
                LibTorchDevice::Mps
            } else {
                LibTorchDevice::Cuda(0)
            }
        }
    }
}

#[cfg(all(
    feature = "tch-cpu",
    not(any(feature = "cuda", feature = "wgpu", feature = "tch-gpu"))
))]
mod selected {
    use super::*;

    pub const BACKEND_NAME: &str = "tch-cpu";
    pub type MainBackend = burn::backend::libtorch::LibTorch<Element, i32>;
    impl MainDevice for MainBackend {}
}

#[cfg(all(
    feature = "ndarray",
    not(any(
        feature = "cuda",
        feature = "wgpu",
        feature = "tch-gpu",
        feature = "tch-cpu"
    ))
))]
mod selected {
    use super::*;

    pub const BACKEND_NAME: &str = "ndarray";
    pub type MainBackend = burn::backend::NdArray<Element, i32>;
    impl MainDevice for MainBackend {}
}

#[cfg(not(feature = "_has-backend"))]
mod selected {
    use super::*;
    std::compile_error!(
        "No backend selected. Enable one of the ndarray, tch-cpu, tch-gpu, wgpu or cuda features."
    );

    // pretend to fallback to ndarray (to avoid too many other unrelated errors)
    pub const BACKEND_NAME: &str = "none";
    pub type MainBackend = burn::backend::NdArray<Element, i32>;
    impl MainDevice for MainBackend {}
}

pub use selected::{BACKEND_NAME, MainBackend};

pub type MainAutoBackend = burn::backend::Autodiff<MainBackend>;
impl MainDevice for MainAutoBackend {
    fn main_device() -> <Self as Backend>::Device {
        <<Self as AutodiffBackend>::InnerBackend as MainDevice>::main_device()
    }
}
