//! ONNX Runtime session setup shared by the model-backed engines.

use std::fmt::Display;
use std::path::Path;

use image::RgbImage;
use ndarray::{Array, Array4, Dimension};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{DynValue, Value};

use crate::error::{Error, Result};

/// ImageNet channel statistics used by both detector families.
pub(crate) const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub(crate) const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// How ONNX sessions are created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Register the CUDA execution provider ahead of the CPU one
    pub use_gpu: bool,
    /// Intra-op thread count; ONNX Runtime picks when unset
    pub intra_threads: Option<usize>,
}

impl SessionOptions {
    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = use_gpu;
        self
    }

    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }
}

fn init_err(e: impl Display) -> Error {
    Error::EngineInit(e.to_string())
}

/// Load an ONNX model.
pub(crate) fn load_session(model: &Path, options: &SessionOptions) -> Result<Session> {
    if !model.exists() {
        return Err(Error::EngineUnavailable(format!(
            "model file not found: {}",
            model.display()
        )));
    }

    log::info!("Loading ONNX model from {}", model.display());
    let mut builder = Session::builder()
        .map_err(init_err)?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(init_err)?;
    if let Some(threads) = options.intra_threads {
        builder = builder.with_intra_threads(threads).map_err(init_err)?;
    }
    if options.use_gpu {
        builder = builder
            .with_execution_providers([
                CUDAExecutionProvider::default().build(),
                CPUExecutionProvider::default().build(),
            ])
            .map_err(init_err)?;
    }
    builder.commit_from_file(model).map_err(init_err)
}

/// Normalized NCHW tensor data of an RGB image.
pub(crate) fn normalized_chw(image: &RgbImage, mean: [f32; 3], std: [f32; 3]) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let mut input = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            input[[0, c, y as usize, x as usize]] =
                (pixel[c] as f32 / 255.0 - mean[c]) / std[c];
        }
    }
    input
}

/// Wrap an `f32` array as an ONNX value.
pub(crate) fn f32_value<D: Dimension>(array: Array<f32, D>) -> Result<DynValue> {
    let shape = array.shape().to_vec();
    let (data, _offset) = array.into_raw_vec_and_offset();
    Ok(Value::from_array((shape.as_slice(), data))?.into_dyn())
}

/// Wrap an `i64` array as an ONNX value.
pub(crate) fn i64_value<D: Dimension>(array: Array<i64, D>) -> Result<DynValue> {
    let shape = array.shape().to_vec();
    let (data, _offset) = array.into_raw_vec_and_offset();
    Ok(Value::from_array((shape.as_slice(), data))?.into_dyn())
}
