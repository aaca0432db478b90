use crate::error::{PipelineError, Result};
use candle_core::Device;

/// Which device the pipeline should run on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceRequest {
    /// CUDA device 0 when available, otherwise CPU.
    #[default]
    Auto,
    Cpu,
    Cuda(usize),
}

impl DeviceRequest {
    pub fn resolve(self) -> Result<Device> {
        match self {
            DeviceRequest::Auto => Device::cuda_if_available(0).map_err(|e| {
                PipelineError::Device(format!("Failed to probe CUDA device 0: {e}"))
            }),
            DeviceRequest::Cpu => Ok(Device::Cpu),
            DeviceRequest::Cuda(i) => Device::new_cuda(i).map_err(|e| {
                PipelineError::Device(format!(
                    "Failed to init CUDA device {i}: {e}. Try CPU as fallback."
                ))
            }),
        }
    }
}

impl std::str::FromStr for DeviceRequest {
    type Err = PipelineError;

    /// Accepts `auto`, `cpu`, `cuda` (device 0) and `cuda:N`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "auto" => Ok(DeviceRequest::Auto),
            "cpu" => Ok(DeviceRequest::Cpu),
            "cuda" | "gpu" => Ok(DeviceRequest::Cuda(0)),
            _ => s
                .strip_prefix("cuda:")
                .and_then(|index| index.parse().ok())
                .map(DeviceRequest::Cuda)
                .ok_or_else(|| PipelineError::Config(format!("Unknown device '{s}'"))),
        }
    }
}

macro_rules! impl_device_methods {
    ($builder:ident) => {
        impl $builder {
            /// Use CUDA device 0 when available, otherwise CPU (default).
            pub fn auto_device(mut self) -> Self {
                self.device_request = crate::pipelines::utils::DeviceRequest::Auto;
                self
            }

            /// Use CPU for inference.
            pub fn cpu(mut self) -> Self {
                self.device_request = crate::pipelines::utils::DeviceRequest::Cpu;
                self
            }

            /// Use a specific CUDA GPU for inference.
            pub fn cuda(mut self, index: usize) -> Self {
                self.device_request = crate::pipelines::utils::DeviceRequest::Cuda(index);
                self
            }

            /// Set the device from a parsed [`DeviceRequest`].
            pub fn device_request(
                mut self,
                request: crate::pipelines::utils::DeviceRequest,
            ) -> Self {
                self.device_request = request;
                self
            }
        }
    };
}

pub(crate) use impl_device_methods;
