use crate::error::{Result, SentimentError};
use candle_core::Device;

/// Which device a pipeline should run on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceRequest {
    /// CPU (default).
    #[default]
    Cpu,
    /// A CUDA GPU by index.
    Cuda(usize),
}

impl DeviceRequest {
    /// Resolve the request into an actual [`Device`].
    pub fn resolve(self) -> Result<Device> {
        match self {
            DeviceRequest::Cpu => Ok(Device::Cpu),
            DeviceRequest::Cuda(i) => Device::new_cuda(i).map_err(|e| {
                SentimentError::Device(format!(
                    "Failed to init CUDA device {i}: {e}. Try CPU as fallback."
                ))
            }),
        }
    }
}

/// Parses `"cpu"`, `"cuda"` (GPU 0) or `"cuda:N"`.
impl std::str::FromStr for DeviceRequest {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "cpu" => Ok(DeviceRequest::Cpu),
            "cuda" | "gpu" => Ok(DeviceRequest::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|i| i.parse().ok())
                .map(DeviceRequest::Cuda)
                .ok_or_else(|| {
                    SentimentError::Config(format!(
                        "unknown device '{other}': expected 'cpu' or 'cuda:N'"
                    ))
                }),
        }
    }
}

macro_rules! impl_device_methods {
    ($builder:ident < $($gen:ident : $bound:path),* >) => {
        impl<$($gen: $bound),*> $builder<$($gen),*> {
            /// Use CPU for inference (default).
            pub fn cpu(mut self) -> Self {
                self.device_request = crate::pipelines::utils::DeviceRequest::Cpu;
                self
            }

            /// Use a specific CUDA GPU for inference.
            pub fn cuda(mut self, index: usize) -> Self {
                self.device_request = crate::pipelines::utils::DeviceRequest::Cuda(index);
                self
            }

            /// Use an already parsed device request.
            pub fn device(mut self, request: crate::pipelines::utils::DeviceRequest) -> Self {
                self.device_request = request;
                self
            }
        }
    };
}

pub(crate) use impl_device_methods;
