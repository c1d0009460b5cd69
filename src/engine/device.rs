use ort::execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch};

/// Compute backend used for inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cuda,
    CoreMl,
    Cpu,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cuda => "cuda",
            Self::CoreMl => "coreml",
            Self::Cpu => "cpu",
        }
    }
}

/// Floating-point precision of the graph to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Fp16,
    Fp32,
}

/// Attention kernel requested at session construction.
///
/// `Fused` is only attempted on CUDA; session construction falls back to
/// `Generic` once if the fused kernel fails to initialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttentionKernel {
    Fused,
    Generic,
}

/// Device, precision and attention kernel chosen for this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    pub device: Device,
    pub precision: Precision,
    pub attention: AttentionKernel,
}

/// Probe available backends and pick the best configuration.
///
/// Priority: CUDA (fp16, fused attention), then CoreML (fp32, generic
/// attention), then CPU (fp32, generic attention). This is a pure function
/// of the host environment; it is deliberately not caller-configurable.
pub fn select_device() -> DeviceConfig {
    #[cfg(feature = "cuda")]
    {
        use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
        if CUDAExecutionProvider::default().is_available().unwrap_or(false) {
            return DeviceConfig {
                device: Device::Cuda,
                precision: Precision::Fp16,
                attention: AttentionKernel::Fused,
            };
        }
    }

    #[cfg(feature = "coreml")]
    {
        use ort::execution_providers::{CoreMLExecutionProvider, ExecutionProvider};
        if CoreMLExecutionProvider::default().is_available().unwrap_or(false) {
            return DeviceConfig {
                device: Device::CoreMl,
                precision: Precision::Fp32,
                attention: AttentionKernel::Generic,
            };
        }
    }

    DeviceConfig {
        device: Device::Cpu,
        precision: Precision::Fp32,
        attention: AttentionKernel::Generic,
    }
}

/// Execution providers to register for the given device, most specific
/// first with the CPU provider as the terminal fallback.
pub fn execution_providers(device: Device) -> Vec<ExecutionProviderDispatch> {
    let mut providers = Vec::new();
    match device {
        Device::Cuda => {
            #[cfg(feature = "cuda")]
            {
                use ort::execution_providers::CUDAExecutionProvider;
                providers.push(CUDAExecutionProvider::default().build());
            }
        }
        Device::CoreMl => {
            #[cfg(feature = "coreml")]
            {
                use ort::execution_providers::CoreMLExecutionProvider;
                providers.push(CoreMLExecutionProvider::default().build());
            }
        }
        Device::Cpu => {}
    }
    providers.push(CPUExecutionProvider::default().build());
    providers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(any(feature = "cuda", feature = "coreml")))]
    fn defaults_to_cpu_without_accelerator_features() {
        let config = select_device();
        assert_eq!(config.device, Device::Cpu);
        assert_eq!(config.precision, Precision::Fp32);
        assert_eq!(config.attention, AttentionKernel::Generic);
    }

    #[test]
    fn cpu_provider_is_always_registered_last() {
        for device in [Device::Cuda, Device::CoreMl, Device::Cpu] {
            assert!(!execution_providers(device).is_empty());
        }
    }
}
