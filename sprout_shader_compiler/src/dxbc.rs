//! HLSL to DXBC (shader model 5.0) through `D3DCompile`
//!
//! Only available on Windows. Includes are expanded before compilation so
//! `include_dir` behaves the same as on the SPIR-V path.

use std::path::Path;

use sprout_graphics::graphics_device::ShaderStage;
use sprout_graphics::Result;

/// Shader model 5.0 profile for a stage
pub fn target_profile(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vs_5_0",
        ShaderStage::Pixel => "ps_5_0",
    }
}

/// True when this build can produce DXBC
pub fn is_available() -> bool {
    cfg!(windows)
}

#[cfg(windows)]
pub fn hlsl_to_dxbc(
    stage: ShaderStage,
    source: &str,
    entry_point: &str,
    include_dir: Option<&Path>,
) -> Result<Vec<u8>> {
    use std::ffi::CString;

    use sprout_graphics::backend::Backend;
    use sprout_graphics::Error;
    use windows::core::PCSTR;
    use windows::Win32::Graphics::Direct3D::Fxc::D3DCompile;
    use windows::Win32::Graphics::Direct3D::ID3DBlob;

    let fail = |message: String| {
        sprout_graphics::sprout_error!("sprout::shader_compiler", "D3DCompile failed: {}", message);
        Error::ShaderCompile { backend: Backend::D3D11, stage, message }
    };

    let expanded = crate::include::expand_includes(source, include_dir)?;
    let entry = CString::new(entry_point).map_err(|_| fail("entry point contains NUL".to_string()))?;
    let target = CString::new(target_profile(stage)).map_err(|_| fail("invalid profile".to_string()))?;
    let name = CString::new("shader.hlsl").map_err(|_| fail("invalid source name".to_string()))?;

    let mut code: Option<ID3DBlob> = None;
    let mut errors: Option<ID3DBlob> = None;

    let result = unsafe {
        D3DCompile(
            expanded.as_ptr() as *const _,
            expanded.len(),
            PCSTR(name.as_ptr() as *const u8),
            None,
            None,
            PCSTR(entry.as_ptr() as *const u8),
            PCSTR(target.as_ptr() as *const u8),
            0,
            0,
            &mut code,
            Some(&mut errors),
        )
    };

    if let Err(e) = result {
        let message = errors
            .as_ref()
            .map(|blob| unsafe { blob_bytes(blob) })
            .map(|bytes| String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string())
            .unwrap_or_else(|| e.to_string());
        return Err(fail(message));
    }

    match code {
        Some(blob) => Ok(unsafe { blob_bytes(&blob) }.to_vec()),
        None => Err(fail("D3DCompile produced no bytecode".to_string())),
    }
}

#[cfg(windows)]
unsafe fn blob_bytes(blob: &windows::Win32::Graphics::Direct3D::ID3DBlob) -> &[u8] {
    std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize())
}

#[cfg(not(windows))]
pub fn hlsl_to_dxbc(
    stage: ShaderStage,
    _source: &str,
    _entry_point: &str,
    _include_dir: Option<&Path>,
) -> Result<Vec<u8>> {
    Err(sprout_graphics::Error::ShaderCompile {
        backend: sprout_graphics::backend::Backend::D3D11,
        stage,
        message: "DXBC compilation requires Windows".to_string(),
    })
}
