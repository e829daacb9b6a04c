/// D3D11Shader - vertex/pixel shader objects plus their reflected interface
///
/// The vertex bytecode is kept for input layout creation. Layouts are
/// cached per distinct vertex input.

use sprout_graphics::sprout::render::{
    find_attachment, validate_attachments, HandleCache, Shader, ShaderAttachment, ShaderStage, VertexAttribute,
};
use sprout_graphics::{sprout_debug, sprout_invariant, Error, Result};
use std::any::Any;
use std::cell::RefCell;
use std::ffi::{c_void, CString};
use std::rc::Rc;
use windows::core::{Interface, PCSTR};
use windows::Win32::Graphics::Direct3D::Fxc::D3DReflect;
use windows::Win32::Graphics::Direct3D::{
    D3D_NAME_UNDEFINED, D3D_SIT_CBUFFER, D3D_SIT_SAMPLER, D3D_SIT_TEXTURE,
};
use windows::Win32::Graphics::Direct3D11::{
    ID3D11ClassLinkage, ID3D11InputLayout, ID3D11PixelShader, ID3D11ShaderReflection, ID3D11VertexShader,
    D3D11_INPUT_ELEMENT_DESC, D3D11_INPUT_PER_VERTEX_DATA, D3D11_SHADER_DESC, D3D11_SHADER_INPUT_BIND_DESC,
    D3D11_SIGNATURE_PARAMETER_DESC,
};

use crate::d3d11_bindings::{input_for_location, InputParameter, ResourceKind, ShaderResource};
use crate::d3d11_context::{hresult_err, D3D11Shared};
use crate::d3d11_convert::attribute_format;

const DXBC_MAGIC: &[u8; 4] = b"DXBC";

pub struct D3D11Shader {
    shared: Rc<D3D11Shared>,
    vertex: ID3D11VertexShader,
    pixel: Option<ID3D11PixelShader>,
    vertex_bytecode: Vec<u8>,
    inputs: Vec<InputParameter>,
    resources: Vec<ShaderResource>,
    layouts: RefCell<HandleCache<Vec<VertexAttribute>, ID3D11InputLayout>>,
}

impl D3D11Shader {
    pub(crate) fn new(shared: Rc<D3D11Shared>, attachments: &[ShaderAttachment]) -> Result<Self> {
        validate_attachments(attachments)?;
        for attachment in attachments {
            check_dxbc(attachment)?;
        }

        let mut resources = Vec::new();

        let vertex_attachment = find_attachment(attachments, ShaderStage::Vertex)
            .ok_or_else(|| sprout_invariant!("sprout::d3d11", "Shader has no vertex stage"))?;
        let vertex_bytecode = vertex_attachment.source.clone();
        let vertex_reflection = reflect(&vertex_bytecode)?;
        let inputs = input_signature(&vertex_reflection)?;
        collect_resources(&vertex_reflection, &mut resources)?;

        let mut vertex = None;
        unsafe {
            shared
                .device
                .CreateVertexShader(&vertex_bytecode, None::<&ID3D11ClassLinkage>, Some(&mut vertex))
        }
        .map_err(|e| hresult_err("CreateVertexShader", &e))?;
        let vertex = vertex.ok_or_else(|| Error::BackendError("CreateVertexShader returned no object".to_string()))?;

        let pixel = match find_attachment(attachments, ShaderStage::Pixel) {
            Some(attachment) => {
                collect_resources(&reflect(&attachment.source)?, &mut resources)?;
                let mut pixel = None;
                unsafe {
                    shared
                        .device
                        .CreatePixelShader(&attachment.source, None::<&ID3D11ClassLinkage>, Some(&mut pixel))
                }
                .map_err(|e| hresult_err("CreatePixelShader", &e))?;
                pixel
            }
            None => None,
        };

        sprout_debug!(
            "sprout::d3d11",
            "Created shader with {} input(s), {} resource binding(s)",
            inputs.len(),
            resources.len()
        );

        Ok(Self {
            shared,
            vertex,
            pixel,
            vertex_bytecode,
            inputs,
            resources,
            layouts: RefCell::new(HandleCache::new()),
        })
    }

    pub(crate) fn resources(&self) -> &[ShaderResource] {
        &self.resources
    }

    /// Input layout for `attributes`, `None` when the vertex has no attributes
    pub(crate) fn input_layout(&self, attributes: &[VertexAttribute]) -> Result<Option<ID3D11InputLayout>> {
        if attributes.is_empty() {
            return Ok(None);
        }
        let key = attributes.to_vec();
        self.layouts
            .borrow_mut()
            .get_or_create(&key, |attributes| self.create_input_layout(attributes))
            .map(Some)
    }

    fn create_input_layout(&self, attributes: &[VertexAttribute]) -> Result<ID3D11InputLayout> {
        // Semantic names must outlive the element descriptions pointing at them
        let mut names = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            let input = input_for_location(&self.inputs, attribute.location)?;
            let name = CString::new(input.semantic.as_str())
                .map_err(|_| sprout_invariant!("sprout::d3d11", "Semantic '{}' contains a NUL byte", input.semantic))?;
            names.push((name, input.semantic_index));
        }

        let elements: Vec<D3D11_INPUT_ELEMENT_DESC> = attributes
            .iter()
            .zip(&names)
            .map(|(attribute, (name, semantic_index))| D3D11_INPUT_ELEMENT_DESC {
                SemanticName: PCSTR(name.as_ptr() as *const u8),
                SemanticIndex: *semantic_index,
                Format: attribute_format(attribute.attribute_type),
                InputSlot: 0,
                AlignedByteOffset: attribute.offset,
                InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            })
            .collect();

        let mut layout = None;
        unsafe {
            self.shared
                .device
                .CreateInputLayout(&elements, &self.vertex_bytecode, Some(&mut layout))
        }
        .map_err(|e| hresult_err("CreateInputLayout", &e))?;
        layout.ok_or_else(|| Error::BackendError("CreateInputLayout returned no object".to_string()))
    }

    /// Bind both stages on the immediate context
    pub(crate) fn bind(&self) {
        let context = &self.shared.context;
        unsafe {
            context.VSSetShader(&self.vertex, None);
            context.PSSetShader(self.pixel.as_ref(), None);
        }
    }

    pub(crate) fn from_dyn(shader: &dyn Shader) -> Result<&D3D11Shader> {
        shader
            .as_any()
            .downcast_ref::<D3D11Shader>()
            .ok_or_else(|| sprout_invariant!("sprout::d3d11", "Shader was not created by the D3D11 backend"))
    }
}

impl Shader for D3D11Shader {
    fn has_stage(&self, stage: ShaderStage) -> bool {
        match stage {
            ShaderStage::Vertex => true,
            ShaderStage::Pixel => self.pixel.is_some(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn check_dxbc(attachment: &ShaderAttachment) -> Result<()> {
    if !attachment.source.starts_with(DXBC_MAGIC) {
        return Err(sprout_invariant!(
            "sprout::d3d11",
            "{:?} payload is not DXBC bytecode",
            attachment.stage
        ));
    }
    Ok(())
}

fn reflect(bytecode: &[u8]) -> Result<ID3D11ShaderReflection> {
    let mut raw: *mut c_void = std::ptr::null_mut();
    unsafe {
        D3DReflect(
            bytecode.as_ptr() as *const c_void,
            bytecode.len(),
            &ID3D11ShaderReflection::IID,
            &mut raw,
        )
        .map_err(|e| hresult_err("D3DReflect", &e))?;
        if raw.is_null() {
            return Err(Error::BackendError("D3DReflect returned no reflector".to_string()));
        }
        Ok(ID3D11ShaderReflection::from_raw(raw))
    }
}

fn shader_desc(reflection: &ID3D11ShaderReflection) -> Result<D3D11_SHADER_DESC> {
    let mut desc = D3D11_SHADER_DESC::default();
    unsafe { reflection.GetDesc(&mut desc) }.map_err(|e| hresult_err("ID3D11ShaderReflection::GetDesc", &e))?;
    Ok(desc)
}

fn pcstr_to_string(name: PCSTR) -> String {
    if name.is_null() {
        return String::new();
    }
    unsafe { name.to_string() }.unwrap_or_default()
}

/// Vertex inputs fed from vertex buffers (system values excluded)
fn input_signature(reflection: &ID3D11ShaderReflection) -> Result<Vec<InputParameter>> {
    let desc = shader_desc(reflection)?;
    let mut inputs = Vec::with_capacity(desc.InputParameters as usize);
    for index in 0..desc.InputParameters {
        let mut parameter = D3D11_SIGNATURE_PARAMETER_DESC::default();
        unsafe { reflection.GetInputParameterDesc(index, &mut parameter) }
            .map_err(|e| hresult_err("ID3D11ShaderReflection::GetInputParameterDesc", &e))?;
        if parameter.SystemValueType != D3D_NAME_UNDEFINED {
            continue;
        }
        inputs.push(InputParameter {
            semantic: pcstr_to_string(parameter.SemanticName),
            semantic_index: parameter.SemanticIndex,
            register: parameter.Register,
        });
    }
    Ok(inputs)
}

fn collect_resources(reflection: &ID3D11ShaderReflection, resources: &mut Vec<ShaderResource>) -> Result<()> {
    let desc = shader_desc(reflection)?;
    for index in 0..desc.BoundResources {
        let mut binding = D3D11_SHADER_INPUT_BIND_DESC::default();
        unsafe { reflection.GetResourceBindingDesc(index, &mut binding) }
            .map_err(|e| hresult_err("ID3D11ShaderReflection::GetResourceBindingDesc", &e))?;

        let name = pcstr_to_string(binding.Name);
        let kind = match binding.Type {
            D3D_SIT_CBUFFER => ResourceKind::ConstantBuffer,
            D3D_SIT_TEXTURE => ResourceKind::Texture,
            D3D_SIT_SAMPLER => ResourceKind::Sampler,
            other => {
                return Err(sprout_invariant!(
                    "sprout::d3d11",
                    "Shader resource '{}' has unsupported type {}",
                    name,
                    other.0
                ))
            }
        };
        let resource = ShaderResource {
            name,
            kind,
            slot: binding.BindPoint,
        };
        if !resources.contains(&resource) {
            resources.push(resource);
        }
    }
    Ok(())
}
