/// Blend state of a renderable

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DestColor,
    OneMinusDestColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DestAlpha,
    OneMinusDestAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOperation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Color and alpha blend equations
///
/// When `enabled` is false the other fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendMode {
    pub enabled: bool,
    pub src: BlendFactor,
    pub dest: BlendFactor,
    pub op: BlendOperation,
    pub src_alpha: BlendFactor,
    pub dest_alpha: BlendFactor,
    pub op_alpha: BlendOperation,
}

impl BlendMode {
    pub const DISABLED: BlendMode = BlendMode {
        enabled: false,
        src: BlendFactor::One,
        dest: BlendFactor::Zero,
        op: BlendOperation::Add,
        src_alpha: BlendFactor::One,
        dest_alpha: BlendFactor::Zero,
        op_alpha: BlendOperation::Add,
    };

    /// Straight alpha
    pub const NON_PREMULTIPLIED: BlendMode = BlendMode {
        enabled: true,
        src: BlendFactor::SrcAlpha,
        dest: BlendFactor::OneMinusSrcAlpha,
        op: BlendOperation::Add,
        src_alpha: BlendFactor::One,
        dest_alpha: BlendFactor::OneMinusSrcAlpha,
        op_alpha: BlendOperation::Add,
    };

    pub const PREMULTIPLIED: BlendMode = BlendMode {
        enabled: true,
        src: BlendFactor::One,
        dest: BlendFactor::OneMinusSrcAlpha,
        op: BlendOperation::Add,
        src_alpha: BlendFactor::One,
        dest_alpha: BlendFactor::OneMinusSrcAlpha,
        op_alpha: BlendOperation::Add,
    };

    pub const ADDITIVE: BlendMode = BlendMode {
        enabled: true,
        src: BlendFactor::SrcAlpha,
        dest: BlendFactor::One,
        op: BlendOperation::Add,
        src_alpha: BlendFactor::One,
        dest_alpha: BlendFactor::One,
        op_alpha: BlendOperation::Add,
    };
}

impl Default for BlendMode {
    fn default() -> Self {
        BlendMode::DISABLED
    }
}
