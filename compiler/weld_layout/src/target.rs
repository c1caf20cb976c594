//! Target ABI model.
//!
//! Everything the layout resolver needs to know about a target: scalar sizes
//! and alignments, `char` signedness, and how bitfields are allocated. The
//! model is derived from a target triple; only little-endian targets are
//! supported, so bitfields are always allocated from the least significant
//! bit.

use std::fmt;

use weld_ir::{FloatKind, IntKind};

/// Target triples weld has an ABI model for.
pub const SUPPORTED_TARGETS: &[&str] = &[
    "x86_64-unknown-linux-gnu",
    "x86_64-unknown-linux-musl",
    "aarch64-unknown-linux-gnu",
    "aarch64-unknown-linux-musl",
    "x86_64-apple-darwin",
    "aarch64-apple-darwin",
    "x86_64-pc-windows-msvc",
    "x86_64-pc-windows-gnu",
    "i686-unknown-linux-gnu",
    "i686-pc-windows-msvc",
    "armv7-unknown-linux-gnueabihf",
    "wasm32-unknown-unknown",
    "wasm32-unknown-emscripten",
];

/// The triple used when none is given.
pub const DEFAULT_TARGET: &str = "x86_64-unknown-linux-gnu";

/// Error type for target selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("unsupported target '{triple}'. Supported targets: {}", supported.join(", "))]
    UnsupportedTarget {
        triple: String,
        supported: Vec<&'static str>,
    },
    #[error("invalid target triple '{triple}': {reason}")]
    InvalidTripleFormat { triple: String, reason: String },
}

/// Parsed target triple components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetTripleComponents {
    /// CPU architecture (e.g., `x86_64`, `aarch64`, `wasm32`)
    pub arch: String,
    /// Hardware vendor (e.g., `unknown`, `apple`, `pc`)
    pub vendor: String,
    /// Operating system (e.g., `linux`, `darwin`, `windows`)
    pub os: String,
    /// Environment/ABI (e.g., `gnu`, `musl`, `msvc`) - optional
    pub env: Option<String>,
}

impl TargetTripleComponents {
    /// Parse a target triple string into components.
    ///
    /// Format: `<arch>-<vendor>-<os>[-<env>]`
    pub fn parse(triple: &str) -> Result<Self, TargetError> {
        let parts: Vec<&str> = triple.split('-').collect();

        if parts.len() < 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(TargetError::InvalidTripleFormat {
                triple: triple.to_string(),
                reason: "expected at least 3 components: <arch>-<vendor>-<os>".to_string(),
            });
        }

        Ok(Self {
            arch: parts[0].to_string(),
            vendor: parts[1].to_string(),
            os: parts[2].to_string(),
            env: parts.get(3).map(|s| (*s).to_string()),
        })
    }

    pub fn is_wasm(&self) -> bool {
        self.arch == "wasm32" || self.arch == "wasm64"
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    pub fn is_macos(&self) -> bool {
        self.os == "darwin"
    }

    pub fn is_linux(&self) -> bool {
        self.os == "linux"
    }

    pub fn is_x86(&self) -> bool {
        matches!(self.arch.as_str(), "i386" | "i586" | "i686")
    }

    pub fn is_arm32(&self) -> bool {
        self.arch.starts_with("arm") || self.arch.starts_with("thumb")
    }
}

impl fmt::Display for TargetTripleComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.arch, self.vendor, self.os)?;
        if let Some(env) = &self.env {
            write!(f, "-{env}")?;
        }
        Ok(())
    }
}

/// C data model: the widths of `int`, `long` and pointers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataModel {
    /// 32-bit `int`, 64-bit `long` and pointers.
    Lp64,
    /// 32-bit `int` and `long`, 64-bit pointers.
    Llp64,
    /// 32-bit `int`, `long` and pointers.
    Ilp32,
}

/// How adjacent bitfields share storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BitfieldRule {
    /// System V: a bitfield is placed at the next free bit unless it would
    /// straddle an alignment boundary of its declared type. Units of
    /// different declared types share storage.
    SysV,
    /// Microsoft: each run of bitfields with the same declared type size
    /// occupies whole units of that type; a change of size starts a new
    /// unit.
    Msvc,
}

/// Size and alignment of a scalar, in bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScalarLayout {
    pub size: u64,
    pub align: u64,
}

impl ScalarLayout {
    pub const fn new(size: u64, align: u64) -> Self {
        ScalarLayout { size, align }
    }

    /// Natural layout: alignment equals size.
    pub const fn natural(size: u64) -> Self {
        ScalarLayout { size, align: size }
    }
}

/// The ABI facts of one target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetAbi {
    triple: String,
    components: TargetTripleComponents,
    data_model: DataModel,
    char_signed: bool,
    wchar: ScalarLayout,
    wchar_signed: bool,
    /// Alignment of `long long` and `double` inside aggregates.
    eightbyte_align: u64,
    max_align: u64,
    bitfield_rule: BitfieldRule,
}

impl TargetAbi {
    /// Build the ABI model for a supported triple.
    pub fn from_triple(triple: &str) -> Result<Self, TargetError> {
        if !SUPPORTED_TARGETS.contains(&triple) {
            return Err(TargetError::UnsupportedTarget {
                triple: triple.to_string(),
                supported: SUPPORTED_TARGETS.to_vec(),
            });
        }
        let components = TargetTripleComponents::parse(triple)?;
        Ok(Self::from_components(components))
    }

    fn from_components(components: TargetTripleComponents) -> Self {
        let data_model = if components.is_x86() || components.is_arm32() || components.is_wasm()
        {
            DataModel::Ilp32
        } else if components.is_windows() {
            DataModel::Llp64
        } else {
            DataModel::Lp64
        };

        // AAPCS64 (except Apple's variant) and 32-bit ARM make plain `char`
        // unsigned.
        let char_signed = !(components.is_arm32()
            || (components.arch == "aarch64" && !components.is_macos()));

        let (wchar, wchar_signed) = if components.is_windows() {
            (ScalarLayout::natural(2), false)
        } else if components.is_linux() && (components.arch == "aarch64" || components.is_arm32())
        {
            (ScalarLayout::natural(4), false)
        } else {
            (ScalarLayout::natural(4), true)
        };

        // i386 System V aligns 8-byte scalars to 4 inside aggregates.
        let eightbyte_align = if components.is_x86() && !components.is_windows() {
            4
        } else {
            8
        };

        let max_align = match data_model {
            DataModel::Lp64 | DataModel::Llp64 => 16,
            DataModel::Ilp32 if components.is_x86() && components.is_linux() => 16,
            DataModel::Ilp32 => 8,
        };

        let bitfield_rule = if components.is_windows() {
            BitfieldRule::Msvc
        } else {
            BitfieldRule::SysV
        };

        TargetAbi {
            triple: components.to_string(),
            components,
            data_model,
            char_signed,
            wchar,
            wchar_signed,
            eightbyte_align,
            max_align,
            bitfield_rule,
        }
    }

    pub fn triple(&self) -> &str {
        &self.triple
    }

    pub fn components(&self) -> &TargetTripleComponents {
        &self.components
    }

    pub fn data_model(&self) -> DataModel {
        self.data_model
    }

    pub fn bitfield_rule(&self) -> BitfieldRule {
        self.bitfield_rule
    }

    pub fn char_is_signed(&self) -> bool {
        self.char_signed
    }

    pub fn wchar_is_signed(&self) -> bool {
        self.wchar_signed
    }

    /// Largest fundamental alignment (`alignof(max_align_t)`).
    pub fn max_align(&self) -> u64 {
        self.max_align
    }

    pub fn is_64bit(&self) -> bool {
        !matches!(self.data_model, DataModel::Ilp32)
    }

    pub fn pointer(&self) -> ScalarLayout {
        if self.is_64bit() {
            ScalarLayout::natural(8)
        } else {
            ScalarLayout::natural(4)
        }
    }

    /// Largest object size in bytes: `PTRDIFF_MAX`, which is also the
    /// limit Rust puts on a type's size.
    pub fn max_object_size(&self) -> u64 {
        (1u64 << (self.pointer().size * 8 - 1)) - 1
    }

    /// `_Bool` / `bool`.
    pub fn bool_layout(&self) -> ScalarLayout {
        ScalarLayout::natural(1)
    }

    /// Layout of an integer kind; `None` when the target has no such type.
    pub fn int_layout(&self, kind: IntKind) -> Option<ScalarLayout> {
        let layout = match kind {
            IntKind::Char | IntKind::SChar | IntKind::UChar => ScalarLayout::natural(1),
            IntKind::Short | IntKind::UShort | IntKind::Char16 => ScalarLayout::natural(2),
            IntKind::Int | IntKind::UInt | IntKind::Char32 => ScalarLayout::natural(4),
            IntKind::Long | IntKind::ULong => match self.data_model {
                DataModel::Lp64 => ScalarLayout::natural(8),
                DataModel::Llp64 | DataModel::Ilp32 => ScalarLayout::natural(4),
            },
            IntKind::LongLong | IntKind::ULongLong => ScalarLayout::new(8, self.eightbyte_align),
            IntKind::Int128 | IntKind::UInt128 => {
                if !self.is_64bit() || self.components.is_windows() {
                    return None;
                }
                ScalarLayout::natural(16)
            }
            IntKind::WChar => self.wchar,
        };
        Some(layout)
    }

    /// Layout of a floating kind; `None` for kinds Rust cannot represent.
    pub fn float_layout(&self, kind: FloatKind) -> Option<ScalarLayout> {
        match kind {
            FloatKind::Float => Some(ScalarLayout::natural(4)),
            FloatKind::Double => Some(ScalarLayout::new(8, self.eightbyte_align)),
            FloatKind::LongDouble | FloatKind::Float128 => None,
        }
    }

    /// Whether an integer kind is signed on this target.
    pub fn is_signed(&self, kind: IntKind) -> bool {
        kind.is_signed(self.char_signed, self.wchar_signed)
    }
}

impl Default for TargetAbi {
    fn default() -> Self {
        Self::from_components(TargetTripleComponents {
            arch: "x86_64".to_string(),
            vendor: "unknown".to_string(),
            os: "linux".to_string(),
            env: Some("gnu".to_string()),
        })
    }
}

impl fmt::Display for TargetAbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.triple)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
