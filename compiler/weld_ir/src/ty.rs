//! Structural type expressions.
//!
//! Named declarations are `Item`s; everything a declaration *uses* as a type
//! (scalars, pointers, arrays, function prototypes, references to items) is a
//! `Ty` interned in the `TypeTable`. Identical expressions share a `TypeId`,
//! so type equality is id equality.

use rustc_hash::FxHashMap;

use crate::{to_u32, ItemId, Name, TypeId};

/// C and C++ integer kinds.
///
/// Sizes are target-dependent and live in the layout crate's target ABI.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IntKind {
    /// Plain `char`; signedness is target-dependent.
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Int128,
    UInt128,
    /// `wchar_t`; size and signedness are target-dependent.
    WChar,
    Char16,
    Char32,
}

impl IntKind {
    /// Whether the kind is signed, given the target's `char` signedness.
    pub fn is_signed(self, char_is_signed: bool, wchar_is_signed: bool) -> bool {
        match self {
            IntKind::Char => char_is_signed,
            IntKind::WChar => wchar_is_signed,
            IntKind::SChar
            | IntKind::Short
            | IntKind::Int
            | IntKind::Long
            | IntKind::LongLong
            | IntKind::Int128 => true,
            IntKind::UChar
            | IntKind::UShort
            | IntKind::UInt
            | IntKind::ULong
            | IntKind::ULongLong
            | IntKind::UInt128
            | IntKind::Char16
            | IntKind::Char32 => false,
        }
    }

    /// C spelling, used in diagnostics.
    pub fn c_spelling(self) -> &'static str {
        match self {
            IntKind::Char => "char",
            IntKind::SChar => "signed char",
            IntKind::UChar => "unsigned char",
            IntKind::Short => "short",
            IntKind::UShort => "unsigned short",
            IntKind::Int => "int",
            IntKind::UInt => "unsigned int",
            IntKind::Long => "long",
            IntKind::ULong => "unsigned long",
            IntKind::LongLong => "long long",
            IntKind::ULongLong => "unsigned long long",
            IntKind::Int128 => "__int128",
            IntKind::UInt128 => "unsigned __int128",
            IntKind::WChar => "wchar_t",
            IntKind::Char16 => "char16_t",
            IntKind::Char32 => "char32_t",
        }
    }
}

/// Floating-point kinds.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FloatKind {
    Float,
    Double,
    /// `long double`: no portable Rust equivalent.
    LongDouble,
    /// `__float128`: no portable Rust equivalent.
    Float128,
}

impl FloatKind {
    pub fn c_spelling(self) -> &'static str {
        match self {
            FloatKind::Float => "float",
            FloatKind::Double => "double",
            FloatKind::LongDouble => "long double",
            FloatKind::Float128 => "__float128",
        }
    }
}

/// Calling convention of a function or function pointer.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum CallConv {
    #[default]
    C,
    Stdcall,
    Fastcall,
    Thiscall,
    Vectorcall,
    Win64,
    SysV64,
    Aapcs,
}

impl CallConv {
    /// The Rust ABI string for `extern "..."`.
    pub fn rust_abi(self) -> &'static str {
        match self {
            CallConv::C => "C",
            CallConv::Stdcall => "stdcall",
            CallConv::Fastcall => "fastcall",
            CallConv::Thiscall => "thiscall",
            CallConv::Vectorcall => "vectorcall",
            CallConv::Win64 => "win64",
            CallConv::SysV64 => "sysv64",
            CallConv::Aapcs => "aapcs",
        }
    }
}

/// A function prototype: the payload of `Ty::Function`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct FnSig {
    pub ret: TypeId,
    pub params: Vec<TypeId>,
    pub variadic: bool,
    pub call_conv: CallConv,
}

/// A structural type expression.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Ty {
    Void,
    Bool,
    Int(IntKind),
    Float(FloatKind),
    /// Raw pointer. The pointee may legally be incomplete.
    Pointer { pointee: TypeId, is_const: bool },
    /// C++ reference; ABI-identical to a non-null pointer.
    Reference { pointee: TypeId, is_const: bool },
    /// Fixed array; `len == None` is a flexible array member.
    Array { element: TypeId, len: Option<u64> },
    /// Function type. Only valid behind a pointer or as a typedef target.
    Function(FnSig),
    /// Reference to a named declaration.
    Item(ItemId),
    /// Dependent type inside a class template pattern.
    TemplateParam(Name),
}

impl Ty {
    /// Whether values of this type are pointers at the ABI level.
    pub fn is_indirection(&self) -> bool {
        matches!(self, Ty::Pointer { .. } | Ty::Reference { .. })
    }
}

/// Hash-consed storage for `Ty`.
#[derive(Clone, Debug, Default)]
pub struct TypeTable {
    types: Vec<Ty>,
    dedup: FxHashMap<Ty, TypeId>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a type expression, returning the existing id when an
    /// identical expression was interned before.
    pub fn intern(&mut self, ty: Ty) -> TypeId {
        if let Some(&id) = self.dedup.get(&ty) {
            return id;
        }
        let id = TypeId::new(to_u32(self.types.len(), "types"));
        self.types.push(ty.clone());
        self.dedup.insert(ty, id);
        id
    }

    #[inline]
    pub fn get(&self, id: TypeId) -> &Ty {
        &self.types[id.index()]
    }

    /// Convenience for `Ty::Item`.
    pub fn item(&mut self, item: ItemId) -> TypeId {
        self.intern(Ty::Item(item))
    }

    /// Convenience for `Ty::Void`.
    pub fn void(&mut self) -> TypeId {
        self.intern(Ty::Void)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
