//! The declaration tree delivered by a front-end.
//!
//! This is the boundary model: it mirrors what a C/C++ parser exposes when
//! walking its AST (records, enums, functions, typedefs, namespaces, class
//! templates and their specializations), and it is what `.decls.json` dumps
//! deserialize into. Nothing here is resolved yet: references to other
//! declarations are by USR (unified symbol resolution string).

use serde::{Deserialize, Serialize};

/// Top-level object of a `.decls.json` dump.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeclDump {
    pub version: u32,
    #[serde(default)]
    pub units: Vec<TranslationUnit>,
}

/// Everything one front-end invocation saw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Main file of the unit. Declarations without an explicit file in
    /// their location are attributed to it.
    pub file: String,
    #[serde(default)]
    pub decls: Vec<Decl>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decl {
    Record(RecordDecl),
    Enum(EnumDecl),
    Function(FunctionDecl),
    Typedef(TypedefDecl),
    Namespace(NamespaceDecl),
    ClassTemplate(ClassTemplateDecl),
    Specialization(SpecializationDecl),
}

impl Decl {
    /// The declaration's source name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Decl::Record(r) => r.name.as_deref(),
            Decl::Specialization(s) => s.record.name.as_deref(),
            Decl::Enum(e) => e.name.as_deref(),
            Decl::Function(f) => Some(&f.name),
            Decl::Typedef(t) => Some(&t.name),
            Decl::Namespace(n) => n.name.as_deref(),
            Decl::ClassTemplate(t) => Some(&t.name),
        }
    }
}

/// Source position. `file` defaults to the unit's main file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loc {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    /// The file is a system header (`-isystem`, `<...>` include).
    #[serde(default)]
    pub system: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordTag {
    #[default]
    Struct,
    Class,
    Union,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordDecl {
    /// Missing for anonymous records from front-ends that do not assign
    /// USRs to them; the importer synthesizes a unit-local identity.
    #[serde(default)]
    pub usr: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tag: RecordTag,
    #[serde(default)]
    pub location: Loc,
    /// `false` for a forward declaration.
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub bases: Vec<TypeRef>,
    #[serde(default)]
    pub packed: bool,
    #[serde(default)]
    pub align: Option<u64>,
    /// Non-trivial copy constructor or destructor.
    #[serde(default)]
    pub non_trivial: bool,
    /// Number of C++ member functions declared.
    #[serde(default)]
    pub methods: u32,
    /// Declarations lexically nested in the record body.
    #[serde(default)]
    pub nested: Vec<Decl>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub bit_width: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    #[serde(default)]
    pub usr: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Loc,
    /// Backing integer as computed by the front-end.
    #[serde(default = "default_enum_repr")]
    pub repr: CInt,
    #[serde(default)]
    pub variants: Vec<VariantDecl>,
    #[serde(default = "default_true")]
    pub complete: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDecl {
    pub name: String,
    pub value: i64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    #[default]
    External,
    Internal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub usr: String,
    pub name: String,
    #[serde(default)]
    pub location: Loc,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default = "TypeRef::void")]
    pub ret: TypeRef,
    #[serde(default)]
    pub variadic: bool,
    #[serde(default)]
    pub call_conv: CCallConv,
    #[serde(default)]
    pub linkage: Linkage,
    /// Linker symbol when it differs from `name`.
    #[serde(default)]
    pub mangled: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypedefDecl {
    pub usr: String,
    pub name: String,
    #[serde(default)]
    pub location: Loc,
    pub target: TypeRef,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamespaceDecl {
    /// `None` for an anonymous namespace; its members are not qualified.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Loc,
    #[serde(default)]
    pub decls: Vec<Decl>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassTemplateDecl {
    pub usr: String,
    pub name: String,
    #[serde(default)]
    pub tag: RecordTag,
    #[serde(default)]
    pub location: Loc,
    #[serde(default)]
    pub params: Vec<String>,
}

/// A concrete class template specialization: a record plus the template it
/// instantiates and the arguments it was instantiated with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecializationDecl {
    /// USR of the `ClassTemplateDecl`.
    pub template: String,
    #[serde(default)]
    pub args: Vec<TypeRef>,
    #[serde(flatten)]
    pub record: RecordDecl,
}

/// A type as written at a use site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeRef {
    Void,
    Bool,
    Int {
        kind: CInt,
    },
    Float {
        kind: CFloat,
    },
    Pointer {
        pointee: Box<TypeRef>,
        #[serde(default, rename = "const")]
        is_const: bool,
    },
    Reference {
        pointee: Box<TypeRef>,
        #[serde(default, rename = "const")]
        is_const: bool,
    },
    Array {
        element: Box<TypeRef>,
        /// `None` for a flexible array member.
        #[serde(default)]
        len: Option<u64>,
    },
    Function {
        ret: Box<TypeRef>,
        #[serde(default)]
        params: Vec<TypeRef>,
        #[serde(default)]
        variadic: bool,
        #[serde(default)]
        call_conv: CCallConv,
    },
    /// Reference to a declaration by USR. `name` is the spelling at the use
    /// site, used when the USR was never declared.
    Decl {
        usr: String,
        #[serde(default)]
        name: Option<String>,
    },
    TemplateParam {
        name: String,
    },
}

impl TypeRef {
    pub fn void() -> Self {
        TypeRef::Void
    }

    pub fn int(kind: CInt) -> Self {
        TypeRef::Int { kind }
    }

    pub fn pointer(pointee: TypeRef) -> Self {
        TypeRef::Pointer {
            pointee: Box::new(pointee),
            is_const: false,
        }
    }

    pub fn decl(usr: impl Into<String>) -> Self {
        TypeRef::Decl {
            usr: usr.into(),
            name: None,
        }
    }

    /// C-like spelling, used for template argument display names.
    pub fn spelling(&self) -> String {
        match self {
            TypeRef::Void => "void".to_owned(),
            TypeRef::Bool => "bool".to_owned(),
            TypeRef::Int { kind } => weld_ir::IntKind::from(*kind).c_spelling().to_owned(),
            TypeRef::Float { kind } => weld_ir::FloatKind::from(*kind).c_spelling().to_owned(),
            TypeRef::Pointer { pointee, is_const } | TypeRef::Reference { pointee, is_const } => {
                let sigil = if matches!(self, TypeRef::Pointer { .. }) {
                    "*"
                } else {
                    "&"
                };
                let cv = if *is_const { "const " } else { "" };
                format!("{cv}{}{sigil}", pointee.spelling())
            }
            TypeRef::Array { element, len } => match len {
                Some(n) => format!("{}[{n}]", element.spelling()),
                None => format!("{}[]", element.spelling()),
            },
            TypeRef::Function { ret, params, .. } => {
                let params: Vec<String> = params.iter().map(TypeRef::spelling).collect();
                format!("{}({})", ret.spelling(), params.join(", "))
            }
            TypeRef::Decl { usr, name } => name.clone().unwrap_or_else(|| usr.clone()),
            TypeRef::TemplateParam { name } => name.clone(),
        }
    }
}

/// C integer kinds as spelled in a dump.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CInt {
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Int128,
    UnsignedInt128,
    Wchar,
    Char16,
    Char32,
}

impl From<CInt> for weld_ir::IntKind {
    fn from(kind: CInt) -> Self {
        use weld_ir::IntKind;
        match kind {
            CInt::Char => IntKind::Char,
            CInt::SignedChar => IntKind::SChar,
            CInt::UnsignedChar => IntKind::UChar,
            CInt::Short => IntKind::Short,
            CInt::UnsignedShort => IntKind::UShort,
            CInt::Int => IntKind::Int,
            CInt::UnsignedInt => IntKind::UInt,
            CInt::Long => IntKind::Long,
            CInt::UnsignedLong => IntKind::ULong,
            CInt::LongLong => IntKind::LongLong,
            CInt::UnsignedLongLong => IntKind::ULongLong,
            CInt::Int128 => IntKind::Int128,
            CInt::UnsignedInt128 => IntKind::UInt128,
            CInt::Wchar => IntKind::WChar,
            CInt::Char16 => IntKind::Char16,
            CInt::Char32 => IntKind::Char32,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CFloat {
    Float,
    Double,
    LongDouble,
    Float128,
}

impl From<CFloat> for weld_ir::FloatKind {
    fn from(kind: CFloat) -> Self {
        use weld_ir::FloatKind;
        match kind {
            CFloat::Float => FloatKind::Float,
            CFloat::Double => FloatKind::Double,
            CFloat::LongDouble => FloatKind::LongDouble,
            CFloat::Float128 => FloatKind::Float128,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CCallConv {
    #[default]
    C,
    Stdcall,
    Fastcall,
    Thiscall,
    Vectorcall,
    Win64,
    Sysv64,
    Aapcs,
}

impl From<CCallConv> for weld_ir::CallConv {
    fn from(cc: CCallConv) -> Self {
        use weld_ir::CallConv;
        match cc {
            CCallConv::C => CallConv::C,
            CCallConv::Stdcall => CallConv::Stdcall,
            CCallConv::Fastcall => CallConv::Fastcall,
            CCallConv::Thiscall => CallConv::Thiscall,
            CCallConv::Vectorcall => CallConv::Vectorcall,
            CCallConv::Win64 => CallConv::Win64,
            CCallConv::Sysv64 => CallConv::SysV64,
            CCallConv::Aapcs => CallConv::Aapcs,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_enum_repr() -> CInt {
    CInt::UnsignedInt
}
