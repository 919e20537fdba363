use serde::{Serialize, Serializer};

/// Names a struct, interface, or enum declared in some module.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DeclRef {
    pub namespace: String,
    /// The name within the namespace.  Nested declarations are dotted with
    /// their parent, e.g. `Struct.Enum`.
    pub name: String,
}

impl DeclRef {
    pub fn new(namespace: &str, name: &str) -> DeclRef {
        DeclRef {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// The fully qualified name: `namespace.name`, or just `name` for the
    /// empty namespace.
    pub fn qualified(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl std::fmt::Display for DeclRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// The type of a field, parameter, or constant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float,
    Double,
    String,
    Handle,
    DataPipeConsumer,
    DataPipeProducer,
    MessagePipe,
    SharedBuffer,
    Struct(DeclRef),
    Array(Box<Kind>),
    Interface(DeclRef),
    InterfaceRequest(Box<Kind>),
    Enum(DeclRef),
}

impl Kind {
    /// Looks up the kinds whose spec is fixed: primitives and handles.
    pub fn from_simple_spec(spec: &str) -> Option<Kind> {
        use Kind::*;
        Some(match spec {
            "b" => Bool,
            "i8" => Int8,
            "u8" => Uint8,
            "i16" => Int16,
            "u16" => Uint16,
            "i32" => Int32,
            "u32" => Uint32,
            "i64" => Int64,
            "u64" => Uint64,
            "f" => Float,
            "d" => Double,
            "s" => String,
            "h" => Handle,
            "h:d:c" => DataPipeConsumer,
            "h:d:p" => DataPipeProducer,
            "h:m" => MessagePipe,
            "h:s" => SharedBuffer,
            _ => return None,
        })
    }

    /// The canonical spec string of this kind.  Two kinds are the same type
    /// exactly when their specs are equal.
    pub fn spec(&self) -> std::string::String {
        use Kind::*;
        match self {
            Bool => "b".into(),
            Int8 => "i8".into(),
            Uint8 => "u8".into(),
            Int16 => "i16".into(),
            Uint16 => "u16".into(),
            Int32 => "i32".into(),
            Uint32 => "u32".into(),
            Int64 => "i64".into(),
            Uint64 => "u64".into(),
            Float => "f".into(),
            Double => "d".into(),
            String => "s".into(),
            Handle => "h".into(),
            DataPipeConsumer => "h:d:c".into(),
            DataPipeProducer => "h:d:p".into(),
            MessagePipe => "h:m".into(),
            SharedBuffer => "h:s".into(),
            Struct(r) | Interface(r) | Enum(r) => format!("x:{}", r.qualified()),
            Array(inner) => format!("a:{}", inner.spec()),
            InterfaceRequest(inner) => format!("r:{}", inner.spec()),
        }
    }

    /// The number of bytes a field of this kind occupies in a packed struct.
    /// Variable sized data is stored out of line and referenced by an 8 byte
    /// pointer.
    pub fn size(&self) -> u32 {
        use Kind::*;
        match self {
            Bool | Int8 | Uint8 => 1,
            Int16 | Uint16 => 2,
            Int32 | Uint32 | Float => 4,
            Handle | DataPipeConsumer | DataPipeProducer | MessagePipe | SharedBuffer => 4,
            Interface(_) | InterfaceRequest(_) | Enum(_) => 4,
            Int64 | Uint64 | Double => 8,
            String | Array(_) | Struct(_) => 8,
        }
    }

    pub fn is_bool(&self) -> bool {
        *self == Kind::Bool
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.spec())
    }
}

impl Serialize for Kind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.spec())
    }
}
