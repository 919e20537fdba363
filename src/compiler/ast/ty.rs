/// A type as it is written in the schema, before any name is resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeSpec {
    /// A primitive keyword (`int32`, `string`, ...) or a (possibly dotted)
    /// reference to a struct, interface, or enum.
    Named(String),
    /// `handle` or `handle<subtype>`
    Handle(Option<HandleSubtype>),
    /// `T[]`
    Array(Box<TypeSpec>),
    /// `T&`
    InterfaceRequest(Box<TypeSpec>),
}

/// The qualifiers accepted inside `handle<...>`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HandleSubtype {
    DataPipeConsumer,
    DataPipeProducer,
    MessagePipe,
    SharedBuffer,
}

impl HandleSubtype {
    pub fn from_name(name: &str) -> Option<HandleSubtype> {
        match name {
            "data_pipe_consumer" => Some(HandleSubtype::DataPipeConsumer),
            "data_pipe_producer" => Some(HandleSubtype::DataPipeProducer),
            "message_pipe" => Some(HandleSubtype::MessagePipe),
            "shared_buffer" => Some(HandleSubtype::SharedBuffer),
            _ => None,
        }
    }
}

impl std::fmt::Display for HandleSubtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleSubtype::DataPipeConsumer => f.write_str("data_pipe_consumer"),
            HandleSubtype::DataPipeProducer => f.write_str("data_pipe_producer"),
            HandleSubtype::MessagePipe => f.write_str("message_pipe"),
            HandleSubtype::SharedBuffer => f.write_str("shared_buffer"),
        }
    }
}

impl std::fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeSpec::Named(name) => f.write_str(name),
            TypeSpec::Handle(None) => f.write_str("handle"),
            TypeSpec::Handle(Some(sub)) => write!(f, "handle<{}>", sub),
            TypeSpec::Array(inner) => write!(f, "{}[]", inner),
            TypeSpec::InterfaceRequest(inner) => write!(f, "{}&", inner),
        }
    }
}
