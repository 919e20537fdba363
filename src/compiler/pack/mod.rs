//! Computes the wire layout of a struct.
//!
//! Fields are placed in ordinal order.  Each field is aligned to its own size
//! and goes into the first hole left between already placed fields that can
//! hold it, so adding a field with the next ordinal never moves an existing
//! field.  Consecutive bools share a byte, one bit each.  The total size is
//! padded to a multiple of 8.

use log::trace;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::ir::{Field, Struct};

mod layout;

pub use layout::{byte_layout, ByteInfo};

#[derive(Clone, Debug, PartialEq)]
pub enum LayoutError {
    DuplicateOrdinal {
        struct_name: String,
        ordinal: u32,
        first: String,
        second: String,
    },
    OrdinalOverflow {
        struct_name: String,
        field: String,
    },
    /// A field begins inside the bytes of the field placed before it
    Overlap {
        struct_name: String,
        offset: u32,
        field: String,
        previous: String,
    },
    /// Several fields begin at one byte but they are not bools on distinct bits
    SharedByte {
        struct_name: String,
        offset: u32,
        fields: Vec<String>,
    },
    PaddingConflict {
        struct_name: String,
        offset: u32,
    },
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::DuplicateOrdinal {
                struct_name,
                ordinal,
                first,
                second,
            } => write!(
                f,
                "{}: Error: Fields {} and {} both have ordinal @{}",
                struct_name, first, second, ordinal
            ),
            LayoutError::OrdinalOverflow { struct_name, field } => write!(
                f,
                "{}: Error: Implicit ordinal of field {} is out of range (maximum is {})",
                struct_name,
                field,
                u32::MAX
            ),
            LayoutError::Overlap {
                struct_name,
                offset,
                field,
                previous,
            } => write!(
                f,
                "{}: Error: Field {} at byte {} overlaps field {}",
                struct_name, field, offset, previous
            ),
            LayoutError::SharedByte {
                struct_name,
                offset,
                fields,
            } => write!(
                f,
                "{}: Error: Fields {} cannot share byte {}",
                struct_name,
                fields.join(", "),
                offset
            ),
            LayoutError::PaddingConflict {
                struct_name,
                offset,
            } => write!(
                f,
                "{}: Error: Byte {} is both padding and part of a field",
                struct_name, offset
            ),
        }
    }
}

impl std::error::Error for LayoutError {}

/// Returns the number of bytes needed to move `offset` up to a multiple of
/// `alignment`.
pub fn get_pad(offset: u32, alignment: u32) -> u32 {
    (alignment - offset % alignment) % alignment
}

/// A field with its position in the packed struct.
#[derive(Clone, Debug, PartialEq)]
pub struct PackedField<'a> {
    pub field: &'a Field,
    pub ordinal: u32,
    pub size: u32,
    pub offset: u32,
    /// Bit within the byte at `offset`.  Only bools use bits other than 0.
    pub bit: u8,
}

impl<'a> PackedField<'a> {
    fn new(field: &'a Field, ordinal: u32) -> PackedField<'a> {
        PackedField {
            field,
            ordinal,
            size: field.kind.size(),
            offset: 0,
            bit: 0,
        }
    }

    pub fn end(&self) -> u32 {
        self.offset + self.size
    }

    pub fn is_bool(&self) -> bool {
        self.field.kind.is_bool()
    }

    /// Positions this field directly after `last`.  A bool after a bool
    /// which does not end its byte takes the next bit of that byte.
    fn place_after(&mut self, last: &PackedField) {
        if self.is_bool() && last.is_bool() && last.bit < 7 {
            self.offset = last.offset;
            self.bit = last.bit + 1;
        } else {
            let offset = last.end();
            self.offset = offset + get_pad(offset, self.size);
            self.bit = 0;
        }
    }
}

impl<'a> Serialize for PackedField<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PackedField", 6)?;
        s.serialize_field("name", &self.field.name)?;
        s.serialize_field("kind", &self.field.kind)?;
        s.serialize_field("ordinal", &self.ordinal)?;
        s.serialize_field("offset", &self.offset)?;
        s.serialize_field("bit", &self.bit)?;
        s.serialize_field("size", &self.size)?;
        s.end()
    }
}

/// The layout of a struct.  Borrows the struct it was computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct PackedStruct<'a> {
    pub source: &'a Struct,
    /// Ordered by offset, then bit
    pub packed_fields: Vec<PackedField<'a>>,
}

impl<'a> PackedStruct<'a> {
    pub fn new(source: &'a Struct) -> Result<PackedStruct<'a>, LayoutError> {
        let mut fields = assign_ordinals(source)?;
        // Stable, so fields with equal ordinals keep declaration order for
        // the error message.
        fields.sort_by_key(|f| f.ordinal);
        if let Some(pair) = fields.windows(2).find(|w| w[0].ordinal == w[1].ordinal) {
            return Err(LayoutError::DuplicateOrdinal {
                struct_name: source.name.clone(),
                ordinal: pair[0].ordinal,
                first: pair[0].field.name.clone(),
                second: pair[1].field.name.clone(),
            });
        }

        let mut placed: Vec<PackedField> = Vec::with_capacity(fields.len());
        for mut field in fields {
            if placed.is_empty() {
                field.offset = 0;
                field.bit = 0;
                placed.push(field);
                continue;
            }

            match find_hole(&placed, &mut field) {
                Some(idx) => placed.insert(idx, field),
                None => {
                    if let Some(last) = placed.last() {
                        field.place_after(last);
                    }
                    placed.push(field);
                }
            }
        }

        for f in &placed {
            trace!(
                "{}.{}: ordinal {} offset {} bit {} size {}",
                source.name,
                f.field.name,
                f.ordinal,
                f.offset,
                f.bit,
                f.size
            );
        }

        Ok(PackedStruct {
            source,
            packed_fields: placed,
        })
    }

    /// The size of the struct's payload: the end of the last field, padded to
    /// a multiple of 8.
    pub fn total_size(&self) -> u32 {
        let end = self
            .packed_fields
            .iter()
            .map(PackedField::end)
            .max()
            .unwrap_or(0);
        end + get_pad(end, 8)
    }

    /// The packed fields in ordinal order
    pub fn fields_by_ordinal(&self) -> Vec<&PackedField<'a>> {
        let mut fields: Vec<&PackedField> = self.packed_fields.iter().collect();
        fields.sort_by_key(|f| f.ordinal);
        fields
    }

    pub fn get(&self, name: &str) -> Option<&PackedField<'a>> {
        self.packed_fields.iter().find(|f| f.field.name == name)
    }
}

impl<'a> Serialize for PackedStruct<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PackedStruct", 3)?;
        s.serialize_field("name", &self.source.name)?;
        s.serialize_field("total_size", &self.total_size())?;
        s.serialize_field("fields", &self.packed_fields)?;
        s.end()
    }
}

/// Gives each field its ordinal.  A field without an explicit ordinal gets
/// the one after the previous field's.
fn assign_ordinals(source: &Struct) -> Result<Vec<PackedField>, LayoutError> {
    let mut next = Some(0u32);
    let mut fields = Vec::with_capacity(source.fields.len());

    for field in &source.fields {
        let ordinal = match (field.ordinal, next) {
            (Some(ordinal), _) => ordinal,
            (None, Some(ordinal)) => ordinal,
            (None, None) => {
                return Err(LayoutError::OrdinalOverflow {
                    struct_name: source.name.clone(),
                    field: field.name.clone(),
                })
            }
        };
        next = ordinal.checked_add(1);
        fields.push(PackedField::new(field, ordinal));
    }

    Ok(fields)
}

/// Looks for the first gap between two consecutive placed fields which can
/// hold `field`.  On success `field` is positioned in the gap and the index
/// to insert it at is returned.
fn find_hole(placed: &[PackedField], field: &mut PackedField) -> Option<usize> {
    for (idx, pair) in placed.windows(2).enumerate() {
        let (last, next) = (&pair[0], &pair[1]);
        field.place_after(last);
        if field.end() <= next.offset {
            return Some(idx + 1);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ir::{Attributes, DeclRef, Kind};

    fn field(name: &str, kind: Kind, ordinal: Option<u32>) -> Field {
        Field {
            name: name.into(),
            kind,
            ordinal,
            default: None,
            attributes: Attributes::new(),
        }
    }

    fn make_struct(fields: Vec<Field>) -> Struct {
        Struct {
            name: "Test".into(),
            namespace: "test".into(),
            attributes: Attributes::new(),
            fields,
            enums: vec![],
            constants: vec![],
        }
    }

    /// (name, offset, bit) for each packed field in layout order
    fn positions(packed: &PackedStruct) -> Vec<(String, u32, u8)> {
        packed
            .packed_fields
            .iter()
            .map(|f| (f.field.name.clone(), f.offset, f.bit))
            .collect()
    }

    #[test]
    fn pad() {
        assert_eq!(get_pad(0, 8), 0);
        assert_eq!(get_pad(1, 8), 7);
        assert_eq!(get_pad(5, 4), 3);
        assert_eq!(get_pad(8, 4), 0);
        assert_eq!(get_pad(3, 1), 0);
    }

    #[test]
    fn empty_struct() {
        let s = make_struct(vec![]);
        let packed = PackedStruct::new(&s).unwrap();
        assert!(packed.packed_fields.is_empty());
        assert_eq!(packed.total_size(), 0);
    }

    #[test]
    fn bools_then_int() {
        let s = make_struct(vec![
            field("a", Kind::Bool, None),
            field("b", Kind::Bool, None),
            field("c", Kind::Int32, None),
        ]);
        let packed = PackedStruct::new(&s).unwrap();
        assert_eq!(
            positions(&packed),
            vec![("a".into(), 0, 0), ("b".into(), 0, 1), ("c".into(), 4, 0)]
        );
        assert_eq!(packed.get("c").unwrap().size, 4);
        assert_eq!(packed.total_size(), 8);
    }

    #[test]
    fn single_int64() {
        let s = make_struct(vec![field("x", Kind::Int64, None)]);
        let packed = PackedStruct::new(&s).unwrap();
        assert_eq!(positions(&packed), vec![("x".into(), 0, 0)]);
        assert_eq!(packed.packed_fields[0].size, 8);
        assert_eq!(packed.total_size(), 8);
    }

    #[test]
    fn string_then_int() {
        let s = make_struct(vec![
            field("s", Kind::String, None),
            field("n", Kind::Int32, None),
        ]);
        let packed = PackedStruct::new(&s).unwrap();
        assert_eq!(
            positions(&packed),
            vec![("s".into(), 0, 0), ("n".into(), 8, 0)]
        );
        assert_eq!(packed.total_size(), 16);
    }

    #[test]
    fn fills_holes() {
        let s = make_struct(vec![
            field("a", Kind::Int8, None),
            field("b", Kind::Int64, None),
            field("c", Kind::Int16, None),
            field("d", Kind::Int32, None),
            field("e", Kind::Uint8, None),
        ]);
        let packed = PackedStruct::new(&s).unwrap();
        assert_eq!(
            positions(&packed),
            vec![
                ("a".into(), 0, 0),
                ("e".into(), 1, 0),
                ("c".into(), 2, 0),
                ("d".into(), 4, 0),
                ("b".into(), 8, 0),
            ]
        );
        assert_eq!(packed.total_size(), 16);
    }

    #[test]
    fn eight_bools_share_a_byte() {
        let fields = (0..9)
            .map(|i| field(&format!("b{}", i), Kind::Bool, None))
            .collect();
        let s = make_struct(fields);
        let packed = PackedStruct::new(&s).unwrap();
        for i in 0..8 {
            let f = packed.get(&format!("b{}", i)).unwrap();
            assert_eq!((f.offset, f.bit), (0, i as u8));
        }
        let ninth = packed.get("b8").unwrap();
        assert_eq!((ninth.offset, ninth.bit), (1, 0));
        assert_eq!(packed.total_size(), 8);
    }

    #[test]
    fn bool_goes_into_hole_after_bool() {
        let s = make_struct(vec![
            field("a", Kind::Bool, None),
            field("n", Kind::Int32, None),
            field("b", Kind::Bool, None),
        ]);
        let packed = PackedStruct::new(&s).unwrap();
        assert_eq!(
            positions(&packed),
            vec![("a".into(), 0, 0), ("b".into(), 0, 1), ("n".into(), 4, 0)]
        );
    }

    #[test]
    fn explicit_ordinals_order_fields() {
        let s = make_struct(vec![
            field("late", Kind::Int32, Some(2)),
            field("after_late", Kind::Int32, None),
            field("early", Kind::Int64, Some(0)),
            field("one", Kind::Int32, Some(1)),
        ]);
        let packed = PackedStruct::new(&s).unwrap();
        assert_eq!(packed.get("after_late").unwrap().ordinal, 3);
        assert_eq!(
            positions(&packed),
            vec![
                ("early".into(), 0, 0),
                ("one".into(), 8, 0),
                ("late".into(), 12, 0),
                ("after_late".into(), 16, 0),
            ]
        );
        let by_ordinal: Vec<&str> = packed
            .fields_by_ordinal()
            .iter()
            .map(|f| f.field.name.as_str())
            .collect();
        assert_eq!(by_ordinal, vec!["early", "one", "late", "after_late"]);
        assert_eq!(packed.total_size(), 24);
    }

    #[test]
    fn appending_a_field_never_moves_others() {
        let kinds = vec![
            Kind::Bool,
            Kind::Int64,
            Kind::Int8,
            Kind::Bool,
            Kind::String,
            Kind::Int16,
            Kind::Float,
            Kind::Array(Box::new(Kind::Int32)),
            Kind::Bool,
            Kind::Enum(DeclRef::new("test", "E")),
        ];
        let mut fields: Vec<Field> = vec![];
        let mut previous: Vec<(String, u32, u8)> = vec![];
        for (i, kind) in kinds.into_iter().enumerate() {
            fields.push(field(&format!("f{}", i), kind, None));
            let s = make_struct(fields.clone());
            let packed = PackedStruct::new(&s).unwrap();
            for (name, offset, bit) in &previous {
                let f = packed.get(name).unwrap();
                assert_eq!((f.offset, f.bit), (*offset, *bit), "{} moved", name);
            }
            assert_eq!(packed.total_size() % 8, 0);
            previous = positions(&packed);
        }
    }

    #[test]
    fn duplicate_ordinal() {
        let s = make_struct(vec![
            field("a", Kind::Int32, Some(1)),
            field("b", Kind::Int32, Some(0)),
            field("c", Kind::Int32, None),
        ]);
        assert_eq!(
            PackedStruct::new(&s).unwrap_err(),
            LayoutError::DuplicateOrdinal {
                struct_name: "Test".into(),
                ordinal: 1,
                first: "a".into(),
                second: "c".into(),
            }
        );
    }

    #[test]
    fn implicit_ordinal_overflow() {
        let s = make_struct(vec![
            field("max", Kind::Int32, Some(u32::MAX)),
            field("next", Kind::Int32, None),
        ]);
        assert_eq!(
            PackedStruct::new(&s).unwrap_err(),
            LayoutError::OrdinalOverflow {
                struct_name: "Test".into(),
                field: "next".into(),
            }
        );

        let s = make_struct(vec![field("max", Kind::Int32, Some(u32::MAX))]);
        assert!(PackedStruct::new(&s).is_ok());
    }

    #[test]
    fn serializes_layout() {
        let s = make_struct(vec![field("a", Kind::Bool, None)]);
        let packed = PackedStruct::new(&s).unwrap();
        let json = serde_json::to_value(&packed).unwrap();
        assert_eq!(json["name"], "Test");
        assert_eq!(json["total_size"], 8);
        assert_eq!(json["fields"][0]["kind"], "b");
        assert_eq!(json["fields"][0]["offset"], 0);
    }
}
