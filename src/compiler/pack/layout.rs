use super::{LayoutError, PackedField, PackedStruct};

/// What lives at one byte of a packed struct.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ByteInfo<'a> {
    pub is_padding: bool,
    /// The fields which begin at this byte.  More than one only for bools
    /// sharing the byte.
    pub packed_fields: Vec<&'a PackedField<'a>>,
}

/// Describes every byte of a packed struct's payload, up to its total size.
/// Fails if the layout is inconsistent: fields overlapping, a byte shared by
/// anything but bools on distinct bits, or a byte that is both padding and
/// holds a field.
pub fn byte_layout<'a>(packed: &'a PackedStruct<'a>) -> Result<Vec<ByteInfo<'a>>, LayoutError> {
    let struct_name = &packed.source.name;
    let mut bytes: Vec<ByteInfo> = vec![ByteInfo::default(); packed.total_size() as usize];

    let mut limit = 0;
    let mut previous: Option<&PackedField> = None;
    for field in &packed.packed_fields {
        if field.offset < limit {
            let shares_bool_byte = previous.map_or(false, |p| {
                p.is_bool() && field.is_bool() && p.offset == field.offset
            });
            if !shares_bool_byte {
                return Err(LayoutError::Overlap {
                    struct_name: struct_name.clone(),
                    offset: field.offset,
                    field: field.field.name.clone(),
                    previous: previous.map(|p| p.field.name.clone()).unwrap_or_default(),
                });
            }
        }

        if field.offset > limit {
            for byte in &mut bytes[limit as usize..field.offset as usize] {
                byte.is_padding = true;
            }
        }
        bytes[field.offset as usize].packed_fields.push(field);

        limit = limit.max(field.end());
        previous = Some(field);
    }
    for byte in &mut bytes[limit as usize..] {
        byte.is_padding = true;
    }

    for (offset, byte) in bytes.iter().enumerate() {
        if byte.is_padding && !byte.packed_fields.is_empty() {
            return Err(LayoutError::PaddingConflict {
                struct_name: struct_name.clone(),
                offset: offset as u32,
            });
        }
        if byte.packed_fields.len() > 1 && !shared_bits_are_distinct(&byte.packed_fields) {
            return Err(LayoutError::SharedByte {
                struct_name: struct_name.clone(),
                offset: offset as u32,
                fields: byte
                    .packed_fields
                    .iter()
                    .map(|f| f.field.name.clone())
                    .collect(),
            });
        }
    }

    Ok(bytes)
}

fn shared_bits_are_distinct(fields: &[&PackedField]) -> bool {
    let mut seen = 0u8;
    for f in fields {
        if !f.is_bool() || f.bit > 7 || seen & (1 << f.bit) != 0 {
            return false;
        }
        seen |= 1 << f.bit;
    }
    true
}
