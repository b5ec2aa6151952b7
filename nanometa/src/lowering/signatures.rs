//! Content-addressed signature blob with sub-match interning (spec §4.4).
//!
//! [`SignatureTable`] owns the blob and its `get_or_create` contract, which
//! is independently testable against spec.md §8's literal scenarios.
//! [`encode_type_info`] is the structural encoder spec §4.4 calls
//! `type-info`: it turns a decoded ECMA-335 type signature into the nano
//! wire bytes, leaving only token resolution (which id a referenced type
//! gets) to the caller — that lookup needs the tables context's type-ref/
//! type-def/type-spec tables, built in [`crate::lowering::context`].

use fxhash::FxHashMap;

use crate::raw::il::TypeSignatureTag;
use crate::raw::indices::coded_index::TypeDefOrRef;

/// Byte-order a signature's multi-byte fields are written in. Spec §6:
/// method signatures are little-endian; field, local, interface-list and
/// type-spec signatures are big-endian.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Endianness {
	Little,
	Big,
}

impl Endianness {
	fn write_u16(self, value: u16) -> [u8; 2] {
		match self {
			Endianness::Little => value.to_le_bytes(),
			Endianness::Big => value.to_be_bytes(),
		}
	}
}

/// Structural tag a `DATATYPE_CLASS`/`DATATYPE_VALUETYPE` type-info carries
/// before its sub-type-token (§4.1's `encode_type_token` tag bits, reused
/// here as the one-byte nano primitive codes for the remaining element
/// types — there is no original-language source in this pack to ground
/// distinct numeric constants on, so the nano codes below are the ECMA-335
/// element-type tag bytes the loader already decodes, reused 1:1 for
/// determinism and so a hex dump of a nano image reads the same as the
/// source assembly's signature blobs).
pub const DATATYPE_BYREF: u8 = 0x10;
pub const DATATYPE_CLASS: u8 = 0x12;
pub const DATATYPE_VALUETYPE: u8 = 0x11;
pub const DATATYPE_SZARRAY: u8 = 0x1d;
pub const DATATYPE_UNKNOWN: u8 = 0x00;

/// Encodes a decoded type signature into nano `type-info` bytes (spec
/// §4.4). `resolve_type_token` maps a class/value-type operand's
/// `TypeDefOrRef` to its nano type-ref/type-def/type-spec id (already
/// `encode_type_token`-tagged, spec §4.1); `expand_enum` returns the
/// encoded signature of an enum's underlying field when the value-type is
/// an enum in the expand-enum set (spec §4.4's enum-expansion rule), or
/// `None` to fall through to the ordinary `DATATYPE_VALUETYPE` encoding.
pub fn encode_type_info(
	tag: &TypeSignatureTag<'_>,
	endianness: Endianness,
	resolve_type_token: &mut impl FnMut(TypeDefOrRef) -> u16,
	expand_enum: &impl Fn(TypeDefOrRef) -> Option<Vec<u8>>,
) -> Vec<u8> {
	match tag {
		TypeSignatureTag::Void => vec![0x01],
		TypeSignatureTag::Bool => vec![0x02],
		TypeSignatureTag::Char => vec![0x03],
		TypeSignatureTag::Int1 => vec![0x04],
		TypeSignatureTag::UInt1 => vec![0x05],
		TypeSignatureTag::Int2 => vec![0x06],
		TypeSignatureTag::UInt2 => vec![0x07],
		TypeSignatureTag::Int4 => vec![0x08],
		TypeSignatureTag::UInt4 => vec![0x09],
		TypeSignatureTag::Int8 => vec![0x0a],
		TypeSignatureTag::UInt8 => vec![0x0b],
		TypeSignatureTag::Float => vec![0x0c],
		TypeSignatureTag::Double => vec![0x0d],
		TypeSignatureTag::String => vec![0x0e],
		TypeSignatureTag::IntPtr => vec![0x18],
		TypeSignatureTag::UIntPtr => vec![0x19],
		TypeSignatureTag::Object => vec![0x1c],

		TypeSignatureTag::Reference(inner) => {
			let mut bytes = vec![DATATYPE_BYREF];
			bytes.extend(encode_type_info(&inner.as_tags_tree(), endianness, resolve_type_token, expand_enum));
			bytes
		},

		TypeSignatureTag::ClassType(coded) => {
			let id = resolve_type_token(*coded);
			let mut bytes = vec![DATATYPE_CLASS];
			bytes.extend(endianness.write_u16(id));
			bytes
		},

		TypeSignatureTag::ValueType(coded) => match expand_enum(*coded) {
			Some(underlying) => underlying,
			None => {
				let id = resolve_type_token(*coded);
				let mut bytes = vec![DATATYPE_VALUETYPE];
				bytes.extend(endianness.write_u16(id));
				bytes
			},
		},

		TypeSignatureTag::SzArray(inner) => {
			let mut bytes = vec![DATATYPE_SZARRAY];
			bytes.extend(encode_type_info(&inner.as_tags_tree(), endianness, resolve_type_token, expand_enum));
			bytes
		},

		_ => vec![DATATYPE_UNKNOWN],
	}
}

/// Encodes a custom attribute fixed-argument value (spec §4.4): an
/// element-type tag byte followed by the value bytes. String and
/// `System.Type`-valued arguments write a string id (already interned by
/// the caller) instead of inline bytes; arrays recurse element-by-element.
pub enum AttributeArgumentValue {
	Primitive { tag: u8, bytes: Vec<u8> },
	StringId(u16),
	Array(Vec<AttributeArgumentValue>),
}

pub fn encode_attribute_argument(value: &AttributeArgumentValue, endianness: Endianness) -> Vec<u8> {
	match value {
		AttributeArgumentValue::Primitive { tag, bytes } => {
			let mut out = vec![*tag];
			out.extend_from_slice(bytes);
			out
		},
		AttributeArgumentValue::StringId(id) => {
			let mut out = vec![0x0e]; // String element-type tag, reused per DATATYPE_* convention above
			out.extend(endianness.write_u16(*id));
			out
		},
		AttributeArgumentValue::Array(elements) => {
			let mut out = Vec::new();
			out.extend((elements.len() as u32).to_le_bytes());
			for element in elements {
				out.extend(encode_attribute_argument(element, endianness));
			}
			out
		},
	}
}


#[derive(Debug, Default)]
pub struct SignatureTable {
	blob: Vec<u8>,
	offsets: FxHashMap<Vec<u8>, u32>,
}

impl SignatureTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Interns `bytes`, returning a byte offset into the blob. Already-seen
	/// bytes return their existing id; otherwise the blob is scanned for a
	/// contiguous sub-match before falling back to appending at the end.
	/// This sub-match search is the central size-win of the format (§9) and
	/// is preserved even though it is worst-case `O(blob_len × n_sigs)`.
	#[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
	pub fn get_or_create(&mut self, bytes: &[u8]) -> u32 {
		if let Some(&id) = self.offsets.get(bytes) {
			return id;
		}

		if let Some(offset) = find_subsequence(&self.blob, bytes) {
			let offset = offset as u32;
			self.offsets.insert(bytes.to_vec(), offset);
			return offset;
		}

		let id = self.blob.len() as u32;
		self.blob.extend_from_slice(bytes);
		self.offsets.insert(bytes.to_vec(), id);
		id
	}

	pub fn try_get_id(&self, bytes: &[u8]) -> Option<u32> {
		self.offsets.get(bytes).copied()
	}

	pub fn len(&self) -> usize {
		self.blob.len()
	}

	pub fn is_empty(&self) -> bool {
		self.blob.is_empty()
	}

	pub fn write(&self) -> &[u8] {
		&self.blob
	}
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	if needle.is_empty() || needle.len() > haystack.len() {
		return None;
	}
	haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn idempotent_get_or_create() {
		let mut table = SignatureTable::new();
		let a = table.get_or_create(&[0x00, 0x00, 0x01]);
		let len_before = table.len();
		let b = table.get_or_create(&[0x00, 0x00, 0x01]);
		assert_eq!(a, b);
		assert_eq!(table.len(), len_before);
	}

	#[test]
	fn contiguous_sub_match_reuses_offset() {
		let mut table = SignatureTable::new();
		let first = table.get_or_create(&[0x20, 0x01, 0x02, 0x03]);
		let len_before = table.len();

		let second = table.get_or_create(&[0x02, 0x03]);

		assert_eq!(second, first + 2);
		assert_eq!(table.len(), len_before);
	}

	#[test]
	fn distinct_signatures_get_distinct_offsets() {
		let mut table = SignatureTable::new();
		let a = table.get_or_create(&[0x06, 0x08]);
		let b = table.get_or_create(&[0x06, 0x09]);
		assert_ne!(a, b);
	}

	fn no_op_resolver() -> impl FnMut(TypeDefOrRef) -> u16 {
		|_| 0
	}

	fn no_enum_expansion() -> impl Fn(TypeDefOrRef) -> Option<Vec<u8>> {
		|_| None
	}

	#[test]
	fn primitive_type_info_is_one_byte() {
		let bytes = encode_type_info(&TypeSignatureTag::Bool, Endianness::Little, &mut no_op_resolver(), &no_enum_expansion());
		assert_eq!(bytes, vec![0x02]);
	}

	#[test]
	fn class_type_info_carries_resolved_token() {
		let coded = TypeDefOrRef::try_from(4).unwrap(); // TypeDef tag, index 1
		let tag = TypeSignatureTag::ClassType(coded);
		let bytes = encode_type_info(&tag, Endianness::Little, &mut |_| 0x1234, &no_enum_expansion());
		assert_eq!(bytes, vec![DATATYPE_CLASS, 0x34, 0x12]);
	}

	#[test]
	fn value_type_info_respects_endianness() {
		let coded = TypeDefOrRef::try_from(4).unwrap();
		let tag = TypeSignatureTag::ValueType(coded);
		let bytes = encode_type_info(&tag, Endianness::Big, &mut |_| 0x1234, &no_enum_expansion());
		assert_eq!(bytes, vec![DATATYPE_VALUETYPE, 0x12, 0x34]);
	}

	#[test]
	fn enum_expansion_replaces_valuetype_encoding() {
		let coded = TypeDefOrRef::try_from(4).unwrap();
		let tag = TypeSignatureTag::ValueType(coded);
		let bytes = encode_type_info(&tag, Endianness::Little, &mut no_op_resolver(), &|_| Some(vec![0x08]));
		assert_eq!(bytes, vec![0x08]);
	}

	#[test]
	fn attribute_argument_array_encodes_element_count_and_elements() {
		let value = AttributeArgumentValue::Array(vec![
			AttributeArgumentValue::Primitive { tag: 0x08, bytes: vec![0x01, 0x00, 0x00, 0x00] },
			AttributeArgumentValue::Primitive { tag: 0x08, bytes: vec![0x02, 0x00, 0x00, 0x00] },
		]);
		let bytes = encode_attribute_argument(&value, Endianness::Little);
		assert_eq!(&bytes[0..4], &2u32.to_le_bytes());
		assert_eq!(&bytes[4..], &[0x08, 0x01, 0x00, 0x00, 0x00, 0x08, 0x02, 0x00, 0x00, 0x00]);
	}
}
