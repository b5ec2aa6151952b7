//! Nano metadata token encoding (spec §6): a 32-bit `(table-tag, id)` pair,
//! distinct from the source assembly's ECMA-335 tokens the loader exposes.
//! Used both on the wire (inline-token instruction operands, byte-code
//! section) and in the textual dump's `[<4-hex-new-id>] /*<8-hex-token>*/`
//! rendering.

/// Table tags for the nano image's own token space, assigned in the order
/// spec §6 lists them.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NanoTableTag {
	AssemblyRef = 0,
	TypeRef = 1,
	FieldRef = 2,
	MethodRef = 3,
	TypeDef = 4,
	FieldDef = 5,
	MethodDef = 6,
	Attributes = 7,
	TypeSpec = 8,
	Resources = 9,
	ResourceData = 10,
	Signatures = 11,
	Strings = 12,
	ByteCode = 13,
	ResourceFile = 14,
	GenericParam = 15,
	MethodSpec = 16,
}

/// A nano metadata token: high 8 bits table tag, low 24 bits id (spec §6).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct NanoToken(u32);

impl NanoToken {
	pub fn new(tag: NanoTableTag, id: u32) -> Self {
		Self(((tag as u32) << 24) | (id & 0x00FF_FFFF))
	}

	pub fn tag(&self) -> NanoTableTag {
		// SAFETY-free: the high byte is always one we wrote via `new`.
		match self.0 >> 24 {
			0 => NanoTableTag::AssemblyRef,
			1 => NanoTableTag::TypeRef,
			2 => NanoTableTag::FieldRef,
			3 => NanoTableTag::MethodRef,
			4 => NanoTableTag::TypeDef,
			5 => NanoTableTag::FieldDef,
			6 => NanoTableTag::MethodDef,
			7 => NanoTableTag::Attributes,
			8 => NanoTableTag::TypeSpec,
			9 => NanoTableTag::Resources,
			10 => NanoTableTag::ResourceData,
			11 => NanoTableTag::Signatures,
			12 => NanoTableTag::Strings,
			13 => NanoTableTag::ByteCode,
			14 => NanoTableTag::ResourceFile,
			15 => NanoTableTag::GenericParam,
			_ => NanoTableTag::MethodSpec,
		}
	}

	pub fn id(&self) -> u32 {
		self.0 & 0x00FF_FFFF
	}

	pub fn raw(&self) -> u32 {
		self.0
	}
}

/// The low two bits of an `extends`/`declaring-type`/inline-type field (spec
/// §4.1's `encode_type_token`): which table the remaining bits resolve
/// against.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TypeTokenTag {
	Def = 0b000,
	Ref = 0b001,
	Spec = 0b100,
}

/// Encodes a type-def/type-ref/type-spec id with its table tag into the
/// 32-bit field spec §4.1 calls `encode_type_token`.
pub fn encode_type_token(tag: TypeTokenTag, id: u16) -> u32 {
	((id as u32) << 2) | tag as u32
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn type_token_tags_match_spec_bit_pattern() {
		assert_eq!(encode_type_token(TypeTokenTag::Def, 5) & 0b11, 0b000);
		assert_eq!(encode_type_token(TypeTokenTag::Ref, 5) & 0b11, 0b001);
		assert_eq!(encode_type_token(TypeTokenTag::Spec, 5) & 0b11, 0b100 & 0b11);
	}

	#[test]
	fn nano_token_round_trips_tag_and_id() {
		let token = NanoToken::new(NanoTableTag::MethodDef, 0x1234);
		assert_eq!(token.tag(), NanoTableTag::MethodDef);
		assert_eq!(token.id(), 0x1234);
	}
}
