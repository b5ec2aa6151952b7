//! Byte-Code table (spec §4.6): concatenates every retained method's IL,
//! rewriting inline method/field/type/string/token operands to nano ids in
//! place. Every inline-token operand in CIL is exactly 4 bytes regardless of
//! instruction length (ECMA-335 §II.25.4.5), so the rewrite never changes an
//! instruction's size — branch offsets, which always count bytes rather
//! than instructions, stay correct with no further adjustment.

use crate::raw::il::{CompoundOpCode, OpCode, OpCodeIterator};
use crate::raw::indices::metadata_token::{MetadataToken, MetadataTokenKind};

/// What kind of reference an instruction's inline token names, so the
/// caller knows which resolver (method-ref/def, field-ref/def, type token,
/// or string id) applies.
enum Operand {
	Method(MetadataToken),
	Field(MetadataToken),
	Type(MetadataToken),
	/// `ldtoken`'s operand can name a type, method, or field; the resolver
	/// dispatches on the original token's kind at rewrite time.
	Ambiguous(MetadataToken),
	UserString(MetadataToken),
}

fn operand_of(opcode: &OpCode<'_>) -> Option<Operand> {
	use OpCode::*;
	match opcode {
		jmp(t) | call(t) | calli(t) | callvirt(t) | newobj(t) => Some(Operand::Method(*t)),
		ldfld(t) | ldflda(t) | stfld(t) | ldsfld(t) | ldsflda(t) | stsfld(t) => Some(Operand::Field(*t)),
		cpobj(t) | ldobj(t) | castclass(t) | isinst(t) | unbox(t) | box_val(t) | newarr(t) | ldelema(t) | ldelem(t)
		| stelem(t) | unbox_any(t) | refanyval(t) | mkrefany(t) | stobj(t) => Some(Operand::Type(*t)),
		ldtoken(t) => Some(Operand::Ambiguous(*t)),
		ldstr(t) => Some(Operand::UserString(*t)),
		compound(inner) => operand_of_compound(inner),
		_ => None,
	}
}

fn operand_of_compound(opcode: &CompoundOpCode) -> Option<Operand> {
	use CompoundOpCode::*;
	match opcode {
		ldftn(t) | ldvirtftn(t) => Some(Operand::Method(*t)),
		initobj(t) | constrained(t) | sizeof(t) => Some(Operand::Type(*t)),
		_ => None,
	}
}

/// Rewrites every inline-token operand in `code` via the supplied
/// resolvers, returning a new buffer the same length as `code`.
/// `resolve_string` receives the original token's raw (masked) index, which
/// for a user-string token is its byte offset into the `#US` heap, not a
/// row number.
pub fn rewrite_method_body(
	code: &[u8],
	resolve_method: &mut impl FnMut(MetadataToken) -> u32,
	resolve_field: &mut impl FnMut(MetadataToken) -> u32,
	resolve_type: &mut impl FnMut(MetadataToken) -> u32,
	resolve_string: &mut impl FnMut(MetadataToken) -> u32,
) -> Vec<u8> {
	let mut out = code.to_vec();
	let mut iter = OpCodeIterator::new(code).peekable();

	while let Some((_, decoded)) = iter.next() {
		let end = iter.peek().map(|&(pos, _)| pos).unwrap_or(code.len() as u64) as usize;
		let Ok(opcode) = decoded else { continue };
		let Some(operand) = operand_of(&opcode) else { continue };

		let new_value = match operand {
			Operand::Method(t) => resolve_method(t),
			Operand::Field(t) => resolve_field(t),
			Operand::Type(t) => resolve_type(t),
			Operand::UserString(t) => resolve_string(t),
			Operand::Ambiguous(t) => match t.kind() {
				MetadataTokenKind::MethodDef | MetadataTokenKind::MemberRef => resolve_method(t),
				MetadataTokenKind::Field => resolve_field(t),
				_ => resolve_type(t),
			},
		};

		if end >= 4 {
			out[end - 4..end].copy_from_slice(&new_value.to_le_bytes());
		}
	}

	out
}

/// One retained method's exception handler (spec §4.6), with offsets
/// counted in bytes into that method's own rewritten body, not the shared
/// byte-code blob.
#[derive(Debug, Clone, Copy)]
pub struct ExceptionHandlerRecord {
	pub kind: u16,
	pub try_start: u16,
	pub try_length: u16,
	pub handler_start: u16,
	pub handler_length: u16,
	/// Catch type's resolved nano type token, or the filter's byte offset
	/// when `kind` is `Filter`.
	pub catch_token_or_filter: u32,
}

impl ExceptionHandlerRecord {
	fn encode(&self, out: &mut Vec<u8>) {
		out.extend(self.kind.to_le_bytes());
		out.extend(self.try_start.to_le_bytes());
		out.extend(self.try_length.to_le_bytes());
		out.extend(self.handler_start.to_le_bytes());
		out.extend(self.handler_length.to_le_bytes());
		out.extend(self.catch_token_or_filter.to_le_bytes());
	}
}

/// One retained method's location within the concatenated byte-code blob.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCodeSpan {
	pub offset: u32,
	pub length: u32,
}

#[derive(Debug, Default)]
pub struct ByteCodeTable {
	blob: Vec<u8>,
}

impl ByteCodeTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, code: &[u8]) -> ByteCodeSpan {
		let offset = self.blob.len() as u32;
		self.blob.extend_from_slice(code);
		ByteCodeSpan { offset, length: code.len() as u32 }
	}

	/// Appends one method's entry: a handler count byte, that many
	/// [`ExceptionHandlerRecord`]s (14 bytes each), then the rewritten code.
	/// The method-def's `rva` points at this entry's start, not directly at
	/// the code — the handler count is self-describing rather than needing
	/// a dedicated exception-handler section spec §6's output layout never
	/// lists one for.
	pub fn push_method(&mut self, code: &[u8], handlers: &[ExceptionHandlerRecord]) -> ByteCodeSpan {
		let offset = self.blob.len() as u32;
		self.blob.push(handlers.len().min(u8::MAX as usize) as u8);
		for handler in handlers {
			handler.encode(&mut self.blob);
		}
		self.blob.extend_from_slice(code);
		ByteCodeSpan { offset, length: (self.blob.len() as u32) - offset }
	}

	pub fn len(&self) -> usize {
		self.blob.len()
	}

	pub fn is_empty(&self) -> bool {
		self.blob.is_empty()
	}

	pub fn write(&self, minimize_complete: bool) -> Vec<u8> {
		if !minimize_complete {
			return Vec::new();
		}
		self.blob.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rewrite_preserves_code_length() {
		// call (0x28) + 4-byte token, an unrelated nop (0x00), then ret (0x2a).
		let code = [0x28u8, 0xAA, 0xBB, 0xCC, 0x0A, 0x00, 0x2A];
		let rewritten = rewrite_method_body(&code, &mut |_| 0xDEAD_BEEF, &mut |_| 0, &mut |_| 0, &mut |_| 0);
		assert_eq!(rewritten.len(), code.len());
		assert_eq!(&rewritten[1..5], &0xDEAD_BEEFu32.to_le_bytes());
		assert_eq!(rewritten[5], 0x00);
		assert_eq!(rewritten[6], 0x2A);
	}

	#[test]
	fn byte_code_table_write_is_empty_until_minimize_complete() {
		let mut table = ByteCodeTable::new();
		table.push(&[1, 2, 3]);
		assert!(table.write(false).is_empty());
		assert_eq!(table.write(true), vec![1, 2, 3]);
	}

	#[test]
	fn push_method_prefixes_handler_count_and_records() {
		let mut table = ByteCodeTable::new();
		let handler = ExceptionHandlerRecord { kind: 0, try_start: 1, try_length: 2, handler_start: 3, handler_length: 4, catch_token_or_filter: 5 };
		let span = table.push_method(&[0xAA, 0xBB], std::slice::from_ref(&handler));
		assert_eq!(span.offset, 0);
		assert_eq!(span.length, 1 + 14 + 2);
		assert_eq!(table.write(true)[0], 1);
		assert_eq!(&table.write(true)[1 + 14..], &[0xAA, 0xBB]);
	}

	#[test]
	fn push_returns_sequential_offsets() {
		let mut table = ByteCodeTable::new();
		let a = table.push(&[1, 2]);
		let b = table.push(&[3, 4, 5]);
		assert_eq!(a.offset, 0);
		assert_eq!(b.offset, 2);
		assert_eq!(b.length, 3);
	}
}
