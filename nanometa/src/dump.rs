//! Dumper (spec §2 step 7, §6, supplemented): renders the tables context as
//! the flat, human-readable tree spec §6 describes. No templating crate —
//! a tree of `write!` calls into a `String`, matching the convention every
//! metadata/table crate in this pack uses for fixed-structure dumps (see
//! DESIGN.md's Open Question decision).

use std::fmt::Write as _;

use crate::loader::ObjectGraph;
use crate::lowering::context::TablesContext;
use crate::lowering::token::{encode_type_token, TypeTokenTag};

/// Spec §6's mandated token rendering: `[<4-hex-new-id>] /*<8-hex-original-token>*/`.
fn token(new_id: u16, original: u32) -> String {
	format!("[{new_id:04x}] /*{original:08x}*/")
}

pub fn dump(graph: &ObjectGraph<'_>, context: &TablesContext) -> String {
	let mut out = String::new();

	writeln!(out, "== assembly-refs ==").ok();
	for (id, row) in context.assembly_refs.rows().iter().enumerate() {
		writeln!(
			out,
			"{} name#{:#06x} version={}.{}.{}.{}",
			token(id as u16, 0x2300_0000 | (id as u32 + 1)),
			row.name,
			row.version[0],
			row.version[1],
			row.version[2],
			row.version[3]
		)
		.ok();
	}

	writeln!(out, "== type-refs ==").ok();
	for (id, row) in context.type_refs.rows().iter().enumerate() {
		writeln!(out, "{} name#{:#06x} namespace#{:#06x} scope={:#06x}", token(id as u16, 0x0100_0000 | (id as u32 + 1)), row.name, row.namespace, row.scope).ok();

		let ref_id = encode_type_token(TypeTokenTag::Ref, id as u16) as u16;
		for (member_id, member) in context.field_refs.rows().iter().enumerate() {
			if member.declaring_type_ref_id == ref_id {
				writeln!(out, "  field-ref {} name#{:#06x} signature#{:#06x}", token(member_id as u16, 0), member.name, member.signature).ok();
			}
		}
		for (member_id, member) in context.method_refs.rows().iter().enumerate() {
			if member.container == ref_id {
				writeln!(out, "  method-ref {} name#{:#06x} signature#{:#06x}", token(member_id as u16, 0), member.name, member.signature).ok();
			}
		}
	}

	writeln!(out, "== type-defs ==").ok();
	for (nano_id, &type_id) in context.ordered_types.iter().enumerate() {
		let type_def = graph.type_def(type_id);
		let (name, namespace) = graph.type_name(type_def);
		let original: u32 = graph.type_def_token(type_id).raw();
		writeln!(out, "{} {namespace}.{name}", token(nano_id as u16, original)).ok();

		let type_def_row = &context.type_defs.rows()[nano_id];
		let next_first_field_id = context.type_defs.rows().get(nano_id + 1).map(|row| row.first_field_id).unwrap_or(context.field_defs.len() as u16);
		for field_id in type_def_row.first_field_id..next_first_field_id {
			let field = &context.field_defs.rows()[field_id as usize];
			writeln!(out, "  field [{field_id:04x}] name#{:#06x} signature#{:#06x} flags={:#06x}", field.name, field.signature, field.flags).ok();
		}

		let method_count = type_def_row.virtual_method_count as u16 + type_def_row.instance_method_count as u16 + type_def_row.static_method_count as u16;
		for method_id in type_def_row.first_method_id..type_def_row.first_method_id + method_count {
			let method = &context.method_defs.rows()[method_id as usize];
			writeln!(
				out,
				"  method [{method_id:04x}] name#{:#06x} rva={:#010x} flags={:#06x} locals#{:#06x}",
				method.name, method.rva, method.flags, method.locals_sig_id
			)
			.ok();
		}

		for interface in graph.interfaces_of(type_id) {
			let interface_token: crate::raw::indices::metadata_token::MetadataToken = interface.into();
			writeln!(out, "  interface-impl {}", token(0, interface_token.raw())).ok();
		}
	}

	writeln!(out, "== type-specs ==").ok();
	for id in 0..context.type_specs.len() {
		writeln!(out, "{} [{id:04x}]", token(id as u16, 0)).ok();
	}

	writeln!(out, "== attributes ==").ok();
	for row in context.attributes.rows(false) {
		writeln!(out, "owner={:?}#{:#06x} ctor#{:#06x} signature#{:#06x}", row.owner_table, row.owner_id, row.ctor_method_ref_id, row.signature).ok();
	}

	writeln!(out, "== string heap ==").ok();
	let heap = context.strings.write();
	let mut offset = 0usize;
	while offset < heap.len() {
		let end = heap[offset..].iter().position(|&b| b == 0).map(|p| offset + p).unwrap_or(heap.len());
		let text = std::str::from_utf8(&heap[offset..end]).unwrap_or("<invalid utf-8>");
		writeln!(out, "[{offset:04x}] {text:?}").ok();
		offset = end + 1;
	}

	out
}

#[cfg(test)]
mod tests {
	use super::token;

	#[test]
	fn token_matches_spec_rendering() {
		assert_eq!(token(0x0001, 0x0200_0002), "[0001] /*02000002*/");
	}
}
