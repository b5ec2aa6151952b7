//! Native stub header generator (external collaborator, supplemented,
//! gated behind `--native-stubs`). For every retained method flagged
//! `InternalCall`, emits one C declaration into `<dir>/<Type>.h`, mirroring
//! the nano runtime's native-interop convention: a header per managed type
//! giving the firmware side typed stub signatures to implement.

use std::fs;
use std::path::Path;

use crate::loader::ObjectGraph;
use crate::raw::heaps::table::MethodImplAttributes;
use crate::raw::il::TypeSignatureTag;
use crate::raw::indices::row::TypeDefIndex;
use crate::Result;

/// Maps a parameter/return type to its marshaled C argument type. Anything
/// not a primitive marshals as an opaque `void*` — the nano runtime's
/// native stubs never unbox managed types on the C side.
fn marshaled_type(tag: &TypeSignatureTag<'_>) -> &'static str {
	use TypeSignatureTag::*;
	match tag {
		Void => "void",
		Bool => "bool",
		Char => "uint16_t",
		Int1 => "int8_t",
		UInt1 => "uint8_t",
		Int2 => "int16_t",
		UInt2 => "uint16_t",
		Int4 => "int32_t",
		UInt4 => "uint32_t",
		Int8 => "int64_t",
		UInt8 => "uint64_t",
		Float => "float",
		Double => "double",
		String => "const char*",
		_ => "void*",
	}
}

/// Writes one `<Type>.h` per type with at least one retained `InternalCall`
/// method into `dir`. Produces no output for types with none.
pub fn generate(graph: &ObjectGraph<'_>, ordered_types: &[TypeDefIndex], dir: &Path) -> Result<()> {
	fs::create_dir_all(dir)?;

	for &type_id in ordered_types {
		let type_def = graph.type_def(type_id);
		let (name, namespace) = graph.type_name(type_def);

		let mut declarations = Vec::new();
		for method in graph.methods_of(type_id) {
			if !method.impl_flags.contains(MethodImplAttributes::INTERNAL_CALL) {
				continue;
			}
			let method_name = graph.method_name(method);
			let args = match graph.method_signature(method) {
				Some(sig) => {
					let params: Vec<String> =
						sig.parameter_types().signatures().map(|tag| marshaled_type(&tag).to_string()).collect();
					params.join(", ")
				},
				None => String::new(),
			};
			declarations.push(format!("void {name}::{method_name}( {args} );"));
		}

		if declarations.is_empty() {
			continue;
		}

		let guard = format!("{}_{}_H", namespace.to_uppercase().replace('.', "_"), name.to_uppercase());
		let mut contents = String::new();
		contents.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
		for declaration in &declarations {
			contents.push_str(declaration);
			contents.push('\n');
		}
		contents.push_str(&format!("\n#endif // {guard}\n"));

		fs::write(dir.join(format!("{name}.h")), contents)?;
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn marshaled_type_maps_known_primitives() {
		assert_eq!(marshaled_type(&TypeSignatureTag::Int4), "int32_t");
		assert_eq!(marshaled_type(&TypeSignatureTag::Bool), "bool");
		assert_eq!(marshaled_type(&TypeSignatureTag::Void), "void");
	}
}
