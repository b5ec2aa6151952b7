//! Opaque, immutable handles into the parsed source assembly (spec §9,
//! "Dynamic downcasting"/"Cyclic object graph"). The core pipeline never
//! takes ownership of the loader's object model — it stores these handles
//! in its own maps instead of borrowing the graph's internal references.

use crate::raw::indices::coded_index::TypeDefOrRef;
use crate::raw::indices::metadata_token::{MetadataToken, MetadataTokenKind};
use crate::raw::indices::row::{MethodDefIndex, TypeDefIndex};

/// A type reference, definition, specification, or generic parameter,
/// tagged the way the source's runtime type tests (`is TypeSpecification`,
/// `is GenericParameter`) are modeled in a systems language.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TypeHandle {
	Ref(usize),
	Def(TypeDefIndex),
	Spec(usize),
	GenericParam { owner: GenericParamOwner, index: u32 },
}

/// The owner of a generic parameter: either the generic type or the generic
/// method that declares it (spec §9's `GenericParam{owner, index}`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GenericParamOwner {
	Type(TypeDefIndex),
	Method(MethodDefIndex),
}

impl TypeHandle {
	/// Resolves a `TypeDefOrRef` coded index (used by `extends`, interface
	/// lists, and inline-type signature bytes) into a tagged handle.
	pub fn from_type_def_or_ref(coded: TypeDefOrRef) -> Self {
		let token: MetadataToken = coded.into();
		// Metadata tokens are 1-based row numbers; table rows are 0-based.
		let row = token.index() - 1;
		match token.kind() {
			MetadataTokenKind::TypeDef => TypeHandle::Def(TypeDefIndex(row)),
			MetadataTokenKind::TypeRef => TypeHandle::Ref(row),
			MetadataTokenKind::TypeSpec => TypeHandle::Spec(row),
			other => unreachable!("TypeDefOrRef resolved to non-type token kind {other:?}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn type_def_or_ref_round_trips_through_def() {
		let coded = TypeDefOrRef::try_from(0b00 | (5 << 2)).unwrap(); // row 5, tag 0 = TypeDef
		assert_eq!(TypeHandle::from_type_def_or_ref(coded), TypeHandle::Def(TypeDefIndex(4)));
	}

	#[test]
	fn type_def_or_ref_round_trips_through_ref() {
		let coded = TypeDefOrRef::try_from(0b01 | (3 << 2)).unwrap(); // row 3, tag 1 = TypeRef
		assert_eq!(TypeHandle::from_type_def_or_ref(coded), TypeHandle::Ref(2));
	}
}
