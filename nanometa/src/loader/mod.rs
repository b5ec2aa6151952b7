//! Finishes the teacher's PE/CLI reader into a navigable object graph (spec
//! §2 step 1, §9). `raw::` already decodes the `#~` stream into flat,
//! 0-based row tables; this module adds the lookups the lowering pipeline
//! needs on top — member ranges per type, nested-class parents, custom
//! attributes, interfaces, generic parameters, manifest resources, method
//! bodies and the tagged [`handles::TypeHandle`] spec §9 calls for — without
//! copying the rows into a second owned model. Everything here borrows from
//! the parsed [`crate::raw::assembly::Assembly`] and is read-only.

pub mod handles;

use std::io::Cursor;
use std::ops::Range;

use crate::raw::assembly::Assembly;
use crate::raw::heaps::table::{
	AssemblyRef, CustomAttribute, Field, File, GenericParam, InterfaceImpl, ManifestResource, MemberRef, MethodDef,
	MethodSpec, NestedClass, StandAloneSigTable, TableHeap, TypeDef, TypeRef, TypeSpec,
};
use crate::raw::heaps::{BlobHeap, GuidHeap, StringHeap};
use crate::raw::il::MethodBody;
use crate::raw::indices::coded_index::TypeDefOrRef;
use crate::raw::indices::metadata_token::{FieldToken, MetadataToken, MethodDefToken, TypeDefToken};
use crate::raw::indices::row::{FieldIndex, MethodDefIndex, TypeDefIndex};
use crate::utilities::FromByteStream;

pub use handles::{GenericParamOwner, TypeHandle};

/// Read-only view over a parsed assembly's tables and heaps, with the
/// member-range and nested-class lookups the flat ECMA-335 row layout
/// requires but doesn't spell out directly.
pub struct ObjectGraph<'l> {
	assembly: &'l Assembly<'l>,
}

impl<'l> ObjectGraph<'l> {
	pub fn new(assembly: &'l Assembly<'l>) -> Self {
		Self { assembly }
	}

	pub fn tables(&self) -> &'l TableHeap {
		self.assembly.metadata_root().get_heap::<TableHeap>().expect("assembly has no #~ stream")
	}

	pub fn strings(&self) -> &'l StringHeap<'l> {
		self.assembly.metadata_root().get_heap::<StringHeap<'l>>().expect("assembly has no #Strings heap")
	}

	pub fn blobs(&self) -> &'l BlobHeap<'l> {
		self.assembly.metadata_root().get_heap::<BlobHeap<'l>>().expect("assembly has no #Blob heap")
	}

	pub fn guids(&self) -> Option<&'l GuidHeap<'l>> {
		self.assembly.metadata_root().get_heap::<GuidHeap<'l>>()
	}

	pub fn user_string(&self, offset: usize) -> Option<String> {
		self.assembly.metadata_root().get_heap::<crate::raw::heaps::UserStringHeap<'l>>()?.get(offset)
	}

	pub fn type_defs(&self) -> &'l [TypeDef] {
		self.tables().get_table::<crate::raw::heaps::table::TypeDefTable>()
			.map(|t| t.rows())
			.unwrap_or(&[])
	}

	pub fn type_def(&self, id: TypeDefIndex) -> &'l TypeDef {
		&self.type_defs()[id.0]
	}

	pub fn fields(&self) -> &'l [Field] {
		self.tables().get_table::<crate::raw::heaps::table::FieldTable>()
			.map(|t| t.rows())
			.unwrap_or(&[])
	}

	pub fn methods(&self) -> &'l [MethodDef] {
		self.tables().get_table::<crate::raw::heaps::table::MethodDefTable>()
			.map(|t| t.rows())
			.unwrap_or(&[])
	}

	/// The fields owned by `type_id`, computed from its `field_list` and the
	/// next type-def's `field_list` (or the end of the field table), per the
	/// ECMA-335 convention of member-range-by-next-sibling.
	pub fn fields_of(&self, type_id: TypeDefIndex) -> &'l [Field] {
		let range = member_range(self.type_defs(), type_id.0, self.fields().len(), |t| t.field_list.0);
		&self.fields()[range]
	}

	/// The methods owned by `type_id`, analogous to [`Self::fields_of`].
	pub fn methods_of(&self, type_id: TypeDefIndex) -> &'l [MethodDef] {
		let range = member_range(self.type_defs(), type_id.0, self.methods().len(), |t| t.method_list.0);
		&self.methods()[range]
	}

	/// Maps every nested type-def to its enclosing type-def, per the
	/// `NestedClass` table (spec §9's "nested type" ordering requirement).
	pub fn nested_class_parents(&self) -> fxhash::FxHashMap<TypeDefIndex, TypeDefIndex> {
		let nested: &[NestedClass] = self.tables().get_table::<crate::raw::heaps::table::NestedClassTable>()
			.map(|t| t.rows())
			.unwrap_or(&[]);
		nested.iter().map(|row| (row.nested_class, row.enclosing_class)).collect()
	}

	pub fn field_name(&self, field: &Field) -> &'l str {
		self.strings().get(field.name).unwrap_or_default()
	}

	pub fn method_name(&self, method: &MethodDef) -> &'l str {
		self.strings().get(method.name).unwrap_or_default()
	}

	pub fn type_name(&self, type_def: &TypeDef) -> (&'l str, &'l str) {
		(self.strings().get(type_def.type_name).unwrap_or_default(), self.strings().get(type_def.type_namespace).unwrap_or_default())
	}

	/// The 1-based [`TypeDefIndex`] of a type-def row within [`Self::type_defs`].
	pub fn type_def_index(&self, type_def: &TypeDef) -> TypeDefIndex {
		let base = self.type_defs().as_ptr() as usize;
		let offset = type_def as *const TypeDef as usize;
		TypeDefIndex((offset - base) / std::mem::size_of::<TypeDef>())
	}

	pub fn type_def_token(&self, id: TypeDefIndex) -> MetadataToken {
		TypeDefToken(id.0 + 1).into()
	}

	pub fn field_token(&self, id: FieldIndex) -> MetadataToken {
		FieldToken(id.0 + 1).into()
	}

	pub fn method_token(&self, id: MethodDefIndex) -> MetadataToken {
		MethodDefToken(id.0 + 1).into()
	}

	pub fn assembly_refs(&self) -> &'l [AssemblyRef] {
		self.tables().get_table::<crate::raw::heaps::table::AssemblyRefTable>()
			.map(|t| t.rows())
			.unwrap_or(&[])
	}

	pub fn type_refs(&self) -> &'l [TypeRef] {
		self.tables().get_table::<crate::raw::heaps::table::TypeRefTable>()
			.map(|t| t.rows())
			.unwrap_or(&[])
	}

	pub fn member_refs(&self) -> &'l [MemberRef] {
		self.tables().get_table::<crate::raw::heaps::table::MemberRefTable>()
			.map(|t| t.rows())
			.unwrap_or(&[])
	}

	pub fn type_specs(&self) -> &'l [TypeSpec] {
		self.tables().get_table::<crate::raw::heaps::table::TypeSpecTable>()
			.map(|t| t.rows())
			.unwrap_or(&[])
	}

	pub fn method_specs(&self) -> &'l [MethodSpec] {
		self.tables().get_table::<crate::raw::heaps::table::MethodSpecTable>()
			.map(|t| t.rows())
			.unwrap_or(&[])
	}

	pub fn files(&self) -> &'l [File] {
		self.tables().get_table::<crate::raw::heaps::table::FileTable>()
			.map(|t| t.rows())
			.unwrap_or(&[])
	}

	pub fn file_hash(&self, file: &File) -> &'l [u8] {
		self.blobs().get(file.hash_value).unwrap_or(&[])
	}

	/// A member-ref's raw signature blob bytes, undecoded. The leading byte
	/// distinguishes a field-ref (`FIELD`, ECMA-335 §II.23.2.4) from a
	/// method-ref (a calling-convention byte, §II.23.2.1).
	pub fn member_ref_signature(&self, member_ref: &MemberRef) -> &'l [u8] {
		self.blobs().get(member_ref.signature).unwrap_or(&[])
	}

	fn custom_attributes(&self) -> &'l [CustomAttribute] {
		self.tables().get_table::<crate::raw::heaps::table::CustomAttributeTable>()
			.map(|t| t.rows())
			.unwrap_or(&[])
	}

	/// Custom attributes attached to a type, field, or method, matched by
	/// the owner's metadata token (SPEC_FULL.md's Loader section).
	pub fn custom_attributes_of(&self, owner: MetadataToken) -> impl Iterator<Item = &'l CustomAttribute> {
		self.custom_attributes().iter().filter(move |a| MetadataToken::from(a.parent) == owner)
	}

	fn interface_impls(&self) -> &'l [InterfaceImpl] {
		self.tables().get_table::<crate::raw::heaps::table::InterfaceImplTable>()
			.map(|t| t.rows())
			.unwrap_or(&[])
	}

	/// The interfaces a type-def implements, in table order.
	pub fn interfaces_of(&self, type_id: TypeDefIndex) -> impl Iterator<Item = TypeDefOrRef> + '_ {
		self.interface_impls().iter().filter(move |row| row.class == type_id).map(|row| row.interface)
	}

	fn generic_params(&self) -> &'l [GenericParam] {
		self.tables().get_table::<crate::raw::heaps::table::GenericParamTable>()
			.map(|t| t.rows())
			.unwrap_or(&[])
	}

	/// Generic parameters declared by a type or method, matched by owner token.
	pub fn generic_params_of(&self, owner: MetadataToken) -> impl Iterator<Item = &'l GenericParam> {
		self.generic_params().iter().filter(move |row| MetadataToken::from(row.owner) == owner)
	}

	fn manifest_resources(&self) -> &'l [ManifestResource] {
		self.tables().get_table::<crate::raw::heaps::table::ManifestResourceTable>()
			.map(|t| t.rows())
			.unwrap_or(&[])
	}

	pub fn resources(&self) -> impl Iterator<Item = &'l ManifestResource> {
		self.manifest_resources().iter()
	}

	pub fn resource_name(&self, resource: &ManifestResource) -> &'l str {
		self.strings().get(resource.name).unwrap_or_default()
	}

	/// The raw bytes of a manifest resource embedded in this assembly's
	/// resources data directory (ECMA-335 §II.22.24): a little-endian `u32`
	/// length followed by that many bytes, located at
	/// `cli_header.resources.virtual_address + resource.offset`. Returns
	/// `None` for resources implemented in a linked file or another
	/// assembly — those aren't embedded and the Resources table records
	/// them as resource-file entries instead.
	pub fn resource_bytes(&self, resource: &ManifestResource) -> Option<&'l [u8]> {
		let token: MetadataToken = resource.implementation.into();
		if token.index() != 0 {
			return None;
		}

		let cli_header = self.assembly.cli_header();
		let rva = cli_header.resources.virtual_address.checked_add(resource.offset)?;
		let (data, offset) = self.assembly.pe_file().resolve_rva(rva)?;
		let mut stream = Cursor::new(&data[offset..]);
		let len = u32::read(&mut stream, &()).ok()? as usize;
		let start = stream.position() as usize;
		data.get(offset + start..offset + start + len)
	}

	/// Decodes a field's signature blob into its type (ECMA-335 §II.23.2.4:
	/// leading `FIELD` marker byte, then `type-info`).
	pub fn field_type(&self, field: &Field) -> Option<crate::raw::il::TypeSignature<'l>> {
		let blob = self.blobs().get(field.signature)?;
		let mut stream = Cursor::new(blob);
		let _marker = u8::read(&mut stream, &()).ok()?;
		crate::raw::il::TypeSignature::read(&mut stream, self.tables().index_sizes()).ok()
	}

	/// Decodes a method's signature blob (ECMA-335 §II.23.2.1: calling
	/// convention, param count, return type, parameter types).
	pub fn method_signature(&self, method: &MethodDef) -> Option<crate::raw::il::MethodSignature<'l>> {
		let blob = self.blobs().get(method.signature)?;
		let mut stream = Cursor::new(blob);
		crate::raw::il::MethodSignature::read(&mut stream, self.tables().index_sizes()).ok()
	}

	/// Decodes a method's body (instructions, locals, exception handlers)
	/// from its RVA, when it has one (abstract/extern methods don't).
	pub fn method_body(&self, method: &MethodDef) -> Option<MethodBody<'l>> {
		if method.rva == 0 {
			return None;
		}
		let (data, offset) = self.assembly.pe_file().resolve_rva(method.rva)?;
		let mut stream = Cursor::new(&data[offset..]);
		let signatures = self.tables().get_table::<StandAloneSigTable>()?;
		MethodBody::read(&mut stream, self.blobs(), signatures, self.tables().index_sizes()).ok()
	}
}

/// Computes the half-open row range `[list_start(index), list_start(index+1))`
/// that a type-def's `field_list`/`method_list` column implies, ECMA-335's
/// convention for slicing a flat child table by owner without an explicit
/// count column.
fn member_range(type_defs: &[TypeDef], index: usize, total_len: usize, list_start: impl Fn(&TypeDef) -> usize) -> Range<usize> {
	let start = list_start(&type_defs[index]) - 1;
	let end = type_defs.get(index + 1).map(|next| list_start(next) - 1).unwrap_or(total_len);
	start..end
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::raw::heaps::table::TypeAttributes;
	use crate::raw::indices::coded_index::TypeDefOrRef;
	use crate::raw::heaps::StringIndex;
	use crate::raw::indices::row::{FieldIndex, MethodDefIndex as MethodIdx};

	fn type_def(field_list: usize, method_list: usize) -> TypeDef {
		TypeDef {
			flags: TypeAttributes::empty(),
			type_name: StringIndex(0),
			type_namespace: StringIndex(0),
			extends: TypeDefOrRef::try_from(0).unwrap(),
			field_list: FieldIndex(field_list),
			method_list: MethodIdx(method_list),
		}
	}

	#[test]
	fn member_range_spans_to_next_sibling() {
		let defs = vec![type_def(1, 1), type_def(3, 2), type_def(5, 4)];
		assert_eq!(member_range(&defs, 0, 10, |t| t.field_list.0), 0..2);
		assert_eq!(member_range(&defs, 1, 10, |t| t.field_list.0), 2..4);
	}

	#[test]
	fn member_range_of_last_type_runs_to_table_end() {
		let defs = vec![type_def(1, 1), type_def(3, 2)];
		assert_eq!(member_range(&defs, 1, 10, |t| t.field_list.0), 2..10);
	}

	#[test]
	fn type_def_token_is_one_based() {
		assert_eq!(TypeDefToken(5).0, 5);
	}
}
