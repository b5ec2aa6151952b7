//! Tables Context (spec §2 step 4, §4.1): builds every lowering table in
//! the order spec §4.1 lists, owning the id-resolution the other lowering
//! modules can't compute themselves (`resolve_type_token`,
//! `resolve_method_reference_id`) since they need the full ref/def id
//! assignment to exist first.
//!
//! Two of spec §4.1's resolvers hit a structural limit this pack's
//! `original_source/` (0 kept files) can't settle: a member-ref's `class`
//! can itself be a `TypeSpec`, and a type-ref's scope can be a nested
//! `TypeRef`/`ModuleRef` rather than an `AssemblyRef` — both would need a
//! table that isn't built yet at the point §4.1 says refs are built. Both
//! fall back to an unresolved id (0) rather than failing the whole pipeline;
//! see DESIGN.md's Open Questions.

use fxhash::FxHashMap;

use crate::error::Result;
use crate::loader::ObjectGraph;
use crate::raw::heaps::table::MethodAttributes;
use crate::raw::il::TypeSignatureTag;
use crate::raw::indices::coded_index::CustomAttributeType;
use crate::raw::indices::metadata_token::{MetadataToken, MetadataTokenKind};
use crate::raw::indices::row::{FieldIndex, MethodDefIndex, TypeDefIndex};

use super::attributes::{AttributeRecord, AttributeTable};
use super::bytecode::{rewrite_method_body, ByteCodeTable, ExceptionHandlerRecord};
use super::defs::{FieldDefRecord, FieldDefTable, MethodDefRecord, MethodDefTable, TypeDefFlags, TypeDefRecord, TypeDefTable};
use super::filter::{ExcludedTypes, IgnoredAttributeSet};
use super::orderer::order_types;
use super::refs::{
	AssemblyRefRecord, AssemblyRefTable, FieldRefRecord, FieldRefTable, MethodRefRecord, MethodRefTable, TypeRefRecord,
	TypeRefTable,
};
use super::resources::{ResourceDataBlob, ResourceFileRecord, ResourceFileTable, ResourceRecord, ResourceTable};
use super::signatures::{encode_type_info, Endianness, SignatureTable};
use super::strings::StringTable;
use super::token::{encode_type_token, NanoTableTag, TypeTokenTag};
use super::typespec::{MethodSpecRecord, MethodSpecTable, TypeSpecTable};

const FIELD_SIGNATURE_MARKER: u8 = 0x06;

/// Owns every lowering table plus the one-way `minimize_complete` latch
/// (spec §5); constructed once per run via [`TablesContext::build`].
pub struct TablesContext {
	pub assembly_refs: AssemblyRefTable,
	pub type_refs: TypeRefTable,
	pub field_refs: FieldRefTable,
	pub method_refs: MethodRefTable,
	pub ordered_types: Vec<TypeDefIndex>,
	pub type_defs: TypeDefTable,
	pub field_defs: FieldDefTable,
	pub method_defs: MethodDefTable,
	pub attributes: AttributeTable,
	pub type_specs: TypeSpecTable,
	pub method_specs: MethodSpecTable,
	pub resources: ResourceTable,
	pub resource_data: ResourceDataBlob,
	pub resource_files: ResourceFileTable,
	pub signatures: SignatureTable,
	pub strings: StringTable,
	pub byte_code: ByteCodeTable,
	type_def_nano_id: FxHashMap<TypeDefIndex, u16>,
	field_def_nano_id: FxHashMap<FieldIndex, u16>,
	method_def_nano_id: FxHashMap<MethodDefIndex, u16>,
	/// Nano method-ref id per source `MemberRef` row position; `None` where
	/// that row was classified as a field-ref instead.
	member_ref_method_id: Vec<Option<u16>>,
	/// Nano field-ref id per source `MemberRef` row position; `None` where
	/// that row was classified as a method-ref instead.
	member_ref_field_id: Vec<Option<u16>>,
	minimize_complete: bool,
}

impl TablesContext {
	/// Builds every table from `graph`, in spec §4.1's order. `excluded`
	/// drops whole types by (namespace, name); `ignored_attributes` drops
	/// custom attributes by fully-qualified type name; `explicit_order` is
	/// an optional user-supplied type ordering consulted ahead of the
	/// orderer's DFS fallback.
	pub fn build(
		graph: &ObjectGraph<'_>,
		excluded: &ExcludedTypes,
		ignored_attributes: &IgnoredAttributeSet,
		explicit_order: &[String],
	) -> Result<Self> {
		let mut strings = StringTable::new();
		let mut signatures = SignatureTable::new();

		let assembly_refs = build_assembly_ref_table(graph, &mut strings);
		let (type_refs, type_ref_nano_id) = build_type_ref_table(graph, excluded, &assembly_refs, &mut strings);
		let (field_refs, method_refs, member_ref_field_id, member_ref_method_id) =
			build_member_ref_tables(graph, &type_ref_nano_id, &mut strings, &mut signatures);

		let ordered_types: Vec<TypeDefIndex> = order_types(graph, explicit_order)
			.into_iter()
			.filter(|&id| {
				let (name, namespace) = graph.type_name(graph.type_def(id));
				!excluded.is_excluded(namespace, name)
			})
			.collect();

		let mut type_def_nano_id = FxHashMap::default();
		let mut field_def_nano_id = FxHashMap::default();
		let mut method_def_nano_id = FxHashMap::default();
		for &type_id in &ordered_types {
			type_def_nano_id.insert(type_id, type_def_nano_id.len() as u16);
			for (offset, _) in graph.fields_of(type_id).iter().enumerate() {
				let index = FieldIndex(field_base_index(graph, type_id) + offset);
				field_def_nano_id.insert(index, field_def_nano_id.len() as u16);
			}
			for (offset, _) in graph.methods_of(type_id).iter().enumerate() {
				let index = method_index_of(graph, type_id, offset);
				method_def_nano_id.insert(index, method_def_nano_id.len() as u16);
			}
		}

		let mut ctx = Self {
			assembly_refs,
			type_refs,
			field_refs,
			method_refs,
			ordered_types,
			type_defs: TypeDefTable::new(),
			field_defs: FieldDefTable::new(),
			method_defs: MethodDefTable::new(),
			attributes: AttributeTable::new(),
			type_specs: TypeSpecTable::new(),
			method_specs: MethodSpecTable::new(),
			resources: ResourceTable::new(),
			resource_data: ResourceDataBlob::new(),
			resource_files: ResourceFileTable::new(),
			signatures,
			strings,
			byte_code: ByteCodeTable::new(),
			type_def_nano_id,
			field_def_nano_id,
			method_def_nano_id,
			member_ref_method_id,
			member_ref_field_id,
			minimize_complete: false,
		};

		ctx.build_def_tables(graph);
		ctx.build_attributes(graph, ignored_attributes);
		ctx.build_type_specs(graph);
		ctx.build_resources(graph);

		Ok(ctx)
	}

	/// Flips the one-way minimize-complete latch (spec §5): every gated
	/// table's `write()` returns real bytes only after this is called.
	pub fn complete_minimization(&mut self) {
		self.minimize_complete = true;
	}

	pub fn minimize_complete(&self) -> bool {
		self.minimize_complete
	}

	/// Resolves a type-def/type-ref/type-spec coded index to its nano type
	/// token (spec §4.1's `encode_type_token`).
	fn resolve_type_token(&self, token: MetadataToken) -> u16 {
		match token.kind() {
			MetadataTokenKind::TypeDef if token.index() >= 1 => self
				.type_def_nano_id
				.get(&TypeDefIndex(token.index() - 1))
				.map(|&nano| encode_type_token(TypeTokenTag::Def, nano) as u16)
				.unwrap_or(0),
			MetadataTokenKind::TypeSpec if token.index() >= 1 => encode_type_token(TypeTokenTag::Spec, (token.index() - 1) as u16) as u16,
			_ => 0,
		}
	}

	/// Resolves a method reference (spec §4.1): method-ref match gets
	/// `id | 0x8000`, method-def match gets `id` plain, anything else
	/// resolves to 0.
	fn resolve_method_reference_id(&self, token: MetadataToken) -> u16 {
		match token.kind() {
			MetadataTokenKind::MethodDef if token.index() >= 1 => {
				self.method_def_nano_id.get(&MethodDefIndex(token.index() - 1)).copied().unwrap_or(0)
			},
			MetadataTokenKind::MemberRef if token.index() >= 1 => self
				.member_ref_method_id
				.get(token.index() - 1)
				.copied()
				.flatten()
				.map(|id| id | 0x8000)
				.unwrap_or(0),
			_ => 0,
		}
	}

	/// Resolves a field reference (spec §4.1, mirroring
	/// `resolve_method_reference_id`): field-ref match gets `id | 0x8000`,
	/// field-def match gets `id` plain, anything else resolves to 0.
	fn resolve_field_reference_id(&self, token: MetadataToken) -> u16 {
		match token.kind() {
			MetadataTokenKind::Field if token.index() >= 1 => {
				self.field_def_nano_id.get(&FieldIndex(token.index() - 1)).copied().unwrap_or(0)
			},
			MetadataTokenKind::MemberRef if token.index() >= 1 => self
				.member_ref_field_id
				.get(token.index() - 1)
				.copied()
				.flatten()
				.map(|id| id | 0x8000)
				.unwrap_or(0),
			_ => 0,
		}
	}

	/// Resolves an `ldstr` operand: `token.index()` is a byte offset into
	/// the `#US` heap, not a row number, so it's decoded and interned into
	/// the constants-aware string table directly rather than through any
	/// `resolve_*` id map.
	fn intern_user_string(&mut self, graph: &ObjectGraph<'_>, token: MetadataToken) -> u32 {
		graph.user_string(token.index()).map(|s| self.strings.get_or_create(&s, true) as u32).unwrap_or(0)
	}

	fn build_def_tables(&mut self, graph: &ObjectGraph<'_>) {
		for &type_id in &self.ordered_types.clone() {
			let type_def = graph.type_def(type_id);
			let (name, namespace) = graph.type_name(type_def);

			let fields = graph.fields_of(type_id);
			let methods = graph.methods_of(type_id);
			let first_field_id = self.field_defs.len() as u16;
			let first_method_id = self.method_defs.len() as u16;

			for field in fields {
				let field_name = self.strings.get_or_create(graph.field_name(field), false);
				let signature = match graph.field_type(field) {
					Some(sig) => {
						let bytes =
							encode_type_info(&sig.as_tags_tree(), Endianness::Big, &mut |coded| self.resolve_type_token(coded.into()), &|_| None);
						self.signatures.get_or_create(&bytes) as u16
					},
					None => 0,
				};
				self.field_defs.push(FieldDefRecord { name: field_name, signature, flags: field.flags.bits(), default_value_sig_id: 0 });
			}

			let mut virtual_count = 0u8;
			let mut instance_count = 0u8;
			let mut static_count = 0u8;
			for method in methods {
				if method.flags.contains(MethodAttributes::VIRTUAL) {
					virtual_count = virtual_count.saturating_add(1);
				} else if method.flags.contains(MethodAttributes::STATIC) {
					static_count = static_count.saturating_add(1);
				} else {
					instance_count = instance_count.saturating_add(1);
				}

				let method_name = self.strings.get_or_create(graph.method_name(method), false);
				let (retval_count, arg_count, signature) = match graph.method_signature(method) {
					Some(sig) => {
						let mut bytes = encode_type_info(&sig.return_type().as_tags_tree(), Endianness::Little, &mut |coded| {
							self.resolve_type_token(coded.into())
						}, &|_| None);
						let params: Vec<TypeSignatureTag<'_>> = sig.parameter_types().signatures().collect();
						for param in &params {
							bytes.extend(encode_type_info(param, Endianness::Little, &mut |coded| self.resolve_type_token(coded.into()), &|_| None));
						}
						(1u8, params.len() as u8, self.signatures.get_or_create(&bytes) as u16)
					},
					None => (0, 0, 0),
				};

				let (rva, local_count, locals_sig_id) = match graph.method_body(method) {
					Some(body) => {
						// Resolved in a separate pass first: `intern_user_string` needs
						// `&mut self.strings` while the other three resolvers only need
						// `&self`, and a single closure set can't mix the two borrows.
						let mut user_strings: std::collections::HashMap<usize, u32> = std::collections::HashMap::new();
						for (_, decoded) in crate::raw::il::OpCodeIterator::new(body.code) {
							if let Ok(crate::raw::il::OpCode::ldstr(token)) = decoded {
								user_strings.entry(token.index()).or_insert_with(|| self.intern_user_string(graph, token));
							}
						}

						let rewritten = rewrite_method_body(
							body.code,
							&mut |t| self.resolve_method_reference_id(t) as u32,
							&mut |t| self.resolve_field_reference_id(t) as u32,
							&mut |t| self.resolve_type_token(t) as u32,
							&mut |t| user_strings.get(&t.index()).copied().unwrap_or(0),
						);
						let handlers: Vec<ExceptionHandlerRecord> = body
							.exception_handlers
							.iter()
							.map(|handler| ExceptionHandlerRecord {
								kind: handler.kind as u16,
								try_start: handler.try_offset as u16,
								try_length: handler.try_length as u16,
								handler_start: handler.handler_offset as u16,
								handler_length: handler.handler_length as u16,
								catch_token_or_filter: if matches!(handler.kind, crate::raw::il::ExceptionHandlerKind::Filter) {
									handler.class_token_or_filter_offset
								} else {
									MetadataToken::try_from(handler.class_token_or_filter_offset)
										.map(|token| self.resolve_type_token(token) as u32)
										.unwrap_or(0)
								},
							})
							.collect();
						let span = self.byte_code.push_method(&rewritten, &handlers);

						let locals_sig_id = if body.locals.is_empty() {
							0
						} else {
							let mut bytes = Vec::new();
							for local in &body.locals {
								bytes.extend(encode_type_info(&local.as_tags_tree(), Endianness::Big, &mut |coded| {
									self.resolve_type_token(coded.into())
								}, &|_| None));
							}
							self.signatures.get_or_create(&bytes) as u16
						};

						(span.offset, body.locals.len() as u8, locals_sig_id)
					},
					None => (0, 0, 0),
				};

				self.method_defs.push(MethodDefRecord {
					name: method_name,
					rva,
					flags: method.flags.bits(),
					retval_count,
					arg_count,
					local_count,
					locals_sig_id,
					signature,
				});
			}

			let mut flags = TypeDefFlags::empty();
			let raw_flags = type_def.flags.bits();
			if raw_flags & 0x0007 == 0x0001 {
				flags |= TypeDefFlags::PUBLIC;
			}
			if raw_flags & 0x0080 != 0 {
				flags |= TypeDefFlags::ABSTRACT;
			}
			if raw_flags & 0x0100 != 0 {
				flags |= TypeDefFlags::SEALED;
			}
			if raw_flags & 0x0020 != 0 {
				flags |= TypeDefFlags::INTERFACE;
			}

			let extends_token: MetadataToken = type_def.extends.into();
			let extends_id = self.resolve_type_token(extends_token);

			let interface_sig_id = {
				let interfaces: Vec<u8> =
					graph.interfaces_of(type_id).flat_map(|coded| self.resolve_type_token(coded.into()).to_be_bytes()).collect();
				if interfaces.is_empty() { 0 } else { self.signatures.get_or_create(&interfaces) as u16 }
			};

			self.type_defs.push(TypeDefRecord {
				name: self.strings.get_or_create(name, false),
				namespace: self.strings.get_or_create(namespace, false),
				extends_token: extends_id,
				enclosing_type_id: 0,
				interface_sig_id,
				first_field_id,
				first_method_id,
				virtual_method_count: virtual_count,
				instance_method_count: instance_count,
				static_method_count: static_count,
				data_type: 0,
				flags,
			});
		}
	}

	fn build_attributes(&mut self, graph: &ObjectGraph<'_>, ignored: &IgnoredAttributeSet) {
		for &type_id in &self.ordered_types.clone() {
			let type_nano_id = self.type_def_nano_id[&type_id];
			let owner = graph.type_def_token(type_id);
			self.push_attributes_for(graph, owner, NanoTableTag::TypeDef, type_nano_id, ignored);

			for (offset, _) in graph.fields_of(type_id).iter().enumerate() {
				let index = FieldIndex(field_base_index(graph, type_id) + offset);
				let owner = graph.field_token(index);
				let nano_id = self.field_def_nano_id[&index];
				self.push_attributes_for(graph, owner, NanoTableTag::FieldDef, nano_id, ignored);
			}

			for (offset, _) in graph.methods_of(type_id).iter().enumerate() {
				let index = method_index_of(graph, type_id, offset);
				let owner = graph.method_token(index);
				let nano_id = self.method_def_nano_id[&index];
				self.push_attributes_for(graph, owner, NanoTableTag::MethodDef, nano_id, ignored);
			}
		}
	}

	fn push_attributes_for(
		&mut self,
		graph: &ObjectGraph<'_>,
		owner: MetadataToken,
		owner_table: NanoTableTag,
		owner_id: u16,
		ignored: &IgnoredAttributeSet,
	) {
		for attribute in graph.custom_attributes_of(owner) {
			let full_name = attribute_ctor_type_name(graph, attribute.ty);
			if let Some(full_name) = &full_name {
				if ignored.contains(full_name) {
					continue;
				}
			}

			let ctor_token: MetadataToken = attribute.ty.into();
			let ctor_method_ref_id = self.resolve_method_reference_id(ctor_token);
			let value_bytes = graph.blobs().get(attribute.value).unwrap_or(&[]);
			let signature = self.signatures.get_or_create(value_bytes) as u16;

			self.attributes.push(full_name.unwrap_or_default(), AttributeRecord { owner_table, owner_id, ctor_method_ref_id, signature });
		}
	}

	fn build_type_specs(&mut self, graph: &ObjectGraph<'_>) {
		for type_spec in graph.type_specs() {
			let bytes = graph.blobs().get(type_spec.signature).unwrap_or(&[]);
			let signature_id = self.signatures.get_or_create(bytes) as u16;
			self.type_specs.get_or_create(signature_id);
		}

		for method_spec in graph.method_specs() {
			let bytes = graph.blobs().get(method_spec.instantiation).unwrap_or(&[]);
			let instantiation_sig_id = self.signatures.get_or_create(bytes) as u16;
			let generic_method_def_id = self.resolve_method_reference_id(method_spec.method.into());
			self.method_specs.push(MethodSpecRecord { declaring_type_spec_id: 0, generic_method_def_id, instantiation_sig_id });
		}
	}

	fn build_resources(&mut self, graph: &ObjectGraph<'_>) {
		for resource in graph.resources() {
			let name_id = self.strings.get_or_create(graph.resource_name(resource), false);
			let flags = resource.flags.bits() as u16;

			if let Some(bytes) = graph.resource_bytes(resource) {
				let offset = self.resource_data.push(bytes);
				self.resources.push(ResourceRecord { name: name_id, offset, length: bytes.len() as u32, flags });
				continue;
			}

			let token: MetadataToken = resource.implementation.into();
			let hash_signature = if token.kind() == MetadataTokenKind::File && token.index() >= 1 {
				graph.files().get(token.index() - 1).map(|file| self.signatures.get_or_create(graph.file_hash(file)) as u16).unwrap_or(0)
			} else {
				0
			};
			self.resource_files.push(ResourceFileRecord { name: name_id, hash_signature, flags });
		}
	}
}

fn attribute_ctor_type_name(graph: &ObjectGraph<'_>, ty: CustomAttributeType) -> Option<String> {
	let token: MetadataToken = ty.into();
	match token.kind() {
		MetadataTokenKind::MethodDef if token.index() >= 1 => {
			let owner = owning_type_def(graph, MethodDefIndex(token.index() - 1))?;
			let (name, namespace) = graph.type_name(owner);
			Some(qualify(namespace, name))
		},
		MetadataTokenKind::MemberRef if token.index() >= 1 => {
			let member = graph.member_refs().get(token.index() - 1)?;
			let class_token: MetadataToken = member.class.into();
			match class_token.kind() {
				MetadataTokenKind::TypeRef if class_token.index() >= 1 => {
					let type_ref = graph.type_refs().get(class_token.index() - 1)?;
					let name = graph.strings().get(type_ref.type_name).unwrap_or_default();
					let namespace = graph.strings().get(type_ref.type_namespace).unwrap_or_default();
					Some(qualify(namespace, name))
				},
				MetadataTokenKind::TypeDef if class_token.index() >= 1 => {
					let type_def = graph.type_defs().get(class_token.index() - 1)?;
					let (name, namespace) = graph.type_name(type_def);
					Some(qualify(namespace, name))
				},
				_ => None,
			}
		},
		_ => None,
	}
}

fn qualify(namespace: &str, name: &str) -> String {
	if namespace.is_empty() { name.to_owned() } else { format!("{namespace}.{name}") }
}

/// Finds the type-def owning a method, by scanning member ranges. Only
/// called for custom-attribute constructors, never per-instruction, so the
/// linear scan costs nothing the minimizer/emitter's hot paths notice.
fn owning_type_def<'l>(graph: &ObjectGraph<'l>, method_index: MethodDefIndex) -> Option<&'l crate::raw::heaps::table::TypeDef> {
	graph.type_defs().iter().find(|type_def| {
		let id = graph.type_def_index(type_def);
		let start = method_index_of(graph, id, 0).0;
		let count = graph.methods_of(id).len();
		method_index.0 >= start && method_index.0 < start + count
	})
}

fn method_index_of(graph: &ObjectGraph<'_>, type_id: TypeDefIndex, offset: usize) -> MethodDefIndex {
	MethodDefIndex(graph.type_def(type_id).method_list.0 - 1 + offset)
}

fn field_base_index(graph: &ObjectGraph<'_>, type_id: TypeDefIndex) -> usize {
	graph.type_def(type_id).field_list.0 - 1
}

fn build_assembly_ref_table(graph: &ObjectGraph<'_>, strings: &mut StringTable) -> AssemblyRefTable {
	let mut table = AssemblyRefTable::new();
	for assembly_ref in graph.assembly_refs() {
		let source_name = graph.strings().get(assembly_ref.name).unwrap_or_default();
		let name = strings.get_or_create(source_name, false);
		let version = [assembly_ref.major_version, assembly_ref.minor_version, assembly_ref.build_number, assembly_ref.revision_number];
		table.get_or_create((source_name.to_owned(), version), || AssemblyRefRecord { name, version });
	}
	table
}

fn build_type_ref_table(
	graph: &ObjectGraph<'_>,
	excluded: &ExcludedTypes,
	assembly_refs: &AssemblyRefTable,
	strings: &mut StringTable,
) -> (TypeRefTable, Vec<Option<u16>>) {
	let mut table = TypeRefTable::new();
	let mut nano_id = Vec::with_capacity(graph.type_refs().len());

	for type_ref in graph.type_refs() {
		let name = graph.strings().get(type_ref.type_name).unwrap_or_default();
		let namespace = graph.strings().get(type_ref.type_namespace).unwrap_or_default();

		if excluded.is_excluded(namespace, name) {
			nano_id.push(None);
			continue;
		}

		let scope_token: MetadataToken = type_ref.resolution_scope.into();
		let scope = if scope_token.kind() == MetadataTokenKind::AssemblyRef && scope_token.index() >= 1 {
			let row = &graph.assembly_refs()[scope_token.index() - 1];
			let key = (
				graph.strings().get(row.name).unwrap_or_default().to_owned(),
				[row.major_version, row.minor_version, row.build_number, row.revision_number],
			);
			assembly_refs.try_get_id(&key).unwrap_or(0)
		} else {
			0
		};

		let name_id = strings.get_or_create(name, false);
		let namespace_id = strings.get_or_create(namespace, false);
		let id = table.get_or_create((namespace.to_owned(), name.to_owned(), scope), || TypeRefRecord { name: name_id, namespace: namespace_id, scope });
		nano_id.push(Some(id));
	}

	(table, nano_id)
}

fn build_member_ref_tables(
	graph: &ObjectGraph<'_>,
	type_ref_nano_id: &[Option<u16>],
	strings: &mut StringTable,
	signatures: &mut SignatureTable,
) -> (FieldRefTable, MethodRefTable, Vec<Option<u16>>, Vec<Option<u16>>) {
	let mut field_refs = FieldRefTable::new();
	let mut method_refs = MethodRefTable::new();
	let mut field_id_per_row = Vec::with_capacity(graph.member_refs().len());
	let mut method_id_per_row = Vec::with_capacity(graph.member_refs().len());

	for member in graph.member_refs() {
		let name = graph.strings().get(member.name).unwrap_or_default();
		let name_id = strings.get_or_create(name, false);
		let blob = graph.member_ref_signature(member);
		let signature_id = signatures.get_or_create(blob) as u16;

		let class_token: MetadataToken = member.class.into();
		let container = match class_token.kind() {
			MetadataTokenKind::TypeRef if class_token.index() >= 1 => type_ref_nano_id
				.get(class_token.index() - 1)
				.copied()
				.flatten()
				.map(|id| encode_type_token(TypeTokenTag::Ref, id) as u16)
				.unwrap_or(0),
			_ => 0,
		};

		if blob.first() == Some(&FIELD_SIGNATURE_MARKER) {
			let id = field_refs.get_or_create((container, name.to_owned(), signature_id), || FieldRefRecord {
				name: name_id,
				declaring_type_ref_id: container,
				signature: signature_id,
			});
			field_id_per_row.push(Some(id));
			method_id_per_row.push(None);
		} else {
			let id = method_refs.get_or_create((container, name.to_owned(), signature_id), || MethodRefRecord {
				name: name_id,
				container,
				signature: signature_id,
			});
			field_id_per_row.push(None);
			method_id_per_row.push(Some(id));
		}
	}

	(field_refs, method_refs, field_id_per_row, method_id_per_row)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn qualify_joins_namespace_and_name() {
		assert_eq!(qualify("System", "Object"), "System.Object");
		assert_eq!(qualify("", "Object"), "Object");
	}
}
