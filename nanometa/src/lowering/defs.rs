//! Definition tables (spec §4.5): type-def / field-def / method-def.
//! Definitions are unique by construction (one row per retained source
//! entity), so unlike the reference tables there is no dedup — only
//! insertion order and the field/method reordering spec §4.5 requires
//! (methods: virtual, then instance non-static, then static, source order
//! within each group; fields: static then instance, constant fields
//! dropped entirely). That reordering is the tables context's job, since it
//! needs the loader's method/field attribute flags; this module only holds
//! and encodes the already-ordered rows.

bitflags::bitflags! {
	#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
	pub struct TypeDefFlags: u32 {
		const PUBLIC = 0x0001;
		const ABSTRACT = 0x0002;
		const SEALED = 0x0004;
		const INTERFACE = 0x0008;
		const SERIALIZABLE = 0x0010;
		const ENUM = 0x0020;
	}
}

#[derive(Debug, Clone, Default)]
pub struct TypeDefRecord {
	pub name: u16,
	pub namespace: u16,
	pub extends_token: u16,
	pub enclosing_type_id: u16,
	pub interface_sig_id: u16,
	pub first_field_id: u16,
	pub first_method_id: u16,
	pub virtual_method_count: u8,
	pub instance_method_count: u8,
	pub static_method_count: u8,
	pub data_type: u8,
	pub flags: TypeDefFlags,
}

impl TypeDefRecord {
	pub fn encode(&self, out: &mut Vec<u8>) {
		out.extend(self.name.to_le_bytes());
		out.extend(self.namespace.to_le_bytes());
		out.extend(self.extends_token.to_le_bytes());
		out.extend(self.enclosing_type_id.to_le_bytes());
		out.extend(self.interface_sig_id.to_le_bytes());
		out.extend(self.first_field_id.to_le_bytes());
		out.extend(self.first_method_id.to_le_bytes());
		out.push(self.virtual_method_count);
		out.push(self.instance_method_count);
		out.push(self.static_method_count);
		out.push(self.data_type);
		out.extend(self.flags.bits().to_le_bytes());
	}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FieldDefRecord {
	pub name: u16,
	pub signature: u16,
	pub flags: u16,
	pub default_value_sig_id: u16,
}

impl FieldDefRecord {
	pub fn encode(&self, out: &mut Vec<u8>) {
		out.extend(self.name.to_le_bytes());
		out.extend(self.signature.to_le_bytes());
		out.extend(self.flags.to_le_bytes());
		out.extend(self.default_value_sig_id.to_le_bytes());
	}
}

/// 16 bytes: name(2) + rva(4) + flags(2, not spec's literal u32 — see
/// `DESIGN.md`) + retval/arg/local counts (1 each, 3 total) + 1 reserved
/// pad byte + locals-sig-id(2) + signature-id(2) = 16.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodDefRecord {
	pub name: u16,
	pub rva: u32,
	pub flags: u16,
	pub retval_count: u8,
	pub arg_count: u8,
	pub local_count: u8,
	pub locals_sig_id: u16,
	pub signature: u16,
}

impl MethodDefRecord {
	pub fn encode(&self, out: &mut Vec<u8>) {
		out.extend(self.name.to_le_bytes());
		out.extend(self.rva.to_le_bytes());
		out.extend(self.flags.to_le_bytes());
		out.push(self.retval_count);
		out.push(self.arg_count);
		out.push(self.local_count);
		out.push(0); // reserved, keeps the trailing u16 fields 2-byte aligned
		out.extend(self.locals_sig_id.to_le_bytes());
		out.extend(self.signature.to_le_bytes());
	}
}

#[derive(Debug, Default)]
pub struct DefTable<R> {
	rows: Vec<R>,
}

impl<R> DefTable<R> {
	pub fn new() -> Self {
		Self { rows: Vec::new() }
	}

	pub fn push(&mut self, row: R) -> u16 {
		let id = self.rows.len() as u16;
		self.rows.push(row);
		id
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn rows(&self) -> &[R] {
		&self.rows
	}
}

pub type TypeDefTable = DefTable<TypeDefRecord>;
pub type FieldDefTable = DefTable<FieldDefRecord>;
pub type MethodDefTable = DefTable<MethodDefRecord>;

pub fn write_type_defs(rows: &[TypeDefRecord], minimize_complete: bool) -> Vec<u8> {
	if !minimize_complete {
		return Vec::new();
	}
	let mut out = Vec::new();
	for row in rows {
		row.encode(&mut out);
	}
	out
}

pub fn write_field_defs(rows: &[FieldDefRecord], minimize_complete: bool) -> Vec<u8> {
	if !minimize_complete {
		return Vec::new();
	}
	let mut out = Vec::new();
	for row in rows {
		row.encode(&mut out);
	}
	out
}

pub fn write_method_defs(rows: &[MethodDefRecord], minimize_complete: bool) -> Vec<u8> {
	if !minimize_complete {
		return Vec::new();
	}
	let mut out = Vec::new();
	for row in rows {
		row.encode(&mut out);
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn field_def_record_is_eight_bytes() {
		let mut bytes = Vec::new();
		FieldDefRecord { name: 1, signature: 2, flags: 3, default_value_sig_id: 4 }.encode(&mut bytes);
		assert_eq!(bytes.len(), 8);
	}

	#[test]
	fn method_def_record_is_sixteen_bytes() {
		let mut bytes = Vec::new();
		MethodDefRecord { name: 1, rva: 2, flags: 3, retval_count: 0, arg_count: 1, local_count: 2, locals_sig_id: 4, signature: 5 }.encode(&mut bytes);
		assert_eq!(bytes.len(), 16);
	}

	#[test]
	fn def_table_assigns_sequential_ids() {
		let mut table: DefTable<FieldDefRecord> = DefTable::new();
		let a = table.push(FieldDefRecord::default());
		let b = table.push(FieldDefRecord::default());
		assert_eq!((a, b), (0, 1));
	}

	#[test]
	fn write_is_empty_until_minimize_complete() {
		let rows = vec![FieldDefRecord::default()];
		assert!(write_field_defs(&rows, false).is_empty());
		assert_eq!(write_field_defs(&rows, true).len(), 8);
	}
}
