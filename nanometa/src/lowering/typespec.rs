//! Type-Spec & Method-Spec tables (spec §4.8). Type-specs are uniqued by
//! their signature bytes (a generic instantiation with the same shape gets
//! one row); method-specs are one row per generic method instantiation and
//! are not deduped beyond that, matching how the source assembly's own
//! `MethodSpec` table works.

use fxhash::FxHashMap;

#[derive(Debug, Default)]
pub struct TypeSpecTable {
	signatures: Vec<u16>,
	index: FxHashMap<u16, u16>,
}

impl TypeSpecTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// `signature_id` is the already-interned signature-table offset for
	/// this type-spec's bytes; uniquing happens on that id, which is itself
	/// already content-addressed (spec §4.4), so two type-specs with
	/// byte-identical signatures always share a signature id and therefore
	/// collapse to one row here.
	pub fn get_or_create(&mut self, signature_id: u16) -> u16 {
		if let Some(&id) = self.index.get(&signature_id) {
			return id;
		}
		let id = self.signatures.len() as u16;
		self.signatures.push(signature_id);
		self.index.insert(signature_id, id);
		id
	}

	pub fn len(&self) -> usize {
		self.signatures.len()
	}

	pub fn is_empty(&self) -> bool {
		self.signatures.is_empty()
	}

	pub fn write(&self, minimize_complete: bool) -> Vec<u8> {
		if !minimize_complete {
			return Vec::new();
		}
		let mut out = Vec::new();
		for signature in &self.signatures {
			out.extend(signature.to_le_bytes());
		}
		out
	}
}

#[derive(Debug, Clone, Copy)]
pub struct MethodSpecRecord {
	pub declaring_type_spec_id: u16,
	pub generic_method_def_id: u16,
	pub instantiation_sig_id: u16,
}

impl MethodSpecRecord {
	pub fn encode(&self, out: &mut Vec<u8>) {
		out.extend(self.declaring_type_spec_id.to_le_bytes());
		out.extend(self.generic_method_def_id.to_le_bytes());
		out.extend(self.instantiation_sig_id.to_le_bytes());
	}
}

#[derive(Debug, Default)]
pub struct MethodSpecTable {
	rows: Vec<MethodSpecRecord>,
}

impl MethodSpecTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, record: MethodSpecRecord) -> u16 {
		let id = self.rows.len() as u16;
		self.rows.push(record);
		id
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn write(&self, minimize_complete: bool) -> Vec<u8> {
		if !minimize_complete {
			return Vec::new();
		}
		let mut out = Vec::new();
		for row in &self.rows {
			row.encode(&mut out);
		}
		out
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identical_signature_id_shares_a_row() {
		let mut table = TypeSpecTable::new();
		let a = table.get_or_create(42);
		let b = table.get_or_create(42);
		assert_eq!(a, b);
		assert_eq!(table.len(), 1);
	}

	#[test]
	fn distinct_signature_ids_get_distinct_rows() {
		let mut table = TypeSpecTable::new();
		let a = table.get_or_create(10);
		let b = table.get_or_create(20);
		assert_ne!(a, b);
	}

	#[test]
	fn method_spec_record_is_six_bytes() {
		let mut bytes = Vec::new();
		MethodSpecRecord { declaring_type_spec_id: 1, generic_method_def_id: 2, instantiation_sig_id: 3 }.encode(&mut bytes);
		assert_eq!(bytes.len(), 6);
	}
}
