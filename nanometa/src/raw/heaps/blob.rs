use crate::raw::heaps::{BlobIndex, SizeDebugWrapper};
use crate::utilities::read_compressed_u32;
use std::fmt::{Debug, Formatter};
use std::io::Cursor;

#[derive(Copy, Clone)]
pub struct BlobHeap<'l> {
	data: &'l [u8],
}

impl<'l> From<&'l [u8]> for BlobHeap<'l> {
	fn from(data: &'l [u8]) -> Self {
		Self { data }
	}
}

impl<'l> BlobHeap<'l> {
	/// Returns the length-prefixed blob at `idx`, with the compressed length
	/// header already stripped.
	pub fn get(&self, idx: BlobIndex) -> Option<&'l [u8]> {
		let mut stream = Cursor::new(self.data.get(idx.0..)?);
		let len = read_compressed_u32(&mut stream).ok()? as usize;
		let start = stream.position() as usize;
		self.data.get(idx.0 + start..idx.0 + start + len)
	}
}

impl Debug for BlobHeap<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let mut dbg = f.debug_struct("BlobHeap");
		dbg.field("data", &SizeDebugWrapper(self.data.len()));
		dbg.finish()
	}
}
