use std::fmt::{Debug, Formatter};
use std::io::{Error, ErrorKind};

use crate::raw::heaps::{SizeDebugWrapper, StringIndex};
use crate::utilities::read_compressed_u32;
use std::io::Cursor;

#[derive(Copy, Clone)]
pub struct StringHeap<'l> {
	data: &'l [u8],
}

impl<'l> TryFrom<&'l [u8]> for StringHeap<'l> {
	type Error = Error;
	fn try_from(data: &'l [u8]) -> Result<Self, Self::Error> {
		match data.as_ref() {
			[0, ..] => Ok(Self { data }),
			_ => Err(ErrorKind::InvalidData.into()),
		}
	}
}

impl<'l> StringHeap<'l> {
	pub fn get(&self, idx: StringIndex) -> Option<&'l str> {
		let slice = self.data.as_ref().get(idx.0..)?;
		let end = slice.iter().position(|c| *c == 0)?;
		std::str::from_utf8(&slice[..end]).ok()
	}
}

impl Debug for StringHeap<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let mut dbg = f.debug_struct("StringHeap");
		dbg.field("data", &SizeDebugWrapper(self.data.len()));
		dbg.finish()
	}
}

pub struct UserStringHeap<'l> {
	data: &'l [u8],
}

impl<'l> From<&'l [u8]> for UserStringHeap<'l> {
	fn from(data: &'l [u8]) -> Self {
		Self { data }
	}
}

impl<'l> UserStringHeap<'l> {
	/// Decodes the UTF-16LE user string at byte offset `offset` (ECMA-335
	/// §II.24.2.4: compressed length prefix, then that many bytes, the last
	/// of which is a "has special characters" flag outside the string text).
	pub fn get(&self, offset: usize) -> Option<String> {
		let mut stream = Cursor::new(self.data.get(offset..)?);
		let len = read_compressed_u32(&mut stream).ok()? as usize;
		let start = stream.position() as usize;
		let text_len = len.saturating_sub(1);
		let bytes = self.data.get(offset + start..offset + start + text_len)?;
		let units: Vec<u16> = bytes.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect();
		Some(char::decode_utf16(units).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)).collect())
	}
}

impl Debug for UserStringHeap<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let mut dbg = f.debug_struct("UserStringHeap");
		dbg.field("data", &SizeDebugWrapper(self.data.len()));
		dbg.finish()
	}
}
