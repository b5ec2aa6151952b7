use std::fmt::{Debug, Formatter};
use std::io::{Cursor, ErrorKind, Seek, SeekFrom};
use std::ops::Range;

use crate::utilities::{impl_from_byte_stream, FromByteStream};

/// A parsed PE/COFF image: the DOS stub, the PE header and every section.
/// Sections keep their raw file bytes so RVAs can be resolved without a
/// second pass over the input.
#[derive(Debug, Clone)]
pub struct PEFile<'l> {
	pub dos_header: DosHeader,
	pub pe_header: PeHeader,
	pub sections: Vec<Section<'l>>,
}

impl<'l> PEFile<'l> {
	#[tracing::instrument(skip_all)]
	pub fn read(data: &'l [u8]) -> std::io::Result<Self> {
		let mut stream = Cursor::new(data);
		let dos_header = DosHeader::read(&mut stream, &())?;

		stream.seek(SeekFrom::Start(dos_header.new_header_start as u64))?;
		let pe_header = PeHeader::read(&mut stream, &())?;

		let mut sections = Vec::with_capacity(pe_header.file_header.number_of_sections as usize);
		for _ in 0..pe_header.file_header.number_of_sections {
			let header = SectionHeader::read(&mut stream, &())?;
			let start = header.pointer_to_raw_data as usize;
			let end = start + header.size_of_raw_data as usize;
			let Some(section_data) = data.get(start..end) else {
				return Err(ErrorKind::UnexpectedEof.into());
			};
			sections.push(Section { header, data: section_data });
		}

		Ok(Self { dos_header, pe_header, sections })
	}

	/// Resolves a relative virtual address to the section byte slice it falls in, and the
	/// offset of the RVA inside that slice.
	pub fn resolve_rva(&self, rva: u32) -> Option<(&'l [u8], usize)> {
		let section = self.sections.iter().find(|s| s.virtual_range().contains(&rva))?;
		let offset = (rva - section.header.virtual_address) as usize;
		Some((section.data, offset))
	}
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DosHeader {
	pub magic: u16,
	pub last_page_bytes: u16,
	pub file_pages: u16,
	pub relocations: u16,
	pub header_size: u16,
	pub min_alloc: u16,
	pub max_alloc: u16,
	pub ss: u16,
	pub sp: u16,
	pub checksum: u16,
	pub ip: u16,
	pub cs: u16,
	pub relocation_table_address: u16,
	pub overlay_number: u16,
	pub reserved: [u16; 4],
	pub oem_id: u16,
	pub oem_info: u16,
	pub reserved_2: [u16; 10],
	pub new_header_start: u32,
}

impl_from_byte_stream!(DosHeader, 0x5A4Du16);

#[derive(Debug, Clone)]
pub struct PeHeader {
	pub file_header: ImageFileHeader,
	pub optional_header: ImageOptionalHeader,
}

impl FromByteStream for PeHeader {
	type Deps = ();
	fn read(stream: &mut Cursor<&[u8]>, _: &Self::Deps) -> std::io::Result<Self> {
		if u32::read(stream, &())? != 0x4550 {
			return Err(ErrorKind::InvalidData.into());
		}
		let file_header = ImageFileHeader::read(stream, &())?;
		let start = stream.position() as usize;
		let opt_header_bytes = stream
			.get_ref()
			.get(start..start + file_header.size_of_optional_header as usize)
			.ok_or(ErrorKind::UnexpectedEof)?;
		let optional_header = ImageOptionalHeader::read(opt_header_bytes)?;
		stream.seek(SeekFrom::Current(file_header.size_of_optional_header as i64))?;
		Ok(Self { file_header, optional_header })
	}
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ImageFileHeader {
	pub machine: u16,
	pub number_of_sections: u16,
	pub time_date_stamp: u32,
	pub pointer_to_symbol_table: u32,
	pub number_of_symbols: u32,
	pub size_of_optional_header: u16,
	pub characteristics: u16,
}

impl_from_byte_stream!(ImageFileHeader);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ImageOptionalHeader {
	Pe32(ImageOptionalHeader32),
	Pe64(ImageOptionalHeader64),
}

impl ImageOptionalHeader {
	fn read(data: &[u8]) -> std::io::Result<Self> {
		let mut stream = Cursor::new(data);
		match u16::read(&mut stream, &())? {
			0x010B => Ok(Self::Pe32(ImageOptionalHeader32::read(&mut stream, &())?)),
			0x020B => Ok(Self::Pe64(ImageOptionalHeader64::read(&mut stream, &())?)),
			_ => Err(ErrorKind::InvalidData.into()),
		}
	}

	pub fn data_directories(&self) -> &[DataDirectory; 16] {
		match self {
			Self::Pe32(h) => &h.data_directories,
			Self::Pe64(h) => &h.data_directories,
		}
	}
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ImageOptionalHeader32 {
	pub major_linker_version: u8,
	pub minor_linker_version: u8,
	pub size_of_code: u32,
	pub size_of_initialized_data: u32,
	pub size_of_uninitialized_data: u32,
	pub address_of_entry_point: u32,
	pub base_of_code: u32,
	pub base_of_data: u32,
	pub image_base: u32,
	pub section_alignment: u32,
	pub file_alignment: u32,
	pub major_os_version: u16,
	pub minor_os_version: u16,
	pub major_image_version: u16,
	pub minor_image_version: u16,
	pub major_subsystem_version: u16,
	pub minor_subsystem_version: u16,
	pub win32_version_value: u32,
	pub size_of_image: u32,
	pub size_of_headers: u32,
	pub check_sum: u32,
	pub subsystem: u16,
	pub dll_characteristics: u16,
	pub size_of_stack_reserve: u32,
	pub size_of_stack_commit: u32,
	pub size_of_heap_reserve: u32,
	pub size_of_heap_commit: u32,
	pub loader_flags: u32,
	pub number_of_rva_and_sizes: u32,
	pub data_directories: [DataDirectory; 16],
}

impl_from_byte_stream!(ImageOptionalHeader32);

#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ImageOptionalHeader64 {
	pub major_linker_version: u8,
	pub minor_linker_version: u8,
	pub size_of_code: u32,
	pub size_of_initialized_data: u32,
	pub size_of_uninitialized_data: u32,
	pub address_of_entry_point: u32,
	pub base_of_code: u32,
	pub image_base: u64,
	pub section_alignment: u32,
	pub file_alignment: u32,
	pub major_os_version: u16,
	pub minor_os_version: u16,
	pub major_image_version: u16,
	pub minor_image_version: u16,
	pub major_subsystem_version: u16,
	pub minor_subsystem_version: u16,
	pub win32_version_value: u32,
	pub size_of_image: u32,
	pub size_of_headers: u32,
	pub check_sum: u32,
	pub subsystem: u16,
	pub dll_characteristics: u16,
	pub size_of_stack_reserve: u64,
	pub size_of_stack_commit: u64,
	pub size_of_heap_reserve: u64,
	pub size_of_heap_commit: u64,
	pub loader_flags: u32,
	pub number_of_rva_and_sizes: u32,
	pub data_directories: [DataDirectory; 16],
}

impl_from_byte_stream!(ImageOptionalHeader64);

#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DataDirectory {
	pub virtual_address: u32,
	pub size: u32,
}

impl_from_byte_stream!(DataDirectory);

#[derive(Copy, Clone)]
pub struct Section<'l> {
	pub header: SectionHeader,
	pub data: &'l [u8],
}

impl Section<'_> {
	pub fn virtual_range(&self) -> Range<u32> {
		self.header.virtual_address..self.header.virtual_address + self.header.size_of_raw_data
	}
}

impl Debug for Section<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Section")
			.field("header", &self.header)
			.field("data", &format_args!("[u8; {:#X}]", self.data.len()))
			.finish()
	}
}

#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct SectionName([u8; 8]);

impl Debug for SectionName {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let name = std::str::from_utf8(&self.0).unwrap_or("?").trim_end_matches('\0');
		write!(f, "{name:?}")
	}
}

impl_from_byte_stream!(SectionName);

#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SectionHeader {
	pub name: SectionName,
	pub virtual_size: u32,
	pub virtual_address: u32,
	pub size_of_raw_data: u32,
	pub pointer_to_raw_data: u32,
	pub pointer_to_relocations: u32,
	pub pointer_to_line_numbers: u32,
	pub number_of_relocations: u16,
	pub number_of_line_numbers: u16,
	pub characteristics: u32,
}

impl_from_byte_stream!(SectionHeader);
