use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Field};

/// Generates a `<Name>Table` wrapper around `Vec<Name>` plus a `Table` impl.
/// Each field is read via `FromByteStream::read(stream, sizes.as_ref())`;
/// which `Deps` a field needs is resolved by type inference through
/// `IndexSizes`'s `AsRef` impls, so row structs can mix plain fixed-width
/// fields and heap-index fields without the macro special-casing field
/// types by name (the teacher's version special-cased `StringIndex`).
pub fn derive(tokens: proc_macro::TokenStream) -> TokenStream {
	let DeriveInput { vis, ident, data, .. } = syn::parse(tokens).unwrap();

	let data = match data {
		Data::Struct(data) => data,
		Data::Enum(_) => panic!("Enums are not supported"),
		Data::Union(_) => panic!("Unions are not supported"),
	};

	let table = format_ident!("{}Table", ident);
	let reads = data.fields.iter().map(|Field { ident, ty, .. }| {
		quote! { #ident: <#ty as crate::utilities::FromByteStream>::read(stream, sizes.as_ref())? }
	});

	quote! {
		#[derive(Debug, Clone)]
		#vis struct #table {
			rows: Vec<#ident>,
		}

		impl #table {
			pub fn read(stream: &mut std::io::Cursor<&[u8]>, sizes: &crate::raw::indices::sizes::IndexSizes, len: usize) -> std::io::Result<Self> {
				let mut rows = Vec::with_capacity(len);
				for _ in 0..len {
					rows.push(#ident { #(#reads),* });
				}
				Ok(Self { rows })
			}

			pub fn rows(&self) -> &[#ident] {
				&self.rows
			}

			pub fn len(&self) -> usize {
				self.rows.len()
			}

			pub fn is_empty(&self) -> bool {
				self.rows.is_empty()
			}
		}

		impl crate::raw::heaps::table::Table for #table {
			fn len(&self) -> usize {
				self.rows.len()
			}

			fn kind(&self) -> crate::raw::heaps::table::TableKind {
				crate::raw::heaps::table::TableKind::#ident
			}
		}
	}
}
