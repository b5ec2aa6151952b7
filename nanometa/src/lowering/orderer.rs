//! Type Orderer (spec §4.2, step 3): produces the visit order the Tables
//! Context walks type-defs in when building the type-def table. A DFS that
//! visits a type's declaring type, same-module interfaces, and same-module
//! operand types before the type itself, pre-sorted by `(namespace, name)`
//! so the DFS is deterministic across runs. Cycles simply collapse to visit
//! order — there is no cycle-detection failure, per spec §4.2's "a cycle is
//! not an error" note.

use std::collections::HashSet;

use crate::loader::ObjectGraph;
use crate::raw::il::TypeSignatureTag;
use crate::raw::indices::metadata_token::{MetadataToken, MetadataTokenKind};
use crate::raw::indices::row::TypeDefIndex;

const MODULE_SYNTHETIC_TYPE: &str = "<Module>";

/// Computes the type-def visit order for a loaded assembly.
///
/// `explicit_order`, when non-empty, pins the given fully-qualified names
/// (`Namespace.Name`) to the front in the given order; any remaining
/// type-defs are appended via the DFS below.
pub fn order_types(graph: &ObjectGraph<'_>, explicit_order: &[String]) -> Vec<TypeDefIndex> {
	let type_defs = graph.type_defs();

	let mut candidates: Vec<TypeDefIndex> = (0..type_defs.len())
		.map(TypeDefIndex)
		.filter(|id| {
			let (name, _namespace) = graph.type_name(graph.type_def(*id));
			name != MODULE_SYNTHETIC_TYPE
		})
		.collect();

	candidates.sort_by(|a, b| {
		let (name_a, namespace_a) = graph.type_name(graph.type_def(*a));
		let (name_b, namespace_b) = graph.type_name(graph.type_def(*b));
		(namespace_a, name_a).cmp(&(namespace_b, name_b))
	});

	let mut visited = HashSet::new();
	let mut order = Vec::with_capacity(candidates.len());

	for fqn in explicit_order {
		if let Some(id) = candidates.iter().find(|id| fully_qualified_name(graph, **id) == *fqn) {
			visit(graph, *id, &mut visited, &mut order);
		}
	}

	for id in &candidates {
		visit(graph, *id, &mut visited, &mut order);
	}

	order
}

fn fully_qualified_name(graph: &ObjectGraph<'_>, id: TypeDefIndex) -> String {
	let (name, namespace) = graph.type_name(graph.type_def(id));
	if namespace.is_empty() {
		name.to_string()
	} else {
		format!("{namespace}.{name}")
	}
}

fn visit(graph: &ObjectGraph<'_>, id: TypeDefIndex, visited: &mut HashSet<TypeDefIndex>, order: &mut Vec<TypeDefIndex>) {
	if !visited.insert(id) {
		return;
	}

	let type_def = graph.type_def(id);

	if let Some(dep) = same_module_type_def(type_def.extends.into()) {
		visit(graph, dep, visited, order);
	}

	for interface in graph.interfaces_of(id) {
		if let Some(dep) = same_module_type_def(interface.into()) {
			visit(graph, dep, visited, order);
		}
	}

	for field in graph.fields_of(id) {
		if let Some(signature) = graph.field_type(field) {
			if let Some(dep) = operand_type_def(&signature.as_tags_tree()) {
				visit(graph, dep, visited, order);
			}
		}
	}

	for method in graph.methods_of(id) {
		if let Some(signature) = graph.method_signature(method) {
			if let Some(dep) = operand_type_def(&signature.return_type().as_tags_tree()) {
				visit(graph, dep, visited, order);
			}
			for parameter in signature.parameter_types().signatures() {
				if let Some(dep) = operand_type_def(&parameter) {
					visit(graph, dep, visited, order);
				}
			}
		}
	}

	order.push(id);
}

fn same_module_type_def(token: MetadataToken) -> Option<TypeDefIndex> {
	match token.kind() {
		MetadataTokenKind::TypeDef if token.index() >= 1 => Some(TypeDefIndex(token.index() - 1)),
		_ => None,
	}
}

/// The same-module type-def a signature element's class/value-type operand
/// refers to, if any (spec §4.2's "operand types" dependency).
fn operand_type_def(tag: &TypeSignatureTag<'_>) -> Option<TypeDefIndex> {
	let coded = match tag {
		TypeSignatureTag::ClassType(coded) | TypeSignatureTag::ValueType(coded) => *coded,
		_ => return None,
	};
	let token: MetadataToken = coded.into();
	match token.kind() {
		MetadataTokenKind::TypeDef if token.index() >= 1 => Some(TypeDefIndex(token.index() - 1)),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn module_synthetic_type_is_excluded_by_name_check() {
		assert_eq!(MODULE_SYNTHETIC_TYPE, "<Module>");
	}
}
