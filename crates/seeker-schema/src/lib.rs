//! The dynamic schema engine: the per-field specification record
//! (§4.E), the indexing algorithm that walks a document tree and
//! drives the codec (§4.F), the `IndexBackend` trait boundary the
//! core treats as an external collaborator, and the document-change
//! map used by script hooks (§4.G).

pub mod backend;
pub mod change_map;
pub mod engine;
pub mod index_combination;
pub mod sep_types;
pub mod specification;
pub mod tree;

pub use backend::{Document, IndexBackend};
pub use change_map::{ChangeMap, Pair};
pub use engine::{index, index_item, index_subproperties, CompiledScript, HttpMethod, ScriptHost, ValueAccumulator};
pub use index_combination::IndexCombination;
pub use sep_types::{ArrayType, ConcreteType, ForeignType, ObjectType, SepTypes};
pub use specification::Specification;
pub use tree::{SchemaHandle, SchemaNode, SchemaRoot};
