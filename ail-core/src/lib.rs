#![forbid(unsafe_code)]

mod checker;
mod config;
mod depgraph;
mod env;
mod error;
mod exhaustive;
mod faults;
mod flow;
mod index;
mod ownership;
mod resolve;
mod returns;
mod typeck;
mod types;
mod workspace;

pub use checker::{Checker, VerifiedUnit};
pub use config::{CheckConfig, FaultPolicy};
pub use depgraph::{Schedule, UnitGraph};
pub use error::{Diagnostic, Diagnostics, ErrorKind, Severity};
pub use exhaustive::Pat;
pub use faults::{Fault, FaultKind};
pub use flow::{Edge, Node, NodeKind, PathGraph};
pub use index::{
    Export, FieldSig, FnSig, ModuleExports, ModuleIndex, TypeDef, TypeShape, VariantSig,
};
pub use ownership::MoveSite;
pub use resolve::{BindingId, BindingInfo, BindingKind, Res, Resolutions, SpanKey};
pub use typeck::TypeTable;
pub use types::{Ownership, Prim, Type};
pub use workspace::{Unit, UnitReport, Workspace, WorkspaceReport};
