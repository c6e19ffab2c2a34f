pub mod destination;
pub mod error;
pub mod traits;
pub mod types;

pub use destination::{Destination, DestinationKind};
pub use error::{AuditError, Stage};
pub use traits::{PolicyFetcher, SinkLookup};
pub use types::{
    normalize_bindings, AuditReport, Finding, ResolvedSink, RoleBinding, WriterIdentity,
};
