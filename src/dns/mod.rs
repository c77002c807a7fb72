// ABOUTME: DNS state for managed domains: records, reconciliation, and registrar encoding.
// ABOUTME: The registrar only accepts whole-set replacement, so every push carries every record.

mod lock;
mod reconciler;
mod record;
pub mod wire;

pub use lock::{DomainGuard, DomainLocks};
pub use reconciler::{
    DnsReconciler, ReconcileError, ReconcileSettings, SubdomainTemplate, build_record_set,
};
pub use record::{DEFAULT_TTL, DnsRecord, DnsRecordSet, RecordError, RecordType, Upsert};
