//! Relative-link checking for markdown documents.

pub mod extract;
pub mod verify;

pub use extract::{LinkReference, Links, extract_links};
pub use verify::{
    EXEMPT_SEGMENT, check_documents, is_exempt, resolve_target, scan_documents, verify_links,
};
