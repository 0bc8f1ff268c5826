//! Component K — fingerprint rule table plus the two harnesses built on top
//! of it (`scan`, device-support discovery; `detect_os`, OS fingerprinting).
pub mod detect_os;
pub mod rules;
pub mod scan;
