// Accepted ("intentional") regressions
//
// A regression that has been reviewed and deliberately accepted must not be
// reported as a new, unexplained failure. Entries are entered by hand, so
// they are gated at load time against strict invariants: a real baseline, real
// current failures, a strictly lower pass rate, a justification, a tracking
// link and a complete variant description. Any violation refuses the whole
// registry; silently dropping an entry would resurface it later as a false
// "new regression" alarm.
//
// Entries are keyed per release by the canonical triage key, so records
// written with legacy variant spellings still match current job variants.

mod intentional;
mod registry;

pub use intentional::{is_valid_tracking_link, AdmissionError, IntentionalRegression};
pub use registry::{IntentionalRegressionRegistry, RegistryBuilder};
