// Scan Submission Proxy: the one call this app makes to the automation
// workflow. Resume parsing, scoring, sheet logging and candidate email all
// happen upstream.

pub mod client;
pub mod handlers;
