//! Integration tests for the session gate.
//!
//! - `harness.rs`    - Mock auth service, data store, transport and navigator
//! - `interceptor.rs` - Credential injection and fail-closed redirects
//! - `guard.rs`      - Navigation guard runtime: page loads, auth events, audit rows
//! - `login_page.rs` - OTP form actions, status lines and resend cooldown
//! - `page.rs`       - Whole-page flows through `PageContext`

mod interceptor;
mod page;
