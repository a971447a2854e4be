//! The two roles built on the burrow client SDK.
//!
//! `telemetry` simulates a sensor device, submitting a fixed number of
//! readings to the project's `sensors` table. `creds` is a credential
//! service: it registers `login` and `register` handlers that other
//! members of the project call through the base.

pub mod creds;
pub mod telemetry;
