//! Scenario tests.
//!
//! `fake_cloud` holds the in-memory API shared by every scenario. Each
//! module exercises one handler flow end to end.
