//! Plugin System Tests
//!
//! Registry, dispatcher, event and manifest tests built on mock executors.


mod dispatcher_tests;
mod notification_tests;
