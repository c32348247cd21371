//! End-to-end tests driving the full session API.

mod scenarios;
