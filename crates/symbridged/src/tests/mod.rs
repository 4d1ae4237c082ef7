//! Test suites for the symbridge worker.

mod protocol_behaviour;
