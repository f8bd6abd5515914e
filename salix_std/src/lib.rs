//! Stock [`Strategy`](salix_core::Strategy) implementations: fixed
//! statuses, closure-backed actions and conditions, scripted playback and
//! a waypoint patrol.

pub mod strategies;
