//! Event-loop facing preview session.

pub mod preview_session;
