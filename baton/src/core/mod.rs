//! Pure decision logic: gate evaluation, action classification, cost
//! estimation, completion verification. No I/O, fully testable in isolation.

pub mod classify;
pub mod estimate;
pub mod gate;
pub mod types;
pub mod verify;
