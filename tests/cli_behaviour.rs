//! Behavioural scenarios for `kestrel run` with the in-memory compute
//! service.

mod cli;
