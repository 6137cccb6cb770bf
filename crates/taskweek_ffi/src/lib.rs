//! Flutter bridge for the taskweek core.

pub mod api;
