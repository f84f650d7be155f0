pub mod claim;
pub mod common;
pub mod pipeline;
pub mod track;
