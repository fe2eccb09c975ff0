pub mod audit;
pub mod backend;
pub mod history;
pub mod poll;
pub mod reconcile;
pub mod submit;
