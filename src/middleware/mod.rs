mod operator_context;

pub use operator_context::*;
