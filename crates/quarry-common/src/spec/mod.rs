mod data_type;
mod literal;

pub use data_type::*;
pub use literal::*;
