pub mod encoder;
pub mod expr;
pub mod guard;
pub mod node;
pub mod sql_node;
