pub mod conn_str;
pub mod source;
pub mod value;

pub use source::MySqlRowSource;
